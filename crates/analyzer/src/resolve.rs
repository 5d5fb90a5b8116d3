//! C7: the name-resolution pass.
//!
//! The flat AST's post-order is already the ascending index order of
//! its node array (`AstBuffer` doc comment), so the `NodeState` merge
//! collapses into a single `for node_id in 0..node_count` loop: every
//! child of `node_id` was visited — and has a `NodeState` recorded for
//! it — before `node_id` itself is reached.

use std::collections::HashMap;

use queryscope_catalog::{Catalog, GlobalObjectId};
use queryscope_core::{AttributeKey, NameId, NameTags, NodeType, OperatorKind, ParsedScript};
use queryscope_helpers::{Arena, NONE_ID};
use smol_str::SmolStr;

use crate::model::{
    AnalyzedScript, AnalyzerError, AnalyzerErrorKind, Expression, ExpressionKind, NameScope, PendingColumn,
    QualifiedColumnName, QualifiedTableName, QueryGraphEdge, TableColumn, TableDeclaration, TableReference,
    TableReferenceStatus,
};

const DEFAULT_DATABASE_NAME: &str = "default";
const DEFAULT_SCHEMA_NAME: &str = "public";

/// Accumulated, not-yet-closed state for one AST subtree: everything
/// visible to an enclosing scope once its children have merged (§4.4).
#[derive(Debug, Clone, Default)]
struct NodeState {
    tables: Vec<u32>,
    pending_columns: Vec<PendingColumn>,
    table_references: Vec<u32>,
    expressions: Vec<u32>,
}

/// Runs the name-resolution pass over `parsed`, registering every
/// declared table with `catalog`'s id generators along the way, and
/// returns the frozen `AnalyzedScript`. Does not load the result into
/// `catalog` — that's a separate `Catalog::load_script` call (§4.5).
pub fn analyze(mut parsed: ParsedScript, catalog_entry_id: u32, catalog: &mut Catalog) -> AnalyzedScript {
    let node_count = parsed.ast.nodes().len() as u32;
    // `ast` and `names` borrow disjoint fields of `parsed`
    // (`parsed.ast` vs `parsed.scanned.names`), so both borrows live
    // side by side in `resolver` until it's destructured below, well
    // before `parsed` is moved into the returned `AnalyzedScript`.
    let ast = &parsed.ast;

    let mut resolver = Resolver {
        ast,
        names: &mut parsed.scanned.names,
        catalog,
        catalog_entry_id,
        node_states: Arena::new(),
        tables: Arena::new(),
        table_columns: Arena::new(),
        table_references: Arena::new(),
        expressions: Arena::new(),
        name_scopes: Arena::new(),
        graph_edges: Vec::new(),
        errors: Vec::new(),
    };
    for node_id in 0..node_count {
        resolver.visit(node_id);
    }
    resolver.assign_statement_ids();
    resolver.link_scope_hierarchy();
    resolver.record_unresolved_errors();

    let Resolver {
        tables,
        table_columns,
        table_references,
        expressions,
        name_scopes,
        graph_edges,
        errors,
        ..
    } = resolver;

    let catalog_tables = build_catalog_tables(&tables, &table_columns, &parsed.scanned.names);
    let catalog_version = catalog.version();

    AnalyzedScript {
        parsed,
        catalog_entry_id,
        tables,
        table_columns,
        table_references,
        expressions,
        name_scopes,
        graph_edges,
        errors,
        catalog_version,
        catalog_tables,
    }
}

fn build_catalog_tables(
    tables: &Arena<TableDeclaration>,
    table_columns: &Arena<TableColumn>,
    names: &queryscope_core::NameRegistry,
) -> Vec<queryscope_catalog::CatalogTable> {
    tables
        .iter()
        .map(|t| {
            let begin = t.columns_begin as usize;
            let end = begin + t.column_count as usize;
            queryscope_catalog::CatalogTable {
                qualified_name: queryscope_catalog::QualifiedTableName {
                    database_name: t.table_name.database_name.map(|id| SmolStr::new(names.text_of(id))),
                    schema_name: t.table_name.schema_name.map(|id| SmolStr::new(names.text_of(id))),
                    table_name: SmolStr::new(names.text_of(t.table_name.table_name)),
                },
                catalog_database_id: t.catalog_database_id,
                catalog_schema_id: t.catalog_schema_id,
                catalog_table_id: t.catalog_table_id,
                columns: table_columns.as_slice()[begin..end]
                    .iter()
                    .map(|c| SmolStr::new(names.text_of(c.column_name)))
                    .collect(),
                ast_node_id: Some(t.ast_node_id),
            }
        })
        .collect()
}

struct Resolver<'a> {
    ast: &'a queryscope_core::AstBuffer,
    names: &'a mut queryscope_core::NameRegistry,
    catalog: &'a mut Catalog,
    catalog_entry_id: u32,
    node_states: Arena<NodeState>,
    tables: Arena<TableDeclaration>,
    table_columns: Arena<TableColumn>,
    table_references: Arena<TableReference>,
    expressions: Arena<Expression>,
    name_scopes: Arena<NameScope>,
    graph_edges: Vec<QueryGraphEdge>,
    errors: Vec<AnalyzerError>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, node_id: u32) {
        let mut state = self.merge_children(node_id);
        let node_type = self.ast.get(node_id).node_type;
        match node_type {
            NodeType::ObjectSqlColumnDef => self.visit_column_def(node_id, &mut state),
            NodeType::ObjectSqlColumnRef => self.visit_column_ref(node_id, &mut state),
            NodeType::ObjectSqlTableRef => self.visit_table_ref(node_id, &mut state),
            NodeType::ObjectSqlNaryExpression => self.visit_nary_expression(node_id, &state),
            NodeType::ObjectSqlSelect => {
                self.resolve_names(&state);
                self.close_scope(&mut state, node_id);
            }
            NodeType::ObjectSqlCreate | NodeType::ObjectSqlCreateAs | NodeType::ObjectSqlView => {
                self.visit_create(node_id, node_type, &mut state);
            }
            _ => {}
        }
        let id = self.node_states.push(state);
        debug_assert_eq!(id, node_id);
    }

    fn merge_children(&self, node_id: u32) -> NodeState {
        let mut merged = NodeState::default();
        for child_id in self.ast.child_ids(node_id) {
            let child = self.node_states.get(child_id);
            merged.tables.extend_from_slice(&child.tables);
            merged.pending_columns.extend(child.pending_columns.iter().cloned());
            merged.table_references.extend_from_slice(&child.table_references);
            merged.expressions.extend_from_slice(&child.expressions);
        }
        merged
    }

    fn read_qualified_table_name(&self, path_array_id: u32) -> QualifiedTableName {
        let ids: Vec<NameId> = self.ast.children(path_array_id).iter().map(|n| n.value()).collect();
        match ids.len() {
            1 => QualifiedTableName {
                database_name: None,
                schema_name: None,
                table_name: ids[0],
            },
            2 => QualifiedTableName {
                database_name: None,
                schema_name: Some(ids[0]),
                table_name: ids[1],
            },
            _ => QualifiedTableName {
                database_name: Some(ids[0]),
                schema_name: Some(ids[1]),
                table_name: *ids.last().expect("table ref path is non-empty"),
            },
        }
    }

    fn tag_qualified_table_name(&mut self, q: &QualifiedTableName) {
        if q.table_name != NONE_ID {
            self.names.tag(q.table_name, NameTags::TABLE_NAME);
        }
        if let Some(id) = q.schema_name {
            self.names.tag(id, NameTags::SCHEMA_NAME);
        }
        if let Some(id) = q.database_name {
            self.names.tag(id, NameTags::DATABASE_NAME);
        }
    }

    fn visit_column_def(&mut self, node_id: u32, state: &mut NodeState) {
        let Some(name_node) = self.ast.find_attr(node_id, AttributeKey::SqlColumnDefName) else {
            return;
        };
        let name_id = self.ast.get(name_node).value();
        if name_id == NONE_ID {
            return;
        }
        self.names.tag(name_id, NameTags::COLUMN_NAME);
        state.pending_columns.push(PendingColumn {
            column_name: name_id,
            ast_node_id: node_id,
        });
    }

    fn visit_column_ref(&mut self, node_id: u32, state: &mut NodeState) {
        let Some(path_array) = self.ast.find_attr(node_id, AttributeKey::SqlColumnRefPath) else {
            return;
        };
        let ids: Vec<NameId> = self.ast.children(path_array).iter().map(|n| n.value()).collect();
        if ids.is_empty() || ids[0] == NONE_ID {
            // `SELECT *`: a bare wildcard name carries no column to resolve.
            return;
        }
        let column_name = if ids.len() == 1 {
            self.names.tag(ids[0], NameTags::COLUMN_NAME);
            QualifiedColumnName {
                table_alias: None,
                column_name: ids[0],
            }
        } else {
            self.names.tag(ids[0], NameTags::TABLE_ALIAS);
            self.names.tag(ids[1], NameTags::COLUMN_NAME);
            QualifiedColumnName {
                table_alias: Some(ids[0]),
                column_name: ids[1],
            }
        };
        let idx = self.expressions.push(Expression {
            kind: ExpressionKind::UnresolvedColumnRef { column_name },
            ast_node_id: node_id,
            ast_statement_id: None,
            ast_scope_root: None,
        });
        state.expressions.push(idx);
    }

    fn visit_table_ref(&mut self, node_id: u32, state: &mut NodeState) {
        let Some(path_array) = self.ast.find_attr(node_id, AttributeKey::SqlTablerefName) else {
            return;
        };
        let table_name = self.read_qualified_table_name(path_array);
        self.tag_qualified_table_name(&table_name);
        let alias_name = self.ast.find_attr(node_id, AttributeKey::SqlTablerefAlias).map(|id| {
            let alias = self.ast.get(id).value();
            self.names.tag(alias, NameTags::TABLE_ALIAS);
            alias
        });
        let idx = self.table_references.push(TableReference {
            status: TableReferenceStatus::Unresolved,
            table_name,
            alias_name,
            ast_node_id: node_id,
            ast_statement_id: None,
            ast_scope_root: None,
        });
        state.table_references.push(idx);
    }

    fn visit_nary_expression(&mut self, node_id: u32, state: &NodeState) {
        let _ = state;
        let Some(op_node) = self.ast.find_attr(node_id, AttributeKey::SqlExpressionOperator) else {
            return;
        };
        let Some(op) = OperatorKind::from_u32(self.ast.get(op_node).value()) else {
            return;
        };
        if !op.is_comparison() {
            return;
        }
        let Some(args_array) = self.ast.find_attr(node_id, AttributeKey::SqlExpressionArgs) else {
            return;
        };
        let arg_ids: Vec<u32> = self.ast.child_ids(args_array).collect();
        if arg_ids.len() != 2 {
            return;
        }
        let left = self.node_states.get(arg_ids[0]).expressions.first().copied();
        let right = self.node_states.get(arg_ids[1]).expressions.first().copied();
        if let (Some(left_expression), Some(right_expression)) = (left, right) {
            self.graph_edges.push(QueryGraphEdge {
                operator: op,
                left_expression,
                right_expression,
                ast_node_id: node_id,
            });
        }
    }

    fn visit_create(&mut self, node_id: u32, node_type: NodeType, state: &mut NodeState) {
        let name_attr = match node_type {
            NodeType::ObjectSqlView => AttributeKey::SqlViewName,
            _ => AttributeKey::SqlCreateTableName,
        };
        let Some(path_array) = self.ast.find_attr(node_id, name_attr) else {
            return;
        };
        let table_name = self.read_qualified_table_name(path_array);
        self.tag_qualified_table_name(&table_name);

        if let Some(query_attr) = match node_type {
            NodeType::ObjectSqlCreateAs => Some(AttributeKey::SqlCreateTableAsQuery),
            NodeType::ObjectSqlView => Some(AttributeKey::SqlViewQuery),
            NodeType::ObjectSqlCreate => None,
        } {
            if let Some(query_id) = self.ast.find_attr(node_id, query_attr) {
                self.resolve_names(&state);
                let _ = query_id; // already folded into `state` via merge_children
            }
        }

        let (database_id, schema_id, table_id) = self.allocate_catalog_ids(&table_name);

        let columns_begin = self.table_columns.len() as u32;
        let mut seen = std::collections::HashSet::new();
        let table_index = self.tables.len() as u32;
        for col in state.pending_columns.drain(..) {
            if !seen.insert(col.column_name) {
                self.errors.push(AnalyzerError {
                    kind: AnalyzerErrorKind::DuplicateTableColumn,
                    location: self.ast.get(col.ast_node_id).location,
                    message: format!("duplicate column name '{}'", self.names.text_of(col.column_name)),
                });
            }
            self.table_columns.push(TableColumn {
                column_name: col.column_name,
                ast_node_id: col.ast_node_id,
                table_index,
            });
        }
        let column_count = self.table_columns.len() as u32 - columns_begin;

        self.tables.push(TableDeclaration {
            catalog_database_id: database_id,
            catalog_schema_id: schema_id,
            catalog_table_id: table_id,
            table_name,
            ast_node_id: node_id,
            columns_begin,
            column_count,
            ast_scope_root: None,
        });
        state.tables.push(table_index);
        self.close_scope(state, node_id);
    }

    fn allocate_catalog_ids(&mut self, q: &QualifiedTableName) -> (u32, u32, u32) {
        let db_text = q
            .database_name
            .map(|id| self.names.text_of(id).to_string())
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        let schema_text = q
            .schema_name
            .map(|id| self.names.text_of(id).to_string())
            .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string());
        let table_text = self.names.text_of(q.table_name).to_string();
        let database_id = self.catalog.allocate_database(&db_text);
        let schema_id = self.catalog.allocate_schema(database_id, &schema_text);
        let table_id = self.catalog.allocate_table(database_id, schema_id, &table_text);
        (database_id, schema_id, table_id)
    }

    fn to_catalog_name(&self, q: &QualifiedTableName) -> queryscope_catalog::QualifiedTableName {
        queryscope_catalog::QualifiedTableName {
            database_name: q.database_name.map(|id| SmolStr::new(self.names.text_of(id))),
            schema_name: q.schema_name.map(|id| SmolStr::new(self.names.text_of(id))),
            table_name: SmolStr::new(self.names.text_of(q.table_name)),
        }
    }

    /// §4.4 `ResolveNames`: resolves every table reference and column
    /// reference that is still visible in `state` (i.e. not already
    /// scope-closed by a nested subquery).
    fn resolve_names(&mut self, state: &NodeState) {
        let mut local_tables: HashMap<SmolStr, u32> = HashMap::new();
        // Every table this script has declared so far — including ones
        // whose own CREATE already closed its scope — is visible to a
        // later statement's resolution (spec §8 scenario 2: a `SELECT`
        // following an earlier `CREATE TABLE` in the same script). Scan
        // order is ascending node id, so `self.tables` already holds
        // every table declared before `state`'s statement.
        for t_idx in 0..self.tables.len() as u32 {
            let key = SmolStr::new(self.names.text_of(self.tables.get(t_idx).table_name.table_name));
            local_tables.insert(key, t_idx);
        }
        // Tables still in-scope for this subtree take priority over an
        // earlier, already-closed declaration of the same name.
        for &t_idx in &state.tables {
            if self.tables.get(t_idx).ast_scope_root.is_some() {
                continue;
            }
            let key = SmolStr::new(self.names.text_of(self.tables.get(t_idx).table_name.table_name));
            local_tables.insert(key, t_idx);
        }

        // alias-or-name -> (table, column) -> column index
        let mut aliased_columns: HashMap<(SmolStr, SmolStr), (GlobalObjectId, u32)> = HashMap::new();
        // column name -> every (table, column index) offering it, for
        // unqualified lookups and ambiguity detection.
        let mut unaliased_columns: HashMap<SmolStr, Vec<(GlobalObjectId, u32)>> = HashMap::new();

        for &r_idx in &state.table_references {
            if self.table_references.get(r_idx).ast_scope_root.is_some() {
                continue;
            }
            let (wanted_name, alias) = {
                let tr = self.table_references.get(r_idx);
                (tr.table_name, tr.alias_name)
            };
            let wanted_key = SmolStr::new(self.names.text_of(wanted_name.table_name));

            let resolution = if let Some(&t_idx) = local_tables.get(&wanted_key) {
                let global_id = GlobalObjectId::new(self.catalog_entry_id, t_idx);
                let table = self.tables.get(t_idx);
                let columns: Vec<(SmolStr, u32)> = self
                    .table_columns
                    .as_slice()[table.columns_begin as usize..(table.columns_begin + table.column_count) as usize]
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (SmolStr::new(self.names.text_of(c.column_name)), i as u32))
                    .collect();
                Some((global_id, wanted_key.clone(), columns))
            } else {
                let catalog_name = self.to_catalog_name(&wanted_name);
                self.catalog.find_table(&catalog_name).map(|(global_id, catalog_table)| {
                    let columns = catalog_table
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (c.clone(), i as u32))
                        .collect();
                    (global_id, catalog_table.qualified_name.table_name.clone(), columns)
                })
            };

            if let Some((global_id, own_name, columns)) = resolution {
                self.table_references.get_mut(r_idx).status = TableReferenceStatus::Resolved { table: global_id };
                let alias_key = alias
                    .map(|id| SmolStr::new(self.names.text_of(id)))
                    .unwrap_or(own_name);
                for (col_text, col_idx) in columns {
                    aliased_columns.insert((alias_key.clone(), col_text.clone()), (global_id, col_idx));
                    unaliased_columns.entry(col_text).or_default().push((global_id, col_idx));
                }
            }
        }

        for &e_idx in &state.expressions {
            if self.expressions.get(e_idx).ast_scope_root.is_some() {
                continue;
            }
            let ExpressionKind::UnresolvedColumnRef { column_name } = self.expressions.get(e_idx).kind else {
                continue;
            };
            let col_text = SmolStr::new(self.names.text_of(column_name.column_name));
            let resolved = if let Some(alias_id) = column_name.table_alias {
                let alias_text = SmolStr::new(self.names.text_of(alias_id));
                aliased_columns.get(&(alias_text, col_text.clone())).copied()
            } else {
                match unaliased_columns.get(&col_text) {
                    Some(candidates) if candidates.len() == 1 => Some(candidates[0]),
                    Some(candidates) if candidates.len() > 1 => {
                        self.errors.push(AnalyzerError {
                            kind: AnalyzerErrorKind::AmbiguousColumn,
                            location: self.ast.get(self.expressions.get(e_idx).ast_node_id).location,
                            message: format!("column reference '{col_text}' is ambiguous"),
                        });
                        None
                    }
                    _ => None,
                }
            };
            if let Some((table, column_index)) = resolved {
                self.expressions.get_mut(e_idx).kind = ExpressionKind::ResolvedColumnRef {
                    column_name,
                    table,
                    column_index,
                };
            }
        }
    }

    /// §4.4 `CloseScope`: stamps every entry in `state` that isn't
    /// already scope-closed (by a nested subquery) with `node_id`, and
    /// records a `NameScope` for it.
    fn close_scope(&mut self, state: &mut NodeState, node_id: u32) -> u32 {
        for &t in &state.tables {
            let table = self.tables.get_mut(t);
            if table.ast_scope_root.is_none() {
                table.ast_scope_root = Some(node_id);
            }
        }
        for &r in &state.table_references {
            let tr = self.table_references.get_mut(r);
            if tr.ast_scope_root.is_none() {
                tr.ast_scope_root = Some(node_id);
            }
        }
        for &e in &state.expressions {
            let expr = self.expressions.get_mut(e);
            if expr.ast_scope_root.is_none() {
                expr.ast_scope_root = Some(node_id);
            }
        }
        self.name_scopes.push(NameScope {
            ast_scope_root: node_id,
            parent_scope: None,
            child_scopes: Vec::new(),
            tables: state.tables.clone(),
            table_references: state.table_references.clone(),
            expressions: state.expressions.clone(),
        })
    }

    fn assign_statement_ids(&mut self) {
        for idx in 0..self.table_references.len() as u32 {
            let node_id = self.table_references.get(idx).ast_node_id;
            let stmt = self.ast.statement_containing(node_id);
            self.table_references.get_mut(idx).ast_statement_id = stmt.map(|s| s as u32);
        }
        for idx in 0..self.expressions.len() as u32 {
            let node_id = self.expressions.get(idx).ast_node_id;
            let stmt = self.ast.statement_containing(node_id);
            self.expressions.get_mut(idx).ast_statement_id = stmt.map(|s| s as u32);
        }
    }

    fn link_scope_hierarchy(&mut self) {
        let roots: HashMap<u32, u32> = self
            .name_scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.ast_scope_root, i as u32))
            .collect();
        let mut parents = vec![None; self.name_scopes.len()];
        for (i, scope) in self.name_scopes.iter().enumerate() {
            let mut cur = self.ast.get(scope.ast_scope_root).parent_id;
            while cur != NONE_ID {
                if let Some(&parent_idx) = roots.get(&cur) {
                    parents[i] = Some(parent_idx);
                    break;
                }
                cur = self.ast.get(cur).parent_id;
            }
        }
        for (i, parent) in parents.into_iter().enumerate() {
            self.name_scopes.get_mut(i as u32).parent_scope = parent;
            if let Some(p) = parent {
                let child = i as u32;
                self.name_scopes.get_mut(p).child_scopes.push(child);
            }
        }
    }

    fn record_unresolved_errors(&mut self) {
        for tr in self.table_references.iter() {
            if matches!(tr.status, TableReferenceStatus::Unresolved) {
                self.errors.push(AnalyzerError {
                    kind: AnalyzerErrorKind::UnresolvedTable,
                    location: self.ast.get(tr.ast_node_id).location,
                    message: format!("unresolved table reference '{}'", self.names.text_of(tr.table_name.table_name)),
                });
            }
        }
        for expr in self.expressions.iter() {
            if !expr.kind.is_resolved() {
                let column_name = expr.kind.column_name();
                self.errors.push(AnalyzerError {
                    kind: AnalyzerErrorKind::UnresolvedColumn,
                    location: self.ast.get(expr.ast_node_id).location,
                    message: format!("unresolved column reference '{}'", self.names.text_of(column_name.column_name)),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use queryscope_core::parser::parse;
    use queryscope_core::scanner::scan;

    fn analyze_text(text: &str, catalog: &mut Catalog) -> AnalyzedScript {
        let parsed = parse(text, scan(text));
        analyze(parsed, 1, catalog)
    }

    #[test]
    fn test_unresolved_table_and_column_against_empty_catalog() {
        let mut catalog = Catalog::new();
        let analyzed = analyze_text("select foo from bar", &mut catalog);
        assert!(analyzed
            .errors
            .iter()
            .any(|e| e.kind == AnalyzerErrorKind::UnresolvedTable));
        assert!(analyzed
            .errors
            .iter()
            .any(|e| e.kind == AnalyzerErrorKind::UnresolvedColumn));
        assert!(analyzed.table_references.iter().all(|r| matches!(r.status, TableReferenceStatus::Unresolved)));
        assert!(analyzed.expressions.iter().all(|e| !e.kind.is_resolved()));
    }

    #[test]
    fn test_local_resolution_against_earlier_statement_in_same_script() {
        let mut catalog = Catalog::new();
        let analyzed = analyze_text("create table t(a int, b int); select a from t", &mut catalog);
        assert_eq!(analyzed.tables.len(), 1);
        let TableReferenceStatus::Resolved { table } = analyzed.table_references.get(0).status else {
            panic!("expected the local table reference to resolve");
        };
        assert_eq!(table.entry_id(), 1);
        assert_eq!(table.index(), 0);
        let expr = analyzed.expressions.get(0);
        let ExpressionKind::ResolvedColumnRef { table: col_table, column_index, .. } = expr.kind else {
            panic!("expected column 'a' to resolve");
        };
        assert_eq!(col_table, table);
        assert_eq!(column_index, 0);
    }

    #[test]
    fn test_create_view_resolves_its_embedded_query_against_catalog() {
        let mut catalog = Catalog::new();
        let seed_text = "create table t (id int, name text)";
        let seed = analyze(parse(seed_text, scan(seed_text)), 0, &mut catalog);
        catalog.load_script(0, std::sync::Arc::new(seed)).unwrap();

        let analyzed = analyze_text("create view v as select id, name from t", &mut catalog);
        assert!(analyzed.errors.iter().all(|e| e.kind != AnalyzerErrorKind::UnresolvedTable));
        assert!(analyzed.errors.iter().all(|e| e.kind != AnalyzerErrorKind::UnresolvedColumn));
        // the view itself is declared in this script's own table arena
        assert_eq!(analyzed.tables.len(), 1);
        assert!(matches!(
            analyzed.table_references.get(0).status,
            TableReferenceStatus::Resolved { .. }
        ));
        for expr in analyzed.expressions.iter() {
            assert!(expr.kind.is_resolved());
        }
    }

    #[test]
    fn test_cross_script_resolution_via_preloaded_catalog() {
        let mut catalog = Catalog::new();
        let seed_parsed = parse("create table accounts (id int, balance int)", scan("create table accounts (id int, balance int)"));
        let seed = analyze(seed_parsed, 0, &mut catalog);
        catalog.load_script(0, std::sync::Arc::new(seed)).unwrap();

        let analyzed = analyze_text("select id, balance from accounts", &mut catalog);
        assert!(analyzed.errors.iter().all(|e| e.kind != AnalyzerErrorKind::UnresolvedTable));
        assert!(analyzed.errors.iter().all(|e| e.kind != AnalyzerErrorKind::UnresolvedColumn));
        let TableReferenceStatus::Resolved { table } = analyzed.table_references.get(0).status else {
            panic!("expected the cross-script table reference to resolve");
        };
        assert_eq!(table.entry_id(), 0);
    }

    #[test]
    fn test_alias_qualifies_column_resolution() {
        let mut catalog = Catalog::new();
        let seed_text = "create table t (c int)";
        let seed = analyze(parse(seed_text, scan(seed_text)), 0, &mut catalog);
        catalog.load_script(0, std::sync::Arc::new(seed)).unwrap();

        let analyzed = analyze_text("select x.c from t x", &mut catalog);
        assert!(analyzed.errors.iter().all(|e| e.kind != AnalyzerErrorKind::UnresolvedColumn));
        let alias = analyzed.table_references.get(0).alias_name.expect("table ref carries an alias");
        assert_eq!(analyzed.parsed.scanned.names.text_of(alias), "x");
        for expr in analyzed.expressions.iter() {
            assert!(expr.kind.is_resolved());
        }
    }

    #[test]
    fn test_ambiguous_unqualified_column_across_two_joined_tables() {
        let mut catalog = Catalog::new();
        let seed_a = analyze(parse("create table a (id int)", scan("create table a (id int)")), 0, &mut catalog);
        catalog.load_script(0, std::sync::Arc::new(seed_a)).unwrap();
        let seed_b = analyze(parse("create table b (id int)", scan("create table b (id int)")), 1, &mut catalog);
        catalog.load_script(1, std::sync::Arc::new(seed_b)).unwrap();

        let analyzed = analyze_text("select id from a, b", &mut catalog);
        assert!(analyzed.errors.iter().any(|e| e.kind == AnalyzerErrorKind::AmbiguousColumn));
        assert!(analyzed.expressions.iter().all(|e| !e.kind.is_resolved()));
    }

    #[test]
    fn test_every_resolved_reference_points_at_an_extant_catalog_table() {
        let mut catalog = Catalog::new();
        let seed_text = "create table t (id int)";
        let seed = analyze(parse(seed_text, scan(seed_text)), 0, &mut catalog);
        catalog.load_script(0, std::sync::Arc::new(seed)).unwrap();

        let analyzed = analyze_text("select id from t", &mut catalog);
        let resolved_count = analyzed
            .table_references
            .iter()
            .filter(|tr| matches!(tr.status, TableReferenceStatus::Resolved { .. }))
            .count();
        assert_eq!(resolved_count, 1);
        for tr in analyzed.table_references.iter() {
            if let TableReferenceStatus::Resolved { table } = tr.status {
                assert!(catalog.resolve(table).is_some());
            }
        }
    }

    #[test]
    fn test_statement_ids_are_consistent_across_two_statements() {
        let mut catalog = Catalog::new();
        let text = "select a from t; select b from u";
        let analyzed = analyze_text(text, &mut catalog);
        let stmt_ids: Vec<_> = analyzed.table_references.iter().map(|r| r.ast_statement_id).collect();
        assert_eq!(stmt_ids, vec![Some(0), Some(1)]);
    }
}
