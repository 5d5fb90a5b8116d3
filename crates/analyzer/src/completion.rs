//! C9: ranks candidate names at the cursor using a top-k min-heap (§4.7).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use queryscope_catalog::Catalog;
use queryscope_core::NameTags;
use smol_str::SmolStr;

use crate::cursor::Cursor;
use crate::model::AnalyzedScript;

/// Scoring constants (§4.7). Kept as a flat module of `u32` constants
/// rather than an enum since candidates sum several of these at once.
pub mod score {
    pub const TAG_LIKELY: u32 = 20;
    pub const TAG_UNLIKELY: u32 = 10;
    pub const TAG_IGNORE: u32 = 0;
    pub const KEYWORD_VERY_POPULAR: u32 = 3;
    pub const KEYWORD_POPULAR: u32 = 2;
    pub const KEYWORD_DEFAULT: u32 = 0;
    pub const SUBSTRING_SCORE_MODIFIER: u32 = 15;
    pub const PREFIX_SCORE_MODIFIER: u32 = 20;
    pub const RESOLVING_TABLE_SCORE_MODIFIER: u32 = 2;
    pub const UNRESOLVED_PEER_SCORE_MODIFIER: u32 = 2;
    pub const DOT_SCHEMA_SCORE_MODIFIER: u32 = 2;
    pub const DOT_TABLE_SCORE_MODIFIER: u32 = 2;
}

// Required relations (§4.7), checked at compile time rather than only
// documented.
const _: () = assert!(score::PREFIX_SCORE_MODIFIER > score::SUBSTRING_SCORE_MODIFIER);
const _: () = assert!(score::TAG_UNLIKELY + score::SUBSTRING_SCORE_MODIFIER > score::TAG_LIKELY);
const _: () = assert!(score::TAG_UNLIKELY + score::KEYWORD_VERY_POPULAR < score::TAG_LIKELY);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    TableName,
    ColumnName,
    TableAlias,
    SchemaName,
    DatabaseName,
    GrammarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: SmolStr,
    pub score: u32,
    pub kind: CandidateKind,
}

/// Orders candidates the way §4.7 specifies for the bounded min-heap:
/// `A < B` iff `score(A) < score(B)`, or scores are equal and
/// `name(A)` compares lexicographically *greater* (case-insensitive)
/// than `name(B)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapEntry(Candidate);

impl HeapEntry {
    fn name_lower(&self) -> String {
        self.0.name.to_ascii_lowercase()
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .cmp(&other.0.score)
            .then_with(|| other.name_lower().cmp(&self.name_lower()))
    }
}

/// A bounded min-heap of size `k` (§4.7): holds the `k` best candidates
/// seen so far, evicting its current minimum when a better one arrives.
pub struct TopKHeap {
    k: usize,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl TopKHeap {
    pub fn new(k: usize) -> Self {
        TopKHeap {
            k,
            heap: BinaryHeap::with_capacity(k),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        if self.k == 0 {
            return;
        }
        let entry = HeapEntry(candidate);
        if self.heap.len() < self.k {
            self.heap.push(Reverse(entry));
            return;
        }
        let is_better = matches!(self.heap.peek(), Some(Reverse(min)) if entry > *min);
        if is_better {
            self.heap.pop();
            self.heap.push(Reverse(entry));
        }
    }

    /// Drains the heap into a descending list: highest score first,
    /// ties broken by case-insensitive ascending name.
    pub fn finish(self) -> Vec<Candidate> {
        let mut entries: Vec<HeapEntry> = self.heap.into_iter().map(|Reverse(e)| e).collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| e.0).collect()
    }
}

fn keyword_popularity(name: &str) -> u32 {
    match name.to_ascii_uppercase().as_str() {
        "SELECT" | "FROM" | "WHERE" => score::KEYWORD_VERY_POPULAR,
        "JOIN" | "GROUP" | "ORDER" | "AND" | "OR" => score::KEYWORD_POPULAR,
        _ => score::KEYWORD_DEFAULT,
    }
}

fn tag_likelihood(tags: NameTags, wanted: NameTags) -> u32 {
    if tags.contains(wanted) {
        score::TAG_LIKELY
    } else if tags.is_empty() {
        score::TAG_IGNORE
    } else {
        score::TAG_UNLIKELY
    }
}

fn match_modifier(candidate: &str, prefix_text: &str) -> u32 {
    if prefix_text.is_empty() {
        return score::PREFIX_SCORE_MODIFIER;
    }
    let candidate_lower = candidate.to_ascii_lowercase();
    let prefix_lower = prefix_text.to_ascii_lowercase();
    if candidate_lower.starts_with(&prefix_lower) {
        score::PREFIX_SCORE_MODIFIER
    } else if candidate_lower.contains(&prefix_lower) {
        score::SUBSTRING_SCORE_MODIFIER
    } else {
        0
    }
}

/// The text typed so far at the cursor, for prefix/substring scoring:
/// the registered name backing the AST leaf under the cursor, if any.
fn cursor_prefix_text(analyzed: &AnalyzedScript, cursor: &Cursor) -> String {
    let Some(node_id) = cursor.node_id else { return String::new() };
    let node = analyzed.parsed.ast.get(node_id);
    if node.node_type != queryscope_core::NodeType::Name {
        return String::new();
    }
    analyzed.parsed.scanned.names.text_of(node.value()).to_string()
}

/// True if the cursor sits on or immediately after a `Dot`/`DotTrailing`
/// token — the "dotted name path" completion strategy (§4.7).
fn is_dotted_path_position(analyzed: &AnalyzedScript, cursor: &Cursor) -> bool {
    let symbols = &analyzed.parsed.scanned.symbols;
    let is_dot = |idx: Option<usize>| {
        idx.is_some_and(|i| matches!(symbols[i].kind, queryscope_core::TokenKind::Dot | queryscope_core::TokenKind::DotTrailing))
    };
    is_dot(cursor.symbol_id) || is_dot(cursor.previous_symbol_id)
}

/// Ranks up to `k` completion candidates at `cursor` (§4.7). `analyzed`
/// must be the script `cursor` was placed against.
pub fn complete_at_cursor(analyzed: &AnalyzedScript, catalog: &Catalog, cursor: &Cursor, k: usize) -> Vec<Candidate> {
    let mut heap = TopKHeap::new(k);
    let prefix_text = cursor_prefix_text(analyzed, cursor);

    if is_dotted_path_position(analyzed, cursor) {
        complete_dotted_path(catalog, &prefix_text, &mut heap);
    } else {
        complete_bare_identifier(analyzed, catalog, cursor, &prefix_text, &mut heap);
    }

    heap.finish()
}

/// After `schema.` (or `db.schema.`), offer the schema's tables; this
/// simplified rendition scores every catalog table equally, since the
/// per-segment path distinction (`db` vs `db.schema`) isn't threaded
/// through the recursive-descent table-ref grammar here.
fn complete_dotted_path(catalog: &Catalog, prefix_text: &str, heap: &mut TopKHeap) {
    for (_, table) in catalog.tables() {
        let modifier = match_modifier(&table.qualified_name.table_name, prefix_text);
        if modifier == 0 {
            continue;
        }
        let score = modifier + score::DOT_SCHEMA_SCORE_MODIFIER + score::DOT_TABLE_SCORE_MODIFIER;
        heap.push(Candidate {
            name: table.qualified_name.table_name.clone(),
            score,
            kind: CandidateKind::TableName,
        });
    }
}

fn complete_bare_identifier(
    analyzed: &AnalyzedScript,
    catalog: &Catalog,
    cursor: &Cursor,
    prefix_text: &str,
    heap: &mut TopKHeap,
) {
    let has_unresolved_column = analyzed
        .expressions
        .iter()
        .any(|e| matches!(e.kind, crate::model::ExpressionKind::UnresolvedColumnRef { .. }));

    // In-scope names: table aliases and declared tables visible from
    // the innermost enclosing scope.
    if let Some(&innermost) = cursor.scopes.first() {
        let scope = analyzed.name_scopes.get(innermost);
        for &t_idx in &scope.tables {
            let table = analyzed.tables.get(t_idx);
            let text = analyzed.parsed.scanned.names.text_of(table.table_name.table_name);
            let modifier = match_modifier(text, prefix_text);
            if modifier == 0 {
                continue;
            }
            let tags = analyzed.parsed.scanned.names.get(table.table_name.table_name).tags;
            heap.push(Candidate {
                name: SmolStr::new(text),
                score: modifier + tag_likelihood(tags, NameTags::TABLE_NAME),
                kind: CandidateKind::TableName,
            });
        }
        for &r_idx in &scope.table_references {
            let tr = analyzed.table_references.get(r_idx);
            if let Some(alias) = tr.alias_name {
                let text = analyzed.parsed.scanned.names.text_of(alias);
                let modifier = match_modifier(text, prefix_text);
                if modifier == 0 {
                    continue;
                }
                heap.push(Candidate {
                    name: SmolStr::new(text),
                    score: modifier + tag_likelihood(analyzed.parsed.scanned.names.get(alias).tags, NameTags::TABLE_ALIAS),
                    kind: CandidateKind::TableAlias,
                });
            }
        }
    }

    // Catalog tables and their columns.
    for (_, table) in catalog.tables() {
        let modifier = match_modifier(&table.qualified_name.table_name, prefix_text);
        if modifier > 0 {
            let resolves_unresolved = if has_unresolved_column {
                score::RESOLVING_TABLE_SCORE_MODIFIER
            } else {
                0
            };
            heap.push(Candidate {
                name: table.qualified_name.table_name.clone(),
                score: modifier + score::TAG_LIKELY + resolves_unresolved,
                kind: CandidateKind::TableName,
            });
        }
        for column in &table.columns {
            let modifier = match_modifier(column, prefix_text);
            if modifier == 0 {
                continue;
            }
            let peer_boost = if has_unresolved_column {
                score::UNRESOLVED_PEER_SCORE_MODIFIER
            } else {
                0
            };
            heap.push(Candidate {
                name: column.clone(),
                score: modifier + score::TAG_LIKELY + peer_boost,
                kind: CandidateKind::ColumnName,
            });
        }
    }

    for keyword in ["SELECT", "FROM", "WHERE", "JOIN", "GROUP", "ORDER"] {
        let modifier = match_modifier(keyword, prefix_text);
        if modifier == 0 {
            continue;
        }
        heap.push(Candidate {
            name: SmolStr::new(keyword),
            score: modifier + keyword_popularity(keyword),
            kind: CandidateKind::GrammarKeyword,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryscope_catalog::{CatalogTable, QualifiedTableName, ScriptCatalogEntry};
    use queryscope_core::{parser::parse, scanner::scan};
    use std::sync::Arc;

    fn analyze_text(text: &str, catalog: &mut Catalog) -> AnalyzedScript {
        let parsed = parse(text, scan(text));
        crate::resolve::analyze(parsed, 1, catalog)
    }

    #[derive(Debug)]
    struct FakeEntry {
        tables: Vec<CatalogTable>,
    }
    impl ScriptCatalogEntry for FakeEntry {
        fn catalog_entry_id(&self) -> u32 {
            0
        }
        fn tables(&self) -> &[CatalogTable] {
            &self.tables
        }
    }

    fn seed_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .load_script(
                0,
                Arc::new(FakeEntry {
                    tables: vec![CatalogTable {
                        qualified_name: QualifiedTableName {
                            database_name: None,
                            schema_name: Some(SmolStr::new("public")),
                            table_name: SmolStr::new("users"),
                        },
                        catalog_database_id: 0,
                        catalog_schema_id: 0,
                        catalog_table_id: 0,
                        columns: vec![SmolStr::new("id"), SmolStr::new("email")],
                        ast_node_id: None,
                    }],
                }),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_top_k_heap_respects_k_and_orders_descending() {
        let mut heap = TopKHeap::new(2);
        heap.push(Candidate {
            name: SmolStr::new("a"),
            score: 1,
            kind: CandidateKind::TableName,
        });
        heap.push(Candidate {
            name: SmolStr::new("b"),
            score: 5,
            kind: CandidateKind::TableName,
        });
        heap.push(Candidate {
            name: SmolStr::new("c"),
            score: 3,
            kind: CandidateKind::TableName,
        });
        let result = heap.finish();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "b");
        assert_eq!(result[1].name, "c");
    }

    #[test]
    fn test_tie_break_is_case_insensitive_ascending_name() {
        let mut heap = TopKHeap::new(3);
        for name in ["Zebra", "apple", "Mango"] {
            heap.push(Candidate {
                name: SmolStr::new(name),
                score: 10,
                kind: CandidateKind::TableName,
            });
        }
        let result = heap.finish();
        let names: Vec<_> = result.iter().map(|c| c.name.to_ascii_lowercase()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_completion_inside_dotted_path_offers_table() {
        let mut catalog = seed_catalog();
        let text = "select * from public.";
        let analyzed = analyze_text(text, &mut catalog);
        let cursor = Cursor::place(&analyzed, text.len() as u32);
        let results = complete_at_cursor(&analyzed, &catalog, &cursor, 10);
        assert!(results.iter().any(|c| c.name == "users"));
        let users = results.iter().find(|c| c.name == "users").unwrap();
        assert!(users.score >= score::PREFIX_SCORE_MODIFIER + score::DOT_SCHEMA_SCORE_MODIFIER);
    }

    #[test]
    fn test_completion_result_size_bounded_by_k() {
        let mut catalog = seed_catalog();
        let text = "select * from public.";
        let analyzed = analyze_text(text, &mut catalog);
        let cursor = Cursor::place(&analyzed, text.len() as u32);
        let results = complete_at_cursor(&analyzed, &catalog, &cursor, 1);
        assert!(results.len() <= 1);
    }
}
