//! C8: maps a text offset to a token, AST node path, enclosing name
//! scopes and any referenced table/column (§4.6).
//!
//! A cursor borrows from the `AnalyzedScript` it was placed against;
//! editing the script invalidates every cursor placed on the prior
//! snapshot, same as the borrow checker would already enforce by
//! construction (`Cursor<'a>` can't outlive the script it points into).

use queryscope_core::{NodeType, Symbol};
use queryscope_helpers::NONE_ID;

use crate::model::AnalyzedScript;

/// Where `text_offset` falls relative to the matched symbol's span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePosition {
    /// Before the first symbol in the script.
    Before,
    /// Strictly inside the matched symbol's `[offset, offset+length)` span.
    InsideSymbol,
    /// Past the end of the matched symbol, but before the next one.
    After,
    /// The matched symbol is the synthetic end-of-file symbol.
    AtEof,
}

/// What kind of reference, if any, lies on the path from the cursor's
/// AST node to its enclosing statement root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorContext {
    TableRef { table_reference_id: u32 },
    ColumnRef { expression_id: u32 },
    None,
}

/// The result of `Cursor::place` (§4.6).
#[derive(Debug, Clone)]
pub struct Cursor {
    pub text_offset: u32,
    pub symbol_id: Option<usize>,
    pub previous_symbol_id: Option<usize>,
    pub relative_position: RelativePosition,
    pub statement_id: Option<u32>,
    pub node_id: Option<u32>,
    /// From `node_id` to the enclosing statement root, innermost first.
    pub ast_path_to_root: Vec<u32>,
    /// Enclosing `NameScope`s, innermost first.
    pub scopes: Vec<u32>,
    pub context: CursorContext,
}

impl Cursor {
    /// Places a cursor at `text_offset` within `analyzed` (§4.6).
    pub fn place(analyzed: &AnalyzedScript, text_offset: u32) -> Cursor {
        let symbols = &analyzed.parsed.scanned.symbols;
        let (symbol_id, previous_symbol_id, relative_position) = locate_symbol(symbols, text_offset);

        let node_id = symbol_id.and_then(|sid| find_node_for_symbol(analyzed, symbols[sid]));
        let ast_path_to_root = node_id.map(|n| path_to_root(analyzed, n)).unwrap_or_default();
        let statement_id = node_id.and_then(|n| analyzed.parsed.ast.statement_containing(n)).map(|s| s as u32);

        let scopes = scope_stack(analyzed, &ast_path_to_root);
        let context = classify_context(analyzed, &ast_path_to_root);

        Cursor {
            text_offset,
            symbol_id,
            previous_symbol_id,
            relative_position,
            statement_id,
            node_id,
            ast_path_to_root,
            scopes,
            context,
        }
    }
}

/// Finds the last symbol with `location.offset <= text_offset`, its
/// predecessor, and `text_offset`'s position relative to it.
fn locate_symbol(symbols: &[Symbol], text_offset: u32) -> (Option<usize>, Option<usize>, RelativePosition) {
    if symbols.is_empty() {
        return (None, None, RelativePosition::Before);
    }
    if text_offset < symbols[0].location.offset {
        return (None, None, RelativePosition::Before);
    }
    // `partition_point` over "offset <= text_offset" finds one past the
    // last matching symbol; symbols are emitted in ascending text order.
    let idx = symbols.partition_point(|s| s.location.offset <= text_offset);
    let matched = idx - 1;
    let symbol = symbols[matched];
    let is_eof = matched == symbols.len() - 1 && symbol.location.length == 0;
    let relative = if is_eof {
        RelativePosition::AtEof
    } else if text_offset < symbol.location.end() {
        RelativePosition::InsideSymbol
    } else {
        RelativePosition::After
    };
    let previous = if matched == 0 { None } else { Some(matched - 1) };
    (Some(matched), previous, relative)
}

/// Finds the AST node whose location matches `symbol`'s span: leaves
/// carry the exact location of the token that produced them, so this
/// is a direct lookup rather than a geometric descent. Composite nodes
/// are only considered when no leaf matches (the cursor sits on the
/// construct's own leading keyword, e.g. right after `SELECT`).
fn find_node_for_symbol(analyzed: &AnalyzedScript, symbol: Symbol) -> Option<u32> {
    let ast = &analyzed.parsed.ast;
    let mut composite_fallback = None;
    for (id, node) in ast.nodes().iter().enumerate() {
        if node.location == symbol.location {
            if node.is_leaf() {
                return Some(id as u32);
            }
            composite_fallback.get_or_insert(id as u32);
        }
    }
    composite_fallback
}

fn path_to_root(analyzed: &AnalyzedScript, node_id: u32) -> Vec<u32> {
    let ast = &analyzed.parsed.ast;
    let mut path = Vec::new();
    let mut cur = node_id;
    loop {
        path.push(cur);
        let parent = ast.get(cur).parent_id;
        if parent == NONE_ID {
            break;
        }
        cur = parent;
    }
    path
}

/// Innermost-first chain of enclosing `NameScope`s: finds the first
/// scope whose root appears on the path, then follows `parent_scope`
/// links outward (already computed by `link_scope_hierarchy`).
fn scope_stack(analyzed: &AnalyzedScript, path: &[u32]) -> Vec<u32> {
    let innermost = path.iter().find_map(|&node_id| {
        analyzed
            .name_scopes
            .iter()
            .position(|s| s.ast_scope_root == node_id)
    });
    let Some(mut idx) = innermost else { return Vec::new() };
    let mut stack = vec![idx as u32];
    while let Some(parent) = analyzed.name_scopes.get(idx as u32).parent_scope {
        stack.push(parent);
        idx = parent as usize;
    }
    stack
}

fn classify_context(analyzed: &AnalyzedScript, path: &[u32]) -> CursorContext {
    for &node_id in path {
        let node_type = analyzed.parsed.ast.get(node_id).node_type;
        match node_type {
            NodeType::ObjectSqlTableRef => {
                if let Some(idx) = analyzed.table_references.iter().position(|r| r.ast_node_id == node_id) {
                    return CursorContext::TableRef {
                        table_reference_id: idx as u32,
                    };
                }
            }
            NodeType::ObjectSqlColumnRef => {
                if let Some(idx) = analyzed.expressions.iter().position(|e| e.ast_node_id == node_id) {
                    return CursorContext::ColumnRef { expression_id: idx as u32 };
                }
            }
            _ => {}
        }
    }
    CursorContext::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryscope_catalog::Catalog;
    use queryscope_core::{parser::parse, scanner::scan};

    fn analyze_text(text: &str) -> AnalyzedScript {
        let parsed = parse(text, scan(text));
        let mut catalog = Catalog::new();
        crate::resolve::analyze(parsed, 0, &mut catalog)
    }

    #[test]
    fn test_cursor_inside_column_ref() {
        let text = "select foo from bar";
        let analyzed = analyze_text(text);
        let offset = text.find("foo").unwrap() as u32 + 1;
        let cursor = Cursor::place(&analyzed, offset);
        assert_eq!(cursor.relative_position, RelativePosition::InsideSymbol);
        assert!(matches!(cursor.context, CursorContext::ColumnRef { .. }));
    }

    #[test]
    fn test_cursor_inside_table_ref() {
        let text = "select foo from bar";
        let analyzed = analyze_text(text);
        let offset = text.find("bar").unwrap() as u32 + 1;
        let cursor = Cursor::place(&analyzed, offset);
        assert!(matches!(cursor.context, CursorContext::TableRef { .. }));
    }

    #[test]
    fn test_cursor_at_eof() {
        let text = "select 1";
        let analyzed = analyze_text(text);
        let cursor = Cursor::place(&analyzed, text.len() as u32);
        assert_eq!(cursor.relative_position, RelativePosition::AtEof);
    }

    #[test]
    fn test_cursor_scope_stack_nonempty_inside_select() {
        let text = "select a from t";
        let analyzed = analyze_text(text);
        let offset = text.find('a').unwrap() as u32;
        let cursor = Cursor::place(&analyzed, offset);
        assert!(!cursor.scopes.is_empty());
    }

    #[test]
    fn test_cursor_before_first_symbol_is_impossible_for_nonempty_script() {
        // offset 0 always lands on the first symbol, never `Before`.
        let text = "select 1";
        let analyzed = analyze_text(text);
        let cursor = Cursor::place(&analyzed, 0);
        assert_ne!(cursor.relative_position, RelativePosition::Before);
    }
}
