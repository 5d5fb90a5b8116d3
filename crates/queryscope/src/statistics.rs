//! `script_get_statistics` / `catalog_get_statistics` (§6): timings and
//! memory/entry-count metrics, returned as plain structs rather than
//! wire-framed since they're meant for human/diagnostic consumption
//! (log lines, a status bar), not for crossing the embedding boundary.

use std::time::Duration;

/// Durations are `None` until the corresponding stage has run on the
/// current snapshot (§3 Lifecycle: Scan -> Parse -> Analyze).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptStatistics {
    pub text_bytes: usize,
    pub text_codepoints: usize,
    pub line_breaks: usize,
    pub symbol_count: usize,
    pub ast_node_count: usize,
    pub statement_count: usize,
    pub table_count: usize,
    pub table_reference_count: usize,
    pub expression_count: usize,
    pub scanner_error_count: usize,
    pub parser_error_count: usize,
    pub analyzer_error_count: usize,
    pub scan_duration: Option<Duration>,
    pub parse_duration: Option<Duration>,
    pub analyze_duration: Option<Duration>,
}
