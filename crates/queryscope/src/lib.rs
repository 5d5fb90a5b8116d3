//! The `queryscope` facade: a `Script`/`Catalog` handle pair over the
//! rope, scanner/parser, catalog and analyzer crates, plus the ambient
//! stack the embedding-API section of spec.md (§6) still asks of a
//! caller-facing crate even with the C ABI itself out of scope —
//! length-prefixed binary framing (`wire`), a `thiserror` status-code
//! enum (`errors`) and statistics structs (`statistics`).
//!
//! `AnalyzedScript` lives in `queryscope-analyzer`, one layer below
//! this crate, to avoid a dependency cycle: `queryscope-catalog` has no
//! knowledge of `queryscope-analyzer`, so `AnalyzedScript` implements
//! `ScriptCatalogEntry` itself rather than this crate adapting between
//! the two.

pub mod catalog;
pub mod errors;
pub mod script;
pub mod statistics;
pub mod wire;

pub use catalog::Catalog;
pub use errors::QueryScopeError;
pub use script::Script;
pub use statistics::ScriptStatistics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_before_scan_is_an_error() {
        let mut script = Script::from_text(1, "select 1");
        assert_eq!(script.parse().unwrap_err(), QueryScopeError::ParserInputNotScanned);
    }

    #[test]
    fn test_analyze_before_parse_is_an_error() {
        let mut script = Script::from_text(1, "select 1");
        script.scan();
        let mut catalog = Catalog::new();
        assert_eq!(script.analyze(catalog.inner_mut(), 0).unwrap_err(), QueryScopeError::AnalyzerInputNotParsed);
    }

    #[test]
    fn test_full_lifecycle_empty_catalog_unresolved_column() {
        let mut script = Script::from_text(1, "select foo from bar");
        script.scan();
        script.parse().unwrap();
        let mut catalog = Catalog::new();
        let analyzed = script.analyze(catalog.inner_mut(), 0).unwrap();
        assert_eq!(analyzed.table_references.len(), 1);
        assert_eq!(analyzed.expressions.len(), 1);
    }

    #[test]
    fn test_edit_invalidates_cached_analysis() {
        let mut script = Script::from_text(1, "select 1");
        script.scan();
        script.parse().unwrap();
        let mut catalog = Catalog::new();
        script.analyze(catalog.inner_mut(), 0).unwrap();
        assert!(script.analyzed().is_some());

        script.insert_text_at(8, "23");
        assert!(script.analyzed().is_none());
        assert_eq!(script.to_string(), "select 123");
    }

    #[test]
    fn test_cursor_and_completion_require_analysis() {
        let script = Script::from_text(1, "select foo from bar");
        assert_eq!(script.move_cursor(0).unwrap_err(), QueryScopeError::AnalyzerInputNotParsed);
    }

    #[test]
    fn test_statistics_track_each_stage() {
        let mut script = Script::from_text(1, "select 1");
        let stats = script.get_statistics();
        assert_eq!(stats.symbol_count, 0);

        script.scan();
        let stats = script.get_statistics();
        assert!(stats.symbol_count > 0);
        assert!(stats.scan_duration.is_some());
    }
}
