//! `Script`: the per-buffer handle of §3's Lifecycle paragraph. Holds a
//! `Rope`, and caches each stage's output (`ScanResult` / `ParsedScript`
//! / `AnalyzedScript`) until a text edit invalidates everything past
//! the edit, without needing a dirty-bit per field, since every edit
//! method just drops the cached `Option`s outright.

use std::sync::Arc;
use std::time::{Duration, Instant};

use queryscope_analyzer::{complete_at_cursor, resolve, Candidate, Cursor};
use queryscope_catalog::Catalog;
use queryscope_core::parsed_script::ParsedScript;
use queryscope_core::scanner::{self, ScanResult};
use queryscope_rope::Rope;

use crate::errors::QueryScopeError;
use crate::statistics::ScriptStatistics;
use crate::wire;

/// A text buffer plus the cached Scan/Parse/Analyze snapshots computed
/// from it (§3). `catalog_entry_id` is the caller-supplied id this
/// script registers under once analyzed and loaded into a `Catalog`.
pub struct Script {
    rope: Rope,
    catalog_entry_id: u32,
    scanned: Option<ScanResult>,
    parsed: Option<ParsedScript>,
    analyzed: Option<Arc<queryscope_analyzer::AnalyzedScript>>,
    scan_duration: Option<Duration>,
    parse_duration: Option<Duration>,
    analyze_duration: Option<Duration>,
}

impl Script {
    pub fn new(catalog_entry_id: u32) -> Self {
        Script::from_text(catalog_entry_id, "")
    }

    pub fn from_text(catalog_entry_id: u32, text: &str) -> Self {
        Script {
            rope: Rope::from(text),
            catalog_entry_id,
            scanned: None,
            parsed: None,
            analyzed: None,
            scan_duration: None,
            parse_duration: None,
            analyze_duration: None,
        }
    }

    pub fn catalog_entry_id(&self) -> u32 {
        self.catalog_entry_id
    }

    // ---- text editing -----------------------------------------------

    /// Drops every cached downstream snapshot (§3: an edit invalidates
    /// Scan, Parse and Analyze alike, since all three key off the text
    /// this script held when each ran).
    fn invalidate(&mut self) {
        self.scanned = None;
        self.parsed = None;
        self.analyzed = None;
    }

    pub fn insert_char_at(&mut self, char_idx: usize, c: char) {
        let mut buf = [0u8; 4];
        self.rope.insert(char_idx, c.encode_utf8(&mut buf));
        self.invalidate();
    }

    pub fn insert_text_at(&mut self, char_idx: usize, text: &str) {
        self.rope.insert(char_idx, text);
        self.invalidate();
    }

    pub fn replace_text(&mut self, char_idx: usize, count: usize, text: &str) {
        self.rope.replace(char_idx, count, text);
        self.invalidate();
    }

    pub fn erase_text_range(&mut self, char_idx: usize, count: usize) {
        self.rope.remove(char_idx, count);
        self.invalidate();
    }

    pub fn to_string(&self) -> String {
        self.rope.to_text_string()
    }

    // ---- lifecycle stages ---------------------------------------------

    pub fn scan(&mut self) -> &ScanResult {
        if self.scanned.is_none() {
            let text = self.rope.to_text_string();
            let started = Instant::now();
            let result = scanner::scan(&text);
            self.scan_duration = Some(started.elapsed());
            self.scanned = Some(result);
        }
        self.scanned.as_ref().expect("just populated")
    }

    /// Parses the most recent `scan()` result. Returns
    /// `PARSER_INPUT_NOT_SCANNED` if `scan` hasn't run yet, matching
    /// the §7 status code for calling Parse before Scan — `Script`
    /// doesn't auto-scan here so that callers who only want the scan
    /// stage's timings aren't charged for a parse they never asked for.
    pub fn parse(&mut self) -> Result<&ParsedScript, QueryScopeError> {
        if self.parsed.is_none() {
            let scanned = self.scanned.take().ok_or(QueryScopeError::ParserInputNotScanned)?;
            let text = self.rope.to_text_string();
            let started = Instant::now();
            let result = queryscope_core::parser::parse(&text, scanned);
            self.parse_duration = Some(started.elapsed());
            self.parsed = Some(result);
        }
        Ok(self.parsed.as_ref().expect("just populated"))
    }

    /// Analyzes the most recent `parse()` result against `catalog` and
    /// registers the result into it at `rank`. Returns
    /// `ANALYZER_INPUT_NOT_PARSED` if `parse` hasn't run yet (§7). If
    /// `catalog.load_script` rejects the load (e.g. `EXTERNAL_ID_COLLISION`),
    /// the parsed snapshot is handed back to `self.parsed` rather than lost,
    /// so the caller can retry with a different rank or entry id.
    pub fn analyze(&mut self, catalog: &mut Catalog, rank: i64) -> Result<Arc<queryscope_analyzer::AnalyzedScript>, QueryScopeError> {
        if self.analyzed.is_none() {
            let parsed = self.parsed.take().ok_or(QueryScopeError::AnalyzerInputNotParsed)?;
            let started = Instant::now();
            let analyzed = resolve::analyze(parsed, self.catalog_entry_id, catalog);
            self.analyze_duration = Some(started.elapsed());
            let analyzed = Arc::new(analyzed);
            if let Err(err) = catalog.load_script(rank, analyzed.clone() as Arc<dyn queryscope_catalog::ScriptCatalogEntry + Send + Sync>) {
                self.parsed = Some(
                    Arc::try_unwrap(analyzed)
                        .expect("the catalog never retains its argument on a failed load")
                        .parsed,
                );
                return Err(err.into());
            }
            self.analyzed = Some(analyzed);
        }
        Ok(self.analyzed.as_ref().expect("just populated").clone())
    }

    pub fn analyzed(&self) -> Option<&Arc<queryscope_analyzer::AnalyzedScript>> {
        self.analyzed.as_ref()
    }

    // ---- cursor / completion ------------------------------------------

    pub fn move_cursor(&self, text_offset: u32) -> Result<Cursor, QueryScopeError> {
        let analyzed = self.analyzed.as_ref().ok_or(QueryScopeError::AnalyzerInputNotParsed)?;
        Ok(Cursor::place(analyzed, text_offset))
    }

    pub fn complete_at_cursor(&self, catalog: &Catalog, cursor: &Cursor, limit: usize) -> Result<Vec<Candidate>, QueryScopeError> {
        let analyzed = self.analyzed.as_ref().ok_or(QueryScopeError::CompletionMissesCursor)?;
        if cursor.symbol_id.is_none() {
            return Err(QueryScopeError::CompletionMissesScannerToken);
        }
        Ok(complete_at_cursor(analyzed, catalog, cursor, limit))
    }

    // ---- statistics and framing -----------------------------------------

    pub fn get_statistics(&self) -> ScriptStatistics {
        let stats = self.rope.stats();
        let mut out = ScriptStatistics {
            text_bytes: self.rope.len_bytes(),
            text_codepoints: self.rope.len_codepoints(),
            line_breaks: self.rope.line_breaks(),
            scan_duration: self.scan_duration,
            parse_duration: self.parse_duration,
            analyze_duration: self.analyze_duration,
            ..Default::default()
        };
        debug_assert_eq!(out.text_bytes, stats.text_bytes);

        if let Some(scanned) = &self.scanned {
            out.symbol_count = scanned.symbols.len();
            out.scanner_error_count = scanned.errors.len();
        }
        if let Some(parsed) = &self.parsed {
            out.ast_node_count = parsed.ast.nodes().len();
            out.statement_count = parsed.ast.statements().len();
            out.parser_error_count = parsed.errors.len();
            out.scanner_error_count = parsed.scanned.errors.len();
            out.symbol_count = parsed.scanned.symbols.len();
        }
        if let Some(analyzed) = &self.analyzed {
            out.ast_node_count = analyzed.parsed.ast.nodes().len();
            out.statement_count = analyzed.parsed.ast.statements().len();
            out.parser_error_count = analyzed.parsed.errors.len();
            out.scanner_error_count = analyzed.parsed.scanned.errors.len();
            out.symbol_count = analyzed.parsed.scanned.symbols.len();
            out.table_count = analyzed.tables.len();
            out.table_reference_count = analyzed.table_references.len();
            out.expression_count = analyzed.expressions.len();
            out.analyzer_error_count = analyzed.errors.len();
        }
        out
    }

    /// Serializes the current scan result as a length-prefixed frame
    /// (§6 "Serialized outputs"): symbol count followed by each
    /// symbol's offset/length/kind-discriminant.
    pub fn scan_to_wire(&self) -> Result<Vec<u8>, QueryScopeError> {
        let scanned = self.scanned.as_ref().ok_or(QueryScopeError::ParserInputNotScanned)?;
        let mut w = wire::FrameWriter::new();
        w.write_u32(scanned.symbols.len() as u32);
        for symbol in &scanned.symbols {
            w.write_u32(symbol.location.offset);
            w.write_u32(symbol.location.length);
            w.write_u32(symbol.kind as u32);
        }
        w.write_u32(scanned.errors.len() as u32);
        for (location, message) in &scanned.errors {
            w.write_u32(location.offset);
            w.write_u32(location.length);
            w.write_str(message);
        }
        Ok(w.finish())
    }

    /// Serializes the current AST as a length-prefixed frame: node
    /// count followed by each node's type/parent id/location.
    pub fn parse_to_wire(&self) -> Result<Vec<u8>, QueryScopeError> {
        let parsed = self.parsed.as_ref().ok_or(QueryScopeError::AnalyzerInputNotParsed)?;
        let mut w = wire::FrameWriter::new();
        w.write_u32(parsed.ast.nodes().len() as u32);
        for node in parsed.ast.nodes() {
            w.write_u32(node.node_type as u32);
            w.write_u32(node.parent_id);
            w.write_u32(node.location.offset);
            w.write_u32(node.location.length);
        }
        w.write_u32(parsed.errors.len() as u32);
        for err in &parsed.errors {
            w.write_u32(err.location.offset);
            w.write_u32(err.location.length);
            w.write_str(&err.message);
        }
        Ok(w.finish())
    }

    /// Serializes the current analysis as a length-prefixed frame:
    /// table/reference/expression counts plus each table reference's
    /// resolution status.
    pub fn analyze_to_wire(&self) -> Result<Vec<u8>, QueryScopeError> {
        let analyzed = self.analyzed.as_ref().ok_or(QueryScopeError::AnalyzerInputNotParsed)?;
        let mut w = wire::FrameWriter::new();
        w.write_u64(analyzed.catalog_version);
        w.write_u32(analyzed.table_references.len() as u32);
        for table_ref in analyzed.table_references.iter() {
            let resolved = matches!(table_ref.status, queryscope_analyzer::TableReferenceStatus::Resolved { .. });
            w.write_u32(resolved as u32);
        }
        w.write_u32(analyzed.expressions.len() as u32);
        for expr in analyzed.expressions.iter() {
            w.write_u32(expr.kind.is_resolved() as u32);
        }
        w.write_u32(analyzed.errors.len() as u32);
        for err in &analyzed.errors {
            w.write_u32(err.kind as u32);
            w.write_u32(err.location.offset);
            w.write_u32(err.location.length);
            w.write_str(&err.message);
        }
        Ok(w.finish())
    }
}
