//! The frozen result of parsing: a scan result plus the flat AST buffer.

use crate::ast::AstBuffer;
use crate::errors::SqlSyntaxError;
use crate::scanner::ScanResult;

/// Snapshot produced by [`crate::parser::parse`]. Always returned, even
/// when `errors` is non-empty (best-effort recovery, §4.3).
#[derive(Debug, Clone)]
pub struct ParsedScript {
    pub scanned: ScanResult,
    pub ast: AstBuffer,
    pub errors: Vec<SqlSyntaxError>,
}
