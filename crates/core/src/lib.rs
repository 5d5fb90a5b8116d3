//! C2-C5: scanner, name registry, flat AST buffer and recursive-descent
//! parser for a PostgreSQL-leaning SQL dialect.
//!
//! This crate owns everything that can be computed from a script's text
//! alone, with no knowledge of other scripts or a catalog — that's
//! `queryscope-analyzer`'s job.

pub mod ast;
pub mod errors;
pub mod names;
pub mod parsed_script;
pub mod parser;
pub mod scanner;
pub mod tokens;

pub use ast::{AstBuffer, AttributeKey, Node, NodeType, OperatorKind, Statement, StatementType};
pub use errors::SqlSyntaxError;
pub use names::{NameId, NameRegistry, NameTags, RegisteredName};
pub use parsed_script::ParsedScript;
pub use scanner::{scan, ScanResult};
pub use tokens::{Location, Symbol, TokenKind};
