//! C7-C9: name resolution, cursor placement and completion ranking.
//!
//! `queryscope-analyzer` turns a `queryscope_core::ParsedScript` plus a
//! `queryscope_catalog::Catalog` into an `AnalyzedScript` (§4.4), and
//! then answers two editor-grade questions against that result: "what
//! is under the cursor" (§4.6) and "what should I suggest next" (§4.7).

pub mod completion;
pub mod cursor;
pub mod model;
pub mod resolve;

pub use completion::{complete_at_cursor, Candidate, CandidateKind, TopKHeap};
pub use cursor::{Cursor, CursorContext, RelativePosition};
pub use model::{
    AnalyzedScript, AnalyzerError, AnalyzerErrorKind, Expression, ExpressionKind, NameScope, QualifiedColumnName,
    QualifiedTableName, QueryGraphEdge, TableColumn, TableDeclaration, TableReference, TableReferenceStatus,
};
pub use resolve::analyze;
