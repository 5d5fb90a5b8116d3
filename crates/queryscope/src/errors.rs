//! `QueryScopeError`: the facade's return-value counterpart to the
//! status codes of §7. Scanner/parser/analyzer errors stay attached to
//! their script snapshots (`scanned.errors`, `parsed.errors`,
//! `analyzed.errors`) exactly as spec.md requires; these variants cover
//! only the lifecycle and catalog preconditions that would otherwise be
//! an FFI status code.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryScopeError {
    #[error("parse called before scan")]
    ParserInputNotScanned,
    #[error("analyze called before parse")]
    AnalyzerInputNotParsed,
    #[error("completion requested before a cursor was placed")]
    CompletionMissesCursor,
    #[error("cursor does not land on a scanner token")]
    CompletionMissesScannerToken,
    #[error("catalog entry id {0} is already registered")]
    ExternalIdCollision(u32),
    #[error("rank {0} is already used by another catalog entry")]
    RankCollision(i64),
    #[error("catalog entry {0} is unknown")]
    CatalogScriptUnknown(u32),
    #[error("descriptor pool {0} is unknown")]
    CatalogDescriptorPoolUnknown(u32),
    #[error("catalog entry {0} is not a descriptor pool")]
    CatalogNotADescriptorPool(u32),
    #[error("catalog entry {0} has no analyzed snapshot loaded for it")]
    CatalogScriptNotAnalyzed(u32),
    #[error("descriptor has no tables")]
    CatalogDescriptorTablesNull,
    #[error("descriptor table name is empty")]
    CatalogDescriptorTableNameEmpty,
    #[error("descriptor table name collides with an existing table in this pool")]
    CatalogDescriptorTableNameCollision,
}

impl From<queryscope_catalog::CatalogError> for QueryScopeError {
    fn from(err: queryscope_catalog::CatalogError) -> Self {
        use queryscope_catalog::CatalogError::*;
        match err {
            ExternalIdCollision(id) => QueryScopeError::ExternalIdCollision(id),
            RankCollision(rank) => QueryScopeError::RankCollision(rank),
            ScriptUnknown(id) => QueryScopeError::CatalogScriptUnknown(id),
            DescriptorPoolUnknown(id) => QueryScopeError::CatalogDescriptorPoolUnknown(id),
            NotADescriptorPool(id) => QueryScopeError::CatalogNotADescriptorPool(id),
            DescriptorTablesNull => QueryScopeError::CatalogDescriptorTablesNull,
            DescriptorTableNameEmpty => QueryScopeError::CatalogDescriptorTableNameEmpty,
            DescriptorTableNameCollision(_) => QueryScopeError::CatalogDescriptorTableNameCollision,
        }
    }
}
