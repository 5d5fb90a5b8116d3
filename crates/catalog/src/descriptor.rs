//! The logical schema of a schema descriptor blob (§6). The concrete
//! wire framing is out of scope (spec.md §1 Non-goals); this is the
//! in-memory shape callers populate after decoding one.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub database_name: String,
    pub schema_name: String,
    pub tables: Vec<SchemaTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    pub table_name: String,
    pub columns: Vec<SchemaTableColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTableColumn {
    pub column_name: String,
}
