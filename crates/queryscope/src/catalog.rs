//! Thin wrapper over `queryscope_catalog::Catalog` that maps its
//! `Result<_, CatalogError>` returns onto `QueryScopeError` and adds the
//! wire-framed variants of `describe_entries`/`get_statistics` §6 calls
//! for across the embedding boundary.

use queryscope_catalog::{CatalogStatistics, SchemaDescriptor};

use crate::errors::QueryScopeError;
use crate::wire;

/// The process-wide (or per-session) catalog facade (§3, §4.5).
#[derive(Debug, Default)]
pub struct Catalog {
    inner: queryscope_catalog::Catalog,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            inner: queryscope_catalog::Catalog::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    pub fn inner(&self) -> &queryscope_catalog::Catalog {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut queryscope_catalog::Catalog {
        &mut self.inner
    }

    pub fn drop_script(&mut self, entry_id: u32) -> Result<(), QueryScopeError> {
        Ok(self.inner.drop_script(entry_id)?)
    }

    pub fn add_descriptor_pool(&mut self, entry_id: u32, rank: i64) -> Result<(), QueryScopeError> {
        Ok(self.inner.add_descriptor_pool(entry_id, rank)?)
    }

    pub fn drop_descriptor_pool(&mut self, entry_id: u32) -> Result<(), QueryScopeError> {
        Ok(self.inner.drop_descriptor_pool(entry_id)?)
    }

    /// Registers `descriptor`'s tables into pool `entry_id`. `owner` is
    /// the serialized form of `descriptor` as the schema-descriptor
    /// binary format of §6 describes it — the facade encodes it with
    /// [`wire`] and hands the bytes to the catalog to retain, so its
    /// in-memory view keeps a pointer to the backing bytes without
    /// requiring callers to encode it twice.
    pub fn add_schema_descriptor(&mut self, entry_id: u32, descriptor: &SchemaDescriptor) -> Result<(), QueryScopeError> {
        let owner = encode_schema_descriptor(descriptor);
        Ok(self.inner.add_schema_descriptor(entry_id, descriptor, owner)?)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn describe_entries_to_wire(&self) -> Vec<u8> {
        let mut w = wire::FrameWriter::new();
        let entries = self.inner.describe_entries();
        w.write_u32(entries.len() as u32);
        for entry in &entries {
            w.write_u32(entry.entry_id);
            w.write_i64(entry.rank);
            w.write_u32(entry.is_descriptor_pool as u32);
            w.write_u32(entry.table_count as u32);
        }
        w.finish()
    }

    pub fn get_statistics(&self) -> CatalogStatistics {
        self.inner.get_statistics()
    }
}

/// Encodes a [`SchemaDescriptor`] per the §6 logical schema:
/// `{database_name, schema_name, tables: [{table_name, columns: [{column_name}]}]}`.
pub fn encode_schema_descriptor(descriptor: &SchemaDescriptor) -> Vec<u8> {
    let mut w = wire::FrameWriter::new();
    w.write_str(&descriptor.database_name);
    w.write_str(&descriptor.schema_name);
    w.write_u32(descriptor.tables.len() as u32);
    for table in &descriptor.tables {
        w.write_str(&table.table_name);
        w.write_u32(table.columns.len() as u32);
        for column in &table.columns {
            w.write_str(&column.column_name);
        }
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryscope_catalog::{SchemaTable, SchemaTableColumn};

    #[test]
    fn test_add_schema_descriptor_then_find_table() {
        let mut catalog = Catalog::new();
        catalog.add_descriptor_pool(1, 0).unwrap();
        let descriptor = SchemaDescriptor {
            database_name: "db".into(),
            schema_name: "public".into(),
            tables: vec![SchemaTable {
                table_name: "users".into(),
                columns: vec![SchemaTableColumn { column_name: "id".into() }],
            }],
        };
        catalog.add_schema_descriptor(1, &descriptor).unwrap();
        assert_eq!(catalog.inner().tables().count(), 1);
    }

    #[test]
    fn test_duplicate_entry_id_is_external_id_collision() {
        let mut catalog = Catalog::new();
        catalog.add_descriptor_pool(1, 0).unwrap();
        let err = catalog.add_descriptor_pool(1, 1).unwrap_err();
        assert!(matches!(err, QueryScopeError::ExternalIdCollision(1)));
    }
}
