//! C6: the process-wide catalog of analyzed scripts and descriptor
//! pools, with global `(database, schema, table)` id generators and a
//! monotonic version counter (§4.5).
//!
//! This crate knows nothing about the AST or the name-resolution pass —
//! it only needs a read-only view of a script's declared tables, which
//! is exactly [`ScriptCatalogEntry`]. `queryscope-analyzer` implements
//! that trait for its `AnalyzedScript`, so the dependency runs one way
//! (analyzer depends on catalog) instead of circularly.

use std::sync::Arc;

use queryscope_helpers::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

mod descriptor;
mod global_id;

pub use descriptor::{SchemaDescriptor, SchemaTable, SchemaTableColumn};
pub use global_id::GlobalObjectId;

/// A table name qualified by up to its database and schema. Unlike the
/// per-script `QualifiedTableName` in the analyzer (which stores
/// references into a script's `NameRegistry`), this one owns its text:
/// it must outlive the script that produced it, since a retained
/// `AnalyzedScript` can survive edits to the live script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTableName {
    pub database_name: Option<SmolStr>,
    pub schema_name: Option<SmolStr>,
    pub table_name: SmolStr,
}

impl QualifiedTableName {
    pub fn unqualified(table_name: impl Into<SmolStr>) -> Self {
        QualifiedTableName {
            database_name: None,
            schema_name: None,
            table_name: table_name.into(),
        }
    }

    /// Two qualified names match if every component present on *either*
    /// side agrees; an absent component on one side is a wildcard, not
    /// a mismatch — mirroring how a bare `FROM t` must find `public.t`.
    pub fn matches(&self, other: &QualifiedTableName) -> bool {
        if self.table_name != other.table_name {
            return false;
        }
        let schema_ok = match (&self.schema_name, &other.schema_name) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        let db_ok = match (&self.database_name, &other.database_name) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        schema_ok && db_ok
    }
}

/// A table as seen by the catalog: enough to resolve references and
/// columns against it, nothing about how it was declared.
#[derive(Debug, Clone)]
pub struct CatalogTable {
    pub qualified_name: QualifiedTableName,
    pub catalog_database_id: u32,
    pub catalog_schema_id: u32,
    pub catalog_table_id: u32,
    pub columns: Vec<SmolStr>,
    pub ast_node_id: Option<u32>,
}

/// A read-only view of an analyzed script's declared tables, as needed
/// to register it in the catalog. Implemented by
/// `queryscope_analyzer::AnalyzedScript`.
pub trait ScriptCatalogEntry: std::fmt::Debug {
    fn catalog_entry_id(&self) -> u32;
    fn tables(&self) -> &[CatalogTable];
}

/// Backing storage for a descriptor pool: tables registered directly
/// (via `add_schema_descriptor`) rather than parsed out of a script.
/// Retains the serialized descriptor bytes alongside the parsed tables —
/// not because our owned `SmolStr` columns borrow from them (they
/// don't), but to keep the ownership shape spec.md §3 describes for a
/// pool's "owning backing storage" intact for a future zero-copy pass.
#[derive(Debug, Clone, Default)]
pub struct DescriptorPool {
    entry_id: u32,
    tables: Vec<CatalogTable>,
    backing_bytes: Vec<Vec<u8>>,
}

impl ScriptCatalogEntry for DescriptorPool {
    fn catalog_entry_id(&self) -> u32 {
        self.entry_id
    }

    fn tables(&self) -> &[CatalogTable] {
        &self.tables
    }
}

#[derive(Debug)]
enum CatalogEntryKind {
    Script(Arc<dyn ScriptCatalogEntry + Send + Sync>),
    DescriptorPool(DescriptorPool),
}

impl CatalogEntryKind {
    fn tables(&self) -> &[CatalogTable] {
        match self {
            CatalogEntryKind::Script(s) => s.tables(),
            CatalogEntryKind::DescriptorPool(p) => p.tables(),
        }
    }

    fn is_descriptor_pool(&self) -> bool {
        matches!(self, CatalogEntryKind::DescriptorPool(_))
    }
}

#[derive(Debug)]
struct CatalogEntrySlot {
    entry_id: u32,
    rank: i64,
    kind: CatalogEntryKind,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog entry id {0} is already registered")]
    ExternalIdCollision(u32),
    #[error("rank {0} is already used by another catalog entry")]
    RankCollision(i64),
    #[error("catalog entry {0} is unknown")]
    ScriptUnknown(u32),
    #[error("descriptor pool {0} is unknown")]
    DescriptorPoolUnknown(u32),
    #[error("entry {0} is not a descriptor pool")]
    NotADescriptorPool(u32),
    #[error("descriptor has no tables")]
    DescriptorTablesNull,
    #[error("descriptor table name is empty")]
    DescriptorTableNameEmpty,
    #[error("descriptor table name {0:?} collides with an existing table in this pool")]
    DescriptorTableNameCollision(QualifiedTableName),
}

#[derive(Debug, Clone, Default)]
pub struct CatalogStatistics {
    pub script_entries: usize,
    pub descriptor_pool_entries: usize,
    pub total_tables: usize,
    pub version: u64,
}

/// A summary view of one catalog entry, for `catalog_describe_entries`.
#[derive(Debug, Clone)]
pub struct CatalogEntryDescription {
    pub entry_id: u32,
    pub rank: i64,
    pub is_descriptor_pool: bool,
    pub table_count: usize,
}

/// The process-wide registry described by §4.5. Entries are ordered by
/// `rank`; lookups scan entries in that order and return the first
/// match (ties broken by insertion order, matching `ResolveNames`'s
/// catalog-lookup rule in spec.md §4.4).
#[derive(Debug, Default)]
pub struct Catalog {
    version: u64,
    entries: Vec<CatalogEntrySlot>,
    entry_index: IndexMap<u32, usize>,
    ranks_in_use: IndexMap<i64, u32>,
    database_ids: IndexMap<SmolStr, u32>,
    schema_ids: IndexMap<(u32, SmolStr), u32>,
    table_ids: IndexMap<(u32, u32, SmolStr), u32>,
    next_database_id: u32,
    next_schema_id: u32,
    next_table_id: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    // ---- id generators (§4.4, §4.5) -----------------------------------

    pub fn allocate_database(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.database_ids.get(name) {
            return id;
        }
        let id = self.next_database_id;
        self.next_database_id += 1;
        self.database_ids.insert(SmolStr::new(name), id);
        self.bump_version();
        id
    }

    pub fn allocate_schema(&mut self, database_id: u32, name: &str) -> u32 {
        let key = (database_id, SmolStr::new(name));
        if let Some(&id) = self.schema_ids.get(&key) {
            return id;
        }
        let id = self.next_schema_id;
        self.next_schema_id += 1;
        self.schema_ids.insert(key, id);
        self.bump_version();
        id
    }

    pub fn allocate_table(&mut self, database_id: u32, schema_id: u32, name: &str) -> u32 {
        let key = (database_id, schema_id, SmolStr::new(name));
        if let Some(&id) = self.table_ids.get(&key) {
            return id;
        }
        let id = self.next_table_id;
        self.next_table_id += 1;
        self.table_ids.insert(key, id);
        self.bump_version();
        id
    }

    // ---- entries --------------------------------------------------------

    /// Inserts `entry`'s latest analyzed snapshot at `rank`. Errors if
    /// `entry_id` or `rank` is already in use by another entry (§4.5,
    /// §7 `EXTERNAL_ID_COLLISION`).
    pub fn load_script(
        &mut self,
        rank: i64,
        entry: Arc<dyn ScriptCatalogEntry + Send + Sync>,
    ) -> Result<(), CatalogError> {
        let entry_id = entry.catalog_entry_id();
        self.check_new_entry(entry_id, rank)?;
        self.insert_entry(entry_id, rank, CatalogEntryKind::Script(entry));
        log::debug!("loaded script entry_id={entry_id} rank={rank} catalog_version={}", self.version);
        Ok(())
    }

    pub fn drop_script(&mut self, entry_id: u32) -> Result<(), CatalogError> {
        self.drop_entry(entry_id)
    }

    pub fn add_descriptor_pool(&mut self, entry_id: u32, rank: i64) -> Result<(), CatalogError> {
        self.check_new_entry(entry_id, rank)?;
        self.insert_entry(
            entry_id,
            rank,
            CatalogEntryKind::DescriptorPool(DescriptorPool {
                entry_id,
                tables: Vec::new(),
                backing_bytes: Vec::new(),
            }),
        );
        Ok(())
    }

    pub fn drop_descriptor_pool(&mut self, entry_id: u32) -> Result<(), CatalogError> {
        self.drop_entry(entry_id)
    }

    /// Parses `bytes` as a [`SchemaDescriptor`] and registers its tables
    /// into the pool named by `entry_id`, allocating catalog ids from
    /// the same generators `LoadScript` uses. `owner` is retained
    /// alongside the parsed tables (§3, §4.5).
    pub fn add_schema_descriptor(&mut self, entry_id: u32, descriptor: &SchemaDescriptor, owner: Vec<u8>) -> Result<(), CatalogError> {
        if descriptor.tables.is_empty() {
            return Err(CatalogError::DescriptorTablesNull);
        }
        let database_id = self.allocate_database(&descriptor.database_name);
        let schema_id = self.allocate_schema(database_id, &descriptor.schema_name);
        let mut new_tables = Vec::with_capacity(descriptor.tables.len());
        for table in &descriptor.tables {
            if table.table_name.is_empty() {
                return Err(CatalogError::DescriptorTableNameEmpty);
            }
            let qualified_name = QualifiedTableName {
                database_name: Some(SmolStr::new(&descriptor.database_name)),
                schema_name: Some(SmolStr::new(&descriptor.schema_name)),
                table_name: SmolStr::new(&table.table_name),
            };
            let slot = self.find_entry_mut(entry_id)?;
            let CatalogEntryKind::DescriptorPool(pool) = &slot.kind else {
                return Err(CatalogError::NotADescriptorPool(entry_id));
            };
            if pool.tables.iter().any(|t| t.qualified_name == qualified_name) {
                return Err(CatalogError::DescriptorTableNameCollision(qualified_name));
            }
            let catalog_table_id = self.allocate_table(database_id, schema_id, &table.table_name);
            new_tables.push(CatalogTable {
                qualified_name,
                catalog_database_id: database_id,
                catalog_schema_id: schema_id,
                catalog_table_id,
                columns: table.columns.iter().map(|c| SmolStr::new(&c.column_name)).collect(),
                ast_node_id: None,
            });
        }
        let slot = self.find_entry_mut(entry_id)?;
        let CatalogEntryKind::DescriptorPool(pool) = &mut slot.kind else {
            return Err(CatalogError::NotADescriptorPool(entry_id));
        };
        pool.tables.extend(new_tables);
        pool.backing_bytes.push(owner);
        self.bump_version();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.entry_index.clear();
        self.ranks_in_use.clear();
        self.database_ids.clear();
        self.schema_ids.clear();
        self.table_ids.clear();
        self.next_database_id = 0;
        self.next_schema_id = 0;
        self.next_table_id = 0;
        // Version keeps increasing even across Clear (§3 Lifecycle).
        self.bump_version();
    }

    // ---- lookup ----------------------------------------------------------

    /// First match across entries in rank order, as `ResolveNames`
    /// requires (§4.4: "scripts of higher rank precede lower").
    pub fn find_table(&self, name: &QualifiedTableName) -> Option<(GlobalObjectId, &CatalogTable)> {
        for slot in self.ranked_entries() {
            for (idx, table) in slot.kind.tables().iter().enumerate() {
                if table.qualified_name.matches(name) {
                    return Some((GlobalObjectId::new(slot.entry_id, idx as u32), table));
                }
            }
        }
        None
    }

    /// Every registered table across every entry, in rank order —
    /// the enumeration completion's catalog-sweep strategies need (§4.7).
    pub fn tables(&self) -> impl Iterator<Item = (GlobalObjectId, &CatalogTable)> {
        self.ranked_entries()
            .flat_map(|slot| slot.kind.tables().iter().enumerate().map(move |(idx, t)| (GlobalObjectId::new(slot.entry_id, idx as u32), t)))
    }

    pub fn resolve(&self, id: GlobalObjectId) -> Option<&CatalogTable> {
        if id.is_none() {
            return None;
        }
        let slot = self.entries.get(*self.entry_index.get(&id.entry_id())?)?;
        slot.kind.tables().get(id.index() as usize)
    }

    fn ranked_entries(&self) -> impl Iterator<Item = &CatalogEntrySlot> {
        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.sort_by_key(|&i| (std::cmp::Reverse(self.entries[i].rank), i));
        indices.into_iter().map(move |i| &self.entries[i])
    }

    pub fn describe_entries(&self) -> Vec<CatalogEntryDescription> {
        self.ranked_entries()
            .map(|slot| CatalogEntryDescription {
                entry_id: slot.entry_id,
                rank: slot.rank,
                is_descriptor_pool: slot.kind.is_descriptor_pool(),
                table_count: slot.kind.tables().len(),
            })
            .collect()
    }

    pub fn get_statistics(&self) -> CatalogStatistics {
        let mut stats = CatalogStatistics {
            version: self.version,
            ..Default::default()
        };
        for slot in &self.entries {
            stats.total_tables += slot.kind.tables().len();
            if slot.kind.is_descriptor_pool() {
                stats.descriptor_pool_entries += 1;
            } else {
                stats.script_entries += 1;
            }
        }
        stats
    }

    // ---- internals ---------------------------------------------------

    fn check_new_entry(&self, entry_id: u32, rank: i64) -> Result<(), CatalogError> {
        if self.entry_index.contains_key(&entry_id) {
            return Err(CatalogError::ExternalIdCollision(entry_id));
        }
        if self.ranks_in_use.contains_key(&rank) {
            return Err(CatalogError::RankCollision(rank));
        }
        Ok(())
    }

    fn insert_entry(&mut self, entry_id: u32, rank: i64, kind: CatalogEntryKind) {
        let slot_idx = self.entries.len();
        self.entries.push(CatalogEntrySlot { entry_id, rank, kind });
        self.entry_index.insert(entry_id, slot_idx);
        self.ranks_in_use.insert(rank, entry_id);
        self.bump_version();
    }

    fn drop_entry(&mut self, entry_id: u32) -> Result<(), CatalogError> {
        let idx = self
            .entry_index
            .get(&entry_id)
            .copied()
            .ok_or(CatalogError::ScriptUnknown(entry_id))?;
        let slot = self.entries.remove(idx);
        self.ranks_in_use.shift_remove(&slot.rank);
        self.entry_index.shift_remove(&entry_id);
        for (_, v) in self.entry_index.iter_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
        self.bump_version();
        Ok(())
    }

    fn find_entry_mut(&mut self, entry_id: u32) -> Result<&mut CatalogEntrySlot, CatalogError> {
        let idx = self
            .entry_index
            .get(&entry_id)
            .copied()
            .ok_or(CatalogError::DescriptorPoolUnknown(entry_id))?;
        Ok(&mut self.entries[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct FakeScript {
        entry_id: u32,
        tables: Vec<CatalogTable>,
    }

    impl ScriptCatalogEntry for FakeScript {
        fn catalog_entry_id(&self) -> u32 {
            self.entry_id
        }
        fn tables(&self) -> &[CatalogTable] {
            &self.tables
        }
    }

    fn table(name: &str, columns: &[&str]) -> CatalogTable {
        CatalogTable {
            qualified_name: QualifiedTableName {
                database_name: None,
                schema_name: Some(SmolStr::new("public")),
                table_name: SmolStr::new(name),
            },
            catalog_database_id: 0,
            catalog_schema_id: 0,
            catalog_table_id: 0,
            columns: columns.iter().map(|c| SmolStr::new(*c)).collect(),
            ast_node_id: None,
        }
    }

    #[test]
    fn test_id_generators_reuse_same_tuple() {
        let mut cat = Catalog::new();
        let db1 = cat.allocate_database("main");
        let db2 = cat.allocate_database("main");
        assert_eq!(db1, db2);
        let sch1 = cat.allocate_schema(db1, "public");
        let sch2 = cat.allocate_schema(db1, "public");
        assert_eq!(sch1, sch2);
        let t1 = cat.allocate_table(db1, sch1, "users");
        let t2 = cat.allocate_table(db1, sch1, "users");
        assert_eq!(t1, t2);
    }

    #[test]
    fn test_load_script_bumps_version_and_is_findable() {
        let mut cat = Catalog::new();
        let before = cat.version();
        let entry = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![table("t", &["a", "b"])],
        });
        cat.load_script(0, entry).unwrap();
        assert!(cat.version() > before);
        let found = cat.find_table(&QualifiedTableName::unqualified("t"));
        assert!(found.is_some());
    }

    #[test]
    fn test_duplicate_entry_id_is_collision() {
        let mut cat = Catalog::new();
        let entry = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![],
        });
        cat.load_script(0, entry.clone()).unwrap();
        let err = cat.load_script(1, entry).unwrap_err();
        assert!(matches!(err, CatalogError::ExternalIdCollision(1)));
    }

    #[test]
    fn test_rank_collision_rejected() {
        let mut cat = Catalog::new();
        let a = Arc::new(FakeScript { entry_id: 1, tables: vec![] });
        let b = Arc::new(FakeScript { entry_id: 2, tables: vec![] });
        cat.load_script(5, a).unwrap();
        let err = cat.load_script(5, b).unwrap_err();
        assert!(matches!(err, CatalogError::RankCollision(5)));
    }

    #[test]
    fn test_rank_order_controls_lookup_precedence() {
        let mut cat = Catalog::new();
        let low = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![table("t", &["a"])],
        });
        let high = Arc::new(FakeScript {
            entry_id: 2,
            tables: vec![table("t", &["x", "y"])],
        });
        cat.load_script(0, low).unwrap();
        cat.load_script(10, high).unwrap();
        let (id, found) = cat.find_table(&QualifiedTableName::unqualified("t")).unwrap();
        assert_eq!(found.columns.len(), 2);
        assert_eq!(id.entry_id(), 2);
    }

    #[test]
    fn test_drop_script_removes_entry() {
        let mut cat = Catalog::new();
        let entry = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![table("t", &["a"])],
        });
        cat.load_script(0, entry).unwrap();
        cat.drop_script(1).unwrap();
        assert!(cat.find_table(&QualifiedTableName::unqualified("t")).is_none());
        assert!(matches!(cat.drop_script(1).unwrap_err(), CatalogError::ScriptUnknown(1)));
    }

    #[test]
    fn test_clear_keeps_version_monotonic() {
        let mut cat = Catalog::new();
        let entry = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![table("t", &["a"])],
        });
        cat.load_script(0, entry).unwrap();
        let before = cat.version();
        cat.clear();
        assert!(cat.version() > before);
        assert!(cat.find_table(&QualifiedTableName::unqualified("t")).is_none());
        // generators reset: the same name gets the same id again
        let db = cat.allocate_database("main");
        assert_eq!(db, 0);
    }

    #[test]
    fn test_schema_descriptor_registers_tables() {
        let mut cat = Catalog::new();
        cat.add_descriptor_pool(7, 0).unwrap();
        let descriptor = SchemaDescriptor {
            database_name: "main".to_string(),
            schema_name: "public".to_string(),
            tables: vec![SchemaTable {
                table_name: "users".to_string(),
                columns: vec![
                    SchemaTableColumn { column_name: "id".to_string() },
                    SchemaTableColumn { column_name: "email".to_string() },
                ],
            }],
        };
        cat.add_schema_descriptor(7, &descriptor, b"raw bytes".to_vec()).unwrap();
        let found = cat.find_table(&QualifiedTableName {
            database_name: Some(SmolStr::new("main")),
            schema_name: Some(SmolStr::new("public")),
            table_name: SmolStr::new("users"),
        });
        assert!(found.is_some());
        assert_eq!(found.unwrap().1.columns.len(), 2);
    }

    #[test]
    fn test_tables_enumerates_in_rank_order() {
        let mut cat = Catalog::new();
        let low = Arc::new(FakeScript {
            entry_id: 1,
            tables: vec![table("low_table", &["a"])],
        });
        let high = Arc::new(FakeScript {
            entry_id: 2,
            tables: vec![table("high_table", &["b"])],
        });
        cat.load_script(0, low).unwrap();
        cat.load_script(10, high).unwrap();
        let names: Vec<_> = cat.tables().map(|(_, t)| t.qualified_name.table_name.clone()).collect();
        assert_eq!(names, vec![SmolStr::new("high_table"), SmolStr::new("low_table")]);
    }

    #[test]
    fn test_schema_descriptor_empty_table_name_rejected() {
        let mut cat = Catalog::new();
        cat.add_descriptor_pool(7, 0).unwrap();
        let descriptor = SchemaDescriptor {
            database_name: "main".to_string(),
            schema_name: "public".to_string(),
            tables: vec![SchemaTable {
                table_name: String::new(),
                columns: vec![],
            }],
        };
        let err = cat.add_schema_descriptor(7, &descriptor, vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::DescriptorTableNameEmpty));
    }
}
