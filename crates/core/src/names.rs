//! Per-script interned name registry (C5).

use queryscope_helpers::IndexMap;
use smol_str::SmolStr;

use crate::tokens::Location;

/// A bitset recording every semantic role a name has been observed in.
/// Tags accumulate monotonically across analyses within the same
/// script: a name used once as a table and later as a column carries
/// both bits afterward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameTags(u16);

impl NameTags {
    pub const NONE: NameTags = NameTags(0);
    pub const DATABASE_NAME: NameTags = NameTags(1 << 0);
    pub const SCHEMA_NAME: NameTags = NameTags(1 << 1);
    pub const TABLE_NAME: NameTags = NameTags(1 << 2);
    pub const TABLE_ALIAS: NameTags = NameTags(1 << 3);
    pub const COLUMN_NAME: NameTags = NameTags(1 << 4);

    pub fn contains(self, other: NameTags) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: NameTags) {
        self.0 |= other.0;
    }

    pub fn union(self, other: NameTags) -> NameTags {
        NameTags(self.0 | other.0)
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for NameTags {
    type Output = NameTags;
    fn bitor(self, rhs: NameTags) -> NameTags {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for NameTags {
    fn bitor_assign(&mut self, rhs: NameTags) {
        self.insert(rhs);
    }
}

pub type NameId = u32;

/// A name interned by the scanner. `text` is cheap to clone (`SmolStr`
/// inlines short strings), sidestepping any "view into the owning
/// script's text buffer" lifetime entirely.
#[derive(Debug, Clone)]
pub struct RegisteredName {
    pub id: NameId,
    pub text: SmolStr,
    pub first_location: Location,
    pub occurrences: u32,
    pub tags: NameTags,
}

/// Per-script name interning table: `text -> RegisteredName`.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: Vec<RegisteredName>,
    by_text: IndexMap<SmolStr, NameId>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an occurrence of `text` at `location`, returning its
    /// stable id. Repeated registrations of the same text bump the
    /// occurrence counter and leave `tags` untouched (tags are applied
    /// separately once the parser knows the name's grammatical role).
    pub fn register(&mut self, text: &str, location: Location) -> NameId {
        if let Some(&id) = self.by_text.get(text) {
            self.names[id as usize].occurrences += 1;
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(RegisteredName {
            id,
            text: SmolStr::new(text),
            first_location: location,
            occurrences: 1,
            tags: NameTags::NONE,
        });
        self.by_text.insert(SmolStr::new(text), id);
        id
    }

    /// Registers a keyword spelling used in name position (e.g. a
    /// quoted identifier matching a keyword, or the parser promoting a
    /// bare keyword to a name).
    pub fn register_keyword_as_name(&mut self, text: &str, location: Location) -> NameId {
        self.register(text, location)
    }

    pub fn get(&self, id: NameId) -> &RegisteredName {
        &self.names[id as usize]
    }

    pub fn tag(&mut self, id: NameId, tags: NameTags) {
        self.names[id as usize].tags.insert(tags);
    }

    pub fn text_of(&self, id: NameId) -> &str {
        &self.names[id as usize].text
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegisteredName> {
        self.names.iter()
    }

    pub fn lookup(&self, text: &str) -> Option<NameId> {
        self.by_text.get(text).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_dedupes_by_text() {
        let mut reg = NameRegistry::new();
        let a = reg.register("foo", Location::new(0, 3));
        let b = reg.register("foo", Location::new(10, 3));
        assert_eq!(a, b);
        assert_eq!(reg.get(a).occurrences, 2);
    }

    #[test]
    fn test_tags_accumulate_monotonically() {
        let mut reg = NameRegistry::new();
        let id = reg.register("foo", Location::new(0, 3));
        reg.tag(id, NameTags::COLUMN_NAME);
        reg.tag(id, NameTags::TABLE_NAME);
        let tags = reg.get(id).tags;
        assert!(tags.contains(NameTags::COLUMN_NAME));
        assert!(tags.contains(NameTags::TABLE_NAME));
    }
}
