//! Token kinds and the keyword lookup table.

use strum_macros::{Display, EnumIter};

/// A location in the scanned text, expressed in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Location {
    pub offset: u32,
    pub length: u32,
}

impl Location {
    pub fn new(offset: u32, length: u32) -> Self {
        Location { offset, length }
    }

    pub fn end(&self) -> u32 {
        self.offset + self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Hash)]
#[allow(non_camel_case_types)]
pub enum TokenKind {
    // Structural
    Eof,
    Error,
    // Identifiers and literals
    Identifier,
    QuotedIdentifier,
    LiteralInteger,
    LiteralFloat,
    LiteralString,
    // Punctuation
    Dot,
    DotTrailing,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Star,
    // Operators
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Slash,
    Percent,
    Concat,
    Cast,
    // Keywords (ANSI-ish, PostgreSQL-leaning)
    Select,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Limit,
    Offset,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Create,
    Table,
    View,
    Set,
    Insert,
    Into,
    Values,
    Update,
    Delete,
    And,
    Or,
    Xor,
    Not,
    /// `NOT` rewritten by one-token lookahead when followed by
    /// `BETWEEN`/`IN`/`LIKE`/`ILIKE`/`SIMILAR`.
    NotLookahead,
    Between,
    In,
    Like,
    Ilike,
    Similar,
    To,
    Is,
    Null,
    True,
    False,
    Asc,
    Desc,
    Nulls,
    /// `NULLS` rewritten by one-token lookahead when followed by `FIRST`/`LAST`.
    NullsLookahead,
    First,
    Last,
    With,
    /// `WITH` rewritten by one-token lookahead when followed by `TIME`/`ORDINALITY`.
    WithLookahead,
    Time,
    Ordinality,
    Recursive,
    Distinct,
    All,
    Exists,
    Primary,
    Key,
    Default,
    Collate,
    AtKw,
    Timezone,
    Glob,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            TokenKind::Eof
                | TokenKind::Error
                | TokenKind::Identifier
                | TokenKind::QuotedIdentifier
                | TokenKind::LiteralInteger
                | TokenKind::LiteralFloat
                | TokenKind::LiteralString
                | TokenKind::Dot
                | TokenKind::DotTrailing
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Star
                | TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Concat
                | TokenKind::Cast
        )
    }
}

/// Perfect-hash keyword table: uppercase spelling to token kind.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "SELECT" => TokenKind::Select,
    "FROM" => TokenKind::From,
    "WHERE" => TokenKind::Where,
    "GROUP" => TokenKind::Group,
    "BY" => TokenKind::By,
    "HAVING" => TokenKind::Having,
    "ORDER" => TokenKind::Order,
    "LIMIT" => TokenKind::Limit,
    "OFFSET" => TokenKind::Offset,
    "AS" => TokenKind::As,
    "ON" => TokenKind::On,
    "JOIN" => TokenKind::Join,
    "INNER" => TokenKind::Inner,
    "LEFT" => TokenKind::Left,
    "RIGHT" => TokenKind::Right,
    "FULL" => TokenKind::Full,
    "OUTER" => TokenKind::Outer,
    "CROSS" => TokenKind::Cross,
    "CREATE" => TokenKind::Create,
    "TABLE" => TokenKind::Table,
    "VIEW" => TokenKind::View,
    "SET" => TokenKind::Set,
    "INSERT" => TokenKind::Insert,
    "INTO" => TokenKind::Into,
    "VALUES" => TokenKind::Values,
    "UPDATE" => TokenKind::Update,
    "DELETE" => TokenKind::Delete,
    "AND" => TokenKind::And,
    "OR" => TokenKind::Or,
    "XOR" => TokenKind::Xor,
    "NOT" => TokenKind::Not,
    "BETWEEN" => TokenKind::Between,
    "IN" => TokenKind::In,
    "LIKE" => TokenKind::Like,
    "ILIKE" => TokenKind::Ilike,
    "SIMILAR" => TokenKind::Similar,
    "TO" => TokenKind::To,
    "IS" => TokenKind::Is,
    "NULL" => TokenKind::Null,
    "TRUE" => TokenKind::True,
    "FALSE" => TokenKind::False,
    "ASC" => TokenKind::Asc,
    "DESC" => TokenKind::Desc,
    "NULLS" => TokenKind::Nulls,
    "FIRST" => TokenKind::First,
    "LAST" => TokenKind::Last,
    "WITH" => TokenKind::With,
    "TIME" => TokenKind::Time,
    "ORDINALITY" => TokenKind::Ordinality,
    "RECURSIVE" => TokenKind::Recursive,
    "DISTINCT" => TokenKind::Distinct,
    "ALL" => TokenKind::All,
    "EXISTS" => TokenKind::Exists,
    "PRIMARY" => TokenKind::Primary,
    "KEY" => TokenKind::Key,
    "DEFAULT" => TokenKind::Default,
    "COLLATE" => TokenKind::Collate,
    "AT" => TokenKind::AtKw,
    "TIMEZONE" => TokenKind::Timezone,
    "GLOB" => TokenKind::Glob,
};

pub fn lookup_keyword(upper: &str) -> Option<TokenKind> {
    KEYWORDS.get(upper).copied()
}

/// A scanned symbol: its kind plus source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: TokenKind,
    pub location: Location,
}
