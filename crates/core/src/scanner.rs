//! C2: tokenizes a flattened text buffer into a restartable symbol
//! stream plus a per-script name registry.

use crate::names::{NameRegistry, NameTags};
use crate::tokens::{lookup_keyword, Location, Symbol, TokenKind};

/// Frozen result of a single scan pass. Always produced, even when
/// `errors` is non-empty — scanning never aborts (§4.2, §7).
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub symbols: Vec<Symbol>,
    pub comments: Vec<Location>,
    pub line_breaks: Vec<u32>,
    pub errors: Vec<(Location, String)>,
    pub names: NameRegistry,
}

pub fn scan(text: &str) -> ScanResult {
    let mut out = ScanResult::default();
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut idx = 0usize;

    while idx < len {
        let c = text[idx..].chars().next().expect("idx is a char boundary");
        match c {
            ' ' | '\t' => idx += 1,
            '\n' => {
                out.line_breaks.push(idx as u32);
                idx += 1;
            }
            '\r' => {
                out.line_breaks.push(idx as u32);
                idx += if bytes.get(idx + 1) == Some(&b'\n') { 2 } else { 1 };
            }
            '-' if bytes.get(idx + 1) == Some(&b'-') => {
                let start = idx;
                idx += 2;
                while idx < len && bytes[idx] != b'\n' {
                    idx += 1;
                }
                out.comments.push(Location::new(start as u32, (idx - start) as u32));
            }
            '/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx = scan_block_comment(text, idx, &mut out);
            }
            '\'' => idx = scan_string_literal(text, idx, &mut out),
            '"' => idx = scan_quoted_identifier(text, idx, &mut out),
            c if c.is_ascii_digit() => idx = scan_number(text, idx, &mut out),
            c if is_ident_start(c) => idx = scan_identifier(text, idx, &mut out),
            '.' => idx = scan_dot(text, idx, &mut out),
            ',' => idx = push_punct(&mut out, idx, 1, TokenKind::Comma),
            ';' => idx = push_punct(&mut out, idx, 1, TokenKind::Semicolon),
            '(' => idx = push_punct(&mut out, idx, 1, TokenKind::LParen),
            ')' => idx = push_punct(&mut out, idx, 1, TokenKind::RParen),
            '[' => idx = push_punct(&mut out, idx, 1, TokenKind::LBracket),
            ']' => idx = push_punct(&mut out, idx, 1, TokenKind::RBracket),
            '*' => idx = push_punct(&mut out, idx, 1, TokenKind::Star),
            '+' => idx = push_punct(&mut out, idx, 1, TokenKind::Plus),
            '%' => idx = push_punct(&mut out, idx, 1, TokenKind::Percent),
            '=' => idx = push_punct(&mut out, idx, 1, TokenKind::Equal),
            '-' => idx = push_punct(&mut out, idx, 1, TokenKind::Minus),
            '/' => idx = push_punct(&mut out, idx, 1, TokenKind::Slash),
            '<' => {
                if bytes.get(idx + 1) == Some(&b'=') {
                    idx = push_punct(&mut out, idx, 2, TokenKind::LessEqual);
                } else if bytes.get(idx + 1) == Some(&b'>') {
                    idx = push_punct(&mut out, idx, 2, TokenKind::NotEqual);
                } else {
                    idx = push_punct(&mut out, idx, 1, TokenKind::Less);
                }
            }
            '>' => {
                if bytes.get(idx + 1) == Some(&b'=') {
                    idx = push_punct(&mut out, idx, 2, TokenKind::GreaterEqual);
                } else {
                    idx = push_punct(&mut out, idx, 1, TokenKind::Greater);
                }
            }
            '!' if bytes.get(idx + 1) == Some(&b'=') => {
                idx = push_punct(&mut out, idx, 2, TokenKind::NotEqual);
            }
            '|' if bytes.get(idx + 1) == Some(&b'|') => {
                idx = push_punct(&mut out, idx, 2, TokenKind::Concat);
            }
            ':' if bytes.get(idx + 1) == Some(&b':') => {
                idx = push_punct(&mut out, idx, 2, TokenKind::Cast);
            }
            other => {
                out.errors.push((
                    Location::new(idx as u32, other.len_utf8() as u32),
                    format!("unexpected character '{other}'"),
                ));
                idx += other.len_utf8();
            }
        }
    }

    out.symbols.push(Symbol {
        kind: TokenKind::Eof,
        location: Location::new(len as u32, 0),
    });
    apply_lookahead_rewrites(&mut out.symbols);
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn push_punct(out: &mut ScanResult, start: usize, len: usize, kind: TokenKind) -> usize {
    out.symbols.push(Symbol {
        kind,
        location: Location::new(start as u32, len as u32),
    });
    start + len
}

fn scan_identifier(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let mut idx = start;
    while idx < bytes.len() {
        let c = text[idx..].chars().next().unwrap();
        if is_ident_continue(c) {
            idx += c.len_utf8();
        } else {
            break;
        }
    }
    let raw = &text[start..idx];
    let upper = raw.to_ascii_uppercase();
    let kind = lookup_keyword(&upper).unwrap_or(TokenKind::Identifier);
    let location = Location::new(start as u32, (idx - start) as u32);
    if kind == TokenKind::Identifier {
        let name_id = out.names.register(raw, location);
        log::trace!("registered identifier name id={name_id} text={raw}");
    }
    out.symbols.push(Symbol { kind, location });
    idx
}

fn scan_dot(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let idx = start + 1;
    let mut peek = idx;
    while peek < bytes.len() && matches!(bytes[peek], b' ' | b'\t') {
        peek += 1;
    }
    let next_is_component = peek < bytes.len()
        && (is_ident_start(text[peek..].chars().next().unwrap()) || bytes[peek] == b'"');
    let kind = if next_is_component && peek == idx {
        TokenKind::Dot
    } else {
        TokenKind::DotTrailing
    };
    out.symbols.push(Symbol {
        kind,
        location: Location::new(start as u32, 1),
    });
    idx
}

fn scan_number(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut idx = start;
    let mut is_float = false;
    while idx < len && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if bytes.get(idx) == Some(&b'.') && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit) {
        is_float = true;
        idx += 1;
        while idx < len && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
    }
    if matches!(bytes.get(idx), Some(b'e') | Some(b'E')) {
        let mut peek = idx + 1;
        if matches!(bytes.get(peek), Some(b'+') | Some(b'-')) {
            peek += 1;
        }
        if bytes.get(peek).is_some_and(u8::is_ascii_digit) {
            is_float = true;
            idx = peek;
            while idx < len && bytes[idx].is_ascii_digit() {
                idx += 1;
            }
        }
    }
    let slice = &text[start..idx];
    let location = Location::new(start as u32, (idx - start) as u32);
    if is_float {
        match slice.parse::<f64>() {
            Ok(_) => out.symbols.push(Symbol {
                kind: TokenKind::LiteralFloat,
                location,
            }),
            Err(_) => out.errors.push((location, format!("invalid float literal '{slice}'"))),
        }
    } else {
        match slice.parse::<i64>() {
            Ok(_) => out.symbols.push(Symbol {
                kind: TokenKind::LiteralInteger,
                location,
            }),
            Err(_) => out
                .errors
                .push((location, format!("integer literal out of range '{slice}'"))),
        }
    }
    idx
}

fn scan_string_literal(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut idx = start + 1;
    loop {
        if idx >= len {
            out.errors.push((
                Location::new(start as u32, (idx - start) as u32),
                "unterminated string literal".to_string(),
            ));
            break;
        }
        match bytes[idx] {
            b'\n' => {
                out.line_breaks.push(idx as u32);
                idx += 1;
            }
            b'\'' if bytes.get(idx + 1) == Some(&b'\'') => idx += 2,
            b'\'' => {
                idx += 1;
                break;
            }
            _ => idx += 1,
        }
    }
    out.symbols.push(Symbol {
        kind: TokenKind::LiteralString,
        location: Location::new(start as u32, (idx - start) as u32),
    });
    idx
}

fn scan_quoted_identifier(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut idx = start + 1;
    loop {
        if idx >= len {
            out.errors.push((
                Location::new(start as u32, (idx - start) as u32),
                "unterminated quoted identifier".to_string(),
            ));
            break;
        }
        match bytes[idx] {
            b'"' if bytes.get(idx + 1) == Some(&b'"') => idx += 2,
            b'"' => {
                idx += 1;
                break;
            }
            _ => idx += 1,
        }
    }
    let location = Location::new(start as u32, (idx - start) as u32);
    let inner = &text[start + 1..idx.saturating_sub(1).max(start + 1)];
    let unescaped = inner.replace("\"\"", "\"");
    let name_id = out.names.register(&unescaped, location);
    out.names.tag(name_id, NameTags::NONE);
    out.symbols.push(Symbol {
        kind: TokenKind::QuotedIdentifier,
        location,
    });
    idx
}

fn scan_block_comment(text: &str, start: usize, out: &mut ScanResult) -> usize {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut idx = start + 2;
    let mut depth = 1usize;
    while idx < len && depth > 0 {
        if bytes[idx] == b'\n' {
            out.line_breaks.push(idx as u32);
            idx += 1;
        } else if text[idx..].starts_with("/*") {
            depth += 1;
            idx += 2;
        } else if text[idx..].starts_with("*/") {
            depth -= 1;
            idx += 2;
        } else {
            idx += 1;
        }
    }
    if depth > 0 {
        out.errors.push((
            Location::new(start as u32, (idx - start) as u32),
            "unterminated block comment".to_string(),
        ));
    }
    out.comments.push(Location::new(start as u32, (idx - start) as u32));
    idx
}

/// Rewrites the three ambiguous keyword sequences using one-token
/// lookahead (§4.2): `NOT {BETWEEN,IN,LIKE,ILIKE,SIMILAR}` -> `NOT_LA`,
/// `NULLS {FIRST,LAST}` -> `NULLS_LA`, `WITH {TIME,ORDINALITY}` -> `WITH_LA`.
fn apply_lookahead_rewrites(symbols: &mut [Symbol]) {
    for i in 0..symbols.len().saturating_sub(1) {
        let next_kind = symbols[i + 1].kind;
        let rewritten = match symbols[i].kind {
            TokenKind::Not
                if matches!(
                    next_kind,
                    TokenKind::Between | TokenKind::In | TokenKind::Like | TokenKind::Ilike | TokenKind::Similar
                ) =>
            {
                Some(TokenKind::NotLookahead)
            }
            TokenKind::Nulls if matches!(next_kind, TokenKind::First | TokenKind::Last) => {
                Some(TokenKind::NullsLookahead)
            }
            TokenKind::With if matches!(next_kind, TokenKind::Time | TokenKind::Ordinality) => {
                Some(TokenKind::WithLookahead)
            }
            _ => None,
        };
        if let Some(kind) = rewritten {
            symbols[i].kind = kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        scan(text).symbols.into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_scan_is_deterministic() {
        let text = "select a, b from t where a.b = 1 and c not in (1,2)";
        let first = scan(text);
        let second = scan(text);
        assert_eq!(
            first.symbols.iter().map(|s| s.kind).collect::<Vec<_>>(),
            second.symbols.iter().map(|s| s.kind).collect::<Vec<_>>()
        );
        assert_eq!(first.names.len(), second.names.len());
    }

    #[test]
    fn test_not_lookahead_rewrite() {
        assert_eq!(
            kinds("a not in (1)"),
            vec![
                TokenKind::Identifier,
                TokenKind::NotLookahead,
                TokenKind::In,
                TokenKind::LParen,
                TokenKind::LiteralInteger,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
        // bare NOT (no ambiguous follower) is untouched
        assert_eq!(
            kinds("not a"),
            vec![TokenKind::Not, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_nulls_and_with_lookahead_rewrite() {
        assert_eq!(
            kinds("order by a nulls first"),
            vec![
                TokenKind::Order,
                TokenKind::By,
                TokenKind::Identifier,
                TokenKind::NullsLookahead,
                TokenKind::First,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("with time zone"),
            vec![TokenKind::WithLookahead, TokenKind::Time, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_integer_vs_float_shape() {
        assert_eq!(kinds("42"), vec![TokenKind::LiteralInteger, TokenKind::Eof]);
        assert_eq!(kinds("4.2"), vec![TokenKind::LiteralFloat, TokenKind::Eof]);
        assert_eq!(kinds("4e10"), vec![TokenKind::LiteralFloat, TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_string_is_scanner_error_not_fatal() {
        let res = scan("select 'abc");
        assert_eq!(res.errors.len(), 1);
        assert!(res.symbols.iter().any(|s| s.kind == TokenKind::LiteralString));
    }

    #[test]
    fn test_nested_block_comments() {
        let res = scan("/* outer /* inner */ still outer */ select 1");
        assert!(res.errors.is_empty());
        assert_eq!(res.comments.len(), 1);
        let kinds = res.symbols.iter().map(|s| s.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![TokenKind::Select, TokenKind::LiteralInteger, TokenKind::Eof]);
    }

    #[test]
    fn test_quoted_identifier_trims_quotes_and_unescapes() {
        let res = scan(r#"select "my""col" from t"#);
        let name = res.names.iter().find(|n| n.text == "my\"col");
        assert!(name.is_some());
    }

    #[test]
    fn test_name_registry_records_plain_identifiers() {
        let res = scan("select foo from bar");
        assert!(res.names.lookup("foo").is_some());
        assert!(res.names.lookup("bar").is_some());
        assert!(res.names.lookup("select").is_none());
    }
}
