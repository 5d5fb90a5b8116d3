//! C4: a recursive-descent parser over the scanner's symbol stream,
//! emitting a flat attributed AST (§4.3).
//!
//! The grammar is deliberately small — spec.md only pins down node
//! shapes and invariants, not a concrete grammar — but every statement
//! type named in [`crate::ast::StatementType`] is reachable: `SELECT`,
//! `CREATE TABLE`, `CREATE TABLE ... AS SELECT`, `CREATE VIEW ... AS
//! SELECT` and a minimal `SET key = value`.

use crate::ast::{AstBuffer, AttributeKey, NodeType, OperatorKind, Pending};
use crate::errors::SqlSyntaxError;
use crate::names::NameRegistry;
use crate::parsed_script::ParsedScript;
use crate::scanner::ScanResult;
use crate::tokens::{Location, Symbol, TokenKind};

/// Parses a scanned script into a flat AST. Always returns a result,
/// even with syntax errors recorded (best-effort recovery, §4.3, §7).
pub fn parse(text: &str, scanned: ScanResult) -> ParsedScript {
    let mut parser = Parser {
        text,
        names: &scanned.names,
        symbols: &scanned.symbols,
        pos: 0,
        ast: AstBuffer::new(),
        errors: Vec::new(),
    };
    parser.parse_script();
    let Parser { ast, errors, .. } = parser;
    ParsedScript {
        scanned,
        ast,
        errors,
    }
}

struct Parser<'a> {
    text: &'a str,
    names: &'a NameRegistry,
    symbols: &'a [Symbol],
    pos: usize,
    ast: AstBuffer,
    errors: Vec<SqlSyntaxError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Symbol {
        self.symbols[self.pos.min(self.symbols.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Symbol {
        let sym = self.peek();
        if self.pos < self.symbols.len() - 1 {
            self.pos += 1;
        }
        sym
    }

    fn at_eof(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Symbol> {
        if self.peek_kind() == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Symbol> {
        if let Some(sym) = self.eat(kind) {
            return Some(sym);
        }
        let loc = self.peek().location;
        self.errors
            .push(SqlSyntaxError::new(loc, format!("expected {what}, found {:?}", self.peek_kind())));
        None
    }

    /// Resolves a token's registered name id by recomputing the text it
    /// would have been interned under (unescaping quoted identifiers the
    /// same way the scanner did). Returns `None` for a malformed token.
    fn name_id_for(&self, sym: Symbol) -> Option<u32> {
        let loc = sym.location;
        let raw = &self.text[loc.offset as usize..loc.end() as usize];
        let text = match sym.kind {
            TokenKind::QuotedIdentifier => {
                let inner = &raw[1..raw.len().saturating_sub(1).max(1)];
                inner.replace("\"\"", "\"")
            }
            _ => raw.to_string(),
        };
        self.names.lookup(&text)
    }

    /// Skips tokens until the next statement boundary, for best-effort
    /// recovery after a syntax error.
    fn recover_to_statement_boundary(&mut self) {
        while !self.at_eof() && self.peek_kind() != TokenKind::Semicolon {
            self.advance();
        }
        self.eat(TokenKind::Semicolon);
    }

    fn parse_script(&mut self) {
        while !self.at_eof() {
            if self.peek_kind() == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            let nodes_begin = self.ast.watermark();
            let errors_before = self.errors.len();
            match self.parse_statement() {
                Some(pending) => {
                    self.ast.add_statement(pending, nodes_begin);
                }
                None => {
                    if self.errors.len() == errors_before {
                        let loc = self.peek().location;
                        self.errors.push(SqlSyntaxError::new(loc, "expected a statement"));
                    }
                    self.recover_to_statement_boundary();
                    continue;
                }
            }
            self.eat(TokenKind::Semicolon);
        }
    }

    fn parse_statement(&mut self) -> Option<Pending> {
        match self.peek_kind() {
            TokenKind::Select => self.parse_select(),
            TokenKind::Create => self.parse_create(),
            TokenKind::Set => self.parse_set(),
            _ => None,
        }
    }

    // ---- SELECT -----------------------------------------------------

    fn parse_select(&mut self) -> Option<Pending> {
        let start = self.expect(TokenKind::Select, "SELECT")?.location;
        if matches!(self.peek_kind(), TokenKind::Distinct | TokenKind::All) {
            self.advance();
        }
        let select_list = self.parse_expr_list_until(&[TokenKind::From, TokenKind::Eof, TokenKind::Semicolon])?;
        let mut attrs = vec![(AttributeKey::SqlSelectList, Pending::array(start, select_list))];

        if self.eat(TokenKind::From).is_some() {
            let from_list = self.parse_from_list()?;
            attrs.push((AttributeKey::SqlSelectFrom, Pending::array(start, from_list)));
        }
        if self.eat(TokenKind::Where).is_some() {
            let expr = self.parse_expr()?;
            attrs.push((AttributeKey::SqlSelectWhere, expr));
        }
        if self.eat(TokenKind::Group).is_some() {
            self.expect(TokenKind::By, "BY")?;
            let items = self.parse_expr_list_until(&[
                TokenKind::Having,
                TokenKind::Order,
                TokenKind::Limit,
                TokenKind::Eof,
                TokenKind::Semicolon,
            ])?;
            attrs.push((AttributeKey::SqlSelectGroupBy, Pending::array(start, items)));
        }
        if self.eat(TokenKind::Having).is_some() {
            let expr = self.parse_expr()?;
            attrs.push((AttributeKey::SqlSelectHaving, expr));
        }
        if self.eat(TokenKind::Order).is_some() {
            self.expect(TokenKind::By, "BY")?;
            let items = self.parse_order_by_list()?;
            attrs.push((AttributeKey::SqlSelectOrderBy, Pending::array(start, items)));
        }
        if self.eat(TokenKind::Limit).is_some() {
            let expr = self.parse_expr()?;
            attrs.push((AttributeKey::SqlSelectLimit, expr));
        }
        // A trailing OFFSET is accepted but not separately attributed;
        // it shares LIMIT's clause slot in this minimal grammar.
        if self.peek_kind() == TokenKind::Offset {
            self.advance();
            self.parse_expr()?;
        }

        Some(Pending::object(NodeType::ObjectSqlSelect, start, attrs))
    }

    fn parse_expr_list_until(&mut self, stop: &[TokenKind]) -> Option<Vec<Pending>> {
        let mut items = Vec::new();
        loop {
            if self.peek_kind() == TokenKind::Star {
                let loc = self.advance().location;
                items.push(Pending::name(loc, queryscope_helpers::NONE_ID));
            } else {
                items.push(self.parse_expr()?);
            }
            if matches!(self.peek_kind(), TokenKind::As) {
                self.advance();
                self.expect(TokenKind::Identifier, "alias")?;
            }
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            if stop.contains(&self.peek_kind()) {
                break;
            }
            break;
        }
        Some(items)
    }

    fn parse_order_by_list(&mut self) -> Option<Vec<Pending>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_expr()?);
            if matches!(self.peek_kind(), TokenKind::Asc | TokenKind::Desc) {
                self.advance();
            }
            if matches!(self.peek_kind(), TokenKind::NullsLookahead) {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::First | TokenKind::Last) {
                    self.advance();
                }
            }
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            break;
        }
        Some(items)
    }

    fn parse_from_list(&mut self) -> Option<Vec<Pending>> {
        let mut items = Vec::new();
        items.push(self.parse_table_ref()?);
        loop {
            if self.eat(TokenKind::Comma).is_some() {
                items.push(self.parse_table_ref()?);
                continue;
            }
            if self.eat_join_keyword() {
                items.push(self.parse_table_ref()?);
                if self.eat(TokenKind::On).is_some() {
                    self.parse_expr()?;
                }
                continue;
            }
            break;
        }
        Some(items)
    }

    fn eat_join_keyword(&mut self) -> bool {
        match self.peek_kind() {
            TokenKind::Join => {
                self.advance();
                true
            }
            TokenKind::Inner | TokenKind::Left | TokenKind::Right | TokenKind::Full | TokenKind::Cross => {
                self.advance();
                if self.peek_kind() == TokenKind::Outer {
                    self.advance();
                }
                self.expect(TokenKind::Join, "JOIN");
                true
            }
            _ => false,
        }
    }

    /// `OBJECT_SQL_TABLEREF`: 1-3 dotted name components plus an
    /// optional alias (§4.3, §4.4).
    fn parse_table_ref(&mut self) -> Option<Pending> {
        let path_start = self.peek().location;
        let mut path = vec![self.parse_name_component()?];
        while self.eat(TokenKind::Dot).is_some() {
            path.push(self.parse_name_component()?);
        }
        if path.len() > 3 {
            self.errors
                .push(SqlSyntaxError::new(path_start, "table reference has more than 3 name components"));
        }
        let mut attrs = vec![(AttributeKey::SqlTablerefName, Pending::array(path_start, path))];

        let has_as = self.eat(TokenKind::As).is_some();
        if has_as || self.peek_kind() == TokenKind::Identifier || self.peek_kind() == TokenKind::QuotedIdentifier {
            if let Some(alias_sym) = self.eat_identifier_like() {
                let name_id = self.name_id_for(alias_sym).unwrap_or(queryscope_helpers::NONE_ID);
                attrs.push((
                    AttributeKey::SqlTablerefAlias,
                    Pending::name(alias_sym.location, name_id),
                ));
            } else if has_as {
                self.errors
                    .push(SqlSyntaxError::new(self.peek().location, "expected alias after AS"));
            }
        }
        Some(Pending::object(NodeType::ObjectSqlTableRef, path_start, attrs))
    }

    fn eat_identifier_like(&mut self) -> Option<Symbol> {
        if matches!(self.peek_kind(), TokenKind::Identifier | TokenKind::QuotedIdentifier) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn parse_name_component(&mut self) -> Option<Pending> {
        let sym = self.eat_identifier_like()?;
        let name_id = self.name_id_for(sym).unwrap_or(queryscope_helpers::NONE_ID);
        Some(Pending::name(sym.location, name_id))
    }

    // ---- CREATE -------------------------------------------------------

    fn parse_create(&mut self) -> Option<Pending> {
        let start = self.expect(TokenKind::Create, "CREATE")?.location;
        if self.eat(TokenKind::View).is_some() {
            return self.parse_create_view(start);
        }
        self.expect(TokenKind::Table, "TABLE")?;
        let name_path = self.parse_qualified_name()?;
        if self.peek_kind() == TokenKind::As {
            self.advance();
            let query = self.parse_select()?;
            return Some(Pending::object(
                NodeType::ObjectSqlCreateAs,
                start,
                vec![
                    (AttributeKey::SqlCreateTableName, Pending::array(start, name_path)),
                    (AttributeKey::SqlCreateTableAsQuery, query),
                ],
            ));
        }
        self.expect(TokenKind::LParen, "(")?;
        let mut columns = Vec::new();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                columns.push(self.parse_column_def()?);
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, ")")?;
        Some(Pending::object(
            NodeType::ObjectSqlCreate,
            start,
            vec![
                (AttributeKey::SqlCreateTableName, Pending::array(start, name_path)),
                (AttributeKey::SqlCreateTableElements, Pending::array(start, columns)),
            ],
        ))
    }

    fn parse_create_view(&mut self, start: Location) -> Option<Pending> {
        let name_path = self.parse_qualified_name()?;
        self.expect(TokenKind::As, "AS")?;
        let query = self.parse_select()?;
        Some(Pending::object(
            NodeType::ObjectSqlView,
            start,
            vec![
                (AttributeKey::SqlViewName, Pending::array(start, name_path)),
                (AttributeKey::SqlViewQuery, query),
            ],
        ))
    }

    fn parse_qualified_name(&mut self) -> Option<Vec<Pending>> {
        let mut path = vec![self.parse_name_component()?];
        while self.eat(TokenKind::Dot).is_some() {
            path.push(self.parse_name_component()?);
        }
        Some(path)
    }

    /// `OBJECT_SQL_COLUMN_DEF`: a column name, a (currently unvalidated)
    /// type token run, and optional constraint keywords consumed and
    /// discarded up to the next comma/close-paren.
    fn parse_column_def(&mut self) -> Option<Pending> {
        let sym = self.eat_identifier_like()?;
        let name_id = self.name_id_for(sym).unwrap_or(queryscope_helpers::NONE_ID);
        // Consume the type name and any constraint keywords; this
        // grammar doesn't model types beyond recognizing their tokens.
        while !matches!(
            self.peek_kind(),
            TokenKind::Comma | TokenKind::RParen | TokenKind::Eof | TokenKind::Semicolon
        ) {
            self.advance();
        }
        Some(Pending::object(
            NodeType::ObjectSqlColumnDef,
            sym.location,
            vec![(AttributeKey::SqlColumnDefName, Pending::name(sym.location, name_id))],
        ))
    }

    // ---- SET ----------------------------------------------------------

    fn parse_set(&mut self) -> Option<Pending> {
        let start = self.expect(TokenKind::Set, "SET")?.location;
        let key_sym = self.eat_identifier_like().or_else(|| {
            self.errors.push(SqlSyntaxError::new(self.peek().location, "expected SET key"));
            None
        })?;
        let key_name_id = self.name_id_for(key_sym).unwrap_or(queryscope_helpers::NONE_ID);
        self.expect(TokenKind::Equal, "=")?;
        let value = self.parse_expr()?;
        Some(Pending::object(
            NodeType::ObjectExtSet,
            start,
            vec![
                (AttributeKey::ExtSetKey, Pending::name(key_sym.location, key_name_id)),
                (AttributeKey::ExtSetValue, value),
            ],
        ))
    }

    // ---- Expressions ----------------------------------------------------

    fn parse_expr(&mut self) -> Option<Pending> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Option<Pending> {
        let start_loc = self.peek().location;
        let mut operands = vec![self.parse_and_expr()?];
        while self.eat(TokenKind::Or).is_some() {
            operands.push(self.parse_and_expr()?);
        }
        if operands.len() == 1 {
            return operands.pop();
        }
        Some(crate::ast::build_nary(start_loc, OperatorKind::Or, operands))
    }

    fn parse_and_expr(&mut self) -> Option<Pending> {
        let start_loc = self.peek().location;
        let mut operands = vec![self.parse_not_expr()?];
        while self.eat(TokenKind::And).is_some() {
            operands.push(self.parse_not_expr()?);
        }
        if operands.len() == 1 {
            return operands.pop();
        }
        Some(crate::ast::build_nary(start_loc, OperatorKind::And, operands))
    }

    fn parse_not_expr(&mut self) -> Option<Pending> {
        if self.peek_kind() == TokenKind::Not {
            let loc = self.advance().location;
            let inner = self.parse_not_expr()?;
            return Some(self.make_unary(loc, OperatorKind::Not, inner));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Option<Pending> {
        let lhs = self.parse_additive()?;
        let (op, is_between, is_in) = match self.peek_kind() {
            TokenKind::Equal => (Some(OperatorKind::Equal), false, false),
            TokenKind::NotEqual => (Some(OperatorKind::NotEqual), false, false),
            TokenKind::Less => (Some(OperatorKind::Less), false, false),
            TokenKind::LessEqual => (Some(OperatorKind::LessEqual), false, false),
            TokenKind::Greater => (Some(OperatorKind::Greater), false, false),
            TokenKind::GreaterEqual => (Some(OperatorKind::GreaterEqual), false, false),
            TokenKind::Like => (Some(OperatorKind::Like), false, false),
            TokenKind::Ilike => (Some(OperatorKind::ILike), false, false),
            TokenKind::Between => (Some(OperatorKind::Between), true, false),
            TokenKind::In => (Some(OperatorKind::In), false, true),
            TokenKind::NotLookahead => {
                // NOT_LA followed by IN/LIKE/ILIKE/BETWEEN/SIMILAR: treat
                // the following token as the real operator, negation is
                // dropped at this fidelity (no NOT wrapper is specified
                // for NOT_LA by spec.md beyond the lexer rewrite itself).
                let save = self.pos;
                self.advance();
                match self.peek_kind() {
                    TokenKind::In => (Some(OperatorKind::In), false, true),
                    TokenKind::Between => (Some(OperatorKind::Between), true, false),
                    TokenKind::Like => (Some(OperatorKind::Like), false, false),
                    TokenKind::Ilike => (Some(OperatorKind::ILike), false, false),
                    TokenKind::Similar => (Some(OperatorKind::Like), false, false),
                    _ => {
                        self.pos = save;
                        (None, false, false)
                    }
                }
            }
            TokenKind::Is => {
                self.advance();
                let negated = self.eat(TokenKind::Not).is_some();
                self.expect(TokenKind::Null, "NULL");
                return Some(self.make_unary(
                    lhs.location().unwrap_or_default(),
                    if negated { OperatorKind::IsNot } else { OperatorKind::Is },
                    lhs,
                ));
            }
            _ => (None, false, false),
        };
        let Some(op) = op else { return Some(lhs) };
        if !matches!(self.peek_kind(), TokenKind::NotLookahead) {
            self.advance();
        }
        let loc = lhs.location().unwrap_or_default();
        if is_between {
            let low = self.parse_additive()?;
            self.expect(TokenKind::And, "AND")?;
            let high = self.parse_additive()?;
            return Some(Pending::object(
                NodeType::ObjectSqlNaryExpression,
                loc,
                vec![
                    (AttributeKey::SqlExpressionOperator, Pending::operator(loc, op)),
                    (
                        AttributeKey::SqlExpressionArgs,
                        Pending::array(loc, vec![lhs, low, high]),
                    ),
                ],
            ));
        }
        if is_in {
            self.expect(TokenKind::LParen, "(")?;
            let mut items = Vec::new();
            if self.peek_kind() != TokenKind::RParen {
                loop {
                    items.push(self.parse_expr()?);
                    if self.eat(TokenKind::Comma).is_some() {
                        continue;
                    }
                    break;
                }
            }
            self.expect(TokenKind::RParen, ")")?;
            let mut args = vec![lhs];
            args.extend(items);
            return Some(Pending::object(
                NodeType::ObjectSqlNaryExpression,
                loc,
                vec![
                    (AttributeKey::SqlExpressionOperator, Pending::operator(loc, op)),
                    (AttributeKey::SqlExpressionArgs, Pending::array(loc, args)),
                ],
            ));
        }
        let rhs = self.parse_additive()?;
        Some(self.make_binary(loc, op, lhs, rhs))
    }

    fn parse_additive(&mut self) -> Option<Pending> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => OperatorKind::Plus,
                TokenKind::Minus => OperatorKind::Minus,
                TokenKind::Concat => OperatorKind::Concat,
                _ => break,
            };
            let loc = self.advance().location;
            let rhs = self.parse_multiplicative()?;
            lhs = self.make_binary(loc, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<Pending> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => OperatorKind::Multiply,
                TokenKind::Slash => OperatorKind::Divide,
                TokenKind::Percent => OperatorKind::Modulo,
                _ => break,
            };
            let loc = self.advance().location;
            let rhs = self.parse_unary()?;
            lhs = self.make_binary(loc, op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<Pending> {
        match self.peek_kind() {
            TokenKind::Minus => {
                let loc = self.advance().location;
                let inner = self.parse_unary()?;
                Some(self.make_unary(loc, OperatorKind::Negate, inner))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Option<Pending> {
        match self.peek_kind() {
            TokenKind::LiteralInteger => {
                let sym = self.advance();
                Some(Pending::literal(sym.location, NodeType::LiteralInteger))
            }
            TokenKind::LiteralFloat => {
                let sym = self.advance();
                Some(Pending::literal(sym.location, NodeType::LiteralFloat))
            }
            TokenKind::LiteralString => {
                let sym = self.advance();
                Some(Pending::literal(sym.location, NodeType::LiteralString))
            }
            TokenKind::Null => {
                let sym = self.advance();
                Some(Pending::literal(sym.location, NodeType::LiteralNull))
            }
            TokenKind::True => {
                let sym = self.advance();
                Some(Pending::bool_(sym.location, true))
            }
            TokenKind::False => {
                let sym = self.advance();
                Some(Pending::bool_(sym.location, false))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, ")")?;
                Some(inner)
            }
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.parse_column_ref(),
            other => {
                let loc = self.peek().location;
                self.errors
                    .push(SqlSyntaxError::new(loc, format!("unexpected token in expression: {other:?}")));
                None
            }
        }
    }

    /// `OBJECT_SQL_COLUMN_REF`: 1-2 dotted name components (§4.4).
    fn parse_column_ref(&mut self) -> Option<Pending> {
        let start = self.peek().location;
        let mut path = vec![self.parse_name_component()?];
        while self.eat(TokenKind::Dot).is_some() {
            path.push(self.parse_name_component()?);
        }
        Some(Pending::object(
            NodeType::ObjectSqlColumnRef,
            start,
            vec![(AttributeKey::SqlColumnRefPath, Pending::array(start, path))],
        ))
    }

    fn make_binary(&self, loc: Location, op: OperatorKind, lhs: Pending, rhs: Pending) -> Pending {
        Pending::object(
            NodeType::ObjectSqlNaryExpression,
            loc,
            vec![
                (AttributeKey::SqlExpressionOperator, Pending::operator(loc, op)),
                (AttributeKey::SqlExpressionArgs, Pending::array(loc, vec![lhs, rhs])),
            ],
        )
    }

    fn make_unary(&self, loc: Location, op: OperatorKind, operand: Pending) -> Pending {
        Pending::object(
            NodeType::ObjectSqlNaryExpression,
            loc,
            vec![
                (AttributeKey::SqlExpressionOperator, Pending::operator(loc, op)),
                (AttributeKey::SqlExpressionArgs, Pending::array(loc, vec![operand])),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeType;
    use crate::scanner::scan;

    fn parse_text(text: &str) -> ParsedScript {
        parse(text, scan(text))
    }

    #[test]
    fn test_parse_simple_select() {
        let parsed = parse_text("select a, b from t where a = 1");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.ast.statements().len(), 1);
        let stmt = parsed.ast.statements()[0];
        assert_eq!(stmt.statement_type, crate::ast::StatementType::Select);
    }

    #[test]
    fn test_parse_create_table() {
        let parsed = parse_text("create table t(a int, b int)");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.ast.statements()[0].statement_type, crate::ast::StatementType::CreateTable);
        let root = parsed.ast.statements()[0].root;
        let elements = parsed.ast.find_attr(root, AttributeKey::SqlCreateTableElements).unwrap();
        assert_eq!(parsed.ast.child_ids(elements).len(), 2);
    }

    #[test]
    fn test_parse_create_table_as() {
        let parsed = parse_text("create table t as select 1");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(
            parsed.ast.statements()[0].statement_type,
            crate::ast::StatementType::CreateTableAs
        );
    }

    #[test]
    fn test_parse_create_view() {
        let parsed = parse_text("create view v as select a from t");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.ast.statements()[0].statement_type, crate::ast::StatementType::CreateView);
    }

    #[test]
    fn test_parse_set_statement() {
        let parsed = parse_text("set foo = 1");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.ast.statements()[0].statement_type, crate::ast::StatementType::Set);
    }

    #[test]
    fn test_parse_nary_and_or_flattens() {
        let parsed = parse_text("select 1 where a and b and c");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let root = parsed.ast.statements()[0].root;
        let where_id = parsed.ast.find_attr(root, AttributeKey::SqlSelectWhere).unwrap();
        assert_eq!(parsed.ast.get(where_id).node_type, NodeType::ObjectSqlNaryExpression);
        let args = parsed.ast.find_attr(where_id, AttributeKey::SqlExpressionArgs).unwrap();
        assert_eq!(parsed.ast.child_ids(args).len(), 3);
    }

    #[test]
    fn test_parse_table_ref_with_alias() {
        let parsed = parse_text("select x.c from t x");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let root = parsed.ast.statements()[0].root;
        let from = parsed.ast.find_attr(root, AttributeKey::SqlSelectFrom).unwrap();
        let tableref = parsed.ast.children(from)[0];
        assert_eq!(tableref.node_type, NodeType::ObjectSqlTableRef);
    }

    #[test]
    fn test_parse_error_recovers_to_next_statement() {
        let parsed = parse_text("select from; select 1");
        assert!(!parsed.errors.is_empty());
        assert_eq!(parsed.ast.statements().len(), 1);
    }

    #[test]
    fn test_parse_qualified_column_ref_three_components() {
        let parsed = parse_text("select a.b.c from t");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let root = parsed.ast.statements()[0].root;
        let list = parsed.ast.find_attr(root, AttributeKey::SqlSelectList).unwrap();
        let col_ref = parsed.ast.children(list)[0];
        assert_eq!(col_ref.node_type, NodeType::ObjectSqlColumnRef);
    }
}
