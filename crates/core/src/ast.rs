//! C3: the flat, post-order populated AST node array.
//!
//! Nodes are described before they exist: a [`Pending`] value is a
//! not-yet-materialized node whose attrs are themselves `Pending`.
//! [`AstBuffer::materialize`] pushes a `Pending` tree into the flat
//! array exactly once, at the moment it becomes a child of its parent
//! (or a statement root) — every attr is materialized in strict
//! left-to-right order, so a composite's direct children always land
//! on contiguous ids no matter how large their own subtrees are. This
//! mirrors the source grammar's `Object`/`Array` helpers, which defer
//! pushing a node until it is consumed by its enclosing rule.

use queryscope_helpers::NONE_ID;

use crate::tokens::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum NodeType {
    None,
    Bool,
    LiteralInteger,
    LiteralFloat,
    LiteralString,
    LiteralNull,
    Name,
    Array,
    EnumSqlExpressionOperator,
    ObjectSqlSelect,
    ObjectSqlColumnRef,
    ObjectSqlColumnDef,
    ObjectSqlTableRef,
    ObjectSqlNaryExpression,
    ObjectSqlCreate,
    ObjectSqlCreateAs,
    ObjectSqlView,
    ObjectExtSet,
}

/// Identifies an object child's semantic role within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum AttributeKey {
    None,
    SqlSelectList,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlSelectLimit,
    SqlColumnRefPath,
    SqlTablerefName,
    SqlTablerefAlias,
    SqlCreateTableName,
    SqlCreateTableElements,
    SqlCreateTableAsQuery,
    SqlColumnDefName,
    SqlExpressionOperator,
    SqlExpressionArgs,
    SqlViewName,
    SqlViewQuery,
    ExtSetKey,
    ExtSetValue,
}

/// The comparison/logical/arithmetic operator carried by an
/// `EnumSqlExpressionOperator` leaf's value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Negate,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Like,
    ILike,
    Is,
    IsNot,
    Between,
    In,
}

impl OperatorKind {
    const ALL: &'static [OperatorKind] = &[
        OperatorKind::Equal,
        OperatorKind::NotEqual,
        OperatorKind::Less,
        OperatorKind::LessEqual,
        OperatorKind::Greater,
        OperatorKind::GreaterEqual,
        OperatorKind::And,
        OperatorKind::Or,
        OperatorKind::Not,
        OperatorKind::Plus,
        OperatorKind::Minus,
        OperatorKind::Negate,
        OperatorKind::Multiply,
        OperatorKind::Divide,
        OperatorKind::Modulo,
        OperatorKind::Concat,
        OperatorKind::Like,
        OperatorKind::ILike,
        OperatorKind::Is,
        OperatorKind::IsNot,
        OperatorKind::Between,
        OperatorKind::In,
    ];

    /// Inverse of the `as u32` cast `Pending::operator` performs when
    /// packing an operator into a leaf node's value field.
    pub fn from_u32(value: u32) -> Option<OperatorKind> {
        Self::ALL.get(value as usize).copied()
    }

    /// Whether this operator compares two operands for a query-graph
    /// edge (§4.4): `=`, `<>`, `<`, `<=`, `>`, `>=`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OperatorKind::Equal
                | OperatorKind::NotEqual
                | OperatorKind::Less
                | OperatorKind::LessEqual
                | OperatorKind::Greater
                | OperatorKind::GreaterEqual
        )
    }
}

/// A fixed-shape AST record. `children_begin_or_value` is either the
/// start of this node's children range (objects/arrays) or a packed
/// leaf payload (names/literals/enums/bools), distinguished by
/// `node_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub location: Location,
    pub node_type: NodeType,
    pub attribute_key: AttributeKey,
    pub parent_id: u32,
    pub children_begin_or_value: u32,
    pub children_count: u32,
}

impl Node {
    pub fn children_begin(&self) -> u32 {
        self.children_begin_or_value
    }

    pub fn children_end(&self) -> u32 {
        self.children_begin_or_value + self.children_count
    }

    pub fn value(&self) -> u32 {
        self.children_begin_or_value
    }

    pub fn is_leaf(&self) -> bool {
        self.children_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Select,
    CreateTable,
    CreateTableAs,
    CreateView,
    Set,
}

impl StatementType {
    /// Maps a statement's root node type to its statement type. Any
    /// other root type is a parser invariant violation — callers only
    /// ever reach this after building one of the five root shapes.
    pub fn from_root_node_type(node_type: NodeType) -> Option<StatementType> {
        match node_type {
            NodeType::ObjectSqlSelect => Some(StatementType::Select),
            NodeType::ObjectSqlCreate => Some(StatementType::CreateTable),
            NodeType::ObjectSqlCreateAs => Some(StatementType::CreateTableAs),
            NodeType::ObjectSqlView => Some(StatementType::CreateView),
            NodeType::ObjectExtSet => Some(StatementType::Set),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub statement_type: StatementType,
    pub root: u32,
    pub nodes_begin: u32,
    pub node_count: u32,
}

/// A not-yet-materialized node. See module docs.
#[derive(Debug, Clone)]
pub enum Pending {
    /// An omitted optional attribute; skipped entirely at
    /// materialization, same as the source grammar's `Null()` sentinel.
    None,
    Leaf {
        node_type: NodeType,
        location: Location,
        value: u32,
    },
    Composite {
        node_type: NodeType,
        location: Location,
        attrs: Vec<(AttributeKey, Pending)>,
    },
}

impl Pending {
    pub fn name(location: Location, name_id: u32) -> Pending {
        Pending::Leaf {
            node_type: NodeType::Name,
            location,
            value: name_id,
        }
    }

    pub fn bool_(location: Location, value: bool) -> Pending {
        Pending::Leaf {
            node_type: NodeType::Bool,
            location,
            value: value as u32,
        }
    }

    pub fn literal(location: Location, node_type: NodeType) -> Pending {
        Pending::Leaf {
            node_type,
            location,
            value: 0,
        }
    }

    pub fn operator(location: Location, op: OperatorKind) -> Pending {
        Pending::Leaf {
            node_type: NodeType::EnumSqlExpressionOperator,
            location,
            value: op as u32,
        }
    }

    pub fn array(location: Location, items: Vec<Pending>) -> Pending {
        Pending::Composite {
            node_type: NodeType::Array,
            location,
            attrs: items.into_iter().map(|p| (AttributeKey::None, p)).collect(),
        }
    }

    pub fn object(node_type: NodeType, location: Location, attrs: Vec<(AttributeKey, Pending)>) -> Pending {
        Pending::Composite { node_type, location, attrs }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Pending::None => None,
            Pending::Leaf { location, .. } | Pending::Composite { location, .. } => Some(*location),
        }
    }

    /// If this is a `NaryExpression` whose operator matches `op`,
    /// returns its flattened arg list, consuming self. Used by
    /// `build_nary` to splice same-operator `AND`/`OR` chains instead
    /// of nesting them — the flat-AST equivalent of the source
    /// grammar's `TryMerge`.
    fn into_nary_args_if(self, op: OperatorKind) -> Result<Vec<Pending>, Pending> {
        match self {
            Pending::Composite { node_type: NodeType::ObjectSqlNaryExpression, location, attrs } => {
                let operator_matches = attrs.iter().any(|(key, value)| {
                    *key == AttributeKey::SqlExpressionOperator
                        && matches!(value, Pending::Leaf { value: v, .. } if *v == op as u32)
                });
                if !operator_matches {
                    return Err(Pending::Composite {
                        node_type: NodeType::ObjectSqlNaryExpression,
                        location,
                        attrs,
                    });
                }
                for (key, value) in attrs {
                    if key == AttributeKey::SqlExpressionArgs {
                        if let Pending::Composite { attrs: items, .. } = value {
                            return Ok(items.into_iter().map(|(_, p)| p).collect());
                        }
                    }
                }
                Ok(vec![])
            }
            other => Err(other),
        }
    }
}

/// Builds an n-ary `AND`/`OR` expression from `operands`, splicing any
/// operand that is itself a same-operator n-ary rather than nesting it.
/// A single operand is returned unwrapped (no expression node at all).
pub fn build_nary(location: Location, op: OperatorKind, operands: Vec<Pending>) -> Pending {
    if operands.len() == 1 {
        return operands.into_iter().next().unwrap();
    }
    let flattenable = matches!(op, OperatorKind::And | OperatorKind::Or);
    let mut flat = Vec::with_capacity(operands.len());
    for operand in operands {
        if flattenable {
            match operand.into_nary_args_if(op) {
                Ok(args) => {
                    flat.extend(args);
                    continue;
                }
                Err(restored) => {
                    flat.push(restored);
                    continue;
                }
            }
        }
        flat.push(operand);
    }
    Pending::object(
        NodeType::ObjectSqlNaryExpression,
        location,
        vec![
            (AttributeKey::SqlExpressionOperator, Pending::operator(location, op)),
            (AttributeKey::SqlExpressionArgs, Pending::array(location, flat)),
        ],
    )
}

/// The append-only node/statement store built by the parser.
#[derive(Debug, Clone, Default)]
pub struct AstBuffer {
    nodes: Vec<Node>,
    statements: Vec<Statement>,
}

impl AstBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next-pushed node will receive — used by the parser
    /// to mark the low-water-mark of a statement before parsing it.
    pub fn watermark(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn get(&self, id: u32) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn children(&self, id: u32) -> &[Node] {
        let node = self.get(id);
        &self.nodes[node.children_begin() as usize..node.children_end() as usize]
    }

    pub fn child_ids(&self, id: u32) -> std::ops::Range<u32> {
        let node = self.get(id);
        node.children_begin()..node.children_end()
    }

    /// Finds the first direct child of `id` carrying `key`.
    pub fn find_attr(&self, id: u32, key: AttributeKey) -> Option<u32> {
        self.child_ids(id).find(|&c| self.get(c).attribute_key == key)
    }

    /// Pushes `pending` into the buffer, returning its final id. Attrs
    /// (for composites) are materialized first, in order, so they land
    /// on contiguous ids immediately preceding the composite's own
    /// entry.
    pub fn materialize(&mut self, pending: Pending) -> u32 {
        match pending {
            Pending::None => unreachable!("Pending::None must be filtered by the caller before materializing"),
            Pending::Leaf { node_type, location, value } => {
                let id = self.nodes.len() as u32;
                self.nodes.push(Node {
                    location,
                    node_type,
                    attribute_key: AttributeKey::None,
                    parent_id: NONE_ID,
                    children_begin_or_value: value,
                    children_count: 0,
                });
                id
            }
            Pending::Composite { node_type, location, attrs } => {
                let begin = self.nodes.len() as u32;
                for (key, attr) in attrs {
                    if matches!(attr, Pending::None) {
                        continue;
                    }
                    let child_id = self.materialize(attr);
                    self.nodes[child_id as usize].attribute_key = key;
                }
                let count = self.nodes.len() as u32 - begin;
                let id = self.nodes.len() as u32;
                self.nodes.push(Node {
                    location,
                    node_type,
                    attribute_key: AttributeKey::None,
                    parent_id: NONE_ID,
                    children_begin_or_value: begin,
                    children_count: count,
                });
                for child_id in begin..id {
                    self.nodes[child_id as usize].parent_id = id;
                }
                id
            }
        }
    }

    /// Materializes `pending` as a statement root spanning back to
    /// `nodes_begin` (the buffer's watermark before the statement
    /// started parsing).
    pub fn add_statement(&mut self, pending: Pending, nodes_begin: u32) -> u32 {
        let root = self.materialize(pending);
        let statement_type = StatementType::from_root_node_type(self.get(root).node_type)
            .expect("statement root must be one of the recognized root node types");
        let id = self.statements.len() as u32;
        self.statements.push(Statement {
            statement_type,
            root,
            nodes_begin,
            node_count: root + 1 - nodes_begin,
        });
        id
    }

    /// Finds the statement whose node range contains `node_id`, via
    /// binary search over `nodes_begin` (statements are pushed in
    /// increasing node-id order since parsing is left to right).
    pub fn statement_containing(&self, node_id: u32) -> Option<usize> {
        let idx = self
            .statements
            .partition_point(|s| s.nodes_begin + s.node_count <= node_id);
        let stmt = self.statements.get(idx)?;
        (stmt.nodes_begin <= node_id && node_id < stmt.nodes_begin + stmt.node_count).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_children_are_contiguous_and_parented() {
        let mut ast = AstBuffer::new();
        let a = Pending::name(Location::new(0, 1), 10);
        let b = Pending::name(Location::new(1, 1), 11);
        let arr = Pending::array(Location::new(0, 2), vec![a, b]);
        let id = ast.materialize(arr);
        let children = ast.child_ids(id);
        assert_eq!(children.len(), 2);
        for c in children {
            assert_eq!(ast.get(c).parent_id, id);
        }
    }

    #[test]
    fn test_attr_key_set_on_materialized_child() {
        let mut ast = AstBuffer::new();
        let name = Pending::name(Location::new(0, 1), 1);
        let obj = Pending::object(
            NodeType::ObjectSqlTableRef,
            Location::new(0, 1),
            vec![(AttributeKey::SqlTablerefName, Pending::array(Location::new(0, 1), vec![name]))],
        );
        let id = ast.materialize(obj);
        let array_child = ast.find_attr(id, AttributeKey::SqlTablerefName).unwrap();
        assert_eq!(ast.get(array_child).node_type, NodeType::Array);
    }

    #[test]
    fn test_build_nary_flattens_same_operator_chain() {
        let loc = Location::new(0, 1);
        let a = Pending::name(loc, 1);
        let b = Pending::name(loc, 2);
        let ab = build_nary(loc, OperatorKind::And, vec![a, b]);
        let c = Pending::name(loc, 3);
        let abc = build_nary(loc, OperatorKind::And, vec![ab, c]);
        let mut ast = AstBuffer::new();
        let id = ast.materialize(abc);
        let args_array = ast.find_attr(id, AttributeKey::SqlExpressionArgs).unwrap();
        assert_eq!(ast.child_ids(args_array).len(), 3, "ab and c must flatten into one 3-ary AND");
    }

    #[test]
    fn test_build_nary_single_operand_has_no_wrapper() {
        let loc = Location::new(0, 1);
        let only = Pending::name(loc, 1);
        let result = build_nary(loc, OperatorKind::And, vec![only]);
        assert!(matches!(result, Pending::Leaf { node_type: NodeType::Name, .. }));
    }

    #[test]
    fn test_statement_mapping_and_lookup() {
        let mut ast = AstBuffer::new();
        let begin = ast.watermark();
        let select = Pending::object(NodeType::ObjectSqlSelect, Location::new(0, 10), vec![]);
        ast.add_statement(select, begin);
        assert_eq!(ast.statement_containing(ast.nodes().len() as u32 - 1), Some(0));
    }
}
