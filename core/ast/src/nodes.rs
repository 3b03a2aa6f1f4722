//! Node taxonomy.
//!
//! Every node in the tree is an [`AstNode`]: a [`NodeKind`] tag plus a vector of
//! [`Field`] values laid out in the order declared by the kind's field table.
//! The field tables are generated by `node_kinds!` so that equality, navigation,
//! folding and serialization can be written once against the table instead of
//! once per variant.
//!
//! Metadata (source span, annotations) lives beside the semantic fields and never
//! takes part in structural comparison.

use core::fmt;
use std::fmt::{Display, Formatter};

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use crate::number::Decimal;

/// Source span of a node. Lines are 1-based, columns are 0-based byte columns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Location {
    pub offset_start: u32,
    pub offset_end: u32,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    #[must_use]
    pub fn new(
        offset_start: u32,
        offset_end: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            offset_start,
            offset_end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

/// Abstract groupings of node kinds. Used both to declare which children a field
/// accepts and as a kind filter for navigation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NodeClass {
    TopLevel,
    Statement,
    Expression,
    /// Literal values. A sub-class of `Expression`.
    Constant,
    /// `Int` and `Decimal`. A sub-class of `Constant`.
    Num,
    Operator,
    BinaryOperator,
    BooleanOperator,
    ComparisonOperator,
    UnaryOperator,
    /// Helper nodes that only appear inside other nodes (`arguments`, `arg`, ...).
    Auxiliary,
}

/// Accepted child kinds for a node-valued field.
pub type Accepts = fn(NodeKind) -> bool;

/// Value type of a single field in a kind's field table.
#[derive(Clone, Copy, Debug)]
pub enum FieldType {
    Node(Accepts),
    OptionalNode(Accepts),
    NodeList(Accepts),
    Int,
    Decimal,
    Str,
    OptionalStr,
    Bytes,
    Bool,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

/// Scalar payload of a field.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Value {
    Int(BigInt),
    Decimal(Decimal),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
}

/// A stored field value. Child nodes are referenced by arena id.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Field {
    Node(u32),
    List(Vec<u32>),
    Value(Value),
    Absent,
}

/// A single typed node. Children are owned through the arena and referenced by id.
#[derive(Clone, Debug)]
pub struct AstNode {
    pub id: u32,
    pub kind: NodeKind,
    /// `None` only for nodes synthesized by later passes.
    pub location: Option<Location>,
    pub(crate) fields: Vec<Field>,
    pub(crate) annotations: FxHashMap<String, serde_json::Value>,
}

mod accepts {
    use super::{NodeClass, NodeKind};

    pub(super) fn expression(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::Expression)
    }

    pub(super) fn statement(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::Statement)
    }

    pub(super) fn body_item(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::Statement) || (kind.is_a(NodeClass::TopLevel) && kind != NodeKind::Module)
    }

    pub(super) fn doc_str(kind: NodeKind) -> bool {
        kind == NodeKind::DocStr
    }

    pub(super) fn arguments(kind: NodeKind) -> bool {
        kind == NodeKind::Arguments
    }

    pub(super) fn arg(kind: NodeKind) -> bool {
        kind == NodeKind::Arg
    }

    pub(super) fn keyword(kind: NodeKind) -> bool {
        kind == NodeKind::Keyword
    }

    pub(super) fn binary_operator(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::BinaryOperator)
    }

    pub(super) fn boolean_operator(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::BooleanOperator)
    }

    pub(super) fn comparison_operator(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::ComparisonOperator)
    }

    pub(super) fn unary_operator(kind: NodeKind) -> bool {
        kind.is_a(NodeClass::UnaryOperator)
    }
}

const EXPR: FieldType = FieldType::Node(accepts::expression);
const OPT_EXPR: FieldType = FieldType::OptionalNode(accepts::expression);
const EXPRS: FieldType = FieldType::NodeList(accepts::expression);
const STMTS: FieldType = FieldType::NodeList(accepts::statement);
const BODY: FieldType = FieldType::NodeList(accepts::body_item);
const DOC: FieldType = FieldType::OptionalNode(accepts::doc_str);
const ARGUMENTS: FieldType = FieldType::Node(accepts::arguments);
const ARGS: FieldType = FieldType::NodeList(accepts::arg);
const KEYWORDS: FieldType = FieldType::NodeList(accepts::keyword);
const BIN_OP: FieldType = FieldType::Node(accepts::binary_operator);
const BOOL_OP: FieldType = FieldType::Node(accepts::boolean_operator);
const CMP_OP: FieldType = FieldType::Node(accepts::comparison_operator);
const UNARY_OP: FieldType = FieldType::Node(accepts::unary_operator);
const INT: FieldType = FieldType::Int;
const DECIMAL: FieldType = FieldType::Decimal;
const STR: FieldType = FieldType::Str;
const OPT_STR: FieldType = FieldType::OptionalStr;
const BYTES: FieldType = FieldType::Bytes;
const BOOL: FieldType = FieldType::Bool;

macro_rules! node_kinds {
    (@tag $kind:ident) => {
        stringify!($kind)
    };

    (@tag $kind:ident $tag:literal) => {
        $tag
    };

    (
        $(
            $(#[$attr:meta])*
            $kind:ident $(= $tag:literal)? : $class:ident {
                $( $field:literal => $ty:expr ),* $(,)?
            }
        )+
    ) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        pub enum NodeKind {
            $(
                $(#[$attr])*
                $kind,
            )+
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[ $( NodeKind::$kind, )+ ];

            /// The tag used for this kind by the generic parse tree and by `to_dict`.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( NodeKind::$kind => node_kinds!(@tag $kind $($tag)?), )+
                }
            }

            #[must_use]
            pub fn class(self) -> NodeClass {
                match self {
                    $( NodeKind::$kind => NodeClass::$class, )+
                }
            }

            /// Ordered semantic fields of this kind.
            #[must_use]
            pub fn fields(self) -> &'static [FieldSpec] {
                match self {
                    $(
                        NodeKind::$kind => {
                            const FIELDS: &[FieldSpec] = &[
                                $( FieldSpec { name: $field, ty: $ty }, )*
                            ];
                            FIELDS
                        }
                    )+
                }
            }
        }
    };
}

node_kinds! {
    Module: TopLevel { "name" => OPT_STR, "doc_string" => DOC, "body" => BODY }
    FunctionDef: TopLevel {
        "name" => STR,
        "args" => ARGUMENTS,
        "body" => STMTS,
        "decorator_list" => EXPRS,
        "returns" => OPT_EXPR,
        "doc_string" => DOC,
    }
    InterfaceDef: TopLevel { "name" => STR, "body" => BODY, "doc_string" => DOC }
    StructDef: TopLevel { "name" => STR, "body" => BODY, "doc_string" => DOC }
    EnumDef: TopLevel { "name" => STR, "body" => BODY, "doc_string" => DOC }
    EventDef: TopLevel { "name" => STR, "body" => BODY, "doc_string" => DOC }

    DocStr: Auxiliary { "value" => STR }
    Arguments = "arguments": Auxiliary { "args" => ARGS, "defaults" => EXPRS }
    Arg = "arg": Auxiliary { "arg" => STR, "annotation" => OPT_EXPR }
    Keyword = "keyword": Auxiliary { "arg" => STR, "value" => EXPR }

    /// Module-level storage, constant or immutable declaration.
    VariableDecl: Statement {
        "target" => EXPR,
        "annotation" => EXPR,
        "value" => OPT_EXPR,
        "is_constant" => BOOL,
        "is_public" => BOOL,
        "is_immutable" => BOOL,
    }
    ImplementsDecl: Statement { "annotation" => EXPR }
    Assign: Statement { "target" => EXPR, "value" => EXPR }
    AugAssign: Statement { "target" => EXPR, "op" => BIN_OP, "value" => EXPR }
    AnnAssign: Statement { "target" => EXPR, "annotation" => EXPR, "value" => OPT_EXPR }
    If: Statement { "test" => EXPR, "body" => STMTS, "orelse" => STMTS }
    For: Statement { "target" => EXPR, "iter" => EXPR, "body" => STMTS }
    Return: Statement { "value" => OPT_EXPR }
    Raise: Statement { "exc" => OPT_EXPR }
    Assert: Statement { "test" => EXPR, "msg" => OPT_EXPR }
    Pass: Statement {}
    Break: Statement {}
    Continue: Statement {}
    Import: Statement { "name" => STR, "asname" => OPT_STR }
    ImportFrom: Statement { "level" => INT, "module" => OPT_STR, "name" => STR, "asname" => OPT_STR }
    Log: Statement { "value" => EXPR }
    Expr: Statement { "value" => EXPR }

    Name: Expression { "id" => STR }
    Call: Expression { "func" => EXPR, "args" => EXPRS, "keywords" => KEYWORDS }
    Attribute: Expression { "value" => EXPR, "attr" => STR }
    Subscript: Expression { "value" => EXPR, "slice" => EXPR }
    List: Expression { "elements" => EXPRS }
    Tuple: Expression { "elements" => EXPRS }
    Dict: Expression { "keys" => EXPRS, "values" => EXPRS }
    UnaryOp: Expression { "op" => UNARY_OP, "operand" => EXPR }
    BinOp: Expression { "left" => EXPR, "op" => BIN_OP, "right" => EXPR }
    BoolOp: Expression { "op" => BOOL_OP, "values" => EXPRS }
    Compare: Expression { "left" => EXPR, "op" => CMP_OP, "right" => EXPR }
    IfExp: Expression { "test" => EXPR, "body" => EXPR, "orelse" => EXPR }

    Add: BinaryOperator {}
    Sub: BinaryOperator {}
    Mult: BinaryOperator {}
    Div: BinaryOperator {}
    Mod: BinaryOperator {}
    Pow: BinaryOperator {}
    BitAnd: BinaryOperator {}
    BitOr: BinaryOperator {}
    BitXor: BinaryOperator {}
    LShift: BinaryOperator {}
    RShift: BinaryOperator {}

    And: BooleanOperator {}
    Or: BooleanOperator {}

    Eq: ComparisonOperator {}
    NotEq: ComparisonOperator {}
    Lt: ComparisonOperator {}
    LtE: ComparisonOperator {}
    Gt: ComparisonOperator {}
    GtE: ComparisonOperator {}
    In: ComparisonOperator {}
    NotIn: ComparisonOperator {}

    Not: UnaryOperator {}
    USub: UnaryOperator {}
    Invert: UnaryOperator {}

    Int: Num { "value" => INT }
    Decimal: Num { "value" => DECIMAL }
    Hex: Constant { "value" => STR }
    Str: Constant { "value" => STR }
    Bytes: Constant { "value" => BYTES }
    NameConstant: Constant { "value" => BOOL }
}
