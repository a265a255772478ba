use std::rc::Rc;

use crate::parser::static_semantics::ScopeSummary;

/// Byte offsets of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}
impl Meta {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Meta {
            start_index,
            end_index,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Meta) -> Meta {
        Meta {
            start_index: self.start_index.min(other.start_index),
            end_index: self.end_index.max(other.end_index),
        }
    }
}

pub trait HasMeta {
    fn get_meta(&self) -> Meta;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteralType {
    IntegerLiteral(i64),
    FloatLiteral(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    NullLiteral,
    BooleanLiteral(bool),
    StringLiteral(String),
    NumberLiteral(NumberLiteralType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    BitwiseNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    BitwiseLeftShift,
    BitwiseRightShift,
    BitwiseUnsignedRightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
    BitwiseLeftShiftEquals,
    BitwiseRightShiftEquals,
    BitwiseUnsignedRightShiftEquals,
    BitwiseOrEquals,
    BitwiseXorEquals,
    BitwiseAndEquals,
}
impl AssignmentOperator {
    /// The binary operator a compound assignment applies, `None` for plain `=`.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Equals => None,
            AssignmentOperator::AddEquals => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractEquals => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyEquals => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideEquals => Some(BinaryOperator::Divide),
            AssignmentOperator::ModuloEquals => Some(BinaryOperator::Modulo),
            AssignmentOperator::BitwiseLeftShiftEquals => Some(BinaryOperator::BitwiseLeftShift),
            AssignmentOperator::BitwiseRightShiftEquals => {
                Some(BinaryOperator::BitwiseRightShift)
            }
            AssignmentOperator::BitwiseUnsignedRightShiftEquals => {
                Some(BinaryOperator::BitwiseUnsignedRightShift)
            }
            AssignmentOperator::BitwiseOrEquals => Some(BinaryOperator::BitwiseOr),
            AssignmentOperator::BitwiseXorEquals => Some(BinaryOperator::BitwiseXor),
            AssignmentOperator::BitwiseAndEquals => Some(BinaryOperator::BitwiseAnd),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub meta: Meta,
    pub key: String,
    pub kind: PropertyKind,
    pub value: ExpressionType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberExpressionType {
    SimpleMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
    },
    ComputedMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: Box<ExpressionType>,
    },
}
impl HasMeta for MemberExpressionType {
    fn get_meta(&self) -> Meta {
        match self {
            MemberExpressionType::SimpleMemberExpression { meta, .. } => *meta,
            MemberExpressionType::ComputedMemberExpression { meta, .. } => *meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<Option<ExpressionType>>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyData>,
    },
    FunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    MemberExpression(MemberExpressionType),
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    SequenceExpression {
        meta: Meta,
        expressions: Vec<ExpressionType>,
    },
}
impl ExpressionType {
    /// Identifiers and property accesses are the only valid simple assignment targets.
    pub fn is_valid_simple_assignment_target(&self) -> bool {
        matches!(
            self,
            ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_)
        )
    }
}
impl HasMeta for ExpressionType {
    fn get_meta(&self) -> Meta {
        match self {
            ExpressionType::Literal(d) => d.meta,
            ExpressionType::Identifier(d) => d.meta,
            ExpressionType::ThisExpression { meta }
            | ExpressionType::ArrayExpression { meta, .. }
            | ExpressionType::ObjectExpression { meta, .. }
            | ExpressionType::UnaryExpression { meta, .. }
            | ExpressionType::UpdateExpression { meta, .. }
            | ExpressionType::BinaryExpression { meta, .. }
            | ExpressionType::LogicalExpression { meta, .. }
            | ExpressionType::AssignmentExpression { meta, .. }
            | ExpressionType::ConditionalExpression { meta, .. }
            | ExpressionType::CallExpression { meta, .. }
            | ExpressionType::NewExpression { meta, .. }
            | ExpressionType::SequenceExpression { meta, .. } => *meta,
            ExpressionType::FunctionExpression(f) => f.meta,
            ExpressionType::MemberExpression(m) => m.get_meta(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBodyData {
    pub meta: Meta,
    pub statements: Vec<StatementType>,
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: FunctionBodyData,
}
impl FunctionData {
    pub fn is_strict(&self) -> bool {
        self.body.scope.strict
    }

    pub fn name(&self) -> &str {
        self.id.as_ref().map(|id| id.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationType {
    FunctionDeclaration(Rc<FunctionData>),
    VariableDeclaration(VariableDeclarationData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatementData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCaseData {
    pub meta: Meta,
    /// `None` for the `default` clause.
    pub test: Option<ExpressionType>,
    pub consequent: Vec<StatementType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatementData {
    pub meta: Meta,
    pub discriminant: Box<ExpressionType>,
    pub cases: Vec<SwitchCaseData>,
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: IdentifierData,
    pub body: BlockStatementData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatementData {
    pub meta: Meta,
    pub block: BlockStatementData,
    pub handler: Option<CatchClauseData>,
    pub finalizer: Option<BlockStatementData>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInitType {
    Declaration(VariableDeclarationData),
    Expression(Box<ExpressionType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatementData {
    pub meta: Meta,
    pub init: Option<ForInitType>,
    pub test: Option<Box<ExpressionType>>,
    pub update: Option<Box<ExpressionType>>,
    pub body: Box<StatementType>,
    /// Lexical bindings of a `let`/`const` head.
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInLeftType {
    Declaration {
        kind: VariableDeclarationKind,
        id: IdentifierData,
    },
    Target(Box<ExpressionType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatementData {
    pub meta: Meta,
    pub left: ForInLeftType,
    pub right: Box<ExpressionType>,
    pub body: Box<StatementType>,
    pub scope: ScopeSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement(BlockStatementData),
    EmptyStatement {
        meta: Meta,
    },
    DebuggerStatement {
        meta: Meta,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
    BreakStatement {
        meta: Meta,
        label: Option<IdentifierData>,
    },
    ContinueStatement {
        meta: Meta,
        label: Option<IdentifierData>,
    },
    LabeledStatement {
        meta: Meta,
        label: IdentifierData,
        body: Box<StatementType>,
    },
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    SwitchStatement(SwitchStatementData),
    ThrowStatement {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
    TryStatement(TryStatementData),
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    DoWhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ForStatement(ForStatementData),
    ForInStatement(ForInStatementData),
    DeclarationStatement(DeclarationType),
}
impl StatementType {
    pub fn is_iteration(&self) -> bool {
        matches!(
            self,
            StatementType::WhileStatement { .. }
                | StatementType::DoWhileStatement { .. }
                | StatementType::ForStatement(_)
                | StatementType::ForInStatement(_)
        )
    }
}
impl HasMeta for StatementType {
    fn get_meta(&self) -> Meta {
        match self {
            StatementType::ExpressionStatement { meta, .. }
            | StatementType::EmptyStatement { meta }
            | StatementType::DebuggerStatement { meta }
            | StatementType::ReturnStatement { meta, .. }
            | StatementType::BreakStatement { meta, .. }
            | StatementType::ContinueStatement { meta, .. }
            | StatementType::LabeledStatement { meta, .. }
            | StatementType::IfStatement { meta, .. }
            | StatementType::ThrowStatement { meta, .. }
            | StatementType::WhileStatement { meta, .. }
            | StatementType::DoWhileStatement { meta, .. } => *meta,
            StatementType::BlockStatement(d) => d.meta,
            StatementType::SwitchStatement(d) => d.meta,
            StatementType::TryStatement(d) => d.meta,
            StatementType::ForStatement(d) => d.meta,
            StatementType::ForInStatement(d) => d.meta,
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => f.meta,
            StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(v)) => v.meta,
        }
    }
}

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    pub scope: ScopeSummary,
}
impl ProgramData {
    pub fn is_strict(&self) -> bool {
        self.scope.strict
    }
}
