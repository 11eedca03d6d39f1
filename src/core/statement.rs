use crate::core::ScopeInfo;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process unique identity of a function or program node, used in traces.
pub type NodeId = usize;

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(1);

pub fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub struct Program {
    pub id: NodeId,
    pub body: Vec<Statement>,
    pub strict: bool,
}

#[derive(Debug)]
pub struct FunctionNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    pub strict: bool,
    /// Source text from the `function` keyword to the closing brace.
    pub source: String,
    pub line: usize,
    pub column: usize,
    /// Hoisted declarations of `body`, collected once at parse time.
    pub scope: Rc<ScopeInfo>,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
    pub column: usize,
}

impl From<StatementKind> for Statement {
    fn from(kind: StatementKind) -> Self {
        Statement { kind, line: 0, column: 0 }
    }
}

#[derive(Clone, Debug)]
pub struct SwitchClause {
    pub test: Option<Expr>, // None for `default:`
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Var(Vec<(String, Option<Expr>)>),
    Expr(Expr),
}

#[derive(Clone, Debug)]
pub enum ForInTarget {
    Var(String, Option<Expr>), // for (var x = init in obj)
    Expr(Expr),                // for (a.b in obj)
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Block(Vec<Statement>),
    Var(Vec<(String, Option<Expr>)>),
    Empty,
    Expr(Expr),
    If(Expr, Box<Statement>, Option<Box<Statement>>), // condition, then, else
    DoWhile(Box<Statement>, Expr),                   // body, condition
    While(Expr, Box<Statement>),                     // condition, body
    For(Option<ForInit>, Option<Expr>, Option<Expr>, Box<Statement>), // init, test, update, body
    ForIn(ForInTarget, Expr, Box<Statement>),        // target, object, body
    Continue(Option<String>),
    Break(Option<String>),
    Return(Option<Expr>),
    With(Expr, Box<Statement>),
    Switch(Expr, Vec<SwitchClause>),
    Labelled(String, Box<Statement>),
    Throw(Expr),
    Try(Vec<Statement>, Option<(String, Vec<Statement>)>, Option<Vec<Statement>>), // block, catch, finally
    FunctionDeclaration(Rc<FunctionNode>),
    Debugger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Delete,
    Void,
    TypeOf,
    Plus,
    Minus,
    BitNot,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Arithmetic, shift and bitwise operators. Also used by compound assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Sar,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
    InstanceOf,
    In,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Debug)]
pub enum PropertyAssignment {
    Init(String, Expr),
    Getter(String, Rc<FunctionNode>),
    Setter(String, Rc<FunctionNode>),
}

#[derive(Clone, Debug)]
pub enum Expr {
    This,
    Name(String),
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    RegExp(String, String),                  // pattern, flags
    Array(Vec<Option<Expr>>),                // None marks an elision
    Object(Vec<PropertyAssignment>),
    Function(Rc<FunctionNode>),
    Dot(Box<Expr>, String),                  // base.name
    Bracket(Box<Expr>, Box<Expr>),           // base[key]
    Call(Box<Expr>, Vec<Expr>),
    New(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    PrefixCount(UpdateOp, Box<Expr>),
    PostfixCount(UpdateOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>), // test, consequent, alternate
    Assign(Option<BinaryOp>, Box<Expr>, Box<Expr>), // None for plain `=`
    Comma(Vec<Expr>),
}

impl Expr {
    /// Name or property access, the only valid assignment targets.
    pub fn is_reference_target(&self) -> bool {
        matches!(self, Expr::Name(_) | Expr::Dot(..) | Expr::Bracket(..))
    }
}
