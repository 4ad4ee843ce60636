// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Sprig language.
//
// Every grammar production has its own variant in the closed `Node` sum type,
// so evaluation and serialization match exhaustively. Nodes own their
// children; imported modules are embedded inline in `Import` nodes.
// Equality is structural, which is what parse idempotence is checked against.

use serde::Serialize;
use std::fmt;

/// Arithmetic operators for `BinaryOp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

/// Prefix sign for `UnaryOp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

/// Comparison operators for `Relative`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelOperator {
    Gt,
    Lt,
    Eq,
    Dif,
}

/// Boolean connectives for `Logic`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicOperator {
    And,
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for RelOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            RelOperator::Gt => ">",
            RelOperator::Lt => "<",
            RelOperator::Eq => "==",
            RelOperator::Dif => "!=",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogicOperator::And => write!(f, "&&"),
            LogicOperator::Or => write!(f, "||"),
        }
    }
}

/// Root of a parsed source file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Node>,
}

/// Statements between `{` and `}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Node>,
}

/// Ordered parameter names of a function declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arity {
    pub params: Vec<String>,
}

/// `from "<module>"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromClause {
    pub module: String,
}

/// `as <alias>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsClause {
    pub alias: String,
}

/// An import with the imported module's program embedded inline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub from: FromClause,
    pub alias: Option<AsClause>,
    pub program: Program,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    BinaryOp {
        left: Box<Node>,
        op: BinaryOperator,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    /// Boolean negation: `!rel`
    Negative(Box<Node>),
    Relative {
        left: Box<Node>,
        op: RelOperator,
        right: Box<Node>,
    },
    Logic {
        left: Box<Node>,
        op: LogicOperator,
        right: Box<Node>,
    },
    Numerical(i64),
    Logical(bool),
    String(String),
    Ident(String),
    Array(Vec<Node>),
    Assign {
        name: String,
        value: Box<Node>,
    },
    Block(Block),
    If {
        condition: Box<Node>,
        block: Block,
    },
    DeclFunc {
        name: String,
        description: Option<String>,
        arity: Arity,
        block: Block,
    },
    CallFunc {
        name: String,
        args: Vec<Node>,
    },
    CallPrint(Box<Node>),
    CallArg(Box<Node>),
    CallConcat(Vec<Node>),
    CallMap {
        collection: Box<Node>,
        function: Box<Node>,
    },
    CallFilter {
        collection: Box<Node>,
        function: Box<Node>,
    },
    Return(Box<Node>),
    ReturnVoid,
    Import(Import),
}

impl Node {
    pub fn binary(left: Node, op: BinaryOperator, right: Node) -> Self {
        Node::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn relative(left: Node, op: RelOperator, right: Node) -> Self {
        Node::Relative { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn logic(left: Node, op: LogicOperator, right: Node) -> Self {
        Node::Logic { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn ident(name: &str) -> Self {
        Node::Ident(name.to_string())
    }
}
