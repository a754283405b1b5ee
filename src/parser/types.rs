use serde::Serialize;

/// A parsed source file: the top-level statement list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    Return(Option<Expr>),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Pass,
    Expr(Expr),
    /// `import a` / `from a import b`; kept so the tree is complete, renders nothing.
    Import(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Constant(Constant),
    Name(String),
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    /// An f-string; each field was parsed as its own expression.
    FormattedString(Vec<FStringPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FStringPart {
    Literal(String),
    Field(Expr),
}

/// Literal values. Numbers keep their source spelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    None,
    Bool(bool),
    Int(String),
    Float(String),
    Str(String),
    Bytes(String),
    Imaginary(String),
    Ellipsis,
}

impl Constant {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::None => "None",
            Constant::Bool(_) => "bool",
            Constant::Int(_) => "int",
            Constant::Float(_) => "float",
            Constant::Str(_) => "str",
            Constant::Bytes(_) => "bytes",
            Constant::Imaginary(_) => "complex",
            Constant::Ellipsis => "Ellipsis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMult,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    /// Source spelling, used in diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::MatMult => "@",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    UAdd,
    USub,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl Expr {
    pub fn name(id: &str) -> Self {
        Expr::Name(id.to_string())
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant(Constant::Int(value.to_string()))
    }

    pub fn binop(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Callee name when this is a call to a plain name, e.g. `range(n)`.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { func, .. } => match func.as_ref() {
                Expr::Name(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_single_letter_name(&self) -> bool {
        matches!(self, Expr::Name(id) if id.chars().count() == 1 && id != "_")
    }

    /// Short node description for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Constant(_) => "constant",
            Expr::Name(_) => "name",
            Expr::BinOp { .. } => "binary operation",
            Expr::BoolOp { .. } => "boolean operation",
            Expr::UnaryOp { .. } => "unary operation",
            Expr::Compare { .. } => "comparison",
            Expr::Call { .. } => "call",
            Expr::Attribute { .. } => "attribute",
            Expr::Subscript { .. } => "subscript",
            Expr::Tuple(_) => "tuple",
            Expr::List(_) => "list",
            Expr::IfExp { .. } => "conditional expression",
            Expr::FormattedString(_) => "f-string",
        }
    }
}
