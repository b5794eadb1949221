use serde::{Deserialize, Serialize};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical negation (`!expr`).
    Not,
    /// Arithmetic negation (`-expr`).
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical (short-circuit)
    And,
    Or,

    // String / collection operations (method sugar lowers to these)
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    /// Membership test: `value in collection`.
    In,
}

/// The expression AST.
///
/// Serializable so that compiled rules can be inspected and stored; the
/// evaluator walks this tree directly against an
/// [`Activation`](crate::Activation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// The null literal.
    Null,
    /// A boolean literal.
    Bool(bool),
    /// A 64-bit signed integer literal.
    Int(i64),
    /// A 64-bit floating-point literal.
    Float(f64),
    /// A string literal.
    String(String),
    /// A list of expressions.
    List(Vec<Expr>),
    /// A reference to an environment variable by name.
    Ident(String),
    /// Field access sugar on a map: `alert_labels.severity`.
    Field(Box<Expr>, String),
    /// Index access: `alert_labels["severity"]`.
    Index(Box<Expr>, Box<Expr>),
    /// A unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// A binary operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// A conditional: `cond ? then : else`.
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    /// A builtin function call: `name(args...)`.
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Returns a human-readable pseudo-source rendering of the expression.
    pub fn to_source(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            Self::List(items) => {
                let inner = items
                    .iter()
                    .map(Self::to_source)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{inner}]")
            }
            Self::Ident(name) => name.clone(),
            Self::Field(base, field) => format!("{}.{}", base.to_source(), field),
            Self::Index(base, index) => format!("{}[{}]", base.to_source(), index.to_source()),
            Self::Unary(op, expr) => {
                let symbol = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                };
                format!("{}{}", symbol, expr.to_source())
            }
            Self::Binary(op, lhs, rhs) => {
                let symbol = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Mod => "%",
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::Lt => "<",
                    BinaryOp::Le => "<=",
                    BinaryOp::Gt => ">",
                    BinaryOp::Ge => ">=",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                    BinaryOp::Contains => "contains",
                    BinaryOp::StartsWith => "starts_with",
                    BinaryOp::EndsWith => "ends_with",
                    BinaryOp::Matches => "matches",
                    BinaryOp::In => "in",
                };
                format!("({} {} {})", lhs.to_source(), symbol, rhs.to_source())
            }
            Self::Ternary(cond, then, els) => format!(
                "({} ? {} : {})",
                cond.to_source(),
                then.to_source(),
                els.to_source()
            ),
            Self::Call(name, args) => {
                let inner = args
                    .iter()
                    .map(Self::to_source)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}({inner})")
            }
        }
    }

    /// Returns `true` if this expression is a literal value.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_)
        )
    }
}
