use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

/// Elementary functions understood by the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Exp,
    Log,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "exp" => Function::Exp,
            "log" | "ln" => Function::Log,
            "sqrt" => Function::Sqrt,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "abs" | "Abs" => Function::Abs,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Abs => "abs",
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Function::Exp => x.exp(),
            Function::Log => x.ln(),
            Function::Sqrt => x.sqrt(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Abs => x.abs(),
        }
    }
}

/// Named constants; never treated as free symbols.
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(&'static str),
    Symbol(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Function,
        arg: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Expr::Call { arg, .. } => arg.collect_symbols(out),
        }
    }

    /// Evaluates the tree. Non-finite intermediate values propagate as IEEE
    /// values; only unbound symbols are errors.
    pub fn eval(&self, bindings: &HashMap<&str, f64>) -> Result<f64, EvalError> {
        let mut peak = 0.0;
        self.eval_tracked(bindings, &mut peak)
    }

    /// Like [`Expr::eval`], also returning the largest finite magnitude seen
    /// at any node. Used to scale tolerances when terms cancel.
    pub fn eval_with_peak(&self, bindings: &HashMap<&str, f64>) -> Result<(f64, f64), EvalError> {
        let mut peak = 0.0;
        let value = self.eval_tracked(bindings, &mut peak)?;
        Ok((value, peak))
    }

    fn eval_tracked(&self, bindings: &HashMap<&str, f64>, peak: &mut f64) -> Result<f64, EvalError> {
        let value = match self {
            Expr::Number(v) => *v,
            Expr::Constant(name) => constant(name).unwrap_or(f64::NAN),
            Expr::Symbol(name) => *bindings
                .get(name.as_str())
                .ok_or_else(|| EvalError::UnboundSymbol(name.clone()))?,
            Expr::Neg(inner) => -inner.eval_tracked(bindings, peak)?,
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval_tracked(bindings, peak)?;
                let b = rhs.eval_tracked(bindings, peak)?;
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => pow(a, b),
                }
            }
            Expr::Call { func, arg } => func.apply(arg.eval_tracked(bindings, peak)?),
        };
        if value.is_finite() {
            *peak = peak.max(value.abs());
        }
        Ok(value)
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Neg(_) => 3,
            Expr::Number(v) if v.is_sign_negative() => 3,
            _ => 5,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

/// Integer exponents go through `powi` so that negative bases (e.g. cos(phi))
/// stay well defined.
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        base.powi(exponent as i32)
    } else {
        base.powf(exponent)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{v}"),
            Expr::Constant(name) => f.write_str(name),
            Expr::Symbol(name) => f.write_str(name),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_child(f, inner.precedence() < 4)
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (left_paren, right_paren) = match op {
                    BinaryOp::Pow => (lhs.precedence() <= prec, rhs.precedence() < prec),
                    BinaryOp::Sub | BinaryOp::Div => {
                        (lhs.precedence() < prec, rhs.precedence() <= prec)
                    }
                    BinaryOp::Add | BinaryOp::Mul => {
                        (lhs.precedence() < prec, rhs.precedence() < prec)
                    }
                };
                lhs.fmt_child(f, left_paren)?;
                if *op == BinaryOp::Pow {
                    f.write_str(op.symbol())?;
                } else {
                    write!(f, " {} ", op.symbol())?;
                }
                rhs.fmt_child(f, right_paren)
            }
            Expr::Call { func, arg } => write!(f, "{}({})", func.name(), arg),
        }
    }
}
