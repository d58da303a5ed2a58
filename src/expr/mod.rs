//! Symbolic potential expressions.
//!
//! Expressions are parsed from the textual form used throughout force field
//! files (`4*epsilon*((sigma/r)**12 - (sigma/r)**6)`), can be evaluated
//! numerically and compared for mathematical equality.
//!
//! Equality is decided by [`Expression::is_equivalent`]: two expressions are
//! equal when they agree on a set of seeded random sample points drawn over
//! the union of their free symbols. This identifies rearranged but identical
//! forms (expanded products, reordered sums, `r**-6` versus `1/r**6`) without
//! a computer algebra system, and is deterministic for a given
//! [`EquivalenceOptions::seed`].

mod ast;
mod lexer;
mod parser;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

pub use ast::Function;
use ast::Expr;

/// Errors raised while parsing an expression string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("invalid numeric literal '{literal}' at offset {offset}")]
    InvalidNumber { literal: String, offset: usize },

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },
}

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("no value bound for symbol '{0}'")]
    UnboundSymbol(String),
}

/// Sampling parameters for [`Expression::is_equivalent`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceOptions {
    /// Number of random points each pair of expressions is evaluated at.
    pub samples: usize,
    /// Relative tolerance, scaled by the largest intermediate magnitude.
    pub rel_tolerance: f64,
    /// Absolute tolerance floor.
    pub abs_tolerance: f64,
    /// Inclusive lower and exclusive upper bound for the magnitude of sampled
    /// symbol values. Every other point draws a random sign per symbol.
    pub range: (f64, f64),
    /// Seed for the sample generator.
    pub seed: u64,
}

impl Default for EquivalenceOptions {
    fn default() -> Self {
        Self {
            samples: 24,
            rel_tolerance: 1e-9,
            abs_tolerance: 1e-12,
            range: (0.5, 2.0),
            seed: 0x5eed_6d50,
        }
    }
}

/// A parsed mathematical expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
    symbols: BTreeSet<String>,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(source)?;
        let ast = parser::Parser::new(tokens, source.len()).parse()?;
        let mut symbols = BTreeSet::new();
        ast.collect_symbols(&mut symbols);
        Ok(Self {
            source: source.trim().to_string(),
            ast,
            symbols,
        })
    }

    /// The text the expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Free symbols, sorted. Named constants such as `pi` are excluded.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    pub fn evaluate(&self, bindings: &HashMap<&str, f64>) -> Result<f64, EvalError> {
        self.ast.eval(bindings)
    }

    /// Tests whether `self` and `other` are the same function of their symbols.
    pub fn is_equivalent(&self, other: &Expression, options: &EquivalenceOptions) -> bool {
        if self.ast == other.ast {
            return true;
        }

        let symbols: Vec<&str> = self
            .symbols
            .union(&other.symbols)
            .map(String::as_str)
            .collect();

        let mut rng = StdRng::seed_from_u64(options.seed);
        let (lo, hi) = options.range;
        let samples = options.samples.max(1);
        let mut usable = 0usize;

        // Even points are positive, odd points carry random signs so that
        // forms agreeing only on positive arguments are told apart.
        for i in 0..samples {
            let signed = i % 2 == 1;
            let bindings: HashMap<&str, f64> = symbols
                .iter()
                .map(|&name| {
                    let magnitude = rng.gen_range(lo..hi);
                    let value = if signed && rng.gen_bool(0.5) {
                        -magnitude
                    } else {
                        magnitude
                    };
                    (name, value)
                })
                .collect();

            let (Ok((a, peak_a)), Ok((b, peak_b))) = (
                self.ast.eval_with_peak(&bindings),
                other.ast.eval_with_peak(&bindings),
            ) else {
                return false;
            };

            // A point outside the domain of either side says nothing.
            if !a.is_finite() || !b.is_finite() {
                continue;
            }
            let scale = a.abs().max(b.abs()).max(peak_a).max(peak_b);
            if (a - b).abs() > options.abs_tolerance + options.rel_tolerance * scale {
                log::trace!(
                    "expressions '{}' and '{}' differ at {:?}: {} vs {}",
                    self,
                    other,
                    bindings,
                    a,
                    b
                );
                return false;
            }
            usable += 1;

            if symbols.is_empty() {
                break;
            }
        }

        let required = if symbols.is_empty() { 1 } else { samples.div_ceil(4) };
        usable >= required
    }
}

impl PartialEq for Expression {
    /// Structural equality of the parsed trees; see
    /// [`Expression::is_equivalent`] for mathematical equality.
    fn eq(&self, other: &Self) -> bool {
        self.ast == other.ast
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
