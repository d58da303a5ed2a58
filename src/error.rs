//! Error type for topology construction, template lookup, compatibility
//! checks and functional-form conversions.

use thiserror::Error;

use crate::expr::ParseError;
use crate::model::units::{ParseUnitError, UnitError};

#[derive(Debug, Error)]
pub enum Error {
    /// A potential expression could not be parsed.
    #[error("invalid expression '{expression}': {source}")]
    Expression {
        expression: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    UnitParse(#[from] ParseUnitError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    /// The expression, independent variables and parameters of a potential
    /// do not agree with each other.
    #[error("invalid potential '{name}': {detail}")]
    InvalidPotential { name: String, detail: String },

    /// A connection refers to missing sites, repeats a site, has the wrong
    /// number of members or a connection type of another kind.
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// A site refers to a missing atom type or has a malformed override.
    #[error("invalid site '{name}': {detail}")]
    InvalidSite { name: String, detail: String },

    #[error("potential template '{0}' not found")]
    TemplateNotFound(String),

    #[error("failed to parse potential templates: {0}")]
    TemplateParse(#[from] toml::de::Error),

    /// A template entry is stored under a key that differs from its name.
    #[error("mismatch between potential template key '{key}' and name '{name}'")]
    TemplateNameMismatch { key: String, name: String },

    /// A potential of the topology matches none of the accepted templates.
    #[error(
        "{kind} '{name}' with expression '{expression}' matches none of the accepted potential templates"
    )]
    EngineIncompatibility {
        kind: String,
        name: String,
        expression: String,
    },

    /// A functional-form conversion was applied to an unsuitable potential.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

impl Error {
    pub fn expression(expression: &str, source: ParseError) -> Self {
        Self::Expression {
            expression: expression.to_string(),
            source,
        }
    }

    pub fn invalid_potential(name: &str, detail: impl Into<String>) -> Self {
        Self::InvalidPotential {
            name: name.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid_connection(detail: impl Into<String>) -> Self {
        Self::InvalidConnection(detail.into())
    }

    pub fn invalid_site(name: &str, detail: impl Into<String>) -> Self {
        Self::InvalidSite {
            name: name.to_string(),
            detail: detail.into(),
        }
    }

    pub fn engine_incompatibility(kind: &str, name: &str, expression: &str) -> Self {
        Self::EngineIncompatibility {
            kind: kind.to_string(),
            name: name.to_string(),
            expression: expression.to_string(),
        }
    }
}
