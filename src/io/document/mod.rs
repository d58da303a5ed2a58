//! TOML topology documents.
//!
//! Atom types are referred to by their (unique) name and connection types
//! by their position in `connection_types`. Quantities are written as
//! `"<value> <unit>"` strings; bare numbers are accepted on input.
//!
//! ```toml
//! name = "water"
//!
//! [[atom_types]]
//! name = "OW"
//! expression = "4*epsilon*((sigma/r)**12 - (sigma/r)**6)"
//! independent_variables = ["r"]
//! mass = "15.999 g/mol"
//! charge = "-0.834 e"
//!
//! [atom_types.parameters]
//! sigma = "0.315 nm"
//! epsilon = "0.636 kJ/mol"
//!
//! [[sites]]
//! name = "O"
//! position = [0.0, 0.0, 0.0]
//! atom_type = "OW"
//!
//! [[bonds]]
//! members = [0, 1]
//! type = 0
//! ```

pub mod reader;
pub mod writer;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::units::{ParseUnitError, Quantity};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub atom_types: Vec<AtomTypeEntry>,
    #[serde(default)]
    pub connection_types: Vec<ConnectionTypeEntry>,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonds: Vec<ConnectionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub angles: Vec<ConnectionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dihedrals: Vec<ConnectionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impropers: Vec<ConnectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomTypeEntry {
    pub name: String,
    pub expression: String,
    pub independent_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<QuantityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<QuantityValue>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub atomclass: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doi: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub overrides: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub definition: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, QuantityValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTypeEntry {
    pub kind: String,
    pub name: String,
    pub expression: String,
    pub independent_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_types: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: BTreeMap<String, QuantityValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<QuantityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<QuantityValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub members: Vec<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// A quantity as written in a document: `"0.3 nm"` or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    Number(f64),
    Text(String),
}

impl QuantityValue {
    /// Parses the value; a bare number is dimensionless.
    pub fn to_quantity(&self) -> Result<Quantity, ParseUnitError> {
        match self {
            QuantityValue::Number(v) => Ok(Quantity::dimensionless(*v)),
            QuantityValue::Text(s) => Quantity::parse(s),
        }
    }

    pub fn is_bare(&self) -> bool {
        matches!(self, QuantityValue::Number(_))
    }
}

impl From<&Quantity> for QuantityValue {
    fn from(q: &Quantity) -> Self {
        QuantityValue::Text(q.to_string())
    }
}
