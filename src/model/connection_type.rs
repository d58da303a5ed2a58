use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::potential::{Potential, parameters};

/// The four kinds of bonded interaction a topology distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionKind {
    Bond,
    Angle,
    Dihedral,
    Improper,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 4] = [
        ConnectionKind::Bond,
        ConnectionKind::Angle,
        ConnectionKind::Dihedral,
        ConnectionKind::Improper,
    ];

    /// Number of sites a connection of this kind spans.
    pub fn arity(self) -> usize {
        match self {
            ConnectionKind::Bond => 2,
            ConnectionKind::Angle => 3,
            ConnectionKind::Dihedral | ConnectionKind::Improper => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::Bond => "bond",
            ConnectionKind::Angle => "angle",
            ConnectionKind::Dihedral => "dihedral",
            ConnectionKind::Improper => "improper",
        }
    }

    fn default_form(self) -> (&'static str, &'static str, &'static str, &'static [(&'static str, &'static str)]) {
        match self {
            ConnectionKind::Bond => (
                "BondType",
                "0.5 * k * (r - r_eq)**2",
                "r",
                &[("k", "1000 kJ/(mol*nm**2)"), ("r_eq", "0.14 nm")],
            ),
            ConnectionKind::Angle => (
                "AngleType",
                "0.5 * k * (theta - theta_eq)**2",
                "theta",
                &[("k", "1000 kJ/mol"), ("theta_eq", "180 degree")],
            ),
            ConnectionKind::Dihedral => (
                "DihedralType",
                "k * (1 + cos(n * phi - phi_eq))",
                "phi",
                &[("k", "1000 kJ/mol"), ("n", "1"), ("phi_eq", "180 degree")],
            ),
            ConnectionKind::Improper => (
                "ImproperType",
                "0.5 * k * (phi - phi_eq)**2",
                "phi",
                &[("k", "1000 kJ/mol"), ("phi_eq", "0 degree")],
            ),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bond" => Ok(ConnectionKind::Bond),
            "angle" => Ok(ConnectionKind::Angle),
            "dihedral" => Ok(ConnectionKind::Dihedral),
            "improper" => Ok(ConnectionKind::Improper),
            other => Err(Error::InvalidConnection(format!(
                "unknown connection kind '{other}'"
            ))),
        }
    }
}

/// The potential of a bond, angle, dihedral or improper, optionally
/// restricted to a tuple of atom type names.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionType {
    kind: ConnectionKind,
    pub potential: Potential,
    member_types: Option<Vec<String>>,
}

impl ConnectionType {
    pub fn new(kind: ConnectionKind, potential: Potential) -> Self {
        Self {
            kind,
            potential,
            member_types: None,
        }
    }

    /// The harmonic form of `kind` with generic parameter values.
    pub fn with_defaults(kind: ConnectionKind) -> Self {
        let (name, expression, variable, params) = kind.default_form();
        let potential = parameters(params.iter().copied())
            .and_then(|p| Potential::new(name, expression, [variable], p))
            .expect("default connection type potential is valid. This is a library bug.");
        Self::new(kind, potential)
    }

    pub fn with_member_types<I, S>(mut self, member_types: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_member_types(Some(member_types.into_iter().map(Into::into).collect()))?;
        Ok(self)
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.potential.name()
    }

    pub fn member_types(&self) -> Option<&[String]> {
        self.member_types.as_deref()
    }

    pub fn set_member_types(&mut self, member_types: Option<Vec<String>>) -> Result<(), Error> {
        if let Some(types) = &member_types
            && types.len() != self.kind.arity()
        {
            return Err(Error::InvalidConnection(format!(
                "{} type '{}' needs {} member types, got {}",
                self.kind,
                self.name(),
                self.kind.arity(),
                types.len()
            )));
        }
        self.member_types = member_types;
        Ok(())
    }
}
