use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;

use super::potential::{Potential, parameters};
use super::units::{Quantity, Unit};

pub const DEFAULT_ATOM_EXPRESSION: &str = "4*epsilon*((sigma/r)**12 - (sigma/r)**6)";

/// An atom type: the non-bonded potential of a site together with the
/// per-type properties a force field assigns (mass, charge, class, ...).
///
/// Mass is held in g/mol and charge in elementary charges; values supplied
/// in other compatible units are converted on the way in.
#[derive(Debug, Clone)]
pub struct AtomType {
    pub potential: Potential,
    mass: Quantity,
    charge: Quantity,
    pub atomclass: String,
    pub doi: String,
    pub description: String,
    /// Names of atom types this one takes precedence over.
    pub overrides: BTreeSet<String>,
    /// SMARTS string defining this atom type, stored verbatim.
    pub definition: String,
}

impl AtomType {
    pub fn new(name: &str, potential: Potential) -> Self {
        let mut potential = potential;
        potential.set_name(name);
        Self {
            potential,
            mass: Quantity::new(0.0, mass_unit()),
            charge: Quantity::new(0.0, charge_unit()),
            atomclass: String::new(),
            doi: String::new(),
            description: String::new(),
            overrides: BTreeSet::new(),
            definition: String::new(),
        }
    }

    /// A 12-6 Lennard-Jones atom type with the given sigma and epsilon.
    pub fn lennard_jones(name: &str, sigma: Quantity, epsilon: Quantity) -> Result<Self, Error> {
        let params = BTreeMap::from([
            ("sigma".to_string(), sigma),
            ("epsilon".to_string(), epsilon),
        ]);
        let potential = Potential::new(name, DEFAULT_ATOM_EXPRESSION, ["r"], params)?;
        Ok(Self::new(name, potential))
    }

    /// A Lennard-Jones atom type with sigma 0.3 nm and epsilon 0.3 kJ/mol.
    ///
    /// Epsilon is a molar energy like every other energy parameter, so unit
    /// systems built on kJ/mol or kcal/mol can express it.
    pub fn with_defaults(name: &str) -> Self {
        let params = parameters([("sigma", "0.3 nm"), ("epsilon", "0.3 kJ/mol")])
            .and_then(|p| Potential::new(name, DEFAULT_ATOM_EXPRESSION, ["r"], p))
            .expect("default atom type potential is valid. This is a library bug.");
        Self::new(name, params)
    }

    pub fn name(&self) -> &str {
        self.potential.name()
    }

    pub fn mass(&self) -> &Quantity {
        &self.mass
    }

    pub fn charge(&self) -> &Quantity {
        &self.charge
    }

    pub fn set_mass(&mut self, mass: Quantity) -> Result<(), Error> {
        self.mass = mass.to(&mass_unit())?;
        Ok(())
    }

    pub fn set_charge(&mut self, charge: Quantity) -> Result<(), Error> {
        self.charge = charge.to(&charge_unit())?;
        Ok(())
    }

    pub fn with_mass(mut self, mass: Quantity) -> Result<Self, Error> {
        self.set_mass(mass)?;
        Ok(self)
    }

    pub fn with_charge(mut self, charge: Quantity) -> Result<Self, Error> {
        self.set_charge(charge)?;
        Ok(self)
    }
}

impl PartialEq for AtomType {
    /// Name, expression, class and parameters must match exactly; mass and
    /// charge within an absolute 1e-6 and relative 1e-5 tolerance.
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
            && self.potential.expression() == other.potential.expression()
            && self.potential.independent_variables() == other.potential.independent_variables()
            && self.potential.parameters() == other.potential.parameters()
            && self.atomclass == other.atomclass
            && self.mass.approx_eq(&other.mass, 1e-5, 1e-6)
            && self.charge.approx_eq(&other.charge, 1e-5, 1e-6)
    }
}

pub(crate) fn mass_unit() -> Unit {
    Unit::parse("g/mol").expect("'g/mol' is a known unit. This is a library bug.")
}

pub(crate) fn charge_unit() -> Unit {
    Unit::parse("e").expect("'e' is a known unit. This is a library bug.")
}
