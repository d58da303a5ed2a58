use super::atom_type::{charge_unit, mass_unit};
use super::topology::AtomTypeId;
use super::units::{Quantity, Unit};
use crate::error::Error;

/// A particle of a topology: an atom or a coarse-grained bead.
///
/// The charge and mass overrides replace the values of the atom type when
/// set. They keep the unit they were given but must have the dimensions of
/// `e` and `g/mol`.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    /// Cartesian position in nanometers.
    pub position: [f64; 3],
    pub atom_type: Option<AtomTypeId>,
    charge: Option<Quantity>,
    mass: Option<Quantity>,
}

impl Site {
    pub fn new(name: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            position,
            atom_type: None,
            charge: None,
            mass: None,
        }
    }

    pub fn with_atom_type(mut self, atom_type: AtomTypeId) -> Self {
        self.atom_type = Some(atom_type);
        self
    }

    pub fn with_charge(mut self, charge: Quantity) -> Result<Self, Error> {
        self.set_charge(Some(charge))?;
        Ok(self)
    }

    pub fn with_mass(mut self, mass: Quantity) -> Result<Self, Error> {
        self.set_mass(Some(mass))?;
        Ok(self)
    }

    pub fn charge(&self) -> Option<&Quantity> {
        self.charge.as_ref()
    }

    pub fn mass(&self) -> Option<&Quantity> {
        self.mass.as_ref()
    }

    pub fn set_charge(&mut self, charge: Option<Quantity>) -> Result<(), Error> {
        self.charge = self.checked(charge, &charge_unit(), "charge")?;
        Ok(())
    }

    pub fn set_mass(&mut self, mass: Option<Quantity>) -> Result<(), Error> {
        self.mass = self.checked(mass, &mass_unit(), "mass")?;
        Ok(())
    }

    fn checked(
        &self,
        value: Option<Quantity>,
        expected: &Unit,
        what: &str,
    ) -> Result<Option<Quantity>, Error> {
        match value {
            Some(q) if !q.unit.is_compatible(expected) => Err(Error::invalid_site(
                &self.name,
                format!("{what} '{q}' is not convertible to {expected}"),
            )),
            other => Ok(other),
        }
    }

    #[inline]
    pub fn is_typed(&self) -> bool {
        self.atom_type.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_keep_their_unit() {
        let site = Site::new("OW1", [0.0; 3])
            .with_charge(Quantity::parse("-1.336e-19 C").unwrap())
            .unwrap()
            .with_mass(Quantity::parse("0.015999 kg/mol").unwrap())
            .unwrap();
        assert_eq!(site.charge().unwrap().unit.symbol(), "C");
        assert_eq!(site.mass().unwrap().unit.symbol(), "kg/mol");
    }

    #[test]
    fn overrides_with_wrong_dimensions_are_rejected() {
        let err = Site::new("X", [0.0; 3])
            .with_charge(Quantity::parse("1 nm").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSite { .. }));
        assert!(err.to_string().contains("charge"));

        let mut site = Site::new("Y", [0.0; 3]);
        assert!(site.set_mass(Some(Quantity::parse("3 kJ/mol").unwrap())).is_err());
        assert!(site.mass().is_none());
    }

    #[test]
    fn overrides_can_be_cleared() {
        let mut site = Site::new("H", [0.0; 3])
            .with_charge(Quantity::parse("0.4 e").unwrap())
            .unwrap();
        site.set_charge(None).unwrap();
        assert!(site.charge().is_none());
    }
}
