//! Matching the potentials of a topology against accepted functional forms.
//!
//! A simulation engine supports a fixed set of functional forms. Before a
//! topology is handed to it, every atom type and connection type must be
//! shown to use one of them; [`check_compatibility`] does this and names the
//! form each potential was matched to.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::expr::EquivalenceOptions;
use crate::model::connection_type::ConnectionKind;
use crate::model::potential::Potential;
use crate::model::topology::{AtomTypeId, ConnectionTypeId, Topology};
use crate::templates::{PotentialTemplate, PotentialTemplateLibrary};

#[derive(Debug, Clone, Default)]
pub struct CompatibilityConfig {
    pub equivalence: EquivalenceOptions,
}

/// A potential of a topology, identified by where it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PotentialKey {
    AtomType(AtomTypeId),
    ConnectionType(ConnectionTypeId),
}

/// Template name matched for each potential of a topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PotentialForms {
    forms: BTreeMap<PotentialKey, String>,
}

impl PotentialForms {
    pub fn get(&self, key: PotentialKey) -> Option<&str> {
        self.forms.get(&key).map(String::as_str)
    }

    pub fn atom_type(&self, id: AtomTypeId) -> Option<&str> {
        self.get(PotentialKey::AtomType(id))
    }

    pub fn connection_type(&self, id: ConnectionTypeId) -> Option<&str> {
        self.get(PotentialKey::ConnectionType(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PotentialKey, &str)> {
        self.forms.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Looks up `names` in `library`, failing on the first unknown one.
pub fn accepted_templates<'a, S: AsRef<str>>(
    library: &'a PotentialTemplateLibrary,
    names: &[S],
) -> Result<Vec<&'a PotentialTemplate>, Error> {
    names.iter().map(|n| library.get(n.as_ref())).collect()
}

/// The first accepted template with the same independent variables as
/// `potential` and an equivalent expression.
pub fn match_template<'a>(
    potential: &Potential,
    accepted: &[&'a PotentialTemplate],
    options: &EquivalenceOptions,
) -> Option<&'a PotentialTemplate> {
    let found = accepted
        .iter()
        .find(|t| potential.has_same_form(t.as_potential(), options))
        .copied();
    match found {
        Some(t) => log::debug!("'{}' matches template '{}'", potential.name(), t.name()),
        None => log::debug!(
            "'{}' ({}) matches no accepted template",
            potential.name(),
            potential.expression()
        ),
    }
    found
}

/// Maps every atom type, then every connection type, of `topology` to the
/// name of its matching template using default equivalence options.
pub fn check_compatibility(
    topology: &Topology,
    accepted: &[&PotentialTemplate],
) -> Result<PotentialForms, Error> {
    check_compatibility_with(topology, accepted, &CompatibilityConfig::default())
}

/// Connection types try the templates named for their kind first. Torsions
/// and impropers share expressions, so a plain dihedral would otherwise be
/// labelled an improper whenever an improper template is listed first.
pub fn check_compatibility_with(
    topology: &Topology,
    accepted: &[&PotentialTemplate],
    config: &CompatibilityConfig,
) -> Result<PotentialForms, Error> {
    let mut forms = PotentialForms::default();

    for (i, atom_type) in topology.atom_types().iter().enumerate() {
        let potential = &atom_type.potential;
        let Some(template) = match_template(potential, accepted, &config.equivalence) else {
            return Err(Error::engine_incompatibility(
                "atom type",
                potential.name(),
                potential.expression().source(),
            ));
        };
        forms
            .forms
            .insert(PotentialKey::AtomType(AtomTypeId(i)), template.name().to_string());
    }

    for (i, connection_type) in topology.connection_types().iter().enumerate() {
        let potential = &connection_type.potential;
        let candidates = ordered_for_kind(connection_type.kind(), accepted);
        let Some(template) = match_template(potential, &candidates, &config.equivalence) else {
            return Err(Error::engine_incompatibility(
                &format!("{} type", connection_type.kind()),
                potential.name(),
                potential.expression().source(),
            ));
        };
        forms.forms.insert(
            PotentialKey::ConnectionType(ConnectionTypeId(i)),
            template.name().to_string(),
        );
    }

    Ok(forms)
}

/// Stable reordering of `accepted` putting templates named for `kind` first.
fn ordered_for_kind<'a>(
    kind: ConnectionKind,
    accepted: &[&'a PotentialTemplate],
) -> Vec<&'a PotentialTemplate> {
    let is_improper = |t: &PotentialTemplate| t.name().contains("Improper");
    let suits = |t: &PotentialTemplate| is_improper(t) == (kind == ConnectionKind::Improper);
    let (mut ordered, rest): (Vec<_>, Vec<_>) = accepted.iter().copied().partition(|t| suits(t));
    ordered.extend(rest);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom_type::AtomType;
    use crate::model::connection_type::ConnectionType;
    use crate::model::potential::parameters;

    fn library() -> &'static PotentialTemplateLibrary {
        PotentialTemplateLibrary::global()
    }

    fn accepted(names: &[&str]) -> Vec<&'static PotentialTemplate> {
        accepted_templates(library(), names).unwrap()
    }

    #[test]
    fn default_types_match_harmonic_and_lj_forms() {
        let mut top = Topology::new("t");
        let at = top.add_atom_type(AtomType::with_defaults("C"));
        let bt = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        let accepted = accepted(&[
            "LennardJonesPotential",
            "HarmonicBondPotential",
        ]);

        let forms = check_compatibility(&top, &accepted).unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms.atom_type(at), Some("LennardJonesPotential"));
        assert_eq!(forms.connection_type(bt), Some("HarmonicBondPotential"));
    }

    #[test]
    fn expanded_lennard_jones_is_compatible() {
        let mut at = AtomType::with_defaults("C");
        at.potential
            .set_expression("4*epsilon*sigma**12/r**12 - 4*epsilon*sigma**6/r**6")
            .unwrap();
        let mut top = Topology::new("t");
        top.add_atom_type(at);

        let forms = check_compatibility(&top, &accepted(&["LennardJonesPotential"])).unwrap();
        assert_eq!(forms.atom_type(AtomTypeId(0)), Some("LennardJonesPotential"));
    }

    #[test]
    fn unsupported_form_is_an_engine_incompatibility() {
        let mut at = AtomType::with_defaults("C");
        at.potential.set_expression("sigma + epsilon*r").unwrap();
        let mut top = Topology::new("t");
        top.add_atom_type(at);

        let err = check_compatibility(&top, &accepted(&["LennardJonesPotential"])).unwrap_err();
        match err {
            Error::EngineIncompatibility { kind, name, .. } => {
                assert_eq!(kind, "atom type");
                assert_eq!(name, "C");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn connection_types_are_checked_after_atom_types() {
        let mut top = Topology::new("t");
        top.add_atom_type(AtomType::with_defaults("C"));
        top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Angle));

        let err = check_compatibility(&top, &accepted(&["LennardJonesPotential"])).unwrap_err();
        assert!(err.to_string().starts_with("angle type"));
    }

    #[test]
    fn independent_variables_must_match() {
        let potential = Potential::new(
            "Spring",
            "0.5 * k * (r-r_eq)**2",
            ["r_eq"],
            parameters([("k", "1 kJ/(mol*nm**2)"), ("r", "0.1 nm")]).unwrap(),
        )
        .unwrap();
        let options = EquivalenceOptions::default();
        assert!(match_template(&potential, &accepted(&["HarmonicBondPotential"]), &options).is_none());
    }

    #[test]
    fn first_accepted_match_wins() {
        let dihedral = ConnectionType::with_defaults(ConnectionKind::Dihedral);
        let options = EquivalenceOptions::default();
        let accepted = accepted(&["PeriodicImproperPotential", "PeriodicTorsionPotential"]);
        let found = match_template(&dihedral.potential, &accepted, &options).unwrap();
        assert_eq!(found.name(), "PeriodicImproperPotential");
    }

    #[test]
    fn dihedrals_and_impropers_get_forms_named_for_their_kind() {
        let mut top = Topology::new("t");
        let dihedral =
            top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Dihedral));
        let improper =
            top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Improper));
        let names = library().available_template_names();
        let accepted = accepted_templates(library(), &names).unwrap();

        let forms = check_compatibility(&top, &accepted).unwrap();
        assert_eq!(forms.connection_type(dihedral), Some("PeriodicTorsionPotential"));
        assert_eq!(forms.connection_type(improper), Some("HarmonicImproperPotential"));
    }

    #[test]
    fn improper_form_is_used_for_a_dihedral_when_nothing_else_matches() {
        let mut top = Topology::new("t");
        let dihedral =
            top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Dihedral));
        let accepted = accepted(&["PeriodicImproperPotential", "HarmonicBondPotential"]);

        let forms = check_compatibility(&top, &accepted).unwrap();
        assert_eq!(forms.connection_type(dihedral), Some("PeriodicImproperPotential"));
    }

    #[test]
    fn empty_topology_is_trivially_compatible() {
        let forms = check_compatibility(&Topology::new("empty"), &[]).unwrap();
        assert!(forms.is_empty());
    }

    #[test]
    fn unknown_accepted_name() {
        assert!(accepted_templates(library(), &["NotATemplate"]).is_err());
    }
}
