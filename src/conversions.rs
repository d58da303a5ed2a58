//! Parameter remapping between equivalent functional forms and unit systems.
//!
//! The OPLS and Ryckaert-Bellemans dihedral forms are related by the closed
//! form expressions of the GROMACS reference manual. The two forms use
//! different angle conventions (OPLS has `phi_cis = 0`, RB `phi_trans = 0`),
//! so `OPLS(phi) == RB(phi - pi)` for converted parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::expr::EquivalenceOptions;
use crate::model::connection_type::{ConnectionKind, ConnectionType};
use crate::model::potential::Potential;
use crate::model::topology::{ConnectionTypeId, Topology};
use crate::model::units::{Quantity, Unit, UnitSystem};
use crate::templates::{PotentialTemplate, PotentialTemplateLibrary};

const OPLS: &str = "OPLSTorsionPotential";
const RYCKAERT_BELLEMANS: &str = "RyckaertBellemansTorsionPotential";

/// Target form for [`convert_topology_dihedrals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DihedralForm {
    Opls,
    RyckaertBellemans,
}

impl DihedralForm {
    pub fn template_name(self) -> &'static str {
        match self {
            DihedralForm::Opls => OPLS,
            DihedralForm::RyckaertBellemans => RYCKAERT_BELLEMANS,
        }
    }
}

impl fmt::Display for DihedralForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DihedralForm::Opls => f.write_str("opls"),
            DihedralForm::RyckaertBellemans => f.write_str("rb"),
        }
    }
}

impl FromStr for DihedralForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opls" => Ok(DihedralForm::Opls),
            "rb" | "ryckaert" | "ryckaert-bellemans" => Ok(DihedralForm::RyckaertBellemans),
            other => Err(Error::Conversion(format!("unknown dihedral form '{other}'"))),
        }
    }
}

/// Converts an OPLS dihedral type into the Ryckaert-Bellemans form.
pub fn convert_opls_to_ryckaert(opls: &ConnectionType) -> Result<ConnectionType, Error> {
    let library = PotentialTemplateLibrary::global();
    require_form(opls, library.get(OPLS)?, "convert_opls_to_ryckaert")?;

    let (unit, [f0, f1, f2, f3, f4]) = energies(opls, ["k0", "k1", "k2", "k3", "k4"])?;
    let coefficients = [
        ("c0", f2 + 0.5 * (f0 + f1 + f3)),
        ("c1", 0.5 * (-f1 + 3.0 * f3)),
        ("c2", -f2 + 4.0 * f4),
        ("c3", -2.0 * f3),
        ("c4", -4.0 * f4),
        ("c5", 0.0),
    ];

    rebuild(opls, library.get(RYCKAERT_BELLEMANS)?, &unit, &coefficients)
}

/// Converts a Ryckaert-Bellemans dihedral type into the OPLS form. Only
/// possible when `c5` is zero.
pub fn convert_ryckaert_to_opls(ryckaert: &ConnectionType) -> Result<ConnectionType, Error> {
    let library = PotentialTemplateLibrary::global();
    require_form(ryckaert, library.get(RYCKAERT_BELLEMANS)?, "convert_ryckaert_to_opls")?;

    let (unit, [c0, c1, c2, c3, c4, c5]) =
        energies(ryckaert, ["c0", "c1", "c2", "c3", "c4", "c5"])?;
    if c5 != 0.0 {
        return Err(Error::Conversion(format!(
            "cannot convert Ryckaert-Bellemans dihedral '{}' to OPLS: c5 is {c5}, not zero",
            ryckaert.name()
        )));
    }
    let coefficients = [
        ("k0", 2.0 * (c0 + c1 + c2 + c3 + c4)),
        ("k1", -2.0 * c1 - 1.5 * c3),
        ("k2", -c2 - c4),
        ("k3", -0.5 * c3),
        ("k4", -0.25 * c4),
    ];

    rebuild(ryckaert, library.get(OPLS)?, &unit, &coefficients)
}

/// Converts every dihedral type of `topology` that has the other form into
/// `target`. Dihedral types of unrelated forms are left alone. Returns the
/// number of converted types.
pub fn convert_topology_dihedrals(topology: &mut Topology, target: DihedralForm) -> Result<usize, Error> {
    let library = PotentialTemplateLibrary::global();
    let (source, convert): (&PotentialTemplate, fn(&ConnectionType) -> Result<ConnectionType, Error>) =
        match target {
            DihedralForm::RyckaertBellemans => (library.get(OPLS)?, convert_opls_to_ryckaert),
            DihedralForm::Opls => (library.get(RYCKAERT_BELLEMANS)?, convert_ryckaert_to_opls),
        };
    let options = EquivalenceOptions::default();

    // Convert everything before touching the topology so a failure leaves it unchanged.
    let converted: Vec<(ConnectionTypeId, ConnectionType)> = topology
        .connection_types()
        .iter()
        .enumerate()
        .filter(|(_, ct)| ct.kind() == ConnectionKind::Dihedral)
        .filter(|(_, ct)| ct.potential.has_same_form(source.as_potential(), &options))
        .map(|(i, ct)| {
            let replacement = convert(ct)?;
            log::debug!("converted dihedral type '{}' to {target}", ct.name());
            Ok((ConnectionTypeId(i), replacement))
        })
        .collect::<Result<_, Error>>()?;

    let count = converted.len();
    for (id, replacement) in converted {
        topology.replace_connection_type(id, replacement)?;
    }

    if count > 0 {
        log::info!(
            "converted {} dihedral type(s) of '{}' to {}",
            count,
            topology.name,
            target.template_name()
        );
    }
    Ok(count)
}

/// Re-expresses every potential parameter and every site-level charge and
/// mass of `topology` in the base units of `system`.
///
/// Atom type masses and charges are stored in g/mol and e and stay so.
pub fn express_in_unit_system(topology: &mut Topology, system: &UnitSystem) -> Result<(), Error> {
    for atom_type in topology.atom_types_mut() {
        atom_type.potential.map_parameters(|_, q| Ok(system.express(q)))?;
    }
    for connection_type in topology.connection_types_mut() {
        connection_type
            .potential
            .map_parameters(|_, q| Ok(system.express(q)))?;
    }
    for site in topology.sites_mut() {
        let charge = site.charge().map(|q| system.express(q));
        site.set_charge(charge)?;
        let mass = site.mass().map(|q| system.express(q));
        site.set_mass(mass)?;
    }
    log::info!("expressed parameters of '{}' in {} units", topology.name, system.name);
    Ok(())
}

fn require_form(
    connection_type: &ConnectionType,
    template: &PotentialTemplate,
    operation: &str,
) -> Result<(), Error> {
    if connection_type
        .potential
        .has_same_form(template.as_potential(), &EquivalenceOptions::default())
    {
        Ok(())
    } else {
        Err(Error::Conversion(format!(
            "cannot use {operation} on '{}': it is not a {}",
            connection_type.name(),
            template.name()
        )))
    }
}

/// Values of the named energy parameters in the unit of the first one.
fn energies<const N: usize>(
    connection_type: &ConnectionType,
    names: [&str; N],
) -> Result<(Unit, [f64; N]), Error> {
    let potential = &connection_type.potential;
    let unit = required_parameter(potential, names[0])?.unit.clone();
    if !unit.dimensions().is_energy_like() {
        return Err(Error::Conversion(format!(
            "parameter '{}' of '{}' is in '{}', which is not an energy unit",
            names[0],
            potential.name(),
            unit
        )));
    }

    let mut values = [0.0; N];
    for (slot, name) in values.iter_mut().zip(names) {
        let q = required_parameter(potential, name)?;
        *slot = q.value_in(&unit).map_err(|_| {
            Error::Conversion(format!(
                "parameter '{name}' of '{}' is in '{}', not compatible with '{unit}'",
                potential.name(),
                q.unit
            ))
        })?;
    }
    Ok((unit, values))
}

fn required_parameter<'a>(potential: &'a Potential, name: &str) -> Result<&'a Quantity, Error> {
    potential.parameter(name).ok_or_else(|| {
        Error::Conversion(format!("'{}' has no parameter '{name}'", potential.name()))
    })
}

fn rebuild(
    original: &ConnectionType,
    template: &PotentialTemplate,
    unit: &Unit,
    coefficients: &[(&str, f64)],
) -> Result<ConnectionType, Error> {
    let parameters: BTreeMap<String, Quantity> = coefficients
        .iter()
        .map(|(name, value)| (name.to_string(), Quantity::new(*value, unit.clone())))
        .collect();
    let potential = Potential::new(
        template.name(),
        template.expression().source(),
        template.independent_variables().iter().cloned(),
        parameters,
    )?;

    let mut converted = ConnectionType::new(original.kind(), potential);
    converted.set_member_types(original.member_types().map(<[String]>::to_vec))?;
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom_type::AtomType;
    use crate::model::potential::parameters;
    use crate::model::site::Site;
    use float_cmp::assert_approx_eq;
    use std::collections::HashMap;
    use std::f64::consts::PI;

    fn opls(k: [&str; 5]) -> ConnectionType {
        let template = PotentialTemplateLibrary::global().get(OPLS).unwrap();
        let potential = Potential::new(
            "opls_dihedral",
            template.expression().source(),
            ["phi"],
            parameters([
                ("k0", k[0]),
                ("k1", k[1]),
                ("k2", k[2]),
                ("k3", k[3]),
                ("k4", k[4]),
            ])
            .unwrap(),
        )
        .unwrap();
        ConnectionType::new(ConnectionKind::Dihedral, potential)
            .with_member_types(["CT", "CT", "CT", "HC"])
            .unwrap()
    }

    fn energy(ct: &ConnectionType, phi: f64) -> f64 {
        ct.potential.evaluate(&HashMap::from([("phi", phi)])).unwrap()
    }

    #[test]
    fn opls_to_ryckaert_coefficients() {
        let rb = convert_opls_to_ryckaert(&opls([
            "0 kJ/mol",
            "1 kJ/mol",
            "2 kJ/mol",
            "3 kJ/mol",
            "4 kJ/mol",
        ]))
        .unwrap();

        assert_eq!(rb.name(), RYCKAERT_BELLEMANS);
        assert_eq!(rb.kind(), ConnectionKind::Dihedral);
        assert_eq!(rb.member_types().unwrap(), ["CT", "CT", "CT", "HC"]);

        let c = |n: &str| rb.potential.parameter(n).unwrap().value;
        assert_eq!(c("c0"), 4.0);
        assert_eq!(c("c1"), 4.0);
        assert_eq!(c("c2"), 14.0);
        assert_eq!(c("c3"), -6.0);
        assert_eq!(c("c4"), -16.0);
        assert_eq!(c("c5"), 0.0);
        assert_eq!(rb.potential.parameter("c5").unwrap().unit.symbol(), "kJ/mol");
    }

    #[test]
    fn converted_forms_agree_under_angle_convention() {
        let original = opls(["1.2 kJ/mol", "-0.4 kJ/mol", "2.5 kJ/mol", "0.7 kJ/mol", "0.3 kJ/mol"]);
        let rb = convert_opls_to_ryckaert(&original).unwrap();
        for phi in [0.0, 0.3, 1.1, 2.0, PI, 4.4] {
            let expected = energy(&original, phi);
            let actual = energy(&rb, phi - PI);
            assert!((expected - actual).abs() < 1e-10, "phi = {phi}");
        }
    }

    #[test]
    fn round_trip_restores_opls_parameters() {
        let original = opls(["1.2 kJ/mol", "-0.4 kJ/mol", "2.5 kJ/mol", "0.7 kJ/mol", "0.3 kJ/mol"]);
        let back = convert_ryckaert_to_opls(&convert_opls_to_ryckaert(&original).unwrap()).unwrap();
        assert_eq!(back.name(), OPLS);
        for (name, q) in original.potential.parameters() {
            let restored = back.potential.parameter(name).unwrap();
            assert!((q.value - restored.value).abs() < 1e-12, "{name}");
        }
    }

    #[test]
    fn mixed_energy_units_are_unified() {
        let rb = convert_opls_to_ryckaert(&opls([
            "0 kJ/mol",
            "1 kcal/mol",
            "0 kJ/mol",
            "0 kJ/mol",
            "0 kJ/mol",
        ]))
        .unwrap();
        let c1 = rb.potential.parameter("c1").unwrap();
        assert!((c1.value + 0.5 * 4.184).abs() < 1e-12);
        assert_eq!(c1.unit.symbol(), "kJ/mol");
    }

    #[test]
    fn non_energy_parameters_are_rejected() {
        let err = convert_opls_to_ryckaert(&opls(["0 nm", "1 nm", "0 nm", "0 nm", "0 nm"])).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn wrong_form_is_rejected() {
        let periodic = ConnectionType::with_defaults(ConnectionKind::Dihedral);
        let err = convert_opls_to_ryckaert(&periodic).unwrap_err();
        assert!(err.to_string().contains("not a OPLSTorsionPotential"));
        assert!(convert_ryckaert_to_opls(&periodic).is_err());
    }

    fn ryckaert(c: [&str; 6]) -> ConnectionType {
        let template = PotentialTemplateLibrary::global().get(RYCKAERT_BELLEMANS).unwrap();
        let potential = Potential::new(
            "rb",
            template.expression().source(),
            ["phi"],
            parameters([
                ("c0", c[0]),
                ("c1", c[1]),
                ("c2", c[2]),
                ("c3", c[3]),
                ("c4", c[4]),
                ("c5", c[5]),
            ])
            .unwrap(),
        )
        .unwrap();
        ConnectionType::new(ConnectionKind::Dihedral, potential)
    }

    #[test]
    fn nonzero_c5_blocks_conversion() {
        let ct = ryckaert(["1 kJ/mol", "1 kJ/mol", "1 kJ/mol", "1 kJ/mol", "1 kJ/mol", "0.1 kJ/mol"]);
        let err = convert_ryckaert_to_opls(&ct).unwrap_err();
        assert!(err.to_string().contains("c5"));
    }

    #[test]
    fn failed_topology_conversion_leaves_every_type_unchanged() {
        let mut top = Topology::new("mixed");
        let convertible = top.add_connection_type(ryckaert([
            "1 kJ/mol", "2 kJ/mol", "3 kJ/mol", "4 kJ/mol", "5 kJ/mol", "0 kJ/mol",
        ]));
        let blocked = top.add_connection_type(ryckaert([
            "1 kJ/mol", "2 kJ/mol", "3 kJ/mol", "4 kJ/mol", "5 kJ/mol", "0.5 kJ/mol",
        ]));
        let before = top.connection_types().to_vec();

        let err = convert_topology_dihedrals(&mut top, DihedralForm::Opls).unwrap_err();
        assert!(err.to_string().contains("c5 is 0.5"));
        assert_eq!(top.connection_types(), before.as_slice());
        assert_eq!(top.connection_type(convertible).unwrap().name(), "rb");
        assert_eq!(top.connection_type(blocked).unwrap().name(), "rb");
    }

    #[test]
    fn topology_dihedrals_are_converted_in_place() {
        let mut top = Topology::new("butane");
        let opls_id = top.add_connection_type(opls([
            "0 kJ/mol",
            "1 kJ/mol",
            "2 kJ/mol",
            "3 kJ/mol",
            "4 kJ/mol",
        ]));
        let periodic_id = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Dihedral));
        let bond_id = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));

        let converted = convert_topology_dihedrals(&mut top, DihedralForm::RyckaertBellemans).unwrap();
        assert_eq!(converted, 1);
        assert_eq!(top.connection_type(opls_id).unwrap().name(), RYCKAERT_BELLEMANS);
        assert_eq!(top.connection_type(periodic_id).unwrap().name(), "DihedralType");
        assert_eq!(top.connection_type(bond_id).unwrap().name(), "BondType");

        let back = convert_topology_dihedrals(&mut top, DihedralForm::Opls).unwrap();
        assert_eq!(back, 1);
        assert_eq!(top.connection_type(opls_id).unwrap().name(), OPLS);
    }

    #[test]
    fn unit_system_rewrites_parameters() {
        let mut top = Topology::new("t");
        top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Angle));
        express_in_unit_system(&mut top, &UnitSystem::gromacs()).unwrap();

        let theta_eq = top.connection_types()[0].potential.parameter("theta_eq").unwrap();
        assert!((theta_eq.value - PI).abs() < 1e-12);
        assert_eq!(theta_eq.unit.symbol(), "rad");
    }

    #[test]
    fn unit_system_rewrites_site_overrides() {
        let mut top = Topology::new("hydrogen");
        let site = Site::new("H1", [0.0; 3])
            .with_charge(Quantity::parse("1.602176634e-19 C").unwrap())
            .unwrap()
            .with_mass(Quantity::parse("0.001008 kg/mol").unwrap())
            .unwrap();
        let id = top.add_site(site).unwrap();
        top.add_site(Site::new("H2", [0.074, 0.0, 0.0])).unwrap();

        express_in_unit_system(&mut top, &UnitSystem::lammps_real()).unwrap();

        let charge = top.site_charge(id).unwrap();
        assert_eq!(charge.unit.symbol(), "e");
        assert_approx_eq!(f64, charge.value, 1.0, epsilon = 1e-12);
        let mass = top.site_mass(id).unwrap();
        assert_eq!(mass.unit.symbol(), "g*mol**-1");
        assert_approx_eq!(f64, mass.value, 1.008, epsilon = 1e-12);
        assert!(top.sites()[1].charge().is_none());
    }

    #[test]
    fn whole_topology_in_lammps_unit_systems() {
        let mut top = Topology::new("ethane");
        let ct = top.add_atom_type(AtomType::with_defaults("CT"));
        top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Angle));
        top.add_site(Site::new("C1", [0.0; 3]).with_atom_type(ct)).unwrap();
        let original = top.clone();

        let mut real = top.clone();
        express_in_unit_system(&mut real, &UnitSystem::lammps_real()).unwrap();
        let sigma = real.atom_types()[0].potential.parameter("sigma").unwrap();
        assert_eq!(sigma.unit.symbol(), "angstrom");
        assert_approx_eq!(f64, sigma.value, 3.0, epsilon = 1e-12);
        let epsilon = real.atom_types()[0].potential.parameter("epsilon").unwrap();
        assert_approx_eq!(f64, epsilon.value, 0.3 / 4.184, epsilon = 1e-12);
        let k = real.connection_types()[0].potential.parameter("k").unwrap();
        assert_eq!(k.unit, Unit::parse("kcal/(mol*angstrom**2)").unwrap());
        assert_approx_eq!(f64, k.value, 1000.0 / 4.184 / 100.0, epsilon = 1e-9);
        let theta_eq = real.connection_types()[1].potential.parameter("theta_eq").unwrap();
        assert_eq!(theta_eq.unit.symbol(), "degree");
        assert_approx_eq!(f64, theta_eq.value, 180.0, epsilon = 1e-9);

        let mut metal = top;
        express_in_unit_system(&mut metal, &UnitSystem::lammps_metal()).unwrap();
        for (converted, before) in metal.connection_types().iter().zip(original.connection_types()) {
            for (name, q) in converted.potential.parameters() {
                let expected = before.potential.parameter(name).unwrap();
                assert!(q.approx_eq(expected, 1e-9, 0.0), "{name}: {q} vs {expected}");
            }
        }
        let k = metal.connection_types()[0].potential.parameter("k").unwrap();
        assert!(k.unit.symbol().starts_with("eV"));
    }

    #[test]
    fn dihedral_form_parsing() {
        assert_eq!("RB".parse::<DihedralForm>().unwrap(), DihedralForm::RyckaertBellemans);
        assert_eq!("opls".parse::<DihedralForm>().unwrap(), DihedralForm::Opls);
        assert!("fourier".parse::<DihedralForm>().is_err());
    }
}
