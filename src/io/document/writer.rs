use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use super::{
    AtomTypeEntry, ConnectionEntry, ConnectionTypeEntry, QuantityValue, SiteEntry, TopologyDocument,
};
use crate::io::error::Error;
use crate::model::connection::Connection;
use crate::model::connection_type::ConnectionKind;
use crate::model::potential::Potential;
use crate::model::topology::Topology;

pub fn write<W: Write>(mut writer: W, topology: &Topology) -> Result<(), Error> {
    let document = document(topology)?;
    let text = toml::to_string_pretty(&document)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Flattens `topology` into its document form.
pub fn document(topology: &Topology) -> Result<TopologyDocument, Error> {
    let mut seen = HashSet::new();
    for atom_type in topology.atom_types() {
        if !seen.insert(atom_type.name()) {
            return Err(Error::resolve(
                format!("atom type '{}'", atom_type.name()),
                "name is shared by several atom types and cannot be referenced uniquely",
            ));
        }
    }

    let atom_types = topology
        .atom_types()
        .iter()
        .map(|at| {
            let (expression, independent_variables, parameters) = form(&at.potential);
            AtomTypeEntry {
                name: at.name().to_string(),
                expression,
                independent_variables,
                mass: Some(at.mass().into()),
                charge: Some(at.charge().into()),
                atomclass: at.atomclass.clone(),
                doi: at.doi.clone(),
                description: at.description.clone(),
                overrides: at.overrides.clone(),
                definition: at.definition.clone(),
                parameters,
            }
        })
        .collect();

    let connection_types = topology
        .connection_types()
        .iter()
        .map(|ct| {
            let (expression, independent_variables, parameters) = form(&ct.potential);
            ConnectionTypeEntry {
                kind: ct.kind().to_string(),
                name: ct.name().to_string(),
                expression,
                independent_variables,
                member_types: ct.member_types().map(<[String]>::to_vec),
                parameters,
            }
        })
        .collect();

    let sites = topology
        .sites()
        .iter()
        .map(|site| SiteEntry {
            name: site.name.clone(),
            position: site.position,
            atom_type: site
                .atom_type
                .and_then(|id| topology.atom_type(id))
                .map(|at| at.name().to_string()),
            charge: site.charge().map(QuantityValue::from),
            mass: site.mass().map(QuantityValue::from),
        })
        .collect();

    let section = |kind: ConnectionKind| -> Vec<ConnectionEntry> {
        topology
            .connections_of_kind(kind)
            .map(connection_entry)
            .collect()
    };

    Ok(TopologyDocument {
        name: topology.name.clone(),
        atom_types,
        connection_types,
        sites,
        bonds: section(ConnectionKind::Bond),
        angles: section(ConnectionKind::Angle),
        dihedrals: section(ConnectionKind::Dihedral),
        impropers: section(ConnectionKind::Improper),
    })
}

fn form(potential: &Potential) -> (String, Vec<String>, BTreeMap<String, QuantityValue>) {
    (
        potential.expression().source().to_string(),
        potential.independent_variables().iter().cloned().collect(),
        potential
            .parameters()
            .iter()
            .map(|(k, v)| (k.clone(), v.into()))
            .collect(),
    )
}

fn connection_entry(connection: &Connection) -> ConnectionEntry {
    ConnectionEntry {
        members: connection.members().iter().map(|m| m.index()).collect(),
        connection_type: connection.connection_type.map(|id| id.index()),
        name: connection.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::document::reader;
    use crate::model::atom_type::AtomType;
    use crate::model::connection_type::ConnectionType;
    use crate::model::site::Site;
    use crate::model::units::Quantity;
    use std::io::Cursor;

    fn ethane_fragment() -> Topology {
        let mut top = Topology::new("fragment");
        let mut ct = AtomType::with_defaults("CT")
            .with_mass(Quantity::parse("12.011 g/mol").unwrap())
            .unwrap()
            .with_charge(Quantity::parse("-0.18 e").unwrap())
            .unwrap();
        ct.atomclass = "CT".into();
        ct.overrides.insert("C".into());
        ct.definition = "[C;X4]".into();
        let ct = top.add_atom_type(ct);
        let hc = top.add_atom_type(AtomType::with_defaults("HC"));
        let bond = top.add_connection_type(
            ConnectionType::with_defaults(ConnectionKind::Bond)
                .with_member_types(["CT", "HC"])
                .unwrap(),
        );
        let dihedral = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Dihedral));

        let c1 = top.add_site(Site::new("C1", [0.0, 0.0, 0.0]).with_atom_type(ct)).unwrap();
        let c2 = top.add_site(Site::new("C2", [0.153, 0.0, 0.0]).with_atom_type(ct)).unwrap();
        let h1 = top
            .add_site(
                Site::new("H1", [-0.036, 0.102, 0.0])
                    .with_atom_type(hc)
                    .with_charge(Quantity::parse("0.06 e").unwrap())
                    .unwrap(),
            )
            .unwrap();
        let h2 = top
            .add_site(Site::new("H2", [0.189, -0.102, 0.0]).with_atom_type(hc))
            .unwrap();

        top.add_connection(Connection::bond(c1, c2)).unwrap();
        top.add_connection(Connection::bond(c1, h1).with_type(bond)).unwrap();
        top.add_connection(Connection::bond(c2, h2).with_type(bond)).unwrap();
        top.add_connection(Connection::angle(h1, c1, c2)).unwrap();
        top.add_connection(
            Connection::dihedral(h1, c1, c2, h2)
                .with_type(dihedral)
                .with_name("H-C-C-H"),
        )
        .unwrap();
        top
    }

    #[test]
    fn round_trip_through_text() {
        let original = ethane_fragment();
        let mut buffer = Vec::new();
        write(&mut buffer, &original).unwrap();

        let restored = reader::read(Cursor::new(buffer)).unwrap();
        assert_eq!(restored.name, "fragment");
        assert_eq!(restored.n_sites(), 4);
        assert_eq!(restored.n_bonds(), 3);
        assert_eq!(restored.n_angles(), 1);
        assert_eq!(restored.n_dihedrals(), 1);
        assert_eq!(restored.atom_types(), original.atom_types());
        assert_eq!(restored.connection_types(), original.connection_types());
        assert_eq!(restored.sites(), original.sites());
        assert_eq!(restored.connections(), original.connections());
    }

    #[test]
    fn untyped_sections_are_omitted() {
        let mut top = Topology::new("bare");
        top.add_site(Site::new("A", [0.0; 3])).unwrap();
        let mut buffer = Vec::new();
        write(&mut buffer, &top).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("[[sites]]"));
        assert!(!text.contains("bonds"));
        assert!(!text.contains("atom_type ="));
    }

    #[test]
    fn shared_atom_type_names_cannot_be_written() {
        let mut top = Topology::new("t");
        top.add_atom_type(AtomType::with_defaults("C"));
        let mut other = AtomType::with_defaults("C");
        other.atomclass = "CA".into();
        top.add_atom_type(other);
        let err = document(&top).unwrap_err();
        assert!(matches!(err, Error::Resolve { .. }));
    }
}
