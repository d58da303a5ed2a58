use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Read};

use super::{
    AtomTypeEntry, ConnectionEntry, ConnectionTypeEntry, QuantityValue, SiteEntry, TopologyDocument,
};
use crate::io::error::Error;
use crate::model::atom_type::AtomType;
use crate::model::connection::Connection;
use crate::model::connection_type::{ConnectionKind, ConnectionType};
use crate::model::potential::Potential;
use crate::model::site::Site;
use crate::model::topology::{AtomTypeId, ConnectionTypeId, SiteId, Topology};
use crate::model::units::Quantity;

pub fn read<R: BufRead>(mut reader: R) -> Result<Topology, Error> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    let document: TopologyDocument = toml::from_str(&source)?;
    build(document)
}

/// Resolves the references of `document` into a [`Topology`].
pub fn build(document: TopologyDocument) -> Result<Topology, Error> {
    let mut topology = Topology::new(document.name);

    let mut atom_type_ids: HashMap<String, AtomTypeId> = HashMap::new();
    for entry in document.atom_types {
        let item = format!("atom type '{}'", entry.name);
        if atom_type_ids.contains_key(&entry.name) {
            return Err(Error::resolve(item, "name is defined more than once"));
        }
        let name = entry.name.clone();
        let atom_type = atom_type(entry).map_err(|e| Error::model(&item, e))?;
        atom_type_ids.insert(name, topology.add_atom_type(atom_type));
    }

    let mut connection_type_ids: Vec<ConnectionTypeId> = Vec::new();
    for (i, entry) in document.connection_types.into_iter().enumerate() {
        let item = format!("connection type {i} ('{}')", entry.name);
        let connection_type = connection_type(entry).map_err(|e| Error::model(&item, e))?;
        connection_type_ids.push(topology.add_connection_type(connection_type));
    }

    for (i, entry) in document.sites.into_iter().enumerate() {
        let item = format!("site {i} ('{}')", entry.name);
        let site = site(entry, &atom_type_ids, &item)?;
        topology.add_site(site).map_err(|e| Error::model(&item, e))?;
    }

    let sections = [
        (ConnectionKind::Bond, document.bonds),
        (ConnectionKind::Angle, document.angles),
        (ConnectionKind::Dihedral, document.dihedrals),
        (ConnectionKind::Improper, document.impropers),
    ];
    for (kind, entries) in sections {
        for (i, entry) in entries.into_iter().enumerate() {
            let item = format!("{kind} {i}");
            let connection = connection(kind, entry, &connection_type_ids, &item)?;
            topology
                .add_connection(connection)
                .map_err(|e| Error::model(&item, e))?;
        }
    }

    log::debug!(
        "read topology '{}': {} sites, {} atom types, {} connection types",
        topology.name,
        topology.n_sites(),
        topology.atom_types().len(),
        topology.connection_types().len()
    );
    Ok(topology)
}

fn atom_type(entry: AtomTypeEntry) -> Result<AtomType, crate::Error> {
    let potential = potential(
        &entry.name,
        &entry.expression,
        entry.independent_variables,
        &entry.parameters,
    )?;
    let mut atom_type = AtomType::new(&entry.name, potential);
    if let Some(mass) = &entry.mass {
        atom_type.set_mass(assumed_quantity(mass, "g/mol", &entry.name, "mass")?)?;
    }
    if let Some(charge) = &entry.charge {
        atom_type.set_charge(assumed_quantity(charge, "e", &entry.name, "charge")?)?;
    }
    atom_type.atomclass = entry.atomclass;
    atom_type.doi = entry.doi;
    atom_type.description = entry.description;
    atom_type.overrides = entry.overrides;
    atom_type.definition = entry.definition;
    Ok(atom_type)
}

fn connection_type(entry: ConnectionTypeEntry) -> Result<ConnectionType, crate::Error> {
    let kind: ConnectionKind = entry.kind.parse()?;
    let potential = potential(
        &entry.name,
        &entry.expression,
        entry.independent_variables,
        &entry.parameters,
    )?;
    let mut connection_type = ConnectionType::new(kind, potential);
    connection_type.set_member_types(entry.member_types)?;
    Ok(connection_type)
}

fn potential(
    name: &str,
    expression: &str,
    independent_variables: Vec<String>,
    parameters: &BTreeMap<String, QuantityValue>,
) -> Result<Potential, crate::Error> {
    let parameters = parameters
        .iter()
        .map(|(k, v)| -> Result<(String, Quantity), crate::Error> {
            Ok((k.clone(), v.to_quantity()?))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Potential::new(name, expression, independent_variables, parameters)
}

fn site(entry: SiteEntry, atom_types: &HashMap<String, AtomTypeId>, item: &str) -> Result<Site, Error> {
    let mut site = Site::new(entry.name, entry.position);
    if let Some(name) = entry.atom_type {
        let Some(&id) = atom_types.get(&name) else {
            return Err(Error::resolve(item, format!("unknown atom type '{name}'")));
        };
        site.atom_type = Some(id);
    }
    if let Some(charge) = &entry.charge {
        let charge = assumed_quantity(charge, "e", &site.name, "charge")
            .map_err(|e| Error::model(item, e))?;
        site.set_charge(Some(charge)).map_err(|e| Error::model(item, e))?;
    }
    if let Some(mass) = &entry.mass {
        let mass = assumed_quantity(mass, "g/mol", &site.name, "mass")
            .map_err(|e| Error::model(item, e))?;
        site.set_mass(Some(mass)).map_err(|e| Error::model(item, e))?;
    }
    Ok(site)
}

fn connection(
    kind: ConnectionKind,
    entry: ConnectionEntry,
    connection_types: &[ConnectionTypeId],
    item: &str,
) -> Result<Connection, Error> {
    let members = entry.members.into_iter().map(SiteId).collect();
    let mut connection = Connection::new(kind, members).with_name(entry.name);
    if let Some(index) = entry.connection_type {
        let Some(&id) = connection_types.get(index) else {
            return Err(Error::resolve(
                item,
                format!("connection type index {index} is out of range"),
            ));
        };
        connection = connection.with_type(id);
    }
    Ok(connection)
}

/// A bare number is taken to be in `unit`, with a warning.
fn assumed_quantity(
    value: &QuantityValue,
    unit: &str,
    owner: &str,
    what: &str,
) -> Result<Quantity, crate::Error> {
    match value {
        QuantityValue::Number(v) => {
            log::warn!("{what} of '{owner}' has no unit, assuming {unit}");
            Ok(Quantity::with_unit(*v, unit)?)
        }
        QuantityValue::Text(_) => Ok(value.to_quantity()?),
    }
}
