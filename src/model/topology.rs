use std::collections::HashSet;

use crate::error::Error;

use super::atom_type::{AtomType, charge_unit};
use super::connection::Connection;
use super::connection_type::{ConnectionKind, ConnectionType};
use super::site::Site;
use super::units::Quantity;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

index_type!(
    /// Index of a site within its topology.
    SiteId
);
index_type!(AtomTypeId);
index_type!(ConnectionTypeId);
index_type!(ConnectionId);

/// Sites, bonded connections and the potential types they refer to.
///
/// Atom types and connection types are stored once and shared by index;
/// adding a type equal to one already present returns the existing index.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub name: String,
    sites: Vec<Site>,
    atom_types: Vec<AtomType>,
    connection_types: Vec<ConnectionType>,
    connections: Vec<Connection>,
}

impl Topology {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_atom_type(&mut self, atom_type: AtomType) -> AtomTypeId {
        if let Some(idx) = self.atom_types.iter().position(|t| *t == atom_type) {
            return AtomTypeId(idx);
        }
        self.atom_types.push(atom_type);
        AtomTypeId(self.atom_types.len() - 1)
    }

    pub fn add_connection_type(&mut self, connection_type: ConnectionType) -> ConnectionTypeId {
        if let Some(idx) = self
            .connection_types
            .iter()
            .position(|t| *t == connection_type)
        {
            return ConnectionTypeId(idx);
        }
        self.connection_types.push(connection_type);
        ConnectionTypeId(self.connection_types.len() - 1)
    }

    pub fn add_site(&mut self, site: Site) -> Result<SiteId, Error> {
        if let Some(at) = site.atom_type
            && at.0 >= self.atom_types.len()
        {
            return Err(Error::invalid_site(
                &site.name,
                format!("atom type index {} is not part of the topology", at.0),
            ));
        }
        self.sites.push(site);
        Ok(SiteId(self.sites.len() - 1))
    }

    /// Adds a connection, or returns the id of an equivalent connection that
    /// is already present.
    pub fn add_connection(&mut self, connection: Connection) -> Result<ConnectionId, Error> {
        let kind = connection.kind();
        let members = connection.members();

        if members.len() != kind.arity() {
            return Err(Error::invalid_connection(format!(
                "{kind} needs {} sites, got {}",
                kind.arity(),
                members.len()
            )));
        }
        if let Some(missing) = members.iter().find(|m| m.0 >= self.sites.len()) {
            return Err(Error::invalid_connection(format!(
                "{kind} refers to site {} which is not part of the topology",
                missing.0
            )));
        }
        let distinct: HashSet<SiteId> = members.iter().copied().collect();
        if distinct.len() != members.len() {
            return Err(Error::invalid_connection(format!(
                "{kind} repeats a site: {:?}",
                members.iter().map(|m| m.0).collect::<Vec<_>>()
            )));
        }
        if let Some(ct) = connection.connection_type {
            let Some(connection_type) = self.connection_types.get(ct.0) else {
                return Err(Error::invalid_connection(format!(
                    "connection type index {} is not part of the topology",
                    ct.0
                )));
            };
            if connection_type.kind() != kind {
                return Err(Error::invalid_connection(format!(
                    "{kind} cannot use {} type '{}'",
                    connection_type.kind(),
                    connection_type.name()
                )));
            }
        }

        if let Some(idx) = self
            .connections
            .iter()
            .position(|c| c.is_equivalent(&connection))
        {
            log::debug!("{kind} {:?} already present, skipping", members);
            return Ok(ConnectionId(idx));
        }

        self.connections.push(connection);
        Ok(ConnectionId(self.connections.len() - 1))
    }

    /// Replaces the connection type at `id`. The replacement must be of the
    /// same kind.
    pub fn replace_connection_type(
        &mut self,
        id: ConnectionTypeId,
        connection_type: ConnectionType,
    ) -> Result<(), Error> {
        let Some(slot) = self.connection_types.get_mut(id.0) else {
            return Err(Error::invalid_connection(format!(
                "connection type index {} is not part of the topology",
                id.0
            )));
        };
        if slot.kind() != connection_type.kind() {
            return Err(Error::invalid_connection(format!(
                "cannot replace {} type '{}' with {} type '{}'",
                slot.kind(),
                slot.name(),
                connection_type.kind(),
                connection_type.name()
            )));
        }
        *slot = connection_type;
        Ok(())
    }

    pub fn site(&self, id: SiteId) -> Option<&Site> {
        self.sites.get(id.0)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn sites_mut(&mut self) -> impl Iterator<Item = &mut Site> {
        self.sites.iter_mut()
    }

    pub fn atom_type(&self, id: AtomTypeId) -> Option<&AtomType> {
        self.atom_types.get(id.0)
    }

    pub fn atom_types(&self) -> &[AtomType] {
        &self.atom_types
    }

    pub fn atom_types_mut(&mut self) -> impl Iterator<Item = &mut AtomType> {
        self.atom_types.iter_mut()
    }

    pub fn atom_type_by_name(&self, name: &str) -> Option<AtomTypeId> {
        self.atom_types
            .iter()
            .position(|t| t.name() == name)
            .map(AtomTypeId)
    }

    pub fn connection_type(&self, id: ConnectionTypeId) -> Option<&ConnectionType> {
        self.connection_types.get(id.0)
    }

    pub fn connection_types(&self) -> &[ConnectionType] {
        &self.connection_types
    }

    pub fn connection_types_mut(&mut self) -> impl Iterator<Item = &mut ConnectionType> {
        self.connection_types.iter_mut()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.0)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connections_of_kind(&self, kind: ConnectionKind) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.kind() == kind)
    }

    /// Connections that include `site`.
    pub fn site_connections(&self, site: SiteId) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.involves(site))
            .map(|(i, c)| (ConnectionId(i), c))
    }

    pub fn n_connections(&self, site: SiteId) -> usize {
        self.site_connections(site).count()
    }

    #[inline]
    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn n_bonds(&self) -> usize {
        self.connections_of_kind(ConnectionKind::Bond).count()
    }

    pub fn n_angles(&self) -> usize {
        self.connections_of_kind(ConnectionKind::Angle).count()
    }

    pub fn n_dihedrals(&self) -> usize {
        self.connections_of_kind(ConnectionKind::Dihedral).count()
    }

    pub fn n_impropers(&self) -> usize {
        self.connections_of_kind(ConnectionKind::Improper).count()
    }

    #[inline]
    pub fn is_typed(&self) -> bool {
        self.sites.iter().all(Site::is_typed)
    }

    /// The site's own charge if set, otherwise that of its atom type.
    pub fn site_charge(&self, id: SiteId) -> Option<&Quantity> {
        let site = self.site(id)?;
        site.charge().or_else(|| {
            site.atom_type
                .and_then(|at| self.atom_type(at))
                .map(AtomType::charge)
        })
    }

    /// The site's own mass if set, otherwise that of its atom type.
    pub fn site_mass(&self, id: SiteId) -> Option<&Quantity> {
        let site = self.site(id)?;
        site.mass().or_else(|| {
            site.atom_type
                .and_then(|at| self.atom_type(at))
                .map(AtomType::mass)
        })
    }

    /// Sum of the site charges in elementary charges. Sites without a charge
    /// contribute nothing.
    pub fn net_charge(&self) -> Result<f64, Error> {
        let e = charge_unit();
        let mut total = 0.0;
        for i in 0..self.sites.len() {
            if let Some(q) = self.site_charge(SiteId(i)) {
                total += q.value_in(&e)?;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> (Topology, [SiteId; 3]) {
        let mut top = Topology::new("water");
        let ow = top.add_atom_type(
            AtomType::with_defaults("OW")
                .with_charge(Quantity::parse("-0.834 e").unwrap())
                .unwrap()
                .with_mass(Quantity::parse("15.999 g/mol").unwrap())
                .unwrap(),
        );
        let hw = top.add_atom_type(
            AtomType::with_defaults("HW")
                .with_charge(Quantity::parse("0.417 e").unwrap())
                .unwrap(),
        );
        let o = top.add_site(Site::new("O", [0.0; 3]).with_atom_type(ow)).unwrap();
        let h1 = top
            .add_site(Site::new("H1", [0.0957, 0.0, 0.0]).with_atom_type(hw))
            .unwrap();
        let h2 = top
            .add_site(Site::new("H2", [-0.024, 0.0927, 0.0]).with_atom_type(hw))
            .unwrap();
        (top, [o, h1, h2])
    }

    #[test]
    fn equal_atom_types_are_stored_once() {
        let mut top = Topology::new("t");
        let a = top.add_atom_type(AtomType::with_defaults("C"));
        let b = top.add_atom_type(AtomType::with_defaults("C"));
        let c = top.add_atom_type(AtomType::with_defaults("H"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(top.atom_types().len(), 2);
    }

    #[test]
    fn equal_connection_types_are_stored_once() {
        let mut top = Topology::new("t");
        let a = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        let b = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        let c = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Angle));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn reversed_bond_is_not_added_twice() {
        let (mut top, [o, h1, _]) = water();
        let first = top.add_connection(Connection::bond(o, h1)).unwrap();
        let second = top.add_connection(Connection::bond(h1, o)).unwrap();
        assert_eq!(first, second);
        assert_eq!(top.n_bonds(), 1);
    }

    #[test]
    fn connection_validation() {
        let (mut top, [o, h1, h2]) = water();
        assert!(top.add_connection(Connection::bond(o, o)).is_err());
        assert!(top.add_connection(Connection::bond(o, SiteId(9))).is_err());
        assert!(
            top.add_connection(Connection::new(ConnectionKind::Angle, vec![o, h1]))
                .is_err()
        );

        let bond_type = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        let err = top
            .add_connection(Connection::angle(h1, o, h2).with_type(bond_type))
            .unwrap_err();
        assert!(err.to_string().contains("cannot use bond type"));
    }

    #[test]
    fn counts_and_site_connections() {
        let (mut top, [o, h1, h2]) = water();
        top.add_connection(Connection::bond(o, h1)).unwrap();
        top.add_connection(Connection::bond(o, h2)).unwrap();
        top.add_connection(Connection::angle(h1, o, h2)).unwrap();
        assert_eq!(top.n_sites(), 3);
        assert_eq!(top.n_bonds(), 2);
        assert_eq!(top.n_angles(), 1);
        assert_eq!(top.n_dihedrals(), 0);
        assert_eq!(top.n_connections(o), 3);
        assert_eq!(top.n_connections(h1), 2);
    }

    #[test]
    fn site_overrides_take_precedence() {
        let (mut top, [o, h1, _]) = water();
        assert_eq!(top.site_charge(o).unwrap().value, -0.834);
        assert_eq!(top.site_mass(o).unwrap().value, 15.999);

        let id = top
            .add_site(
                Site::new("H3", [0.0; 3])
                    .with_atom_type(AtomTypeId(1))
                    .with_charge(Quantity::parse("0.5 e").unwrap())
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(top.site_charge(id).unwrap().value, 0.5);
        assert_eq!(top.site_charge(h1).unwrap().value, 0.417);
    }

    #[test]
    fn water_is_neutral() {
        let (top, _) = water();
        assert!(top.net_charge().unwrap().abs() < 1e-12);
    }

    #[test]
    fn site_with_unknown_atom_type_is_rejected() {
        let mut top = Topology::new("t");
        let err = top
            .add_site(Site::new("X", [0.0; 3]).with_atom_type(AtomTypeId(0)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSite { .. }));
    }

    #[test]
    fn replace_connection_type_requires_same_kind() {
        let mut top = Topology::new("t");
        let id = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Dihedral));
        assert!(
            top.replace_connection_type(id, ConnectionType::with_defaults(ConnectionKind::Bond))
                .is_err()
        );
        let mut replacement = ConnectionType::with_defaults(ConnectionKind::Dihedral);
        replacement.potential.set_name("Renamed");
        top.replace_connection_type(id, replacement).unwrap();
        assert_eq!(top.connection_type(id).unwrap().name(), "Renamed");
    }
}
