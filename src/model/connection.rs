use super::connection_type::ConnectionKind;
use super::topology::{ConnectionTypeId, SiteId};

/// A bonded interaction between sites of a topology.
///
/// For impropers the first member is the central site and the remaining
/// three are bonded to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    kind: ConnectionKind,
    members: Vec<SiteId>,
    pub connection_type: Option<ConnectionTypeId>,
    pub name: String,
}

impl Connection {
    /// Arity and distinctness are checked by [`Topology::add_connection`].
    ///
    /// [`Topology::add_connection`]: super::topology::Topology::add_connection
    pub fn new(kind: ConnectionKind, members: Vec<SiteId>) -> Self {
        Self {
            kind,
            members,
            connection_type: None,
            name: String::new(),
        }
    }

    pub fn bond(a: SiteId, b: SiteId) -> Self {
        Self::new(ConnectionKind::Bond, vec![a, b])
    }

    pub fn angle(a: SiteId, b: SiteId, c: SiteId) -> Self {
        Self::new(ConnectionKind::Angle, vec![a, b, c])
    }

    pub fn dihedral(a: SiteId, b: SiteId, c: SiteId, d: SiteId) -> Self {
        Self::new(ConnectionKind::Dihedral, vec![a, b, c, d])
    }

    pub fn improper(center: SiteId, a: SiteId, b: SiteId, c: SiteId) -> Self {
        Self::new(ConnectionKind::Improper, vec![center, a, b, c])
    }

    pub fn with_type(mut self, connection_type: ConnectionTypeId) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn members(&self) -> &[SiteId] {
        &self.members
    }

    pub fn involves(&self, site: SiteId) -> bool {
        self.members.contains(&site)
    }

    /// Member orderings that describe the same interaction.
    pub fn equivalent_members(&self) -> Vec<Vec<SiteId>> {
        match self.kind {
            ConnectionKind::Improper => {
                let [center, a, b, c] = self.members[..] else {
                    return vec![self.members.clone()];
                };
                [[a, b, c], [a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]]
                    .into_iter()
                    .map(|p| vec![center, p[0], p[1], p[2]])
                    .collect()
            }
            _ => {
                let reversed: Vec<SiteId> = self.members.iter().rev().copied().collect();
                if reversed == self.members {
                    vec![self.members.clone()]
                } else {
                    vec![self.members.clone(), reversed]
                }
            }
        }
    }

    pub fn is_equivalent(&self, other: &Connection) -> bool {
        self.kind == other.kind
            && self
                .equivalent_members()
                .iter()
                .any(|m| m.as_slice() == other.members.as_slice())
    }
}
