//! Core data structures of a typed molecular topology.
//!
//! - [`units`] – Dimensions, units and quantities carried on every parameter.
//! - [`potential`] – Functional forms with named, unit-carrying parameters.
//! - [`atom_type`] – Non-bonded potentials plus mass, charge and provenance.
//! - [`connection_type`] – Bond, angle, dihedral and improper potentials.
//! - [`site`] / [`connection`] – The particles and bonded interactions.
//! - [`topology`] – The container tying sites and connections to their types.
//!
//! Types are stored once per [`Topology`](topology::Topology) and referred to
//! by index, so a site or connection never owns a potential.

pub mod atom_type;
pub mod connection;
pub mod connection_type;
pub mod potential;
pub mod site;
pub mod topology;
pub mod units;
