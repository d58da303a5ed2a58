//! A typed molecular topology model with potential template matching and
//! functional-form conversion.
//!
//! Sites, bonds, angles, dihedrals and impropers refer to shared atom and
//! connection types, each carrying a [`Potential`]: a symbolic expression,
//! its independent variables and unit-carrying parameters.
//!
//! # Features
//!
//! - **Expressions**: Parsing, evaluation and equivalence testing of
//!   potential expressions such as `4*epsilon*((sigma/r)**12 - (sigma/r)**6)`
//! - **Units**: Every parameter is a [`Quantity`]; conversion between
//!   compatible units and re-expression in engine unit systems
//! - **Templates**: A library of canonical functional forms
//!   ([`PotentialTemplateLibrary`]) that can be extended from TOML
//! - **Compatibility**: Mapping every potential of a topology to an
//!   accepted template, or reporting the first one that has none
//! - **Conversions**: OPLS and Ryckaert-Bellemans dihedral remapping
//! - **I/O**: Reading and writing topologies as TOML documents
//!
//! # Quick Start
//!
//! ```
//! use gmso::{AtomType, Connection, ConnectionKind, ConnectionType, Quantity, Site, Topology};
//! use gmso::{PotentialTemplateLibrary, accepted_templates, check_compatibility};
//!
//! let mut top = Topology::new("dimer");
//! let ar = top.add_atom_type(
//!     AtomType::with_defaults("Ar").with_mass(Quantity::parse("39.948 g/mol")?)?,
//! );
//! let bond = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
//!
//! let a = top.add_site(Site::new("Ar1", [0.0, 0.0, 0.0]).with_atom_type(ar))?;
//! let b = top.add_site(Site::new("Ar2", [0.38, 0.0, 0.0]).with_atom_type(ar))?;
//! top.add_connection(Connection::bond(a, b).with_type(bond))?;
//!
//! // Adding the reversed bond is a no-op.
//! top.add_connection(Connection::bond(b, a))?;
//! assert_eq!(top.n_bonds(), 1);
//!
//! let library = PotentialTemplateLibrary::global();
//! let accepted = accepted_templates(library, &["LennardJonesPotential", "HarmonicBondPotential"])?;
//! let forms = check_compatibility(&top, &accepted)?;
//! assert_eq!(forms.atom_type(ar), Some("LennardJonesPotential"));
//! assert_eq!(forms.connection_type(bond), Some("HarmonicBondPotential"));
//! # Ok::<(), gmso::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`]: TOML topology documents
//! - [`check_compatibility`] / [`match_template`]: Template matching
//! - [`convert_opls_to_ryckaert`] / [`convert_ryckaert_to_opls`]: Dihedral
//!   form conversion, [`convert_topology_dihedrals`] for whole topologies
//! - [`express_in_unit_system`]: Unit system re-expression

mod compatibility;
mod conversions;
mod error;
mod expr;
mod model;
mod templates;

pub mod io;

pub use error::Error;

pub use expr::{EquivalenceOptions, EvalError, Expression, Function, ParseError};

pub use model::units::{
    AMU, AVOGADRO, BOLTZMANN, Dimensions, ELEMENTARY_CHARGE, ParseUnitError, Quantity, Unit,
    UnitError, UnitSystem,
};

pub use model::atom_type::{AtomType, DEFAULT_ATOM_EXPRESSION};
pub use model::connection::Connection;
pub use model::connection_type::{ConnectionKind, ConnectionType};
pub use model::potential::{Potential, parameters};
pub use model::site::Site;
pub use model::topology::{AtomTypeId, ConnectionId, ConnectionTypeId, SiteId, Topology};

pub use templates::{PotentialTemplate, PotentialTemplateLibrary};

pub use compatibility::{
    CompatibilityConfig, PotentialForms, PotentialKey, accepted_templates, check_compatibility,
    check_compatibility_with, match_template,
};

pub use conversions::{
    DihedralForm, convert_opls_to_ryckaert, convert_ryckaert_to_opls, convert_topology_dihedrals,
    express_in_unit_system,
};

pub use io::Error as IoError;
