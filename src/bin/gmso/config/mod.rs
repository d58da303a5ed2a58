mod convert;
mod templates;

pub use convert::{dihedral_form, unit_system};
pub use templates::{build_compatibility_config, build_library};
