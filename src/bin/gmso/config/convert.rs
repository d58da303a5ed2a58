use gmso::{DihedralForm, UnitSystem};

use crate::cli::{DihedralTarget, UnitSystemChoice};

pub fn dihedral_form(target: DihedralTarget) -> DihedralForm {
    match target {
        DihedralTarget::Rb => DihedralForm::RyckaertBellemans,
        DihedralTarget::Opls => DihedralForm::Opls,
    }
}

pub fn unit_system(choice: UnitSystemChoice) -> UnitSystem {
    match choice {
        UnitSystemChoice::Gromacs => UnitSystem::gromacs(),
        UnitSystemChoice::LammpsReal => UnitSystem::lammps_real(),
        UnitSystemChoice::LammpsMetal => UnitSystem::lammps_metal(),
    }
}
