use std::io;

use anyhow::{Context as _, Result};

use gmso::{convert_topology_dihedrals, express_in_unit_system};

use crate::cli::ConvertArgs;
use crate::config::{dihedral_form, unit_system};
use crate::display::{Context, Progress, print_structure_info};
use crate::io::{Endpoint, write_topology};

const TOTAL_STEPS: u8 = 3;

pub fn run_convert(args: ConvertArgs, ctx: Context) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.begin("Reading topology");
    let mut topology = super::read_topology(&args.io)?;
    progress.done(&[format!(
        "{} sites, {} dihedrals",
        topology.n_sites(),
        topology.n_dihedrals()
    )]);

    if ctx.interactive {
        print_structure_info(&mut io::stderr().lock(), &topology);
    }

    progress.begin("Converting potentials");
    let mut substeps = Vec::new();

    if let Some(target) = args.to {
        let form = dihedral_form(target);
        let converted = convert_topology_dihedrals(&mut topology, form)
            .with_context(|| format!("Failed to convert dihedrals to {form}"))?;
        substeps.push(format!("{converted} dihedral types rewritten as {form}"));
    }

    if let Some(choice) = args.units {
        let system = unit_system(choice);
        express_in_unit_system(&mut topology, &system)
            .with_context(|| format!("Failed to express parameters in '{}' units", system.name))?;
        substeps.push(format!("Parameters expressed in '{}' units", system.name));
    }

    if substeps.is_empty() {
        log::warn!("Neither --to nor --units given; the topology is written unchanged");
        substeps.push("No conversion requested".to_string());
    }
    progress.done(&substeps);

    progress.begin("Writing topology");
    let destination = Endpoint::output(args.output.as_deref());
    write_topology(&destination, &topology)?;
    progress.done(&[format!("TOML → {destination}")]);

    progress.finish("Conversion complete");

    Ok(())
}
