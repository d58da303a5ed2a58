use std::io::{self, Write};

use anyhow::{Context as _, Result};

use gmso::{accepted_templates, check_compatibility_with};

use crate::cli::CheckArgs;
use crate::config::{build_compatibility_config, build_library};
use crate::display::{Context, Progress, print_compatibility};

const TOTAL_STEPS: u8 = 2;

pub fn run_check(args: CheckArgs, ctx: Context) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.begin("Reading topology");
    let topology = super::read_topology(&args.io)?;
    progress.done(&[format!(
        "{} atom types, {} connection types",
        topology.atom_types().len(),
        topology.connection_types().len()
    )]);

    progress.begin("Matching potential templates");
    let library = build_library(&args.library)?;
    let names: Vec<&str> = if args.accept.is_empty() {
        library.available_template_names()
    } else {
        args.accept.iter().map(String::as_str).collect()
    };
    let accepted = accepted_templates(&library, &names)?;
    let config = build_compatibility_config(&args.equivalence);
    let forms = check_compatibility_with(&topology, &accepted, &config)
        .context("Topology is not compatible with the accepted templates")?;
    progress.done(&[format!(
        "{} potentials against {} templates",
        forms.len(),
        accepted.len()
    )]);

    progress.finish("Compatible");

    let mut out = io::stdout().lock();
    print_compatibility(&mut out, &topology, &forms);
    out.flush()?;

    Ok(())
}
