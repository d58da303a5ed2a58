use std::io::{self, Write};

use anyhow::Result;

use crate::cli::TemplatesArgs;
use crate::config::build_library;
use crate::display::{print_template, print_templates};

pub fn run_templates(args: TemplatesArgs) -> Result<()> {
    let library = build_library(&args.library)?;
    let mut out = io::stdout().lock();

    match &args.name {
        Some(name) => print_template(&mut out, library.get(name)?),
        None => print_templates(&mut out, &library),
    }

    out.flush()?;
    Ok(())
}
