use std::io::{self, Write};

use anyhow::Result;

use crate::cli::InfoArgs;
use crate::display::{print_connection_types, print_structure_info, print_type_distribution};

pub fn run_info(args: InfoArgs) -> Result<()> {
    let topology = super::read_topology(&args.io)?;

    let mut out = io::stdout().lock();
    print_structure_info(&mut out, &topology);
    print_type_distribution(&mut out, &topology);
    print_connection_types(&mut out, &topology);
    out.flush()?;

    Ok(())
}
