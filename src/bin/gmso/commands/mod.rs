mod check;
mod convert;
mod info;
mod templates;

use check::run_check;
use convert::run_convert;
use info::run_info;
use templates::run_templates;

use anyhow::Result;

use gmso::Topology;

use crate::cli::{Command, InputOptions};
use crate::display::Context;
use crate::io::Endpoint;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Templates(args) => run_templates(args),
        Command::Info(args) => run_info(args),
        Command::Check(args) => run_check(args, ctx),
        Command::Convert(args) => run_convert(args, ctx),
    }
}

fn read_topology(io: &InputOptions) -> Result<Topology> {
    crate::io::read_topology(&Endpoint::input(io.input.as_deref()))
}
