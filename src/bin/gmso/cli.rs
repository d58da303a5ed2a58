use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "gmso",
    about = "Typed molecular topologies: potential template matching and form conversion",
    version,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output and banners (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the potential templates or show one of them
    #[command(visible_alias = "t")]
    Templates(TemplatesArgs),

    /// Summarize a topology document
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Check the potentials of a topology against accepted templates
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Convert dihedral forms and unit systems of a topology
    Convert(ConvertArgs),
}

/// Input options shared by commands that read a topology.
#[derive(Args)]
pub struct InputOptions {
    /// Topology document (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

/// Template library options.
#[derive(Args)]
#[command(next_help_heading = "Template Library")]
pub struct LibraryOptions {
    /// Additional templates (TOML) layered over the built-in library
    #[arg(long = "templates", value_name = "FILE")]
    pub templates: Option<PathBuf>,
}

/// Expression equivalence tuning.
#[derive(Args)]
#[command(next_help_heading = "Equivalence Options")]
pub struct EquivalenceArgs {
    /// Number of random sample points per comparison
    #[arg(long = "eq-samples", value_name = "N", default_value = "24")]
    pub samples: usize,

    /// Relative tolerance for sample agreement
    #[arg(long = "eq-rtol", value_name = "TOL", default_value = "1e-9")]
    pub rel_tolerance: f64,

    /// Seed for the sample generator
    #[arg(long = "eq-seed", value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct TemplatesArgs {
    /// Template to show in detail
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    #[command(flatten)]
    pub library: LibraryOptions,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub io: InputOptions,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub io: InputOptions,

    /// Accepted template names, comma separated (all templates if omitted)
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub accept: Vec<String>,

    #[command(flatten)]
    pub library: LibraryOptions,

    #[command(flatten)]
    pub equivalence: EquivalenceArgs,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub io: InputOptions,

    /// Output document (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Target dihedral form
    #[arg(long, value_name = "FORM")]
    pub to: Option<DihedralTarget>,

    /// Re-express all parameters in this unit system
    #[arg(long, value_name = "SYSTEM")]
    pub units: Option<UnitSystemChoice>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DihedralTarget {
    /// Ryckaert-Bellemans power series
    #[value(alias = "ryckaert")]
    Rb,
    /// OPLS Fourier series
    Opls,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitSystemChoice {
    /// kJ/mol, nm, amu, ps, e, K, rad
    Gromacs,
    /// LAMMPS "real": kcal/mol, Å, g/mol, fs, e, K, degree
    #[value(name = "real", alias = "lammps-real")]
    LammpsReal,
    /// LAMMPS "metal": eV, Å, g/mol, ps, e, K, degree
    #[value(name = "metal", alias = "lammps-metal")]
    LammpsMetal,
}

pub fn parse() -> Cli {
    Cli::parse()
}
