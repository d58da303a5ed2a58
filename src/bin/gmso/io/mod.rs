use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use gmso::Topology;

/// Extension of topology documents.
pub const DOCUMENT_EXTENSION: &str = "toml";

/// Whether progress and tables should be drawn on stderr.
pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

/// Where a topology document is read from or written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    File(PathBuf),
    Stdin,
    Stdout,
}

impl Endpoint {
    pub fn input(path: Option<&Path>) -> Self {
        path.map_or(Self::Stdin, |p| Self::File(p.to_path_buf()))
    }

    pub fn output(path: Option<&Path>) -> Self {
        path.map_or(Self::Stdout, |p| Self::File(p.to_path_buf()))
    }

    /// A file without the document extension is still used, with a warning.
    fn has_document_extension(&self) -> bool {
        match self {
            Self::File(p) => p
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION)),
            Self::Stdin | Self::Stdout => true,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) => write!(f, "{}", p.display()),
            Self::Stdin => f.write_str("<stdin>"),
            Self::Stdout => f.write_str("<stdout>"),
        }
    }
}

pub fn read_topology(from: &Endpoint) -> Result<Topology> {
    if !from.has_document_extension() {
        log::warn!("{from} does not end in .{DOCUMENT_EXTENSION}; reading it as a topology document");
    }

    let topology = match from {
        Endpoint::File(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open topology document {from}"))?;
            gmso::io::read_topology(BufReader::new(file))
        }
        Endpoint::Stdin => {
            if io::stdin().is_terminal() {
                bail!(
                    "No input file specified and stdin is a terminal.\n\nUsage: gmso <COMMAND> -i <FILE> or pipe a topology document via stdin."
                );
            }
            gmso::io::read_topology(io::stdin().lock())
        }
        Endpoint::Stdout => bail!("Cannot read a topology from {from}"),
    }
    .with_context(|| format!("Failed to read topology from {from}"))?;

    log::info!(
        "Read topology '{}' from {}: {} sites, {} connections",
        topology.name,
        from,
        topology.n_sites(),
        topology.connections().len()
    );
    Ok(topology)
}

pub fn write_topology(to: &Endpoint, topology: &Topology) -> Result<()> {
    if !to.has_document_extension() {
        log::warn!("{to} does not end in .{DOCUMENT_EXTENSION}; writing a topology document anyway");
    }

    let write = |writer: &mut dyn Write| -> Result<()> {
        gmso::io::write_topology(&mut *writer, topology)?;
        writer.flush()?;
        Ok(())
    };

    match to {
        Endpoint::File(path) => File::create(path)
            .map_err(anyhow::Error::from)
            .and_then(|file| write(&mut BufWriter::new(file))),
        Endpoint::Stdout => write(&mut BufWriter::new(io::stdout().lock())),
        Endpoint::Stdin => bail!("Cannot write a topology to {to}"),
    }
    .with_context(|| format!("Failed to write topology to {to}"))?;

    log::info!("Wrote topology '{}' to {}", topology.name, to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmso::{AtomType, Site};

    fn sample() -> Topology {
        let mut top = Topology::new("argon");
        let ar = top.add_atom_type(AtomType::with_defaults("Ar"));
        top.add_site(Site::new("Ar1", [0.0; 3]).with_atom_type(ar)).unwrap();
        top
    }

    #[test]
    fn endpoints_are_labelled_for_messages() {
        assert_eq!(Endpoint::input(None).to_string(), "<stdin>");
        assert_eq!(Endpoint::output(None).to_string(), "<stdout>");
        let file = Endpoint::input(Some(Path::new("water.toml")));
        assert_eq!(file.to_string(), "water.toml");
    }

    #[test]
    fn document_extension_is_case_insensitive() {
        assert!(Endpoint::input(Some(Path::new("a/b.TOML"))).has_document_extension());
        assert!(!Endpoint::input(Some(Path::new("b.pdb"))).has_document_extension());
        assert!(!Endpoint::input(Some(Path::new("noext"))).has_document_extension());
        assert!(Endpoint::Stdin.has_document_extension());
    }

    #[test]
    fn file_round_trip_keeps_the_topology() {
        let dir = tempfile::tempdir().unwrap();
        let target = Endpoint::File(dir.path().join("argon.toml"));

        write_topology(&target, &sample()).unwrap();
        let back = read_topology(&target).unwrap();

        assert_eq!(back.name, "argon");
        assert_eq!(back.n_sites(), 1);
        assert_eq!(back.atom_types().len(), 1);
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Endpoint::File(dir.path().join("missing.toml"));
        let err = read_topology(&missing).unwrap_err();
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        assert!(chain[0].contains("missing.toml"));
        assert!(err.chain().any(|e| e.downcast_ref::<io::Error>().is_some()));
    }

    #[test]
    fn wrong_direction_is_rejected() {
        assert!(read_topology(&Endpoint::Stdout).is_err());
        assert!(write_topology(&Endpoint::Stdin, &sample()).is_err());
    }
}
