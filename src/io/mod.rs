//! Reading and writing topologies as TOML documents.
//!
//! See [`document`] for the layout. The stream functions take any
//! [`BufRead`]/[`Write`]; the file helpers add buffering around them.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub mod document;
pub mod error;

pub use error::Error;

use crate::model::topology::Topology;

pub fn read_topology<R: BufRead>(reader: R) -> Result<Topology, Error> {
    document::reader::read(reader)
}

pub fn write_topology<W: Write>(writer: W, topology: &Topology) -> Result<(), Error> {
    document::writer::write(writer, topology)
}

pub fn read_topology_file(path: impl AsRef<Path>) -> Result<Topology, Error> {
    let file = File::open(path.as_ref())?;
    read_topology(BufReader::new(file))
}

pub fn write_topology_file(path: impl AsRef<Path>, topology: &Topology) -> Result<(), Error> {
    let file = File::create(path.as_ref())?;
    write_topology(BufWriter::new(file), topology)
}
