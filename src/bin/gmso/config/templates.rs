use std::borrow::Cow;
use std::fs;

use anyhow::{Context, Result};

use gmso::{CompatibilityConfig, EquivalenceOptions, PotentialTemplateLibrary};

use crate::cli::{EquivalenceArgs, LibraryOptions};

/// The built-in library, with user templates layered over it when given.
pub fn build_library(opts: &LibraryOptions) -> Result<Cow<'static, PotentialTemplateLibrary>> {
    let Some(path) = &opts.templates else {
        return Ok(Cow::Borrowed(PotentialTemplateLibrary::global()));
    };

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path.display()))?;
    let library = PotentialTemplateLibrary::with_user_templates(&source)
        .with_context(|| format!("Invalid template file: {}", path.display()))?;

    Ok(Cow::Owned(library))
}

pub fn build_compatibility_config(opts: &EquivalenceArgs) -> CompatibilityConfig {
    let defaults = EquivalenceOptions::default();
    CompatibilityConfig {
        equivalence: EquivalenceOptions {
            samples: opts.samples.max(1),
            rel_tolerance: opts.rel_tolerance,
            seed: opts.seed.unwrap_or(defaults.seed),
            ..defaults
        },
    }
}
