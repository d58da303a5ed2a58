//! Library of canonical potential functional forms.
//!
//! The built-in templates are embedded as TOML and parsed once on first use.
//! Further libraries can be parsed from TOML of the same shape and layered
//! over the built-in one with [`PotentialTemplateLibrary::extend`]:
//!
//! ```toml
//! [LennardJonesPotential]
//! name = "LennardJonesPotential"
//! expression = "4*epsilon*((sigma/r)**12 - (sigma/r)**6)"
//! independent_variables = ["r"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::Error;
use crate::expr::Expression;
use crate::model::potential::Potential;

const BUILTIN_TEMPLATES_TOML: &str = include_str!("../../resources/potential_templates.toml");

static BUILTIN_TEMPLATES: OnceLock<PotentialTemplateLibrary> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    name: String,
    expression: String,
    independent_variables: Variables,
    #[serde(default)]
    description: String,
}

/// Either `["r"]` or the comma separated `"r"` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Variables {
    List(Vec<String>),
    Joined(String),
}

impl Variables {
    fn into_vec(self) -> Vec<String> {
        match self {
            Variables::List(v) => v,
            Variables::Joined(s) => s
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }
}

/// An immutable, parameterless functional form.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialTemplate {
    potential: Potential,
    description: String,
}

impl PotentialTemplate {
    pub fn new<I, S>(name: &str, expression: &str, independent_variables: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            potential: Potential::template(name, expression, independent_variables)?,
            description: String::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.potential.name()
    }

    pub fn expression(&self) -> &Expression {
        self.potential.expression()
    }

    pub fn independent_variables(&self) -> &BTreeSet<String> {
        self.potential.independent_variables()
    }

    /// Symbols a potential of this form must provide values for.
    pub fn parameter_symbols(&self) -> BTreeSet<&str> {
        self.potential.parameter_symbols()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn as_potential(&self) -> &Potential {
        &self.potential
    }
}

/// Named collection of [`PotentialTemplate`]s.
#[derive(Debug, Clone, Default)]
pub struct PotentialTemplateLibrary {
    templates: BTreeMap<String, PotentialTemplate>,
}

impl PotentialTemplateLibrary {
    /// The built-in templates.
    pub fn global() -> &'static PotentialTemplateLibrary {
        BUILTIN_TEMPLATES.get_or_init(|| {
            let library = Self::from_toml(BUILTIN_TEMPLATES_TOML)
                .expect("Failed to parse embedded potential templates. This is a library bug.");
            log::debug!("loaded {} built-in potential templates", library.len());
            library
        })
    }

    /// Parses a template table. Every entry's `name` must equal its key.
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        let entries: BTreeMap<String, TemplateEntry> = toml::from_str(source)?;
        let mut templates = BTreeMap::new();
        for (key, entry) in entries {
            if key != entry.name {
                return Err(Error::TemplateNameMismatch {
                    key,
                    name: entry.name,
                });
            }
            let mut template = PotentialTemplate::new(
                &entry.name,
                &entry.expression,
                entry.independent_variables.into_vec(),
            )?;
            template.description = entry.description;
            templates.insert(key, template);
        }
        Ok(Self { templates })
    }

    /// The built-in templates with those of `source` layered on top.
    pub fn with_user_templates(source: &str) -> Result<Self, Error> {
        let mut library = Self::global().clone();
        library.extend(Self::from_toml(source)?);
        Ok(library)
    }

    /// Adds the templates of `other`, replacing any of the same name.
    pub fn extend(&mut self, other: PotentialTemplateLibrary) {
        for (name, template) in other.templates {
            if self.templates.contains_key(&name) {
                log::debug!("user template '{name}' replaces an existing template");
            }
            self.templates.insert(name, template);
        }
    }

    pub fn insert(&mut self, template: PotentialTemplate) {
        self.templates.insert(template.name().to_string(), template);
    }

    pub fn get(&self, name: &str) -> Result<&PotentialTemplate, Error> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn available_template_names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PotentialTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_templates_parse() {
        let library = PotentialTemplateLibrary::global();
        assert_eq!(library.len(), 12);
        for name in [
            "LennardJonesPotential",
            "BuckinghamPotential",
            "MiePotential",
            "HarmonicBondPotential",
            "HarmonicAnglePotential",
            "HarmonicTorsionPotential",
            "PeriodicTorsionPotential",
            "OPLSTorsionPotential",
            "RyckaertBellemansTorsionPotential",
            "FourierTorsionPotential",
            "HarmonicImproperPotential",
            "PeriodicImproperPotential",
        ] {
            assert!(library.contains(name), "missing {name}");
        }
    }

    #[test]
    fn template_contents() {
        let lj = PotentialTemplateLibrary::global()
            .get("LennardJonesPotential")
            .unwrap();
        assert_eq!(
            lj.expression().source(),
            "4*epsilon*((sigma/r)**12 - (sigma/r)**6)"
        );
        assert_eq!(lj.independent_variables(), &BTreeSet::from(["r".to_string()]));
        assert_eq!(lj.parameter_symbols(), BTreeSet::from(["epsilon", "sigma"]));

        let rb = PotentialTemplateLibrary::global()
            .get("RyckaertBellemansTorsionPotential")
            .unwrap();
        assert_eq!(
            rb.parameter_symbols(),
            BTreeSet::from(["c0", "c1", "c2", "c3", "c4", "c5"])
        );
    }

    #[test]
    fn unknown_template() {
        let err = PotentialTemplateLibrary::global()
            .get("MorsePotential")
            .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(name) if name == "MorsePotential"));
    }

    #[test]
    fn key_must_match_name() {
        let source = r#"
            [Morse]
            name = "MorsePotential"
            expression = "d*(1 - exp(-a*(r - r_eq)))**2"
            independent_variables = ["r"]
        "#;
        let err = PotentialTemplateLibrary::from_toml(source).unwrap_err();
        assert!(matches!(err, Error::TemplateNameMismatch { .. }));
    }

    #[test]
    fn required_keys() {
        let source = r#"
            [MorsePotential]
            name = "MorsePotential"
            independent_variables = ["r"]
        "#;
        let err = PotentialTemplateLibrary::from_toml(source).unwrap_err();
        assert!(matches!(err, Error::TemplateParse(_)));
    }

    #[test]
    fn user_templates_extend_builtins() {
        let source = r#"
            [MorsePotential]
            name = "MorsePotential"
            expression = "d*(1 - exp(-a*(r - r_eq)))**2"
            independent_variables = "r"
        "#;
        let library = PotentialTemplateLibrary::with_user_templates(source).unwrap();
        assert_eq!(library.len(), 13);
        let morse = library.get("MorsePotential").unwrap();
        assert!(morse.independent_variables().contains("r"));
        assert!(!PotentialTemplateLibrary::global().contains("MorsePotential"));
    }

    #[test]
    fn template_variables_must_occur() {
        let source = r#"
            [Broken]
            name = "Broken"
            expression = "k*x**2"
            independent_variables = ["r"]
        "#;
        assert!(PotentialTemplateLibrary::from_toml(source).is_err());
    }
}
