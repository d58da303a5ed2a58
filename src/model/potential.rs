//! Functional forms with named, unit-carrying parameters.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Error;
use crate::expr::{EquivalenceOptions, Expression};

use super::units::Quantity;

/// A potential energy function: an expression, the variables it is a
/// function of, and values for every other symbol in it.
///
/// Invariants checked on construction and mutation:
///
/// - every independent variable occurs in the expression;
/// - unless the potential is a bare template, the parameter names are
///   exactly the expression symbols minus the independent variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Potential {
    name: String,
    expression: Expression,
    independent_variables: BTreeSet<String>,
    parameters: BTreeMap<String, Quantity>,
    template: bool,
}

impl Potential {
    pub fn new<I, S>(
        name: &str,
        expression: &str,
        independent_variables: I,
        parameters: BTreeMap<String, Quantity>,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let potential = Self {
            name: name.to_string(),
            expression: parse_expression(expression)?,
            independent_variables: independent_variables.into_iter().map(Into::into).collect(),
            parameters,
            template: false,
        };
        potential.validate()?;
        Ok(potential)
    }

    /// A parameterless functional form; only the independent variables are
    /// checked against the expression.
    pub fn template<I, S>(name: &str, expression: &str, independent_variables: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let potential = Self {
            name: name.to_string(),
            expression: parse_expression(expression)?,
            independent_variables: independent_variables.into_iter().map(Into::into).collect(),
            parameters: BTreeMap::new(),
            template: true,
        };
        potential.validate()?;
        Ok(potential)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn independent_variables(&self) -> &BTreeSet<String> {
        &self.independent_variables
    }

    pub fn parameters(&self) -> &BTreeMap<String, Quantity> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Quantity> {
        self.parameters.get(name)
    }

    pub fn is_template(&self) -> bool {
        self.template
    }

    /// Symbols of the expression that must carry a parameter value.
    pub fn parameter_symbols(&self) -> BTreeSet<&str> {
        self.expression
            .symbols()
            .iter()
            .filter(|s| !self.independent_variables.contains(*s))
            .map(String::as_str)
            .collect()
    }

    /// Replaces the expression, keeping variables and parameters. Fails (and
    /// leaves `self` untouched) if they no longer fit the new expression.
    pub fn set_expression(&mut self, expression: &str) -> Result<(), Error> {
        let mut updated = self.clone();
        updated.expression = parse_expression(expression)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Replaces expression, independent variables and parameters together.
    pub fn set_form<I, S>(
        &mut self,
        expression: &str,
        independent_variables: I,
        parameters: BTreeMap<String, Quantity>,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let updated = Self {
            name: self.name.clone(),
            expression: parse_expression(expression)?,
            independent_variables: independent_variables.into_iter().map(Into::into).collect(),
            parameters,
            template: false,
        };
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Updates parameter values. Every name must already be a parameter.
    pub fn set_parameters(&mut self, updates: BTreeMap<String, Quantity>) -> Result<(), Error> {
        if let Some(unknown) = updates.keys().find(|k| !self.parameters.contains_key(*k)) {
            return Err(Error::invalid_potential(
                &self.name,
                format!("'{unknown}' is not a parameter of this potential"),
            ));
        }
        self.parameters.extend(updates);
        Ok(())
    }

    /// Applies `f` to every parameter value.
    pub fn map_parameters<F>(&mut self, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&str, &Quantity) -> Result<Quantity, Error>,
    {
        let mut mapped = BTreeMap::new();
        for (name, value) in &self.parameters {
            mapped.insert(name.clone(), f(name, value)?);
        }
        self.parameters = mapped;
        Ok(())
    }

    /// Whether `self` and `other` have the same independent variables and
    /// mathematically equal expressions.
    pub fn has_same_form(&self, other: &Potential, options: &EquivalenceOptions) -> bool {
        self.independent_variables == other.independent_variables
            && self.expression.is_equivalent(&other.expression, options)
    }

    /// Evaluates the potential at the given independent-variable values,
    /// with parameters in their stored units.
    pub fn evaluate(&self, variables: &HashMap<&str, f64>) -> Result<f64, Error> {
        let mut bindings: HashMap<&str, f64> = self
            .parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.value))
            .collect();
        bindings.extend(variables.iter().map(|(k, v)| (*k, *v)));
        self.expression
            .evaluate(&bindings)
            .map_err(|e| Error::invalid_potential(&self.name, e.to_string()))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.independent_variables.is_empty() {
            return Err(Error::invalid_potential(
                &self.name,
                "at least one independent variable is required",
            ));
        }

        let missing_vars: Vec<&str> = self
            .independent_variables
            .iter()
            .filter(|v| !self.expression.contains_symbol(v))
            .map(String::as_str)
            .collect();
        if !missing_vars.is_empty() {
            return Err(Error::invalid_potential(
                &self.name,
                format!(
                    "independent variables {} do not occur in '{}'",
                    missing_vars.join(", "),
                    self.expression
                ),
            ));
        }

        if self.template {
            return Ok(());
        }

        let needed = self.parameter_symbols();
        let missing: Vec<&str> = needed
            .iter()
            .filter(|s| !self.parameters.contains_key(**s))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid_potential(
                &self.name,
                format!("missing necessary parameters: {}", missing.join(", ")),
            ));
        }

        let extra: Vec<&str> = self
            .parameters
            .keys()
            .map(String::as_str)
            .filter(|k| !needed.contains(k))
            .collect();
        if !extra.is_empty() {
            return Err(Error::invalid_potential(
                &self.name,
                format!("parameters not used by the expression: {}", extra.join(", ")),
            ));
        }

        Ok(())
    }
}

fn parse_expression(expression: &str) -> Result<Expression, Error> {
    Expression::parse(expression).map_err(|e| Error::expression(expression, e))
}

/// Builds a parameter map from `(name, quantity string)` pairs.
pub fn parameters<'a, I>(pairs: I) -> Result<BTreeMap<String, Quantity>, Error>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(name, q)| -> Result<(String, Quantity), Error> {
            Ok((name.to_string(), Quantity::parse(q)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LJ: &str = "4*epsilon*((sigma/r)**12 - (sigma/r)**6)";

    fn lj() -> Potential {
        Potential::new(
            "LennardJones",
            LJ,
            ["r"],
            parameters([("sigma", "0.3 nm"), ("epsilon", "0.3 kJ/mol")]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn builds_valid_potential() {
        let p = lj();
        assert_eq!(p.name(), "LennardJones");
        assert_eq!(p.parameter_symbols(), BTreeSet::from(["epsilon", "sigma"]));
        assert!(!p.is_template());
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let err = Potential::new(
            "LJ",
            LJ,
            ["r"],
            parameters([("sigma", "0.3 nm")]).unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing necessary parameters: epsilon"));
    }

    #[test]
    fn extra_parameter_is_rejected() {
        let err = Potential::new(
            "LJ",
            LJ,
            ["r"],
            parameters([("sigma", "0.3 nm"), ("epsilon", "1 kJ/mol"), ("k", "1 kJ/mol")]).unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not used by the expression: k"));
    }

    #[test]
    fn independent_variable_must_occur() {
        let err = Potential::template("Bad", "k*x**2", ["r"]).unwrap_err();
        assert!(matches!(err, Error::InvalidPotential { .. }));
    }

    #[test]
    fn template_skips_parameter_check() {
        let t = Potential::template("LennardJonesPotential", LJ, ["r"]).unwrap();
        assert!(t.is_template());
        assert!(t.parameters().is_empty());
    }

    #[test]
    fn set_expression_keeps_symbols_consistent() {
        let mut p = lj();
        p.set_expression("sigma + epsilon*r").unwrap();
        assert_eq!(p.expression().source(), "sigma + epsilon*r");

        let before = p.clone();
        assert!(p.set_expression("k*r").is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn set_parameters_rejects_unknown_names() {
        let mut p = lj();
        p.set_parameters(parameters([("sigma", "0.35 nm")]).unwrap())
            .unwrap();
        assert_eq!(p.parameter("sigma").unwrap().value, 0.35);

        let err = p
            .set_parameters(parameters([("k", "1 kJ/mol")]).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("'k' is not a parameter"));
    }

    #[test]
    fn same_form_requires_matching_variables() {
        let options = EquivalenceOptions::default();
        let a = Potential::template("A", "0.5*k*(r - r_eq)**2", ["r"]).unwrap();
        let b = Potential::template("B", "k*(r - r_eq)**2/2", ["r"]).unwrap();
        let c = Potential::template("C", "0.5*k*(r - r_eq)**2", ["r", "k"]).unwrap();
        assert!(a.has_same_form(&b, &options));
        assert!(!a.has_same_form(&c, &options));
    }

    #[test]
    fn evaluates_at_minimum() {
        let p = lj();
        let r_min = 2f64.powf(1.0 / 6.0) * 0.3;
        let value = p.evaluate(&HashMap::from([("r", r_min)])).unwrap();
        assert!((value + 0.3).abs() < 1e-12);
    }
}
