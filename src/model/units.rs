//! Physical units and dimensioned quantities.
//!
//! A [`Unit`] is a scale factor relative to SI (with `rad` for angles and
//! `mol` for amount) together with its [`Dimensions`]. Units are parsed from
//! the compact strings used in force field files: `kJ/mol`,
//! `kcal/(mol*angstrom**2)`, `g/mol`, `nm`, `degree`, `e`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Boltzmann constant in J/K.
pub const BOLTZMANN: f64 = 1.380_649e-23;
/// Avogadro constant in 1/mol.
pub const AVOGADRO: f64 = 6.022_140_76e23;
/// Elementary charge in C.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Atomic mass unit in kg.
pub const AMU: f64 = 1.660_539_066_60e-27;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUnitError {
    #[error("unknown unit symbol '{0}'")]
    UnknownSymbol(String),

    #[error("malformed unit expression '{0}'")]
    Malformed(String),

    #[error("malformed quantity '{0}': expected '<value> <unit>'")]
    MalformedQuantity(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("cannot convert '{from}' to '{to}': incompatible dimensions")]
    Incompatible { from: String, to: String },
}

/// Exponents of the base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub amount: i8,
    pub charge: i8,
    pub temperature: i8,
    pub angle: i8,
}

impl Dimensions {
    pub const NONE: Dimensions = Dimensions {
        mass: 0,
        length: 0,
        time: 0,
        amount: 0,
        charge: 0,
        temperature: 0,
        angle: 0,
    };

    pub const ENERGY: Dimensions = Dimensions {
        mass: 1,
        length: 2,
        time: -2,
        ..Dimensions::NONE
    };

    pub fn is_dimensionless(&self) -> bool {
        *self == Dimensions::NONE
    }

    /// Energy per amount (`kJ/mol`) or plain energy (`kJ`).
    pub fn is_energy_like(&self) -> bool {
        let per_amount = Dimensions {
            amount: -1,
            ..Dimensions::ENERGY
        };
        *self == Dimensions::ENERGY || *self == per_amount
    }

    /// `self + sign * other`, or `None` when an exponent leaves the `i8` range.
    fn combine(self, other: Dimensions, sign: i8) -> Option<Dimensions> {
        let term = |a: i8, b: i8| b.checked_mul(sign).and_then(|b| a.checked_add(b));
        Some(Dimensions {
            mass: term(self.mass, other.mass)?,
            length: term(self.length, other.length)?,
            time: term(self.time, other.time)?,
            amount: term(self.amount, other.amount)?,
            charge: term(self.charge, other.charge)?,
            temperature: term(self.temperature, other.temperature)?,
            angle: term(self.angle, other.angle)?,
        })
    }

    fn powi(self, n: i8) -> Option<Dimensions> {
        Dimensions::NONE.combine(self, n)
    }
}

/// A physical unit.
#[derive(Debug, Clone)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dims: Dimensions,
}

impl Unit {
    pub fn parse(s: &str) -> Result<Self, ParseUnitError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "1" || trimmed == "dimensionless" {
            return Ok(Self::dimensionless());
        }
        let (scale, dims) = UnitParser::new(trimmed).parse()?;
        Ok(Self {
            symbol: trimmed.to_string(),
            scale,
            dims,
        })
    }

    pub fn dimensionless() -> Self {
        Self {
            symbol: "dimensionless".to_string(),
            scale: 1.0,
            dims: Dimensions::NONE,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_dimensionless()
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Factor that converts a value in `self` into a value in `target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::Incompatible {
                from: self.symbol.clone(),
                to: target.symbol.clone(),
            });
        }
        Ok(self.scale / target.scale)
    }

    fn mul(&self, other: &Unit) -> Option<Unit> {
        Some(Unit {
            symbol: format!("{}*{}", self.symbol, other.symbol),
            scale: self.scale * other.scale,
            dims: self.dims.combine(other.dims, 1)?,
        })
    }

    fn powi(&self, n: i8) -> Option<Unit> {
        Some(Unit {
            symbol: power_symbol(&self.symbol, n),
            scale: self.scale.powi(n as i32),
            dims: self.dims.powi(n)?,
        })
    }
}

fn power_symbol(symbol: &str, n: i8) -> String {
    if n == 1 {
        symbol.to_string()
    } else {
        format!("{symbol}**{n}")
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && approx_eq(self.scale, other.scale)
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn base_unit(symbol: &str) -> Option<(f64, Dimensions)> {
    let d = Dimensions::NONE;
    let length = Dimensions { length: 1, ..d };
    let mass = Dimensions { mass: 1, ..d };
    let time = Dimensions { time: 1, ..d };
    let energy = Dimensions::ENERGY;

    Some(match symbol {
        "m" | "meter" => (1.0, length),
        "cm" => (1e-2, length),
        "nm" | "nanometer" => (1e-9, length),
        "angstrom" | "Angstrom" | "Å" => (1e-10, length),
        "pm" => (1e-12, length),
        "bohr" => (5.291_772_109_03e-11, length),

        "kg" => (1.0, mass),
        "g" | "gram" => (1e-3, mass),
        "amu" | "Da" | "u" => (AMU, mass),

        "s" => (1.0, time),
        "ns" => (1e-9, time),
        "ps" => (1e-12, time),
        "fs" => (1e-15, time),

        "mol" => (1.0, Dimensions { amount: 1, ..d }),

        "J" => (1.0, energy),
        "kJ" => (1e3, energy),
        "cal" => (4.184, energy),
        "kcal" => (4184.0, energy),
        "eV" => (ELEMENTARY_CHARGE, energy),
        "kb" | "kB" => (BOLTZMANN, Dimensions {
            temperature: -1,
            ..energy
        }),

        "C" => (1.0, Dimensions { charge: 1, ..d }),
        "e" | "elementary_charge" | "qe" => (ELEMENTARY_CHARGE, Dimensions { charge: 1, ..d }),

        "K" | "kelvin" => (1.0, Dimensions { temperature: 1, ..d }),

        "rad" | "radian" | "radians" => (1.0, Dimensions { angle: 1, ..d }),
        "deg" | "degree" | "degrees" => (std::f64::consts::PI / 180.0, Dimensions {
            angle: 1,
            ..d
        }),

        _ => return None,
    })
}

/// Parses `factor (('*' | '/') factor)*` where
/// `factor := atom ('**' int)?` and `atom := SYMBOL | '(' expr ')'`.
struct UnitParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> UnitParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn malformed(&self) -> ParseUnitError {
        ParseUnitError::Malformed(self.source.to_string())
    }

    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<(f64, Dimensions), ParseUnitError> {
        let unit = self.parse_product()?;
        self.skip_ws();
        if self.pos != self.chars.len() {
            return Err(self.malformed());
        }
        Ok((unit.scale, unit.dims))
    }

    fn parse_product(&mut self) -> Result<Unit, ParseUnitError> {
        let mut acc = self.parse_factor()?;
        loop {
            self.skip_ws();
            match self.chars.get(self.pos) {
                Some('*') if self.chars.get(self.pos + 1) != Some(&'*') => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    acc = acc.mul(&rhs).ok_or_else(|| self.malformed())?;
                }
                Some('/') => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    acc = rhs
                        .powi(-1)
                        .and_then(|inv| acc.mul(&inv))
                        .ok_or_else(|| self.malformed())?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn parse_factor(&mut self) -> Result<Unit, ParseUnitError> {
        let atom = self.parse_atom()?;
        self.skip_ws();
        let exponent = if self.chars.get(self.pos) == Some(&'*')
            && self.chars.get(self.pos + 1) == Some(&'*')
        {
            self.pos += 2;
            self.parse_exponent()?
        } else if self.chars.get(self.pos) == Some(&'^') {
            self.pos += 1;
            self.parse_exponent()?
        } else {
            1
        };
        atom.powi(exponent).ok_or_else(|| self.malformed())
    }

    fn parse_exponent(&mut self) -> Result<i8, ParseUnitError> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.chars.get(self.pos), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i8>().map_err(|_| self.malformed())
    }

    fn parse_atom(&mut self) -> Result<Unit, ParseUnitError> {
        self.skip_ws();
        match self.chars.get(self.pos) {
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_product()?;
                self.skip_ws();
                if self.chars.get(self.pos) != Some(&')') {
                    return Err(self.malformed());
                }
                self.pos += 1;
                Ok(Unit {
                    symbol: format!("({})", inner.symbol),
                    ..inner
                })
            }
            Some('1') => {
                self.pos += 1;
                Ok(Unit::dimensionless())
            }
            Some(c) if c.is_alphabetic() || *c == '_' => {
                let start = self.pos;
                while self
                    .chars
                    .get(self.pos)
                    .is_some_and(|c| c.is_alphanumeric() || *c == '_')
                {
                    self.pos += 1;
                }
                let symbol: String = self.chars[start..self.pos].iter().collect();
                let (scale, dims) = base_unit(&symbol)
                    .ok_or_else(|| ParseUnitError::UnknownSymbol(symbol.clone()))?;
                Ok(Unit {
                    symbol,
                    scale,
                    dims,
                })
            }
            _ => Err(self.malformed()),
        }
    }
}

/// A value with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Builds a quantity from a value and a unit string.
    pub fn with_unit(value: f64, unit: &str) -> Result<Self, ParseUnitError> {
        Ok(Self::new(value, Unit::parse(unit)?))
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    /// Parses `"<value> <unit>"`, e.g. `"0.3 nm"` or `"-0.834 e"`. A bare
    /// number is dimensionless.
    pub fn parse(s: &str) -> Result<Self, ParseUnitError> {
        let trimmed = s.trim();
        let split = trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let value = number
            .parse::<f64>()
            .map_err(|_| ParseUnitError::MalformedQuantity(s.to_string()))?;
        Ok(Self::new(value, Unit::parse(unit)?))
    }

    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.unit.is_compatible(&other.unit)
    }

    pub fn to(&self, target: &Unit) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(self.value_in(target)?, target.clone()))
    }

    pub fn value_in(&self, target: &Unit) -> Result<f64, UnitError> {
        Ok(self.value * self.unit.conversion_factor(target)?)
    }

    /// Value converted to SI (radians for angles).
    pub fn si_value(&self) -> f64 {
        self.value * self.unit.scale
    }

    /// Approximate equality after conversion to a common unit.
    pub fn approx_eq(&self, other: &Quantity, rtol: f64, atol: f64) -> bool {
        match other.value_in(&self.unit) {
            Ok(v) => (self.value - v).abs() <= atol + rtol * v.abs(),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

impl FromStr for Quantity {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A set of base units that parameters can be re-expressed in.
///
/// Composite dimensions are built from the energy unit first (so that
/// `kJ/(mol*nm**2)` becomes `kcal/(mol*angstrom**2)` under
/// [`UnitSystem::lammps_real`]) and the remaining exponents from the
/// individual base units.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSystem {
    pub name: String,
    pub energy: Unit,
    pub length: Unit,
    pub mass: Unit,
    pub time: Unit,
    pub amount: Unit,
    pub charge: Unit,
    pub temperature: Unit,
    pub angle: Unit,
}

impl UnitSystem {
    fn from_symbols(name: &str, symbols: [&str; 8]) -> Result<Self, ParseUnitError> {
        let [energy, length, mass, time, amount, charge, temperature, angle] = symbols;
        Ok(Self {
            name: name.to_string(),
            energy: Unit::parse(energy)?,
            length: Unit::parse(length)?,
            mass: Unit::parse(mass)?,
            time: Unit::parse(time)?,
            amount: Unit::parse(amount)?,
            charge: Unit::parse(charge)?,
            temperature: Unit::parse(temperature)?,
            angle: Unit::parse(angle)?,
        })
    }

    /// kJ, nm, amu, ps, mol, e, K, rad.
    pub fn gromacs() -> Self {
        Self::builtin("gromacs", ["kJ", "nm", "amu", "ps", "mol", "e", "K", "rad"])
    }

    /// kcal, Å, g, fs, mol, e, K, degree.
    pub fn lammps_real() -> Self {
        Self::builtin("real", ["kcal", "angstrom", "g", "fs", "mol", "e", "K", "degree"])
    }

    /// eV, Å, g, ps, mol, e, K, degree.
    pub fn lammps_metal() -> Self {
        Self::builtin("metal", ["eV", "angstrom", "g", "ps", "mol", "e", "K", "degree"])
    }

    fn builtin(name: &str, symbols: [&str; 8]) -> Self {
        Self::from_symbols(name, symbols)
            .expect("built-in unit system symbols are valid. This is a library bug.")
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "gromacs" => Some(Self::gromacs()),
            "real" | "lammps-real" => Some(Self::lammps_real()),
            "metal" | "lammps-metal" => Some(Self::lammps_metal()),
            _ => None,
        }
    }

    /// The unit of this system with the given dimensions.
    pub fn unit_for(&self, dims: Dimensions) -> Unit {
        if dims.is_dimensionless() {
            return Unit::dimensionless();
        }

        let mut remaining = dims;
        let mut factors: Vec<(&Unit, i8)> = Vec::new();

        // Energy absorbs the M L^2 T^-2 part when the time exponent allows it.
        if remaining.time < 0 && remaining.time % 2 == 0 {
            let n = remaining.time / -2;
            if let Some(rest) = Dimensions::ENERGY
                .powi(n)
                .and_then(|energy| remaining.combine(energy, -1))
            {
                factors.push((&self.energy, n));
                remaining = rest;
            }
        }

        let bases = [
            (remaining.mass, &self.mass),
            (remaining.length, &self.length),
            (remaining.time, &self.time),
            (remaining.amount, &self.amount),
            (remaining.charge, &self.charge),
            (remaining.temperature, &self.temperature),
            (remaining.angle, &self.angle),
        ];
        factors.extend(
            bases
                .into_iter()
                .filter(|(exp, _)| *exp != 0)
                .map(|(exp, unit)| (unit, exp)),
        );

        // Each base unit spans one dimension, so the product has `dims`.
        Unit {
            symbol: factors
                .iter()
                .map(|(unit, n)| power_symbol(&unit.symbol, *n))
                .collect::<Vec<_>>()
                .join("*"),
            scale: factors
                .iter()
                .map(|(unit, n)| unit.scale.powi(i32::from(*n)))
                .product(),
            dims,
        }
    }

    pub fn express(&self, quantity: &Quantity) -> Quantity {
        let target = self.unit_for(quantity.unit.dimensions());
        let factor = quantity.unit.scale / target.scale;
        Quantity::new(quantity.value * factor, target)
    }
}
