use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::linspace::{Arange, Linspace};
use crate::ops::DefuzzificationOp;
use crate::sets::FuzzySet;

/// A point of a universe of discourse: a crisp number or a categorical label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Label(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Label(l) => Some(l),
        }
    }

    /// Whether this value is the one a discrete set lists under `key`.
    /// Numbers match keys that parse to the same number.
    pub(crate) fn matches_key(&self, key: &str) -> bool {
        match self {
            Value::Number(n) => key.trim().parse::<f64>().map_or(false, |k| k == *n),
            Value::Label(l) => l == key,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(l: &str) -> Self {
        Value::Label(l.to_owned())
    }
}

impl From<String> for Value {
    fn from(l: String) -> Self {
        Value::Label(l)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => fmt::Display::fmt(n, f),
            Value::Label(l) => fmt::Display::fmt(l, f),
        }
    }
}

/// Discretization of a numeric domain: a sample count or a step size.
///
/// Serialized as a bare JSON number; integers are counts, anything with a
/// fractional representation is a step size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Steps {
    Count(usize),
    Size(f64),
}

impl From<usize> for Steps {
    fn from(n: usize) -> Self {
        Steps::Count(n)
    }
}

impl From<f64> for Steps {
    fn from(h: f64) -> Self {
        Steps::Size(h)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatDomain {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub steps: Steps,
}

impl FloatDomain {
    pub fn new(name: impl Into<String>, min: f64, max: f64, steps: impl Into<Steps>) -> Result<Self> {
        let this = Self {
            name: name.into(),
            min,
            max,
            steps: steps.into(),
        };

        this.validate()?;

        Ok(this)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(Error::validation(format!(
                "domain {} needs finite bounds with min < max, got [{}, {}]",
                self.name, self.min, self.max
            )));
        }
        if let Steps::Size(h) = self.steps {
            if !(h.is_finite() && h > 0.) {
                return Err(Error::config(format!(
                    "domain {} step size must be a positive number, got {h}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Sample points of the domain
    pub fn mesh(&self) -> Vec<f64> {
        match self.steps {
            Steps::Count(n) => Linspace::new(self.min, self.max, n).collect(),
            Steps::Size(h) => Arange::new(self.min, self.max, h).collect(),
        }
    }

    /// The mesh and the degree of `set` at each of its points
    pub fn evaluate_set(&self, set: &FuzzySet, ctx: &Context) -> (Vec<f64>, Vec<f64>) {
        let mesh = self.mesh();
        let degrees = mesh.iter().map(|x| set.evaluate(&Value::Number(*x), ctx)).collect();

        (mesh, degrees)
    }

    pub fn defuzzify(&self, set: &FuzzySet, method: DefuzzificationOp, ctx: &Context) -> f64 {
        let (mesh, degrees) = self.evaluate_set(set, ctx);

        method.call(&mesh, &degrees)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDomain {
    pub name: String,
    pub values: Vec<String>,
}

impl CategoricalDomain {
    pub fn new<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Result<Self> {
        let this = Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        };

        this.validate()?;

        Ok(this)
    }

    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(Error::validation(format!("categorical domain {} has no values", self.name)));
        }
        Ok(())
    }

    pub fn mesh(&self) -> &[String] {
        &self.values
    }

    /// The label attaining the maximum degree, the first one on ties.
    /// Only the centroid method is defined for categorical domains, as a mode.
    pub fn defuzzify(&self, set: &FuzzySet, method: DefuzzificationOp, ctx: &Context) -> Result<String> {
        if method != DefuzzificationOp::Centroid {
            return Err(Error::config(format!(
                "defuzzification method {method} is not available for categorical domain {}",
                self.name
            )));
        }

        let mut best: Option<(&String, f64)> = None;

        for label in &self.values {
            let degree = set.evaluate(&Value::Label(label.clone()), ctx);

            match best {
                Some((_, max)) if !(degree > max) => {},
                _ => best = Some((label, degree)),
            }
        }

        best.map(|(label, _)| label.clone())
            .ok_or_else(|| Error::validation(format!("categorical domain {} has no values", self.name)))
    }
}

/// A universe of discourse where fuzzy sets are defined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Domain {
    #[serde(rename = "FloatDomain")]
    Float(FloatDomain),
    #[serde(rename = "CategoricalDomain")]
    Categorical(CategoricalDomain),
}

impl Domain {
    pub fn float(name: impl Into<String>, min: f64, max: f64, steps: impl Into<Steps>) -> Result<Self> {
        FloatDomain::new(name, min, max, steps).map(Domain::Float)
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Result<Self> {
        CategoricalDomain::new(name, values).map(Domain::Categorical)
    }

    pub fn name(&self) -> &str {
        match self {
            Domain::Float(d) => &d.name,
            Domain::Categorical(d) => &d.name,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Domain::Float(d) => d.validate(),
            Domain::Categorical(d) => d.validate(),
        }
    }

    /// Sample points of the domain, in order. The same on every call.
    pub fn mesh(&self) -> Vec<Value> {
        match self {
            Domain::Float(d) => d.mesh().into_iter().map(Value::Number).collect(),
            Domain::Categorical(d) => d.values.iter().cloned().map(Value::Label).collect(),
        }
    }

    /// The mesh paired with the degree of `set` at each of its points
    pub fn evaluate(&self, set: &FuzzySet, ctx: &Context) -> (Vec<Value>, Vec<f64>) {
        let mesh = self.mesh();
        let degrees = set.sample(&mesh, ctx);

        (mesh, degrees)
    }

    /// Reduces `set` to a single crisp value with the given method.
    ///
    /// A numeric centroid over a set that is zero everywhere is NaN, not an error.
    pub fn defuzzify(&self, set: &FuzzySet, method: DefuzzificationOp, ctx: &Context) -> Result<Value> {
        match self {
            Domain::Float(d) => Ok(Value::Number(d.defuzzify(set, method, ctx))),
            Domain::Categorical(d) => d.defuzzify(set, method, ctx).map(Value::Label),
        }
    }

    /// Centroid of `set` over this domain, under the default context
    pub fn centroid(&self, set: &FuzzySet) -> Result<Value> {
        self.defuzzify(set, DefuzzificationOp::Centroid, &Context::default())
    }
}
