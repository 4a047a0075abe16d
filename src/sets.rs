//! Membership functions and the algebra composing them.
//!
//! A [`FuzzySet`] is a pure function from a domain [`Value`] to a membership
//! degree. Leaf shapes are parametrized curves; composite variants own their
//! children behind an [`Arc`], so sharing a set between several composites (or
//! between a variable and the output of a rule) never copies it.

use std::ops::{BitAnd, BitOr, Mul, Neg};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::domain::Value;
use crate::error::{Error, Result};
use crate::math::interp;
use crate::ops::{AndOp, ImplicationOp, OrOp};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FuzzySet {
    /// Kronecker delta: 1 exactly at `x`, 0 elsewhere
    #[serde(rename = "singleton")]
    Singleton { x: Value },
    /// Explicit sparse mapping, 0 for anything not listed
    #[serde(rename = "discrete")]
    Discrete { d: IndexMap<String, f64> },
    /// The same degree everywhere
    #[serde(rename = "constant")]
    Constant { value: f64 },
    #[serde(rename = "triangular")]
    Triangular { a: f64, b: f64, c: f64 },
    #[serde(rename = "trapezoidal")]
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    /// Width `a`, center `c`
    #[serde(rename = "gaussian")]
    Gaussian { a: f64, c: f64 },
    /// Gaussian tails around a plateau of 1 on `[c1, c2]`
    #[serde(rename = "gaussian2")]
    Gaussian2 { a1: f64, c1: f64, a2: f64, c2: f64 },
    /// Generalized bell `1 / (1 + |(x - c) / a|^(2b))`
    #[serde(rename = "bell")]
    Bell { a: f64, b: f64, c: f64 },
    #[serde(rename = "sigmoid")]
    Sigmoid { a: f64, c: f64 },
    #[serde(rename = "sigmoid_product")]
    SigmoidProduct { a1: f64, c1: f64, a2: f64, c2: f64 },
    /// Difference of two sigmoids, clipped to `[0, 1]`
    #[serde(rename = "sigmoid_difference")]
    SigmoidDifference { a1: f64, c1: f64, a2: f64, c2: f64 },
    #[serde(rename = "s_shaped")]
    SShaped { a: f64, b: f64 },
    #[serde(rename = "z_shaped")]
    ZShaped { a: f64, b: f64 },
    /// `S(a, b) * Z(c, d)`
    #[serde(rename = "pi_shaped")]
    PiShaped { a: f64, b: f64, c: f64, d: f64 },
    /// Linear interpolation through `(x, degree)` points sorted by `x`
    #[serde(rename = "piecewise")]
    Piecewise { points: Vec<(f64, f64)> },
    #[serde(rename = "not")]
    Not { set: Arc<FuzzySet> },
    #[serde(rename = "scale")]
    Scale { set: Arc<FuzzySet>, k: f64 },
    /// `set` implicated by a truth degree, the output of a fired rule
    #[serde(rename = "implication")]
    Implication {
        method: ImplicationOp,
        degree: f64,
        set: Arc<FuzzySet>,
    },
    /// Union. Without a method the active context's OR operator is used.
    #[serde(rename = "or")]
    Or {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<OrOp>,
        sets: Vec<Arc<FuzzySet>>,
    },
    /// Intersection. Without a method the active context's AND operator is used.
    #[serde(rename = "and")]
    And {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<AndOp>,
        sets: Vec<Arc<FuzzySet>>,
    },
}

impl FuzzySet {
    pub fn singleton(x: impl Into<Value>) -> Self {
        FuzzySet::Singleton { x: x.into() }
    }

    pub fn discrete<K: Into<String>>(d: impl IntoIterator<Item = (K, f64)>) -> Self {
        FuzzySet::Discrete {
            d: d.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn constant(value: f64) -> Result<Self> {
        FuzzySet::Constant { value }.checked()
    }

    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self> {
        FuzzySet::Triangular { a, b, c }.checked()
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        FuzzySet::Trapezoidal { a, b, c, d }.checked()
    }

    pub fn gaussian(width: f64, center: f64) -> Result<Self> {
        FuzzySet::Gaussian { a: width, c: center }.checked()
    }

    pub fn gaussian2(width1: f64, center1: f64, width2: f64, center2: f64) -> Result<Self> {
        FuzzySet::Gaussian2 {
            a1: width1,
            c1: center1,
            a2: width2,
            c2: center2,
        }
        .checked()
    }

    pub fn bell(a: f64, b: f64, c: f64) -> Result<Self> {
        FuzzySet::Bell { a, b, c }.checked()
    }

    pub fn sigmoid(a: f64, c: f64) -> Result<Self> {
        FuzzySet::Sigmoid { a, c }.checked()
    }

    pub fn sigmoid_product(a1: f64, c1: f64, a2: f64, c2: f64) -> Result<Self> {
        FuzzySet::SigmoidProduct { a1, c1, a2, c2 }.checked()
    }

    pub fn sigmoid_difference(a1: f64, c1: f64, a2: f64, c2: f64) -> Result<Self> {
        FuzzySet::SigmoidDifference { a1, c1, a2, c2 }.checked()
    }

    pub fn s_shaped(a: f64, b: f64) -> Result<Self> {
        FuzzySet::SShaped { a, b }.checked()
    }

    pub fn z_shaped(a: f64, b: f64) -> Result<Self> {
        FuzzySet::ZShaped { a, b }.checked()
    }

    pub fn pi_shaped(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        FuzzySet::PiShaped { a, b, c, d }.checked()
    }

    pub fn piecewise(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self> {
        FuzzySet::Piecewise {
            points: points.into_iter().collect(),
        }
        .checked()
    }

    pub fn scale(set: impl Into<Arc<FuzzySet>>, k: f64) -> Result<Self> {
        FuzzySet::Scale { set: set.into(), k }.checked()
    }

    /// N-ary union. `None` defers the operator to the context active at evaluation time.
    pub fn union(sets: impl IntoIterator<Item = Arc<FuzzySet>>, method: Option<OrOp>) -> Result<Self> {
        FuzzySet::Or {
            method,
            sets: sets.into_iter().collect(),
        }
        .checked()
    }

    /// N-ary intersection. `None` defers the operator to the context active at evaluation time.
    pub fn intersection(sets: impl IntoIterator<Item = Arc<FuzzySet>>, method: Option<AndOp>) -> Result<Self> {
        FuzzySet::And {
            method,
            sets: sets.into_iter().collect(),
        }
        .checked()
    }

    fn checked(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Checks the construction invariants of this set and all of its children.
    pub fn validate(&self) -> Result<()> {
        fn ordered(name: &str, knots: &[f64]) -> Result<()> {
            if knots.iter().any(|k| !k.is_finite()) {
                return Err(Error::validation(format!("{name} set parameters must be finite: {knots:?}")));
            }
            if knots.windows(2).any(|w| w[0] > w[1]) {
                return Err(Error::validation(format!(
                    "{name} set parameters must be in non-decreasing order: {knots:?}"
                )));
            }
            Ok(())
        }

        fn finite(name: &str, params: &[f64]) -> Result<()> {
            if params.iter().all(|p| p.is_finite()) {
                Ok(())
            } else {
                Err(Error::validation(format!("{name} set parameters must be finite: {params:?}")))
            }
        }

        fn nonzero_width(name: &str, width: f64) -> Result<()> {
            if width == 0. {
                Err(Error::validation(format!("{name} set width must be non-zero")))
            } else {
                Ok(())
            }
        }

        match self {
            FuzzySet::Singleton { x } => match x {
                Value::Number(n) => finite("singleton", &[*n]),
                Value::Label(_) => Ok(()),
            },
            FuzzySet::Discrete { d } => finite("discrete", &d.values().copied().collect::<Vec<_>>()),
            FuzzySet::Constant { value } => finite("constant", &[*value]),
            FuzzySet::Triangular { a, b, c } => ordered("triangular", &[*a, *b, *c]),
            FuzzySet::Trapezoidal { a, b, c, d } => ordered("trapezoidal", &[*a, *b, *c, *d]),
            FuzzySet::Gaussian { a, c } => {
                finite("gaussian", &[*a, *c])?;
                nonzero_width("gaussian", *a)
            },
            FuzzySet::Gaussian2 { a1, c1, a2, c2 } => {
                finite("gaussian2", &[*a1, *a2])?;
                nonzero_width("gaussian2", *a1)?;
                nonzero_width("gaussian2", *a2)?;
                ordered("gaussian2 centers", &[*c1, *c2])
            },
            FuzzySet::Bell { a, b, c } => {
                finite("bell", &[*a, *b, *c])?;
                nonzero_width("bell", *a)
            },
            FuzzySet::Sigmoid { a, c } => finite("sigmoid", &[*a, *c]),
            FuzzySet::SigmoidProduct { a1, c1, a2, c2 } => finite("sigmoid_product", &[*a1, *c1, *a2, *c2]),
            FuzzySet::SigmoidDifference { a1, c1, a2, c2 } => finite("sigmoid_difference", &[*a1, *c1, *a2, *c2]),
            FuzzySet::SShaped { a, b } => ordered("s_shaped", &[*a, *b]),
            FuzzySet::ZShaped { a, b } => ordered("z_shaped", &[*a, *b]),
            FuzzySet::PiShaped { a, b, c, d } => ordered("pi_shaped", &[*a, *b, *c, *d]),
            FuzzySet::Piecewise { points } => {
                if points.is_empty() {
                    return Err(Error::validation("piecewise set needs at least one point"));
                }
                let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
                let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();

                ordered("piecewise", &xs)?;
                finite("piecewise", &ys)
            },
            FuzzySet::Not { set } => set.validate(),
            FuzzySet::Scale { set, k } => {
                finite("scale", &[*k])?;
                set.validate()
            },
            FuzzySet::Implication { degree, set, .. } => {
                finite("implication", &[*degree])?;
                set.validate()
            },
            FuzzySet::Or { sets, .. } | FuzzySet::And { sets, .. } => {
                if sets.is_empty() {
                    return Err(Error::validation("n-ary set operators need at least one operand"));
                }
                sets.iter().try_for_each(|s| s.validate())
            },
        }
    }

    /// Membership degree of `x`, resolving unset n-ary operators from `ctx`.
    ///
    /// Numeric shapes give 0 for a label.
    pub fn evaluate(&self, x: &Value, ctx: &Context) -> f64 {
        match self {
            FuzzySet::Singleton { x: x0 } => {
                if x0 == x {
                    1.
                } else {
                    0.
                }
            },
            FuzzySet::Discrete { d } => d.iter().find(|(k, _)| x.matches_key(k)).map_or(0., |(_, v)| *v),
            FuzzySet::Constant { value } => *value,
            FuzzySet::Not { set } => 1. - set.evaluate(x, ctx),
            FuzzySet::Scale { set, k } => k * set.evaluate(x, ctx),
            FuzzySet::Implication { method, degree, set } => method.call(*degree, set.evaluate(x, ctx)),
            FuzzySet::Or { method, sets } => method
                .unwrap_or(ctx.or)
                .call(sets.iter().map(|s| s.evaluate(x, ctx))),
            FuzzySet::And { method, sets } => method
                .unwrap_or(ctx.and)
                .call(sets.iter().map(|s| s.evaluate(x, ctx))),
            _ => match x {
                Value::Number(x) => self.evaluate_shape(*x),
                Value::Label(_) => 0.,
            },
        }
    }

    /// Membership degree of a crisp number under the default context.
    pub fn membership(&self, x: f64) -> f64 {
        self.evaluate(&Value::Number(x), &Context::default())
    }

    fn evaluate_shape(&self, x: f64) -> f64 {
        match *self {
            FuzzySet::Triangular { a, b, c } => {
                if x < a || x > c {
                    0.
                } else if x < b {
                    if b == a {
                        1.
                    } else {
                        (x - a) / (b - a)
                    }
                } else if c == b {
                    1.
                } else {
                    (c - x) / (c - b)
                }
            },
            FuzzySet::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.
                } else if x < b {
                    if b == a {
                        1.
                    } else {
                        (x - a) / (b - a)
                    }
                } else if x <= c {
                    1.
                } else {
                    (d - x) / (d - c)
                }
            },
            FuzzySet::Gaussian { a, c } => gaussian(x, a, c),
            FuzzySet::Gaussian2 { a1, c1, a2, c2 } => {
                if x < c1 {
                    gaussian(x, a1, c1)
                } else if x > c2 {
                    gaussian(x, a2, c2)
                } else {
                    1.
                }
            },
            FuzzySet::Bell { a, b, c } => 1. / (1. + ((x - c) / a).abs().powf(2. * b)),
            FuzzySet::Sigmoid { a, c } => sigmoid(x, a, c),
            FuzzySet::SigmoidProduct { a1, c1, a2, c2 } => sigmoid(x, a1, c1) * sigmoid(x, a2, c2),
            FuzzySet::SigmoidDifference { a1, c1, a2, c2 } => {
                (sigmoid(x, a1, c1) - sigmoid(x, a2, c2)).clamp(0., 1.)
            },
            FuzzySet::SShaped { a, b } => s_shape(x, a, b),
            FuzzySet::ZShaped { a, b } => 1. - s_shape(x, a, b),
            FuzzySet::PiShaped { a, b, c, d } => s_shape(x, a, b) * (1. - s_shape(x, c, d)),
            FuzzySet::Piecewise { ref points } => interp(Some(x), points.iter().copied())
                .first()
                .copied()
                .unwrap_or(0.),
            _ => unreachable!("not a numeric shape"),
        }
    }

    /// Samples the set on every point of `mesh`.
    pub fn sample<'v>(&self, mesh: impl IntoIterator<Item = &'v Value>, ctx: &Context) -> Vec<f64> {
        mesh.into_iter().map(|x| self.evaluate(x, ctx)).collect()
    }

    /// Whether this is a primitive shape rather than a composition of other sets
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            FuzzySet::Not { .. }
                | FuzzySet::Scale { .. }
                | FuzzySet::Implication { .. }
                | FuzzySet::Or { .. }
                | FuzzySet::And { .. }
        )
    }
}

fn gaussian(x: f64, width: f64, center: f64) -> f64 {
    (-((x - center) / width).powi(2) / 2.).exp()
}

fn sigmoid(x: f64, a: f64, c: f64) -> f64 {
    1. / (1. + (-a * (x - c)).exp())
}

/// Quadratic spline from 0 at `a` to 1 at `b`, meeting at the midpoint.
fn s_shape(x: f64, a: f64, b: f64) -> f64 {
    if x < a {
        0.
    } else if x >= b {
        1.
    } else {
        let mid = (a + b) / 2.;

        if x <= mid {
            2. * ((x - a) / (b - a)).powi(2)
        } else {
            1. - 2. * ((x - b) / (b - a)).powi(2)
        }
    }
}

// The operators below build composites without validating them. Use the
// checked `scale`, `union` and `intersection` constructors, or call `validate`
// on the result, when operands come from untrusted input.

impl Neg for FuzzySet {
    type Output = FuzzySet;

    fn neg(self) -> FuzzySet {
        FuzzySet::Not { set: Arc::new(self) }
    }
}

impl BitOr for FuzzySet {
    type Output = FuzzySet;

    fn bitor(self, rhs: FuzzySet) -> FuzzySet {
        FuzzySet::Or {
            method: None,
            sets: vec![Arc::new(self), Arc::new(rhs)],
        }
    }
}

impl BitAnd for FuzzySet {
    type Output = FuzzySet;

    fn bitand(self, rhs: FuzzySet) -> FuzzySet {
        FuzzySet::And {
            method: None,
            sets: vec![Arc::new(self), Arc::new(rhs)],
        }
    }
}

impl Mul<f64> for FuzzySet {
    type Output = FuzzySet;

    fn mul(self, k: f64) -> FuzzySet {
        debug_assert!(k.is_finite(), "scale factor must be finite, got {k}");
        FuzzySet::Scale { set: Arc::new(self), k }
    }
}
