use std::fmt;
use std::str::FromStr;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{bisect_left, cumsum, median};

/// And operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AndOp {
    #[default]
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "product")]
    Product,
    #[serde(rename = "lukasiewicz")]
    Lukasiewicz,
}

impl AndOp {
    /// Folds any number of degrees. An empty input yields the neutral element (one).
    pub fn call<F: Float>(self, degrees: impl IntoIterator<Item = F>) -> F {
        match self {
            Self::Min => degrees.into_iter().reduce(F::min).unwrap_or_else(F::one),
            Self::Product => degrees.into_iter().fold(F::one(), |acc, d| acc * d),
            Self::Lukasiewicz => {
                let (n, sum) = degrees
                    .into_iter()
                    .fold((F::zero(), F::zero()), |(n, sum), d| (n + F::one(), sum + d));

                F::max(F::zero(), sum - (n - F::one()))
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Product => "product",
            Self::Lukasiewicz => "lukasiewicz",
        }
    }
}

/// Or operator method for combining the compositions of propositions
/// in a fuzzy rule premise. Also used to aggregate the outputs of the rules.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrOp {
    #[default]
    #[serde(rename = "max")]
    Max,
    /// Probabilistic sum
    #[serde(rename = "psum")]
    ProbSum,
    #[serde(rename = "bsum")]
    BoundedSum,
}

impl OrOp {
    /// Folds any number of degrees. An empty input yields the neutral element (zero).
    pub fn call<F: Float>(self, degrees: impl IntoIterator<Item = F>) -> F {
        match self {
            Self::Max => degrees.into_iter().reduce(F::max).unwrap_or_else(F::zero),
            Self::ProbSum => F::one() - degrees.into_iter().fold(F::one(), |acc, d| acc * (F::one() - d)),
            Self::BoundedSum => F::min(F::one(), degrees.into_iter().fold(F::zero(), |acc, d| acc + d)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::ProbSum => "psum",
            Self::BoundedSum => "bsum",
        }
    }
}

/// Implication operator method for computing the output of a rule
/// from the truth degree of its premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ImplicationOp {
    /// Mamdani clipping
    #[default]
    #[serde(rename = "min")]
    Min,
    /// Larsen scaling
    #[serde(rename = "prod")]
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, degree: F, membership: F) -> F {
        match self {
            Self::Min => F::min(degree, membership),
            Self::Prod => degree * membership,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Prod => "prod",
        }
    }
}

/// Method for defuzzificating the resulting membership function.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DefuzzificationOp {
    /// Center of gravity
    #[default]
    #[serde(rename = "centroid")]
    Centroid,
    /// Leftmost point where the cumulative membership reaches half of the total
    #[serde(rename = "bisector")]
    Bisector,
    /// Median of the values for which the membership function is maximum
    #[serde(rename = "mom")]
    Mom,
    /// Smallest value for which the membership function is maximum
    #[serde(rename = "som")]
    Som,
    /// Largest value for which the membership function is maximum
    #[serde(rename = "lom")]
    Lom,
}

impl DefuzzificationOp {
    /// Defuzzificates a membership function sampled on `universe`.
    ///
    /// An empty universe gives NaN for every method, as does a centroid over
    /// a membership function that is zero everywhere.
    pub fn call<F: Float>(self, universe: &[F], membership: &[F]) -> F {
        debug_assert_eq!(universe.len(), membership.len());

        if universe.is_empty() {
            return F::nan();
        }

        match self {
            Self::Centroid => {
                let (num, den) = universe
                    .iter()
                    .zip(membership)
                    .fold((F::zero(), F::zero()), |(num, den), (&u, &m)| (num + u * m, den + m));

                if den == F::zero() {
                    F::nan()
                } else {
                    num / den
                }
            },
            Self::Bisector => {
                let cum = cumsum(membership.iter().copied());
                let total = cum[cum.len() - 1];
                let two = F::one() + F::one();
                let i = bisect_left(&cum, total / two).min(universe.len() - 1);

                universe[i]
            },
            Self::Mom | Self::Som | Self::Lom => {
                let maximum = membership.iter().copied().fold(F::neg_infinity(), F::max);
                let maxima: Vec<F> = universe
                    .iter()
                    .zip(membership)
                    .filter_map(|(&u, &m)| if m == maximum { Some(u) } else { None })
                    .collect();

                match self {
                    Self::Mom => median(&maxima),
                    Self::Som => maxima.iter().copied().reduce(F::min).unwrap_or_else(F::nan),
                    _ => maxima.iter().copied().reduce(F::max).unwrap_or_else(F::nan),
                }
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Centroid => "centroid",
            Self::Bisector => "bisector",
            Self::Mom => "mom",
            Self::Som => "som",
            Self::Lom => "lom",
        }
    }
}

macro_rules! impl_tag {
    ($ty:ident, $family:literal, [$($variant:ident),+]) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+

                Err(Error::config(format!("invalid {} method: {}", $family, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }
    };
}

impl_tag!(AndOp, "AND", [Min, Product, Lukasiewicz]);
impl_tag!(OrOp, "OR", [Max, ProbSum, BoundedSum]);
impl_tag!(ImplicationOp, "implication", [Min, Prod]);
impl_tag!(DefuzzificationOp, "defuzzification", [Centroid, Bisector, Mom, Som, Lom]);

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_and_families() {
        let degrees = [0.7, 0.4, 0.9];

        assert_eq!(AndOp::Min.call(degrees), 0.4);
        assert!(close(AndOp::Product.call(degrees), 0.7 * 0.4 * 0.9));
        assert!(close(AndOp::Lukasiewicz.call(degrees), 0.0));
        assert!(close(AndOp::Lukasiewicz.call([0.9, 0.8]), 0.7));
    }

    #[test]
    fn test_or_families() {
        let degrees = [0.7, 0.4];

        assert_eq!(OrOp::Max.call(degrees), 0.7);
        assert!(close(OrOp::ProbSum.call(degrees), 1. - 0.3 * 0.6));
        assert_eq!(OrOp::BoundedSum.call([0.7, 0.7]), 1.0);
        assert!(close(OrOp::BoundedSum.call([0.2, 0.3]), 0.5));
        assert_eq!(OrOp::Max.call(std::iter::empty::<f64>()), 0.0);
    }

    #[test]
    fn test_implication() {
        assert_eq!(ImplicationOp::Min.call(0.3, 0.8), 0.3);
        assert!(close(ImplicationOp::Prod.call(0.5, 0.8), 0.4));
    }

    #[test]
    fn test_defuzzification() {
        let universe = [0., 1., 2., 3., 4.];
        let membership = [0., 0.5, 1., 1., 0.];

        assert!(close(DefuzzificationOp::Centroid.call(&universe, &membership), 5.5 / 2.5));
        assert_eq!(DefuzzificationOp::Bisector.call(&universe, &membership), 2.);
        assert_eq!(DefuzzificationOp::Mom.call(&universe, &membership), 2.5);
        assert_eq!(DefuzzificationOp::Som.call(&universe, &membership), 2.);
        assert_eq!(DefuzzificationOp::Lom.call(&universe, &membership), 3.);
        assert!(DefuzzificationOp::Centroid.call(&universe, &[0.; 5]).is_nan());
    }

    #[test]
    fn test_tags() {
        assert_eq!("psum".parse::<OrOp>().unwrap(), OrOp::ProbSum);
        assert_eq!("lukasiewicz".parse::<AndOp>().unwrap(), AndOp::Lukasiewicz);
        assert_eq!(DefuzzificationOp::Lom.to_string(), "lom");
        assert!(matches!("median".parse::<DefuzzificationOp>(), Err(Error::Config(_))));
        assert!(matches!("max".parse::<ImplicationOp>(), Err(Error::Config(_))));
    }
}
