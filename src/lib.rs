//! Mamdani fuzzy inference systems.
//!
//! A [`Fis`] owns a registry of linguistic [`FuzzyVariable`]s, a [`RuleSet`]
//! over them and a single target variable. Evaluating it on crisp inputs fires
//! every rule, aggregates the implicated consequents into a [`FuzzySet`] over
//! the target's domain, and defuzzifies that set into a crisp [`Value`].
//!
//! ```
//! use mamdani::{Domain, Fis, FuzzySet, FuzzyVariable, Inputs, RuleSet, Variables};
//!
//! # fn main() -> mamdani::Result<()> {
//! let mut vars = Variables::new();
//! let service = vars.add(FuzzyVariable::new(
//!     Domain::float("service", 0., 10., 100usize)?,
//!     [("poor", FuzzySet::gaussian(1.5, 0.)?), ("good", FuzzySet::gaussian(1.5, 10.)?)],
//! )?)?;
//! let tip = vars.add(FuzzyVariable::new(
//!     Domain::float("tip", 0., 30., 100usize)?,
//!     [("low", FuzzySet::triangular(0., 5., 10.)?), ("high", FuzzySet::triangular(20., 25., 30.)?)],
//! )?)?;
//!
//! let mut rules = RuleSet::new();
//! rules.add(service.is("poor").then(tip.is("low"))?);
//! rules.add(service.is("good").then(tip.is("high"))?);
//!
//! let fis = Fis::new(vars, vec![service], rules, tip)?;
//! let crisp = fis.get_crisp_output(&Inputs::new().with("service", 8.))?;
//!
//! assert!(crisp.as_f64().is_some_and(|tip| tip > 15.));
//! # Ok(())
//! # }
//! ```
//!
//! The operators every evaluation uses (AND, OR, implication, aggregation and
//! defuzzification) are selected by a [`Context`]. Each system carries one,
//! and [`Fis::get_output_in`] evaluates under any other.

pub mod codegen;
mod context;
mod domain;
mod dsl;
mod error;
mod inference;
mod inputs;
pub mod legacy;
mod linspace;
mod math;
mod ops;
mod rules;
mod sets;
mod variable;

pub use context::Context;
pub use domain::{CategoricalDomain, Domain, FloatDomain, Steps, Value};
pub use dsl::{Proposition, PropositionDescription};
pub use error::{Error, Result};
pub use inference::{Fis, FisDescription};
pub use inputs::{Inputs, Row};
pub use ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp};
pub use rules::{Rule, RuleDescription, RuleSet, RuleSetDescription};
pub use sets::FuzzySet;
pub use variable::{FuzzyVariable, Variable, VariableKey, Variables};
