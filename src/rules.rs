use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::domain::Value;
use crate::dsl::{Proposition, PropositionDescription};
use crate::error::{Error, Result};
use crate::inputs::Inputs;
use crate::sets::FuzzySet;
use crate::variable::{Variable, Variables};

/// `if <antecedent> then <variable> is <value>`, with a weight in `(0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub(crate) antecedent: Proposition,
    pub(crate) consequent: Variable,
    pub(crate) value: String,
    pub(crate) weight: f64,
}

impl Rule {
    /// Only plain valuations (`variable is value`) are accepted as consequents.
    pub fn new(antecedent: Proposition, consequent: Proposition, weight: f64) -> Result<Self> {
        if !(weight > 0. && weight <= 1.) {
            return Err(Error::validation(format!("rule weight must be in (0, 1], got {weight}")));
        }

        let Proposition::Is(consequent, value) = consequent else {
            return Err(Error::validation("complex consequent rules are not supported"));
        };

        Ok(Self {
            antecedent,
            consequent,
            value,
            weight,
        })
    }

    pub fn antecedent(&self) -> &Proposition {
        &self.antecedent
    }

    pub fn consequent(&self) -> Proposition {
        Proposition::Is(self.consequent, self.value.clone())
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The consequent's set implicated by the antecedent's degree and scaled by the weight.
    pub fn evaluate(&self, vars: &Variables, inputs: &Inputs, ctx: &Context) -> Result<Arc<FuzzySet>> {
        let degree = self.antecedent.evaluate(vars, inputs, ctx)?;
        let set = vars.get(self.consequent)?.get(&self.value)?.clone();

        log::trace!("rule fired with degree {degree} on {}", self.value);

        let implied = FuzzySet::Implication {
            method: ctx.implication,
            degree,
            set,
        };

        Ok(Arc::new(FuzzySet::Scale {
            set: Arc::new(implied),
            k: self.weight,
        }))
    }

    pub fn validate(&self, vars: &Variables) -> Result<()> {
        self.antecedent.validate(vars)?;
        vars.get(self.consequent)?.get(&self.value)?;
        Ok(())
    }

    pub fn describe(&self, vars: &Variables) -> Result<RuleDescription> {
        Ok(RuleDescription {
            antecedent: self.antecedent.describe(vars)?,
            consequent: self.consequent().describe(vars)?,
            weight: self.weight,
        })
    }

    pub fn from_description(description: &RuleDescription, vars: &Variables) -> Result<Self> {
        let rule = Rule::new(
            Proposition::from_description(&description.antecedent, vars)?,
            Proposition::from_description(&description.consequent, vars)?,
            description.weight,
        )?;

        rule.validate(vars)?;

        Ok(rule)
    }
}

/// An ordered collection of rules, aggregated into a single output set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet(pub(crate) Vec<Rule>);

impl RuleSet {
    pub fn new() -> Self {
        RuleSet(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RuleSet(Vec::with_capacity(capacity))
    }

    pub fn add(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }

    /// Aggregates the output of every rule with the context's aggregation
    /// operator. The result is evaluated lazily, when sampled.
    pub fn evaluate(&self, vars: &Variables, inputs: &Inputs, ctx: &Context) -> Result<FuzzySet> {
        let sets = self
            .0
            .iter()
            .map(|rule| rule.evaluate(vars, inputs, ctx))
            .collect::<Result<Vec<_>>>()?;

        Ok(FuzzySet::Or {
            method: Some(ctx.aggregation),
            sets,
        })
    }

    pub fn describe(&self, vars: &Variables) -> Result<RuleSetDescription> {
        Ok(RuleSetDescription {
            rule_list: self.0.iter().map(|r| r.describe(vars)).collect::<Result<_>>()?,
        })
    }

    pub fn from_description(description: &RuleSetDescription, vars: &Variables) -> Result<Self> {
        description
            .rule_list
            .iter()
            .map(|r| Rule::from_description(r, vars))
            .collect::<Result<Vec<_>>>()
            .map(RuleSet)
    }

    /// One rule per label, pairing the labels of both variables in order of
    /// increasing centroid (decreasing on the consequent side if `reverse`).
    ///
    /// When one side has exactly one label more than the other and an odd
    /// count, its middle label is left out.
    pub fn automatic(
        vars: &Variables,
        antecedent: Variable,
        consequent: Variable,
        weight: f64,
        reverse: bool,
    ) -> Result<Self> {
        let mut v1 = ordered_labels(vars, antecedent)?;
        let mut v2 = ordered_labels(vars, consequent)?;
        let (n, m) = (v1.len(), v2.len());

        if n == m + 1 && n % 2 == 1 {
            v1.remove(n / 2);
        } else if n + 1 == m && m % 2 == 1 {
            v2.remove(m / 2);
        } else if n != m {
            return Err(Error::validation(format!(
                "unable to automatically choose a {n} to {m} mapping"
            )));
        }

        if reverse {
            v2.reverse();
        }

        v1.into_iter()
            .zip(v2)
            .map(|(a, c)| Rule::new(antecedent.is(a), consequent.is(c), weight))
            .collect::<Result<Vec<_>>>()
            .map(RuleSet)
    }
}

fn ordered_labels(vars: &Variables, var: Variable) -> Result<Vec<String>> {
    let var = vars.get(var)?;
    let mut centroids = Vec::with_capacity(var.values.len());

    for (label, set) in &var.values {
        match var.domain.centroid(set)? {
            Value::Number(c) => centroids.push((label.clone(), c)),
            Value::Label(_) => {
                return Err(Error::config(format!(
                    "automatic rules need a numeric domain, {} is categorical",
                    var.name
                )))
            },
        }
    }

    centroids.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(centroids.into_iter().map(|(label, _)| label).collect())
}

impl<'r> IntoIterator for &'r RuleSet {
    type Item = &'r Rule;
    type IntoIter = std::slice::Iter<'r, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn default_weight() -> f64 {
    1.
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDescription {
    pub antecedent: PropositionDescription,
    pub consequent: PropositionDescription,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl fmt::Display for RuleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if ({}) then ({}) [{:.6}]", self.antecedent, self.consequent, self.weight)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDescription {
    pub rule_list: Vec<RuleDescription>,
}

impl fmt::Display for RuleSetDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rule_list.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}
