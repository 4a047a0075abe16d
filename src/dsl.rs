use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::domain::Value;
use crate::error::{Error, Result};
use crate::inputs::Inputs;
use crate::rules::Rule;
use crate::variable::{Variable, Variables};

/// A fuzzy proposition over an input assignment, evaluating to a degree in `[0, 1]`.
///
/// `And` and `Or` take their operator from the context they are evaluated
/// under, so the same tree may give different degrees under different contexts.
#[derive(Clone, Debug, PartialEq)]
pub enum Proposition {
    /// `<variable> is <value>`
    Is(Variable, String),
    /// `<variable> is not <value>`
    IsNot(Variable, String),
    Not(Box<Proposition>),
    And(Vec<Proposition>),
    Or(Vec<Proposition>),
}

impl Proposition {
    pub fn or(self, rhs: Proposition) -> Self {
        Proposition::Or(vec![self, rhs])
    }

    pub fn and(self, rhs: Proposition) -> Self {
        Proposition::And(vec![self, rhs])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Proposition::Not(Box::new(self))
    }

    /// `if self then consequent`, with weight one
    pub fn then(self, consequent: Proposition) -> Result<Rule> {
        Rule::new(self, consequent, 1.)
    }

    pub fn evaluate(&self, vars: &Variables, inputs: &Inputs, ctx: &Context) -> Result<f64> {
        match self {
            Proposition::Is(var, label) => valuation(vars, *var, label, inputs, ctx),
            Proposition::IsNot(var, label) => Ok(1. - valuation(vars, *var, label, inputs, ctx)?),
            Proposition::Not(prop) => Ok(1. - prop.evaluate(vars, inputs, ctx)?),
            Proposition::And(props) => {
                let degrees = props
                    .iter()
                    .map(|p| p.evaluate(vars, inputs, ctx))
                    .collect::<Result<Vec<_>>>()?;

                Ok(ctx.and.call(degrees))
            },
            Proposition::Or(props) => {
                let degrees = props
                    .iter()
                    .map(|p| p.evaluate(vars, inputs, ctx))
                    .collect::<Result<Vec<_>>>()?;

                Ok(ctx.or.call(degrees))
            },
        }
    }

    /// Checks every valuation names a known label and no combinator is empty.
    pub fn validate(&self, vars: &Variables) -> Result<()> {
        match self {
            Proposition::Is(var, label) | Proposition::IsNot(var, label) => {
                vars.get(*var)?.get(label)?;
                Ok(())
            },
            Proposition::Not(prop) => prop.validate(vars),
            Proposition::And(props) | Proposition::Or(props) => {
                if props.is_empty() {
                    return Err(Error::validation("and/or propositions need at least one child"));
                }
                props.iter().try_for_each(|p| p.validate(vars))
            },
        }
    }

    /// Every `(variable, label)` valuation in the tree, left to right
    pub fn valuations(&self) -> Vec<(Variable, &str)> {
        let mut props = Vec::new();

        fn parse<'p>(prop: &'p Proposition, out: &mut Vec<(Variable, &'p str)>) {
            match prop {
                Proposition::Is(var, label) | Proposition::IsNot(var, label) => out.push((*var, label)),
                Proposition::Not(prop) => parse(prop, out),
                Proposition::And(props) | Proposition::Or(props) => {
                    for prop in props {
                        parse(prop, out);
                    }
                },
            }
        }

        parse(self, &mut props);

        props
    }

    pub fn describe(&self, vars: &Variables) -> Result<PropositionDescription> {
        let children = |props: &[Proposition]| -> Result<Vec<PropositionDescription>> {
            props.iter().map(|p| p.describe(vars)).collect()
        };

        Ok(match self {
            Proposition::Is(var, label) => PropositionDescription::Is {
                variable: vars.get(*var)?.name.clone(),
                value: label.clone(),
            },
            Proposition::IsNot(var, label) => PropositionDescription::IsNot {
                variable: vars.get(*var)?.name.clone(),
                value: label.clone(),
            },
            Proposition::Not(prop) => PropositionDescription::Not {
                children: vec![prop.describe(vars)?],
            },
            Proposition::And(props) => PropositionDescription::And {
                children: children(props)?,
            },
            Proposition::Or(props) => PropositionDescription::Or {
                children: children(props)?,
            },
        })
    }

    /// Rebuilds a proposition, resolving variable names against `vars`.
    pub fn from_description(description: &PropositionDescription, vars: &Variables) -> Result<Self> {
        let children = |descs: &[PropositionDescription]| -> Result<Vec<Proposition>> {
            descs.iter().map(|d| Proposition::from_description(d, vars)).collect()
        };

        let prop = match description {
            PropositionDescription::Is { variable, value } => Proposition::Is(vars.by_name(variable)?, value.clone()),
            PropositionDescription::IsNot { variable, value } => {
                Proposition::IsNot(vars.by_name(variable)?, value.clone())
            },
            PropositionDescription::Not { children: descs } => match &descs[..] {
                [child] => Proposition::Not(Box::new(Proposition::from_description(child, vars)?)),
                _ => return Err(Error::config("a not proposition takes exactly one child")),
            },
            PropositionDescription::And { children: descs } => Proposition::And(children(descs)?),
            PropositionDescription::Or { children: descs } => Proposition::Or(children(descs)?),
        };

        prop.validate(vars)?;

        Ok(prop)
    }
}

fn valuation(vars: &Variables, var: Variable, label: &str, inputs: &Inputs, ctx: &Context) -> Result<f64> {
    let var = vars.get(var)?;
    let set = var.get(label)?;
    let value: &Value = inputs.get(&var.name)?;

    Ok(set.evaluate(value, ctx))
}

impl Variable {
    pub fn is(self, label: impl Into<String>) -> Proposition {
        Proposition::Is(self, label.into())
    }

    pub fn is_not(self, label: impl Into<String>) -> Proposition {
        Proposition::IsNot(self, label.into())
    }
}

impl BitAnd for Proposition {
    type Output = Proposition;

    fn bitand(self, rhs: Proposition) -> Proposition {
        self.and(rhs)
    }
}

impl BitOr for Proposition {
    type Output = Proposition;

    fn bitor(self, rhs: Proposition) -> Proposition {
        self.or(rhs)
    }
}

impl Not for Proposition {
    type Output = Proposition;

    fn not(self) -> Proposition {
        Proposition::Not(Box::new(self))
    }
}

/// Serializable form of a [`Proposition`], naming variables instead of holding handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropositionDescription {
    #[serde(rename = "is")]
    Is { variable: String, value: String },
    #[serde(rename = "is not")]
    IsNot { variable: String, value: String },
    #[serde(rename = "not")]
    Not { children: Vec<PropositionDescription> },
    #[serde(rename = "and")]
    And { children: Vec<PropositionDescription> },
    #[serde(rename = "or")]
    Or { children: Vec<PropositionDescription> },
}

impl fmt::Display for PropositionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn joined(f: &mut fmt::Formatter<'_>, children: &[PropositionDescription], sep: &str) -> fmt::Result {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "({child})")?;
            }
            Ok(())
        }

        match self {
            PropositionDescription::Is { variable, value } => write!(f, "{variable} is {value}"),
            PropositionDescription::IsNot { variable, value } => write!(f, "{variable} is not {value}"),
            PropositionDescription::Not { children } => {
                f.write_str("not ")?;
                joined(f, children, " ")
            },
            PropositionDescription::And { children } => joined(f, children, " and "),
            PropositionDescription::Or { children } => joined(f, children, " or "),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::domain::Domain;
    use crate::ops::{AndOp, OrOp};
    use crate::sets::FuzzySet;
    use crate::variable::FuzzyVariable;

    fn setup() -> (Variables, Variable, Variable) {
        let mut vars = Variables::new();
        let service = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("service", 0., 10., 100usize).unwrap(),
                    [
                        ("poor", FuzzySet::triangular(0., 0., 5.).unwrap()),
                        ("good", FuzzySet::triangular(0., 5., 10.).unwrap()),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        let food = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("food", 0., 10., 100usize).unwrap(),
                    [("rancid", FuzzySet::trapezoidal(0., 0., 2., 6.).unwrap())],
                )
                .unwrap(),
            )
            .unwrap();

        (vars, service, food)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_valuations() {
        let (vars, service, food) = setup();
        let inputs = Inputs::new().with("service", 4.).with("food", 4.);
        let ctx = Context::default();

        assert!(close(service.is("good").evaluate(&vars, &inputs, &ctx).unwrap(), 0.8));
        assert!(close(service.is_not("good").evaluate(&vars, &inputs, &ctx).unwrap(), 0.2));
        assert!(close(food.is("rancid").not().evaluate(&vars, &inputs, &ctx).unwrap(), 0.5));
    }

    #[test]
    fn test_combinators_follow_context() {
        let (vars, service, food) = setup();
        let inputs = Inputs::new().with("service", 4.).with("food", 4.);
        let prop = service.is("poor") | food.is("rancid");

        // poor = 0.2, rancid = 0.5
        let or = |op| prop.evaluate(&vars, &inputs, &Context::default().with_or(op)).unwrap();
        assert!(close(or(OrOp::Max), 0.5));
        assert!(close(or(OrOp::ProbSum), 0.6));
        assert!(close(or(OrOp::BoundedSum), 0.7));

        let prop = service.is("poor") & food.is("rancid");
        let and = |op| prop.evaluate(&vars, &inputs, &Context::default().with_and(op)).unwrap();
        assert!(close(and(AndOp::Min), 0.2));
        assert!(close(and(AndOp::Product), 0.1));
        assert!(close(and(AndOp::Lukasiewicz), 0.));
    }

    #[test]
    fn test_lookup_errors() {
        let (vars, service, _) = setup();
        let ctx = Context::default();

        let missing_input = service.is("good").evaluate(&vars, &Inputs::new().with("food", 1.), &ctx);
        assert!(matches!(missing_input, Err(Error::Lookup(_))));

        let unknown_label = service.is("superb").evaluate(&vars, &Inputs::new().with("service", 1.), &ctx);
        assert!(matches!(unknown_label, Err(Error::Lookup(_))));
        assert!(matches!(service.is("superb").validate(&vars), Err(Error::Lookup(_))));
        assert!(matches!(Proposition::Or(vec![]).validate(&vars), Err(Error::Validation(_))));
    }

    #[test]
    fn test_description() {
        let (vars, service, food) = setup();
        let prop = !(service.is("poor") | food.is_not("rancid"));
        let description = prop.describe(&vars).unwrap();

        assert_eq!(description.to_string(), "not ((service is poor) or (food is not rancid))");
        assert_eq!(Proposition::from_description(&description, &vars).unwrap(), prop);

        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["type"], "not");
        assert_eq!(json["children"][0]["children"][1]["type"], "is not");
    }

    #[test]
    fn test_description_errors() {
        let (vars, _, _) = setup();
        let unknown_variable = PropositionDescription::Is {
            variable: "ambience".into(),
            value: "cozy".into(),
        };
        let two_children = PropositionDescription::Not {
            children: vec![unknown_variable.clone(), unknown_variable.clone()],
        };

        assert!(matches!(
            Proposition::from_description(&unknown_variable, &vars),
            Err(Error::Lookup(_))
        ));
        assert!(matches!(
            Proposition::from_description(&two_children, &vars),
            Err(Error::Config(_))
        ));
        assert!(serde_json::from_str::<PropositionDescription>(r#"{"type": "xor", "children": []}"#).is_err());
    }
}
