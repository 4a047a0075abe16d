use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::domain::Value;
use crate::error::{Error, Result};
use crate::inputs::{Inputs, Row};
use crate::rules::{RuleSet, RuleSetDescription};
use crate::sets::FuzzySet;
use crate::variable::{FuzzyVariable, Variable, Variables};

/// A Mamdani fuzzy inference system with a single output variable.
#[derive(Clone, Debug)]
pub struct Fis {
    variables: Variables,
    inputs: Vec<Variable>,
    rules: RuleSet,
    target: Variable,
    context: Context,
}

impl Fis {
    /// Builds a system under the default context.
    ///
    /// Every rule must reference registered variables and labels, read only
    /// from `inputs` and conclude on `target`.
    pub fn new(variables: Variables, inputs: Vec<Variable>, rules: RuleSet, target: Variable) -> Result<Self> {
        for var in inputs.iter().chain(Some(&target)) {
            variables.get(*var)?;
        }

        if inputs.contains(&target) {
            return Err(Error::validation("the target variable cannot also be an input"));
        }

        for rule in &rules {
            rule.validate(&variables)?;

            if rule.consequent != target {
                return Err(Error::validation(format!(
                    "rule concludes on {} instead of the target variable",
                    variables.get(rule.consequent)?.name
                )));
            }

            for (var, _) in rule.antecedent.valuations() {
                if !inputs.contains(&var) {
                    return Err(Error::validation(format!(
                        "rule antecedent reads {}, which is not an input",
                        variables.get(var)?.name
                    )));
                }
            }
        }

        Ok(Self {
            variables,
            inputs,
            rules,
            target,
            context: Context::default(),
        })
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// The input variables, in positional order
    pub fn inputs(&self) -> impl Iterator<Item = &FuzzyVariable> {
        self.inputs.iter().filter_map(|var| self.variables.get(*var).ok())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn target(&self) -> &FuzzyVariable {
        // Checked on construction
        &self.variables.vars[self.target.0]
    }

    /// The aggregated output of the system as a fuzzy set over the target domain
    pub fn get_output(&self, inputs: &Inputs) -> Result<FuzzySet> {
        self.get_output_in(inputs, &self.context)
    }

    /// Like [`Fis::get_output`], under an explicitly given context
    pub fn get_output_in(&self, inputs: &Inputs, ctx: &Context) -> Result<FuzzySet> {
        debug!("evaluating {} rules on {} inputs", self.rules.len(), inputs.len());

        self.rules.evaluate(&self.variables, inputs, ctx)
    }

    /// The defuzzified output of the system.
    ///
    /// With a numeric target and the centroid method, NaN means no rule fired.
    pub fn get_crisp_output(&self, inputs: &Inputs) -> Result<Value> {
        self.get_crisp_output_in(inputs, &self.context)
    }

    pub fn get_crisp_output_in(&self, inputs: &Inputs, ctx: &Context) -> Result<Value> {
        let output = self.get_output_in(inputs, ctx)?;
        let crisp = self.target().domain.defuzzify(&output, ctx.defuzzification, ctx)?;

        debug!("{} = {crisp}", self.target().name);

        Ok(crisp)
    }

    /// Crisp output for every row, in order. Rows are positional (aligned with
    /// [`Fis::inputs`]) or keyed by variable name.
    pub fn batch_predict<R: Into<Row>>(&self, rows: impl IntoIterator<Item = R>) -> Result<Vec<Value>> {
        rows.into_iter()
            .map(|row| match row.into() {
                Row::Named(inputs) => self.get_crisp_output(&inputs),
                Row::Positional(values) => self.get_crisp_output(&self.ordered_to_dict(values)?),
            })
            .collect()
    }

    /// Transforms an assignment into a row in the order of the input variables
    pub fn dict_to_ordered(&self, inputs: &Inputs) -> Result<Vec<Value>> {
        self.inputs().map(|var| inputs.get(&var.name).cloned()).collect()
    }

    fn ordered_to_dict(&self, values: Vec<Value>) -> Result<Inputs> {
        if values.len() != self.inputs.len() {
            return Err(Error::validation(format!(
                "row has {} values for {} input variables",
                values.len(),
                self.inputs.len()
            )));
        }

        Ok(self.inputs().map(|var| var.name.clone()).zip(values).collect())
    }

    pub fn to_description(&self) -> Result<FisDescription> {
        Ok(FisDescription {
            variables: self.inputs().cloned().collect(),
            rules: self.rules.describe(&self.variables)?,
            target: self.target().clone(),
            context: self.context,
        })
    }

    pub fn from_description(description: FisDescription) -> Result<Self> {
        let mut variables = Variables::new();
        let inputs = description
            .variables
            .into_iter()
            .map(|var| variables.add(var))
            .collect::<Result<Vec<_>>>()?;
        let target = variables.add(description.target)?;
        let rules = RuleSet::from_description(&description.rules, &variables)?;

        Ok(Fis::new(variables, inputs, rules, target)?.with_context(description.context))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_description()?)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Fis::from_description(serde_json::from_str(text)?)
    }

    /// Saves the description of the system as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);

        serde_json::to_writer_pretty(writer, &self.to_description()?)?;

        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);

        Fis::from_description(serde_json::from_reader(reader)?)
    }
}

impl fmt::Display for Fis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rules.describe(&self.variables) {
            Ok(rules) => write!(f, "{rules}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Structural dump of a [`Fis`], the unit of persistence.
///
/// Operator selections missing from a payload take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FisDescription {
    pub variables: Vec<FuzzyVariable>,
    pub rules: RuleSetDescription,
    pub target: FuzzyVariable,
    #[serde(flatten)]
    pub context: Context,
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::domain::Domain;
    use crate::ops::{AndOp, DefuzzificationOp, OrOp};
    use crate::rules::Rule;

    fn bank_loan() -> Fis {
        let mut vars = Variables::new();
        let score = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("score", 150., 200., 501usize).unwrap(),
                    [
                        ("high", FuzzySet::piecewise([(175., 0.), (180., 0.2), (185., 0.7), (190., 1.)]).unwrap()),
                        (
                            "low",
                            FuzzySet::piecewise([(155., 1.), (160., 0.8), (165., 0.5), (170., 0.2), (175., 0.)])
                                .unwrap(),
                        ),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        let ratio = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("ratio", 0.1, 1., 0.01).unwrap(),
                    [
                        ("good", FuzzySet::piecewise([(0.3, 1.), (0.4, 0.7), (0.41, 0.3), (0.42, 0.)]).unwrap()),
                        ("bad", FuzzySet::piecewise([(0.44, 0.), (0.45, 0.3), (0.5, 0.7), (0.7, 1.)]).unwrap()),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        let decision = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("decision", 0., 10., 101usize).unwrap(),
                    [
                        ("approve", FuzzySet::piecewise([(5., 0.), (6., 0.3), (7., 0.7), (8., 1.)]).unwrap()),
                        ("reject", FuzzySet::piecewise([(2., 1.), (3., 0.7), (4., 0.3), (5., 0.)]).unwrap()),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        let mut rules = RuleSet::new();

        rules.add(score.is("high").and(ratio.is("good")).then(decision.is("approve")).unwrap());
        rules.add(score.is("low").or(ratio.is("bad")).then(decision.is("reject")).unwrap());

        Fis::new(vars, vec![score, ratio], rules, decision).unwrap()
    }

    #[test]
    fn test_bank_loan() {
        let fis = bank_loan();
        let approve = fis
            .get_crisp_output(&Inputs::new().with("score", 190.).with("ratio", 0.39))
            .unwrap()
            .as_f64()
            .unwrap();
        let reject = fis
            .get_crisp_output(&Inputs::new().with("score", 160.).with("ratio", 0.6))
            .unwrap()
            .as_f64()
            .unwrap();

        assert!(approve > 5. && approve < 10., "{approve}");
        assert!(reject > 0. && reject < 5., "{reject}");
    }

    #[test]
    fn test_nothing_fires() {
        let fis = bank_loan();
        let crisp = fis
            .get_crisp_output(&Inputs::new().with("score", 175.).with("ratio", 0.43))
            .unwrap();

        assert!(crisp.as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_context_changes_results() {
        let fis = bank_loan();
        let inputs = Inputs::new().with("score", 182.).with("ratio", 0.405);
        let min = fis.get_crisp_output(&inputs).unwrap();
        let ctx = Context::default()
            .with_and(AndOp::Product)
            .with_defuzzification(DefuzzificationOp::Lom);
        let lom = fis.get_crisp_output_in(&inputs, &ctx).unwrap();

        assert_ne!(min, lom);
        assert!((lom.as_f64().unwrap() - 10.).abs() < 1e-9, "{lom}");
        assert_eq!(fis.get_crisp_output(&inputs).unwrap(), min);
    }

    #[test]
    fn test_batch_predict() {
        let fis = bank_loan();
        let positional = fis.batch_predict([vec![190., 0.39], vec![160., 0.6]]).unwrap();
        let named = fis
            .batch_predict([
                Inputs::new().with("score", 190.).with("ratio", 0.39),
                Inputs::new().with("ratio", 0.6).with("score", 160.),
            ])
            .unwrap();

        assert_eq!(positional, named);
        assert!(matches!(fis.batch_predict([vec![190.]]), Err(Error::Validation(_))));

        let ordered = fis
            .dict_to_ordered(&Inputs::new().with("ratio", 0.6).with("score", 160.))
            .unwrap();
        assert_eq!(ordered, vec![Value::Number(160.), Value::Number(0.6)]);
    }

    #[test]
    fn test_invalid_systems() {
        let mut vars = Variables::new();
        let x = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("x", 0., 1., 11usize).unwrap(),
                    [("small", FuzzySet::triangular(0., 0., 1.).unwrap())],
                )
                .unwrap(),
            )
            .unwrap();
        let y = vars
            .add(
                FuzzyVariable::new(
                    Domain::float("y", 0., 1., 11usize).unwrap(),
                    [("small", FuzzySet::triangular(0., 0., 1.).unwrap())],
                )
                .unwrap(),
            )
            .unwrap();

        let mut backwards = RuleSet::new();
        backwards.add(Rule::new(y.is("small"), x.is("small"), 1.).unwrap());
        assert!(matches!(
            Fis::new(vars.clone(), vec![x], backwards, y),
            Err(Error::Validation(_))
        ));

        let mut unknown = RuleSet::new();
        unknown.add(Rule::new(x.is("large"), y.is("small"), 1.).unwrap());
        assert!(matches!(Fis::new(vars.clone(), vec![x], unknown, y), Err(Error::Lookup(_))));

        let mut fine = RuleSet::new();
        fine.add(Rule::new(x.is("small"), y.is("small"), 1.).unwrap());
        assert!(Fis::new(vars, vec![x], fine, y).is_ok());
    }

    #[test]
    fn test_description_round_trip() {
        let fis = bank_loan().with_context(Context::default().with_or(OrOp::ProbSum));
        let description = fis.to_description().unwrap();
        let copy = Fis::from_description(description.clone()).unwrap();

        assert_eq!(copy.to_description().unwrap(), description);
        assert_eq!(copy.context().or, OrOp::ProbSum);

        let json = fis.to_json().unwrap();
        assert_eq!(Fis::from_json(&json).unwrap().to_description().unwrap(), description);
    }

    #[test]
    fn test_save_and_load() {
        let fis = bank_loan();
        let path = std::env::temp_dir().join(format!("mamdani-save-{}.json", std::process::id()));

        fis.save(&path).unwrap();
        let loaded = Fis::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.to_description().unwrap(), fis.to_description().unwrap());
        assert!(matches!(Fis::load(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_display() {
        let fis = bank_loan();

        assert_eq!(
            fis.to_string(),
            "if ((score is high) and (ratio is good)) then (decision is approve) [1.000000]\n\
             if ((score is low) or (ratio is bad)) then (decision is reject) [1.000000]"
        );
    }
}
