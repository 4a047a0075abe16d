//! Import of MATLAB-style `.fis` descriptions.
//!
//! The format is INI-like:
//!
//! ```text
//! [System]
//! Type='mamdani'
//! NumInputs=1
//! NumOutputs=1
//! AndMethod='min'
//!
//! [Input1]
//! Name='service'
//! Range=[0 10]
//! NumMFs=2
//! MF1='poor':'gaussmf',[1.5 0]
//! MF2='good':'gaussmf',[1.5 10]
//!
//! [Output1]
//! ...
//!
//! [Rules]
//! 1, 1 (1) : 1
//! ```
//!
//! Rules list one signed, one-based label index per input followed by the
//! output label index, the weight in parentheses and the connective (`1` for
//! and, `2` for or). A negative index negates the valuation and `0` leaves the
//! input out of the rule.

use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::context::Context;
use crate::domain::{Domain, Steps};
use crate::dsl::Proposition;
use crate::error::{Error, Result};
use crate::inference::Fis;
use crate::ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp};
use crate::rules::{Rule, RuleSet};
use crate::sets::FuzzySet;
use crate::variable::{FuzzyVariable, Variable, Variables};

/// Sample count used for numeric domains when none is given
pub const DEFAULT_STEPS: usize = 100;

/// Reads a `.fis` file. See [`parse_fis`].
pub fn read_fis(path: impl AsRef<Path>, steps: impl Into<Steps>) -> Result<Fis> {
    parse_fis(&fs::read_to_string(path)?, steps)
}

/// Builds a system from the text of a `.fis` description, sampling every
/// numeric domain with `steps`.
pub fn parse_fis(text: &str, steps: impl Into<Steps>) -> Result<Fis> {
    let steps = steps.into();
    let patterns = Patterns::new()?;
    let sections = parse_sections(text, &patterns)?;
    let system = section(&sections, "System")?;

    let kind = unquote(system.get("type")?);
    if !kind.eq_ignore_ascii_case("mamdani") {
        return Err(Error::config(format!("unsupported inference type: {kind}")));
    }

    let num_outputs: usize = parse_number(system.get("numoutputs")?)?;
    if num_outputs != 1 {
        return Err(Error::config(format!(
            "only systems with one output are supported, found {num_outputs}"
        )));
    }

    let num_inputs: usize = parse_number(system.get("numinputs")?)?;
    let context = parse_context(system)?;
    let mut variables = Variables::new();

    let inputs = (1..=num_inputs)
        .map(|i| {
            let var = parse_variable(section(&sections, &format!("Input{i}"))?, steps, &patterns)?;
            variables.add(var)
        })
        .collect::<Result<Vec<_>>>()?;
    let target = variables.add(parse_variable(section(&sections, "Output1")?, steps, &patterns)?)?;

    let mut rules = RuleSet::new();

    if let Ok(lines) = section(&sections, "Rules") {
        for (line, operator) in &lines.entries {
            rules.add(parse_rule(line, operator, &variables, &inputs, target, &patterns)?);
        }
    }

    debug!(
        "parsed a system with {} inputs and {} rules",
        inputs.len(),
        rules.len()
    );

    Ok(Fis::new(variables, inputs, rules, target)?.with_context(context))
}

struct Patterns {
    section: Regex,
    mf: Regex,
    rule: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        let compile = |re: &str| Regex::new(re).map_err(|e| Error::config(e.to_string()));

        Ok(Self {
            section: compile(r"^\[(.+)\]$")?,
            mf: compile(r"^'(.*)'\s*:\s*'(.*)'\s*,\s*\[(.*)\]$")?,
            rule: compile(r"^\s*(.*?),\s*(.*?)\s*\((.*)\)\s*$")?,
        })
    }
}

struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| Error::config(format!("section [{}] has no key {key}", self.name)))
    }
}

fn parse_sections(text: &str, patterns: &Patterns) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();

    for raw in text.lines() {
        let line = raw.split('%').next().unwrap_or_default().trim();

        if line.is_empty() {
            continue;
        }

        if let Some(caps) = patterns.section.captures(line) {
            sections.push(Section {
                name: caps[1].trim().to_owned(),
                entries: Vec::new(),
            });
            continue;
        }

        let Some(current) = sections.last_mut() else {
            return Err(Error::config(format!("entry outside of any section: {line}")));
        };
        let Some(split) = line.find(['=', ':']) else {
            return Err(Error::config(format!("malformed entry in [{}]: {line}", current.name)));
        };
        let (key, value) = line.split_at(split);

        current
            .entries
            .push((key.trim().to_lowercase(), value[1..].trim().to_owned()));
    }

    debug!(
        "sections: {:?}",
        sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
    );

    Ok(sections)
}

fn section<'s>(sections: &'s [Section], name: &str) -> Result<&'s Section> {
    sections
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::config(format!("missing section [{name}]")))
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('\'')
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T> {
    unquote(value)
        .parse()
        .map_err(|_| Error::config(format!("not a number: {value}")))
}

fn parse_numbers(list: &str) -> Result<Vec<f64>> {
    list.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .map(parse_number)
        .collect()
}

fn parse_context(system: &Section) -> Result<Context> {
    fn method(system: &Section, key: &str) -> Option<String> {
        system.get(key).ok().map(|v| unquote(v).to_lowercase())
    }

    let mut ctx = Context::default();

    if let Some(and) = method(system, "andmethod") {
        ctx.and = match and.as_str() {
            "min" => AndOp::Min,
            "prod" => AndOp::Product,
            _ => return Err(Error::config(format!("unsupported AND method: {and}"))),
        };
    }
    if let Some(or) = method(system, "ormethod") {
        ctx.or = match or.as_str() {
            "max" => OrOp::Max,
            "probor" => OrOp::ProbSum,
            _ => return Err(Error::config(format!("unsupported OR method: {or}"))),
        };
    }
    if let Some(imp) = method(system, "impmethod") {
        ctx.implication = match imp.as_str() {
            "min" => ImplicationOp::Min,
            "prod" => ImplicationOp::Prod,
            _ => return Err(Error::config(format!("unsupported implication method: {imp}"))),
        };
    }
    if let Some(agg) = method(system, "aggmethod") {
        ctx.aggregation = match agg.as_str() {
            "max" => OrOp::Max,
            "probor" => OrOp::ProbSum,
            "sum" => OrOp::BoundedSum,
            _ => return Err(Error::config(format!("unsupported aggregation method: {agg}"))),
        };
    }
    if let Some(defuzz) = method(system, "defuzzmethod") {
        // The tags coincide with ours
        ctx.defuzzification = defuzz.parse::<DefuzzificationOp>()?;
    }

    Ok(ctx)
}

fn parse_variable(section: &Section, steps: Steps, patterns: &Patterns) -> Result<FuzzyVariable> {
    let name = unquote(section.get("name")?).to_owned();
    let range = parse_numbers(section.get("range")?)?;
    let &[min, max] = range.as_slice() else {
        return Err(Error::config(format!("range of {name} must have two bounds: {range:?}")));
    };
    let num_mfs: usize = parse_number(section.get("nummfs")?)?;
    let mut values = Vec::with_capacity(num_mfs);

    for j in 1..=num_mfs {
        let (label, set) = parse_mf(section.get(&format!("mf{j}"))?, patterns)?;

        if values.iter().any(|(l, _)| *l == label) {
            return Err(Error::validation(format!("variable {name} repeats value {label}")));
        }
        values.push((label, set));
    }

    FuzzyVariable::with_name(name.clone(), Domain::float(name, min, max, steps)?, values)
}

fn parse_mf(description: &str, patterns: &Patterns) -> Result<(String, FuzzySet)> {
    let caps = patterns
        .mf
        .captures(description)
        .ok_or_else(|| Error::config(format!("malformed membership function: {description}")))?;
    let label = caps[1].to_owned();
    let kind = &caps[2];
    let params = parse_numbers(&caps[3])?;

    let arity = |n: usize| {
        if params.len() == n {
            Ok(())
        } else {
            Err(Error::config(format!(
                "{kind} takes {n} parameters, got {}",
                params.len()
            )))
        }
    };

    let set = match kind {
        "trimf" => {
            arity(3)?;
            FuzzySet::triangular(params[0], params[1], params[2])
        },
        "trapmf" => {
            arity(4)?;
            FuzzySet::trapezoidal(params[0], params[1], params[2], params[3])
        },
        "gaussmf" => {
            arity(2)?;
            FuzzySet::gaussian(params[0], params[1])
        },
        "gauss2mf" => {
            arity(4)?;
            FuzzySet::gaussian2(params[0], params[1], params[2], params[3])
        },
        "gbellmf" => {
            arity(3)?;
            FuzzySet::bell(params[0], params[1], params[2])
        },
        "sigmf" => {
            arity(2)?;
            FuzzySet::sigmoid(params[0], params[1])
        },
        "psigmf" => {
            arity(4)?;
            FuzzySet::sigmoid_product(params[0], params[1], params[2], params[3])
        },
        "dsigmf" => {
            arity(4)?;
            FuzzySet::sigmoid_difference(params[0], params[1], params[2], params[3])
        },
        "smf" => {
            arity(2)?;
            FuzzySet::s_shaped(params[0], params[1])
        },
        "zmf" => {
            arity(2)?;
            FuzzySet::z_shaped(params[0], params[1])
        },
        "pimf" => {
            arity(4)?;
            FuzzySet::pi_shaped(params[0], params[1], params[2], params[3])
        },
        _ => return Err(Error::config(format!("unknown membership function: {kind}"))),
    }?;

    Ok((label, set))
}

/// The valuation of `var` a signed one-based index stands for
fn valuation(vars: &Variables, var: Variable, index: i64) -> Result<Proposition> {
    let position = usize::try_from(index.unsigned_abs() - 1)
        .map_err(|_| Error::config(format!("value index out of range: {index}")))?;
    let label = vars.get(var)?.label_at(position)?;

    Ok(if index > 0 {
        var.is(label)
    } else {
        var.is_not(label)
    })
}

fn parse_rule(
    line: &str,
    operator: &str,
    vars: &Variables,
    inputs: &[Variable],
    target: Variable,
    patterns: &Patterns,
) -> Result<Rule> {
    let caps = patterns
        .rule
        .captures(line)
        .ok_or_else(|| Error::config(format!("malformed rule: {line}")))?;
    let indices = caps[1]
        .split_whitespace()
        .map(parse_number::<i64>)
        .collect::<Result<Vec<_>>>()?;
    let output: i64 = parse_number(&caps[2])?;
    let weight: f64 = parse_number(&caps[3])?;

    if indices.len() != inputs.len() {
        return Err(Error::validation(format!(
            "rule {line} has {} indices for {} inputs",
            indices.len(),
            inputs.len()
        )));
    }

    let props = inputs
        .iter()
        .zip(indices)
        .filter(|(_, index)| *index != 0)
        .map(|(var, index)| valuation(vars, *var, index))
        .collect::<Result<Vec<_>>>()?;

    if props.is_empty() {
        return Err(Error::validation(format!("rule {line} involves no input")));
    }

    let antecedent = match operator.trim() {
        "1" => Proposition::And(props),
        "2" => Proposition::Or(props),
        op => return Err(Error::config(format!("unknown rule connective: {op}"))),
    };

    if output <= 0 {
        return Err(Error::validation(format!(
            "rule {line} must conclude on a positive output index"
        )));
    }

    Rule::new(antecedent, valuation(vars, target, output)?, weight)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::domain::Value;
    use crate::inputs::Inputs;

    const TANK: &str = "\
[System]
Name='tank'
Type='mamdani'   % the only supported kind
NumInputs=2
NumOutputs=1
AndMethod='prod'
OrMethod='probor'
ImpMethod='min'
AggMethod='sum'
DefuzzMethod='mom'

[Input1]
Name='level'
Range=[-1 1]
NumMFs=3
MF1='high':'gaussmf',[0.3 -1]
MF2='okay':'gaussmf',[0.3 0]
MF3='low':'gaussmf',[0.3 1]

[Input2]
Name='rate'
Range=[-0.1 0.1]
NumMFs=3
MF1='negative':'gaussmf',[0.03 -0.1]
MF2='none':'gaussmf',[0.03 0]
MF3='positive':'gaussmf',[0.03 0.1]

[Output1]
Name='valve'
Range=[-1 1]
NumMFs=5
MF1='close_fast':'trimf',[-1 -0.9 -0.8]
MF2='close_slow':'trimf',[-0.6 -0.5 -0.4]
MF3='no_change':'trimf',[-0.1 0 0.1]
MF4='open_slow':'trimf',[0.2 0.3 0.4]
MF5='open_fast':'trimf',[0.8 0.9 1]

[Rules]
2 0, 3 (1) : 1
3 0, 5 (1) : 1
1 0, 1 (1) : 1
2 3, 2 (1) : 1
2 -1, 4 (0.5) : 1
";

    #[test]
    fn test_parse_tank() {
        let fis = parse_fis(TANK, 201usize).unwrap();
        let ctx = fis.context();

        assert_eq!(ctx.and, AndOp::Product);
        assert_eq!(ctx.or, OrOp::ProbSum);
        assert_eq!(ctx.aggregation, OrOp::BoundedSum);
        assert_eq!(ctx.defuzzification, DefuzzificationOp::Mom);
        assert_eq!(fis.inputs().map(|v| v.name.as_str()).collect::<Vec<_>>(), ["level", "rate"]);
        assert_eq!(fis.target().labels().count(), 5);
        assert_eq!(fis.rules().len(), 5);
        assert_eq!(
            fis.to_string().lines().nth(4).unwrap(),
            "if ((level is okay) and (rate is not negative)) then (valve is open_slow) [0.500000]"
        );

        let crisp = fis
            .get_crisp_output(&Inputs::new().with("level", 0.).with("rate", 0.))
            .unwrap();
        assert!(crisp.as_f64().unwrap().abs() < 1e-9, "{crisp}");
    }

    #[test]
    fn test_unsupported_systems() {
        let sugeno = TANK.replace("'mamdani'", "'sugeno'");
        assert!(matches!(parse_fis(&sugeno, 100usize), Err(Error::Config(_))));

        let two_outputs = TANK.replace("NumOutputs=1", "NumOutputs=2");
        assert!(matches!(parse_fis(&two_outputs, 100usize), Err(Error::Config(_))));

        let unknown_mf = TANK.replace("'trimf',[-0.1 0 0.1]", "'foomf',[-0.1 0 0.1]");
        assert!(matches!(parse_fis(&unknown_mf, 100usize), Err(Error::Config(_))));

        let bad_method = TANK.replace("AndMethod='prod'", "AndMethod='lukasiewicz'");
        assert!(matches!(parse_fis(&bad_method, 100usize), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_rules() {
        let short = TANK.replace("2 -1, 4 (0.5) : 1", "2, 4 (0.5) : 1");
        assert!(matches!(parse_fis(&short, 100usize), Err(Error::Validation(_))));

        let out_of_range = TANK.replace("2 -1, 4 (0.5) : 1", "2 -4, 4 (0.5) : 1");
        assert!(matches!(parse_fis(&out_of_range, 100usize), Err(Error::Lookup(_))));

        let heavy = TANK.replace("2 -1, 4 (0.5) : 1", "2 -1, 4 (1.5) : 1");
        assert!(matches!(parse_fis(&heavy, 100usize), Err(Error::Validation(_))));
    }

    #[test]
    fn test_methods_default() {
        let minimal = "\
[System]
Type='mamdani'
NumInputs=1
NumOutputs=1

[Input1]
Name='x'
Range=[0 1]
NumMFs=1
MF1='small':'zmf',[0 1]

[Output1]
Name='y'
Range=[0 1]
NumMFs=1
MF1='small':'trapmf',[0 0 0.2 0.4]

[Rules]
1, 1 (1) : 1
";
        let fis = parse_fis(minimal, DEFAULT_STEPS).unwrap();

        assert_eq!(*fis.context(), Context::default());
        assert!(matches!(
            fis.get_crisp_output(&Inputs::new().with("x", 0.)).unwrap(),
            Value::Number(y) if y > 0. && y < 0.4
        ));
    }
}
