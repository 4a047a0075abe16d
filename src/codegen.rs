//! Rendering of a [`Fis`] as a self-contained C99 translation unit.
//!
//! The generated unit exposes two functions:
//!
//! - `double f(double <target>, double <inputs>...)`, the membership degree of
//!   `<target>` in the aggregated output;
//! - `double f_crisp(double min_val, double max_val, double steps, double <inputs>...)`,
//!   its centroid over the mesh the target domain samples (`steps` is a sample
//!   count or a step size, as in the domain).
//!
//! Operator choices are fixed from the system's context at generation time.
//! Compiling and linking are left to an external toolchain.

use std::fmt::Write;

use regex::Regex;

use crate::domain::{Domain, Steps};
use crate::dsl::Proposition;
use crate::error::{Error, Result};
use crate::inference::Fis;
use crate::ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp};
use crate::rules::Rule;
use crate::sets::FuzzySet;
use crate::variable::Variables;

const PRELUDE: &str = r"#include <math.h>

static double fz_lerp(double x, double x1, double y1, double x2, double y2)
{
    return x2 == x1 ? y2 : y1 + (x - x1) * (y2 - y1) / (x2 - x1);
}

static double fz_triangular(double x, double a, double b, double c)
{
    if (x < a || x > c)
        return 0.0;
    if (x < b)
        return b == a ? 1.0 : (x - a) / (b - a);
    return c == b ? 1.0 : (c - x) / (c - b);
}

static double fz_trapezoidal(double x, double a, double b, double c, double d)
{
    if (x < a || x > d)
        return 0.0;
    if (x < b)
        return b == a ? 1.0 : (x - a) / (b - a);
    if (x <= c)
        return 1.0;
    return (d - x) / (d - c);
}

static double fz_gaussian(double x, double a, double c)
{
    return exp(-pow((x - c) / a, 2) / 2.0);
}

static double fz_gaussian2(double x, double a1, double c1, double a2, double c2)
{
    if (x < c1)
        return fz_gaussian(x, a1, c1);
    if (x > c2)
        return fz_gaussian(x, a2, c2);
    return 1.0;
}

static double fz_bell(double x, double a, double b, double c)
{
    return 1.0 / (1.0 + pow(fabs((x - c) / a), 2.0 * b));
}

static double fz_sigmoid(double x, double a, double c)
{
    return 1.0 / (1.0 + exp(-a * (x - c)));
}

static double fz_s_shaped(double x, double a, double b)
{
    if (x < a)
        return 0.0;
    if (x >= b)
        return 1.0;
    if (x <= (a + b) / 2.0)
        return 2.0 * pow((x - a) / (b - a), 2);
    return 1.0 - 2.0 * pow((x - b) / (b - a), 2);
}
";

/// Names the generated code uses for its own parameters and locals, and the
/// `math.h` functions it calls
const RESERVED: &[&str] = &[
    "min_val", "max_val", "steps", "step", "n", "i", "x", "mu", "num", "den", "double", "int", "return", "if", "else",
    "for", "while", "static", "const", "fmin", "fmax", "exp", "pow", "fabs", "ceil",
];

/// Renders `fis` as C source, naming the membership function `function_name`
/// and the crisp one `<function_name>_crisp`.
///
/// Only numeric variables and the centroid method can be generated.
pub fn to_c(fis: &Fis, function_name: &str) -> Result<String> {
    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| Error::config(e.to_string()))?;
    let check_name = |name: &str| {
        if identifier.is_match(name) && !RESERVED.contains(&name) && !name.starts_with("fz_") {
            Ok(())
        } else {
            Err(Error::config(format!("{name} is not usable as a C identifier")))
        }
    };

    check_name(function_name)?;

    let crisp_name = format!("{function_name}_crisp");
    let check_variable = |name: &str| {
        if name == function_name || name == crisp_name {
            return Err(Error::config(format!("variable {name} would shadow a generated function")));
        }
        check_name(name)
    };

    let ctx = fis.context();

    if ctx.defuzzification != DefuzzificationOp::Centroid {
        return Err(Error::config(format!(
            "only centroid defuzzification can be generated, not {}",
            ctx.defuzzification
        )));
    }

    let target = fis.target();
    let Domain::Float(target_domain) = &target.domain else {
        return Err(Error::config(format!(
            "target {} is categorical, which cannot be generated",
            target.name
        )));
    };

    check_variable(&target.name)?;

    let mut inputs = Vec::new();

    for var in fis.inputs() {
        if !matches!(var.domain, Domain::Float(_)) {
            return Err(Error::config(format!(
                "input {} is categorical, which cannot be generated",
                var.name
            )));
        }
        check_variable(&var.name)?;
        inputs.push(var.name.as_str());
    }

    let generator = Generator {
        vars: fis.variables(),
        and: ctx.and,
        or: ctx.or,
        implication: ctx.implication,
    };
    let rules = fis
        .rules()
        .iter()
        .map(|rule| generator.rule(rule, &target.name))
        .collect::<Result<Vec<_>>>()?;
    let body = if rules.is_empty() {
        "0.0".to_owned()
    } else {
        or_expr(ctx.aggregation, &rules)
    };

    let typed = inputs.iter().map(|name| format!(", double {name}")).collect::<String>();
    let listed = inputs.iter().map(|name| format!(", {name}")).collect::<String>();
    // A counted mesh ends on max_val exactly, a stepped one stops below it
    let (mesh, point) = match target_domain.steps {
        Steps::Count(_) => (
            "    int n = (int) steps;\n    \
             double step = n > 1 ? (max_val - min_val) / (n - 1) : 0.0;\n",
            "n > 1 && i == n - 1 ? max_val : min_val + step * i",
        ),
        Steps::Size(_) => (
            "    int n = (int) ceil((max_val - min_val) / steps);\n    \
             double step = steps;\n",
            "min_val + step * i",
        ),
    };

    let mut out = String::from(PRELUDE);

    // Writing into a String cannot fail
    let _ = write!(
        out,
        "\ndouble {function_name}(double {target}{typed})\n{{\n    return {body};\n}}\n\n\
         double {function_name}_crisp(double min_val, double max_val, double steps{typed})\n{{\n\
         {mesh}    double num = 0.0, den = 0.0;\n    int i;\n\n    \
         for (i = 0; i < n; i++) {{\n        \
         double x = {point};\n        \
         double mu = {function_name}(x{listed});\n        \
         num += x * mu;\n        den += mu;\n    }}\n\n    \
         return num / den;\n}}\n",
        target = target.name,
    );

    Ok(out)
}

struct Generator<'v> {
    vars: &'v Variables,
    and: AndOp,
    or: OrOp,
    implication: ImplicationOp,
}

impl Generator<'_> {
    fn rule(&self, rule: &Rule, target: &str) -> Result<String> {
        let degree = self.proposition(&rule.antecedent)?;
        let set = set_expr(self.vars.get(rule.consequent)?.get(&rule.value)?, target, self.and, self.or)?;
        let implied = match self.implication {
            ImplicationOp::Min => format!("fmin({degree}, {set})"),
            ImplicationOp::Prod => format!("({degree}) * ({set})"),
        };

        Ok(if rule.weight == 1. {
            implied
        } else {
            format!("{:?} * ({implied})", rule.weight)
        })
    }

    fn proposition(&self, prop: &Proposition) -> Result<String> {
        Ok(match prop {
            Proposition::Is(var, label) => {
                let var = self.vars.get(*var)?;
                set_expr(var.get(label)?, &var.name, self.and, self.or)?
            },
            Proposition::IsNot(var, label) => {
                let var = self.vars.get(*var)?;
                format!("1.0 - ({})", set_expr(var.get(label)?, &var.name, self.and, self.or)?)
            },
            Proposition::Not(prop) => format!("1.0 - ({})", self.proposition(prop)?),
            Proposition::And(props) => and_expr(self.and, &self.all(props)?),
            Proposition::Or(props) => or_expr(self.or, &self.all(props)?),
        })
    }

    fn all(&self, props: &[Proposition]) -> Result<Vec<String>> {
        props.iter().map(|p| self.proposition(p)).collect()
    }
}

/// C expression for the degree of `x` in `set`. Unset n-ary operators take `and` / `or`.
fn set_expr(set: &FuzzySet, x: &str, and: AndOp, or: OrOp) -> Result<String> {
    let expr = match set {
        FuzzySet::Singleton { x: x0 } => {
            let x0 = x0
                .as_f64()
                .ok_or_else(|| Error::config("labelled singletons cannot be generated"))?;
            format!("({x} == {x0:?} ? 1.0 : 0.0)")
        },
        FuzzySet::Discrete { d } => {
            let mut expr = "0.0".to_owned();

            for (key, degree) in d.iter().rev() {
                let key: f64 = key
                    .trim()
                    .parse()
                    .map_err(|_| Error::config(format!("discrete key {key} cannot be generated")))?;
                expr = format!("({x} == {key:?} ? {degree:?} : {expr})");
            }
            expr
        },
        FuzzySet::Constant { value } => format!("{value:?}"),
        FuzzySet::Triangular { a, b, c } => format!("fz_triangular({x}, {a:?}, {b:?}, {c:?})"),
        FuzzySet::Trapezoidal { a, b, c, d } => format!("fz_trapezoidal({x}, {a:?}, {b:?}, {c:?}, {d:?})"),
        FuzzySet::Gaussian { a, c } => format!("fz_gaussian({x}, {a:?}, {c:?})"),
        FuzzySet::Gaussian2 { a1, c1, a2, c2 } => format!("fz_gaussian2({x}, {a1:?}, {c1:?}, {a2:?}, {c2:?})"),
        FuzzySet::Bell { a, b, c } => format!("fz_bell({x}, {a:?}, {b:?}, {c:?})"),
        FuzzySet::Sigmoid { a, c } => format!("fz_sigmoid({x}, {a:?}, {c:?})"),
        FuzzySet::SigmoidProduct { a1, c1, a2, c2 } => {
            format!("fz_sigmoid({x}, {a1:?}, {c1:?}) * fz_sigmoid({x}, {a2:?}, {c2:?})")
        },
        FuzzySet::SigmoidDifference { a1, c1, a2, c2 } => format!(
            "fmin(1.0, fmax(0.0, fz_sigmoid({x}, {a1:?}, {c1:?}) - fz_sigmoid({x}, {a2:?}, {c2:?})))"
        ),
        FuzzySet::SShaped { a, b } => format!("fz_s_shaped({x}, {a:?}, {b:?})"),
        FuzzySet::ZShaped { a, b } => format!("1.0 - fz_s_shaped({x}, {a:?}, {b:?})"),
        FuzzySet::PiShaped { a, b, c, d } => {
            format!("fz_s_shaped({x}, {a:?}, {b:?}) * (1.0 - fz_s_shaped({x}, {c:?}, {d:?}))")
        },
        FuzzySet::Piecewise { points } => {
            let Some(((x_first, y_first), (_, y_last))) = points.first().zip(points.last()) else {
                return Err(Error::config("empty piecewise set"));
            };
            let mut expr = format!("{y_last:?}");

            for w in points.windows(2).rev() {
                let ((x1, y1), (x2, y2)) = (w[0], w[1]);
                expr = format!("{x} <= {x2:?} ? fz_lerp({x}, {x1:?}, {y1:?}, {x2:?}, {y2:?}) : {expr}");
            }
            format!("({x} < {x_first:?} ? {y_first:?} : {expr})")
        },
        FuzzySet::Not { set } => format!("1.0 - ({})", set_expr(set, x, and, or)?),
        FuzzySet::Scale { set, k } => format!("{k:?} * ({})", set_expr(set, x, and, or)?),
        FuzzySet::Implication { method, degree, set } => {
            let inner = set_expr(set, x, and, or)?;
            match method {
                ImplicationOp::Min => format!("fmin({degree:?}, {inner})"),
                ImplicationOp::Prod => format!("{degree:?} * ({inner})"),
            }
        },
        FuzzySet::Or { method, sets } => or_expr(
            method.unwrap_or(or),
            &sets.iter().map(|s| set_expr(s, x, and, or)).collect::<Result<Vec<_>>>()?,
        ),
        FuzzySet::And { method, sets } => and_expr(
            method.unwrap_or(and),
            &sets.iter().map(|s| set_expr(s, x, and, or)).collect::<Result<Vec<_>>>()?,
        ),
    };

    Ok(format!("({expr})"))
}

/// Left fold of two-argument C calls: `f(f(a, b), c)`
fn nest(func: &str, operands: &[String]) -> String {
    let mut iter = operands.iter();
    let first = iter.next().cloned().unwrap_or_default();

    iter.fold(first, |acc, e| format!("{func}({acc}, {e})"))
}

fn or_expr(op: OrOp, operands: &[String]) -> String {
    match op {
        OrOp::Max => nest("fmax", operands),
        OrOp::ProbSum => format!(
            "1.0 - {}",
            operands.iter().map(|e| format!("(1.0 - {e})")).collect::<Vec<_>>().join(" * ")
        ),
        OrOp::BoundedSum => format!("fmin(1.0, {})", operands.join(" + ")),
    }
}

fn and_expr(op: AndOp, operands: &[String]) -> String {
    match op {
        AndOp::Min => nest("fmin", operands),
        AndOp::Product => operands
            .iter()
            .map(|e| format!("({e})"))
            .collect::<Vec<_>>()
            .join(" * "),
        AndOp::Lukasiewicz => format!("fmax(0.0, {} - {:?})", operands.join(" + "), (operands.len() - 1) as f64),
    }
}
