use std::thread;

use mamdani::{
    Context, DefuzzificationOp, Domain, Error, Fis, FuzzySet, FuzzyVariable, ImplicationOp, Inputs, OrOp, RuleSet,
    Value, Variables,
};
use test_log::test;

fn tipping() -> Fis {
    let mut vars = Variables::new();
    let service = vars
        .add(
            FuzzyVariable::new(
                Domain::float("service", 0., 10., 100usize).unwrap(),
                [
                    ("poor", FuzzySet::gaussian(1.5, 0.).unwrap()),
                    ("good", FuzzySet::gaussian(1.5, 5.).unwrap()),
                    ("excellent", FuzzySet::gaussian(1.5, 10.).unwrap()),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let food = vars
        .add(
            FuzzyVariable::new(
                Domain::float("food", 0., 10., 100usize).unwrap(),
                [
                    ("rancid", FuzzySet::trapezoidal(0., 0., 1., 3.).unwrap()),
                    ("delicious", FuzzySet::trapezoidal(7., 9., 10., 10.).unwrap()),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let tip = vars
        .add(
            FuzzyVariable::new(
                Domain::float("tip", 0., 30., 100usize).unwrap(),
                [
                    ("cheap", FuzzySet::triangular(0., 5., 10.).unwrap()),
                    ("average", FuzzySet::triangular(10., 15., 20.).unwrap()),
                    ("generous", FuzzySet::triangular(20., 25., 30.).unwrap()),
                ],
            )
            .unwrap(),
        )
        .unwrap();

    let mut rules = RuleSet::new();

    rules.add((service.is("poor") | food.is("rancid")).then(tip.is("cheap")).unwrap());
    rules.add(service.is("good").then(tip.is("average")).unwrap());
    rules.add((service.is("excellent") | food.is("delicious")).then(tip.is("generous")).unwrap());

    Fis::new(vars, vec![service, food], rules, tip).unwrap()
}

fn crisp(fis: &Fis, service: f64, food: f64) -> f64 {
    fis.get_crisp_output(&Inputs::new().with("service", service).with("food", food))
        .unwrap()
        .as_f64()
        .unwrap()
}

#[test]
fn test_average_service() {
    let tip = crisp(&tipping(), 5., 5.);

    assert!(tip.is_finite() && tip > 0. && tip < 30., "{tip}");
    assert!((tip - 15.).abs() < 1e-6, "{tip}");
}

#[test]
fn test_tips_follow_service() {
    let fis = tipping();
    let bad = crisp(&fis, 1., 2.);
    let great = crisp(&fis, 9., 9.);

    assert!(bad < 10., "{bad}");
    assert!(great > 20., "{great}");
}

#[test]
fn test_missing_input() {
    let fis = tipping();

    assert!(matches!(
        fis.get_crisp_output(&Inputs::new().with("service", 5.)),
        Err(Error::Lookup(_))
    ));
}

#[test]
fn test_output_set() {
    let fis = tipping();
    let output = fis
        .get_output(&Inputs::new().with("service", 5.).with("food", 5.))
        .unwrap();

    assert_eq!(output.membership(15.), 1.);
    assert_eq!(output.membership(30.), 0.);
    assert!(output.membership(5.) < 0.01);
}

#[test]
fn test_bounded_sum_aggregation() {
    let mut vars = Variables::new();
    let temp = vars
        .add(
            FuzzyVariable::new(
                Domain::float("temp", 0., 20., 21usize).unwrap(),
                [("warm", FuzzySet::triangular(0., 10., 20.).unwrap())],
            )
            .unwrap(),
        )
        .unwrap();
    let fan = vars
        .add(
            FuzzyVariable::new(
                Domain::float("fan", 0., 1., 11usize).unwrap(),
                [
                    ("on", FuzzySet::triangular(0., 1., 1.).unwrap()),
                    ("full", FuzzySet::trapezoidal(0., 0., 1., 1.).unwrap()),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let mut rules = RuleSet::new();

    rules.add(temp.is("warm").then(fan.is("on")).unwrap());
    rules.add(temp.is("warm").then(fan.is("full")).unwrap());

    let fis = Fis::new(vars, vec![temp], rules, fan).unwrap();
    let inputs = Inputs::new().with("temp", 7.);
    let at_one = |ctx: &Context| {
        fis.get_output_in(&inputs, ctx)
            .unwrap()
            .evaluate(&Value::Number(1.), ctx)
    };

    assert!((at_one(&Context::default()) - 0.7).abs() < 1e-12);
    assert_eq!(at_one(&Context::default().with_aggregation(OrOp::BoundedSum)), 1.);
    assert!((at_one(&Context::default().with_aggregation(OrOp::ProbSum)) - 0.91).abs() < 1e-12);
}

#[test]
fn test_contexts_across_threads() {
    let fis = tipping();
    let contexts = [
        Context::default(),
        Context::default().with_implication(ImplicationOp::Prod),
        Context::default().with_defuzzification(DefuzzificationOp::Bisector),
        Context::default().with_aggregation(OrOp::ProbSum),
    ];
    let inputs = Inputs::new().with("service", 3.).with("food", 8.);
    let expected: Vec<Value> = contexts
        .iter()
        .map(|ctx| fis.get_crisp_output_in(&inputs, ctx).unwrap())
        .collect();

    let (shared, shared_inputs) = (&fis, &inputs);
    let results: Vec<Value> = thread::scope(|s| {
        let handles: Vec<_> = contexts
            .iter()
            .map(|ctx| s.spawn(move || shared.get_crisp_output_in(shared_inputs, ctx).unwrap()))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, expected);
    assert_eq!(*fis.context(), Context::default());
}

#[test]
fn test_json_round_trip() {
    let fis = tipping().with_context(Context::default().with_aggregation(OrOp::BoundedSum));
    let json = fis.to_json().unwrap();
    let copy = Fis::from_json(&json).unwrap();

    assert_eq!(copy.to_description().unwrap(), fis.to_description().unwrap());
    assert_eq!(crisp(&copy, 2., 7.), crisp(&fis, 2., 7.));

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["aggregation"], "bsum");
    assert_eq!(value["AND"], "min");
    assert_eq!(value["target"]["domain"]["type"], "FloatDomain");
    assert_eq!(value["rules"]["rule_list"][0]["antecedent"]["type"], "or");
}

#[test]
fn test_hand_written_description() {
    let json = r#"{
        "variables": [{
            "name": "x",
            "domain": {"type": "FloatDomain", "name": "x", "min": 0.0, "max": 1.0, "steps": 11},
            "values": {"low": {"type": "z_shaped", "a": 0.0, "b": 1.0}}
        }],
        "rules": {"rule_list": [{
            "antecedent": {"type": "is", "variable": "x", "value": "low"},
            "consequent": {"type": "is", "variable": "y", "value": "low"}
        }]},
        "target": {
            "name": "y",
            "domain": {"type": "FloatDomain", "name": "y", "min": 0.0, "max": 1.0, "steps": 0.1},
            "values": {"low": {"type": "triangular", "a": 0.0, "b": 0.0, "c": 0.5}}
        },
        "OR": "psum"
    }"#;
    let fis = Fis::from_json(json).unwrap();

    assert_eq!(fis.context().or, OrOp::ProbSum);
    assert_eq!(fis.context().defuzzification, DefuzzificationOp::Centroid);
    assert_eq!(fis.rules().iter().next().unwrap().weight(), 1.);

    let unknown_tag = json.replace("psum", "maximum");
    assert!(matches!(Fis::from_json(&unknown_tag), Err(Error::Config(_))));

    let unknown_set = json.replace("z_shaped", "wavy");
    assert!(matches!(Fis::from_json(&unknown_set), Err(Error::Config(_))));

    let backwards = json.replace(r#""a": 0.0, "b": 0.0, "c": 0.5"#, r#""a": 0.5, "b": 0.0, "c": 0.0"#);
    assert!(matches!(Fis::from_json(&backwards), Err(Error::Validation(_))));
}
