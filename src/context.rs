use serde::{Deserialize, Serialize};

use crate::ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp};

/// Which operator of each family is active while evaluating a system.
///
/// Propositions and sets carry no operator choice of their own (n-ary set
/// operators may, optionally), so every evaluation takes the context it runs
/// under as an explicit parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub defuzzification: DefuzzificationOp,
    pub aggregation: OrOp,
    pub implication: ImplicationOp,
    #[serde(rename = "AND")]
    pub and: AndOp,
    #[serde(rename = "OR")]
    pub or: OrOp,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defuzzification(mut self, op: DefuzzificationOp) -> Self {
        self.defuzzification = op;
        self
    }

    pub fn with_aggregation(mut self, op: OrOp) -> Self {
        self.aggregation = op;
        self
    }

    pub fn with_implication(mut self, op: ImplicationOp) -> Self {
        self.implication = op;
        self
    }

    pub fn with_and(mut self, op: AndOp) -> Self {
        self.and = op;
        self
    }

    pub fn with_or(mut self, op: OrOp) -> Self {
        self.or = op;
        self
    }
}

#[test]
fn test_missing_fields_default() {
    let ctx: Context = serde_json::from_str(r#"{"AND": "product"}"#).unwrap();

    assert_eq!(ctx, Context::default().with_and(AndOp::Product));
    assert_eq!(ctx.defuzzification, DefuzzificationOp::Centroid);
    assert_eq!(ctx.aggregation, OrOp::Max);
    assert_eq!(ctx.implication, ImplicationOp::Min);
    assert_eq!(ctx.or, OrOp::Max);
}

#[test]
fn test_unknown_tag_is_rejected() {
    assert!(serde_json::from_str::<Context>(r#"{"OR": "xor"}"#).is_err());
}
