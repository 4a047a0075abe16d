use std::collections::HashMap;

use crate::domain::Value;
use crate::error::{Error, Result};

/// An assignment of crisp values to input variables, by variable name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs(pub(crate) HashMap<String, Value>);

impl Inputs {
    pub fn new() -> Self {
        Inputs(HashMap::new())
    }

    pub fn add(&mut self, name: impl Into<String>, val: impl Into<Value>) {
        self.0.insert(name.into(), val.into());
    }

    pub fn with(mut self, name: impl Into<String>, val: impl Into<Value>) -> Self {
        self.add(name, val);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| Error::lookup(format!("no input value for variable {name}")))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Inputs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One row of a batch prediction.
#[derive(Clone, Debug, PartialEq)]
pub enum Row {
    /// Values in the order of the system's input variables
    Positional(Vec<Value>),
    Named(Inputs),
}

impl From<Inputs> for Row {
    fn from(inputs: Inputs) -> Self {
        Row::Named(inputs)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::Positional(values)
    }
}

impl From<Vec<f64>> for Row {
    fn from(values: Vec<f64>) -> Self {
        Row::Positional(values.into_iter().map(Value::Number).collect())
    }
}

impl From<&[f64]> for Row {
    fn from(values: &[f64]) -> Self {
        Row::Positional(values.iter().copied().map(Value::Number).collect())
    }
}

#[test]
fn test_inputs() {
    let inputs: Inputs = [("service", 5.), ("food", 7.5)].into_iter().collect();

    assert_eq!(inputs.get("food").unwrap(), &Value::Number(7.5));
    assert!(matches!(inputs.get("tip"), Err(Error::Lookup(_))));
    assert_eq!(inputs, Inputs::new().with("food", 7.5).with("service", 5.));
}
