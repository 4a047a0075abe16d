use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::sets::FuzzySet;

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// Handle to a variable registered in [`Variables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Variable(pub(crate) VariableKey);

/// A linguistic variable: a domain and the fuzzy sets its value labels stand for.
///
/// Labels keep their insertion order, which is what positional references
/// (as in the legacy `.fis` rules) resolve against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzyVariable {
    pub name: String,
    pub domain: Domain,
    pub values: IndexMap<String, Arc<FuzzySet>>,
}

impl FuzzyVariable {
    /// The variable takes the name of its domain.
    pub fn new<S: Into<String>>(domain: Domain, values: impl IntoIterator<Item = (S, FuzzySet)>) -> Result<Self> {
        let name = domain.name().to_owned();

        Self::with_name(name, domain, values)
    }

    pub fn with_name<S: Into<String>>(
        name: impl Into<String>,
        domain: Domain,
        values: impl IntoIterator<Item = (S, FuzzySet)>,
    ) -> Result<Self> {
        let this = Self {
            name: name.into(),
            domain,
            values: values.into_iter().map(|(k, v)| (k.into(), Arc::new(v))).collect(),
        };

        this.validate()?;

        Ok(this)
    }

    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;

        for set in self.values.values() {
            set.validate()?;
        }

        Ok(())
    }

    /// The set a label stands for
    pub fn get(&self, label: &str) -> Result<&Arc<FuzzySet>> {
        self.values
            .get(label)
            .ok_or_else(|| Error::lookup(format!("variable {} has no value {label}", self.name)))
    }

    /// The label at a zero-based position, in insertion order
    pub fn label_at(&self, index: usize) -> Result<&str> {
        self.values
            .get_index(index)
            .map(|(label, _)| label.as_str())
            .ok_or_else(|| Error::lookup(format!("variable {} has no value at position {index}", self.name)))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Registry owning every variable of a system.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    pub(crate) vars: SlotMap<VariableKey, FuzzyVariable>,
    names: HashMap<String, VariableKey>,
}

impl Variables {
    pub fn new() -> Self {
        Self {
            vars: SlotMap::with_key(),
            names: HashMap::new(),
        }
    }

    /// Registers a variable. Names must be unique.
    pub fn add(&mut self, var: FuzzyVariable) -> Result<Variable> {
        var.validate()?;

        if self.names.contains_key(&var.name) {
            return Err(Error::validation(format!("duplicate variable name: {}", var.name)));
        }

        let name = var.name.clone();
        let key = self.vars.insert(var);

        self.names.insert(name, key);

        Ok(Variable(key))
    }

    pub fn get(&self, var: Variable) -> Result<&FuzzyVariable> {
        self.vars
            .get(var.0)
            .ok_or_else(|| Error::lookup("variable is not registered in this system"))
    }

    pub fn by_name(&self, name: &str) -> Result<Variable> {
        self.names
            .get(name)
            .map(|key| Variable(*key))
            .ok_or_else(|| Error::lookup(format!("unknown variable: {name}")))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &FuzzyVariable)> {
        self.vars.iter().map(|(key, var)| (Variable(key), var))
    }
}
