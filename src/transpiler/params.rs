//! Parameter collection during compilation.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::ast::Value;
use crate::error::{WeaveError, WeaveResult};

/// Ordered name => value mapping of bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    entries: Vec<(String, Value)>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = ParameterBag::new();
        for (k, v) in iter {
            bag.insert(k, v.into());
        }
        bag
    }
}

impl Serialize for ParameterBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Collects parameters for one compilation, shared with nested subqueries.
///
/// Starts from the user's bag; literals lifted out of the tree get generated
/// names `p1`, `p2`, ... that skip anything already taken.
#[derive(Debug)]
pub struct ParameterBinder {
    bag: ParameterBag,
    prefix: &'static str,
    counter: usize,
}

impl ParameterBinder {
    pub fn new(user: &ParameterBag) -> Self {
        Self {
            bag: user.clone(),
            prefix: "p",
            counter: 0,
        }
    }

    /// Merge a subquery's user parameters. Equal values under one name are fine.
    pub fn merge(&mut self, other: &ParameterBag) -> WeaveResult<()> {
        for (name, value) in other.iter() {
            match self.bag.get(name) {
                Some(existing) if existing != value => {
                    return Err(WeaveError::ParamConflict(name.to_string()));
                }
                Some(_) => {}
                None => self.bag.insert(name, value.clone()),
            }
        }
        Ok(())
    }

    /// Store `value` under a fresh generated name and return the name.
    pub fn lift(&mut self, value: Value) -> String {
        let name = loop {
            self.counter += 1;
            let candidate = format!("{}{}", self.prefix, self.counter);
            if !self.bag.contains(&candidate) {
                break candidate;
            }
        };
        self.bag.insert(name.clone(), value);
        name
    }

    pub fn finish(self) -> ParameterBag {
        self.bag
    }
}
