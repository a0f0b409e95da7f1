use std::collections::HashMap;

use crate::value::Value;

/// Name-resolution capability: the set of bindings visible at a point in a
/// template. Lookups return owned values.
pub trait Accessor {
    fn get(&self, name: &str) -> Option<Value>;
}

/// Root scope backed by a fixed name/value map.
#[derive(Clone, Debug, Default)]
pub struct MapAccessor {
    values: HashMap<String, Value>,
}

impl MapAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }
}

impl From<HashMap<String, Value>> for MapAccessor {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

impl Accessor for MapAccessor {
    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// One binding overlaid on a parent scope. The parent is never mutated, so
/// sibling chains built over the same parent cannot observe each other.
pub struct ChainAccessor<'a> {
    parent: &'a dyn Accessor,
    name: &'a str,
    value: Value,
}

impl<'a> ChainAccessor<'a> {
    pub fn new(parent: &'a dyn Accessor, name: &'a str, value: Value) -> Self {
        Self {
            parent,
            name,
            value,
        }
    }
}

impl Accessor for ChainAccessor<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        if name == self.name {
            Some(self.value.clone())
        } else {
            self.parent.get(name)
        }
    }
}
