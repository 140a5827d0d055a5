use std::ops::Deref;

use markup5ever::{LocalName, QualName};

/// A single attribute: a qualified name and a string value.
///
/// `specified` distinguishes attributes that appeared in markup (or were set
/// explicitly through the API) from attributes synthesized by the engine,
/// such as the `selected` flag auto-injected when serializing an option whose
/// selectedness was changed by clicking.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// The name of the attribute (e.g. the `class` in `class="test"`)
    pub name: QualName,
    /// The value of the attribute (e.g. the `test` in `class="test"`)
    pub value: String,
    /// Whether the attribute was explicitly specified rather than synthesized
    pub specified: bool,
}

impl Attribute {
    pub fn new(name: QualName, value: String) -> Self {
        Self {
            name,
            value,
            specified: true,
        }
    }
}

/// An element's ordered attribute store.
///
/// Insertion order is preserved and there is at most one entry per local
/// name. HTML attribute names are ASCII case-insensitive: keys are
/// lowercased on the way in, and duplicate attributes are rejected with the
/// first occurrence winning (matching HTML parsing rules).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    attrs: Vec<Attribute>,
}

fn normalize_name(name: &mut QualName) {
    let local: &str = &name.local;
    if local.bytes().any(|b| b.is_ascii_uppercase()) {
        name.local = LocalName::from(local.to_ascii_lowercase().as_str());
    }
}

impl Attributes {
    /// Build a store from a parsed attribute list, dropping duplicates
    /// (first occurrence wins).
    pub fn new(attrs: Vec<Attribute>) -> Self {
        let mut store = Self {
            attrs: Vec::with_capacity(attrs.len()),
        };
        for mut attr in attrs {
            normalize_name(&mut attr.name);
            if !store.contains(&attr.name.local) {
                store.attrs.push(attr);
            }
        }
        store
    }

    pub fn contains(&self, name: &LocalName) -> bool {
        self.attrs.iter().any(|attr| attr.name.local == *name)
    }

    pub fn get(&self, name: &LocalName) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.local == *name)
            .map(|attr| attr.value.as_str())
    }

    /// Insert or update an attribute, preserving its position when it
    /// already exists. Returns the previous value if there was one.
    pub fn set(&mut self, mut name: QualName, value: String) -> Option<String> {
        normalize_name(&mut name);
        match self.attrs.iter_mut().find(|attr| attr.name.local == name.local) {
            Some(attr) => {
                attr.specified = true;
                Some(std::mem::replace(&mut attr.value, value))
            }
            None => {
                self.attrs.push(Attribute::new(name, value));
                None
            }
        }
    }

    /// Remove an attribute by local name. Returns the removed attribute.
    pub fn remove(&mut self, name: &LocalName) -> Option<Attribute> {
        let idx = self.attrs.iter().position(|attr| attr.name.local == *name)?;
        Some(self.attrs.remove(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl Deref for Attributes {
    type Target = [Attribute];
    fn deref(&self) -> &Self::Target {
        &self.attrs
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;
    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}
