//! Name → handle table owned by the runtime manager

use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub(crate) struct Registry<H> {
    maps: HashMap<String, H>,
    default_name: Option<String>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            maps: HashMap::new(),
            default_name: None,
        }
    }
}

impl<H> Registry<H> {
    /// Register a handle. The first name ever inserted since the last drain
    /// becomes the default. Returns the handle it displaced, if any.
    pub(crate) fn insert(&mut self, name: String, handle: H) -> Option<H> {
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.maps.insert(name, handle)
    }

    /// Look up by name; an empty name resolves to the default entry
    pub(crate) fn resolve(&self, name: &str) -> Option<(&str, &H)> {
        let key = if name.is_empty() {
            self.default_name.as_deref()?
        } else {
            name
        };
        self.maps.get_key_value(key).map(|(k, h)| (k.as_str(), h))
    }

    pub(crate) fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    pub(crate) fn names(&self) -> BTreeSet<String> {
        self.maps.keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.maps.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Remove every entry and forget the default
    pub(crate) fn drain(&mut self) -> Vec<(String, H)> {
        self.default_name = None;
        self.maps.drain().collect()
    }
}
