//! Catalog of registered capabilities, keyed by unique name.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::fs_tools::{
    AppendText, ContainsSubstring, CreateDirectory, ListEntries, PathExists, ReadText, WriteText,
};
use super::{Capability, PathResolver};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("capability `{0}` is already registered")]
    Duplicate(String),

    #[error("unknown capability `{0}`")]
    Unknown(String),
}

/// Capabilities registered once at startup.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: BTreeMap<&'static str, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven filesystem capabilities, resolving relative paths against `base_dir`.
    pub fn standard(base_dir: impl Into<PathBuf>) -> Self {
        let resolver = PathResolver::new(base_dir);
        let mut registry = Self::new();
        let standard: [Arc<dyn Capability>; 7] = [
            Arc::new(CreateDirectory::new(resolver.clone())),
            Arc::new(WriteText::new(resolver.clone())),
            Arc::new(AppendText::new(resolver.clone())),
            Arc::new(PathExists::new(resolver.clone())),
            Arc::new(ReadText::new(resolver.clone())),
            Arc::new(ListEntries::new(resolver.clone())),
            Arc::new(ContainsSubstring::new(resolver)),
        ];
        for capability in standard {
            registry.entries.insert(capability.name(), capability);
        }
        registry
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let name = capability.name();
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.entries.insert(name, capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).cloned()
    }

    /// Resolve a list of names into capability handles, preserving order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn Capability>>, RegistryError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .ok_or_else(|| RegistryError::Unknown(name.to_string()))
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
