//! Name-to-dialect lookup.
//!
//! A registry is an ordinary value owned by the host. Nothing is
//! registered globally.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::DialectConfig;
use crate::dialect::{Dialect, HanaDialect};
use crate::{DialectError, Result};

type Factory = Box<dyn Fn(&DialectConfig) -> Result<Box<dyn Dialect>> + Send + Sync>;

/// Dialect factories keyed by lower-case name.
#[derive(Default)]
pub struct DialectRegistry {
    factories: BTreeMap<String, Factory>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DialectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `hana` and `hana.hdbconnect`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in [HanaDialect::NAME, "hana.hdbconnect"] {
            registry.register(name, |config| {
                let dialect = HanaDialect::from_config(config.clone())?;
                Ok(Box::new(dialect) as Box<dyn Dialect>)
            });
        }
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DialectConfig) -> Result<Box<dyn Dialect>> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_ascii_lowercase(), Box::new(factory));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str, config: &DialectConfig) -> Result<Box<dyn Dialect>> {
        let factory = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| DialectError::not_found("dialect", name))?;
        factory(config)
    }

    /// Resolve a URL scheme (`hana`, `hana+hdbconnect`) to a dialect.
    pub fn for_url(&self, url: &str, config: &DialectConfig) -> Result<Box<dyn Dialect>> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| DialectError::url(format!("no scheme in '{url}'")))?;
        self.create(&scheme.replace('+', "."), config)
    }
}
