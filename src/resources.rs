//! Keyed drawing resources rebuilt against each new render target.
//!
//! Brushes and similar resources belong to the render target that created
//! them, so every target recreation has to rebuild them. The cache keeps one
//! generator per key and re-runs all of them on [`ResourceCache::update_resources`],
//! which is meant to be wired up as the pipeline's resources updater.

use std::collections::HashMap;

use crate::error::BridgeResult;

/// Builds one resource for a render target.
pub type Generator<T, R> = Box<dyn Fn(&T) -> BridgeResult<R>>;

pub struct ResourceCache<T: Clone, R> {
    generators: Vec<(String, Generator<T, R>)>,
    resources: HashMap<String, R>,
    target: Option<T>,
}

impl<T: Clone, R> ResourceCache<T, R> {
    pub fn new() -> Self {
        Self {
            generators: Vec::new(),
            resources: HashMap::new(),
            target: None,
        }
    }

    /// Register a generator under `key`, replacing any previous one.
    ///
    /// If a render target is already known the resource is built right away.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        generator: impl Fn(&T) -> BridgeResult<R> + 'static,
    ) -> BridgeResult<()> {
        let key = key.into();
        self.resources.remove(&key);
        if let Some(target) = &self.target {
            self.resources.insert(key.clone(), generator(target)?);
        }

        let generator: Generator<T, R> = Box::new(generator);
        match self.generators.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = generator,
            None => self.generators.push((key, generator)),
        }
        Ok(())
    }

    /// Rebuild every resource for `target`, dropping the old ones first.
    pub fn update_resources(&mut self, target: &T) -> BridgeResult<()> {
        self.target = Some(target.clone());
        self.resources.clear();
        for (key, generator) in &self.generators {
            self.resources.insert(key.clone(), generator(target)?);
        }
        log::trace!("Rebuilt {} drawing resources", self.resources.len());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.resources.get(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Forget the current target and every built resource.
    pub fn clear(&mut self) {
        self.resources.clear();
        self.target = None;
    }
}

impl<T: Clone, R> Default for ResourceCache<T, R> {
    fn default() -> Self {
        Self::new()
    }
}
