//! Script instance cache

use std::sync::Arc;

use dashmap::DashMap;

use super::{ScriptDescriptor, ScriptEngine, ScriptError, ScriptInstance};

/// Caches script class instances by `(script_path, class_name)`
///
/// All scripted reactions naming the same class share one instance.
pub struct ScriptPool {
    engine: Arc<dyn ScriptEngine>,
    prefix: String,
    instances: DashMap<(String, String), Arc<dyn ScriptInstance>>,
}

impl ScriptPool {
    pub fn new(engine: Arc<dyn ScriptEngine>, prefix: &str) -> Self {
        Self {
            engine,
            prefix: prefix.to_string(),
            instances: DashMap::new(),
        }
    }

    /// Path prefix applied when instantiating scripts
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the shared instance of a class, instantiating it on first use
    pub fn instance(
        &self,
        script_path: &str,
        class_name: &str,
    ) -> Result<Arc<dyn ScriptInstance>, ScriptError> {
        let key = (script_path.to_string(), class_name.to_string());
        if let Some(instance) = self.instances.get(&key) {
            return Ok(Arc::clone(instance.value()));
        }

        // Engine runs without a map shard locked
        let full_path = format!("{}{}", self.prefix, script_path);
        let created = self.engine.instantiate(&full_path, class_name)?;
        tracing::debug!("Instantiated script class {} from '{}'", class_name, full_path);

        let instance = self.instances.entry(key).or_insert(created);
        Ok(Arc::clone(instance.value()))
    }

    /// Resolve a descriptor to an instance that has its method
    pub fn connect(
        &self,
        descriptor: &ScriptDescriptor,
    ) -> Result<Arc<dyn ScriptInstance>, ScriptError> {
        let instance = self.instance(&descriptor.script_path, &descriptor.class_name)?;
        if !instance.has_method(&descriptor.method_name) {
            return Err(ScriptError::MethodNotFound {
                class_name: descriptor.class_name.clone(),
                method_name: descriptor.method_name.clone(),
            });
        }
        Ok(instance)
    }

    /// Number of cached instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drop all cached instances
    pub fn clear(&self) {
        self.instances.clear();
    }
}
