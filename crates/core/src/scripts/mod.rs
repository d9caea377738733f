//! Scripted reactions
//!
//! The event core does not run scripts itself. It talks to an embedded
//! engine through [`ScriptEngine`] and [`ScriptInstance`], and only needs
//! enough information to call a method and to reconnect the call after a
//! load: the [`ScriptDescriptor`].
//!
//! Instances are shared per `(script_path, class_name)` through a
//! [`ScriptPool`]. One pool is installed process-wide with
//! [`set_script_engine`].

mod pool;

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tidings_record::Value;

use crate::events::Event;
use crate::listeners::ListenerHandle;

pub use pool::ScriptPool;

/// Errors raised by the scripting collaborator
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// No engine installed
    #[error("No script engine installed")]
    NoEngine,

    /// Script or class could not be resolved
    #[error("Class '{class_name}' not found in script '{script_path}'")]
    ClassNotFound {
        script_path: String,
        class_name: String,
    },

    /// Class exists but lacks the method
    #[error("Method '{method_name}' not found in class '{class_name}'")]
    MethodNotFound {
        class_name: String,
        method_name: String,
    },

    /// Script raised an error while running
    #[error("Script execution failed: {0}")]
    Execution(String),
}

/// Extra positional argument passed to a scripted method
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Bool(bool),
    Int(i32),
    Str(String),
}

impl ScriptArg {
    /// Record value this argument is persisted as
    pub fn to_value(&self) -> Value {
        match self {
            ScriptArg::Bool(b) => Value::Bool(*b),
            ScriptArg::Int(i) => Value::I32(*i),
            ScriptArg::Str(s) => Value::String(s.clone()),
        }
    }

    /// Rebuild an argument from a persisted value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(ScriptArg::Bool(*b)),
            Value::I32(i) => Some(ScriptArg::Int(*i)),
            Value::String(s) => Some(ScriptArg::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptArg::Bool(b) => write!(f, "{}", b),
            ScriptArg::Int(i) => write!(f, "{}", i),
            ScriptArg::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Everything needed to locate a scripted method again
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDescriptor {
    pub script_path: String,
    pub class_name: String,
    pub method_name: String,
    pub args: Vec<ScriptArg>,
}

impl ScriptDescriptor {
    pub fn new(script_path: &str, class_name: &str, method_name: &str) -> Self {
        Self {
            script_path: script_path.to_string(),
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            args: Vec::new(),
        }
    }

    /// Append an extra argument
    pub fn arg(mut self, arg: ScriptArg) -> Self {
        self.args.push(arg);
        self
    }
}

impl fmt::Display for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}.{}",
            self.script_path, self.class_name, self.method_name
        )
    }
}

/// Embedded script engine
pub trait ScriptEngine: Send + Sync {
    /// Load `script_path` and instantiate `class_name` from it
    fn instantiate(
        &self,
        script_path: &str,
        class_name: &str,
    ) -> Result<Arc<dyn ScriptInstance>, ScriptError>;
}

/// Instance of a script class
pub trait ScriptInstance: Send + Sync {
    /// Check whether the class defines `method`
    fn has_method(&self, method: &str) -> bool;

    /// Call `method` with the firing listener, the raised event and the
    /// extra arguments
    fn call(
        &self,
        method: &str,
        listener: &ListenerHandle,
        event: &dyn Event,
        args: &[ScriptArg],
    ) -> Result<(), ScriptError>;
}

/// Process-wide script pool
static SCRIPT_POOL: LazyLock<RwLock<Option<Arc<ScriptPool>>>> =
    LazyLock::new(|| RwLock::new(None));

/// Install the engine used to resolve scripted reactions
///
/// `prefix` is prepended to every script path when instantiating. Replaces
/// any previously installed pool, dropping its cached instances.
pub fn set_script_engine(engine: Arc<dyn ScriptEngine>, prefix: &str) {
    let pool = Arc::new(ScriptPool::new(engine, prefix));
    *SCRIPT_POOL.write() = Some(pool);
    tracing::debug!("Script engine installed (prefix '{}')", prefix);
}

/// The installed script pool, if any
pub fn script_pool() -> Option<Arc<ScriptPool>> {
    SCRIPT_POOL.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_values() {
        let args = [
            ScriptArg::Bool(true),
            ScriptArg::Int(-4),
            ScriptArg::Str("bell".to_string()),
        ];
        for arg in &args {
            assert_eq!(ScriptArg::from_value(&arg.to_value()).as_ref(), Some(arg));
        }
        assert_eq!(ScriptArg::from_value(&Value::U16(3)), None);
    }

    #[test]
    fn test_descriptor_display() {
        let descriptor = ScriptDescriptor::new("npc.guard", "Guard", "on_alarm")
            .arg(ScriptArg::Int(2));

        assert_eq!(descriptor.to_string(), "npc.guard:Guard.on_alarm");
        assert_eq!(descriptor.args, vec![ScriptArg::Int(2)]);
    }
}
