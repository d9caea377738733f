//! Reactions - what a listener does when it fires

use std::fmt;
use std::sync::Arc;

use tidings_record::{Record, RecordReader};

use super::{ListenerHandle, ListenerKind};
use crate::error::{LoadError, LoadResult};
use crate::events::Event;
use crate::scripts::{self, ScriptArg, ScriptDescriptor, ScriptError, ScriptInstance};

/// Process-local reaction
///
/// Receives the firing listener, so it can destroy or pause itself, and the
/// raised event.
pub type NativeCallback = Arc<dyn Fn(&ListenerHandle, &dyn Event) + Send + Sync>;

/// Reaction bound to a method of a script class
#[derive(Clone)]
pub struct ScriptedCallback {
    descriptor: ScriptDescriptor,
    instance: Arc<dyn ScriptInstance>,
}

impl ScriptedCallback {
    /// Resolve a descriptor through the installed script pool
    pub fn connect(descriptor: ScriptDescriptor) -> Result<Self, ScriptError> {
        let pool = scripts::script_pool().ok_or(ScriptError::NoEngine)?;
        let instance = pool.connect(&descriptor)?;
        Ok(Self {
            descriptor,
            instance,
        })
    }

    pub fn descriptor(&self) -> &ScriptDescriptor {
        &self.descriptor
    }

    fn invoke(&self, listener: &ListenerHandle, event: &dyn Event) {
        let result = self.instance.call(
            &self.descriptor.method_name,
            listener,
            event,
            &self.descriptor.args,
        );
        if let Err(e) = result {
            tracing::error!("Script callback {} failed: {}", self.descriptor, e);
        }
    }
}

/// Write a script descriptor
pub(crate) fn put_descriptor(descriptor: &ScriptDescriptor, record: &mut Record) {
    record.put_string("spt", &descriptor.script_path);
    record.put_string("scl", &descriptor.class_name);
    record.put_string("smt", &descriptor.method_name);

    let mut args = Record::new();
    for arg in &descriptor.args {
        args.put("", arg.to_value());
    }
    record.put_record("sar", args);
}

/// Read a descriptor written by [`put_descriptor`]
pub(crate) fn get_descriptor(reader: &mut RecordReader<'_>) -> LoadResult<ScriptDescriptor> {
    let script_path = reader.get_string("spt");
    let class_name = reader.get_string("scl");
    let method_name = reader.get_string("smt");
    let arg_record = reader.get_record("sar");
    reader.finish()?;

    let mut args = Vec::with_capacity(arg_record.len());
    for field in arg_record.fields() {
        let arg = ScriptArg::from_value(&field.value)
            .ok_or(LoadError::InvalidScriptArgument(field.value.kind()))?;
        args.push(arg);
    }

    Ok(ScriptDescriptor {
        script_path,
        class_name,
        method_name,
        args,
    })
}

/// Behavior attached to a listener
#[derive(Clone)]
pub enum Reaction {
    Native(NativeCallback),
    Scripted(ScriptedCallback),
}

impl Reaction {
    /// Wrap a closure as a native reaction
    pub fn native<F>(callback: F) -> Self
    where
        F: Fn(&ListenerHandle, &dyn Event) + Send + Sync + 'static,
    {
        Reaction::Native(Arc::new(callback))
    }

    pub fn kind(&self) -> ListenerKind {
        match self {
            Reaction::Native(_) => ListenerKind::Native,
            Reaction::Scripted(_) => ListenerKind::Scripted,
        }
    }

    /// Script descriptor of a scripted reaction
    pub fn descriptor(&self) -> Option<&ScriptDescriptor> {
        match self {
            Reaction::Native(_) => None,
            Reaction::Scripted(cb) => Some(cb.descriptor()),
        }
    }

    pub(crate) fn invoke(&self, listener: &ListenerHandle, event: &dyn Event) {
        match self {
            Reaction::Native(callback) => callback(listener, event),
            Reaction::Scripted(callback) => callback.invoke(listener, event),
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Native(_) => f.write_str("Native"),
            Reaction::Scripted(cb) => write!(f, "Scripted({})", cb.descriptor),
        }
    }
}
