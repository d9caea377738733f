//! Listener state and persistence

use std::fmt;

use tidings_record::{Record, RecordReader};

use super::reaction::{get_descriptor, put_descriptor};
use super::{ListenerKind, Reaction, ScriptedCallback};
use crate::error::{LoadError, LoadResult};
use crate::events::{self, Event, RepeatCount};

/// An event pattern bound to a reaction
///
/// Listeners are created and owned by a [`Factory`](crate::Factory); the
/// factory hands out [`ListenerHandle`](super::ListenerHandle)s. A detached
/// `Listener` (returned by [`Factory::remove`](crate::Factory::remove)) is
/// inert until inserted into a factory again.
pub struct Listener {
    pub(crate) id: Option<String>,
    pub(crate) registered: bool,
    pub(crate) pause_depth: u16,
    pub(crate) kind: ListenerKind,
    pub(crate) reaction: Option<Reaction>,
    pub(crate) pattern: Box<dyn Event>,
}

impl Listener {
    pub fn new(pattern: Box<dyn Event>, reaction: Reaction) -> Self {
        Self {
            kind: reaction.kind(),
            reaction: Some(reaction),
            ..Self::detached(ListenerKind::Native, pattern)
        }
    }

    /// Listener of the given kind with nothing to invoke yet
    pub(crate) fn detached(kind: ListenerKind, pattern: Box<dyn Event>) -> Self {
        Self {
            id: None,
            registered: false,
            pause_depth: 0,
            kind,
            reaction: None,
            pattern,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// The pattern event
    pub fn pattern(&self) -> &dyn Event {
        self.pattern.as_ref()
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        self.reaction.as_ref()
    }

    pub fn pause_depth(&self) -> u16 {
        self.pause_depth
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn repeat(&self) -> RepeatCount {
        self.pattern.repeat()
    }

    pub fn is_destroyed(&self) -> bool {
        self.pattern.is_exhausted()
    }

    /// Write id, pause depth, pattern event and reaction descriptor
    ///
    /// Native reactions only persist a marker; they are reconnected by the
    /// owning domain after loading.
    pub fn put_state(&self, record: &mut Record) {
        record.put_u8("ltp", self.kind.as_u8());
        record.put_string("lid", self.id.as_deref().unwrap_or(""));
        record.put_u16("lps", self.pause_depth);

        record.put_bool("lev", true);
        let mut event = Record::new();
        events::put_event(self.pattern.as_ref(), &mut event);
        record.put_record("evt", event);

        match &self.reaction {
            Some(Reaction::Scripted(callback)) => {
                record.put_bool("lmt", true);
                let mut script = Record::new();
                put_descriptor(callback.descriptor(), &mut script);
                record.put_record("scb", script);
            }
            _ => record.put_bool("lmt", false),
        }
    }

    /// Rebuild a listener written by [`put_state`](Self::put_state)
    ///
    /// The pattern event is instantiated through the type registry by name.
    /// Scripted reactions are reconnected through the installed script pool
    /// once the base state has loaded; native listeners come back without a
    /// reaction. The result is unregistered.
    pub fn load(record: &Record) -> LoadResult<Listener> {
        let mut reader = record.reader();

        let tag = reader.get_u8("ltp");
        let id = reader.get_string("lid");
        let pause_depth = reader.get_u16("lps");
        let has_event = reader.get_bool("lev");
        reader.finish()?;

        let kind = ListenerKind::from_u8(tag).ok_or(LoadError::UnknownListenerKind(tag))?;
        if !has_event {
            return Err(LoadError::MissingEvent(id));
        }

        let pattern = load_event(&mut reader)?;

        let has_script = reader.get_bool("lmt");
        let descriptor = if has_script {
            let script = reader.get_record("scb");
            reader.finish()?;
            Some(get_descriptor(&mut script.reader())?)
        } else {
            None
        };
        reader.finish()?;

        if kind == ListenerKind::Scripted && descriptor.is_none() {
            return Err(LoadError::ScriptMissing(id));
        }

        let mut listener = Listener::detached(kind, pattern);
        listener.id = (!id.is_empty()).then_some(id);
        listener.pause_depth = pause_depth;

        if let Some(descriptor) = descriptor {
            let callback = ScriptedCallback::connect(descriptor).map_err(|source| {
                LoadError::ScriptReconnect {
                    id: listener.id.clone().unwrap_or_default(),
                    source,
                }
            })?;
            listener.kind = ListenerKind::Scripted;
            listener.reaction = Some(Reaction::Scripted(callback));
        }

        Ok(listener)
    }
}

fn load_event(reader: &mut RecordReader<'_>) -> LoadResult<Box<dyn Event>> {
    let record = reader.get_record("evt");
    reader.finish()?;

    let mut event_reader = record.reader();
    let event = events::get_event(&mut event_reader).map_err(LoadError::UnknownEventType)?;
    event_reader.finish()?;
    Ok(event)
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("registered", &self.registered)
            .field("pause_depth", &self.pause_depth)
            .field("pattern", &self.pattern)
            .finish()
    }
}
