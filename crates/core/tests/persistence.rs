//! Saving and restoring factories with native and scripted listeners

use std::sync::{Arc, LazyLock, Once};

use parking_lot::Mutex;

use tidings_core::record::{Record, RecordReader};
use tidings_core::{
    register_event_type, set_script_engine, Event, EventType, Factory, ImmediateManager,
    ListenerHandle, ListenerKind, LoadError, RepeatCount, ScriptArg, ScriptDescriptor,
    ScriptEngine, ScriptError, ScriptInstance, REPEAT_FOREVER,
};

#[derive(Debug, Clone)]
struct Bell {
    tower: u32,
    repeat: RepeatCount,
}

impl Default for Bell {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Bell {
    fn new(tower: u32) -> Self {
        Self {
            tower,
            repeat: REPEAT_FOREVER,
        }
    }
}

impl Event for Bell {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, raised: &dyn Event) -> bool {
        raised
            .downcast_ref::<Bell>()
            .is_some_and(|b| b.tower == self.tower)
    }

    fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    fn set_repeat(&mut self, count: RepeatCount) {
        self.repeat = count;
    }

    fn put_state(&self, record: &mut Record) {
        record.put_u32("tower", self.tower);
    }

    fn get_state(&mut self, reader: &mut RecordReader<'_>) {
        self.tower = reader.get_u32("tower");
    }
}

impl EventType for Bell {
    const NAME: &'static str = "bell_event";
}

/// Calls seen by the mock script engine: (tower, method, args)
static CALLS: LazyLock<Mutex<Vec<(u32, String, Vec<ScriptArg>)>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

struct Guard;

impl ScriptInstance for Guard {
    fn has_method(&self, method: &str) -> bool {
        method == "on_alarm"
    }

    fn call(
        &self,
        method: &str,
        _listener: &ListenerHandle,
        event: &dyn Event,
        args: &[ScriptArg],
    ) -> Result<(), ScriptError> {
        let tower = event.downcast_ref::<Bell>().map_or(0, |b| b.tower);
        CALLS.lock().push((tower, method.to_string(), args.to_vec()));
        Ok(())
    }
}

struct MockEngine;

impl ScriptEngine for MockEngine {
    fn instantiate(
        &self,
        script_path: &str,
        class_name: &str,
    ) -> Result<Arc<dyn ScriptInstance>, ScriptError> {
        if script_path == "quests.tower" && class_name == "Guard" {
            Ok(Arc::new(Guard))
        } else {
            Err(ScriptError::ClassNotFound {
                script_path: script_path.to_string(),
                class_name: class_name.to_string(),
            })
        }
    }
}

fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        set_script_engine(Arc::new(MockEngine), "quests.");
        register_event_type::<Bell>(Arc::new(ImmediateManager::new())).unwrap();
    });
}

fn calls_for(tower: u32) -> Vec<(String, Vec<ScriptArg>)> {
    CALLS
        .lock()
        .iter()
        .filter(|(t, _, _)| *t == tower)
        .map(|(_, method, args)| (method.clone(), args.clone()))
        .collect()
}

fn guard(args: Vec<ScriptArg>) -> ScriptDescriptor {
    let mut descriptor = ScriptDescriptor::new("tower", "Guard", "on_alarm");
    descriptor.args = args;
    descriptor
}

#[test]
fn test_mixed_factory_round_trip() {
    setup();
    let factory = Factory::new();

    let native = factory.add_native(Bell::new(100), |_, _| {});
    native.set_id("native");

    let scripted = factory
        .add_script(Bell::new(101), guard(vec![ScriptArg::Int(3), ScriptArg::Str("north".into())]))
        .unwrap();
    scripted.set_id("scripted");
    scripted.pause(2);

    let mut limited = Bell::new(102);
    limited.repeat = 4;
    factory.add_native(limited, |_, _| {});

    let mut record = Record::new();
    factory.put_state(&mut record);

    // survives an on-disk encoding
    let json = serde_json::to_string_pretty(&record).unwrap();
    let record: Record = serde_json::from_str(&json).unwrap();

    let restored = Factory::new();
    restored.get_state(&record).unwrap();
    let listeners = restored.listeners();
    assert_eq!(listeners.len(), 3);

    let native = restored.get_by_id("native").unwrap();
    assert_eq!(native.kind(), Some(ListenerKind::Native));
    assert!(native.equals(&Bell::new(100)));
    assert!(native.is_registered());

    let scripted = restored.get_by_id("scripted").unwrap();
    assert_eq!(scripted.kind(), Some(ListenerKind::Scripted));
    assert_eq!(scripted.pause_depth(), 2);
    assert!(!scripted.is_registered());
    assert!(scripted.equals(&Bell::new(101)));
    assert_eq!(
        scripted.descriptor(),
        Some(guard(vec![ScriptArg::Int(3), ScriptArg::Str("north".into())]))
    );

    assert_eq!(listeners[2].id(), None);
    assert_eq!(listeners[2].repeat(), 4);
}

#[test]
fn test_restored_script_fires_after_resume() {
    setup();
    let factory = Factory::new();
    let listener = factory
        .add_script(Bell::new(200), guard(vec![ScriptArg::Bool(true)]))
        .unwrap();
    listener.pause(1);

    let mut record = Record::new();
    factory.put_state(&mut record);
    drop(factory);

    let restored = Factory::new();
    restored.get_state(&record).unwrap();

    tidings_core::raise(&Bell::new(200));
    assert!(calls_for(200).is_empty());

    restored.listeners()[0].resume();
    tidings_core::raise(&Bell::new(200));
    assert_eq!(
        calls_for(200),
        vec![("on_alarm".to_string(), vec![ScriptArg::Bool(true)])]
    );
}

#[test]
fn test_native_listener_reconnects_by_hand() {
    setup();
    let factory = Factory::new();
    let listener = factory.add_native(Bell::new(300), |_, _| {});
    listener.set_id("bell_ringer");

    let mut record = Record::new();
    factory.put_state(&mut record);
    drop(factory);

    let restored = Factory::new();
    restored.get_state(&record).unwrap();

    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    let listener = restored.get_by_id("bell_ringer").unwrap();
    listener.connect_native(Arc::new(move |_: &ListenerHandle, _: &dyn Event| {
        *counter.lock() += 1;
    }));

    tidings_core::raise(&Bell::new(300));
    assert_eq!(*hits.lock(), 1);
}

#[test]
fn test_missing_method_aborts_load() {
    setup();
    let factory = Factory::new();
    factory.add_native(Bell::new(400), |_, _| {});
    factory
        .add_script(Bell::new(401), guard(Vec::new()))
        .unwrap()
        .set_id("renamed");

    let mut record = Record::new();
    factory.put_state(&mut record);

    // the script changed between save and load
    let json = serde_json::to_string(&record)
        .unwrap()
        .replace("on_alarm", "on_curfew");
    let record: Record = serde_json::from_str(&json).unwrap();

    let restored = Factory::new();
    match restored.get_state(&record) {
        Err(LoadError::ScriptReconnect { id, source }) => {
            assert_eq!(id, "renamed");
            assert!(matches!(source, ScriptError::MethodNotFound { .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(restored.is_empty());
}

#[test]
fn test_unknown_event_type_aborts_load() {
    setup();
    let factory = Factory::new();
    factory.add_native(Bell::new(500), |_, _| {});

    let mut record = Record::new();
    factory.put_state(&mut record);
    let json = serde_json::to_string(&record)
        .unwrap()
        .replace("bell_event", "gong_event");
    let record: Record = serde_json::from_str(&json).unwrap();

    let restored = Factory::new();
    assert!(matches!(
        restored.get_state(&record),
        Err(LoadError::UnknownEventType(name)) if name == "gong_event"
    ));
}

#[test]
fn test_unknown_script_class_fails_on_add() {
    setup();
    let factory = Factory::new();
    let descriptor = ScriptDescriptor::new("tower", "Thief", "on_alarm");

    assert!(matches!(
        factory.add_script(Bell::new(600), descriptor),
        Err(ScriptError::ClassNotFound { .. })
    ));
    assert!(factory.is_empty());
}
