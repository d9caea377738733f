//! Deferred dispatch through the global update pass

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tidings_core::{
    register_event_type, DeferredManager, Event, EventType, Factory, RepeatCount,
};

#[derive(Debug, Clone, Default)]
struct WidgetActivated {
    widget: String,
    repeat: RepeatCount,
}

impl WidgetActivated {
    fn new(widget: &str, repeat: RepeatCount) -> Self {
        Self {
            widget: widget.to_string(),
            repeat,
        }
    }
}

impl Event for WidgetActivated {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, raised: &dyn Event) -> bool {
        raised
            .downcast_ref::<WidgetActivated>()
            .is_some_and(|e| e.widget == self.widget)
    }

    fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    fn set_repeat(&mut self, count: RepeatCount) {
        self.repeat = count;
    }
}

impl EventType for WidgetActivated {
    const NAME: &'static str = "ui_event";
}

#[test]
fn test_update_runs_deferred_reactions() {
    let manager = Arc::new(DeferredManager::new());
    register_event_type::<WidgetActivated>(manager.clone()).unwrap();

    let factory = Factory::new();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&hits);
    let listener = factory.add_native(WidgetActivated::new("ok_button", 2), move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    tidings_core::raise(&WidgetActivated::new("ok_button", 0));
    tidings_core::raise(&WidgetActivated::new("cancel_button", 0));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(manager.pending_len(), 1);

    tidings_core::update();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(manager.pending_len(), 0);

    // second match uses up the listener
    tidings_core::raise(&WidgetActivated::new("ok_button", 0));
    tidings_core::update();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(listener.repeat(), 0);

    tidings_core::raise(&WidgetActivated::new("ok_button", 0));
    tidings_core::update();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
