//! tidings demo
//!
//! Runs a small game loop: the clock raises time events, a patrol alarm
//! repeats every game minute and button clicks are queued until the end
//! of the frame. Halfway through the state is saved to JSON, the factory
//! is torn down and everything is loaded back.
//!
//! Usage: `tidings-demo [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use tidings_core::record::{Record, RecordReader};
use tidings_core::time::{self, GameClock, TimeEvent};
use tidings_core::{
    logging, register_event_type, DeferredManager, Event, EventType, EventsConfig, Factory,
    ListenerHandle, RepeatCount, REPEAT_FOREVER,
};

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Update cycles simulated per run
const CYCLES: u32 = 1200;

/// A widget was clicked
#[derive(Debug, Clone)]
struct Click {
    widget: String,
    repeat: RepeatCount,
}

impl Default for Click {
    fn default() -> Self {
        Self::new("")
    }
}

impl Click {
    fn new(widget: &str) -> Self {
        Self {
            widget: widget.to_string(),
            repeat: REPEAT_FOREVER,
        }
    }
}

impl Event for Click {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, raised: &dyn Event) -> bool {
        raised
            .downcast_ref::<Click>()
            .is_some_and(|c| c.widget == self.widget)
    }

    fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    fn set_repeat(&mut self, count: RepeatCount) {
        self.repeat = count;
    }

    fn put_state(&self, record: &mut Record) {
        record.put_string("widget", &self.widget);
    }

    fn get_state(&mut self, reader: &mut RecordReader<'_>) {
        self.widget = reader.get_string("widget");
    }
}

impl EventType for Click {
    const NAME: &'static str = "ui_event";
}

fn on_patrol(listener: &ListenerHandle, event: &dyn Event) {
    let now = event.downcast_ref::<TimeEvent>().map_or(0, |e| e.time());
    tracing::info!(
        "Patrol at {} ({} more)",
        time::format_time("day %d, %h:%m", now),
        listener.repeat()
    );
}

fn on_click(_: &ListenerHandle, event: &dyn Event) {
    if let Some(click) = event.downcast_ref::<Click>() {
        tracing::info!("Clicked '{}'", click.widget);
    }
}

fn run(clock: &mut GameClock, from: u32, to: u32) {
    for cycle in from..to {
        clock.update(1);
        if cycle % 250 == 0 {
            tidings_core::raise(&Click::new("map"));
        }
        // end of frame
        tidings_core::update();
    }
}

fn save(clock: &GameClock, factory: &Factory) -> DemoResult<String> {
    let mut clock_state = Record::new();
    clock.put_state(&mut clock_state);
    let mut events = Record::new();
    factory.put_state(&mut events);

    let mut root = Record::new();
    root.put_record("clock", clock_state);
    root.put_record("events", events);
    Ok(serde_json::to_string_pretty(&root)?)
}

fn load(json: &str, clock: &mut GameClock, factory: &Factory) -> DemoResult<()> {
    let root: Record = serde_json::from_str(json)?;
    let mut reader = root.reader();
    let clock_state = reader.get_record("clock");
    let events = reader.get_record("events");
    reader.finish()?;

    clock.get_state(&mut clock_state.reader())?;
    factory.get_state(events)?;

    // native reactions are not persisted
    for handle in factory.listeners() {
        match handle.id().as_deref() {
            Some("patrol") => handle.connect_native(Arc::new(on_patrol)),
            Some("map") => handle.connect_native(Arc::new(on_click)),
            _ => {}
        }
    }
    Ok(())
}

fn main() -> DemoResult<()> {
    logging::init("info");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("tidings-demo").join("events.toml"));
    let config = EventsConfig::load(&config_path)?;

    time::init()?;
    register_event_type::<Click>(Arc::new(DeferredManager::new()))?;

    let mut clock = GameClock::new(&config.clock);
    clock.set_time(time::parse_time("8h"));

    let factory = Factory::new();
    factory
        .add_native(
            TimeEvent::after(clock.time(), "30s").with_interval("1m", 3),
            on_patrol,
        )
        .set_id("patrol");
    factory.add_native(Click::new("map"), on_click).set_id("map");

    run(&mut clock, 0, CYCLES / 2);
    let saved = save(&clock, &factory)?;
    tracing::info!("Saved at {}, {} bytes", clock.format("%h:%m"), saved.len());
    drop(factory);

    let mut clock = GameClock::new(&config.clock);
    let factory = Factory::new();
    load(&saved, &mut clock, &factory)?;
    tracing::info!(
        "Loaded {} listeners at {}",
        factory.len(),
        clock.format("%h:%m")
    );

    run(&mut clock, CYCLES / 2, CYCLES);
    tracing::info!("Stopped at {}", clock.format("day %d, %h:%m"));
    Ok(())
}
