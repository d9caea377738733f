//! Alarm style time events

use tidings_record::{Record, RecordReader};

use super::parse_time;
use crate::events::{Event, EventType, RepeatCount};

/// A point in game time
///
/// Raised by the clock with the current time; used as a pattern it is an
/// alarm that fires once the raised time reaches it. With an interval it
/// moves itself forward past "now" each time it fires, so a listener that
/// was paused for a while fires once on resume rather than catching up on
/// every missed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEvent {
    time: u32,
    interval: u32,
    absolute: bool,
    repeat: RepeatCount,
}

impl Default for TimeEvent {
    fn default() -> Self {
        Self {
            time: 0,
            interval: 0,
            absolute: false,
            repeat: 1,
        }
    }
}

impl TimeEvent {
    /// Event for an exact game time
    pub fn at(time: u32) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// Alarm `spec` (e.g. "1h30m") after `now`
    pub fn after(now: u32, spec: &str) -> Self {
        Self::at(now.saturating_add(parse_time(spec)))
    }

    /// Alarm at `spec` counted from the start of the game
    pub fn absolute(spec: &str) -> Self {
        Self {
            absolute: true,
            ..Self::at(parse_time(spec))
        }
    }

    /// Repeat every `interval`, `count` more times (`-1` forever)
    ///
    /// An empty interval is rejected with a warning and leaves the event
    /// unchanged.
    pub fn with_interval(mut self, interval: &str, count: RepeatCount) -> Self {
        let secs = parse_time(interval);
        if secs > 0 {
            self.interval = secs;
            self.repeat = count;
        } else {
            tracing::warn!("Time event interval '{}' not allowed", interval);
        }
        self
    }

    /// Alarm time in game seconds
    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

impl Event for TimeEvent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, raised: &dyn Event) -> bool {
        raised
            .downcast_ref::<TimeEvent>()
            .is_some_and(|now| self.time <= now.time)
    }

    fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    fn set_repeat(&mut self, count: RepeatCount) {
        self.repeat = count;
    }

    fn do_repeat(&mut self, raised: &dyn Event) {
        if self.repeat > 0 {
            self.repeat -= 1;
        }

        if self.interval == 0 {
            return;
        }
        let now = raised
            .downcast_ref::<TimeEvent>()
            .map_or(self.time, |e| e.time);
        while self.time <= now {
            self.time = self.time.saturating_add(self.interval);
            if self.time == u32::MAX {
                break;
            }
        }
    }

    fn put_state(&self, record: &mut Record) {
        record.put_u32("ttm", self.time);
        record.put_u32("tin", self.interval);
        record.put_bool("tab", self.absolute);
    }

    fn get_state(&mut self, reader: &mut RecordReader<'_>) {
        self.time = reader.get_u32("ttm");
        self.interval = reader.get_u32("tin");
        self.absolute = reader.get_bool("tab");
    }
}

impl EventType for TimeEvent {
    const NAME: &'static str = "time_event";
}
