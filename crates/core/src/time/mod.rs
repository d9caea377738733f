//! Game time
//!
//! Game time is counted in seconds since the start of the game. A
//! [`GameClock`] advances it from the update loop and raises a
//! [`TimeEvent`] whenever a resolution step passes; listeners use time
//! events as alarms.
//!
//! # Example
//!
//! ```ignore
//! use tidings_core::time::{self, GameClock, TimeEvent};
//!
//! time::init()?;
//! let mut clock = GameClock::new(&config.clock);
//!
//! let alarm = TimeEvent::after(clock.time(), "1h").with_interval("1d", -1);
//! factory.add_native(alarm, |_, _| tracing::info!("Shop opens"));
//!
//! loop {
//!     clock.update(1);
//!     tidings_core::update();
//! }
//! ```

mod clock;
mod event;

use std::sync::{Arc, LazyLock};

use crate::events::{register_event_type, EventTypeId};
use crate::managers::{DispatchManager, ImmediateManager};
use crate::EventError;

pub use clock::GameClock;
pub use event::TimeEvent;

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;
pub const HOURS_PER_DAY: u32 = 24;
pub const SECONDS_PER_DAY: u32 = HOURS_PER_DAY * SECONDS_PER_HOUR;
pub const DAYS_PER_WEEK: u32 = 7;

/// Manager dispatching time events
static TIME_MANAGER: LazyLock<Arc<ImmediateManager>> =
    LazyLock::new(|| Arc::new(ImmediateManager::new()));

/// Register the time event type
///
/// Idempotent; call once at start-up before adding time listeners.
pub fn init() -> Result<EventTypeId, EventError> {
    let manager: Arc<dyn DispatchManager> = TIME_MANAGER.clone();
    register_event_type::<TimeEvent>(manager)
}

/// Day of the week, `0..DAYS_PER_WEEK`
pub fn weekday(time: u32) -> u32 {
    day(time) % DAYS_PER_WEEK
}

/// Days since the start of the game
pub fn day(time: u32) -> u32 {
    time / SECONDS_PER_DAY
}

/// Hour of the day, `0..HOURS_PER_DAY`
pub fn hour(time: u32) -> u32 {
    (time / SECONDS_PER_HOUR) % HOURS_PER_DAY
}

/// Minute of the hour, `0..60`
pub fn minute(time: u32) -> u32 {
    (time / SECONDS_PER_MINUTE) % 60
}

/// Convert a duration string to seconds
///
/// The string is a sequence of `<number><unit>` pairs with units (w)eek,
/// (d)ay, (h)our, (m)inute and (s)econd, e.g. "1w1d", "30m1h" or "1h1h".
/// Unknown units and a trailing number without unit are logged and
/// ignored.
pub fn parse_time(spec: &str) -> u32 {
    let mut secs: u32 = 0;
    let mut number: u32 = 0;

    for c in spec.chars() {
        if let Some(digit) = c.to_digit(10) {
            number = number.saturating_mul(10).saturating_add(digit);
            continue;
        }
        if !c.is_alphabetic() {
            continue;
        }

        let unit = match c {
            'w' => DAYS_PER_WEEK * SECONDS_PER_DAY,
            'd' => SECONDS_PER_DAY,
            'h' => SECONDS_PER_HOUR,
            'm' => SECONDS_PER_MINUTE,
            's' => 1,
            _ => {
                tracing::warn!("Unknown time specifier '{}' in '{}'", c, spec);
                0
            }
        };
        secs = secs.saturating_add(number.saturating_mul(unit));
        number = 0;
    }

    if number != 0 {
        tracing::warn!("Time specifier missing at end of '{}'", spec);
    }
    secs
}

/// Render a game time
///
/// Recognised codes: `%w` weekday, `%d` day, `%h` hour, `%m` minute and
/// `%%` for a literal percent sign. Anything else is copied unchanged.
pub fn format_time(format: &str, time: u32) -> String {
    let mut result = String::with_capacity(format.len());
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('w') => result.push_str(&weekday(time).to_string()),
            Some('d') => result.push_str(&day(time).to_string()),
            Some('h') => result.push_str(&hour(time).to_string()),
            Some('m') => result.push_str(&minute(time).to_string()),
            Some('%') => result.push('%'),
            Some(other) => {
                result.push('%');
                result.push(other);
            }
            None => result.push('%'),
        }
    }
    result
}
