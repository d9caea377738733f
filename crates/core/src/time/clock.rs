//! Game clock

use tidings_record::{Record, RecordError, RecordReader};

use super::TimeEvent;
use crate::config::ClockConfig;
use crate::events::dispatch;

/// Advances game time from the update loop
#[derive(Debug, Clone, PartialEq)]
pub struct GameClock {
    /// Game seconds since the start of the game
    time: u32,
    /// Update cycles per game second
    scale: f32,
    /// Game seconds between two time events
    resolution: u16,
    /// Cycles accumulated towards the next second
    ticks: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(&ClockConfig::default())
    }
}

impl GameClock {
    /// Clock at time zero
    ///
    /// A non-positive scale or a zero resolution falls back to the default
    /// with a warning.
    pub fn new(config: &ClockConfig) -> Self {
        let mut clock = Self {
            time: 0,
            scale: config.scale,
            resolution: config.resolution,
            ticks: 0.0,
        };
        clock.sanitize();
        clock
    }

    fn sanitize(&mut self) {
        let defaults = ClockConfig::default();
        if self.scale.is_nan() || self.scale <= 0.0 {
            tracing::warn!("Invalid clock scale {}, using {}", self.scale, defaults.scale);
            self.scale = defaults.scale;
        }
        if self.resolution == 0 {
            tracing::warn!("Invalid clock resolution 0, using {}", defaults.resolution);
            self.resolution = defaults.resolution;
        }
    }

    /// Current game time in seconds
    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn set_time(&mut self, time: u32) {
        self.time = time;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    /// Advance by `cycles` update cycles
    ///
    /// Raises a [`TimeEvent`] for every passed second that is a multiple of
    /// the resolution. Pass the number of cycles since the last call,
    /// missed frames included.
    pub fn update(&mut self, cycles: u32) {
        self.ticks += f64::from(cycles);
        let scale = f64::from(self.scale);

        while self.ticks >= scale {
            self.ticks -= scale;
            self.time = self.time.wrapping_add(1);

            if self.time % u32::from(self.resolution) == 0 {
                dispatch::raise(&TimeEvent::at(self.time));
            }
        }
    }

    /// Approximate game seconds for a span of real time
    ///
    /// `slice_millis` is the real-time length of one update cycle.
    pub fn convert_millis(&self, millis: u32, slice_millis: u32) -> u32 {
        if slice_millis == 0 {
            return 0;
        }
        (millis as f32 / slice_millis as f32 / self.scale) as u32
    }

    pub fn weekday(&self) -> u32 {
        super::weekday(self.time)
    }

    pub fn day(&self) -> u32 {
        super::day(self.time)
    }

    pub fn hour(&self) -> u32 {
        super::hour(self.time)
    }

    pub fn minute(&self) -> u32 {
        super::minute(self.time)
    }

    /// Render the current time, see [`format_time`](super::format_time)
    pub fn format(&self, format: &str) -> String {
        super::format_time(format, self.time)
    }

    pub fn put_state(&self, record: &mut Record) {
        record.put_u32("time", self.time);
        record.put_f32("scale", self.scale);
        record.put_u16("resolution", self.resolution);
    }

    /// Restore time, scale and resolution
    ///
    /// Leaves the clock untouched on failure.
    pub fn get_state(&mut self, reader: &mut RecordReader<'_>) -> Result<(), RecordError> {
        let time = reader.get_u32("time");
        let scale = reader.get_f32("scale");
        let resolution = reader.get_u16("resolution");
        reader.finish()?;

        self.time = time;
        self.scale = scale;
        self.resolution = resolution;
        self.ticks = 0.0;
        self.sanitize();
        Ok(())
    }
}
