//! Simulated clock
//!
//! Tracks elapsed simulated seconds and the current day. Days are numbered
//! from 1. Crossing a day boundary is reported once by `advance`.

use serde::{Deserialize, Serialize};

/// Time of day, used to flavour prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    Morning,    // 06:00-12:00
    Afternoon,  // 12:00-18:00
    Evening,    // 18:00-22:00
    Night,      // 22:00-06:00
}

impl TimePeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=21 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    elapsed: f64,
    seconds_per_day: f64,
}

impl Calendar {
    pub fn new(seconds_per_day: f32) -> Self {
        Self {
            elapsed: 0.0,
            seconds_per_day: f64::from(seconds_per_day),
        }
    }

    /// Advance by `dt` simulated seconds.
    ///
    /// Returns the day that just finished when this step crossed a boundary.
    /// A step spanning several days reports only the last finished one.
    pub fn advance(&mut self, dt: f32) -> Option<u32> {
        let before = self.current_day();
        self.elapsed += f64::from(dt.max(0.0));
        let after = self.current_day();
        (after > before).then(|| after - 1)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn current_day(&self) -> u32 {
        (self.elapsed / self.seconds_per_day) as u32 + 1
    }

    /// Hour of the simulated day (0..24). Day starts at 06:00.
    pub fn current_hour(&self) -> u32 {
        let fraction = (self.elapsed % self.seconds_per_day) / self.seconds_per_day;
        ((fraction * 24.0) as u32 + 6) % 24
    }

    pub fn current_time_period(&self) -> TimePeriod {
        TimePeriod::from_hour(self.current_hour())
    }

    pub fn seconds_per_day(&self) -> f32 {
        self.seconds_per_day as f32
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(600.0)
    }
}
