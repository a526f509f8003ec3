use core::fmt;

use serde::{Deserialize, Serialize};

/// Coarse motion activity reported by the activity recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Walking,
    Running,
    Automotive,
    Cycling,
    Stationary,
    /// A sample arrived but none of the known activities was flagged
    Unknown,
}

impl Activity {
    /// Label used in readings and exports
    pub const fn label(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Automotive => "automotive",
            Self::Cycling => "cycling",
            Self::Stationary => "stationary",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw activity flags as delivered by the platform.
///
/// Several flags can be set at once; [`ActivitySample::activity`] resolves
/// them with the precedence walking, running, automotive, cycling, stationary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivitySample {
    pub walking: bool,
    pub running: bool,
    pub automotive: bool,
    pub cycling: bool,
    pub stationary: bool,
}

impl ActivitySample {
    /// Sample with exactly one flag set.
    pub fn only(activity: Activity) -> Self {
        let mut sample = Self::default();
        match activity {
            Activity::Walking => sample.walking = true,
            Activity::Running => sample.running = true,
            Activity::Automotive => sample.automotive = true,
            Activity::Cycling => sample.cycling = true,
            Activity::Stationary => sample.stationary = true,
            Activity::Unknown => {}
        }
        sample
    }

    pub fn activity(&self) -> Activity {
        if self.walking {
            Activity::Walking
        } else if self.running {
            Activity::Running
        } else if self.automotive {
            Activity::Automotive
        } else if self.cycling {
            Activity::Cycling
        } else if self.stationary {
            Activity::Stationary
        } else {
            Activity::Unknown
        }
    }
}

impl From<Activity> for ActivitySample {
    fn from(activity: Activity) -> Self {
        Self::only(activity)
    }
}
