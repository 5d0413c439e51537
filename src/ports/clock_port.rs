//! Time source port trait.

use chrono::{DateTime, Utc};

pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}
