use chrono::{Datelike, Timelike};
use instant::Instant;

/// Wall-clock reading taken once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSample {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millis: u32,
    /// Calendar day of month (1-31).
    pub day: u32,
    /// Monotonic milliseconds since the app started.
    pub now_ms: f64,
}

impl ClockSample {
    /// Read the local clock. `epoch` anchors the monotonic timestamp.
    pub fn sample(epoch: Instant) -> Self {
        let now = chrono::Local::now();
        Self::from_datetime(&now, epoch.elapsed().as_secs_f64() * 1000.0)
    }

    /// Convert any chrono date-time into a sample.
    pub fn from_datetime<T: Datelike + Timelike>(dt: &T, now_ms: f64) -> Self {
        Self {
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            // Leap seconds report nanos >= 1e9.
            millis: (dt.nanosecond() / 1_000_000).min(999),
            day: dt.day(),
            now_ms,
        }
    }

    /// Digital readout, e.g. `05 : 30 : 09`.
    pub fn readout(&self) -> String {
        format!("{:02} : {:02} : {:02}", self.hour, self.minute, self.second)
    }
}

#[cfg(test)]
pub(crate) fn at(day: u32, hour: u32, minute: u32, second: u32, millis: u32, now_ms: f64) -> ClockSample {
    let dt = chrono::NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_milli_opt(hour, minute, second, millis))
        .expect("valid test time");
    ClockSample::from_datetime(&dt, now_ms)
}
