//! Exponentially-decaying activity estimate with an edge-triggered alert.
//!
//! The monitor keeps a single accumulator instead of an event history. Each
//! observation first decays the accumulator by `e^(-Δt/period)` for the time
//! elapsed since the previous observation and then adds its weight, so the
//! level approximates "events in roughly the last `period`".

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error("period must be a positive number of seconds, got {0}")]
    InvalidPeriod(f64),

    #[error("threshold must be positive, got {0}")]
    InvalidThreshold(f64),

    #[error("weight must be a finite non-negative number, got {0}")]
    InvalidWeight(f64),

    #[error("timestamp {given} is earlier than the last observation at {last}")]
    NonMonotonic {
        given: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    level: f64,
    last_timestamp: Option<DateTime<Utc>>,
    alerting: bool,
    period_secs: f64,
    threshold: f64,
}

impl ActivityMonitor {
    pub fn new(period_secs: f64, threshold: f64) -> Result<Self, MonitorError> {
        if !(period_secs.is_finite() && period_secs > 0.0) {
            return Err(MonitorError::InvalidPeriod(period_secs));
        }
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(MonitorError::InvalidThreshold(threshold));
        }
        Ok(Self {
            level: 0.0,
            last_timestamp: None,
            alerting: false,
            period_secs,
            threshold,
        })
    }

    pub fn period_secs(&self) -> f64 {
        self.period_secs
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    /// Record an observation of `weight` at `timestamp`.
    ///
    /// Returns `true` only on the transition into the alerting state.
    /// A rejected call leaves the monitor unchanged.
    pub fn update(&mut self, timestamp: DateTime<Utc>, weight: f64) -> Result<bool, MonitorError> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(MonitorError::InvalidWeight(weight));
        }
        self.level = self.level_at(timestamp)? + weight;
        self.last_timestamp = Some(timestamp);

        if self.last_frequency() > self.threshold {
            let new_alert = !self.alerting;
            self.alerting = true;
            Ok(new_alert)
        } else {
            self.alerting = false;
            Ok(false)
        }
    }

    /// Decayed level as of `timestamp`, without touching the stored state.
    pub fn level_at(&self, timestamp: DateTime<Utc>) -> Result<f64, MonitorError> {
        let Some(last) = self.last_timestamp else {
            return Ok(self.level);
        };
        if timestamp < last {
            return Err(MonitorError::NonMonotonic {
                given: timestamp,
                last,
            });
        }
        let elapsed = (timestamp - last).num_microseconds().map_or(f64::INFINITY, |us| us as f64 / 1e6);
        Ok(self.level * (-elapsed / self.period_secs).exp())
    }

    /// Events per second as of `timestamp`.
    pub fn frequency(&self, timestamp: DateTime<Utc>) -> Result<f64, MonitorError> {
        Ok(self.level_at(timestamp)? / self.period_secs)
    }

    /// Events per second as of now.
    pub fn frequency_now(&self) -> Result<f64, MonitorError> {
        self.frequency(Utc::now())
    }

    /// Events per second as of the most recent observation.
    pub fn last_frequency(&self) -> f64 {
        self.level / self.period_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::microseconds((s * 1e6) as i64)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert_eq!(ActivityMonitor::new(0.0, 1.0).unwrap_err(), MonitorError::InvalidPeriod(0.0));
        assert_eq!(ActivityMonitor::new(5.0, -1.0).unwrap_err(), MonitorError::InvalidThreshold(-1.0));
        assert!(ActivityMonitor::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_single_event_frequency_and_decay() {
        let mut monitor = ActivityMonitor::new(10.0, 100.0).unwrap();
        monitor.update(t0(), 1.0).unwrap();

        assert!(approx(monitor.frequency(t0()).unwrap(), 0.1));
        let later = monitor.frequency(t0() + secs(10.0)).unwrap();
        assert!(approx(later, 0.1 * (-1.0f64).exp()));
    }

    #[test]
    fn test_queries_do_not_compound_decay() {
        let mut monitor = ActivityMonitor::new(5.0, 100.0).unwrap();
        monitor.update(t0(), 1.0).unwrap();

        let first = monitor.frequency(t0() + secs(5.0)).unwrap();
        let _ = monitor.frequency(t0() + secs(2.0)).unwrap();
        let again = monitor.frequency(t0() + secs(5.0)).unwrap();
        assert!(approx(first, again));
        assert!(approx(monitor.last_frequency(), 0.2));
    }

    #[test]
    fn test_update_decays_then_adds_weight() {
        let mut monitor = ActivityMonitor::new(5.0, 100.0).unwrap();
        monitor.update(t0(), 2.0).unwrap();
        monitor.update(t0() + secs(5.0), 1.0).unwrap();
        let expected_level = 2.0 * (-1.0f64).exp() + 1.0;
        assert!(approx(monitor.frequency(t0() + secs(5.0)).unwrap(), expected_level / 5.0));
    }

    #[test]
    fn test_non_monotonic_timestamp_is_rejected() {
        let mut monitor = ActivityMonitor::new(5.0, 1.0).unwrap();
        monitor.update(t0(), 1.0).unwrap();
        let err = monitor.update(t0() - secs(1.0), 1.0).unwrap_err();
        assert!(matches!(err, MonitorError::NonMonotonic { .. }));
        assert!(monitor.frequency(t0() - secs(1.0)).is_err());
        // State is untouched by the rejected call.
        assert!(approx(monitor.last_frequency(), 0.2));
        assert_eq!(monitor.last_timestamp(), Some(t0()));
    }

    #[test]
    fn test_invalid_weight_is_rejected() {
        let mut monitor = ActivityMonitor::new(5.0, 1.0).unwrap();
        monitor.update(t0(), 1.0).unwrap();

        assert_eq!(
            monitor.update(t0() + secs(1.0), -3.0).unwrap_err(),
            MonitorError::InvalidWeight(-3.0)
        );
        assert!(matches!(
            monitor.update(t0() + secs(1.0), f64::NAN),
            Err(MonitorError::InvalidWeight(_))
        ));
        assert!(monitor.update(t0(), f64::INFINITY).is_err());
        assert!(approx(monitor.last_frequency(), 0.2));
        assert_eq!(monitor.last_timestamp(), Some(t0()));

        // Zero weight only decays.
        assert!(!monitor.update(t0() + secs(5.0), 0.0).unwrap());
        assert!(approx(monitor.last_frequency(), 0.2 * (-1.0f64).exp()));
    }

    #[test]
    fn test_alert_is_edge_triggered() {
        // threshold 0.5 events/s with a 5 s period: level above 2.5 alerts.
        let mut monitor = ActivityMonitor::new(5.0, 0.5).unwrap();
        let t = t0();
        assert!(!monitor.update(t, 1.0).unwrap());
        assert!(!monitor.update(t, 1.0).unwrap());
        assert!(monitor.update(t, 1.0).unwrap(), "first breach alerts");
        assert!(!monitor.update(t, 1.0).unwrap(), "still over threshold, no new alert");
        assert!(monitor.is_alerting());

        // A long quiet spell brings the level back under the threshold.
        let quiet = t + secs(60.0);
        assert!(!monitor.update(quiet, 1.0).unwrap());
        assert!(!monitor.is_alerting());

        assert!(!monitor.update(quiet, 1.0).unwrap());
        assert!(monitor.update(quiet, 1.0).unwrap(), "a fresh breach alerts again");
    }

    #[test]
    fn test_equal_to_threshold_is_not_over() {
        let mut monitor = ActivityMonitor::new(2.0, 0.5).unwrap();
        assert!(!monitor.update(t0(), 1.0).unwrap());
        assert!(!monitor.is_alerting());
    }
}
