use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::Deserialize;

/// Backoff a worker sleeps after the gate turned a message away.
pub const DEFAULT_GATE_BACKOFF: Duration = Duration::from_secs(60);

// ═══════════════════════════════════════════════════════════════
//  Clock
// ═══════════════════════════════════════════════════════════════

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to. Used to pin the gate in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.lock();
        *guard += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        match self.now.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Schedule
// ═══════════════════════════════════════════════════════════════

fn default_first_day() -> Weekday {
    Weekday::Mon
}
fn default_last_day() -> Weekday {
    Weekday::Fri
}
fn default_opens() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}
fn default_closes() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default()
}

/// Weekly processing window: `first_day..=last_day`, `opens..closes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Schedule {
    #[serde(default = "default_first_day")]
    pub first_day: Weekday,
    #[serde(default = "default_last_day")]
    pub last_day: Weekday,
    /// Inclusive.
    #[serde(default = "default_opens")]
    pub opens: NaiveTime,
    /// Exclusive.
    #[serde(default = "default_closes")]
    pub closes: NaiveTime,
}

impl Default for Schedule {
    /// Monday to Friday, 09:00 to 19:00.
    fn default() -> Self {
        Self {
            first_day: default_first_day(),
            last_day: default_last_day(),
            opens: default_opens(),
            closes: default_closes(),
        }
    }
}

impl Schedule {
    /// Whether a message may be processed at local time `now`.
    pub fn admits(&self, now: NaiveDateTime) -> bool {
        let day = now.weekday().num_days_from_monday();
        if day < self.first_day.num_days_from_monday() || day > self.last_day.num_days_from_monday() {
            return false;
        }
        let time = now.time();
        time >= self.opens && time < self.closes
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.first_day.num_days_from_monday() > self.last_day.num_days_from_monday() {
            return Err(format!(
                "schedule: first_day {} comes after last_day {}",
                self.first_day, self.last_day
            ));
        }
        if self.opens >= self.closes {
            return Err(format!(
                "schedule: opens {} must be before closes {}",
                self.opens, self.closes
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  AdmissionGate
// ═══════════════════════════════════════════════════════════════

/// Schedule bound to a clock, plus the backoff applied on rejection.
#[derive(Clone)]
pub struct AdmissionGate {
    schedule: Schedule,
    clock: Arc<dyn Clock>,
    backoff: Duration,
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("schedule", &self.schedule)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl AdmissionGate {
    pub fn new(schedule: Schedule, clock: Arc<dyn Clock>, backoff: Duration) -> Self {
        Self {
            schedule,
            clock,
            backoff,
        }
    }

    pub fn admit_now(&self) -> bool {
        self.schedule.admits(self.clock.now())
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::*;

    // 2024-01-01 is a Monday.
    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn weekday_business_hours_are_admitted() {
        let schedule = Schedule::default();
        assert!(schedule.admits(at(1, 9, 0, 0)));
        assert!(schedule.admits(at(3, 12, 30, 0)));
        assert!(schedule.admits(at(5, 18, 59, 59)));
    }

    #[test]
    fn closing_time_is_exclusive() {
        let schedule = Schedule::default();
        assert!(!schedule.admits(at(1, 19, 0, 0)));
        assert!(!schedule.admits(at(1, 8, 59, 59)));
    }

    #[test]
    fn weekend_is_rejected() {
        let schedule = Schedule::default();
        assert!(!schedule.admits(at(6, 12, 0, 0)));
        assert!(!schedule.admits(at(7, 9, 0, 0)));
    }

    #[test]
    fn gate_follows_manual_clock() {
        let clock = Arc::new(ManualClock::new(at(6, 10, 0, 0)));
        let gate = AdmissionGate::new(Schedule::default(), clock.clone(), DEFAULT_GATE_BACKOFF);
        assert!(!gate.admit_now());

        clock.advance(TimeDelta::days(2));
        assert!(gate.admit_now());

        clock.set(at(8, 20, 0, 0));
        assert!(!gate.admit_now());
    }

    #[test]
    fn schedule_validation() {
        assert!(Schedule::default().validate().is_ok());

        let inverted_days = Schedule {
            first_day: Weekday::Fri,
            last_day: Weekday::Mon,
            ..Schedule::default()
        };
        assert!(inverted_days.validate().is_err());

        let empty_window = Schedule {
            opens: default_closes(),
            closes: default_opens(),
            ..Schedule::default()
        };
        assert!(empty_window.validate().is_err());
    }

    proptest! {
        #[test]
        fn admits_iff_weekday_between_nine_and_nineteen(
            day_offset in 0i64..3650,
            secs in 0u32..86_400,
        ) {
            let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + TimeDelta::days(day_offset);
            let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap();
            let now = date.and_time(time);

            let weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
            let hour = secs / 3600;
            let expected = !weekend && (9..19).contains(&hour);
            prop_assert_eq!(Schedule::default().admits(now), expected);
        }
    }
}
