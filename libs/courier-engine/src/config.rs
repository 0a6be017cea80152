use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;
use crate::gate::Schedule;

// ═══════════════════════════════════════════════════════════════
//  Credentials
// ═══════════════════════════════════════════════════════════════

/// SASL credentials. The password never shows up in `Debug` output.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &password)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Consumer Config
// ═══════════════════════════════════════════════════════════════

/// Worker pool configuration. Immutable once the pool is built.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
    /// Number of concurrent worker loops sharing the reader.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub sasl: bool,
    #[serde(default)]
    pub tls: bool,
    /// Only process messages inside `schedule`.
    #[serde(default)]
    pub business_hours: bool,
    #[serde(default)]
    pub schedule: Schedule,
    /// Sleep after the gate rejected a message.
    #[serde(default = "default_gate_backoff_secs")]
    pub gate_backoff_secs: u64,
    /// Sleep after a transient read error.
    #[serde(default = "default_read_retry_ms")]
    pub read_retry_ms: u64,
}

fn default_num_workers() -> usize {
    1
}
fn default_gate_backoff_secs() -> u64 {
    60
}
fn default_read_retry_ms() -> u64 {
    1000
}

impl ConsumerConfig {
    /// Minimal configuration with every optional setting at its default.
    pub fn new(
        brokers: Vec<String>,
        topic: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            group_id: group_id.into(),
            num_workers: default_num_workers(),
            credentials: Credentials::default(),
            sasl: false,
            tls: false,
            business_hours: false,
            schedule: Schedule::default(),
            gate_backoff_secs: default_gate_backoff_secs(),
            read_retry_ms: default_read_retry_ms(),
        }
    }

    pub fn gate_backoff(&self) -> Duration {
        Duration::from_secs(self.gate_backoff_secs)
    }

    pub fn read_retry(&self) -> Duration {
        Duration::from_millis(self.read_retry_ms)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        validate_brokers(&self.brokers)?;
        if self.topic.trim().is_empty() {
            return Err(EngineError::Config("topic is empty".into()));
        }
        if self.group_id.trim().is_empty() {
            return Err(EngineError::Config("group_id is empty".into()));
        }
        if self.num_workers == 0 {
            return Err(EngineError::Config("num_workers must be at least 1".into()));
        }
        if self.read_retry_ms == 0 {
            return Err(EngineError::Config("read_retry_ms must be at least 1".into()));
        }
        validate_sasl(self.sasl, &self.credentials)?;
        if self.business_hours {
            if self.gate_backoff_secs == 0 {
                return Err(EngineError::Config(
                    "gate_backoff_secs must be at least 1 when business_hours is set".into(),
                ));
            }
            self.schedule.validate().map_err(EngineError::Config)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Producer Config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ProducerConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub sasl: bool,
    #[serde(default)]
    pub tls: bool,
}

impl ProducerConfig {
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            credentials: Credentials::default(),
            sasl: false,
            tls: false,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        validate_brokers(&self.brokers)?;
        if self.topic.trim().is_empty() {
            return Err(EngineError::Config("topic is empty".into()));
        }
        validate_sasl(self.sasl, &self.credentials)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════

fn validate_brokers(brokers: &[String]) -> Result<(), EngineError> {
    if brokers.is_empty() {
        return Err(EngineError::Config("no brokers specified".into()));
    }
    if brokers.iter().any(|b| b.trim().is_empty()) {
        return Err(EngineError::Config("broker address is blank".into()));
    }
    Ok(())
}

fn validate_sasl(sasl: bool, credentials: &Credentials) -> Result<(), EngineError> {
    if sasl && credentials.username.is_empty() {
        return Err(EngineError::Config("sasl enabled without username".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Weekday};

    use super::*;

    fn consumer() -> ConsumerConfig {
        ConsumerConfig::new(vec!["localhost:9092".into()], "events", "billing")
    }

    #[test]
    fn parses_consumer_with_defaults() {
        let cfg: ConsumerConfig = toml::from_str(
            r#"
            brokers = ["b1:9092", "b2:9092"]
            topic = "events"
            group_id = "billing"
            username = "svc"
            password = "secret"
            sasl = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.brokers.len(), 2);
        assert_eq!(cfg.num_workers, 1);
        assert_eq!(cfg.credentials.username, "svc");
        assert!(cfg.sasl && !cfg.tls && !cfg.business_hours);
        assert_eq!(cfg.schedule, Schedule::default());
        assert_eq!(cfg.gate_backoff(), Duration::from_secs(60));
        assert_eq!(cfg.read_retry(), Duration::from_secs(1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_custom_schedule() {
        let cfg: ConsumerConfig = toml::from_str(
            r#"
            brokers = ["b1:9092"]
            topic = "events"
            group_id = "billing"
            num_workers = 4
            business_hours = true

            [schedule]
            first_day = "Tue"
            opens = "08:30:00"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.num_workers, 4);
        assert_eq!(cfg.schedule.first_day, Weekday::Tue);
        assert_eq!(cfg.schedule.last_day, Weekday::Fri);
        assert_eq!(cfg.schedule.opens, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_empty_broker_list() {
        let cfg = ConsumerConfig {
            brokers: vec![],
            ..consumer()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::Config(msg)) if msg.contains("no brokers")));

        let producer = ProducerConfig::new(vec![" ".into()], "events");
        assert!(matches!(producer.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn rejects_zero_workers_and_missing_names() {
        assert!(ConsumerConfig { num_workers: 0, ..consumer() }.validate().is_err());
        assert!(ConsumerConfig { topic: "".into(), ..consumer() }.validate().is_err());
        assert!(ConsumerConfig { group_id: " ".into(), ..consumer() }.validate().is_err());
    }

    #[test]
    fn rejects_zero_delays() {
        let err = ConsumerConfig { read_retry_ms: 0, ..consumer() }.validate().unwrap_err();
        assert!(matches!(&err, EngineError::Config(msg) if msg.contains("read_retry_ms")), "got {err:?}");

        let gated = ConsumerConfig { business_hours: true, gate_backoff_secs: 0, ..consumer() };
        let err = gated.validate().unwrap_err();
        assert!(matches!(&err, EngineError::Config(msg) if msg.contains("gate_backoff_secs")), "got {err:?}");

        // backoff is never slept without the gate
        assert!(ConsumerConfig { gate_backoff_secs: 0, ..consumer() }.validate().is_ok());
    }

    #[test]
    fn rejects_sasl_without_username() {
        let cfg = ConsumerConfig { sasl: true, ..consumer() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn schedule_is_checked_only_when_gate_enabled() {
        let bad = Schedule {
            opens: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            ..Schedule::default()
        };
        assert!(ConsumerConfig { schedule: bad, ..consumer() }.validate().is_ok());
        assert!(
            ConsumerConfig { schedule: bad, business_hours: true, ..consumer() }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn debug_hides_password() {
        let credentials = Credentials {
            username: "svc".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("hunter2"));
    }
}
