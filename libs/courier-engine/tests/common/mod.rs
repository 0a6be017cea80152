#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::mpsc;

use courier_engine::{BoxError, CancellationToken, ConsumerConfig, Handler, ProducerConfig};
use courier_models::UserCreated;
use courier_transport_memory::MemoryBroker;

pub const TOPIC: &str = "users";
pub const GROUP: &str = "billing";

pub fn broker() -> Arc<MemoryBroker> {
    let broker = MemoryBroker::default();
    broker.create_topic(TOPIC);
    Arc::new(broker)
}

pub fn consumer_config(num_workers: usize) -> ConsumerConfig {
    ConsumerConfig {
        num_workers,
        ..ConsumerConfig::new(vec!["memory".into()], TOPIC, GROUP)
    }
}

pub fn producer_config() -> ProducerConfig {
    ProducerConfig::new(vec!["memory".into()], TOPIC)
}

pub fn user(n: usize) -> UserCreated {
    UserCreated {
        id: format!("u-{n}"),
        email: format!("user{n}@example.com"),
        name: format!("User {n}"),
    }
}

/// 2024-01-01 is a Monday, 2024-01-06 a Saturday.
pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Handler forwarding every record into a channel.
pub fn forward(tx: mpsc::UnboundedSender<UserCreated>) -> impl Handler<UserCreated> {
    move |_ctx: CancellationToken, event: UserCreated| {
        let tx = tx.clone();
        async move {
            tx.send(event).map_err(|e| e.to_string())?;
            Ok::<(), BoxError>(())
        }
    }
}
