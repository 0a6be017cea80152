use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use courier_engine::{
    BoxError, CancellationToken, ConsumerConfig, ConsumerPool, ProducerConfig, Publisher,
};
use courier_models::UserCreated;
use courier_transport_memory::MemoryBroker;

use crate::config::{AdminConfig, DemoArgs};
use crate::error::AdminError;

const DEMO_TOPIC: &str = "users";
const DEMO_GROUP: &str = "courier-demo";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Round-trip sample `UserCreated` records through an in-process broker.
///
/// Topic, group and pool settings come from the `[consumer]` section when
/// present; broker addresses are ignored.
pub async fn run(config_path: Option<&str>, args: DemoArgs) -> Result<(), AdminError> {
    let config = AdminConfig::load(config_path)?;
    let mut consumer = config
        .consumer
        .unwrap_or_else(|| ConsumerConfig::new(vec!["memory".into()], DEMO_TOPIC, DEMO_GROUP));
    if let Some(workers) = args.workers {
        consumer.num_workers = workers;
    }
    let producer = config
        .producer
        .unwrap_or_else(|| ProducerConfig::new(consumer.brokers.clone(), consumer.topic.clone()));
    if producer.topic != consumer.topic {
        return Err(AdminError::Demo(format!(
            "producer topic '{}' differs from consumer topic '{}'",
            producer.topic, consumer.topic
        )));
    }

    let broker = MemoryBroker::default();
    broker.create_topic(&consumer.topic);
    let reader = broker.reader(&consumer.topic, &consumer.group_id)?;
    let writer = broker.writer(&producer.topic)?;

    let token = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handler = move |_ctx: CancellationToken, event: UserCreated| {
        let tx = tx.clone();
        async move {
            tracing::info!(id = %event.id, email = %event.email, name = %event.name, "received");
            tx.send(event.id).map_err(|e| e.to_string())?;
            Ok::<(), BoxError>(())
        }
    };

    let mut pool = ConsumerPool::<UserCreated>::new(consumer, Arc::new(reader))?;
    pool.start(&token, handler)?;

    let publisher = Publisher::new(producer, Arc::new(writer))?;
    for n in 1..=args.count {
        let event = UserCreated {
            id: format!("user-{n}"),
            email: format!("user{n}@example.com"),
            name: format!("Demo User {n}"),
        };
        publisher.publish(&event).await?;
    }
    tracing::info!(count = args.count, topic = %publisher.topic(), "published");

    let received = tokio::select! {
        received = collect(&mut rx, args.count) => received,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupted");
            None
        }
    };

    token.cancel();
    pool.close().await?;
    publisher.close().await?;

    match received {
        Some(n) => {
            println!("published {} and consumed {n} records", args.count);
            Ok(())
        }
        None => Err(AdminError::Demo(format!(
            "not every record arrived within {}s",
            DELIVERY_TIMEOUT.as_secs()
        ))),
    }
}

/// Wait for `expected` deliveries. `None` on timeout.
async fn collect(rx: &mut mpsc::UnboundedReceiver<String>, expected: usize) -> Option<usize> {
    let deadline = tokio::time::Instant::now() + DELIVERY_TIMEOUT;
    let mut received = 0;
    while received < expected {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(_)) => received += 1,
            Ok(None) | Err(_) => return None,
        }
    }
    Some(received)
}
