//! Integration tests against a locally running AMQP broker.
//!
//! Ignored by default; run with `cargo test -- --ignored` once a broker is
//! listening on the endpoint described by `AMQP_HOST`/`AMQP_PORT` (default
//! localhost:5672).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use taskbus::amqp::{AmqpConnection, ExchangeKind, Publisher, Subscriber};
use taskbus::AmqpConfig;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn fanout_roundtrip_with_single_ack() {
    init_tracing();
    let config = AmqpConfig::from_env();

    let subscriber = Subscriber::new(AmqpConnection::connect(&config).await.unwrap());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let loop_cancel = cancel.clone();
    let consumer = tokio::spawn(async move {
        subscriber
            .subscribe(
                "#",
                "", // server-assigned ephemeral queue
                true,
                "itest_fanout",
                ExchangeKind::Fanout,
                move |routing_key, payload| {
                    let tx = tx.clone();
                    async move {
                        tx.send((routing_key, payload)).unwrap();
                    }
                },
                loop_cancel,
            )
            .await
    });

    // Let the binding land before publishing; a fanout message published
    // before the bind is simply dropped.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let publisher = Publisher::new(AmqpConnection::connect(&config).await.unwrap());
    publisher
        .publish(b"hello", "log.info", "itest_fanout", ExchangeKind::Fanout)
        .await
        .unwrap();

    let (routing_key, payload) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no delivery within timeout")
        .unwrap();
    assert_eq!(routing_key, "log.info");
    assert_eq!(payload, b"hello");

    cancel.cancel();
    consumer.await.unwrap().unwrap();
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn publish_error_propagates_and_releases_the_connection() {
    init_tracing();
    let config = AmqpConfig::from_env();

    let conn = AmqpConnection::connect(&config).await.unwrap();
    conn.declare_exchange("itest_conflict", ExchangeKind::Fanout)
        .await
        .unwrap();
    conn.close().await.unwrap();

    // Redeclaring the exchange with a different kind is refused by the
    // broker; the declare error comes back and the publisher's one-shot
    // connection is closed on this path too.
    let publisher = Publisher::new(AmqpConnection::connect(&config).await.unwrap());
    let result = publisher
        .publish(b"x", "k", "itest_conflict", ExchangeKind::Topic)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn log_queue_gets_server_assigned_name() {
    init_tracing();
    let config = AmqpConfig::from_env();
    let conn = AmqpConnection::connect(&config).await.unwrap();

    let name = conn.declare_queue("", true).await.unwrap();
    assert!(!name.is_empty());

    conn.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn log_queue_is_exclusive_to_its_connection() {
    init_tracing();
    let config = AmqpConfig::from_env();

    let owner = AmqpConnection::connect(&config).await.unwrap();
    let name = owner.declare_queue("itest_log_queue", true).await.unwrap();
    assert_eq!(name, "itest_log_queue");

    // A second connection redeclaring the same exclusive queue is refused.
    let intruder = AmqpConnection::connect(&config).await.unwrap();
    let result = intruder.declare_queue("itest_log_queue", true).await;
    assert!(result.is_err());

    owner.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn durable_queue_is_shared_across_connections() {
    init_tracing();
    let config = AmqpConfig::from_env();

    let first = AmqpConnection::connect(&config).await.unwrap();
    first.declare_queue("itest_durable", false).await.unwrap();
    first.close().await.unwrap();

    // Durable queues survive the declaring connection and accept redeclares.
    let second = AmqpConnection::connect(&config).await.unwrap();
    let name = second.declare_queue("itest_durable", false).await.unwrap();
    assert_eq!(name, "itest_durable");
    second.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires an AMQP broker"]
async fn bind_queue_binds_once_per_key() {
    init_tracing();
    let config = AmqpConfig::from_env();

    let subscriber = Subscriber::new(AmqpConnection::connect(&config).await.unwrap());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let loop_cancel = cancel.clone();
    let consumer = tokio::spawn(async move {
        subscriber
            .subscribe(
                vec!["mysql.*", "mysql.error.*"],
                "",
                true,
                "itest_topic",
                ExchangeKind::Topic,
                move |routing_key, payload| {
                    let tx = tx.clone();
                    async move {
                        tx.send((routing_key, payload)).unwrap();
                    }
                },
                loop_cancel,
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;

    // One message per binding key. On a topic exchange each routing key
    // below matches exactly one of the two patterns, so receiving both
    // messages proves a bind was issued for every key, not just the first.
    Publisher::new(AmqpConnection::connect(&config).await.unwrap())
        .publish(b"up", "mysql.up", "itest_topic", ExchangeKind::Topic)
        .await
        .unwrap();
    Publisher::new(AmqpConnection::connect(&config).await.unwrap())
        .publish(b"disk full", "mysql.error.disk", "itest_topic", ExchangeKind::Topic)
        .await
        .unwrap();

    let mut received = Vec::new();
    for _ in 0..2 {
        let delivery = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no delivery within timeout")
            .unwrap();
        received.push(delivery);
    }
    received.sort();
    assert_eq!(
        received,
        vec![
            ("mysql.error.disk".to_string(), b"disk full".to_vec()),
            ("mysql.up".to_string(), b"up".to_vec()),
        ]
    );

    cancel.cancel();
    consumer.await.unwrap().unwrap();
}
