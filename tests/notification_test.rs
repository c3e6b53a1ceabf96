mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};

use common::{
    registered_tx1, signed_notification, FailingResolver, FakeGateway, FixedResolver,
    RecordingStore,
};
use gateway_bridge::domain::{Fields, RawNotification};
use gateway_bridge::error::ProtocolError;
use gateway_bridge::ports::TransactionStore;
use gateway_bridge::services::KeyedMutex;
use gateway_bridge::use_cases::{HandleNotification, NotificationOutcome, Reply};

const THANKS: &str = "https://merchant/thanks";

fn handler(gateway: FakeGateway, store: Arc<RecordingStore>) -> HandleNotification {
    HandleNotification::new(
        Arc::new(gateway),
        store,
        Arc::new(FixedResolver(THANKS.to_string())),
    )
}

fn default_gateway() -> FakeGateway {
    FakeGateway::replying(Fields::new())
}

async fn run(handler: &HandleNotification, raw: RawNotification) -> (Reply, NotificationOutcome) {
    let (tx, rx) = oneshot::channel();
    let outcome = handler.execute(raw, tx).await;
    (rx.await.expect("a reply is always sent"), outcome)
}

#[tokio::test]
async fn test_unknown_transaction_is_acknowledged_with_error() {
    let store = Arc::new(RecordingStore::new());
    let handler = handler(default_gateway(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX404", "V1:K1")).await;

    assert_eq!(
        reply,
        Reply::Acknowledge {
            http_status: 200,
            body: "Status=ERROR\r\nStatusDetail=Transaction not found: TX404".to_string(),
        }
    );
    assert_eq!(outcome, NotificationOutcome::Rejected);
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn test_signature_mismatch_is_acknowledged_as_invalid() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    let handler = handler(default_gateway(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:WRONG")).await;

    assert_eq!(
        reply,
        Reply::Acknowledge {
            http_status: 200,
            body: "Status=INVALID\r\nStatusDetail=Signature verification failed for transaction TX1"
                .to_string(),
        }
    );
    assert_eq!(outcome, NotificationOutcome::Rejected);
    assert!(store.puts().is_empty());
    assert!(store.get("TX1").await.unwrap().is_pending());
}

#[tokio::test]
async fn test_rejection_carries_failure_redirect() {
    let store = Arc::new(RecordingStore::new());
    let handler = handler(default_gateway(), store)
        .with_failure_redirect(Some("https://merchant/failed".to_string()));

    let (reply, _) = run(&handler, signed_notification("TX404", "V1:K1")).await;

    match reply {
        Reply::Acknowledge { http_status, body } => {
            assert_eq!(http_status, 200);
            assert!(body.ends_with("\r\nRedirectURL=https://merchant/failed"), "{}", body);
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_valid_notification_is_acknowledged_then_recorded() {
    let store = Arc::new(RecordingStore::new());
    let original = registered_tx1();
    store.seed(&original).await;
    let handler = handler(default_gateway(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert_eq!(
        reply,
        Reply::Acknowledge {
            http_status: 200,
            body: format!("Status=OK\r\nRedirectUrl={}", THANKS),
        }
    );
    assert_eq!(outcome, NotificationOutcome::Accepted { persisted: true });

    let puts = store.puts();
    assert_eq!(puts.len(), 1);
    let recorded = &puts[0];
    assert_eq!(recorded.registration, original.registration);

    let notification = recorded.notification.as_ref().expect("notification attached");
    assert_eq!(notification.request.get("VendorTxCode"), Some("TX1"));
    assert_eq!(notification.request.get("VPSSignature"), Some("V1:K1"));
    assert_eq!(
        notification.response,
        Fields::new().with("Status", "OK").with("RedirectUrl", THANKS)
    );
}

#[tokio::test]
async fn test_acknowledgement_is_sent_before_persistence() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(RecordingStore::gated(gate.clone()));
    store.seed(&registered_tx1()).await;
    let handler = Arc::new(handler(default_gateway(), store.clone()));

    let (tx, rx) = oneshot::channel();
    let task = {
        let handler = handler.clone();
        tokio::spawn(async move { handler.execute(signed_notification("TX1", "V1:K1"), tx).await })
    };

    let reply = tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .expect("reply arrives while the write is blocked")
        .unwrap();
    assert!(matches!(reply, Reply::Acknowledge { http_status: 200, .. }));
    assert!(store.puts().is_empty());

    gate.notify_one();
    let outcome = task.await.unwrap();
    assert_eq!(outcome, NotificationOutcome::Accepted { persisted: true });
    assert_eq!(store.puts().len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_does_not_change_reply() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    store.fail_puts(true);
    let handler = handler(default_gateway(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert!(matches!(reply, Reply::Acknowledge { http_status: 200, ref body } if body.starts_with("Status=OK")));
    assert_eq!(outcome, NotificationOutcome::Accepted { persisted: false });
}

#[tokio::test]
async fn test_unparseable_notification_is_fatal() {
    let store = Arc::new(RecordingStore::new());
    let handler = handler(default_gateway(), store);

    let (reply, outcome) = run(&handler, RawNotification::form(Vec::new())).await;

    assert!(matches!(
        reply,
        Reply::Fatal(ProtocolError::MalformedNotification(_))
    ));
    assert_eq!(outcome, NotificationOutcome::Failed);
}

#[tokio::test]
async fn test_store_read_failure_is_fatal_not_acknowledged() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    store.fail_gets(true);
    let handler = handler(default_gateway(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert!(matches!(reply, Reply::Fatal(ProtocolError::Storage(_))));
    assert_eq!(outcome, NotificationOutcome::Failed);
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn test_resolver_failure_is_fatal_not_acknowledged() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    let handler = HandleNotification::new(
        Arc::new(default_gateway()),
        store.clone(),
        Arc::new(FailingResolver),
    );

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert!(matches!(reply, Reply::Fatal(ProtocolError::Unhandled(_))));
    assert_eq!(outcome, NotificationOutcome::Failed);
    assert!(store.puts().is_empty());
    assert!(store.get("TX1").await.unwrap().is_pending());
}

#[tokio::test]
async fn test_formatter_failure_while_rejecting_is_fatal() {
    let store = Arc::new(RecordingStore::new());
    let handler = handler(default_gateway().failing_format(), store);

    let (reply, outcome) = run(&handler, signed_notification("TX404", "V1:K1")).await;

    assert!(matches!(reply, Reply::Fatal(ProtocolError::Unhandled(_))));
    assert_eq!(outcome, NotificationOutcome::Failed);
}

#[tokio::test]
async fn test_formatter_failure_on_acceptance_is_fatal_and_not_recorded() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    let handler = handler(default_gateway().failing_format(), store.clone());

    let (reply, outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert!(matches!(reply, Reply::Fatal(_)));
    assert_eq!(outcome, NotificationOutcome::Failed);
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn test_repeated_notification_gets_same_reply() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    let handler = handler(default_gateway(), store.clone());

    let (first, first_outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;
    let (second, second_outcome) = run(&handler, signed_notification("TX1", "V1:K1")).await;

    assert_eq!(first, second);
    assert_eq!(first_outcome, NotificationOutcome::Accepted { persisted: true });
    // Sequential repeats see the recorded notification and skip the write.
    // Concurrent repeats are only serialised when key locks are configured.
    assert_eq!(second_outcome, NotificationOutcome::Duplicate);
    assert_eq!(store.puts().len(), 1);
}

#[tokio::test]
async fn test_concurrent_notifications_record_once_with_key_locks() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&registered_tx1()).await;
    let handler = Arc::new(
        handler(default_gateway(), store.clone()).with_key_locks(Arc::new(KeyedMutex::new())),
    );

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            let (tx, rx) = oneshot::channel();
            let outcome = handler.execute(signed_notification("TX1", "V1:K1"), tx).await;
            (rx.await.unwrap(), outcome)
        }));
    }

    let mut replies = Vec::new();
    let mut recorded = 0;
    for task in tasks {
        let (reply, outcome) = task.await.unwrap();
        if outcome == (NotificationOutcome::Accepted { persisted: true }) {
            recorded += 1;
        }
        replies.push(reply);
    }

    assert_eq!(recorded, 1);
    assert!(replies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.puts().len(), 1);
}
