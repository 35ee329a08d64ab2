mod common;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;

use common::*;
use momo_pay::config::PollingConfig;
use momo_pay::models::DebitRequest;
use momo_pay::services::payment_service::{OrchestratorConfig, PaymentOrchestrator, PollOutcome};
use momo_pay::{PaymentError, TransactionStatus};

fn orchestrator(gateway: std::sync::Arc<FakeGateway>, polling: PollingConfig) -> PaymentOrchestrator {
    PaymentOrchestrator::new(
        gateway,
        OrchestratorConfig {
            polling,
            reference_length: 10,
            ..orchestrator_config()
        },
    )
}

fn debit() -> DebitRequest {
    DebitRequest {
        numero: "0700000000".to_string(),
        amount: Decimal::from_str("2500").unwrap(),
    }
}

#[tokio::test(start_paused = true)]
async fn custom_attempts_and_delay_are_honoured() {
    let gateway = FakeGateway::new(accepted_submission(), vec![]);
    let polling = PollingConfig {
        max_attempts: 3,
        delay: Duration::from_millis(500),
    };

    let outcome = orchestrator(gateway.clone(), polling)
        .process(debit())
        .await
        .unwrap();

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(gateway.status_calls(), 3);
    for gap in gateway.poll_gaps() {
        assert!(gap >= Duration::from_millis(500), "{gap:?}");
        assert!(gap < Duration::from_millis(600), "{gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn no_trailing_delay_after_last_attempt() {
    let gateway = FakeGateway::new(accepted_submission(), vec![]);
    let start = tokio::time::Instant::now();

    orchestrator(gateway.clone(), PollingConfig::default())
        .poll_status("tx-001")
        .await;

    assert_eq!(gateway.status_calls(), 5);
    assert!(start.elapsed() < Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn reference_length_follows_configuration() {
    let gateway = FakeGateway::new(accepted_submission(), vec![]);

    let transaction = orchestrator(gateway.clone(), PollingConfig::default())
        .submit(&debit())
        .await
        .unwrap();

    assert_eq!(transaction.transaction_id, "tx-001");
    assert_eq!(transaction.reference.len(), 10);
    assert_eq!(
        gateway.submitted_payloads()[0]["reference"],
        json!(transaction.reference)
    );
}

#[tokio::test(start_paused = true)]
async fn numeric_transaction_id_is_polled_as_text() {
    let gateway = FakeGateway::new(
        json_reply(201, json!({ "transaction": { "id": 4711 } })),
        vec![status_reply("YOUR TRANSACTION HAS BEEN SUCCESSFULLY PROCESSED")],
    );

    let outcome = orchestrator(gateway.clone(), PollingConfig::default())
        .process(debit())
        .await
        .unwrap();

    assert_eq!(gateway.polled_ids(), vec!["4711".to_string()]);
    assert_eq!(
        outcome,
        PollOutcome::Terminal("YOUR TRANSACTION HAS BEEN SUCCESSFULLY PROCESSED".to_string())
    );
    assert_eq!(
        TransactionStatus::classify(outcome.status_message()),
        TransactionStatus::SuccessfulTransaction
    );
}

#[tokio::test(start_paused = true)]
async fn unparsable_status_body_is_transient() {
    let gateway = FakeGateway::new(
        accepted_submission(),
        vec![Ok(momo_pay::ports::GatewayResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: "{not json".to_string(),
        })],
    );

    let outcome = orchestrator(gateway.clone(), PollingConfig::default())
        .poll_status("tx-001")
        .await;

    assert_eq!(outcome, PollOutcome::TransientError);
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn responses_without_message_keep_polling() {
    let gateway = FakeGateway::new(
        accepted_submission(),
        vec![
            json_reply(200, json!({ "status": "PENDING" })),
            json_reply(200, json!({})),
            status_reply(SUCCESS_FR),
        ],
    );

    let outcome = orchestrator(gateway.clone(), PollingConfig::default())
        .poll_status("tx-001")
        .await;

    assert_eq!(outcome, PollOutcome::Terminal(SUCCESS_FR.to_string()));
    assert_eq!(gateway.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn business_failure_messages_are_not_terminal() {
    let gateway = FakeGateway::new(
        accepted_submission(),
        (0..5).map(|_| status_reply("Solde insuffisant")).collect(),
    );

    let outcome = orchestrator(gateway.clone(), PollingConfig::default())
        .poll_status("tx-001")
        .await;

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(
        TransactionStatus::classify(outcome.status_message()),
        TransactionStatus::UnableToGetTransactionStatus
    );
}

#[tokio::test]
async fn unparsable_submission_body_is_invalid_response() {
    let gateway = FakeGateway::new(
        Ok(momo_pay::ports::GatewayResponse {
            status: 200,
            content_type: Some("text/plain".to_string()),
            body: "OK".to_string(),
        }),
        vec![],
    );

    let err = orchestrator(gateway.clone(), PollingConfig::default())
        .process(debit())
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::InvalidPaymentResponse));
    assert_eq!(gateway.status_calls(), 0);
}
