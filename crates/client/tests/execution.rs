//! Retry-engine behavior against scripted node channels.

mod common;

use common::{client_with_nodes, status_body, test_config, MockChannel, Script};
use meridian_client::channel::{WireRequest, WireResponse};
use meridian_client::{Error, Executable, ExecutionOutcome, Node, Result, StatusClass};
use meridian_proto::{ProtoError, ResponseStatus, TransactionResponse};
use prost::Message;
use std::time::Duration;

/// Minimal consensus-transport request: sends an empty frame, returns the
/// node's reported cost.
struct TestCall {
    deadline: Option<Duration>,
}

impl TestCall {
    fn new() -> Self {
        Self { deadline: None }
    }
}

impl Executable for TestCall {
    type Output = u64;

    fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    fn make_request(&self, _node: &Node, _attempt: u32) -> Result<WireRequest> {
        Ok(WireRequest::Frame(bytes::Bytes::new()))
    }

    fn interpret(&self, _node: &Node, response: WireResponse) -> Result<ExecutionOutcome<u64>> {
        let decoded = TransactionResponse::decode(response.body.as_ref())
            .map_err(ProtoError::from)
            .map_err(Error::from)?;
        let status = decoded.status()?;
        Ok(match meridian_client::classify(status) {
            StatusClass::Success => ExecutionOutcome::Success(decoded.cost),
            StatusClass::Retryable => ExecutionOutcome::Retry { status },
            StatusClass::Fatal => ExecutionOutcome::Fatal { status },
        })
    }
}

#[tokio::test(start_paused = true)]
async fn first_attempt_success() {
    let channel = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Ok, 7))]);
    let client = client_with_nodes(test_config(), &[channel.clone()]);

    let cost = client.execute(&TestCall::new()).await.expect("success");
    assert_eq!(cost, 7);
    assert_eq!(channel.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_moves_to_another_node() {
    let bad = MockChannel::new(vec![Script::TransportError]);
    let good = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Ok, 1))]);
    let client = client_with_nodes(test_config(), &[bad.clone(), good.clone()]);

    client.execute(&TestCall::new()).await.expect("second node serves");
    assert_eq!(bad.call_count(), 1);
    assert_eq!(good.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn busy_status_retries_elsewhere() {
    let busy = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Busy, 0))]);
    let good = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Ok, 3))]);
    let client = client_with_nodes(test_config(), &[busy.clone(), good.clone()]);

    let cost = client.execute(&TestCall::new()).await.expect("retried");
    assert_eq!(cost, 3);
    assert_eq!(busy.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn three_attempts_visit_three_distinct_nodes() {
    let channels: Vec<_> = (0..3)
        .map(|_| MockChannel::always(status_body(ResponseStatus::Busy, 0)))
        .collect();
    let config = test_config().with_max_attempts(3);
    let client = client_with_nodes(config, &channels);

    let err = client.execute(&TestCall::new()).await.expect_err("exhausts");
    match err {
        Error::AttemptsExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected AttemptsExhausted, got {other}"),
    }

    // Node diversity: every node visited exactly once, none repeated.
    for channel in &channels {
        assert_eq!(channel.call_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn fatal_status_stops_immediately() {
    let channels: Vec<_> = (0..3)
        .map(|_| MockChannel::always(status_body(ResponseStatus::DuplicateRequest, 0)))
        .collect();
    let client = client_with_nodes(test_config(), &channels);

    let err = client.execute(&TestCall::new()).await.expect_err("fatal");
    assert!(matches!(
        err,
        Error::Status {
            status: ResponseStatus::DuplicateRequest
        }
    ));

    let total: u32 = channels.iter().map(|c| c.call_count()).sum();
    assert_eq!(total, 1, "fatal rejection must not be retried");
}

#[tokio::test(start_paused = true)]
async fn deadline_expiry_is_a_retry_trigger() {
    let slow = MockChannel::new(vec![Script::Hang]);
    let good = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Ok, 9))]);
    let client = client_with_nodes(test_config(), &[slow.clone(), good.clone()]);

    let cost = client.execute(&TestCall::new()).await.expect("retried after timeout");
    assert_eq!(cost, 9);
    assert_eq!(slow.call_count(), 1);
    assert_eq!(good.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn wall_clock_bound_terminates_the_loop() {
    let slow = MockChannel::new(vec![Script::Hang, Script::Hang]);
    let config = test_config()
        .with_max_attempts(100)
        .with_request_deadline(Duration::from_millis(200))
        .with_max_execution_time(Duration::from_millis(150));
    let client = client_with_nodes(config, &[slow.clone()]);

    let err = client.execute(&TestCall::new()).await.expect_err("bounded");
    match err {
        Error::AttemptsExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 1);
            assert!(matches!(
                last.as_deref(),
                Some(Error::DeadlineExceeded { .. })
            ));
        }
        other => panic!("expected AttemptsExhausted, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn empty_pool_has_no_healthy_node() {
    let client = client_with_nodes(test_config(), &[]);
    let err = client.execute(&TestCall::new()).await.expect_err("no nodes");
    assert!(matches!(err, Error::NoHealthyNode));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_calls() {
    let slow = MockChannel::new(vec![Script::Hang, Script::Hang, Script::Hang]);
    let config = test_config().with_request_deadline(Duration::from_secs(3600));
    let client = client_with_nodes(config, &[slow.clone()]);

    let worker = client.clone();
    let handle = tokio::spawn(async move { worker.execute(&TestCall::new()).await });
    tokio::task::yield_now().await;

    client.shutdown();
    let result = handle.await.expect("task joins");
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(client.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn request_deadline_override_wins() {
    // Client default would never fire inside the test window; the
    // per-request override must.
    let slow = MockChannel::new(vec![Script::Hang]);
    let good = MockChannel::new(vec![Script::Body(status_body(ResponseStatus::Ok, 2))]);
    let config = test_config().with_request_deadline(Duration::from_secs(3600));
    let client = client_with_nodes(config, &[slow.clone(), good.clone()]);

    let call = TestCall {
        deadline: Some(Duration::from_millis(50)),
    };
    let started = tokio::time::Instant::now();
    let cost = client.execute(&call).await.expect("override fires");
    assert_eq!(cost, 2);
    // Paused clock: elapsed time is exactly the timers that fired, far
    // below the hour-long client default.
    assert!(started.elapsed() < Duration::from_secs(10));
}
