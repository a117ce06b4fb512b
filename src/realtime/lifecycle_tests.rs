//! Tests for scoped acquisition and interrupt wiring.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{InterruptListener, PollState, StopReason};
use crate::range::RangeQuery;
use crate::test_fixtures::{ScriptedClient, record, session, stop_signal};

mod scope {
    use super::*;

    #[tokio::test]
    async fn allows_unbounded_streams() {
        let (mock, _, mut client) = session(
            ScriptedClient::new()
                .json(200, record(1))
                .json(200, record(2))
                .json(200, stop_signal()),
        );

        let mut yielded = Vec::new();
        {
            let mut scope = client.scope();
            let mut logs = scope.stream(1.0, None).unwrap();
            assert_eq!(logs.limit(), None);
            while let Some(result) = logs.next().await {
                yielded.push(result.unwrap());
            }
        }

        assert_eq!(yielded, vec![record(1), record(2)]);
        assert_eq!(mock.api_calls(), 3);
        assert_eq!(client.state(), PollState::Stopped(StopReason::StopSignal));
    }

    #[tokio::test]
    async fn bounded_streams_work_inside_scope() {
        let (_, _, mut client) =
            session(ScriptedClient::new().json(200, record(1)).json(200, record(2)));

        let mut scope = client.scope();
        let mut logs = scope.stream(1.0, Some(1)).unwrap();

        assert_eq!(logs.next().await.unwrap().unwrap(), record(1));
        assert!(logs.next().await.is_none());
    }

    #[tokio::test]
    async fn scope_keeps_parameter_validation() {
        let (mock, _, mut client) = session(ScriptedClient::new());

        let mut scope = client.scope();

        assert!(scope.stream(-2.0, None).is_err());
        assert!(scope.stream(1.0, Some(0)).is_err());
        drop(scope);
        assert_eq!(mock.api_calls(), 0);
    }

    #[tokio::test]
    async fn drop_closes_transport_even_without_a_stream() {
        let (mock, _, mut client) = session(ScriptedClient::new().json(200, serde_json::json!([])));

        client.get_logs_range(&RangeQuery::new()).await.unwrap();
        assert!(client.is_connected());

        drop(client.scope());

        assert!(!client.is_connected());
        assert!(!client.is_running());
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn drop_is_idempotent_after_stream_teardown() {
        let (mock, _, mut client) = session(ScriptedClient::new().json(200, record(1)));

        {
            let mut scope = client.scope();
            let mut logs = scope.stream(1.0, None).unwrap();
            logs.next().await.unwrap().unwrap();
        }

        assert_eq!(mock.closes(), 1);
        assert_eq!(client.state(), PollState::Stopped(StopReason::Normal));
    }

    #[tokio::test]
    async fn panic_inside_scope_still_releases() {
        let (mock, _, mut client) = session(ScriptedClient::new().json(200, record(1)));

        let mut logs = client.stream(1.0, Some(5)).unwrap();
        logs.next().await.unwrap().unwrap();
        std::mem::forget(logs);
        assert!(client.is_running());

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _scope = client.scope();
            panic!("consumer failed");
        }));

        assert!(outcome.is_err());
        assert!(!client.is_running());
        assert!(!client.is_connected());
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn interrupt_inside_scope_ends_stream_without_error() {
        let (_, _, mut client) = session(ScriptedClient::new().hang());
        let token = client.shutdown_token();

        {
            let mut scope = client.scope();
            let mut logs = scope.stream(1.0, None).unwrap();
            tokio::spawn(async move { token.cancel() });
            assert!(logs.next().await.is_none());
        }

        assert_eq!(client.state(), PollState::Stopped(StopReason::Interrupted));
        assert!(!client.is_running());
        assert!(!client.is_connected());
    }
}

mod interrupt_listener {
    use super::*;

    #[tokio::test]
    async fn signal_cancels_token() {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<()>();
        let _listener = InterruptListener::spawn(token.clone(), async move {
            let _ = rx.await;
        });

        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_listener_stops_listening() {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<()>();
        let listener = InterruptListener::spawn(token.clone(), async move {
            let _ = rx.await;
        });

        drop(listener);
        tokio::task::yield_now().await;
        let _ = tx.send(());
        tokio::task::yield_now().await;

        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn listener_ends_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let listener = InterruptListener::spawn(token.clone(), std::future::pending());

        token.cancel();
        for _ in 0..10 {
            if listener.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(listener.is_finished());
    }

    #[tokio::test]
    async fn client_installs_listener() {
        let (_, _, mut client) = session(ScriptedClient::new());
        assert!(!client.has_interrupt_handler());

        client.install_interrupt_handler();

        assert!(client.has_interrupt_handler());
        assert!(!client.shutdown_token().is_cancelled());
    }
    #[tokio::test]
    async fn listener_is_rearmed_after_an_interrupt() {
        let (_, _, mut client) = session(ScriptedClient::new().hang());
        client.install_interrupt_handler();
        let token = client.shutdown_token();

        {
            let mut logs = client.stream(1.0, Some(1)).unwrap();
            tokio::spawn(async move { token.cancel() });
            assert!(logs.next().await.is_none());
        }

        assert!(client.has_interrupt_handler());
        assert!(!client.shutdown_token().is_cancelled());
    }
}
