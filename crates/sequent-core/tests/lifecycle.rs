//! End-to-end lifecycle tests for the sequent runtime.
//!
//! Covers the full call/cast surface against a live worker: happy-path
//! dispatch, validation failures, crash containment, supervision
//! notifications, mailbox purging, and FIFO ordering.

use sequent_core::{
    MethodTable, ParamKind, Sequent, SequentError, SequentId, Supervisor, TerminateReason,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

// =============================================================================
// Test Fixtures
// =============================================================================

/// State exercised by the tests; handlers append to `log` so ordering is
/// observable.
#[derive(Default)]
struct Probe {
    log: Vec<String>,
}

fn probe_table() -> MethodTable<Probe> {
    MethodTable::builder()
        .method(
            "Public",
            &[ParamKind::Bool],
            &[ParamKind::Bool],
            |_: &mut Probe, args| args,
        )
        .method(
            "Broadcast",
            &[ParamKind::Bool],
            &[],
            |state: &mut Probe, args| {
                state.log.push(format!("broadcast:{}", args[0]));
                Vec::new()
            },
        )
        .method("Crash", &[], &[], |_: &mut Probe, args| {
            let empty: Vec<i64> = Vec::new();
            let index = args.len() + 2;
            vec![json!(empty[index])]
        })
        .method("Sleep", &[ParamKind::Number], &[], |_: &mut Probe, args| {
            let millis = args[0].as_u64().unwrap_or(0);
            std::thread::sleep(Duration::from_millis(millis));
            Vec::new()
        })
        .method(
            "Log",
            &[ParamKind::String],
            &[],
            |state: &mut Probe, args| {
                state
                    .log
                    .push(args[0].as_str().unwrap_or_default().to_string());
                Vec::new()
            },
        )
        .method("Snapshot", &[], &[ParamKind::Array], |state: &mut Probe, _| {
            vec![json!(state.log)]
        })
        .fallible_method(
            "Guarded",
            &[ParamKind::Bool],
            &[ParamKind::String],
            |_, args| {
                if args[0].as_bool().unwrap_or(false) {
                    Ok(vec![json!("passed")])
                } else {
                    Err("guard rejected".into())
                }
            },
        )
        .build()
}

/// Supervisor that forwards every notification to the test task.
struct Notifier {
    tx: mpsc::UnboundedSender<(TerminateReason, SequentId)>,
}

impl Supervisor for Notifier {
    fn on_terminated(&self, reason: TerminateReason, id: SequentId) {
        let _ = self.tx.send((reason, id));
    }
}

fn supervised_probe() -> (
    Sequent<Probe>,
    Arc<dyn Supervisor>,
    mpsc::UnboundedReceiver<(TerminateReason, SequentId)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let supervisor: Arc<dyn Supervisor> = Arc::new(Notifier { tx });
    let sequent = Sequent::spawn_supervised(
        Probe::default(),
        probe_table(),
        Arc::downgrade(&supervisor),
    );
    (sequent, supervisor, rx)
}

async fn next_notice(
    rx: &mut mpsc::UnboundedReceiver<(TerminateReason, SequentId)>,
) -> (TerminateReason, SequentId) {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("supervisor notified in time")
        .expect("notification channel open")
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn public_call_round_trips() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let result = sequent.call("Public", vec![json!(true)]).await.unwrap();

    assert_eq!(result, vec![json!(true)]);
    assert!(sequent.running());
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let err = sequent.call("private", Vec::new()).await.unwrap_err();

    assert_eq!(err, SequentError::UnknownMethod("private".into()));
    assert!(sequent.running());
}

#[tokio::test]
async fn missing_argument_reports_arity() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let err = sequent.call("Public", Vec::new()).await.unwrap_err();

    assert_eq!(err, SequentError::WrongArity { need: 1, have: 0 });
}

#[tokio::test]
async fn wrong_kind_on_cast_reports_assignability() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let err = sequent
        .cast("Broadcast", vec![json!("false")])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SequentError::NotAssignable {
            index: 0,
            got: ParamKind::String,
            want: ParamKind::Bool,
        }
    );
    assert_eq!(
        err.to_string(),
        "argument 0 of type string is not assignable to bool"
    );
    // Validation failures never reach the mailbox; the sequent lives on.
    assert!(sequent.running());
    assert!(sequent.call("Public", vec![json!(true)]).await.is_ok());
}

#[tokio::test]
async fn cast_returns_once_enqueued() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    sequent.cast("Broadcast", vec![json!(true)]).await.unwrap();

    let log = sequent.call("Snapshot", Vec::new()).await.unwrap();
    assert_eq!(log, vec![json!(["broadcast:true"])]);
}

#[tokio::test]
async fn handler_order_matches_enqueue_order() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    for label in ["a", "b", "c", "d", "e"] {
        sequent.cast("Log", vec![json!(label)]).await.unwrap();
    }
    let log = sequent.call("Snapshot", Vec::new()).await.unwrap();

    assert_eq!(log, vec![json!(["a", "b", "c", "d", "e"])]);
}

#[tokio::test]
async fn fallible_handler_unwraps_error_side() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let ok = sequent.call("Guarded", vec![json!(true)]).await.unwrap();
    assert_eq!(ok, vec![json!("passed")]);

    let err = sequent.call("Guarded", vec![json!(false)]).await.unwrap_err();
    assert_eq!(err, SequentError::HandlerFailed("guard rejected".into()));

    // A domain failure is not a fault; the sequent keeps running.
    assert!(sequent.running());
    assert!(sequent.call("Public", vec![json!(true)]).await.is_ok());
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn id_is_stable_and_non_nil() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    let id = sequent.id();
    assert!(!id.is_nil());
    assert_eq!(sequent.id(), id);
    assert_eq!(sequent.clone().id(), id);
}

// =============================================================================
// Termination
// =============================================================================

#[tokio::test]
async fn terminate_notifies_with_requested_reason() {
    let (sequent, _supervisor, mut rx) = supervised_probe();
    let id = sequent.id();

    sequent.terminate("shutting down").await;

    let (reason, dead) = next_notice(&mut rx).await;
    assert_eq!(reason, TerminateReason::Requested("shutting down".into()));
    assert_eq!(dead, id);
    assert!(!sequent.running());
}

#[tokio::test]
async fn stopped_sequent_rejects_calls_and_casts() {
    let (sequent, _supervisor, mut rx) = supervised_probe();

    sequent.terminate("done").await;
    next_notice(&mut rx).await;

    assert_eq!(
        sequent.call("Public", vec![json!(true)]).await.unwrap_err(),
        SequentError::Stopped
    );
    assert_eq!(
        sequent.cast("Broadcast", vec![json!(true)]).await.unwrap_err(),
        SequentError::Stopped
    );
    assert!(!sequent.running());
}

#[tokio::test]
async fn crash_via_call_kills_the_sequent() {
    let (sequent, _supervisor, mut rx) = supervised_probe();
    let id = sequent.id();

    let err = sequent.call("Crash", Vec::new()).await.unwrap_err();
    assert_eq!(err, SequentError::Died);

    let (reason, dead) = next_notice(&mut rx).await;
    assert!(reason.is_fault(), "expected fault, got {reason}");
    match &reason {
        TerminateReason::Fault(text) => assert!(text.contains("index out of bounds")),
        other => panic!("unexpected reason: {other}"),
    }
    assert_eq!(dead, id);

    assert!(!sequent.running());
    assert_eq!(
        sequent.call("Public", vec![json!(true)]).await.unwrap_err(),
        SequentError::Stopped
    );
}

#[tokio::test]
async fn crash_via_cast_also_notifies() {
    let (sequent, _supervisor, mut rx) = supervised_probe();
    let id = sequent.id();

    sequent.cast("Crash", Vec::new()).await.unwrap();

    let (reason, dead) = next_notice(&mut rx).await;
    assert!(reason.is_fault());
    assert_eq!(dead, id);
}

#[tokio::test]
async fn supervisor_is_notified_exactly_once() {
    let (sequent, _supervisor, mut rx) = supervised_probe();

    let _ = sequent.call("Crash", Vec::new()).await;
    next_notice(&mut rx).await;

    // A terminate after death must not produce a second notification.
    sequent.terminate("again").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_call_is_purged_on_termination() {
    let (sequent, _supervisor, mut rx) = supervised_probe();

    // Occupy the worker, then park a call in the mailbox behind it.
    sequent.cast("Sleep", vec![json!(400)]).await.unwrap();
    let pending = {
        let sequent = sequent.clone();
        tokio::spawn(async move { sequent.call("Public", vec![json!(true)]).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    sequent.terminate("bye").await;

    let result = timeout(Duration::from_secs(2), pending)
        .await
        .expect("pending call unblocked")
        .unwrap();
    assert_eq!(result, Err(SequentError::Died));

    let (reason, _) = next_notice(&mut rx).await;
    assert_eq!(reason, TerminateReason::Requested("bye".into()));
}

#[tokio::test]
async fn dropping_every_handle_detaches_the_worker() {
    let (sequent, _supervisor, mut rx) = supervised_probe();
    let id = sequent.id();

    drop(sequent);

    let (reason, dead) = next_notice(&mut rx).await;
    assert_eq!(reason, TerminateReason::Detached);
    assert_eq!(dead, id);
}

#[tokio::test]
async fn dropped_supervisor_is_skipped() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let supervisor: Arc<dyn Supervisor> = Arc::new(Notifier { tx });
    let sequent = Sequent::spawn_supervised(
        Probe::default(),
        probe_table(),
        Arc::downgrade(&supervisor),
    );
    drop(supervisor);

    sequent.terminate("quiet").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Channel closed because the Notifier was dropped with the Arc.
    assert!(rx.recv().await.is_none());
    assert!(!sequent.running());
}

// =============================================================================
// Value semantics of results
// =============================================================================

#[tokio::test]
async fn identity_handler_returns_arguments_unchanged() {
    let sequent = Sequent::spawn(Probe::default(), probe_table());

    for value in [json!(true), json!(false)] {
        let result = sequent.call("Public", vec![value.clone()]).await.unwrap();
        assert_eq!(result, vec![value]);
    }
}

#[tokio::test]
async fn results_preserve_value_structure() {
    let table = MethodTable::builder()
        .method(
            "Wrap",
            &[ParamKind::Any],
            &[ParamKind::Object],
            |_: &mut (), args| vec![json!({ "wrapped": args[0] })],
        )
        .build();
    let sequent = Sequent::spawn((), table);

    let result: Vec<Value> = sequent
        .call("Wrap", vec![json!([1, 2, 3])])
        .await
        .unwrap();
    assert_eq!(result, vec![json!({ "wrapped": [1, 2, 3] })]);
}
