use std::{sync::Arc, time::Duration};

use comms::{
    FRAME_HEADER_SIZE, Reply,
    specs::{ConfigPatch, DataPoint, OptimizerSpec},
};
use machine_learning::arch::{
    Architecture,
    activations::{ActFn, Gelu},
};
use neural_playground::{
    broadcast::{Broadcaster, EXPORT_PERIOD},
    session::{IDLE_SLEEP, LossReport, REPORT_CAPACITY, Session},
};
use ndarray::s;
use tokio::time::{self, Instant};

fn points(labels: &[usize]) -> Vec<DataPoint> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| DataPoint::new(i as f32 / 10., label as f32 / 10., label))
        .collect()
}

/// Waits until the session's worker reports at least one step.
async fn wait_for_steps(session: &Session) -> u64 {
    for _ in 0..200 {
        let drained = session.reports().drain();
        if drained.steps > 0 {
            return drained.steps;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("the worker never reported a step");
}

#[test]
fn config_merges_are_partial() {
    let session = Session::new();
    session
        .update_config(&ConfigPatch {
            optimizer: Some(OptimizerSpec::GradientDescent),
            regularization: Some(0.2),
            batch_size: Some(32),
            ..Default::default()
        })
        .unwrap();

    session
        .update_config(&ConfigPatch {
            learning_rate: Some(0.3),
            ..Default::default()
        })
        .unwrap();

    let config = session.config();
    assert_eq!(config.learning_rate, 0.3);
    assert_eq!(config.optimizer, OptimizerSpec::GradientDescent);
    assert_eq!(config.regularization, 0.2);
    assert_eq!(config.batch_size, 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_is_idempotent() {
    let session = Arc::new(Session::new());
    session.set_data(points(&[0, 1]));

    assert!(session.start().unwrap());
    assert!(!session.start().unwrap());
    assert!(session.is_active());

    assert!(wait_for_steps(&session).await > 0);

    assert!(session.stop().await);
    assert!(!session.is_active());
    assert!(!session.stop().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_deactivates_an_idle_worker() {
    let session = Arc::new(Session::new());

    session.start().unwrap();
    assert!(session.model().is_some());

    session.stop().await;
    assert!(!session.is_active());
}

/// Waits until only the test holds the session, that is, the worker let go of it.
async fn wait_for_worker_exit(session: &Arc<Session>) {
    for _ in 0..200 {
        if Arc::strong_count(session) == 1 {
            return;
        }

        time::sleep(Duration::from_millis(10)).await;
    }

    panic!("the worker never exited");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_stop_still_deactivates() {
    let session = Arc::new(Session::new());

    session.start().unwrap();
    // Let the worker fall asleep, it has no data to train on.
    time::sleep(Duration::from_millis(10)).await;

    assert!(session.stop_within(Duration::from_millis(1)).await);
    assert!(!session.is_active());
    assert_eq!(Arc::strong_count(&session), 2, "the worker should still be asleep");

    wait_for_worker_exit(&session).await;
    assert!(!session.is_active());
    assert!(!session.stop_within(Duration::from_millis(1)).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_detaches_a_busy_worker() {
    let session = Arc::new(Session::new());
    session.set_data(points(&[0, 1]));

    session.start().unwrap();
    wait_for_steps(&session).await;

    assert!(session.cancel());
    assert!(!session.is_active());

    wait_for_worker_exit(&session).await;
    session.reports().drain();
    time::sleep(IDLE_SLEEP).await;
    assert_eq!(session.reports().drain().count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn training_moves_the_model() {
    let session = Arc::new(Session::new());
    session.set_data(points(&[0, 1, 0, 1]));
    session
        .update_config(&ConfigPatch {
            learning_rate: Some(0.05),
            ..Default::default()
        })
        .unwrap();

    session.reset_model().unwrap();
    let before = session.snapshot();

    session.start().unwrap();
    wait_for_steps(&session).await;
    session.stop().await;

    let after = session.snapshot();
    assert_eq!(after.version, before.version);
    assert_ne!(
        after.model.unwrap().params(),
        before.model.unwrap().params()
    );
}

#[test]
fn new_labels_widen_the_output_keeping_old_rows() {
    let session = Session::new();
    session.set_data(points(&[0, 1]));
    session.reset_model().unwrap();

    let old = session.model().unwrap();
    let last = old.num_layers() - 1;
    let (old_w, old_b) = old.layer(last).unwrap();

    session.set_data(points(&[0, 1, 2]));
    assert!(session.adapt_output().unwrap());

    let new = session.model().unwrap();
    let (new_w, new_b) = new.layer(last).unwrap();

    assert_eq!(new.output_dim(), 3);
    assert_eq!(new_w.slice(s![..2, ..]), old_w);
    assert_eq!(new_b.slice(s![..2]), old_b);
    assert_eq!(new_w.nrows(), 3);
}

#[test]
fn drain_supersedes_and_counts() {
    const N: usize = 17;

    let session = Arc::new(Session::new());
    session.reset_model().unwrap();
    let mut broadcaster = Broadcaster::new(Arc::clone(&session), 16);

    for i in 0..N {
        session.reports().push(LossReport::new(i as f32));
    }

    let update = broadcaster.tick_at(Instant::now()).unwrap();
    let Reply::StepResult { model, metrics } = update.reply else {
        panic!("expected a step result");
    };

    assert_eq!(metrics.step, N as u64);
    assert_eq!(metrics.loss, (N - 1) as f32);
    assert!(model.is_some());

    let frame = update.frame.unwrap();
    assert_eq!(frame.encode().len(), FRAME_HEADER_SIZE + 16 * 16 * 3);

    assert!(broadcaster.tick_at(Instant::now()).is_none());
}

#[test]
fn weight_export_is_throttled() {
    let session = Arc::new(Session::new());
    session.reset_model().unwrap();
    let mut broadcaster = Broadcaster::new(Arc::clone(&session), 4);
    let start = Instant::now();

    let mut tick = |offset: Duration| {
        session.reports().push(LossReport::new(1.));
        let update = broadcaster.tick_at(start + offset).unwrap();
        assert!(update.frame.is_some());

        match update.reply {
            Reply::StepResult { model, .. } => model.is_some(),
            other => panic!("unexpected reply {other:?}"),
        }
    };

    assert!(tick(Duration::ZERO));
    assert!(!tick(Duration::from_millis(100)));
    assert!(!tick(EXPORT_PERIOD - Duration::from_millis(1)));
    assert!(tick(EXPORT_PERIOD));
}

#[tokio::test(start_paused = true)]
async fn weight_export_follows_the_runtime_clock() {
    let session = Arc::new(Session::new());
    session.reset_model().unwrap();
    let mut broadcaster = Broadcaster::new(Arc::clone(&session), 4);

    let mut exported = || {
        session.reports().push(LossReport::new(1.));
        match broadcaster.tick().unwrap().reply {
            Reply::StepResult { model, .. } => model.is_some(),
            other => panic!("unexpected reply {other:?}"),
        }
    };

    assert!(exported());
    assert!(!exported());

    time::advance(EXPORT_PERIOD).await;
    assert!(exported());
}

#[test]
fn full_report_queue_drops() {
    let session = Session::new();

    for _ in 0..REPORT_CAPACITY {
        assert!(session.reports().push(LossReport::new(0.)));
    }

    assert!(!session.reports().push(LossReport::new(0.)));
    assert_eq!(session.reports().drain().count, REPORT_CAPACITY as u64);
}

#[test]
fn reset_counters_discards_pending_reports() {
    let session = Session::new();
    session.reports().push(LossReport::new(0.));
    session.reports().drain();
    session.reports().push(LossReport::new(0.));

    session.reset_counters();

    let drained = session.reports().drain();
    assert!(drained.latest.is_none());
    assert_eq!(drained.steps, 0);
}

#[test]
fn architecture_change_transplants_and_adapts() {
    let session = Session::new();
    session.set_data(points(&[0, 1, 2, 3]));
    session.reset_model().unwrap();
    let old = session.model().unwrap();

    let arch = Architecture::new(vec![10, 8], ActFn::Gelu(Gelu), 0.2).unwrap();
    let new = session.change_architecture(arch).unwrap();

    assert_eq!(new.hidden_layers(), [10, 8]);
    assert_eq!(new.output_dim(), 4);
    assert_eq!(new.layer(0).unwrap().0, old.layer(0).unwrap().0);
}
