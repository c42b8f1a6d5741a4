//! Progress bus integration tests.
//!
//! Exercises the command queue from many concurrent producers and checks
//! what the single consumer loop ends up applying.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crash_qa_core::ports::{ProgressEvent, ProgressSink};
use crash_qa_core::progress::{BusConfig, BusError, ProgressInfo};
use crash_qa_core::{CancellationToken, ProgressBus};
use crash_qa_test_support::MockProgressSink;
use proptest::prelude::*;

fn config() -> BusConfig {
    BusConfig {
        render_interval: Duration::from_millis(1),
        keep_completed: 64,
    }
}

fn started_bus(sink: Arc<dyn ProgressSink>) -> Arc<ProgressBus> {
    let bus = Arc::new(ProgressBus::new(sink, config()));
    bus.start(&CancellationToken::new()).unwrap();
    bus
}

// === Lifecycle ===

#[tokio::test]
async fn test_start_twice_fails() {
    let bus = started_bus(Arc::new(()));
    assert!(matches!(
        bus.start(&CancellationToken::new()),
        Err(BusError::AlreadyStarted)
    ));
}

#[tokio::test]
async fn test_drain_before_start_fails() {
    let bus = ProgressBus::new(Arc::new(()), config());
    assert!(matches!(bus.drain().await, Err(BusError::NotRunning)));
    assert!(matches!(bus.snapshot().await, Err(BusError::NotRunning)));
}

#[tokio::test]
async fn test_commands_before_start_are_applied() {
    let bus = ProgressBus::new(Arc::new(()), config());
    let ctx = bus.create_context("early", 3);
    ctx.update(2, "queued");

    bus.start(&CancellationToken::new()).unwrap();
    let frame = bus.snapshot().await.unwrap();
    let task = frame.active_task(ctx.id()).unwrap();
    assert_eq!(task.current, 2);
    assert_eq!(task.description, "early");
}

#[tokio::test]
async fn test_shutdown_renders_final_frame_and_closes() {
    let sink = Arc::new(MockProgressSink::new());
    let bus = started_bus(sink.clone());
    let ctx = bus.create_context("work", 1);
    ctx.update(1, "done");
    ctx.complete();

    bus.shutdown().await;

    assert!(sink.is_closed());
    let last = sink.last_frame().unwrap();
    assert!(last.active.is_empty());
    assert_eq!(last.stats.completions_applied, 1);
    assert!(matches!(sink.events().last(), Some(ProgressEvent::Closed)));
}

#[tokio::test]
async fn test_external_cancel_stops_loop() {
    let sink = Arc::new(MockProgressSink::new());
    let bus = Arc::new(ProgressBus::new(sink.clone(), config()));
    let cancel = CancellationToken::new();
    bus.start(&cancel).unwrap();

    cancel.cancel();
    bus.shutdown().await;

    assert!(sink.is_closed());
    assert!(matches!(bus.drain().await, Err(BusError::NotRunning)));
}

// === Task lifecycle ===

#[tokio::test]
async fn test_active_count_follows_applied_commands() {
    let bus = started_bus(Arc::new(()));
    let a = bus.create_context("a", 1);
    let b = bus.create_context("b", 1);
    let _c = bus.create_context("c", 1);
    bus.drain().await.unwrap();
    assert_eq!(bus.active_task_count(), 3);

    a.complete();
    b.dispose();
    bus.drain().await.unwrap();
    assert_eq!(bus.active_task_count(), 1);
}

#[tokio::test]
async fn test_task_lifecycle_leaves_no_active_task() {
    let bus = started_bus(Arc::new(()));
    let a = bus.create_context("A", 10);
    a.update(5, "half");
    a.update(10, "done");
    a.complete();
    bus.drain().await.unwrap();

    assert_eq!(bus.active_task_count(), 0);
    let frame = bus.snapshot().await.unwrap();
    assert!(frame.active_task(a.id()).is_none());
    let done = frame.completed_task(a.id()).unwrap();
    assert_eq!(done.current, 10);
    assert_eq!(done.message, "done");
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let bus = started_bus(Arc::new(()));
    let ctx = bus.create_context("once", 1);
    ctx.complete();
    ctx.complete();
    ctx.update(1, "late");
    ctx.dispose();

    let frame = bus.snapshot().await.unwrap();
    assert_eq!(frame.stats.completions_applied, 1);
    assert_eq!(frame.stats.updates_applied, 0);
    assert_eq!(frame.stats.ignored, 0);
}

#[tokio::test]
async fn test_drop_completes_task() {
    let bus = started_bus(Arc::new(()));
    {
        let ctx = bus.create_context("scoped", 4);
        ctx.report(ProgressInfo::new(1, "one of four"));
    }
    let frame = bus.snapshot().await.unwrap();
    assert!(frame.active.is_empty());
    let done = &frame.recently_completed[0];
    assert!(done.is_completed);
    assert_eq!(done.current, 1);
}

#[tokio::test]
async fn test_task_ids_are_unique() {
    let bus = started_bus(Arc::new(()));
    let ids: Vec<u64> = (0..50).map(|_| bus.create_context("t", 1).id().get()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
}

// === Concurrency ===

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_keep_per_task_order() {
    let bus = started_bus(Arc::new(()));
    let mut handles = Vec::new();
    for producer in 0..8u64 {
        let bus = Arc::clone(&bus);
        handles.push(tokio::spawn(async move {
            let ctx = bus.create_context(format!("producer {producer}"), 10);
            for step in 1..=10 {
                ctx.update(step, format!("step {step}"));
                if step % 3 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            ctx.complete();
            ctx.id()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    let frame = bus.snapshot().await.unwrap();
    assert!(frame.active.is_empty());
    assert_eq!(frame.stats.created, 8);
    assert_eq!(frame.stats.updates_applied, 80);
    assert_eq!(frame.stats.completions_applied, 8);
    assert_eq!(frame.stats.ignored, 0);
    for id in ids {
        let task = frame.completed_task(id).unwrap();
        assert_eq!(task.current, 10);
        assert_eq!(task.message, "step 10");
    }
}

struct PanicOnce {
    calls: AtomicUsize,
}

impl ProgressSink for PanicOnce {
    #[allow(clippy::panic)]
    fn on_event(&self, _event: ProgressEvent) {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("renderer failure");
        }
    }
}

#[tokio::test]
async fn test_sink_panic_does_not_stop_bus() {
    let sink = Arc::new(PanicOnce {
        calls: AtomicUsize::new(0),
    });
    let bus = started_bus(sink.clone());

    let first = bus.create_context("first", 1);
    first.complete();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = bus.create_context("second", 1);
    let frame = bus.snapshot().await.unwrap();
    assert!(frame.active_task(second.id()).is_some());

    bus.shutdown().await;
    assert!(sink.calls.load(Ordering::SeqCst) >= 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_last_update_wins_per_task(
        updates in prop::collection::vec(prop::collection::vec(0u64..1000, 1..20), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(3)
            .enable_all()
            .build()
            .unwrap();

        let outcome = runtime.block_on(async {
            let bus = started_bus(Arc::new(()));
            let mut handles = Vec::new();
            for steps in updates.clone() {
                let bus = Arc::clone(&bus);
                handles.push(tokio::spawn(async move {
                    let ctx = bus.create_context("prop", steps.len() as u64);
                    for value in &steps {
                        ctx.update(*value, value.to_string());
                        tokio::task::yield_now().await;
                    }
                    ctx.complete();
                    (ctx.id(), steps.last().copied().unwrap_or_default())
                }));
            }
            let mut expected = Vec::new();
            for handle in handles {
                expected.push(handle.await.unwrap());
            }
            let frame = bus.snapshot().await.unwrap();
            expected
                .into_iter()
                .map(|(id, last)| (frame.completed_task(id).map(|t| t.current), last))
                .collect::<Vec<_>>()
        });

        for (applied, last) in outcome {
            prop_assert_eq!(applied, Some(last));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_frames_keep_rendering_under_load() {
    let sink = Arc::new(MockProgressSink::new());
    let bus = Arc::new(ProgressBus::new(
        sink.clone(),
        BusConfig {
            render_interval: Duration::from_millis(10),
            keep_completed: 4,
        },
    ));
    bus.start(&CancellationToken::new()).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let producers: Vec<_> = (0..3)
        .map(|p| {
            let ctx = bus.create_context(format!("busy-{p}"), u64::MAX);
            let running = Arc::clone(&running);
            std::thread::spawn(move || {
                let mut current = 0u64;
                while running.load(Ordering::Relaxed) {
                    for _ in 0..100 {
                        current += 1;
                        ctx.update(current, "working");
                    }
                    std::thread::sleep(Duration::from_micros(100));
                }
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(300)).await;
    running.store(false, Ordering::Relaxed);
    for producer in producers {
        producer.join().unwrap();
    }
    bus.shutdown().await;

    // ~30 ticks fit in the window; a starved loop renders only a handful.
    let frames = sink.frames().len();
    assert!(frames >= 10, "only {frames} frames rendered under load");
}
