use std::sync::{Arc, Mutex};
use std::time::Duration;

use todo_svc::breaker::{BreakerConfig, CircuitBreaker, State};
use todo_svc::context::Context;
use todo_svc::error::TodoError;

fn fail(cb: &CircuitBreaker, ctx: &Context) {
    assert!(cb.ready());
    let _ = cb.done::<()>(ctx, Err(TodoError::unknown("boom")));
}

fn succeed(cb: &CircuitBreaker, ctx: &Context) {
    assert!(cb.ready());
    cb.done(ctx, Ok(())).unwrap();
}

fn recording_breaker(config: BreakerConfig) -> (CircuitBreaker, Arc<Mutex<Vec<(State, State)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let cb = CircuitBreaker::new(config).with_state_change_hook(Arc::new(move |old: State, new: State| {
        sink.lock().unwrap().push((old, new));
    }));
    (cb, seen)
}

#[tokio::test(start_paused = true)]
async fn test_trips_after_three_consecutive_failures() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();

    fail(&cb, &ctx);
    fail(&cb, &ctx);
    assert!(cb.ready());
    let _ = cb.done::<()>(&ctx, Err(TodoError::unknown("boom")));

    assert_eq!(cb.state(), State::Open);
    assert!(!cb.ready());
    assert_eq!(cb.counters().consecutive_failures, 3);
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_consecutive_count() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();

    fail(&cb, &ctx);
    fail(&cb, &ctx);
    succeed(&cb, &ctx);
    fail(&cb, &ctx);
    fail(&cb, &ctx);
    assert_eq!(cb.state(), State::Closed);
    assert!(cb.ready());

    let _ = cb.done::<()>(&ctx, Err(TodoError::unknown("boom")));
    assert_eq!(cb.state(), State::Open);
}

#[tokio::test(start_paused = true)]
async fn test_done_returns_its_input() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();

    assert!(cb.ready());
    let err = cb.done::<()>(&ctx, Err(TodoError::unknown("exact error"))).unwrap_err();
    assert_eq!(err.to_string(), "exact error");

    assert!(cb.ready());
    assert_eq!(cb.done(&ctx, Ok(17)).unwrap(), 17);
}

#[tokio::test(start_paused = true)]
async fn test_reopens_for_trial_after_cooldown() {
    let (cb, seen) = recording_breaker(BreakerConfig::default());
    let ctx = Context::background();
    for _ in 0..3 {
        fail(&cb, &ctx);
    }

    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(!cb.ready());
    assert_eq!(cb.state(), State::Open);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cb.ready());
    assert_eq!(cb.state(), State::HalfOpen);
    // One probe at a time.
    assert!(!cb.ready());

    cb.done(&ctx, Ok(())).unwrap();
    assert_eq!(cb.state(), State::Closed);
    assert!(cb.ready());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (State::Closed, State::Open),
            (State::Open, State::HalfOpen),
            (State::HalfOpen, State::Closed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_trial_restarts_cooldown() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();
    for _ in 0..3 {
        fail(&cb, &ctx);
    }

    tokio::time::advance(Duration::from_secs(61)).await;
    fail(&cb, &ctx);
    assert_eq!(cb.state(), State::Open);

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(!cb.ready());
    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(cb.ready());
}

#[tokio::test(start_paused = true)]
async fn test_half_open_admits_configured_trials() {
    let cb = CircuitBreaker::new(BreakerConfig {
        threshold: 1,
        cooldown: Duration::from_secs(5),
        half_open_probes: 2,
    });
    let ctx = Context::background();
    fail(&cb, &ctx);

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(cb.ready());
    assert!(cb.ready());
    assert!(!cb.ready());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_calls_are_not_failures() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();
    ctx.cancel();

    for _ in 0..5 {
        fail(&cb, &ctx);
    }
    assert_eq!(cb.state(), State::Closed);
    assert_eq!(cb.counters().failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_trial_call_frees_its_slot() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();
    for _ in 0..3 {
        fail(&cb, &ctx);
    }
    tokio::time::advance(Duration::from_secs(60)).await;

    let probe = cb.try_call(&ctx).expect("probe admitted");
    drop(probe);
    assert_eq!(cb.state(), State::HalfOpen);
    assert!(cb.ready());
}

#[tokio::test(start_paused = true)]
async fn test_late_success_from_before_trip_does_not_close() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();
    let slow = cb.try_call(&ctx).expect("admitted while closed");

    for _ in 0..3 {
        fail(&cb, &ctx);
    }
    tokio::time::advance(Duration::from_secs(61)).await;
    let probe = cb.try_call(&ctx).expect("probe admitted");
    assert_eq!(cb.state(), State::HalfOpen);

    slow.finish(Ok(())).unwrap();
    assert_eq!(cb.state(), State::HalfOpen);
    assert!(cb.try_call(&ctx).is_none());

    probe.finish(Ok(())).unwrap();
    assert_eq!(cb.state(), State::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_late_cancellation_does_not_free_a_trial_slot() {
    let cb = CircuitBreaker::default();
    let ctx = Context::background();
    let slow_ctx = Context::background();
    let slow = cb.try_call(&slow_ctx).expect("admitted while closed");

    for _ in 0..3 {
        fail(&cb, &ctx);
    }
    tokio::time::advance(Duration::from_secs(61)).await;
    let _probe = cb.try_call(&ctx).expect("probe admitted");

    slow_ctx.cancel();
    let _ = slow.finish::<()>(Err(TodoError::unknown("context canceled")));
    assert!(cb.try_call(&ctx).is_none());
    assert!(!cb.ready());
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_after_recovery_is_ignored() {
    let cb = CircuitBreaker::new(BreakerConfig {
        threshold: 1,
        ..BreakerConfig::default()
    });
    let ctx = Context::background();
    let slow = cb.try_call(&ctx).expect("admitted while closed");

    fail(&cb, &ctx);
    tokio::time::advance(Duration::from_secs(60)).await;
    succeed(&cb, &ctx);
    assert_eq!(cb.state(), State::Closed);

    let _ = slow.finish::<()>(Err(TodoError::unknown("boom")));
    assert_eq!(cb.state(), State::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_hook_does_not_block_transition() {
    let cb = CircuitBreaker::default().with_state_change_hook(Arc::new(|_: State, _: State| {
        panic!("observer bug");
    }));
    let ctx = Context::background();
    for _ in 0..3 {
        fail(&cb, &ctx);
    }
    assert_eq!(cb.state(), State::Open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_outcomes_are_not_lost() {
    let cb = Arc::new(CircuitBreaker::new(BreakerConfig {
        threshold: 10_000,
        ..BreakerConfig::default()
    }));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let cb = Arc::clone(&cb);
        handles.push(tokio::spawn(async move {
            let ctx = Context::background();
            for _ in 0..100 {
                assert!(cb.ready());
                let _ = cb.done::<()>(&ctx, Err(TodoError::unknown("boom")));
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let counters = cb.counters();
    assert_eq!(counters.requests, 1600);
    assert_eq!(counters.failures, 1600);
    assert_eq!(counters.consecutive_failures, 1600);
    assert_eq!(cb.state(), State::Closed);
}
