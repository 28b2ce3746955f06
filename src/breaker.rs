//! Consecutive-failure circuit breaker.
//!
//! `Closed` admits every call and counts consecutive failures. Reaching the
//! threshold trips to `Open`, which rejects calls until the cooldown has
//! elapsed. The first `ready()` after that moves to `HalfOpen`, where a
//! bounded number of probe calls decide between `Closed` and `Open` again.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::context::Context;
use crate::error::TodoError;

pub const DEFAULT_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_HALF_OPEN_PROBES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    Open,
    HalfOpen,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called with `(old, new)` after every transition.
pub type StateChangeHook = Arc<dyn Fn(State, State) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub threshold: u32,
    pub cooldown: Duration,
    pub half_open_probes: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            half_open_probes: DEFAULT_HALF_OPEN_PROBES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
    Ignored,
}

impl Outcome {
    /// Errors seen after the caller's context ended are not held against
    /// the backend.
    fn of<T>(ctx: &Context, result: &Result<T, TodoError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(_) if ctx.err().is_err() => Self::Ignored,
            Err(_) => Self::Failure,
        }
    }
}

/// Admission record for one call: the breaker generation it was admitted
/// under, and whether it holds a half-open probe slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Admission {
    generation: u64,
    probe: bool,
}

struct Inner {
    state: State,
    /// Bumped on every transition. Outcomes from an older generation are stale.
    generation: u64,
    open_until: Option<Instant>,
    probes_in_flight: u32,
    counters: Counters,
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
    on_state_change: Option<StateChangeHook>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config: BreakerConfig {
                threshold: config.threshold.max(1),
                half_open_probes: config.half_open_probes.max(1),
                ..config
            },
            inner: Mutex::new(Inner {
                state: State::Closed,
                generation: 0,
                open_until: None,
                probes_in_flight: 0,
                counters: Counters::default(),
            }),
            on_state_change: None,
        }
    }

    pub fn with_state_change_hook(mut self, hook: StateChangeHook) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    pub fn counters(&self) -> Counters {
        self.lock().counters
    }

    /// Whether a call may proceed. In `HalfOpen` a `true` answer reserves a
    /// probe slot that the matching `done` releases.
    pub fn ready(&self) -> bool {
        self.admit().is_some()
    }

    fn admit(&self) -> Option<Admission> {
        let mut transition = None;
        let admission = {
            let mut inner = self.lock();
            let admitted = match inner.state {
                State::Closed => true,
                State::Open => {
                    let cooled = inner.open_until.is_some_and(|until| Instant::now() >= until);
                    if cooled {
                        transition = Self::set_state(&mut inner, State::HalfOpen);
                        inner.probes_in_flight = 1;
                    }
                    cooled
                }
                State::HalfOpen => {
                    if inner.probes_in_flight < self.config.half_open_probes {
                        inner.probes_in_flight += 1;
                        true
                    } else {
                        false
                    }
                }
            };
            if admitted {
                inner.counters.requests += 1;
            }
            admitted.then(|| Admission {
                generation: inner.generation,
                probe: inner.state == State::HalfOpen,
            })
        };
        self.notify(transition);
        admission
    }

    /// Records the outcome of a call admitted by [`CircuitBreaker::ready`]
    /// and hands `result` back untouched. Errors seen after the caller's
    /// context ended are not held against the backend.
    pub fn done<T>(&self, ctx: &Context, result: Result<T, TodoError>) -> Result<T, TodoError> {
        self.record(None, Outcome::of(ctx, &result));
        result
    }

    /// Admits a call and ties its outcome to the admission. The outcome is
    /// reported when the guard finishes or is dropped, and is discarded if
    /// the breaker changed state in between. `None` when not ready.
    pub fn try_call<'a>(&'a self, ctx: &Context) -> Option<BreakerCall<'a>> {
        self.admit().map(|admission| BreakerCall {
            breaker: self,
            ctx: ctx.clone(),
            admission,
            reported: false,
        })
    }

    /// Applies an outcome. `admission` is `None` for bare `done` reports,
    /// which are attributed to the current state.
    fn record(&self, admission: Option<Admission>, outcome: Outcome) {
        let transition = {
            let mut inner = self.lock();
            match outcome {
                Outcome::Success => inner.counters.successes += 1,
                Outcome::Failure => inner.counters.failures += 1,
                Outcome::Ignored => {}
            }

            if let Some(admission) = admission {
                if admission.generation != inner.generation {
                    return;
                }
            }
            let holds_probe = admission.map_or(true, |a| a.probe);

            match (inner.state, outcome) {
                (State::Closed, Outcome::Success) => {
                    inner.counters.consecutive_failures = 0;
                    None
                }
                (State::Closed, Outcome::Failure) => {
                    inner.counters.consecutive_failures += 1;
                    if inner.counters.consecutive_failures >= self.config.threshold {
                        self.trip(&mut inner)
                    } else {
                        None
                    }
                }
                (State::HalfOpen, Outcome::Success) => {
                    inner.counters.consecutive_failures = 0;
                    inner.probes_in_flight = 0;
                    inner.open_until = None;
                    Self::set_state(&mut inner, State::Closed)
                }
                (State::HalfOpen, Outcome::Failure) => {
                    inner.counters.consecutive_failures += 1;
                    self.trip(&mut inner)
                }
                (State::HalfOpen, Outcome::Ignored) => {
                    if holds_probe {
                        inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
                    }
                    None
                }
                // Late outcomes of calls admitted before the trip.
                (State::Open, _) | (State::Closed, Outcome::Ignored) => None,
            }
        };
        self.notify(transition);
    }

    fn trip(&self, inner: &mut Inner) -> Option<(State, State)> {
        inner.open_until = Some(Instant::now() + self.config.cooldown);
        inner.probes_in_flight = 0;
        Self::set_state(inner, State::Open)
    }

    fn set_state(inner: &mut Inner, new: State) -> Option<(State, State)> {
        let old = inner.state;
        if old == new {
            return None;
        }
        inner.state = new;
        inner.generation += 1;
        Some((old, new))
    }

    fn notify(&self, transition: Option<(State, State)>) {
        let (Some((old, new)), Some(hook)) = (transition, self.on_state_change.as_ref()) else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| hook(old, new))).is_err() {
            tracing::error!(%old, %new, "circuit breaker state hook panicked");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Outcome reporter for one admitted call. Dropping it unfinished (the
/// caller's future was abandoned) releases the call without counting it.
#[must_use = "the outcome is only recorded through `finish` or drop"]
pub struct BreakerCall<'a> {
    breaker: &'a CircuitBreaker,
    ctx: Context,
    admission: Admission,
    reported: bool,
}

impl BreakerCall<'_> {
    pub fn finish<T>(mut self, result: Result<T, TodoError>) -> Result<T, TodoError> {
        self.reported = true;
        let outcome = Outcome::of(&self.ctx, &result);
        self.breaker.record(Some(self.admission), outcome);
        result
    }
}

impl Drop for BreakerCall<'_> {
    fn drop(&mut self) {
        if !self.reported {
            self.breaker.record(Some(self.admission), Outcome::Ignored);
        }
    }
}
