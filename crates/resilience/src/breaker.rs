use crate::error::BreakerError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Settings for a [`CircuitBreaker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failure share within the rolling window at or above which the breaker opens.
    pub failure_ratio: f64,
    /// Calls required inside the window before the ratio is trusted.
    pub min_calls: usize,
    /// Length of the rolling window of recorded outcomes.
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// How long the breaker stays open before admitting probes.
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Consecutive probe successes needed to close again.
    pub half_open_probes: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_ratio: 0.5,
            min_calls: 10,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            half_open_probes: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of a breaker's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub window_calls: usize,
    pub window_failures: usize,
    pub total_calls: u64,
    pub total_failures: u64,
    pub rejected: u64,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    /// `(finished_at, failed)` for every outcome recorded while closed.
    outcomes: VecDeque<(Instant, bool)>,
    changed_at: Instant,
    probes_admitted: u32,
    probe_successes: u32,
    total_calls: u64,
    total_failures: u64,
    rejected: u64,
}

/// A three-state (closed, open, half-open) circuit breaker.
///
/// While closed, every outcome is recorded in a rolling time window. Once the
/// window holds at least `min_calls` outcomes and the failure share reaches
/// `failure_ratio`, the breaker opens and rejects calls for `cooldown`. It then
/// admits up to `half_open_probes` trial calls: any failure reopens it, and that
/// many successes close it with a fresh window.
///
/// The breaker is shared by reference (`&self` everywhere); wrap it in an `Arc`
/// to hand it to several tasks.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                outcomes: VecDeque::new(),
                changed_at: Instant::now(),
                probes_admitted: 0,
                probe_successes: 0,
                total_calls: 0,
                total_failures: 0,
                rejected: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// The current state, after applying any cooldown that has elapsed.
    pub fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        self.refresh(&mut inner, now);
        self.prune(&mut inner, now);
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            window_calls: inner.outcomes.len(),
            window_failures: inner.outcomes.iter().filter(|(_, failed)| *failed).count(),
            total_calls: inner.total_calls,
            total_failures: inner.total_failures,
            rejected: inner.rejected,
        }
    }

    /// Runs `fut` under the breaker with a deadline.
    ///
    /// Rejected calls never poll `fut`. Timeouts and inner errors both count as
    /// failures.
    pub async fn call<T, E, F>(&self, timeout: Duration, fut: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.call_with(timeout, |_| true, fut).await
    }

    /// Like [`CircuitBreaker::call`], but only inner errors for which
    /// `is_failure` returns `true` count against the breaker.
    ///
    /// An error that does not count is still returned to the caller. It is
    /// recorded as a success, since the dependency answered.
    pub async fn call_with<T, E, F, P>(
        &self,
        timeout: Duration,
        is_failure: P,
        fut: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        if !self.try_acquire() {
            return Err(BreakerError::Open(self.name.clone()));
        }

        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                if is_failure(&e) {
                    self.record_failure();
                } else {
                    self.record_success();
                }
                Err(BreakerError::Inner(e))
            }
            Err(_) => {
                self.record_failure();
                Err(BreakerError::Timeout(timeout))
            }
        }
    }

    /// Asks for permission to run a call. Pair every `true` with one
    /// `record_success` or `record_failure`.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, Instant::now());

        let admitted = match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => false,
            BreakerState::HalfOpen => {
                if inner.probes_admitted < self.config.half_open_probes.max(1) {
                    inner.probes_admitted += 1;
                    true
                } else {
                    false
                }
            }
        };
        if !admitted {
            inner.rejected += 1;
        }
        admitted
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        inner.total_calls += 1;

        match inner.state {
            BreakerState::Closed => {
                inner.outcomes.push_back((now, false));
                self.prune(&mut inner, now);
            }
            BreakerState::HalfOpen => {
                inner.probe_successes += 1;
                if inner.probe_successes >= self.config.half_open_probes.max(1) {
                    self.transition(&mut inner, BreakerState::Closed, now);
                }
            }
            // A call admitted before the breaker opened; it does not reopen the gate.
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        inner.total_calls += 1;
        inner.total_failures += 1;

        match inner.state {
            BreakerState::Closed => {
                inner.outcomes.push_back((now, true));
                self.prune(&mut inner, now);
                if self.should_trip(&inner) {
                    self.transition(&mut inner, BreakerState::Open, now);
                }
            }
            BreakerState::HalfOpen => self.transition(&mut inner, BreakerState::Open, now),
            BreakerState::Open => {}
        }
    }

    fn should_trip(&self, inner: &Inner) -> bool {
        let calls = inner.outcomes.len();
        if calls == 0 || calls < self.config.min_calls {
            return false;
        }
        let failures = inner.outcomes.iter().filter(|(_, failed)| *failed).count();
        failures as f64 / calls as f64 >= self.config.failure_ratio
    }

    fn prune(&self, inner: &mut Inner, now: Instant) {
        while let Some((at, _)) = inner.outcomes.front() {
            if now.duration_since(*at) > self.config.window {
                inner.outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    /// Moves an open breaker to half-open once its cooldown has elapsed, and
    /// re-arms a half-open breaker whose probes never reported back.
    fn refresh(&self, inner: &mut Inner, now: Instant) {
        let elapsed = now.duration_since(inner.changed_at);
        match inner.state {
            BreakerState::Open if elapsed >= self.config.cooldown => {
                self.transition(inner, BreakerState::HalfOpen, now);
            }
            BreakerState::HalfOpen if elapsed >= self.config.cooldown => {
                inner.probes_admitted = inner.probe_successes;
                inner.changed_at = now;
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.changed_at = now;
        inner.probes_admitted = 0;
        inner.probe_successes = 0;
        if to == BreakerState::Closed {
            inner.outcomes.clear();
        }

        match to {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = %from,
                cooldown = ?self.config.cooldown,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %self.name,
                from = %from,
                to = %to,
                "Circuit breaker state changed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BreakerConfig {
        BreakerConfig {
            failure_ratio: 0.5,
            min_calls: 4,
            window: Duration::from_secs(10),
            cooldown: Duration::from_secs(5),
            half_open_probes: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn opens_on_failure_ratio_after_min_calls() {
        let breaker = CircuitBreaker::new("db", config());
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        // Below min_calls, still closed.
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.try_acquire());
        assert_eq!(breaker.snapshot().rejected, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_closed_below_ratio() {
        let breaker = CircuitBreaker::new("db", config());
        for _ in 0..3 {
            breaker.record_success();
        }
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn old_outcomes_leave_the_window() {
        let breaker = CircuitBreaker::new("db", config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(11)).await;
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.snapshot().window_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_probes_close_or_reopen() {
        let breaker = CircuitBreaker::new("cache", config());
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(breaker.try_acquire());
        assert!(breaker.try_acquire());
        assert!(!breaker.try_acquire());
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(breaker.try_acquire());
        assert!(breaker.try_acquire());
        breaker.record_success();
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.snapshot().window_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn call_reports_timeout_and_inner_errors() {
        let breaker = CircuitBreaker::new("db", config());

        let ok: Result<u32, BreakerError<String>> =
            breaker.call(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let inner: Result<u32, BreakerError<String>> = breaker
            .call(Duration::from_secs(1), async { Err("boom".to_string()) })
            .await;
        assert!(matches!(inner, Err(BreakerError::Inner(ref e)) if e == "boom"));

        let timed_out: Result<u32, BreakerError<String>> = breaker
            .call(Duration::from_millis(50), std::future::pending())
            .await;
        assert!(matches!(timed_out, Err(BreakerError::Timeout(_))));

        let snap = breaker.snapshot();
        assert_eq!(snap.total_calls, 3);
        assert_eq!(snap.total_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_outside_the_predicate_do_not_trip() {
        let breaker = CircuitBreaker::new("db", config());
        for _ in 0..10 {
            let result: Result<(), BreakerError<&str>> = breaker
                .call_with(Duration::from_secs(1), |e| *e == "down", async { Err("bad row") })
                .await;
            assert!(matches!(result, Err(BreakerError::Inner("bad row"))));
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.snapshot().total_failures, 0);

        for _ in 0..4 {
            let _: Result<(), BreakerError<&str>> = breaker
                .call_with(Duration::from_secs(1), |e| *e == "down", async { Err("down") })
                .await;
        }
        // 4 failures out of 14 calls stays below the ratio.
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.snapshot().total_failures, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_does_not_poll_the_call() {
        let breaker = CircuitBreaker::new("db", config());
        for _ in 0..4 {
            breaker.record_failure();
        }
        let mut polled = false;
        let result: Result<(), BreakerError<()>> = breaker
            .call(Duration::from_secs(1), async {
                polled = true;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Open(ref name)) if name == "db"));
        assert!(!polled);
    }
}
