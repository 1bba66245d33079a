use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Result of a bounded poll. Timeouts are values here, not errors; the
/// caller decides whether they are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Settled(T),
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self, PollOutcome::Settled(_))
    }
}

/// Sample `probe` at a fixed interval until it yields a value or the budget
/// elapses. The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<F, Fut, T>(
    mut probe: F,
    interval: Duration,
    timeout: Duration,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await {
            return PollOutcome::Settled(value);
        }
        if Instant::now() >= deadline {
            return PollOutcome::TimedOut;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Sample `sample` at a fixed interval and settle once `required` consecutive
/// samples are identical and non-empty. The interval and sample count are
/// tuning parameters for the host UI, not constants.
pub async fn poll_for_stability<F, Fut>(
    mut sample: F,
    required: usize,
    interval: Duration,
    timeout: Duration,
) -> PollOutcome<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let required = required.max(1);
    let deadline = Instant::now() + timeout;
    let mut last: Option<String> = None;
    let mut streak = 0usize;

    loop {
        let current = sample().await.filter(|s| !s.is_empty());
        match (&current, &last) {
            (Some(cur), Some(prev)) if cur == prev => streak += 1,
            (Some(_), _) => streak = 1,
            (None, _) => streak = 0,
        }
        match current {
            // current is non-empty whenever the streak is alive
            Some(text) if streak >= required => return PollOutcome::Settled(text),
            other => last = other,
        }

        if Instant::now() >= deadline {
            return PollOutcome::TimedOut;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn settles_when_predicate_yields() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_probe = Arc::clone(&calls);

        let outcome = poll_until(
            move || {
                let calls = Arc::clone(&calls_probe);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                        Some(42)
                    } else {
                        None
                    }
                }
            },
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcome, PollOutcome::Settled(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn always_false_predicate_times_out_and_returns() {
        // The loop must advance after the budget instead of hanging.
        let outcome: PollOutcome<()> = poll_until(
            || async { None },
            Duration::from_millis(1),
            Duration::from_millis(20),
        )
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn zero_timeout_still_probes_once() {
        let outcome = poll_until(
            || async { Some("hit") },
            Duration::from_millis(1),
            Duration::ZERO,
        )
        .await;

        assert_eq!(outcome, PollOutcome::Settled("hit"));
    }

    #[tokio::test]
    async fn stability_requires_consecutive_identical_samples() {
        let samples = vec!["a", "ab", "abc", "abc", "abc"];
        let idx = Arc::new(AtomicUsize::new(0));
        let idx_probe = Arc::clone(&idx);

        let outcome = poll_for_stability(
            move || {
                let idx = Arc::clone(&idx_probe);
                let samples = samples.clone();
                async move {
                    let i = idx.fetch_add(1, Ordering::SeqCst).min(samples.len() - 1);
                    Some(samples[i].to_string())
                }
            },
            3,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcome, PollOutcome::Settled("abc".to_string()));
    }

    #[tokio::test]
    async fn stability_ignores_empty_samples() {
        // Empty text never counts toward the streak, so this times out.
        let outcome = poll_for_stability(
            || async { Some(String::new()) },
            2,
            Duration::from_millis(1),
            Duration::from_millis(20),
        )
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn changing_text_never_settles() {
        let n = Arc::new(AtomicUsize::new(0));
        let n_probe = Arc::clone(&n);

        let outcome = poll_for_stability(
            move || {
                let n = Arc::clone(&n_probe);
                async move { Some(format!("tick {}", n.fetch_add(1, Ordering::SeqCst))) }
            },
            2,
            Duration::from_millis(1),
            Duration::from_millis(30),
        )
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
    }
}
