//! Per-question countdown.
//!
//! The countdown is a spawned task that emits one [`Tick`] per period into
//! the app's event channel. Cancelling aborts the task; ticks already queued
//! still carry the session, question and countdown generation they were
//! produced for, so the receiver can drop anything stale.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;
use uuid::Uuid;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed period on a specific question of a specific session.
///
/// `generation` is bumped every time the owner arms a new countdown, so a
/// tick queued by a cancelled countdown never matches a later one, even for
/// the same question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub session: Uuid,
    pub question: usize,
    pub generation: u64,
}

impl Tick {
    pub fn first(session: Uuid) -> Self {
        Self {
            session,
            question: 0,
            generation: 0,
        }
    }

    /// The tick identity for a fresh countdown on `question`.
    pub fn rearmed(self, question: usize) -> Self {
        Self {
            session: self.session,
            question,
            generation: self.generation + 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Start ticking for `tick.question`. The first tick fires one period from now.
    pub fn start<E>(tick: Tick, period: Duration, events: mpsc::UnboundedSender<E>) -> Self
    where
        E: From<Tick> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(session = %tick.session, question = tick.question, "tick");
                if events.send(E::from(tick)).is_err() {
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Cancel and start again for another question.
    pub fn restart<E>(&mut self, tick: Tick, period: Duration, events: mpsc::UnboundedSender<E>)
    where
        E: From<Tick> + Send + 'static,
    {
        self.cancel();
        *self = Self::start(tick, period, events);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(question: usize) -> Tick {
        Tick {
            session: Uuid::nil(),
            question,
            generation: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
        let start = Instant::now();
        let _countdown = Countdown::start(tick(3), TICK_PERIOD, tx);

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(tick(3)));
        }
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
        let mut countdown = Countdown::start(tick(0), TICK_PERIOD, tx);
        assert_eq!(rx.recv().await, Some(tick(0)));

        countdown.cancel();
        assert!(!countdown.is_running());

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_switches_question() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
        let mut countdown = Countdown::start(tick(0), TICK_PERIOD, tx.clone());
        assert_eq!(rx.recv().await, Some(tick(0)));

        countdown.restart(tick(1), TICK_PERIOD, tx);
        assert_eq!(rx.recv().await, Some(tick(1)));
        assert_eq!(rx.recv().await, Some(tick(1)));
    }

    #[test]
    fn test_rearmed_tick_differs_for_same_question() {
        let first = Tick::first(Uuid::nil());
        let again = first.rearmed(0);

        assert_eq!(again.question, 0);
        assert_eq!(again.session, first.session);
        assert_ne!(again, first);
        assert_eq!(again.rearmed(1).generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
        drop(Countdown::start(tick(0), TICK_PERIOD, tx));

        // The aborted task drops its sender, closing the channel.
        assert_eq!(rx.recv().await, None);
    }
}
