//! Cancellable timers driving reconnects and startup resumes.
//!
//! Dropping a [`TimerHandle`] cancels the timer; no firing is delivered after
//! the drop returns.

use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use socketdeck_core::{ConnectionId, TimerToken};

use crate::console::ConsoleEvent;

#[cfg(target_arch = "wasm32")]
pub enum TimerHandle {
    Interval(gloo_timers::callback::Interval),
    Timeout(gloo_timers::callback::Timeout),
}

#[cfg(target_arch = "wasm32")]
pub fn start(
    id: ConnectionId,
    timer: TimerToken,
    delay: Duration,
    repeat: bool,
    events: UnboundedSender<ConsoleEvent>,
) -> TimerHandle {
    use gloo_timers::callback::{Interval, Timeout};

    let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
    let fire = move || {
        let _ = events.unbounded_send(ConsoleEvent::Timer { id, timer });
    };
    if repeat {
        TimerHandle::Interval(Interval::new(millis, fire))
    } else {
        TimerHandle::Timeout(Timeout::new(millis, fire))
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub struct TimerHandle {
    task: tokio::task::JoinHandle<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn start(
    id: ConnectionId,
    timer: TimerToken,
    delay: Duration,
    repeat: bool,
    events: UnboundedSender<ConsoleEvent>,
) -> TimerHandle {
    let task = tokio::spawn(async move {
        if !repeat {
            tokio::time::sleep(delay).await;
            let _ = events.unbounded_send(ConsoleEvent::Timer { id, timer });
            return;
        }
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + delay, delay);
        loop {
            ticker.tick().await;
            if events
                .unbounded_send(ConsoleEvent::Timer { id, timer })
                .is_err()
            {
                break;
            }
        }
    });
    TimerHandle { task }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use futures_channel::mpsc::unbounded;
    use futures_util::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once() {
        let (tx, mut rx) = unbounded();
        let _handle = start(ConnectionId(1), TimerToken(7), Duration::from_millis(500), false, tx);

        match rx.next().await {
            Some(ConsoleEvent::Timer { id, timer }) => {
                assert_eq!(id, ConnectionId(1));
                assert_eq!(timer, TimerToken(7));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // The task finished and dropped its sender.
        assert!(rx.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_repeats_until_dropped() {
        let (tx, mut rx) = unbounded();
        let handle = start(ConnectionId(2), TimerToken(9), Duration::from_secs(5), true, tx);

        for _ in 0..3 {
            assert!(matches!(rx.next().await, Some(ConsoleEvent::Timer { .. })));
        }

        drop(handle);
        tokio::task::yield_now().await;
        assert!(rx.next().await.is_none());
    }
}
