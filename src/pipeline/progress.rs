// file: src/pipeline/progress.rs
// description: synthetic time-based progress ticker decoupled from real i/o
// reference: smoothstep easing driven by a tokio frame interval

use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Cadence of the ticker, roughly one animation frame.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Highest value the simulator reports on its own. Completion (100) is only
/// ever written by whoever owns the real work.
pub const MAX_SIMULATED_PERCENT: u8 = 99;

pub struct ProgressSimulator;

impl ProgressSimulator {
    /// Spawns a ticker that calls `on_tick` with strictly increasing percentages
    /// in `1..=99` over roughly `duration`. Must be called inside a tokio runtime.
    pub fn start<F>(duration: Duration, mut on_tick: F) -> ProgressHandle
    where
        F: FnMut(u8) + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let mut frames = tokio::time::interval(FRAME_INTERVAL);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval yields immediately on the first call
            frames.tick().await;

            let mut last = 0u8;

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = frames.tick() => {}
                }

                let elapsed = started.elapsed();
                let percent = eased_percent(elapsed, duration);

                if percent > last {
                    if cancelled.is_cancelled() {
                        break;
                    }
                    last = percent;
                    on_tick(percent);
                }

                if elapsed >= duration || last >= MAX_SIMULATED_PERCENT {
                    break;
                }
            }
        });

        ProgressHandle { token }
    }
}

/// Cancels its ticker when `cancel` is called or when dropped.
#[derive(Debug)]
pub struct ProgressHandle {
    token: CancellationToken,
}

impl ProgressHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[cfg(test)]
    pub(crate) fn token_probe(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn eased_percent(elapsed: Duration, duration: Duration) -> u8 {
    let ratio = if duration.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
    };

    let eased = ratio * ratio * (3.0 - 2.0 * ratio) * 100.0;
    (eased.round() as u8).clamp(1, MAX_SIMULATED_PERCENT)
}
