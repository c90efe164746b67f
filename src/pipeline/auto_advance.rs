// file: src/pipeline/auto_advance.rs
// description: debounced continuation timer armed whenever the gate opens
// reference: cancellable tokio timer, one generation per arm

use crate::config::AutoAdvanceConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
enum AdvanceState {
    Idle,
    Armed {
        generation: u64,
        timer: CancellationToken,
    },
}

#[derive(Debug)]
pub struct AutoAdvanceController {
    enabled: bool,
    delay: Duration,
    state: AdvanceState,
    generation: u64,
    disposed: bool,
}

impl AutoAdvanceController {
    pub fn new(config: &AutoAdvanceConfig) -> Self {
        Self {
            enabled: config.enabled,
            delay: config.delay(),
            state: AdvanceState::Idle,
            generation: 0,
            disposed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, AdvanceState::Armed { .. })
    }

    /// Cancels any pending timer, then arms a fresh one when `should_advance`.
    /// `on_fire` runs on a spawned task after the delay, even for a zero delay,
    /// and receives the generation it was armed for.
    pub fn reevaluate<F>(&mut self, should_advance: bool, on_fire: F) -> bool
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.disarm();

        if !self.enabled || self.disposed || !should_advance {
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        let timer = token.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_fire(generation),
            }
        });

        debug!("Auto-advance armed (generation {}, {:?})", generation, delay);
        self.state = AdvanceState::Armed {
            generation,
            timer: token,
        };
        true
    }

    /// Marks the armed timer as fired. True exactly once, and only for the
    /// generation that is still armed.
    pub fn complete(&mut self, generation: u64) -> bool {
        match &self.state {
            AdvanceState::Armed { generation: armed, .. } if *armed == generation => {
                self.state = AdvanceState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn disarm(&mut self) -> bool {
        match std::mem::replace(&mut self.state, AdvanceState::Idle) {
            AdvanceState::Armed { timer, generation } => {
                timer.cancel();
                debug!("Auto-advance disarmed (generation {})", generation);
                true
            }
            AdvanceState::Idle => false,
        }
    }

    pub fn dispose(&mut self) {
        self.disarm();
        self.disposed = true;
    }
}

impl Drop for AutoAdvanceController {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn enabled(delay_ms: u64) -> AutoAdvanceConfig {
        AutoAdvanceConfig {
            enabled: true,
            delay_ms,
            ..AutoAdvanceConfig::default()
        }
    }

    fn shared() -> (Arc<Mutex<AutoAdvanceController>>, Arc<Mutex<Vec<u64>>>) {
        (
            Arc::new(Mutex::new(AutoAdvanceController::new(&enabled(500)))),
            Arc::new(Mutex::new(Vec::new())),
        )
    }

    fn arm(controller: &Arc<Mutex<AutoAdvanceController>>, fired: &Arc<Mutex<Vec<u64>>>) -> bool {
        let ctrl = controller.clone();
        let fired = fired.clone();
        controller.lock().unwrap().reevaluate(true, move |generation| {
            if ctrl.lock().unwrap().complete(generation) {
                fired.lock().unwrap().push(generation);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_never_arms() {
        let mut controller = AutoAdvanceController::new(&AutoAdvanceConfig::default());
        assert!(!controller.reevaluate(true, |_| panic!("must not fire")));
        assert!(!controller.is_armed());
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let (controller, fired) = shared();
        assert!(arm(&controller, &fired));
        assert!(controller.lock().unwrap().is_armed());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*fired.lock().unwrap(), vec![1]);
        assert!(!controller.lock().unwrap().is_armed());
        assert!(!controller.lock().unwrap().complete(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reevaluation_debounces() {
        let (controller, fired) = shared();
        arm(&controller, &fired);

        tokio::time::sleep(Duration::from_millis(200)).await;
        arm(&controller, &fired);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_reevaluation_cancels() {
        let (controller, fired) = shared();
        arm(&controller, &fired);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let armed = controller.lock().unwrap().reevaluate(false, |_| {});
        assert!(!armed);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_not_synchronous() {
        let mut controller = AutoAdvanceController::new(&enabled(0));
        let fired = Arc::new(Mutex::new(false));
        let flag = fired.clone();

        controller.reevaluate(true, move |_| *flag.lock().unwrap() = true);
        assert!(!*fired.lock().unwrap());

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(*fired.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_prevents_rearm() {
        let (controller, fired) = shared();
        arm(&controller, &fired);
        controller.lock().unwrap().dispose();
        assert!(!arm(&controller, &fired));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.lock().unwrap().is_empty());
    }
}
