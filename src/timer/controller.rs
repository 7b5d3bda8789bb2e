use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::sync::watch;

use crate::settings::StopwatchSettings;

use super::{
    commands::Command, LapStats, ScheduleHandle, Scheduler, TimerState,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub stats: LapStats,
}

impl TimerSnapshot {
    fn capture(state: &TimerState) -> Self {
        Self {
            stats: state.stats(),
            state: state.clone(),
        }
    }
}

/// Owns one stopwatch and the tick source that drives it.
///
/// Exactly one tick source exists while the stopwatch is running and none
/// otherwise. Every change is published to `subscribe()` receivers.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    scheduler: Arc<dyn Scheduler>,
    ticker: Arc<Mutex<Option<ScheduleHandle>>>,
    /// Bumped whenever a tick source is scheduled or cancelled; a callback
    /// only ticks while it matches the generation it was scheduled with.
    ticker_generation: Arc<AtomicU64>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
    updates: Arc<watch::Sender<TimerSnapshot>>,
}

impl TimerController {
    pub fn new(scheduler: Arc<dyn Scheduler>, settings: &StopwatchSettings) -> Self {
        let state = TimerState::new();
        let (updates, _) = watch::channel(TimerSnapshot::capture(&state));

        Self {
            state: Arc::new(Mutex::new(state)),
            scheduler,
            ticker: Arc::new(Mutex::new(None)),
            ticker_generation: Arc::new(AtomicU64::new(0)),
            tick_interval: settings.tick_interval(),
            heartbeat_every_ticks: settings.heartbeat_every_ticks.max(1),
            updates: Arc::new(updates),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.updates.subscribe()
    }

    pub fn get_state(&self) -> TimerState {
        self.lock_state().clone()
    }

    pub fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::capture(&self.lock_state())
    }

    pub fn start(&self) -> TimerSnapshot {
        let mut state = self.lock_state();
        if state.start() {
            // Spawned while the state lock is held so a concurrent pause
            // cannot slip in between the transition and the new source.
            self.spawn_ticker();
            log_info!("timer started at {} ms", state.elapsed_ms());
        }
        self.publish(&state)
    }

    pub fn pause(&self) -> TimerSnapshot {
        let mut state = self.lock_state();
        if state.pause() {
            self.cancel_ticker();
            log_info!("timer paused at {} ms", state.elapsed_ms());
        }
        self.publish(&state)
    }

    pub fn toggle(&self) -> TimerSnapshot {
        if self.lock_state().is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&self) -> TimerSnapshot {
        let mut state = self.lock_state();
        state.reset();
        self.cancel_ticker();
        log_info!("timer reset");
        self.publish(&state)
    }

    pub fn lap(&self) -> TimerSnapshot {
        let mut state = self.lock_state();
        match state.lap() {
            Some(lap) => log_info!(
                "lap {} recorded: total {} ms, split {} ms",
                lap.number,
                lap.total_ms,
                lap.split_ms
            ),
            None => log_debug!("lap ignored while not running"),
        }
        self.publish(&state)
    }

    pub fn clear_laps(&self) -> TimerSnapshot {
        let mut state = self.lock_state();
        state.clear_laps();
        log_info!("laps cleared");
        self.publish(&state)
    }

    /// Advances time by hand. Normally the scheduled tick source does this.
    pub fn tick(&self, delta_ms: u64) -> TimerSnapshot {
        let mut state = self.lock_state();
        state.tick(delta_ms);
        self.publish(&state)
    }

    pub fn dispatch(&self, command: Command) -> TimerSnapshot {
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Toggle => self.toggle(),
            Command::Lap => self.lap(),
            Command::Reset => self.reset(),
            Command::ClearLaps => self.clear_laps(),
        }
    }

    /// Whether a tick source is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled())
    }

    fn spawn_ticker(&self) {
        let mut ticker_guard = self.lock_ticker();
        if let Some(handle) = ticker_guard.take() {
            handle.cancel();
        }

        let generation = self.ticker_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current_generation = self.ticker_generation.clone();
        let state = self.state.clone();
        let updates = self.updates.clone();
        let delta_ms = self.tick_interval.as_millis() as u64;
        let heartbeat_every = self.heartbeat_every_ticks;
        let mut ticks: u32 = 0;

        let handle = self.scheduler.schedule(
            Box::new(move || {
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                // Checked under the state lock, where start/pause/reset bump it.
                if current_generation.load(Ordering::SeqCst) != generation || !guard.is_running() {
                    return;
                }
                guard.tick(delta_ms);
                updates.send_replace(TimerSnapshot::capture(&guard));

                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    log_debug!("heartbeat: elapsed {} ms", guard.elapsed_ms());
                }
            }),
            self.tick_interval,
        );

        *ticker_guard = Some(handle);
    }

    fn cancel_ticker(&self) {
        self.ticker_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.lock_ticker().take() {
            handle.cancel();
        }
    }

    fn publish(&self, state: &TimerState) -> TimerSnapshot {
        let snapshot = TimerSnapshot::capture(state);
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    fn lock_state(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<ScheduleHandle>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Lap, TickCallback, TimerStatus, TokioScheduler};
    use tokio_util::sync::CancellationToken;

    /// Fires scheduled callbacks only when told to.
    #[derive(Default)]
    struct ManualScheduler {
        sources: Mutex<Vec<(CancellationToken, TickCallback)>>,
    }

    impl ManualScheduler {
        fn active(&self) -> usize {
            self.sources
                .lock()
                .unwrap()
                .iter()
                .filter(|(token, _)| !token.is_cancelled())
                .count()
        }

        fn fire(&self, times: usize) {
            for _ in 0..times {
                for (token, callback) in self.sources.lock().unwrap().iter_mut() {
                    if !token.is_cancelled() {
                        callback();
                    }
                }
            }
        }
    }

    impl ManualScheduler {
        /// Runs the `index`th scheduled callback even if it was cancelled,
        /// as a tick already in flight at cancellation would.
        fn fire_stale(&self, index: usize) {
            let mut sources = self.sources.lock().unwrap();
            (sources[index].1)();
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, callback: TickCallback, _interval: Duration) -> ScheduleHandle {
            let token = CancellationToken::new();
            self.sources.lock().unwrap().push((token.clone(), callback));
            ScheduleHandle::new(token)
        }
    }

    fn manual_controller() -> (Arc<ManualScheduler>, TimerController) {
        let scheduler = Arc::new(ManualScheduler::default());
        let controller = TimerController::new(scheduler.clone(), &StopwatchSettings::default());
        (scheduler, controller)
    }

    #[test]
    fn test_double_start_schedules_once() {
        let (scheduler, controller) = manual_controller();
        controller.start();
        controller.start();
        assert_eq!(scheduler.active(), 1);

        scheduler.fire(10);
        assert_eq!(controller.get_state().elapsed_ms(), 100);
    }

    #[test]
    fn test_pause_and_reset_cancel_source() {
        let (scheduler, controller) = manual_controller();
        controller.start();
        scheduler.fire(3);
        controller.pause();
        assert_eq!(scheduler.active(), 0);
        assert!(!controller.is_ticking());

        scheduler.fire(3);
        assert_eq!(controller.get_state().elapsed_ms(), 30);

        controller.start();
        assert_eq!(scheduler.active(), 1);
        controller.reset();
        assert_eq!(scheduler.active(), 0);
        assert_eq!(controller.get_state(), TimerState::new());
    }

    #[test]
    fn test_pause_when_not_running_changes_nothing() {
        let (scheduler, controller) = manual_controller();
        let before = controller.get_snapshot();
        let after = controller.pause();
        assert_eq!(before, after);
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn test_lap_scenario_through_scheduler() {
        let (scheduler, controller) = manual_controller();
        controller.start();
        scheduler.fire(250);
        controller.lap();
        scheduler.fire(150);
        let snapshot = controller.lap();

        assert_eq!(
            snapshot.state.laps(),
            &[
                Lap {
                    number: 1,
                    total_ms: 2500,
                    split_ms: 2500
                },
                Lap {
                    number: 2,
                    total_ms: 4000,
                    split_ms: 1500
                },
            ]
        );
        assert_eq!(snapshot.stats.best_ms, Some(1500));
        assert_eq!(snapshot.stats.average_ms, Some(2000.0));
    }

    #[test]
    fn test_dispatch_toggle() {
        let (scheduler, controller) = manual_controller();
        let snapshot = controller.dispatch(Command::Toggle);
        assert_eq!(snapshot.state.status(), TimerStatus::Running);
        scheduler.fire(1);

        let snapshot = controller.dispatch(Command::Toggle);
        assert_eq!(snapshot.state.status(), TimerStatus::Paused);
        assert_eq!(snapshot.state.elapsed_ms(), 10);

        let snapshot = controller.dispatch(Command::Lap);
        assert!(snapshot.state.laps().is_empty());
    }

    #[test]
    fn test_clear_laps_keeps_running() {
        let (scheduler, controller) = manual_controller();
        controller.start();
        scheduler.fire(5);
        controller.lap();
        let snapshot = controller.clear_laps();
        assert!(snapshot.state.laps().is_empty());
        assert_eq!(snapshot.stats.count, 0);
        assert!(snapshot.state.is_running());
        assert_eq!(scheduler.active(), 1);
    }

    #[test]
    fn test_updates_are_published() {
        let (scheduler, controller) = manual_controller();
        let mut updates = controller.subscribe();
        controller.start();
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().state.is_running());

        scheduler.fire(2);
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().state.elapsed_ms(), 20);
    }

    #[test]
    fn test_in_flight_tick_from_cancelled_source_is_ignored() {
        let (scheduler, controller) = manual_controller();
        controller.start();
        scheduler.fire(1);
        controller.pause();
        controller.start();
        assert_eq!(scheduler.active(), 1);

        scheduler.fire_stale(0);
        assert_eq!(controller.get_state().elapsed_ms(), 10);

        scheduler.fire(1);
        assert_eq!(controller.get_state().elapsed_ms(), 20);
    }

    #[test]
    fn test_pause_start_on_tick_boundary_adds_no_time() {
        for _ in 0..50 {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            runtime.block_on(async {
                let controller = TimerController::new(
                    Arc::new(TokioScheduler::current()),
                    &StopwatchSettings::default(),
                );
                let t0 = tokio::time::Instant::now();
                controller.start();
                tokio::time::sleep_until(t0 + Duration::from_millis(10)).await;

                controller.pause();
                let frozen = controller.get_state().elapsed_ms();
                controller.start();

                // The new source first ticks at t0 + 20ms.
                tokio::time::sleep_until(t0 + Duration::from_millis(15)).await;
                assert_eq!(controller.get_state().elapsed_ms(), frozen);
                controller.reset();
            });
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_follows_tokio_clock() {
        let controller =
            TimerController::new(Arc::new(TokioScheduler::current()), &StopwatchSettings::default());
        controller.start();
        controller.start();

        tokio::time::sleep(Duration::from_millis(1005)).await;
        assert_eq!(controller.get_state().elapsed_ms(), 1000);

        controller.pause();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.get_state().elapsed_ms(), 1000);
    }
}
