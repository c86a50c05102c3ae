//! Beat scheduler: a cancellable repeating timer derived from BPM.
//!
//! Each run of the timer gets a new generation number. Restarting is
//! cancel-then-schedule: the previous timer thread is signalled and joined
//! before the next one is spawned, so at most one timer exists at a time.
//! Ticks already posted by a cancelled generation can still be sitting in the
//! UI queue; receivers compare `Tick::generation` against
//! [`BeatScheduler::generation`] and drop stale ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::SchedulerError;
use crate::events::EventSink;

/// One firing of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Timer run that produced this tick
    pub generation: u64,

    /// Beat number within the run, starting at 1
    pub beat: u64,
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running { bpm: u32 },
}

/// Tick interval for a tempo: exactly `60000 / bpm` milliseconds
pub fn interval_for_bpm(bpm: u32) -> Result<Duration, SchedulerError> {
    if bpm == 0 {
        return Err(SchedulerError::InvalidBpm(bpm));
    }
    Ok(Duration::from_nanos(60_000_000_000 / bpm as u64))
}

/// Cancellation flag the timer thread sleeps on
#[derive(Default)]
struct CancelSignal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelSignal {
    fn cancel(&self) {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            *cancelled = true;
        }
        self.wake.notify_all();
    }

    /// Sleep until `deadline`; returns `true` if cancelled meanwhile
    fn wait_until(&self, deadline: Instant) -> bool {
        let Ok(mut cancelled) = self.cancelled.lock() else {
            return true;
        };
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.wake.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(_) => return true,
            };
        }
    }
}

struct RunningTimer {
    bpm: u32,
    signal: Arc<CancelSignal>,

    /// Set by the thread when it returns on its own (receiver gone)
    exited: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl RunningTimer {
    fn is_live(&self) -> bool {
        !self.exited.load(Ordering::Acquire)
    }
}

/// Repeating beat timer delivering [`Tick`]s to a sink
pub struct BeatScheduler<S: EventSink<Tick>> {
    sink: S,
    generation: u64,
    running: Option<RunningTimer>,
}

impl<S: EventSink<Tick>> BeatScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            generation: 0,
            running: None,
        }
    }

    /// Start ticking at `bpm`, replacing any running timer
    pub fn start(&mut self, bpm: u32) -> Result<(), SchedulerError> {
        let interval = interval_for_bpm(bpm)?;

        // Cancel-then-schedule
        self.stop();

        self.generation += 1;
        let generation = self.generation;
        let signal = Arc::new(CancelSignal::default());
        let thread_signal = Arc::clone(&signal);
        let exited = Arc::new(AtomicBool::new(false));
        let thread_exited = Arc::clone(&exited);
        let sink = self.sink.clone();

        let handle = thread::Builder::new()
            .name(format!("beat-timer-{}", generation))
            .spawn(move || {
                run_timer(generation, interval, &thread_signal, &sink);
                thread_exited.store(true, Ordering::Release);
            })?;

        log::debug!(
            "Timer generation {} started at {} BPM ({:?})",
            generation,
            bpm,
            interval
        );

        self.running = Some(RunningTimer {
            bpm,
            signal,
            exited,
            handle,
        });
        Ok(())
    }

    /// Stop ticking; returns once the timer thread has exited
    pub fn stop(&mut self) {
        if let Some(timer) = self.running.take() {
            timer.signal.cancel();
            if timer.handle.join().is_err() {
                log::error!("Timer thread panicked");
            }
            log::debug!("Timer generation {} stopped", self.generation);
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.running {
            Some(timer) if timer.is_live() => SchedulerState::Running { bpm: timer.bpm },
            _ => SchedulerState::Stopped,
        }
    }

    /// Whether a timer thread is still ticking
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(RunningTimer::is_live)
    }

    /// Generation of the current (or most recent) timer run
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick belongs to the live timer run
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.is_running() && tick.generation == self.generation
    }
}

impl<S: EventSink<Tick>> Drop for BeatScheduler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Timer thread body
fn run_timer<S: EventSink<Tick>>(
    generation: u64,
    interval: Duration,
    signal: &CancelSignal,
    sink: &S,
) {
    let mut next = Instant::now() + interval;
    let mut beat = 0;

    loop {
        if signal.wait_until(next) {
            return;
        }

        beat += 1;
        if !sink.send(Tick { generation, beat }) {
            // Receiver gone, nothing left to drive
            return;
        }

        next += interval;
        let now = Instant::now();
        if next < now {
            // Fell more than one interval behind; re-anchor instead of bursting
            next = now + interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_interval_for_bpm() {
        assert_eq!(interval_for_bpm(120).unwrap(), Duration::from_millis(500));
        assert_eq!(interval_for_bpm(60).unwrap(), Duration::from_millis(1000));
        assert_eq!(interval_for_bpm(100).unwrap(), Duration::from_millis(600));
        assert_eq!(interval_for_bpm(240).unwrap(), Duration::from_millis(250));
        assert!(matches!(
            interval_for_bpm(0),
            Err(SchedulerError::InvalidBpm(0))
        ));
    }

    #[test]
    fn test_interval_matches_formula_for_all_tempos() {
        for bpm in 1..=600u32 {
            let expected_ms = 60_000.0 / bpm as f64;
            let got_ms = interval_for_bpm(bpm).unwrap().as_secs_f64() * 1000.0;
            assert!((got_ms - expected_ms).abs() < 1e-6, "bpm {}", bpm);
        }
    }

    #[test]
    fn test_ticks_arrive_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        scheduler.start(600).unwrap(); // 100ms

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        scheduler.stop();

        assert_eq!(first, Tick { generation: 1, beat: 1 });
        assert_eq!(second, Tick { generation: 1, beat: 2 });
    }

    #[test]
    fn test_first_tick_waits_one_interval() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        let started = Instant::now();
        scheduler.start(300).unwrap(); // 200ms

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(190));
    }

    #[test]
    fn test_start_twice_never_doubles_ticks() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        scheduler.start(600).unwrap();
        scheduler.start(600).unwrap();
        assert_eq!(scheduler.generation(), 2);

        std::thread::sleep(Duration::from_millis(550));
        scheduler.stop();

        let ticks: Vec<Tick> = rx.try_iter().collect();
        // Only the second generation may tick after the restart
        let live: Vec<&Tick> = ticks.iter().filter(|t| t.generation == 2).collect();
        assert!(ticks.iter().all(|t| t.generation == 2));
        // ~5 ticks at 100ms in 550ms; doubled timers would produce ~10
        assert!(live.len() >= 3 && live.len() <= 6, "got {}", live.len());
        for (i, tick) in live.iter().enumerate() {
            assert_eq!(tick.beat, i as u64 + 1);
        }
    }

    #[test]
    fn test_stop_halts_ticks() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        scheduler.start(600).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        let _ = rx.try_iter().count();
        std::thread::sleep(Duration::from_millis(250));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_bpm_change_replaces_timer() {
        let (tx, _rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        scheduler.start(100).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running { bpm: 100 });

        scheduler.start(140).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running { bpm: 140 });
        assert!(scheduler.is_current(&Tick { generation: 2, beat: 1 }));
        assert!(!scheduler.is_current(&Tick { generation: 1, beat: 7 }));
    }

    #[test]
    fn test_invalid_bpm_keeps_state() {
        let (tx, _rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        assert!(scheduler.start(0).is_err());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.generation(), 0);
    }

    #[test]
    fn test_timer_exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = BeatScheduler::new(tx);
        drop(rx);
        scheduler.start(600).unwrap();
        assert!(scheduler.is_running());
        std::thread::sleep(Duration::from_millis(250));

        // The thread gave up after its first tick found no receiver
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(!scheduler.is_current(&Tick { generation: 1, beat: 1 }));

        // Joins an already-finished thread without hanging
        scheduler.stop();
    }

    /// Sink whose first delivery blocks for `stall`, recording send times
    #[derive(Clone)]
    struct StallingSink {
        tx: mpsc::Sender<(Tick, Instant)>,
        stall: Duration,
    }

    impl EventSink<Tick> for StallingSink {
        fn send(&self, tick: Tick) -> bool {
            let sent = self.tx.send((tick, Instant::now())).is_ok();
            if tick.beat == 1 {
                std::thread::sleep(self.stall);
            }
            sent
        }
    }

    #[test]
    fn test_late_timer_reanchors_instead_of_bursting() {
        let (tx, rx) = mpsc::channel();
        let interval = Duration::from_millis(100);
        let mut scheduler = BeatScheduler::new(StallingSink {
            tx,
            stall: interval * 3,
        });
        scheduler.start(600).unwrap(); // 100ms

        let ticks: Vec<(Tick, Instant)> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(3)).unwrap())
            .collect();
        scheduler.stop();

        let beats: Vec<u64> = ticks.iter().map(|(t, _)| t.beat).collect();
        assert_eq!(beats, vec![1, 2, 3, 4]);

        // Beat 2 waits a full interval after the stall ends
        let after_stall = ticks[1].1 - ticks[0].1;
        assert!(after_stall >= interval * 3 + interval * 8 / 10, "{:?}", after_stall);

        // Later beats keep the interval spacing; a catch-up burst would be ~0ms apart
        for pair in ticks[1..].windows(2) {
            let gap = pair[1].1 - pair[0].1;
            assert!(gap >= interval * 7 / 10, "burst gap {:?}", gap);
        }
    }
}
