use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};

/// Remaining time at or below which the clock counts as running low.
pub const LOW_TIME_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Limited(u64),
    Unlimited,
}

impl ClockMode {
    pub fn from_limit(limit: Option<u64>) -> Self {
        match limit {
            Some(secs) if secs > 0 => ClockMode::Limited(secs),
            _ => ClockMode::Unlimited,
        }
    }
}

/// What a single tick did to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Tick(u64),
    /// First tick that lands inside the low-time window.
    Warning(u64),
    Expired,
}

type ExpiryHook = Box<dyn FnOnce() + Send>;

/// One-second countdown. Ticks are fed in from outside (see [`spawn_ticker`]),
/// which keeps the clock itself free of threads and easy to drive in tests.
pub struct Clock {
    mode: ClockMode,
    remaining: u64,
    running: bool,
    warned: bool,
    fired: bool,
    on_expire: Option<ExpiryHook>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("mode", &self.mode)
            .field("remaining", &self.remaining)
            .field("running", &self.running)
            .field("fired", &self.fired)
            .finish()
    }
}

impl Clock {
    pub fn new(mode: ClockMode) -> Self {
        let remaining = match mode {
            ClockMode::Limited(secs) => secs,
            ClockMode::Unlimited => 0,
        };
        Self {
            mode,
            remaining,
            running: false,
            warned: false,
            fired: false,
            on_expire: None,
        }
    }

    /// Register a hook run on expiry. It can run at most once.
    pub fn on_expire(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.on_expire = Some(Box::new(hook));
    }

    pub fn start(&mut self) {
        if self.mode == ClockMode::Unlimited || self.fired || self.remaining == 0 {
            return;
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to the configured duration, stopped. An expiry that already fired
    /// stays fired.
    pub fn reset(&mut self) {
        self.running = false;
        self.warned = false;
        if let ClockMode::Limited(secs) = self.mode {
            self.remaining = secs;
        }
    }

    pub fn add_time(&mut self, secs: u64) {
        if self.mode == ClockMode::Unlimited {
            return;
        }
        self.remaining = self.remaining.saturating_add(secs);
        if self.remaining > LOW_TIME_SECS {
            self.warned = false;
        }
    }

    pub fn tick(&mut self) -> Option<ClockEvent> {
        if !self.running || self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;

        if self.remaining == 0 {
            self.running = false;
            if self.fired {
                return None;
            }
            self.fired = true;
            info!("clock expired");
            if let Some(hook) = self.on_expire.take() {
                hook();
            }
            return Some(ClockEvent::Expired);
        }

        if self.is_time_low() && !self.warned {
            self.warned = true;
            debug!("clock entered low-time window at {}s", self.remaining);
            return Some(ClockEvent::Warning(self.remaining));
        }

        Some(ClockEvent::Tick(self.remaining))
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_unlimited(&self) -> bool {
        self.mode == ClockMode::Unlimited
    }

    pub fn has_expired(&self) -> bool {
        self.fired
    }

    pub fn is_time_low(&self) -> bool {
        !self.is_unlimited() && self.remaining > 0 && self.remaining <= LOW_TIME_SECS
    }

    pub fn display(&self) -> String {
        if self.is_unlimited() {
            return "--:--".to_string();
        }
        format_clock(self.remaining)
    }
}

/// `mm:ss` below an hour, `h:mm:ss` from an hour up.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick;

/// Owns the ticker thread. Dropping it cancels the interval.
pub struct TickerHandle {
    cancel: Arc<AtomicBool>,
}

impl TickerHandle {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn spawn_ticker(period: Duration) -> (mpsc::Receiver<TimerTick>, TickerHandle) {
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();

    thread::spawn(move || loop {
        thread::sleep(period);
        if flag.load(Ordering::SeqCst) {
            break;
        }
        if tx.send(TimerTick).is_err() {
            break;
        }
    });

    (rx, TickerHandle { cancel })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn counts_down_and_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook_count = fired.clone();
        let mut clock = Clock::new(ClockMode::Limited(3));
        clock.on_expire(move || {
            hook_count.fetch_add(1, Ordering::SeqCst);
        });
        clock.start();

        assert_eq!(clock.tick(), Some(ClockEvent::Warning(2)));
        assert_eq!(clock.tick(), Some(ClockEvent::Tick(1)));
        assert_eq!(clock.tick(), Some(ClockEvent::Expired));
        assert_eq!(clock.tick(), None);
        assert!(!clock.is_running());

        // restarting after expiry must not fire again
        clock.reset();
        clock.start();
        for _ in 0..5 {
            assert_ne!(clock.tick(), Some(ClockEvent::Expired));
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut clock = Clock::new(ClockMode::Limited(10));
        clock.start();
        clock.tick();
        clock.pause();
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.remaining(), 9);
    }

    #[test]
    fn unlimited_never_starts() {
        let mut clock = Clock::new(ClockMode::Unlimited);
        clock.start();
        assert!(!clock.is_running());
        assert_eq!(clock.tick(), None);
        assert!(!clock.is_time_low());
        assert_eq!(clock.display(), "--:--");
    }

    #[test]
    fn time_low_window() {
        let mut clock = Clock::new(ClockMode::Limited(301));
        assert!(!clock.is_time_low());
        clock.start();
        assert_eq!(clock.tick(), Some(ClockEvent::Warning(300)));
        assert!(clock.is_time_low());
        assert_eq!(clock.tick(), Some(ClockEvent::Tick(299)));

        clock.add_time(600);
        assert!(!clock.is_time_low());
    }

    #[test]
    fn display_formats() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(3599), "59:59");
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(7384), "2:03:04");
    }

    #[test]
    fn reset_restores_duration() {
        let mut clock = Clock::new(ClockMode::Limited(90));
        clock.start();
        clock.tick();
        clock.tick();
        clock.reset();
        assert_eq!(clock.remaining(), 90);
        assert!(!clock.is_running());
    }
}
