//! Poll timers
//!
//! Three independent periodic timers drive a connected session. They only
//! exist while a session does; dropping [`PollTimers`] cancels all three.

use robotele_settings::PollingSettings;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Timer periods and the handshake settle delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPeriods {
    /// Motor command period
    pub command: Duration,
    /// Frame and speed-query period
    pub fast_update: Duration,
    /// Battery query period
    pub status: Duration,
    /// Pause between handshake steps
    pub settle: Duration,
}

impl Default for PollPeriods {
    fn default() -> Self {
        Self {
            command: Duration::from_millis(30),
            fast_update: Duration::from_millis(50),
            status: Duration::from_millis(500),
            settle: Duration::from_millis(250),
        }
    }
}

impl From<&PollingSettings> for PollPeriods {
    fn from(settings: &PollingSettings) -> Self {
        Self {
            command: settings.command_period(),
            fast_update: settings.fast_update_period(),
            status: settings.status_period(),
            settle: settings.settle_delay(),
        }
    }
}

/// Which timer fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Send the joystick command
    Command,
    /// Show a pending frame, query speeds
    FastUpdate,
    /// Query the battery
    Status,
}

/// The armed timers of one session
#[derive(Debug)]
pub struct PollTimers {
    command: Interval,
    fast_update: Interval,
    status: Interval,
}

impl PollTimers {
    /// Arm all three timers. Each first fires one period from now.
    pub fn arm(periods: &PollPeriods) -> Self {
        let now = Instant::now();
        Self {
            command: Self::interval(now, periods.command),
            fast_update: Self::interval(now, periods.fast_update),
            status: Self::interval(now, periods.status),
        }
    }

    fn interval(now: Instant, period: Duration) -> Interval {
        let mut interval = interval_at(now + period, period);
        // A late loop skips ticks instead of bursting to catch up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }

    /// Wait for the next timer to fire
    pub async fn tick(&mut self) -> Tick {
        tokio::select! {
            biased;
            _ = self.command.tick() => Tick::Command,
            _ = self.fast_update.tick() => Tick::FastUpdate,
            _ = self.status.tick() => Tick::Status,
        }
    }
}

/// Next tick of the session timers, or never when there is no session
pub async fn next_tick(timers: Option<&mut PollTimers>) -> Tick {
    match timers {
        Some(timers) => timers.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_at_their_periods() {
        let start = Instant::now();
        let mut timers = PollTimers::arm(&PollPeriods::default());

        let mut fired = Vec::new();
        loop {
            let tick = timers.tick().await;
            fired.push((tick, start.elapsed().as_millis()));
            if tick == Tick::Status {
                break;
            }
        }

        assert_eq!(fired.first(), Some(&(Tick::Command, 30)));
        assert!(fired.contains(&(Tick::FastUpdate, 50)));
        assert!(fired.contains(&(Tick::Status, 500)));

        let commands = fired.iter().filter(|(t, _)| *t == Tick::Command).count();
        let fast = fired.iter().filter(|(t, _)| *t == Tick::FastUpdate).count();
        assert_eq!(commands, 16);
        assert_eq!(fast, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_session_never_ticks() {
        let result = tokio::time::timeout(Duration::from_secs(10), next_tick(None)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_periods_from_settings() {
        let settings = PollingSettings {
            command_period_ms: 20,
            ..PollingSettings::default()
        };
        let periods = PollPeriods::from(&settings);
        assert_eq!(periods.command, Duration::from_millis(20));
        assert_eq!(periods.settle, Duration::from_millis(250));
    }
}
