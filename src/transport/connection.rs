//! Connection lifecycle tracking and reconnect scheduling.
//!
//! Reconnects happen on a fixed interval, forever: there is no backoff and no
//! retry limit. Each loss of the channel schedules exactly one attempt.

use std::time::{Duration, Instant};

/// Delay between a lost connection and the next attempt (milliseconds)
pub const RECONNECT_INTERVAL_MS: u64 = 5000;

/// Connection state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// An attempt is in flight
    Connecting { attempt: u64 },
    /// The channel is usable
    Open,
    /// The channel is gone; `next_retry` is when the next attempt starts
    Closed { next_retry: Option<Instant> },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionState::Connecting { attempt } if *attempt > 1 => {
                format!("Connecting (attempt {})", attempt)
            }
            ConnectionState::Connecting { .. } => "Connecting".to_string(),
            ConnectionState::Open => "Open".to_string(),
            ConnectionState::Closed {
                next_retry: Some(at),
            } => {
                let secs = at.saturating_duration_since(Instant::now()).as_secs_f32();
                format!("Closed (retry in {:.0}s)", secs.ceil())
            }
            ConnectionState::Closed { next_retry: None } => "Closed".to_string(),
        }
    }
}

/// Connection state machine driven by the transport task.
#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    interval: Duration,
    attempts: u64,
}

impl Connection {
    /// Start in `Connecting` for the first attempt.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: ConnectionState::Connecting { attempt: 1 },
            interval,
            attempts: 1,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Open;
    }

    /// Record a loss of the channel (including a failed attempt).
    ///
    /// Returns the instant of the next attempt. A close notification while
    /// a retry is already pending returns that retry, so retries never stack.
    pub fn on_close(&mut self, now: Instant) -> Instant {
        if let ConnectionState::Closed {
            next_retry: Some(at),
        } = self.state
        {
            return at;
        }
        let at = now + self.interval;
        self.state = ConnectionState::Closed {
            next_retry: Some(at),
        };
        at
    }

    /// The scheduled retry fired: start the next attempt.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
        self.state = ConnectionState::Connecting {
            attempt: self.attempts,
        };
    }

    /// The client closed the channel on purpose; nothing is rescheduled.
    pub fn shut_down(&mut self) {
        self.state = ConnectionState::Closed { next_retry: None };
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(Duration::from_millis(RECONNECT_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval_is_five_seconds() {
        assert_eq!(Connection::default().interval(), Duration::from_millis(5000));
    }

    #[test]
    fn test_starts_connecting() {
        let conn = Connection::default();
        assert_eq!(conn.state(), &ConnectionState::Connecting { attempt: 1 });
        assert!(!conn.state().is_open());
    }

    #[test]
    fn test_close_schedules_one_retry_at_interval() {
        let mut conn = Connection::default();
        conn.on_open();
        let now = Instant::now();
        assert_eq!(conn.on_close(now), now + Duration::from_millis(5000));
        let later = now + Duration::from_millis(1200);
        assert_eq!(conn.on_close(later), now + Duration::from_millis(5000));
        assert_eq!(
            conn.state(),
            &ConnectionState::Closed {
                next_retry: Some(now + Duration::from_millis(5000))
            }
        );
    }

    #[test]
    fn test_failed_first_attempt_schedules_retry() {
        let mut conn = Connection::default();
        let now = Instant::now();
        assert_eq!(conn.on_close(now), now + Duration::from_millis(5000));
        conn.begin_attempt();
        assert_eq!(conn.state(), &ConnectionState::Connecting { attempt: 2 });
        assert_eq!(conn.on_close(now), now + Duration::from_millis(5000));
    }

    #[test]
    fn test_retries_never_give_up() {
        let mut conn = Connection::new(Duration::from_millis(10));
        let mut now = Instant::now();
        for _ in 0..1000 {
            let at = conn.on_close(now);
            assert_eq!(at - now, Duration::from_millis(10));
            now = at;
            conn.begin_attempt();
        }
        assert_eq!(conn.attempts(), 1001);
    }

    #[test]
    fn test_close_after_shut_down_still_waits_interval() {
        let mut conn = Connection::new(Duration::from_millis(250));
        conn.shut_down();
        let now = Instant::now();
        assert_eq!(conn.on_close(now) - now, Duration::from_millis(250));
    }

    #[test]
    fn test_shut_down_schedules_nothing() {
        let mut conn = Connection::default();
        conn.on_open();
        conn.shut_down();
        assert_eq!(conn.state(), &ConnectionState::Closed { next_retry: None });
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConnectionState::Open.label(), "Open");
        assert_eq!(ConnectionState::Connecting { attempt: 1 }.label(), "Connecting");
        assert_eq!(
            ConnectionState::Connecting { attempt: 3 }.label(),
            "Connecting (attempt 3)"
        );
        assert_eq!(ConnectionState::Closed { next_retry: None }.label(), "Closed");
    }
}
