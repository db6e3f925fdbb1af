//! Channels that produce a fixed request on a timer.

mod clock;
mod schedule;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde_json::json;
use tracing::debug;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::schedule::Schedule;
use super::{CHANNEL_TARGET, Channel, ChannelError, StopSignal};
use crate::errors::SetupError;

const WAIT_SLICE: Duration = Duration::from_millis(250);

/// Emits `request` whenever its [`Schedule`] fires.
///
/// Only one worker may own a scheduled task, so [`Channel::try_clone`]
/// always fails. Waiting is interruptible: shutting the channel down wakes
/// the sleeping worker at once. The clock is re-read at least every 250 ms,
/// so clock jumps are noticed without waiting out the old deadline.
#[derive(Debug)]
pub struct ScheduledTaskChannel {
    name: String,
    request: String,
    schedule: Schedule,
    zone: Tz,
    clock: Arc<dyn Clock>,
    next_fire: DateTime<Utc>,
    stop: StopSignal,
}

impl ScheduledTaskChannel {
    /// Fires every `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Fails when `minutes` is outside `1..=1440`.
    pub fn minutes(
        name: impl Into<String>,
        request: impl Into<String>,
        minutes: u32,
    ) -> Result<Self, SetupError> {
        Ok(Self::new(name, request, Schedule::minutes(minutes)?, Tz::UTC))
    }

    /// Fires daily at `time_of_day` (`HH:MM`) in `zone`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed time or an unknown zone.
    pub fn daily(
        name: impl Into<String>,
        request: impl Into<String>,
        time_of_day: &str,
        zone: &str,
    ) -> Result<Self, SetupError> {
        let schedule = Schedule::daily(time_of_day)?;
        Ok(Self::new(name, request, schedule, schedule::parse_zone(zone)?))
    }

    /// Fires monthly on `day_of_month` at `time_of_day` (`HH:MM`) in `zone`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed time, a day outside `1..=28` or an unknown zone.
    pub fn monthly(
        name: impl Into<String>,
        request: impl Into<String>,
        time_of_day: &str,
        day_of_month: u32,
        zone: &str,
    ) -> Result<Self, SetupError> {
        let schedule = Schedule::monthly(time_of_day, day_of_month)?;
        Ok(Self::new(name, request, schedule, schedule::parse_zone(zone)?))
    }

    /// Builds a task from an already validated schedule.
    #[must_use]
    pub fn new(name: impl Into<String>, request: impl Into<String>, schedule: Schedule, zone: Tz) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let next_fire = schedule.next_fire(clock.now(), zone);
        Self {
            name: name.into(),
            request: request.into(),
            schedule,
            zone,
            clock,
            next_fire,
            stop: StopSignal::new(),
        }
    }

    /// Replaces the time source and recomputes the next firing instant.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.next_fire = self.schedule.next_fire(clock.now(), self.zone);
        self.clock = clock;
        self
    }

    /// Instant the task fires next.
    #[must_use]
    pub const fn next_fire(&self) -> DateTime<Utc> {
        self.next_fire
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn remaining(&self) -> Duration {
        (self.next_fire - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl Channel for ScheduledTaskChannel {
    fn get_request(&mut self, buffer: &mut Vec<u8>) -> Result<bool, ChannelError> {
        loop {
            let remaining = self.remaining();
            if remaining.is_zero() {
                break;
            }
            if self.stop.wait_timeout(remaining.min(WAIT_SLICE)) {
                return Ok(false);
            }
        }
        if self.stop.is_raised() {
            return Ok(false);
        }
        let fired = self.next_fire;
        self.next_fire = self.schedule.next_fire(fired.max(self.clock.now()), self.zone);
        debug!(
            target: CHANNEL_TARGET,
            task = %self.name,
            next_fire = %self.next_fire,
            "scheduled task fired"
        );
        buffer.clear();
        buffer.extend_from_slice(self.request.as_bytes());
        Ok(true)
    }

    fn write_response(&mut self, _response: &[u8]) -> Result<(), ChannelError> {
        Ok(())
    }

    fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn try_clone(&self) -> Result<Box<dyn Channel>, ChannelError> {
        Err(ChannelError::clone_unsupported("scheduled task"))
    }

    fn request_read_time(&self) -> Duration {
        Duration::ZERO
    }

    fn response_write_time(&self) -> Duration {
        Duration::ZERO
    }

    fn sender_info(&self) -> String {
        format!("ScheduledTask: {}", self.name)
    }

    fn status(&self) -> serde_json::Value {
        let mut status = json!({
            "kind": "scheduled_task",
            "task_name": self.name,
            "request": self.request,
            "time_zone": self.zone.name(),
            "next_task_time_utc": self.next_fire.to_rfc3339_opts(SecondsFormat::Secs, true),
            "task_interval": self.schedule.describe(self.zone),
        });
        let extra = match self.schedule {
            Schedule::Minutes(minutes) => json!({ "minutes": minutes }),
            Schedule::Daily { time_of_day } => {
                json!({ "time_of_day": time_of_day.format("%H:%M").to_string() })
            }
            Schedule::Monthly {
                time_of_day,
                day_of_month,
            } => json!({
                "time_of_day": time_of_day.format("%H:%M").to_string(),
                "day_of_month": day_of_month,
            }),
        };
        if let (Some(target), serde_json::Value::Object(fields)) = (status.as_object_mut(), extra) {
            target.extend(fields);
        }
        status
    }
}
