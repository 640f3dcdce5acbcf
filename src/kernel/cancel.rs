use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::time::Millis;

/// Timer slots, one per timed state of the recording window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerSlot {
    /// Pre-roll between the seek and the start of recording.
    Countdown,
    /// Stops the recording once the segment's duration has elapsed.
    RecordingWatchdog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Armed,
    Fired,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct Timer {
    pub armed_at: Millis,
    pub deadline: Millis,
    pub status: TimerStatus,
}

/// Single cancellation table for every timer the engine starts.
///
/// Timers are plain deadlines checked by `take_expired`; nothing runs in the
/// background, so a cancelled entry can never fire later.
#[derive(Debug, Default)]
pub struct TimerTable {
    timers: HashMap<TimerSlot, Timer>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `slot`, replacing whatever was there.
    pub fn arm(&mut self, slot: TimerSlot, now: Millis, duration_ms: u64) {
        self.timers.insert(
            slot,
            Timer {
                armed_at: now,
                deadline: now.after(duration_ms),
                status: TimerStatus::Armed,
            },
        );
    }

    /// Returns true only if an armed timer was actually cancelled.
    /// Cancelling twice, after firing, or an unknown slot is a no-op.
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        match self.timers.get_mut(&slot) {
            Some(timer) if timer.status == TimerStatus::Armed => {
                timer.status = TimerStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Cancels every armed timer. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for timer in self.timers.values_mut() {
            if timer.status == TimerStatus::Armed {
                timer.status = TimerStatus::Cancelled;
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Marks every armed timer whose deadline has passed as fired and
    /// returns their slots, earliest deadline first.
    pub fn take_expired(&mut self, now: Millis) -> Vec<TimerSlot> {
        let mut expired: Vec<(Millis, TimerSlot)> = self
            .timers
            .iter_mut()
            .filter(|(_, t)| t.status == TimerStatus::Armed && t.deadline <= now)
            .map(|(slot, t)| {
                t.status = TimerStatus::Fired;
                (t.deadline, *slot)
            })
            .collect();
        expired.sort_by_key(|(deadline, _)| *deadline);
        expired.into_iter().map(|(_, slot)| slot).collect()
    }

    pub fn status(&self, slot: TimerSlot) -> Option<TimerStatus> {
        self.timers.get(&slot).map(|t| t.status)
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.status(slot) == Some(TimerStatus::Armed)
    }

    pub fn get(&self, slot: TimerSlot) -> Option<&Timer> {
        self.timers.get(&slot)
    }

    pub fn remaining_ms(&self, slot: TimerSlot, now: Millis) -> Option<u64> {
        self.timers
            .get(&slot)
            .filter(|t| t.status == TimerStatus::Armed)
            .map(|t| t.deadline.since(now))
    }
}
