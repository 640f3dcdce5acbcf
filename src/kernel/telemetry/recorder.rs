use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::kernel::window::{StopReason, WindowState};

const MAX_EVENTS: usize = 10_000;

/// Bounded engine event log. Oldest events fall off past `MAX_EVENTS`.
#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Every `(previous, current)` index change, oldest first.
    pub fn boundary_crossings(&self) -> Vec<(Option<usize>, Option<usize>)> {
        self.buffer
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::BoundaryCrossed { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    /// States `segment`'s windows passed through, starting with `Idle` for
    /// each attempt.
    pub fn window_path(&self, segment: usize) -> Vec<WindowState> {
        let mut path = Vec::new();
        for event in &self.buffer {
            if let TelemetryEvent::WindowTransition { segment: s, from, to, .. } = event {
                if *s != segment {
                    continue;
                }
                if path.last() != Some(from) {
                    path.push(*from);
                }
                path.push(*to);
            }
        }
        path
    }

    /// Why the most recent recording of `segment` ended, if one ended.
    pub fn last_stop_reason(&self, segment: usize) -> Option<StopReason> {
        self.buffer.iter().rev().find_map(|e| match e {
            TelemetryEvent::RecordingClosed { segment: s, reason, .. } if *s == segment => Some(*reason),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
