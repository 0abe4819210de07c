//! Single-slot timed process shared by crafting and research.
//!
//! Driven purely by `advance(dt)`; completion can only happen inside
//! `advance` and fires once per threshold crossing, after which the process
//! is back to `Idle`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressState<Id> {
    Idle,
    Active { target: Id, elapsed: f32, duration: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression<Id> {
    state: ProgressState<Id>,
}

impl<Id> Default for Progression<Id> {
    fn default() -> Self {
        Self {
            state: ProgressState::Idle,
        }
    }
}

impl<Id: Clone> Progression<Id> {
    pub fn state(&self) -> &ProgressState<Id> {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ProgressState::Active { .. })
    }

    pub fn active_target(&self) -> Option<&Id> {
        match &self.state {
            ProgressState::Active { target, .. } => Some(target),
            ProgressState::Idle => None,
        }
    }

    /// Fraction complete in `[0, 1]`; zero while idle.
    pub fn progress(&self) -> f32 {
        match &self.state {
            ProgressState::Active {
                elapsed, duration, ..
            } if *duration > 0.0 => (elapsed / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Returns `false` and leaves the running process alone if already active.
    pub fn begin(&mut self, target: Id, duration: f32) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = ProgressState::Active {
            target,
            elapsed: 0.0,
            duration,
        };
        true
    }

    /// Accumulates `dt` and returns the finished target when the duration is reached.
    ///
    /// Idle processes and processes with a non-positive duration do not move.
    pub fn advance(&mut self, dt: f32) -> Option<Id> {
        let ProgressState::Active {
            target,
            elapsed,
            duration,
        } = &mut self.state
        else {
            return None;
        };
        if *duration <= 0.0 {
            return None;
        }
        *elapsed += dt.max(0.0);
        if *elapsed < *duration {
            return None;
        }
        let finished = target.clone();
        self.state = ProgressState::Idle;
        Some(finished)
    }

    /// Drops the active process, returning its target. No-op while idle.
    pub fn cancel(&mut self) -> Option<Id> {
        match std::mem::replace(&mut self.state, ProgressState::Idle) {
            ProgressState::Active { target, .. } => Some(target),
            ProgressState::Idle => None,
        }
    }
}
