// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative work queue drained during host idle time.
//!
//! Nothing in here spawns threads or runs on its own. The host decides when it
//! has spare time and hands the queue an [`IdleDeadline`]; units run one at a
//! time until the deadline reports that time is up.

use alloc::collections::VecDeque;

/// Reports whether the current idle period has time left.
pub trait IdleDeadline {
    /// Returns true if another unit of work may run.
    ///
    /// Called once before each unit.
    fn has_time_remaining(&mut self) -> bool;
}

/// A deadline that allows a fixed number of work units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TaskBudget {
    remaining: usize,
}

impl TaskBudget {
    /// Allows `units` work units to run.
    pub fn new(units: usize) -> Self {
        Self { remaining: units }
    }

    /// Allows every pending unit to run.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Units that may still run.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl IdleDeadline for TaskBudget {
    fn has_time_remaining(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// A deadline bound to a wall-clock instant.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug)]
pub struct InstantDeadline {
    deadline: std::time::Instant,
}

#[cfg(feature = "std")]
impl InstantDeadline {
    /// Runs work until `deadline`.
    pub fn new(deadline: std::time::Instant) -> Self {
        Self { deadline }
    }

    /// Runs work for `duration` from now.
    pub fn after(duration: core::time::Duration) -> Self {
        Self::new(std::time::Instant::now() + duration)
    }
}

#[cfg(feature = "std")]
impl IdleDeadline for InstantDeadline {
    fn has_time_remaining(&mut self) -> bool {
        std::time::Instant::now() < self.deadline
    }
}

/// FIFO of work units waiting for idle time.
///
/// Units are plain data; the owner of the queue executes them as they are
/// popped. Clearing the queue drops pending units without running them.
#[derive(Clone, Debug)]
pub struct IdleTaskQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> IdleTaskQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Appends a unit of work.
    pub fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    /// Drops every pending unit, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        dropped
    }

    /// Pops the next unit if the deadline allows another one to run.
    pub fn pop_if(&mut self, deadline: &mut dyn IdleDeadline) -> Option<T> {
        if self.tasks.is_empty() || !deadline.has_time_remaining() {
            return None;
        }
        self.tasks.pop_front()
    }

    /// Number of pending units.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no units are pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for IdleTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for IdleTaskQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}
