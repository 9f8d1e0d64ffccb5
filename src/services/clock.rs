// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process clock with an optional virtual-time override.
//!
//! Every time-dependent computation reads the current instant through a
//! [`Clock`]. Production wiring uses the system time source; tests inject a
//! fixed one. The override ("virtual time") freezes the clock at a single
//! instant until it is cleared.

use chrono::{DateTime, FixedOffset, Utc};
use std::sync::{Arc, RwLock};

use crate::time_utils::to_reference;

/// Source of real (non-overridden) time.
pub trait TimeSource: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A time source that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub DateTime<Utc>);

impl TimeSource for FixedTimeSource {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shared clock in the reference timezone.
pub struct Clock {
    source: Arc<dyn TimeSource>,
    virtual_now: RwLock<Option<DateTime<Utc>>>,
}

impl Clock {
    /// Clock backed by real system time.
    pub fn system() -> Self {
        Self::with_source(Arc::new(SystemTimeSource))
    }

    /// Clock frozen at `instant`.
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self::with_source(Arc::new(FixedTimeSource(instant)))
    }

    pub fn with_source(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            virtual_now: RwLock::new(None),
        }
    }

    /// Current instant in the reference timezone.
    ///
    /// Returns the override verbatim while one is set; it does not tick.
    pub fn now(&self) -> DateTime<FixedOffset> {
        let overridden = *self
            .virtual_now
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        to_reference(overridden.unwrap_or_else(|| self.source.now_utc()))
    }

    /// Replace or clear the virtual-time override.
    pub fn set_override(&self, instant: Option<DateTime<Utc>>) {
        let mut slot = self
            .virtual_now
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = instant;
        drop(slot);

        match instant {
            Some(at) => tracing::info!(virtual_time = %to_reference(at), "Virtual time set"),
            None => tracing::info!("Virtual time cleared, using real time"),
        }
    }

    /// Whether a virtual-time override is currently active.
    pub fn is_overridden(&self) -> bool {
        self.virtual_now
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("overridden", &self.is_overridden())
            .finish()
    }
}
