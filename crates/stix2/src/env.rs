//! Injectable time and identifier sources.
//!
//! Every operation that needs "now" or a fresh random UUID takes an
//! [`Environment`]. The default uses the system clock and random v4 UUIDs;
//! tests pass a [`FixedClock`] and [`SequentialIds`] instead.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// A source of random (non-deterministic) identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_uuid(&self) -> Uuid;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Sequential UUIDs of the form `00000000-0000-4000-8000-00000000NNNN`,
/// starting at 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_uuid(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0000 | (n as u128 & 0xffff_ffff_ffff))
    }
}

/// Clock and identifier capabilities passed into construction and versioning.
#[derive(Clone)]
pub struct Environment {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Environment {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Environment { clock, ids }
    }

    /// A fixed clock plus sequential identifiers.
    pub fn deterministic(now: DateTime<Utc>) -> Self {
        Environment::new(Arc::new(FixedClock(now)), Arc::new(SequentialIds::new()))
    }

    /// Current time as a timestamp with unset precision.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now())
    }

    pub fn next_uuid(&self) -> Uuid {
        self.ids.next_uuid()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new(Arc::new(SystemClock), Arc::new(RandomIds))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
