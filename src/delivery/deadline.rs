//! Receive deadlines

use std::time::Duration;
use tokio::time::Instant;

/// When a waiting receive gives up
///
/// `Deadline::after(Duration::ZERO)` polls once. Waiting without limit must
/// be asked for explicitly with [`Deadline::Never`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    At(Instant),
    Never,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Deadline::Never, Deadline::At)
    }

    pub fn immediate() -> Self {
        Deadline::At(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        match self {
            Deadline::At(at) => Instant::now() >= *at,
            Deadline::Never => false,
        }
    }

    /// Time left before expiry; `None` for [`Deadline::Never`]
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Deadline::At(at) => Some(at.saturating_duration_since(Instant::now())),
            Deadline::Never => None,
        }
    }
}

impl From<Duration> for Deadline {
    fn from(timeout: Duration) -> Self {
        Deadline::after(timeout)
    }
}
