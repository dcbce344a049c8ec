use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_TRANSITION_MS: u64 = 500;

/// Interval over which a light is meant to fade from its previous state to the current one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransitionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TransitionWindow {
    /// Zero-length window, used for freshly created lights.
    pub fn settled(at: DateTime<Utc>) -> Self {
        TransitionWindow { start: at, end: at }
    }

    /// Start a new window at `now`. A transition still in progress is simply
    /// replaced; there is no blending of partial progress.
    pub fn begin(now: DateTime<Utc>, duration_ms: Option<u64>, default_ms: u64) -> Self {
        let ms = duration_ms.unwrap_or(default_ms);
        let ms = i64::try_from(ms).unwrap_or(i64::MAX);
        let end = Duration::try_milliseconds(ms)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        TransitionWindow { start: now, end }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}
