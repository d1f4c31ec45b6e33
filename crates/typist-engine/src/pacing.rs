//! Typing pace: words-per-minute base delay plus uniform jitter.

use std::time::Duration;

use rand::Rng;

use crate::error::EngineError;

/// Average characters per word used to turn WPM into a per-character delay.
const CHARS_PER_WORD: u64 = 5;

/// Pacing parameters for one typing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingSettings {
    base_wpm: u32,
    min_jitter_ms: u64,
    max_jitter_ms: u64,
}

impl PacingSettings {
    pub const DEFAULT_WPM: u32 = 120;
    pub const DEFAULT_MIN_JITTER_MS: u64 = 50;
    pub const DEFAULT_MAX_JITTER_MS: u64 = 200;

    /// Validate and build pacing settings.
    pub fn new(base_wpm: u32, min_jitter_ms: u64, max_jitter_ms: u64) -> Result<Self, EngineError> {
        if base_wpm == 0 {
            return Err(EngineError::Settings(
                "typing speed must be greater than 0 WPM".to_string(),
            ));
        }
        if min_jitter_ms > max_jitter_ms {
            return Err(EngineError::Settings(format!(
                "minimum delay ({} ms) is greater than maximum delay ({} ms)",
                min_jitter_ms, max_jitter_ms
            )));
        }
        Ok(Self {
            base_wpm,
            min_jitter_ms,
            max_jitter_ms,
        })
    }

    pub fn base_wpm(&self) -> u32 {
        self.base_wpm
    }

    pub fn min_jitter_ms(&self) -> u64 {
        self.min_jitter_ms
    }

    pub fn max_jitter_ms(&self) -> u64 {
        self.max_jitter_ms
    }

    /// Delay per character before jitter: `60000 / (wpm * 5)` ms.
    pub fn base_delay(&self) -> Duration {
        Duration::from_nanos(60_000_000_000 / (u64::from(self.base_wpm) * CHARS_PER_WORD))
    }

    /// Shortest and longest delay [`next_delay`](Self::next_delay) can produce.
    pub fn delay_bounds(&self) -> (Duration, Duration) {
        let base = self.base_delay();
        (
            base + Duration::from_millis(self.min_jitter_ms),
            base + Duration::from_millis(self.max_jitter_ms),
        )
    }

    /// Draw the pause to take after a character.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter = rng.gen_range(self.min_jitter_ms..=self.max_jitter_ms);
        self.base_delay() + Duration::from_millis(jitter)
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            base_wpm: Self::DEFAULT_WPM,
            min_jitter_ms: Self::DEFAULT_MIN_JITTER_MS,
            max_jitter_ms: Self::DEFAULT_MAX_JITTER_MS,
        }
    }
}
