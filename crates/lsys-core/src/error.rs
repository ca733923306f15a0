//! Error types for the L-system pipeline.
//!
//! Almost nothing in the pipeline can fail: unresolved symbols pass through
//! the rewriter, an unmatched `]` is ignored by the turtle, and key
//! collisions in the editor are rejected silently. The two conditions that
//! do surface are an expansion that outgrows its length cap and invalid
//! runtime settings.

use thiserror::Error;

/// Failure to produce the expanded command string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The next rewrite round would exceed the configured length cap.
    ///
    /// `reached_iteration` is the number of rounds that completed before the
    /// cap was hit, `needed` the length the failing round would have produced.
    #[error(
        "expansion too large: iteration {} needs {needed} symbols (limit {limit})",
        .reached_iteration + 1
    )]
    TooLarge {
        limit: usize,
        needed: usize,
        reached_iteration: u32,
    },
}

/// Rejected [`Settings`](crate::config::Settings) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("glyph ramp needs at least {min} symbols, got {got}")]
    RampTooShort { min: usize, got: usize },

    #[error("segment length must be a positive finite number, got {0}")]
    InvalidLength(String),

    #[error("horizontal stretch must be a positive finite number, got {0}")]
    InvalidStretch(String),

    #[error("expansion limit must be at least 1")]
    ZeroExpansionLimit,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message_is_one_based() {
        let err = GenerationError::TooLarge {
            limit: 100,
            needed: 250,
            reached_iteration: 3,
        };
        assert_eq!(
            err.to_string(),
            "expansion too large: iteration 4 needs 250 symbols (limit 100)"
        );
    }

    #[test]
    fn ramp_too_short_message() {
        let err = ConfigError::RampTooShort { min: 10, got: 3 };
        assert!(err.to_string().contains("at least 10"));
        assert!(err.to_string().contains("got 3"));
    }
}
