//! Error types for beagle-core.
//!
//! Only batch-level structural problems are errors. Anything that goes wrong
//! inside a single length group (too few captures, degenerate input, no or
//! ambiguous solution, inconsistent XOR-out, cancellation) is reported as a
//! [`GroupStatus`](crate::report::GroupStatus) and never aborts sibling groups.
//!
//! # Error Categories
//!
//! - **Batch errors**: `NoCaptures`
//! - **Width errors**: `WidthMismatch`, `UnsupportedWidth`
//! - **Grouping errors**: `LengthMismatch`

/// Result type alias for beagle-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole search call.
///
/// Each variant carries enough context to point at the offending capture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    // ==================== Batch Errors ====================
    /// The request contained no captures at all.
    ///
    /// Without at least one output the CRC width cannot be inferred.
    #[error("no captures supplied")]
    NoCaptures,

    // ==================== Width Errors ====================
    /// Output byte lengths disagree across the batch, or with the declared width.
    ///
    /// Raised before any grouping takes place.
    #[error("width mismatch at capture {index}: expected {expected} output bytes, found {found}")]
    WidthMismatch {
        /// Position of the offending capture in the request.
        index: usize,
        /// Output length implied by the declared width or the first capture.
        expected: usize,
        /// Output length of the offending capture.
        found: usize,
    },

    /// The declared or inferred width is outside the supported `1..=64` bits.
    #[error("unsupported CRC width: {width} bits")]
    UnsupportedWidth {
        /// Width in bits.
        width: u32,
    },

    // ==================== Grouping Errors ====================
    /// A payload length disagrees with the rest of its declared group.
    ///
    /// Pre-grouped input must be homogeneous; this is a caller bug.
    #[error("length mismatch in group {group}: expected {expected}-byte payloads, found {found}")]
    LengthMismatch {
        /// Position of the declared group in the request.
        group: usize,
        /// Payload length of the group's first capture.
        expected: usize,
        /// Payload length of the offending capture.
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(Error::NoCaptures.to_string(), "no captures supplied");

        let err = Error::WidthMismatch {
            index: 3,
            expected: 2,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "width mismatch at capture 3: expected 2 output bytes, found 4"
        );

        let err = Error::UnsupportedWidth { width: 65 };
        assert_eq!(err.to_string(), "unsupported CRC width: 65 bits");

        let err = Error::LengthMismatch {
            group: 1,
            expected: 20,
            found: 19,
        };
        assert!(err.to_string().contains("group 1"));
        assert!(err.to_string().contains("19"));
    }

    #[test]
    fn error_implements_std_error() {
        let err = Error::NoCaptures;
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn error_is_clone_and_eq() {
        let err1 = Error::UnsupportedWidth { width: 0 };
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
