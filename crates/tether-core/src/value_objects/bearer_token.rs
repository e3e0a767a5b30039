//! Bearer token value object
//!
//! Structural check only: three non-empty, dot-delimited base64url segments.
//! Signature and expiry are the server's business.

use std::fmt;

/// Errors from token shape validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenShapeError {
    #[error("token is empty")]
    Empty,

    #[error("token has {0} segments, expected 3")]
    SegmentCount(usize),

    #[error("token segment {0} is empty or contains invalid characters")]
    InvalidSegment(usize),
}

/// A bearer token with a plausible three-segment shape
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validate the shape of a raw token
    pub fn parse(raw: &str) -> Result<Self, TokenShapeError> {
        if raw.is_empty() {
            return Err(TokenShapeError::Empty);
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenShapeError::SegmentCount(segments.len()));
        }

        for (index, segment) in segments.iter().enumerate() {
            if !is_base64url_segment(segment) {
                return Err(TokenShapeError::InvalidSegment(index));
            }
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_base64url_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

// Never print credentials.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}
