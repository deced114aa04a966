// idis-core/src/validators/pagination.rs
// ============================================================================
// Module: IDIS Pagination Validator
// Description: Cursor-based pagination parameter validation.
// Purpose: Reject out-of-range limits and unparsable cursors with stable codes.
// Dependencies: crate::core::{envelope, time}
// ============================================================================

//! ## Overview
//! List endpoints paginate with a limit in `[1, 200]` and an ISO-8601
//! timestamp cursor pointing at the last item of the previous page. Invalid
//! parameters map to the stable `INVALID_LIMIT` and `INVALID_CURSOR` codes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::envelope::codes;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default page size when no limit is supplied.
pub const DEFAULT_LIMIT: u32 = 50;
/// Maximum page size.
pub const MAX_LIMIT: i64 = 200;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Raw pagination parameters as received.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Requested page size.
    pub limit: Option<i64>,
    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,
}

/// Validated pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPage {
    /// Page size in `[1, 200]`.
    pub limit: u32,
    /// Cursor timestamp, when supplied.
    pub cursor: Option<Timestamp>,
}

/// Pagination validation failures.
#[derive(Debug, Error)]
pub enum PageError {
    /// Limit outside `[1, 200]`.
    #[error("limit must be between 1 and {MAX_LIMIT}")]
    InvalidLimit,
    /// Cursor is not an ISO-8601 timestamp.
    #[error("cursor is not a valid timestamp")]
    InvalidCursor,
}

impl PageError {
    /// Returns the stable envelope code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidLimit => codes::INVALID_LIMIT,
            Self::InvalidCursor => codes::INVALID_CURSOR,
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates pagination parameters.
///
/// # Errors
///
/// Returns [`PageError`] on out-of-range limits or unparsable cursors.
pub fn validate_page_request(request: &PageRequest) -> Result<ValidatedPage, PageError> {
    let limit = match request.limit {
        None => DEFAULT_LIMIT,
        Some(value) if value >= 1 && value <= MAX_LIMIT => {
            u32::try_from(value).map_err(|_| PageError::InvalidLimit)?
        }
        Some(_) => return Err(PageError::InvalidLimit),
    };

    let cursor = match &request.cursor {
        None => None,
        Some(raw) => Some(Timestamp::parse(raw).ok_or(PageError::InvalidCursor)?),
    };

    Ok(ValidatedPage { limit, cursor })
}
