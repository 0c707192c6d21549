//! Result-size limits for list endpoints.

/// Default page size when `limit` is not specified.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Resolve the effective page size, clamped to [1, MAX_PAGE_SIZE].
pub fn effective_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
