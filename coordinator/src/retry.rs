use crate::error::CoordinatorError;

/// Re-run `op` while it fails with `Conflict`, up to `max_retries` extra
/// attempts. `op` must re-read whatever state it checks.
pub(crate) fn retry_on_conflict<T>(
    max_retries: u32,
    what: &str,
    mut op: impl FnMut() -> Result<T, CoordinatorError>,
) -> Result<T, CoordinatorError> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(CoordinatorError::Conflict(reason)) if attempt < max_retries => {
                attempt += 1;
                tracing::debug!(what, attempt, %reason, "version conflict, retrying");
            }
            other => return other,
        }
    }
}
