//! Error reporting helpers
//!
//! Provider errors fall into two groups: usage errors the caller can fix
//! (unknown names, subscription misuse) and system errors (poisoned locks,
//! store failures). [`ContextualError`] lets reporting code tell them apart.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<String>;
}

/// Log an error with a detail level that depends on its kind
///
/// User-actionable errors are logged with their own message; system errors
/// log the operation context, with the error itself at debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("{}: {}", operation_context, user_msg);
        }
        _ => {
            log::error!("{} failed", operation_context);
        }
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
