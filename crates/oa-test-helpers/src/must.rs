//! Unwrap helpers with good error messages.
//!
//! These replace `expect()` in test code and report the caller's location
//! through `#[track_caller]`.

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// ```rust
/// use oa_test_helpers::must_some;
///
/// assert_eq!(must_some(Some(7), "context id"), 7);
/// ```
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}
