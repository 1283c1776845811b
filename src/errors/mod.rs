use core::fmt;
use std::error::Error;
use std::fmt::Display;

/// Error produced by the coordination layer. Nothing in this crate treats it as fatal:
/// callers log it and keep their worker running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationError {
    text: String,
    cause: String,
}

pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Creates an error result with the message and the optional cause (empty string for none).
pub fn new_err<T>(text: String, cause: String) -> Result<T> {
    Err(CoordinationError { text, cause })
}

impl CoordinationError {
    /// Short error description.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for CoordinationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cause_word = {
            if !self.cause.is_empty() {
                " Cause: ".to_string()
            } else {
                String::new()
            }
        };
        write!(f, "{}.{}{}", self.text, cause_word, self.cause)
    }
}

impl Error for CoordinationError {}
