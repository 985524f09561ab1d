//! Error types for attribute decoding.

/// Errors raised while turning a native-encoded row into a plain map.
///
/// `path` names the offending attribute using dotted map keys and bracketed
/// list indices, e.g. `tags[2]` or `owner.address.zip`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    /// The value is not a single-key tagged attribute the storage layer emits.
    #[error("malformed attribute at `{path}`: {reason}")]
    Malformed { path: String, reason: String },

    /// An `N` (or `NS` member) whose text is not a representable number.
    #[error("invalid number at `{path}`: {value:?}")]
    InvalidNumber { path: String, value: String },
}

impl AttributeError {
    /// Returns the attribute path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Malformed { path, .. } | Self::InvalidNumber { path, .. } => path,
        }
    }
}
