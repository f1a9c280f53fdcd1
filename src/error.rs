use alloc::string::String;

/// Error type shared by every operation of the DOM binding.
///
/// All errors are raised synchronously at the point of detection and are never
/// swallowed or retried internally. A failed operation leaves the document in whatever
/// state it reached before the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An attribute value has the wrong shape for its name, e.g. a non-callable
    /// value for an `on*` event attribute or a non-[`Style`](crate::Style) value for
    /// `style`.
    #[error("attribute `{name}` supports only {expected}")]
    InvalidAttribute {
        /// Event or attribute name the value was given for.
        name: String,
        /// What the attribute accepts.
        expected: &'static str,
    },
    /// The logical tree cannot be mapped to a physical position.
    #[error("inconsistent node tree: {0}")]
    Structural(&'static str),
    /// `render` was given something that is not a live node.
    #[error("node instance isn't valid")]
    InvalidNode,
    /// The auto-render rate is outside of the supported range.
    #[error("render rate {0} must be between 20 and 100")]
    InvalidRate(u32),
    /// The auto-renderer is already running.
    #[error("renderer is already initialized")]
    AlreadyInitialized,
    /// The auto-renderer is not running.
    #[error("there's no initialized renderer")]
    NotInitialized,
    /// A style selector was registered twice.
    #[error("nested selector `{0}` already exists")]
    DuplicateSelector(String),
    /// Component state could not be converted to or from its JSON form.
    #[error("invalid component state: {0}")]
    State(String),
    /// The host document rejected an operation.
    #[error("DOM operation failed: {0}")]
    Dom(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::State(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_the_offending_event() {
        let error = Error::InvalidAttribute {
            name: "click".into(),
            expected: "functions",
        };
        assert_eq!(error.to_string(), "attribute `click` supports only functions");
    }

    #[test]
    fn rate_error_mentions_bounds() {
        assert_eq!(
            Error::InvalidRate(101).to_string(),
            "render rate 101 must be between 20 and 100"
        );
    }
}
