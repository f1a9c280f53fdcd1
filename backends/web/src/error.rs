use core::fmt;

use wasm_bindgen::JsValue;

/// Error type produced by the web backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    DomUnavailable,
    /// The requested mounting node cannot be located.
    RootNotFound(String),
    /// An element operation was attempted on a node that is not an element.
    NotAnElement,
    /// Wrapper around JavaScript exceptions.
    Js(String),
    /// The binding rejected an operation.
    Render(jsx_dom::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomUnavailable => write!(f, "DOM is not available"),
            Self::RootNotFound(id) => write!(f, "Failed to find DOM element with id `{id}`"),
            Self::NotAnElement => write!(f, "node is not an element"),
            Self::Js(msg) => write!(f, "JavaScript error: {msg}"),
            Self::Render(error) => write!(f, "render error: {error}"),
        }
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(error) => Some(error),
            _ => None,
        }
    }
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

impl From<jsx_dom::Error> for WebError {
    fn from(value: jsx_dom::Error) -> Self {
        Self::Render(value)
    }
}

impl From<WebError> for jsx_dom::Error {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Render(error) => error,
            other => Self::Dom(other.to_string()),
        }
    }
}

impl From<WebError> for JsValue {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Js(msg) => Self::from(msg),
            other => Self::from(other.to_string()),
        }
    }
}

/// Converts a JavaScript exception into a binding error.
pub(crate) fn js(value: JsValue) -> jsx_dom::Error {
    WebError::from(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_errors_round_trip() {
        let error = WebError::from(jsx_dom::Error::InvalidNode);
        assert_eq!(jsx_dom::Error::from(error), jsx_dom::Error::InvalidNode);
    }

    #[test]
    fn host_errors_become_dom_errors() {
        let error = jsx_dom::Error::from(WebError::RootNotFound("app".into()));
        assert_eq!(
            error,
            jsx_dom::Error::Dom("Failed to find DOM element with id `app`".into())
        );
    }
}
