use jsx_dom::{Node, RendererSettings};
use serde::{Deserialize, Serialize};
use tracing::info;
use web_sys::Element;

use crate::{dom::WebDocument, error::WebError, frame::AnimationFrames};

const DEFAULT_ROOT_ID: &str = "jsx-dom-root";

/// Builder for [`WebRoot`].
///
/// Deserializable so that the mount options can come from a JSON configuration blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebRootBuilder {
    root_id: Option<String>,
    #[serde(flatten)]
    renderer: RendererSettings,
    auto_render: bool,
}

impl Default for WebRootBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebRootBuilder {
    /// Creates a new builder: a fresh root element appended to `<body>`, auto-rendering
    /// at the default rate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root_id: None,
            renderer: RendererSettings::with_rate(jsx_dom::scheduler::DEFAULT_RATE),
            auto_render: true,
        }
    }

    /// Sets the DOM element identifier that should host the application.
    #[must_use]
    pub fn with_root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    /// Sets the auto-render rate, in renders per second.
    #[must_use]
    pub const fn rate(mut self, rate: u32) -> Self {
        self.renderer = RendererSettings::with_rate(rate);
        self
    }

    /// Controls whether [`build`](Self::build) starts the auto-renderer.
    #[must_use]
    pub const fn auto_render(mut self, enabled: bool) -> Self {
        self.auto_render = enabled;
        self
    }

    /// Locates or creates the mounting element and starts the auto-renderer when
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM is unavailable, the root element cannot be found, or
    /// the auto-renderer refuses to start (invalid rate or already running).
    pub fn build(self) -> Result<WebRoot, WebError> {
        let root = WebRoot::new(self.root_id.as_deref())?;
        if self.auto_render {
            self.renderer.initialize(AnimationFrames::new()?)?;
        }
        Ok(root)
    }
}

/// Mounting point of a node tree in the page.
#[derive(Debug, Clone)]
pub struct WebRoot {
    document: WebDocument,
    element: Element,
}

impl WebRoot {
    fn new(root_id: Option<&str>) -> Result<Self, WebError> {
        let document = WebDocument::new()?;
        let element = if let Some(id) = root_id {
            document
                .document()
                .get_element_by_id(id)
                .ok_or_else(|| WebError::RootNotFound(id.to_string()))?
        } else {
            let body = document.document().body().ok_or(WebError::DomUnavailable)?;
            let host = document.document().create_element("div")?;
            host.set_id(DEFAULT_ROOT_ID);
            body.append_child(&host)?;
            host
        };
        Ok(Self { document, element })
    }

    /// Returns the document nodes are created in.
    #[must_use]
    pub const fn document(&self) -> &WebDocument {
        &self.document
    }

    /// Returns the DOM element representing the mounting point.
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// Clears the mounting element.
    ///
    /// # Errors
    ///
    /// Returns an error if a child cannot be removed.
    pub fn clear(&self) -> Result<(), WebError> {
        while let Some(child) = self.element.first_child() {
            self.element.remove_child(&child)?;
        }
        Ok(())
    }

    /// Renders `node` into the mounting element.
    ///
    /// # Errors
    ///
    /// Propagates construction and rendering errors.
    pub fn mount(&self, node: &Node<WebDocument>) -> Result<(), WebError> {
        let container: &web_sys::Node = self.element.as_ref();
        jsx_dom::render(node, container)?;
        info!(node = ?node.id(), "mounted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = WebRootBuilder::new();
        assert_eq!(builder, WebRootBuilder::default());
        assert!(builder.auto_render);
        assert_eq!(builder.renderer.rate, 30);
        assert_eq!(builder.root_id, None);
    }

    #[test]
    fn builder_from_json() {
        let builder: WebRootBuilder =
            serde_json::from_str(r#"{ "root_id": "app", "rate": 60, "auto_render": false }"#)
                .expect("valid configuration");
        assert_eq!(
            builder,
            WebRootBuilder::new()
                .with_root_id("app")
                .rate(60)
                .auto_render(false)
        );
    }

    #[test]
    fn missing_fields_use_defaults() {
        let builder: WebRootBuilder = serde_json::from_str("{}").expect("empty configuration");
        assert_eq!(builder, WebRootBuilder::new());
    }
}
