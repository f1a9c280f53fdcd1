use jsx_dom::{Error, Listener, host::Dom};
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{Document, Element, ElementCreationOptions, Event, Node};

use crate::error::{WebError, js};

/// The browser document, implementing [`Dom`] over `web-sys`.
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    /// Binds to the document of the current window.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::DomUnavailable)?;
        let document = window.document().ok_or(WebError::DomUnavailable)?;
        Ok(Self { document })
    }

    /// Binds to an existing document.
    #[must_use]
    pub const fn from_document(document: Document) -> Self {
        Self { document }
    }

    /// Returns the underlying document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }
}

fn element(node: &Node) -> Result<&Element, Error> {
    node.dyn_ref::<Element>()
        .ok_or_else(|| WebError::NotAnElement.into())
}

impl Dom for WebDocument {
    type Node = Node;
    type Event = Event;
    type Binding = Closure<dyn FnMut(Event)>;

    fn create_element(&self, tag: &str, is: Option<&str>) -> Result<Node, Error> {
        let element = match is {
            Some(is) => {
                let options = ElementCreationOptions::new();
                options.set_is(is);
                self.document
                    .create_element_with_element_creation_options(tag, &options)
            }
            None => self.document.create_element(tag),
        };
        element.map(Into::into).map_err(js)
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<Node, Error> {
        self.document
            .create_element_ns(Some(namespace), tag)
            .map(Into::into)
            .map_err(js)
    }

    fn create_text(&self, content: &str) -> Node {
        self.document.create_text_node(content).into()
    }

    fn set_text(&self, node: &Node, content: &str) {
        node.set_text_content(Some(content));
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), Error> {
        element(node)?.set_attribute(name, value).map_err(js)
    }

    fn remove_attribute(&self, node: &Node, name: &str) -> Result<(), Error> {
        element(node)?.remove_attribute(name).map_err(js)
    }

    fn add_class(&self, node: &Node, token: &str) -> Result<(), Error> {
        element(node)?.class_list().add_1(token).map_err(js)
    }

    fn remove_class(&self, node: &Node, token: &str) -> Result<(), Error> {
        element(node)?.class_list().remove_1(token).map_err(js)
    }

    fn add_listener(
        &self,
        node: &Node,
        event: &str,
        listener: Listener<Self>,
    ) -> Result<Self::Binding, Error> {
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| listener(&event));
        node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(js)?;
        Ok(closure)
    }

    fn remove_listener(&self, node: &Node, event: &str, binding: &Self::Binding) -> Result<(), Error> {
        node.remove_event_listener_with_callback(event, binding.as_ref().unchecked_ref())
            .map_err(js)
    }

    fn insert_before(&self, parent: &Node, child: &Node, reference: Option<&Node>) -> Result<(), Error> {
        parent.insert_before(child, reference).map(drop).map_err(js)
    }

    fn remove_child(&self, parent: &Node, child: &Node) -> Result<(), Error> {
        parent.remove_child(child).map(drop).map_err(js)
    }

    fn first_child(&self, parent: &Node) -> Option<Node> {
        parent.first_child()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }
}
