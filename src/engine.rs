//! Application entry points: node creation and rendering into a container.

use alloc::vec::Vec;

use tracing::debug;

use crate::{
    Error, Node,
    attachment::{Child, Source},
    host::Dom,
    node::{Phase, normalize},
    value::Attributes,
};

/// Creates a node from `source`.
///
/// Children of elements and fragments become child nodes right away. Children of a
/// component are handed to its [`render`](crate::Component::render) through
/// [`Context::children`](crate::Context::children), and its state starts as
/// [`initial_state`](crate::Component::initial_state).
pub fn create<D: Dom>(
    document: &D,
    source: impl Into<Source<D>>,
    attributes: Attributes<D>,
    children: Vec<Child<D>>,
) -> Node<D> {
    let document = document.clone();
    match source.into() {
        Source::Element(tag) => {
            let children = flatten(&document, children);
            Node::element(document, tag, attributes, children)
        }
        Source::Text(content) => Node::text(document, content, attributes),
        Source::Fragment => {
            let children = flatten(&document, children);
            Node::fragment(document, attributes, children)
        }
        Source::Component(component) => Node::component(document, component, attributes, children),
    }
}

fn flatten<D: Dom>(document: &D, children: Vec<Child<D>>) -> Vec<Node<D>> {
    children
        .into_iter()
        .flat_map(|child| normalize(document, child))
        .collect()
}

/// Constructs `node` when needed and appends its physical presence to `container`.
///
/// Composite roots are appended child by child. Attached nodes receive their `attach`
/// callback, and the root remembers `container` so that a root component can re-render
/// in place.
///
/// # Errors
///
/// Returns [`Error::InvalidNode`] when `node` is not a node or has been destructed, and
/// propagates construction and document errors.
pub fn render<D: Dom>(node: impl Into<Child<D>>, container: &D::Node) -> Result<(), Error> {
    let Child::Node(node) = node.into() else {
        return Err(Error::InvalidNode);
    };
    match node.phase() {
        Phase::Destructed => return Err(Error::InvalidNode),
        Phase::Unconstructed => node.construct()?,
        Phase::Constructed => {}
    }
    node.set_container(container.clone());
    crate::node::append(&node.document(), container, &node)?;
    debug!(node = ?node.id(), "rendered");
    Ok(())
}
