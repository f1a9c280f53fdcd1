//! Physical placement of logical nodes.
//!
//! Composite nodes are placed by placing their children. Every direct physical
//! insertion runs the inserted node's `attach` callback once, and every direct
//! physical removal runs its `detach` callback once.

use tracing::debug;

use crate::{Error, Node, host::Dom};

/// Inserts `node` into `element` right after `anchor`, or as the first child when there
/// is no anchor. Returns the anchor for the next sibling: the last physical node placed,
/// or `anchor` itself when the subtree is empty.
pub(crate) fn insert_after<D: Dom>(
    document: &D,
    element: &D::Node,
    node: &Node<D>,
    anchor: Option<D::Node>,
) -> Result<Option<D::Node>, Error> {
    let Some(reference) = direct_reference(node)? else {
        let mut anchor = anchor;
        for child in node.children() {
            anchor = insert_after(document, element, &child, anchor)?;
        }
        return Ok(anchor);
    };
    let next = match &anchor {
        Some(anchor) => document.next_sibling(anchor),
        None => document.first_child(element),
    };
    document.insert_before(element, &reference, next.as_ref())?;
    attached(node, &reference);
    Ok(Some(reference))
}

/// Inserts `node` into `container` before `next`, or at the end when `next` is `None`.
pub(crate) fn insert_before<D: Dom>(
    document: &D,
    container: &D::Node,
    node: &Node<D>,
    next: Option<&D::Node>,
) -> Result<(), Error> {
    let Some(reference) = direct_reference(node)? else {
        for child in node.children() {
            insert_before(document, container, &child, next)?;
        }
        return Ok(());
    };
    document.insert_before(container, &reference, next)?;
    attached(node, &reference);
    Ok(())
}

/// Detaches the physical presence of `node` from `element`.
pub(crate) fn remove<D: Dom>(document: &D, element: &D::Node, node: &Node<D>) -> Result<(), Error> {
    let Some(reference) = direct_reference(node)? else {
        for child in node.children() {
            remove(document, element, &child)?;
        }
        return Ok(());
    };
    document.remove_child(element, &reference)?;
    debug!(node = ?node.id(), "detached");
    if let Some(detach) = node.attributes().callback("detach") {
        detach(&reference);
    }
    Ok(())
}

fn direct_reference<D: Dom>(node: &Node<D>) -> Result<Option<D::Node>, Error> {
    if !node.kind().is_physical() {
        return Ok(None);
    }
    node.reference()
        .map(Some)
        .ok_or(Error::Structural("node has not been constructed"))
}

fn attached<D: Dom>(node: &Node<D>, reference: &D::Node) {
    debug!(node = ?node.id(), "attached");
    if let Some(attach) = node.attributes().callback("attach") {
        attach(reference);
    }
}
