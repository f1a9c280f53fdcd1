use crate::{Error, Node, host::Dom};

/// Returns the first physical node of `node`'s subtree.
///
/// Elements and text answer with their own reference. Fragments and components have
/// none, so their children are searched in order, skipping subtrees without physical
/// nodes. `None` means the whole subtree is physically empty.
#[must_use]
pub fn resolve_reference<D: Dom>(node: &Node<D>) -> Option<D::Node> {
    if node.kind().is_physical() {
        return node.reference();
    }
    node.children().iter().find_map(resolve_reference)
}

/// Returns the last physical node of `node`'s subtree, the anchor after which a
/// following sibling is inserted.
#[must_use]
pub fn resolve_trailing_reference<D: Dom>(node: &Node<D>) -> Option<D::Node> {
    if node.kind().is_physical() {
        return node.reference();
    }
    node.children()
        .iter()
        .rev()
        .find_map(resolve_trailing_reference)
}

/// Finds the node a sibling inserted after `siblings` goes behind: the trailing
/// reference of the last sibling that has physical nodes.
///
/// Physically empty subtrees are skipped. An element or text node without a reference
/// cannot be skipped, since the insertion point would silently move before it.
pub(crate) fn trailing_anchor<D: Dom>(siblings: &[Node<D>]) -> Result<Option<D::Node>, Error> {
    for sibling in siblings.iter().rev() {
        if sibling.kind().is_physical() {
            return sibling
                .reference()
                .map(Some)
                .ok_or(Error::Structural("sibling has no physical reference"));
        }
        if let Some(anchor) = trailing_anchor(&sibling.children())? {
            return Ok(Some(anchor));
        }
    }
    Ok(None)
}
