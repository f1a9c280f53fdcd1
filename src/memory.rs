//! In-memory host used for headless rendering and tests.
//!
//! [`MemoryDocument`] keeps a small node arena that behaves like the subset of the DOM
//! the binding uses, and [`ManualFrames`] is a frame driver whose clock only moves when
//! [`ManualFrames::advance`] is called.

use alloc::{
    boxed::Box,
    collections::BTreeMap,
    format,
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::cell::RefCell;

use crate::{
    Error,
    host::{Dom, FrameDriver, FrameId},
    value::Listener,
};

/// Handle to a node of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

/// Event delivered to listeners by [`MemoryDocument::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    /// Event name, e.g. `click`.
    pub name: String,
    /// Node the event was dispatched on.
    pub target: MemoryNode,
}

/// Token for a listener attached to a [`MemoryDocument`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

#[derive(Debug)]
enum Content {
    Element {
        tag: String,
        namespace: Option<String>,
        is: Option<String>,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

struct Slot {
    content: Content,
    parent: Option<usize>,
    children: Vec<usize>,
    listeners: Vec<(String, ListenerId, Listener<MemoryDocument>)>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    next_listener: u64,
    root: Option<usize>,
}

impl Arena {
    fn slot(&self, node: MemoryNode) -> Result<&Slot, Error> {
        self.slots
            .get(node.0)
            .ok_or_else(|| Error::Dom(format!("unknown node {}", node.0)))
    }

    fn slot_mut(&mut self, node: MemoryNode) -> Result<&mut Slot, Error> {
        self.slots
            .get_mut(node.0)
            .ok_or_else(|| Error::Dom(format!("unknown node {}", node.0)))
    }

    fn attributes_mut(&mut self, node: MemoryNode) -> Result<&mut BTreeMap<String, String>, Error> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { attributes, .. } => Ok(attributes),
            Content::Text(_) => Err(Error::Dom("text nodes have no attributes".into())),
        }
    }

    fn push(&mut self, content: Content) -> MemoryNode {
        self.slots.push(Slot {
            content,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        MemoryNode(self.slots.len() - 1)
    }

    fn detach(&mut self, node: MemoryNode) -> Result<(), Error> {
        if let Some(parent) = self.slot(node)?.parent {
            self.slots[parent].children.retain(|&child| child != node.0);
            self.slots[node.0].parent = None;
        }
        Ok(())
    }
}

/// In-memory document implementing [`Dom`].
///
/// Cloning yields another handle to the same document.
#[derive(Clone, Default)]
pub struct MemoryDocument {
    arena: Rc<RefCell<Arena>>,
}

impl core::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.arena.borrow().slots.len())
            .finish()
    }
}

impl MemoryDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the detached root `<div>` trees are mounted into.
    ///
    /// The root is created on first use; every later call returns the same node.
    #[must_use]
    pub fn container(&self) -> MemoryNode {
        let mut arena = self.arena.borrow_mut();
        if let Some(root) = arena.root {
            return MemoryNode(root);
        }
        let root = arena.push(Content::Element {
            tag: "div".into(),
            namespace: None,
            is: None,
            attributes: BTreeMap::new(),
        });
        arena.root = Some(root.0);
        root
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag(&self, node: MemoryNode) -> Option<String> {
        match &self.arena.borrow().slots.get(node.0)?.content {
            Content::Element { tag, .. } => Some(tag.clone()),
            Content::Text(_) => None,
        }
    }

    /// Namespace an element was created in.
    #[must_use]
    pub fn namespace(&self, node: MemoryNode) -> Option<String> {
        match &self.arena.borrow().slots.get(node.0)?.content {
            Content::Element { namespace, .. } => namespace.clone(),
            Content::Text(_) => None,
        }
    }

    /// Customized built-in name an element was created with.
    #[must_use]
    pub fn is(&self, node: MemoryNode) -> Option<String> {
        match &self.arena.borrow().slots.get(node.0)?.content {
            Content::Element { is, .. } => is.clone(),
            Content::Text(_) => None,
        }
    }

    /// Data of a text node.
    #[must_use]
    pub fn text(&self, node: MemoryNode) -> Option<String> {
        match &self.arena.borrow().slots.get(node.0)?.content {
            Content::Text(text) => Some(text.clone()),
            Content::Element { .. } => None,
        }
    }

    /// Value of an element attribute.
    #[must_use]
    pub fn attribute(&self, node: MemoryNode, name: &str) -> Option<String> {
        match &self.arena.borrow().slots.get(node.0)?.content {
            Content::Element { attributes, .. } => attributes.get(name).cloned(),
            Content::Text(_) => None,
        }
    }

    /// Class list tokens of an element, in order.
    #[must_use]
    pub fn classes(&self, node: MemoryNode) -> Vec<String> {
        self.attribute(node, "class")
            .map(|class| class.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Child nodes, in order.
    #[must_use]
    pub fn children(&self, node: MemoryNode) -> Vec<MemoryNode> {
        self.arena
            .borrow()
            .slots
            .get(node.0)
            .map(|slot| slot.children.iter().copied().map(MemoryNode).collect())
            .unwrap_or_default()
    }

    /// Parent node, if attached.
    #[must_use]
    pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
        self.arena.borrow().slots.get(node.0)?.parent.map(MemoryNode)
    }

    /// Number of listeners attached for `event`.
    #[must_use]
    pub fn listener_count(&self, node: MemoryNode, event: &str) -> usize {
        self.arena.borrow().slots.get(node.0).map_or(0, |slot| {
            slot.listeners
                .iter()
                .filter(|(name, _, _)| name == event)
                .count()
        })
    }

    /// Invokes every listener attached to `node` for `event` and returns how many ran.
    pub fn dispatch(&self, node: MemoryNode, event: &str) -> usize {
        let listeners: Vec<_> = self
            .arena
            .borrow()
            .slots
            .get(node.0)
            .map(|slot| {
                slot.listeners
                    .iter()
                    .filter(|(name, _, _)| name == event)
                    .map(|(_, _, listener)| listener.clone())
                    .collect()
            })
            .unwrap_or_default();
        let payload = MemoryEvent {
            name: event.into(),
            target: node,
        };
        for listener in &listeners {
            listener(&payload);
        }
        listeners.len()
    }

    /// Serializes the children of `node` as HTML-like markup.
    #[must_use]
    pub fn inner_html(&self, node: MemoryNode) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Serializes `node` itself as HTML-like markup.
    #[must_use]
    pub fn outer_html(&self, node: MemoryNode) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: MemoryNode, out: &mut String) {
        let (tag, attributes) = {
            let arena = self.arena.borrow();
            let Some(slot) = arena.slots.get(node.0) else {
                return;
            };
            match &slot.content {
                Content::Text(text) => {
                    out.push_str(text);
                    return;
                }
                Content::Element {
                    tag, attributes, ..
                } => (tag.clone(), attributes.clone()),
            }
        };
        out.push('<');
        out.push_str(&tag);
        for (name, value) in &attributes {
            if value.is_empty() {
                out.push_str(&format!(" {name}"));
            } else {
                out.push_str(&format!(" {name}=\"{value}\""));
            }
        }
        out.push('>');
        for child in self.children(node) {
            self.write_html(child, out);
        }
        out.push_str(&format!("</{tag}>"));
    }
}

impl Dom for MemoryDocument {
    type Node = MemoryNode;
    type Event = MemoryEvent;
    type Binding = ListenerId;

    fn create_element(&self, tag: &str, is: Option<&str>) -> Result<Self::Node, Error> {
        if tag.is_empty() {
            return Err(Error::Dom("tag name must not be empty".into()));
        }
        Ok(self.arena.borrow_mut().push(Content::Element {
            tag: tag.to_ascii_lowercase(),
            namespace: None,
            is: is.map(Into::into),
            attributes: BTreeMap::new(),
        }))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<Self::Node, Error> {
        if tag.is_empty() {
            return Err(Error::Dom("tag name must not be empty".into()));
        }
        Ok(self.arena.borrow_mut().push(Content::Element {
            tag: tag.into(),
            namespace: Some(namespace.into()),
            is: None,
            attributes: BTreeMap::new(),
        }))
    }

    fn create_text(&self, content: &str) -> Self::Node {
        self.arena.borrow_mut().push(Content::Text(content.into()))
    }

    fn set_text(&self, node: &Self::Node, content: &str) {
        if let Some(slot) = self.arena.borrow_mut().slots.get_mut(node.0) {
            if let Content::Text(text) = &mut slot.content {
                *text = content.into();
            }
        }
    }

    fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Error> {
        self.arena
            .borrow_mut()
            .attributes_mut(*element)?
            .insert(name.into(), value.into());
        Ok(())
    }

    fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Error> {
        self.arena.borrow_mut().attributes_mut(*element)?.remove(name);
        Ok(())
    }

    fn add_class(&self, element: &Self::Node, token: &str) -> Result<(), Error> {
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(Error::Dom(format!("invalid class token `{token}`")));
        }
        let mut arena = self.arena.borrow_mut();
        let attributes = arena.attributes_mut(*element)?;
        let class = attributes.entry("class".into()).or_default();
        if !class.split_whitespace().any(|existing| existing == token) {
            if !class.is_empty() {
                class.push(' ');
            }
            class.push_str(token);
        }
        Ok(())
    }

    fn remove_class(&self, element: &Self::Node, token: &str) -> Result<(), Error> {
        let mut arena = self.arena.borrow_mut();
        let attributes = arena.attributes_mut(*element)?;
        if let Some(class) = attributes.get_mut("class") {
            *class = class
                .split_whitespace()
                .filter(|existing| *existing != token)
                .collect::<Vec<_>>()
                .join(" ");
        }
        Ok(())
    }

    fn add_listener(
        &self,
        element: &Self::Node,
        event: &str,
        listener: Listener<Self>,
    ) -> Result<Self::Binding, Error> {
        let mut arena = self.arena.borrow_mut();
        let id = ListenerId(arena.next_listener);
        arena.next_listener += 1;
        arena
            .slot_mut(*element)?
            .listeners
            .push((event.into(), id, listener));
        Ok(id)
    }

    fn remove_listener(
        &self,
        element: &Self::Node,
        event: &str,
        binding: &Self::Binding,
    ) -> Result<(), Error> {
        self.arena
            .borrow_mut()
            .slot_mut(*element)?
            .listeners
            .retain(|(name, id, _)| !(name == event && id == binding));
        Ok(())
    }

    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), Error> {
        let mut arena = self.arena.borrow_mut();
        if matches!(arena.slot(*parent)?.content, Content::Text(_)) {
            return Err(Error::Dom("text nodes cannot have children".into()));
        }
        if reference == Some(child) {
            return Ok(());
        }
        arena.detach(*child)?;
        let position = match reference {
            Some(reference) => arena
                .slot(*parent)?
                .children
                .iter()
                .position(|&existing| existing == reference.0)
                .ok_or_else(|| Error::Dom("reference node is not a child of parent".into()))?,
            None => arena.slot(*parent)?.children.len(),
        };
        arena.slots[parent.0].children.insert(position, child.0);
        arena.slots[child.0].parent = Some(parent.0);
        Ok(())
    }

    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Error> {
        let mut arena = self.arena.borrow_mut();
        if arena.slot(*child)?.parent != Some(parent.0) {
            return Err(Error::Dom("node to remove is not a child of parent".into()));
        }
        arena.detach(*child)
    }

    fn first_child(&self, parent: &Self::Node) -> Option<Self::Node> {
        self.arena
            .borrow()
            .slots
            .get(parent.0)?
            .children
            .first()
            .copied()
            .map(MemoryNode)
    }

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
        let arena = self.arena.borrow();
        let parent = arena.slots.get(node.0)?.parent?;
        let siblings = &arena.slots[parent].children;
        let position = siblings.iter().position(|&sibling| sibling == node.0)?;
        siblings.get(position + 1).copied().map(MemoryNode)
    }
}

#[derive(Default)]
struct FrameQueue {
    now: f64,
    next_id: i32,
    scheduled: Vec<(FrameId, Box<dyn FnOnce()>)>,
}

/// Frame driver with a manually advanced clock.
///
/// Cloning yields another handle to the same queue, so tests can keep one handle while
/// the renderer owns the other.
#[derive(Clone, Default)]
pub struct ManualFrames {
    queue: Rc<RefCell<FrameQueue>>,
}

impl core::fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("ManualFrames")
            .field("now", &queue.now)
            .field("scheduled", &queue.scheduled.len())
            .finish()
    }
}

impl ManualFrames {
    /// Creates a driver whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.queue.borrow().scheduled.len()
    }

    /// Moves the clock forward by `elapsed` milliseconds and runs one frame: every
    /// callback scheduled before this call. Callbacks scheduled while the frame runs
    /// wait for the next one.
    pub fn advance(&self, elapsed: f64) {
        let callbacks = {
            let mut queue = self.queue.borrow_mut();
            queue.now += elapsed;
            core::mem::take(&mut queue.scheduled)
        };
        for (_, callback) in callbacks {
            callback();
        }
    }
}

impl FrameDriver for ManualFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameId, Error> {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let id = FrameId(queue.next_id);
        queue.scheduled.push((id, callback));
        Ok(id)
    }

    fn cancel_frame(&self, id: FrameId) -> Result<(), Error> {
        self.queue
            .borrow_mut()
            .scheduled
            .retain(|(scheduled, _)| *scheduled != id);
        Ok(())
    }

    fn now(&self) -> f64 {
        self.queue.borrow().now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_moves_existing_child() {
        let document = MemoryDocument::new();
        let parent = document.container();
        let a = document.create_text("a");
        let b = document.create_text("b");
        document.append_child(&parent, &a).expect("append a");
        document.append_child(&parent, &b).expect("append b");
        document.insert_before(&parent, &b, Some(&a)).expect("move b");
        assert_eq!(document.inner_html(parent), "ba");
    }

    #[test]
    fn container_is_stable() {
        let document = MemoryDocument::new();
        let root = document.container();
        let text = document.create_text("x");
        document.append_child(&root, &text).expect("append");
        assert_eq!(document.container(), root);
        assert_eq!(document.inner_html(document.container()), "x");
    }

    #[test]
    fn class_list_keeps_tokens_unique() {
        let document = MemoryDocument::new();
        let element = document.create_element("div", None).expect("element");
        document.add_class(&element, "a").expect("add");
        document.add_class(&element, "a").expect("add again");
        document.add_class(&element, "b").expect("add b");
        document.remove_class(&element, "a").expect("remove");
        assert_eq!(document.classes(element), ["b"]);
    }

    #[test]
    fn removing_foreign_child_fails() {
        let document = MemoryDocument::new();
        let parent = document.container();
        let stray = document.create_text("x");
        assert!(document.remove_child(&parent, &stray).is_err());
    }

    #[test]
    fn frames_scheduled_during_a_frame_wait() {
        let frames = ManualFrames::new();
        let inner = frames.clone();
        let ran = Rc::new(RefCell::new(0));
        let counter = ran.clone();
        frames
            .request_frame(Box::new(move || {
                *counter.borrow_mut() += 1;
                inner.request_frame(Box::new(|| {})).expect("reschedule");
            }))
            .expect("schedule");
        frames.advance(16.0);
        assert_eq!(*ran.borrow(), 1);
        assert_eq!(frames.scheduled(), 1);
        assert!((frames.now() - 16.0).abs() < f64::EPSILON);
    }
}
