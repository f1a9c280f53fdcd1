//! Logical nodes and their DOM lifecycle.
//!
//! A [`Node`] wraps one logical node of the tree together with everything needed to keep
//! its physical counterpart in sync: the element or text node it owns, the listeners it
//! registered and the style it applied. Nodes go through three phases:
//!
//! ```text
//! Unconstructed --construct--> Constructed --destruct--> Destructed
//! ```
//!
//! Structural operations (`insert`, `remove`) always update the logical tree. They touch
//! the document only when the parent is an element, because composite parents have no
//! physical node of their own.

mod attributes;
mod handle;
mod mount;
mod reference;
#[cfg(test)]
mod tests;

pub use handle::Handle;
pub use reference::{resolve_reference, resolve_trailing_reference};

use alloc::{
    rc::{Rc, Weak},
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::debug;

use crate::{
    Error, Style,
    attachment::{Child, Component, Context, Kind, State},
    host::Dom,
    scheduler,
    value::{Attributes, Value},
};

use attributes::{EventRegistry, synchronize};
use reference::trailing_anchor;

/// Process-unique identifier of a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle phase of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Created, without a physical node yet.
    Unconstructed,
    /// Physical node (or children, for composites) built.
    Constructed,
    /// Torn down. A destructed node can't be rendered again.
    Destructed,
}

enum Body<D: Dom> {
    Element {
        tag: String,
    },
    Text {
        content: String,
    },
    Fragment,
    Component {
        component: Rc<dyn Component<D>>,
        state: State,
        content: Vec<Child<D>>,
    },
}

impl<D: Dom> Body<D> {
    const fn kind(&self) -> Kind {
        match self {
            Self::Element { .. } => Kind::Element,
            Self::Text { .. } => Kind::Text,
            Self::Fragment => Kind::Fragment,
            Self::Component { .. } => Kind::Component,
        }
    }
}

struct NodeInner<D: Dom> {
    id: NodeId,
    document: D,
    body: Body<D>,
    attributes: Attributes<D>,
    children: Vec<Node<D>>,
    parent: Weak<RefCell<NodeInner<D>>>,
    // Physical parent of a root node, set by `render`.
    container: Option<D::Node>,
    reference: Option<D::Node>,
    phase: Phase,
    events: EventRegistry<D>,
    style: Option<Style>,
}

/// Handle to a logical node. Clones share the node.
pub struct Node<D: Dom> {
    inner: Rc<RefCell<NodeInner<D>>>,
}

impl<D: Dom> Clone for Node<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dom> PartialEq for Node<D> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<D: Dom> Eq for Node<D> {}

impl<D: Dom> fmt::Debug for Node<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Node")
            .field("id", &inner.id)
            .field("kind", &inner.body.kind())
            .field("phase", &inner.phase)
            .field("children", &inner.children.len())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Node<D> {
    fn new(document: D, body: Body<D>, attributes: Attributes<D>, children: Vec<Self>) -> Self {
        let node = Self {
            inner: Rc::new(RefCell::new(NodeInner {
                id: NodeId::next(),
                document,
                body,
                attributes,
                children: Vec::new(),
                parent: Weak::new(),
                container: None,
                reference: None,
                phase: Phase::Unconstructed,
                events: EventRegistry::new(),
                style: None,
            })),
        };
        node.adopt(children);
        node
    }

    pub(crate) fn element(
        document: D,
        tag: String,
        attributes: Attributes<D>,
        children: Vec<Self>,
    ) -> Self {
        Self::new(document, Body::Element { tag }, attributes, children)
    }

    pub(crate) fn text(document: D, content: String, attributes: Attributes<D>) -> Self {
        Self::new(document, Body::Text { content }, attributes, Vec::new())
    }

    pub(crate) fn fragment(document: D, attributes: Attributes<D>, children: Vec<Self>) -> Self {
        Self::new(document, Body::Fragment, attributes, children)
    }

    pub(crate) fn component(
        document: D,
        component: Rc<dyn Component<D>>,
        attributes: Attributes<D>,
        content: Vec<Child<D>>,
    ) -> Self {
        let state = component.initial_state(&attributes);
        let body = Body::Component {
            component,
            state,
            content,
        };
        Self::new(document, body, attributes, Vec::new())
    }

    fn adopt(&self, children: Vec<Self>) {
        for child in &children {
            child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        }
        self.inner.borrow_mut().children = children;
    }

    /// Identifier of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.borrow().id
    }

    /// Kind of this node.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.borrow().body.kind()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    /// Returns `true` once constructed and until destructed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Constructed
    }

    /// Physical node owned by this node. Only constructed elements and text nodes have
    /// one.
    #[must_use]
    pub fn reference(&self) -> Option<D::Node> {
        self.inner.borrow().reference.clone()
    }

    /// Document this node materializes into.
    #[must_use]
    pub fn document(&self) -> D {
        self.inner.borrow().document.clone()
    }

    /// Snapshot of the node's attributes.
    #[must_use]
    pub fn attributes(&self) -> Attributes<D> {
        self.inner.borrow().attributes.clone()
    }

    /// Looks up a single attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Value<D>> {
        self.inner.borrow().attributes.get(name).cloned()
    }

    /// Logical children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.inner.borrow().children.clone()
    }

    /// Logical parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.borrow().parent.upgrade().map(|inner| Self { inner })
    }

    /// Style currently applied to the element.
    #[must_use]
    pub fn style(&self) -> Option<Style> {
        self.inner.borrow().style.clone()
    }

    /// Names of the events this element currently listens to.
    #[must_use]
    pub fn listeners(&self) -> Vec<String> {
        self.inner.borrow().events.events()
    }

    /// Committed state of a component node.
    #[must_use]
    pub fn state(&self) -> Option<State> {
        match &self.inner.borrow().body {
            Body::Component { state, .. } => Some(state.clone()),
            _ => None,
        }
    }

    /// Weak handle for changing the state of a component node.
    #[must_use]
    pub fn handle(&self) -> Handle<D> {
        Handle::new(Rc::downgrade(&self.inner))
    }

    /// Returns `true` while a state change of this node waits for the next flush.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        scheduler::is_pending(self.id())
    }

    /// Builds the physical counterpart of this node and of its subtree.
    ///
    /// Elements are created with the namespaced constructor when an `xmlns` attribute is
    /// present, or as a customized built-in when an `is` attribute is present. Children
    /// are constructed and appended in order, then the element's attributes are
    /// synchronized. Components render their children first.
    ///
    /// Constructing a constructed node does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNode`] for a destructed node, and propagates attribute and
    /// document errors. Work done before the failure is kept.
    pub fn construct(&self) -> Result<(), Error> {
        match self.phase() {
            Phase::Constructed => return Ok(()),
            Phase::Destructed => return Err(Error::InvalidNode),
            Phase::Unconstructed => {}
        }
        let document = self.document();
        let reference = self.create_reference(&document)?;
        if self.kind() == Kind::Component {
            let rendered = self.render_component();
            for child in &rendered {
                if let Some(parent) = child.parent() {
                    parent.remove(child)?;
                }
            }
            self.adopt(rendered);
        }
        self.inner.borrow_mut().reference.clone_from(&reference);

        for child in self.children() {
            child.construct()?;
            if let Some(element) = self.element_reference() {
                mount::insert_before(&document, &element, &child, None)?;
            }
        }

        if let Some(element) = self.element_reference() {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            synchronize(
                &inner.document,
                &element,
                &mut inner.events,
                &inner.attributes,
                None,
            )?;
            inner.style = inner.attributes.style().cloned();
        }
        self.inner.borrow_mut().phase = Phase::Constructed;
        debug!(node = ?self.id(), kind = ?self.kind(), "constructed");
        Ok(())
    }

    fn create_reference(&self, document: &D) -> Result<Option<D::Node>, Error> {
        let inner = self.inner.borrow();
        match &inner.body {
            Body::Element { tag } => {
                let element = match inner.attributes.text("xmlns") {
                    Some(namespace) => document.create_element_ns(namespace, tag)?,
                    None => document.create_element(tag, inner.attributes.text("is"))?,
                };
                Ok(Some(element))
            }
            Body::Text { content } => Ok(Some(document.create_text(content))),
            Body::Fragment | Body::Component { .. } => Ok(None),
        }
    }

    fn element_reference(&self) -> Option<D::Node> {
        let inner = self.inner.borrow();
        match inner.body {
            Body::Element { .. } => inner.reference.clone(),
            _ => None,
        }
    }

    /// Inserts `child` right after `previous`, or as the first child when `previous` is
    /// `None`.
    ///
    /// When this node is a constructed element the child is also placed physically,
    /// right after the last physical node of the closest preceding sibling that has one.
    /// Composite children are placed child by child. Every physically inserted node
    /// receives its `attach` callback once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] when `previous` is not a child of this node, when
    /// `child` already has a parent, or when `child` must be placed physically but has
    /// not been constructed. Placing it physically also fails when a preceding sibling
    /// holds elements or text that have no physical node, for example after being
    /// destructed.
    pub fn insert(&self, child: &Self, previous: Option<&Self>) -> Result<(), Error> {
        if child.parent().is_some() {
            return Err(Error::Structural("node already has a parent"));
        }
        let index = match previous {
            Some(previous) => self.position(previous)? + 1,
            None => 0,
        };
        let element = self.element_reference();
        let anchor = match &element {
            Some(_) if !child.is_ready() => {
                return Err(Error::Structural("node has not been constructed"));
            }
            Some(_) => trailing_anchor(&self.children()[..index])?,
            None => None,
        };

        {
            let mut inner = self.inner.borrow_mut();
            inner.children.insert(index, child.clone());
        }
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);

        if let Some(element) = element {
            mount::insert_after(&self.document(), &element, child, anchor)?;
        }
        Ok(())
    }

    /// Removes `child` from this node, detaching its physical presence first when this
    /// node is a constructed element. Every physically removed node receives its
    /// `detach` callback once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] when `child` is not a child of this node.
    pub fn remove(&self, child: &Self) -> Result<(), Error> {
        let index = self.position(child)?;
        if let Some(element) = self.element_reference() {
            mount::remove(&self.document(), &element, child)?;
        }
        self.inner.borrow_mut().children.remove(index);
        child.inner.borrow_mut().parent = Weak::new();
        Ok(())
    }

    fn position(&self, child: &Self) -> Result<usize, Error> {
        self.inner
            .borrow()
            .children
            .iter()
            .position(|current| current == child)
            .ok_or(Error::Structural("node is not a child"))
    }

    /// Tears the node down: removes every registered listener, destructs the children
    /// and clears the ready flag. The physical node is not detached from its parent.
    ///
    /// # Errors
    ///
    /// Propagates document errors raised while removing listeners.
    pub fn destruct(&self) -> Result<(), Error> {
        let (document, reference, bindings) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.document.clone(),
                inner.reference.clone(),
                inner.events.drain(),
            )
        };
        if let Some(element) = &reference {
            for (event, binding) in &bindings {
                document.remove_listener(element, event, binding)?;
            }
        }
        let children = core::mem::take(&mut self.inner.borrow_mut().children);
        for child in &children {
            child.inner.borrow_mut().parent = Weak::new();
            child.destruct()?;
        }
        let mut inner = self.inner.borrow_mut();
        inner.reference = None;
        inner.style = None;
        inner.phase = Phase::Destructed;
        debug!(node = ?inner.id, "destructed");
        Ok(())
    }

    /// Applies a partial attribute map.
    ///
    /// Elements synchronize the partial map, merge it and take the merged `style` as
    /// their current style. Text nodes take a `content` attribute as their new data.
    /// Components merge and re-render. Fragments only merge.
    ///
    /// # Errors
    ///
    /// Propagates attribute and document errors. Entries applied before the failure stay
    /// applied.
    pub fn refresh(&self, attributes: &Attributes<D>) -> Result<(), Error> {
        match self.kind() {
            Kind::Element => {
                if let Some(element) = self.element_reference() {
                    let mut guard = self.inner.borrow_mut();
                    let inner = &mut *guard;
                    synchronize(
                        &inner.document,
                        &element,
                        &mut inner.events,
                        attributes,
                        inner.style.as_ref(),
                    )?;
                }
                let mut inner = self.inner.borrow_mut();
                inner.attributes.merge(attributes);
                if inner.reference.is_some() {
                    inner.style = inner.attributes.style().cloned();
                }
            }
            Kind::Text => {
                let mut guard = self.inner.borrow_mut();
                let inner = &mut *guard;
                inner.attributes.merge(attributes);
                if let Some(content) = attributes.get("content") {
                    let content = content.to_attribute_string().unwrap_or_default();
                    if let Some(text) = &inner.reference {
                        inner.document.set_text(text, &content);
                    }
                    inner.body = Body::Text { content };
                }
            }
            Kind::Fragment => self.inner.borrow_mut().attributes.merge(attributes),
            Kind::Component => {
                self.inner.borrow_mut().attributes.merge(attributes);
                self.rerender()?;
            }
        }
        Ok(())
    }

    /// Re-renders a constructed component from its current attributes and state.
    ///
    /// The previous children are detached and replaced by the rendered ones, which are
    /// placed where the old children were. Children that reappear in the new render are
    /// moved; the others are destructed. Anything but a constructed component is left
    /// alone.
    ///
    /// # Errors
    ///
    /// Propagates construction and document errors.
    pub fn rerender(&self) -> Result<(), Error> {
        if self.kind() != Kind::Component || !self.is_ready() {
            return Ok(());
        }
        let document = self.document();
        let rendered = self.render_component();
        let placement = self.physical_container().map(|container| {
            let next = match resolve_trailing_reference(self) {
                Some(last) => document.next_sibling(&last),
                None => self.following_reference(),
            };
            (container, next)
        });

        let previous = core::mem::take(&mut self.inner.borrow_mut().children);
        for child in &previous {
            if let Some((container, _)) = &placement {
                mount::remove(&document, container, child)?;
            }
            child.inner.borrow_mut().parent = Weak::new();
        }
        for child in previous.iter().filter(|child| !rendered.contains(child)) {
            child.destruct()?;
        }

        for child in &rendered {
            if let Some(parent) = child.parent() {
                parent.remove(child)?;
            }
            child.construct()?;
            child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
            self.inner.borrow_mut().children.push(child.clone());
            if let Some((container, next)) = &placement {
                mount::insert_before(&document, container, child, next.as_ref())?;
            }
        }
        debug!(node = ?self.id(), children = rendered.len(), "re-rendered");
        Ok(())
    }

    fn render_component(&self) -> Vec<Self> {
        let (document, component, context) = {
            let inner = self.inner.borrow();
            let Body::Component {
                component,
                state,
                content,
            } = &inner.body
            else {
                return Vec::new();
            };
            let context = Context::new(
                inner.document.clone(),
                inner.attributes.clone(),
                content.clone(),
                state.clone(),
                self.handle(),
            );
            (inner.document.clone(), component.clone(), context)
        };
        normalize(&document, component.render(&context))
    }

    // Physical node the subtree of this node lives in.
    fn physical_container(&self) -> Option<D::Node> {
        match self.parent() {
            Some(parent) if parent.kind().is_physical() => parent.reference(),
            Some(parent) => parent.physical_container(),
            None => self.inner.borrow().container.clone(),
        }
    }

    // First physical node after this node's subtree, within its physical container.
    fn following_reference(&self) -> Option<D::Node> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings.iter().position(|sibling| sibling == self)?;
        siblings[index + 1..]
            .iter()
            .find_map(resolve_reference)
            .or_else(|| {
                if parent.kind().is_physical() {
                    None
                } else {
                    parent.following_reference()
                }
            })
    }

    pub(crate) fn set_container(&self, container: D::Node) {
        self.inner.borrow_mut().container = Some(container);
    }

    /// Replaces the committed state, returning the prior one. `None` when this is not a
    /// component node.
    fn assign_state(&self, next: State) -> Option<State> {
        match &mut self.inner.borrow_mut().body {
            Body::Component { state, .. } => Some(core::mem::replace(state, next)),
            _ => None,
        }
    }
}

impl<D: Dom> scheduler::Rerender for Node<D> {
    fn rerender(&self) -> Result<(), Error> {
        Self::rerender(self)
    }
}

/// Appends the physical presence of `node` to `container`.
pub(crate) fn append<D: Dom>(document: &D, container: &D::Node, node: &Node<D>) -> Result<(), Error> {
    mount::insert_before(document, container, node, None)
}

/// Turns a child description into nodes: text and styles become text nodes, lists are
/// flattened and empty children disappear.
pub(crate) fn normalize<D: Dom>(document: &D, child: Child<D>) -> Vec<Node<D>> {
    match child {
        Child::Node(node) => vec![node],
        Child::Text(content) => vec![Node::text(document.clone(), content, Attributes::new())],
        Child::Style(style) => vec![Node::text(
            document.clone(),
            style.to_string(),
            Attributes::new(),
        )],
        Child::List(children) => children
            .into_iter()
            .flat_map(|child| normalize(document, child))
            .collect(),
        Child::Empty => Vec::new(),
    }
}
