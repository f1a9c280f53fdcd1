//! Node sources ("attachments") and the component contract.
//!
//! A node is created from a [`Source`]: an element tag, text, a [`Fragment`] or a
//! [`Component`]. Elements and text own a physical node once constructed; fragments and
//! components are composite and are represented in the document only by their children.

use alloc::{
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use serde::de::DeserializeOwned;

use crate::{
    Error, Node, Style,
    host::Dom,
    node::Handle,
    value::{Attributes, Value},
};

/// Committed component state. Compared by deep value equality.
pub type State = serde_json::Value;

/// Discriminant of a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Owns an element.
    Element,
    /// Owns a text node.
    Text,
    /// Groups children without a physical node.
    Fragment,
    /// Renders children from attributes and state, without a physical node.
    Component,
}

impl Kind {
    /// Returns `true` for kinds that own a physical node.
    #[must_use]
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Element | Self::Text)
    }
}

/// Marker source for fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fragment;

/// What a node is created from.
pub enum Source<D: Dom> {
    /// Element with the given tag name.
    Element(String),
    /// Text node with the given content.
    Text(String),
    /// Fragment.
    Fragment,
    /// Component instance.
    Component(Rc<dyn Component<D>>),
}

impl<D: Dom> Source<D> {
    /// Wraps a component.
    pub fn component(component: impl Component<D>) -> Self {
        Self::Component(Rc::new(component))
    }

    /// Kind of node this source produces.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Element(_) => Kind::Element,
            Self::Text(_) => Kind::Text,
            Self::Fragment => Kind::Fragment,
            Self::Component(_) => Kind::Component,
        }
    }
}

impl<D: Dom> Clone for Source<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Element(tag) => Self::Element(tag.clone()),
            Self::Text(content) => Self::Text(content.clone()),
            Self::Fragment => Self::Fragment,
            Self::Component(component) => Self::Component(component.clone()),
        }
    }
}

impl<D: Dom> fmt::Debug for Source<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(tag) => f.debug_tuple("Element").field(tag).finish(),
            Self::Text(content) => f.debug_tuple("Text").field(content).finish(),
            Self::Fragment => f.write_str("Fragment"),
            Self::Component(_) => f.write_str("Component(..)"),
        }
    }
}

impl<D: Dom> From<&str> for Source<D> {
    fn from(tag: &str) -> Self {
        Self::Element(tag.into())
    }
}

impl<D: Dom> From<String> for Source<D> {
    fn from(tag: String) -> Self {
        Self::Element(tag)
    }
}

impl<D: Dom> From<Fragment> for Source<D> {
    fn from(_: Fragment) -> Self {
        Self::Fragment
    }
}

impl<D: Dom> From<Rc<dyn Component<D>>> for Source<D> {
    fn from(component: Rc<dyn Component<D>>) -> Self {
        Self::Component(component)
    }
}

/// Returns `true` when `source` creates a component node.
#[must_use]
pub const fn is_component_type<D: Dom>(source: &Source<D>) -> bool {
    matches!(source, Source::Component(_))
}

/// Child passed to [`create`](crate::create) or returned from [`Component::render`].
///
/// Text and styles become text nodes, lists are flattened and [`Child::Empty`] is
/// dropped.
#[derive(Debug, Clone)]
pub enum Child<D: Dom> {
    /// An existing node.
    Node(Node<D>),
    /// Text content.
    Text(String),
    /// A style, rendered as its CSS text.
    Style(Style),
    /// Several children in order.
    List(Vec<Child<D>>),
    /// Nothing.
    Empty,
}

impl<D: Dom> From<Node<D>> for Child<D> {
    fn from(node: Node<D>) -> Self {
        Self::Node(node)
    }
}

impl<D: Dom> From<&Node<D>> for Child<D> {
    fn from(node: &Node<D>) -> Self {
        Self::Node(node.clone())
    }
}

impl<D: Dom> From<&str> for Child<D> {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl<D: Dom> From<String> for Child<D> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<D: Dom> From<i32> for Child<D> {
    fn from(value: i32) -> Self {
        Self::Text(value.to_string())
    }
}

impl<D: Dom> From<f64> for Child<D> {
    fn from(value: f64) -> Self {
        Self::Text(value.to_string())
    }
}

impl<D: Dom> From<Style> for Child<D> {
    fn from(style: Style) -> Self {
        Self::Style(style)
    }
}

impl<D: Dom> From<Vec<Self>> for Child<D> {
    fn from(children: Vec<Self>) -> Self {
        Self::List(children)
    }
}

impl<D: Dom> From<()> for Child<D> {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl<D: Dom, T: Into<Self>> From<Option<T>> for Child<D> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// A component renders children from its attributes, passed children and state.
///
/// Implementations hold no mutable state of their own: the committed state lives in
/// the node and is changed through [`Handle::update`], which defers re-rendering to
/// the auto-renderer.
pub trait Component<D: Dom>: 'static {
    /// State the component starts with.
    fn initial_state(&self, attributes: &Attributes<D>) -> State {
        let _ = attributes;
        State::Null
    }

    /// Produces the component's children.
    fn render(&self, context: &Context<D>) -> Child<D>;
}

/// Everything a component can read while rendering.
#[derive(Debug)]
pub struct Context<D: Dom> {
    document: D,
    attributes: Attributes<D>,
    children: Vec<Child<D>>,
    state: State,
    handle: Handle<D>,
}

impl<D: Dom> Context<D> {
    pub(crate) fn new(
        document: D,
        attributes: Attributes<D>,
        children: Vec<Child<D>>,
        state: State,
        handle: Handle<D>,
    ) -> Self {
        Self {
            document,
            attributes,
            children,
            state,
            handle,
        }
    }

    /// Document the component renders into.
    #[must_use]
    pub const fn document(&self) -> &D {
        &self.document
    }

    /// Attributes of the component node.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes<D> {
        &self.attributes
    }

    /// Looks up a single attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value<D>> {
        self.attributes.get(name)
    }

    /// Children passed to the component when it was created.
    #[must_use]
    pub fn children(&self) -> &[Child<D>] {
        &self.children
    }

    /// Committed state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Committed state decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] when the state does not match `T`.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(T::deserialize(&self.state)?)
    }

    /// Handle for changing the state later, typically from an event listener.
    #[must_use]
    pub fn handle(&self) -> Handle<D> {
        self.handle.clone()
    }

    /// Creates a node in the component's document.
    pub fn create(
        &self,
        source: impl Into<Source<D>>,
        attributes: Attributes<D>,
        children: Vec<Child<D>>,
    ) -> Node<D> {
        crate::create(&self.document, source, attributes, children)
    }
}
