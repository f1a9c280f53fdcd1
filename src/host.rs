//! Host environment seams.
//!
//! The binding never talks to a browser directly. Everything it needs from the host is
//! expressed by two traits:
//!
//! - [`Dom`] - the document API: node creation, attributes, class list, event
//!   listeners and child list manipulation.
//! - [`FrameDriver`] - the per-frame callback mechanism plus a monotonic clock, used
//!   by the auto-renderer.
//!
//! [`MemoryDocument`](crate::memory::MemoryDocument) and
//! [`ManualFrames`](crate::memory::ManualFrames) implement both in memory; the
//! `jsx-dom-web` crate implements them on top of `web-sys`.

use alloc::boxed::Box;
use core::fmt::Debug;

use crate::{Error, value::Listener};

/// Document API required to materialize logical nodes.
///
/// Implementations are cheap handles; the binding clones them into every node it
/// creates.
pub trait Dom: Clone + Debug + 'static {
    /// Physical node handle (element or text).
    type Node: Clone + PartialEq + Debug + 'static;
    /// Event object passed to listeners.
    type Event: 'static;
    /// Host-side token for an attached listener, needed to detach it again.
    type Binding: 'static;

    /// Creates an element, optionally as a customized built-in element (`is`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host rejects the tag name.
    fn create_element(&self, tag: &str, is: Option<&str>) -> Result<Self::Node, Error>;

    /// Creates an element inside the given XML namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host rejects the namespace or tag name.
    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<Self::Node, Error>;

    /// Creates a text node.
    fn create_text(&self, content: &str) -> Self::Node;

    /// Replaces the data of a text node.
    fn set_text(&self, node: &Self::Node, content: &str);

    /// Sets an attribute on an element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `element` is not an element or the name is invalid.
    fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Error>;

    /// Removes an attribute from an element. Removing a missing attribute is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `element` is not an element.
    fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Error>;

    /// Adds a token to the element's class list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `element` is not an element or the token is invalid.
    fn add_class(&self, element: &Self::Node, token: &str) -> Result<(), Error>;

    /// Removes a token from the element's class list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `element` is not an element or the token is invalid.
    fn remove_class(&self, element: &Self::Node, token: &str) -> Result<(), Error>;

    /// Attaches a listener and returns the token needed to detach it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host rejects the listener.
    fn add_listener(
        &self,
        element: &Self::Node,
        event: &str,
        listener: Listener<Self>,
    ) -> Result<Self::Binding, Error>;

    /// Detaches a listener. Detaching a listener that is no longer attached is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host rejects the call.
    fn remove_listener(
        &self,
        element: &Self::Node,
        event: &str,
        binding: &Self::Binding,
    ) -> Result<(), Error>;

    /// Inserts `child` into `parent` before `reference`, or at the end when `reference`
    /// is `None`. A child that already has a parent is moved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `reference` is not a child of `parent`.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), Error>;

    /// Removes `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when `child` is not a child of `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Error>;

    /// Returns the first child of `parent`.
    fn first_child(&self, parent: &Self::Node) -> Option<Self::Node>;

    /// Returns the sibling that follows `node`.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Dom::insert_before`].
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Error> {
        self.insert_before(parent, child, None)
    }
}

/// Identifier of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub i32);

/// Per-frame callback scheduling and the clock used to rate-limit rendering.
pub trait FrameDriver: 'static {
    /// Schedules `callback` for the next frame. The callback must never run
    /// synchronously from inside this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host cannot schedule frames.
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameId, Error>;

    /// Cancels a scheduled callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when the host rejects the cancellation.
    fn cancel_frame(&self, id: FrameId) -> Result<(), Error>;

    /// Monotonic timestamp in milliseconds.
    fn now(&self) -> f64;
}
