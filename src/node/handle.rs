use alloc::rc::Weak;
use core::{cell::RefCell, fmt};

use serde::{Serialize, de::DeserializeOwned};

use super::{Node, NodeInner};
use crate::{Error, attachment::State, host::Dom, scheduler};

/// Weak handle to a component node, used to change its state from listeners.
///
/// State changes are committed immediately but rendered lazily: the node is queued and
/// re-rendered by the next flush of the auto-renderer.
pub struct Handle<D: Dom> {
    node: Weak<RefCell<NodeInner<D>>>,
}

impl<D: Dom> Handle<D> {
    pub(super) const fn new(node: Weak<RefCell<NodeInner<D>>>) -> Self {
        Self { node }
    }

    /// The node, if it is still alive.
    #[must_use]
    pub fn node(&self) -> Option<Node<D>> {
        self.node.upgrade().map(|inner| Node { inner })
    }

    /// Committed state of the component.
    #[must_use]
    pub fn state(&self) -> Option<State> {
        self.node().and_then(|node| node.state())
    }

    /// Committed state decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNode`] when the node is gone and [`Error::State`] when the
    /// state does not match `T`.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let state = self.state().ok_or(Error::InvalidNode)?;
        Ok(T::deserialize(&state)?)
    }

    /// Commits `state` and queues the node for re-rendering.
    ///
    /// Nothing is queued when the state did not change. When it changed back to the
    /// state the node was last rendered with, the queued re-render is dropped. With
    /// `recycle` set to `false` an already queued entry keeps its baseline and no new
    /// entry is created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNode`] when the node is gone or is not a component.
    pub fn update(&self, state: State, recycle: bool) -> Result<(), Error> {
        let node = self.node().ok_or(Error::InvalidNode)?;
        let prior = node
            .assign_state(state.clone())
            .ok_or(Error::InvalidNode)?;
        scheduler::track(&node, prior, &state, recycle);
        Ok(())
    }

    /// Serializes `value` and commits it as the new state with recycling enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] when `value` cannot be serialized, otherwise see
    /// [`Handle::update`].
    pub fn set<T: Serialize>(&self, value: &T) -> Result<(), Error> {
        self.update(serde_json::to_value(value)?, true)
    }
}

impl<D: Dom> Clone for Handle<D> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<D: Dom> fmt::Debug for Handle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("node", &self.node().map(|node| node.id()))
            .finish()
    }
}
