#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

extern crate alloc;

#[macro_use]
mod macros;
mod attachment;
mod engine;
/// Error type shared by every fallible operation.
pub mod error;
pub mod host;
pub mod logging;
pub mod memory;
pub mod node;
pub mod scheduler;
mod style;
mod value;

#[doc(inline)]
pub use attachment::{
    Child, Component, Context, Fragment, Kind, Source, State, is_component_type,
};
#[doc(inline)]
pub use engine::{create, render};
pub use error::Error;
#[doc(inline)]
pub use node::{Handle, Node, NodeId, Phase, resolve_reference, resolve_trailing_reference};
#[doc(inline)]
pub use scheduler::{RendererSettings, flush, initialize, interval, terminate};
pub use style::{Rule, Rules, Style, StyleSheet};
pub use value::{Attributes, Callback, Listener, Value};
