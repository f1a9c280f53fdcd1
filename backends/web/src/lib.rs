#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Browser backend for `jsx-dom`.
//!
//! [`WebDocument`] implements the binding's document seam over `web-sys`, and
//! [`AnimationFrames`] drives the auto-renderer with `requestAnimationFrame`. A
//! [`WebRootBuilder`] locates (or creates) the mounting element and starts the
//! auto-renderer:
//!
//! ```no_run
//! use jsx_dom::{Attributes, children, create};
//! use jsx_dom_web::WebRootBuilder;
//!
//! # fn main() -> Result<(), jsx_dom_web::WebError> {
//! jsx_dom_web::logging::install();
//! let root = WebRootBuilder::new().with_root_id("app").rate(60).build()?;
//! let hello = create(root.document(), "h1", Attributes::new(), children!["Hello"]);
//! root.mount(&hello)?;
//! # Ok(())
//! # }
//! ```

mod app;
mod dom;
mod error;
mod frame;
pub mod logging;

pub use app::{WebRoot, WebRootBuilder};
pub use dom::WebDocument;
pub use error::WebError;
pub use frame::AnimationFrames;
