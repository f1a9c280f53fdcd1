use jsx_dom::{
    Error,
    host::{FrameDriver, FrameId},
};
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{Performance, Window};

use crate::error::{WebError, js};

/// [`FrameDriver`] backed by `requestAnimationFrame`, timed with `performance.now()`.
#[derive(Debug, Clone)]
pub struct AnimationFrames {
    window: Window,
    performance: Option<Performance>,
}

impl AnimationFrames {
    /// Binds to the current window.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::DomUnavailable)?;
        let performance = window.performance();
        Ok(Self {
            window,
            performance,
        })
    }
}

impl FrameDriver for AnimationFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameId, Error> {
        let closure = Closure::once_into_js(move || callback());
        self.window
            .request_animation_frame(closure.unchecked_ref())
            .map(FrameId)
            .map_err(js)
    }

    fn cancel_frame(&self, id: FrameId) -> Result<(), Error> {
        self.window.cancel_animation_frame(id.0).map_err(js)
    }

    fn now(&self) -> f64 {
        // Without the Performance API the wall clock is the best available.
        self.performance
            .as_ref()
            .map_or_else(js_sys::Date::now, Performance::now)
    }
}
