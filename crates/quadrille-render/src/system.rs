//! The batch system dispatcher.
//!
//! Tracks which object renderer is current and flushes the previous one
//! exactly when a different kind of primitive needs to render. Consecutive
//! primitives of the same kind therefore share one start/stop cycle, which
//! is the performance invariant the whole batching design rests on.

use std::any::Any;

/// Lifecycle of a renderer managed by [`BatchSystem`].
pub trait ObjectRenderer: Any {
    /// Bind pipeline/buffer state. Called when this renderer becomes current.
    fn start(&mut self) {}

    /// Finalize buffered work. Called when control transfers away.
    fn stop(&mut self) {}

    /// Flush buffered work without giving up the current slot.
    fn flush(&mut self) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Identifier of a renderer registered with a [`BatchSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(usize);

/// Dispatcher over the registered object renderers.
#[derive(Default)]
pub struct BatchSystem {
    renderers: Vec<Box<dyn ObjectRenderer>>,
    current: Option<RendererId>,
}

impl BatchSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer and return its id. No renderer is current until
    /// the first [`set_object_renderer`](Self::set_object_renderer) call.
    pub fn register(&mut self, renderer: Box<dyn ObjectRenderer>) -> RendererId {
        self.renderers.push(renderer);
        RendererId(self.renderers.len() - 1)
    }

    /// Make `id` the current renderer.
    ///
    /// A no-op when it already is: consecutive same-type primitives must not
    /// cause redundant stop/start cycles. Otherwise the previous renderer is
    /// stopped (flushing its batch) before the next one starts.
    pub fn set_object_renderer(&mut self, id: RendererId) {
        if self.current == Some(id) {
            return;
        }
        if let Some(previous) = self.current {
            self.renderers[previous.0].stop();
        }
        self.current = Some(id);
        self.renderers[id.0].start();
    }

    /// Flush the current renderer's buffered work.
    pub fn flush(&mut self) {
        if let Some(current) = self.current {
            self.renderers[current.0].flush();
        }
    }

    /// Stop the current renderer and leave no renderer current.
    ///
    /// Called at the end of a frame so the next frame starts from a clean
    /// pipeline state.
    pub fn reset(&mut self) {
        if let Some(current) = self.current.take() {
            self.renderers[current.0].stop();
        }
    }

    pub fn current(&self) -> Option<RendererId> {
        self.current
    }

    /// Typed access to a registered renderer.
    pub fn renderer_mut<R: ObjectRenderer>(&mut self, id: RendererId) -> Option<&mut R> {
        self.renderers[id.0].as_any_mut().downcast_mut::<R>()
    }
}
