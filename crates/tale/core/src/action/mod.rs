//! Core action contract.
//!
//! This module defines the [`Action`] trait implemented by every unit of
//! narrative work, and the [`Task`] handle that containers store. Actions are
//! polled once per frame through [`Action::run`] with a [`Frame`] giving access
//! to time, triggers and staged admission.

mod error;
mod frame;
mod id;
mod status;
mod task;

use std::any::{Any, type_name};
use std::fmt;

pub use error::{ActionError, ActionResult};
pub use frame::{Frame, TimeStep};
pub use id::ActionId;
pub use status::ExecutionState;
pub use task::Task;

pub(crate) use frame::FrameContext;
pub(crate) use id::IdAllocator;

/// A pollable unit of work with a `NotStarted → Running → Done` lifecycle.
///
/// Implementors only decide whether they are finished; the owning [`Task`]
/// tracks state and identity.
pub trait Action: Any {
    /// Advance this action by one frame.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` on the frame the action completes
    /// - `Ok(false)` to be polled again next frame
    /// - `Err(_)` to abort the current scheduler pass
    fn run(&mut self, frame: &mut Frame<'_>) -> ActionResult;

    /// Called once when the action is completed out of band.
    ///
    /// Children are interrupted by the owning task right after this hook.
    fn on_interrupt(&mut self, _frame: &mut Frame<'_>) {}

    /// Visits owned children, if any.
    fn visit_subactions<'a>(&'a self, _visit: &mut dyn FnMut(&'a Task)) {}

    /// Visits owned children mutably, if any.
    fn visit_subactions_mut(&mut self, _visit: &mut dyn FnMut(&mut Task)) {}

    /// Drops what the finished action still holds before its allocation is
    /// pooled: children, callbacks and captured handles.
    ///
    /// Implementors keep buffers whose capacity is worth reusing and release
    /// their contents.
    fn recycle(&mut self) {}

    /// Human-readable description used by logs and the debug overlay.
    fn describe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(short_type_name(type_name::<Self>()))
    }
}

/// `tale_core::leaf::Wait` → `Wait`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
