//! Planner boundary.
//!
//! Blocks are produced elsewhere; this module only defines their shape and
//! the queue contract the engine consumes them through.

mod block;
mod queue;

pub use block::{Axis, Block, DeferredAction, AXES};
pub use queue::{BlockBuffer, BlockQueue};
