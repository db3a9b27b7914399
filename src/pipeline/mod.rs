//! # Frame Pipeline Engine
//!
//! Applies the effect library to one frame at a time in a fixed order and
//! carries the previous frame between calls for ghosting.

mod engine;

pub use engine::FramePipeline;
