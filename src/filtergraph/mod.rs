//! # Batch Filter-Graph Compiler
//!
//! Compiles a [`VhsSettings`](crate::settings::VhsSettings) value into an
//! ffmpeg `-vf` chain for whole-clip processing by the external tool. The
//! chain is stateless, so the temporal ghosting effect has no counterpart.

mod compiler;
mod graph;

pub use compiler::{compile, escape_text};
pub use graph::{FilterGraph, FilterStage};
