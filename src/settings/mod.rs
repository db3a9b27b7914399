//! # Settings Model
//!
//! The fixed set of range-bounded degradation parameters, the four built-in
//! presets, partial overrides, and the canonical mapping from settings to
//! effect parameters.
//!
//! ```rust,no_run
//! use vhs_pipeline::settings::{merge_overrides, resolve_preset, SettingsOverride};
//!
//! let base = resolve_preset("worn").unwrap();
//! let tweaked = merge_overrides(&base, &SettingsOverride {
//!     noise: Some(10.0),
//!     ..SettingsOverride::default()
//! });
//! ```

pub mod mapping;
pub mod model;
pub mod presets;

pub use mapping::{ColorParams, EffectParams, TrackingParams};
pub use model::{merge_overrides, SettingsOverride, VhsSettings};
pub use presets::{resolve_preset, Preset};
