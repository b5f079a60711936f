//! Foundation types for SkyDM.
//!
//! This crate provides the small vocabulary shared by every other SkyDM
//! crate: what kind of file a product is backed by, how two versions of a
//! product are paired up for comparison, and the warnings emitted when a
//! changelog or expansion has to degrade instead of failing.
//!
//! # Key Types
//!
//! - [`FileKind`] — The structural kinds that can be diffed (FITS, catalog)
//! - [`Datatype`] — A product's declared datatype (`fits`, `catalog`, other)
//! - [`VersionPair`] — An ordered (older, newer) version label pair
//! - [`Warning`] — A recoverable condition reported instead of an error
//! - [`WarningSink`] — Where warnings are delivered; injected into engines

pub mod error;
pub mod kind;
pub mod version;
pub mod warning;

pub use error::TypeError;
pub use kind::{Datatype, FileKind};
pub use version::VersionPair;
pub use warning::{RecordingWarnings, TracingWarnings, Warning, WarningSink};
