//! File-format backend for SkyDM.
//!
//! Products are backed by FITS files or row/column catalogs. Diffing only
//! needs their structure, never their pixel or row payload, so this crate
//! reads exactly that: the header/data unit layout and headers of a FITS
//! file, and the column names and row count of a catalog.
//!
//! # Backends
//!
//! All backends implement the [`FormatBackend`] trait:
//!
//! - [`DiskBackend`] -- reads files from the local filesystem
//! - [`InMemoryBackend`] -- serves pre-built structures for tests and embedding
//!
//! # Writing
//!
//! [`FitsBuilder`] writes minimal, standard-conforming FITS files (headers
//! plus zero-filled data), which is enough to produce fixtures whose
//! structure differs in controlled ways.

pub mod backend;
pub mod catalog;
pub mod error;
pub mod fits;
pub mod header;
pub mod memory;
pub mod structure;

pub use backend::{DiskBackend, FormatBackend};
pub use error::{FormatError, FormatResult};
pub use fits::FitsBuilder;
pub use header::{Card, Header, HeaderValue};
pub use memory::InMemoryBackend;
pub use structure::{CatalogStructure, FileStructure, FitsStructure, Section, SectionKind};
