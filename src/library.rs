//! Track catalog.
//!
//! The transport resolves queued ids against a [`TrackCatalog`]. The
//! [`Library`] implementation is built either by scanning a directory of
//! audio files or by reading a TOML manifest of remote tracks.

mod catalog;
mod display;
mod manifest;
mod model;
mod scan;

pub use catalog::{CatalogError, Library, TrackCatalog};
pub use display::display_from_fields;
pub use manifest::{load_manifest, parse_manifest};
pub use model::Track;
pub use scan::scan;

#[cfg(test)]
mod tests;
