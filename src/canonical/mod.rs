//! Canonical-id resolution
//!
//! Embedded-marker conventions (`[CID:<id>]` in titles, `Canonical-ID:` body
//! lines) and the resolver that searches the external tracker for an issue
//! already carrying a given canonical identifier.

mod marker;
mod resolver;

pub use marker::{
    body_with_marker, check_match, extract_from_body, extract_from_title, title_with_marker,
    Marker, MarkerLocation,
};
pub use resolver::{CanonicalIdResolver, CanonicalMatch};
