//! URL handling utilities
//!
//! Normalization produces the canonical form used as the dedup key: two
//! URLs that differ only by fragment or trivial formatting map to the same
//! normalized URL and are treated as the same page.

mod normalize;

pub use normalize::normalize_url;
