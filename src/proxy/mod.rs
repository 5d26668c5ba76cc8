//! Manifest-rewriting core: URI classification, proxy-link encoding,
//! playlist rewriting, and the fetch/classify/flatten orchestration.

pub mod link;
pub mod manifest;
pub mod rewrite;
pub mod urls;
