//! HLS manifest-rewriting relay.
//!
//! Fetches an HLS manifest from an origin, rewrites every URI in it so
//! that sub-playlists, segments, and encryption keys are requested back
//! through the relay, and forwards caller-supplied headers on every
//! origin hop without exposing them to the end client.

pub mod config;
pub mod error;
pub mod http_retry;
pub mod proxy;
pub mod server;
