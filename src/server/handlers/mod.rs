pub mod health;
pub mod key;
pub mod manifest;
pub mod playlist;
pub mod segment;

use crate::error::Result;
use crate::server::{state::AppState, url_validation::validate_origin_url};
use url::Url;

/// Run the SSRF check against a client-supplied origin unless the
/// deployment explicitly allows private origins (dev/test setups).
pub(crate) fn check_origin(state: &AppState, url: &Url) -> Result<()> {
    if !state.config.allow_private_origins {
        validate_origin_url(url)?;
    }
    Ok(())
}
