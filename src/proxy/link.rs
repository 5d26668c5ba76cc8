//! Proxy-link encoding and decoding.
//!
//! A proxy link is a relay-internal URL that carries everything needed
//! to re-resolve an origin resource later: the original URI as it
//! appeared in the manifest (`slug`), the base URL to join it against
//! when it is relative (`base`), an authoritative absoluteness flag
//! (`absolute`), and the header bundle to forward on the next origin
//! fetch (`headers`, JSON).

use crate::error::{RelayError, Result};
use crate::proxy::urls::is_absolute_url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use url::{Url, form_urlencoded};

/// Header name → value mapping forwarded verbatim on every origin hop.
pub type HeaderBundle = HashMap<String, String>;

/// Parse the JSON `headers` query value. Absent or empty means no extra
/// headers are forwarded.
pub fn parse_header_bundle(raw: Option<&str>) -> Result<HeaderBundle> {
    match raw {
        None | Some("") => Ok(HeaderBundle::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| RelayError::MalformedLink(format!("invalid headers payload: {e}"))),
    }
}

/// Convert a bundle into a reqwest [`HeaderMap`] for an outbound fetch.
pub fn header_map(bundle: &HeaderBundle) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(bundle.len());
    for (name, value) in bundle {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RelayError::MalformedLink(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| RelayError::MalformedLink(format!("invalid value for header {name}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Resource classes a proxy link can point at. Alternate media tracks
/// reuse [`LinkKind::SubPlaylist`] — an alternate-audio URI may itself
/// be a nested media playlist, so it must go through playlist
/// resolution, not segment resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    SubPlaylist,
    Segment,
    Key,
}

impl LinkKind {
    pub fn route(self) -> &'static str {
        match self {
            LinkKind::SubPlaylist => "/single",
            LinkKind::Segment => "/ts",
            LinkKind::Key => "/key",
        }
    }
}

/// Build a relay URL for `uri` as found in a manifest fetched from
/// `base`'s document.
///
/// When `uri` is absolute the `base` field is dropped — except for key
/// links, which carry an empty `base=` instead of omitting it. Decoding
/// normalizes both spellings to "absent"; the asymmetry exists only on
/// the wire, for compatibility with clients that learned the original
/// relay's links.
pub fn encode(kind: LinkKind, uri: &str, base: &Url, headers: &HeaderBundle) -> Result<String> {
    let absolute = is_absolute_url(uri);
    let headers_json = serde_json::to_string(headers)
        .map_err(|e| RelayError::Internal(format!("cannot serialize header bundle: {e}")))?;

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("slug", uri);
    if !absolute {
        query.append_pair("base", base.as_str());
    } else if kind == LinkKind::Key {
        query.append_pair("base", "");
    }
    query.append_pair("absolute", if absolute { "true" } else { "false" });
    query.append_pair("headers", &headers_json);

    Ok(format!("{}?{}", kind.route(), query.finish()))
}

/// Raw query parameters of a relay endpoint, straight from the wire.
#[derive(Debug, Deserialize)]
pub struct LinkParams {
    pub slug: String,
    pub base: Option<String>,
    pub absolute: Option<String>,
    pub headers: Option<String>,
}

/// A decoded proxy link, ready to resolve against the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyLink {
    pub slug: String,
    pub base: Option<Url>,
    pub absolute: bool,
    pub headers: HeaderBundle,
}

impl ProxyLink {
    /// Decode wire parameters into a link.
    ///
    /// An empty `base` is treated the same as an absent one. Fails with
    /// [`RelayError::MalformedLink`] when the headers payload is not
    /// valid JSON, the base does not parse, or a relative slug arrives
    /// without any base to resolve it against.
    pub fn from_params(params: LinkParams) -> Result<Self> {
        let absolute = params
            .absolute
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let base = match params.base.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                Url::parse(raw)
                    .map_err(|e| RelayError::MalformedLink(format!("invalid base URL: {e}")))?,
            ),
        };

        if !absolute && base.is_none() {
            return Err(RelayError::MalformedLink(
                "relative slug requires a base URL".into(),
            ));
        }

        let headers = parse_header_bundle(params.headers.as_deref())?;

        Ok(Self {
            slug: params.slug,
            base,
            absolute,
            headers,
        })
    }

    /// Reconstruct the origin URL this link was encoded from.
    pub fn resolve(&self) -> Result<Url> {
        if self.absolute {
            return Url::parse(&self.slug).map_err(|e| {
                RelayError::MalformedLink(format!("absolute slug is not a URL: {e}"))
            });
        }

        // from_params guarantees a base for relative slugs
        let base = self.base.as_ref().ok_or_else(|| {
            RelayError::MalformedLink("relative slug requires a base URL".into())
        })?;
        base.join(&self.slug)
            .map_err(|e| RelayError::MalformedLink(format!("cannot resolve slug: {e}")))
    }

    /// Outbound header map for the next origin fetch.
    pub fn header_map(&self) -> Result<HeaderMap> {
        header_map(&self.headers)
    }
}
