//! Playlist rewriting: replace every URI in a parsed manifest with a
//! relay link. Pure transformation — no network I/O, and the structure
//! of the document (entry counts, tags, ordering) is never touched.

use crate::error::Result;
use crate::proxy::link::{HeaderBundle, LinkKind, encode};
use m3u8_rs::{MasterPlaylist, MediaPlaylist};
use url::Url;

/// Rewrite a master playlist in place.
///
/// Variant URIs become sub-playlist links. Alternate media (audio,
/// subtitles) with a URI also become sub-playlist links, since an
/// alternate rendition may itself be a nested media playlist.
pub fn rewrite_master(
    master: &mut MasterPlaylist,
    base: &Url,
    headers: &HeaderBundle,
) -> Result<()> {
    for variant in &mut master.variants {
        variant.uri = encode(LinkKind::SubPlaylist, &variant.uri, base, headers)?;
    }

    for media in &mut master.alternatives {
        if let Some(uri) = &media.uri {
            media.uri = Some(encode(LinkKind::SubPlaylist, uri, base, headers)?);
        }
    }

    Ok(())
}

/// Rewrite a media playlist in place.
///
/// Segment URIs become segment links; segment decryption keys with a
/// URI become key links.
pub fn rewrite_media(media: &mut MediaPlaylist, base: &Url, headers: &HeaderBundle) -> Result<()> {
    for segment in &mut media.segments {
        segment.uri = encode(LinkKind::Segment, &segment.uri, base, headers)?;

        if let Some(key) = &mut segment.key
            && let Some(uri) = &key.uri
        {
            key.uri = Some(encode(LinkKind::Key, uri, base, headers)?);
        }
    }

    Ok(())
}
