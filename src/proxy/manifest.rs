//! Manifest orchestration: fetch an origin manifest, classify it,
//! flatten degenerate single-variant masters, rewrite it, and hand back
//! the serialized text.

use crate::error::{RelayError, Result};
use crate::http_retry::{RetryConfig, fetch_with_retry};
use crate::proxy::link::{HeaderBundle, header_map};
use crate::proxy::rewrite::{rewrite_master, rewrite_media};
use crate::proxy::urls::base_of;
use m3u8_rs::Playlist;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Fetch `origin_url`, rewrite every URI in the manifest it serves, and
/// return the rewritten text.
///
/// Classification rules:
/// - A master with two or more variants keeps its shape; only its
///   variant and alternate-media URIs are rewritten. Segments are
///   rewritten lazily when the client follows a sub-playlist link.
/// - A master with exactly one variant only pretends to be adaptive:
///   the sole child playlist is fetched and rewritten directly, and the
///   intermediate master is discarded. This flattening happens at most
///   once — a child that turns out to be another master is rewritten as
///   a master rather than unwrapped again.
/// - A media playlist has its segments and keys rewritten directly.
///
/// # Errors
///
/// [`RelayError::OriginUnreachable`] when the retry budget runs out,
/// [`RelayError::ParseError`] when a fetched body is not valid HLS.
pub async fn build_manifest(
    client: &Client,
    retry: &RetryConfig,
    origin_url: &Url,
    headers: &HeaderBundle,
) -> Result<String> {
    let outbound = header_map(headers)?;

    let response = fetch_with_retry(client, origin_url, &outbound, retry).await?;
    let final_url = response.url().clone();
    let body = response.text().await?;

    let base = base_of(&final_url)?;
    debug!("Fetched manifest from {} (base {})", final_url, base);

    match parse(&body)? {
        Playlist::MasterPlaylist(mut master) if master.variants.len() == 1 => {
            // Degenerate single-rendition master: serve its only child
            // directly, skipping a client-visible indirection.
            let child_url = base.join(&master.variants[0].uri).map_err(|e| {
                RelayError::ParseError(format!("unresolvable variant URI: {e}"))
            })?;
            info!("Flattening single-variant master into {}", child_url);

            let child_response = fetch_with_retry(client, &child_url, &outbound, retry).await?;
            let child_final_url = child_response.url().clone();
            let child_body = child_response.text().await?;
            let child_base = base_of(&child_final_url)?;

            match parse(&child_body)? {
                Playlist::MediaPlaylist(mut media) => {
                    rewrite_media(&mut media, &child_base, headers)?;
                    serialize(Playlist::MediaPlaylist(media))
                }
                // One flattening hop only: a nested master is rewritten
                // as a master, never unwrapped further.
                Playlist::MasterPlaylist(mut nested) => {
                    rewrite_master(&mut nested, &child_base, headers)?;
                    serialize(Playlist::MasterPlaylist(nested))
                }
            }
        }

        Playlist::MasterPlaylist(mut master) => {
            rewrite_master(&mut master, &base, headers)?;
            serialize(Playlist::MasterPlaylist(master))
        }

        Playlist::MediaPlaylist(mut media) => {
            rewrite_media(&mut media, &base, headers)?;
            serialize(Playlist::MediaPlaylist(media))
        }
    }
}

fn parse(body: &str) -> Result<Playlist> {
    m3u8_rs::parse_playlist_res(body.as_bytes())
        .map_err(|e| RelayError::ParseError(format!("{e:?}")))
}

fn serialize(playlist: Playlist) -> Result<String> {
    let mut out = Vec::new();
    playlist
        .write_to(&mut out)
        .map_err(|e| RelayError::Internal(format!("failed to write playlist: {e}")))?;
    String::from_utf8(out)
        .map_err(|e| RelayError::Internal(format!("playlist is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MASTER_TWO: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000\n\
low/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2500000\n\
high/index.m3u8\n";

    const MASTER_ONE: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000\n\
low/index.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXTINF:10.0,\n\
1.ts\n\
#EXTINF:10.0,\n\
2.ts\n\
#EXT-X-ENDLIST\n";

    fn retry() -> RetryConfig {
        RetryConfig {
            backoff: Duration::from_millis(1),
            ..Default::default()
        }
    }

    async fn mount(server: &MockServer, at: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "application/vnd.apple.mpegurl"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn media_playlist_segments_are_rewritten() {
        let server = MockServer::start().await;
        mount(&server, "/live/index.m3u8", MEDIA).await;

        let url = Url::parse(&format!("{}/live/index.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap();

        let Playlist::MediaPlaylist(media) =
            m3u8_rs::parse_playlist_res(out.as_bytes()).unwrap()
        else {
            panic!("expected a media playlist");
        };
        assert_eq!(media.segments.len(), 2);
        assert!(media.segments.iter().all(|s| s.uri.starts_with("/ts?")));
    }

    #[tokio::test]
    async fn two_variant_master_keeps_its_shape() {
        let server = MockServer::start().await;
        mount(&server, "/live/master.m3u8", MASTER_TWO).await;

        let url = Url::parse(&format!("{}/live/master.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap();

        let Playlist::MasterPlaylist(master) =
            m3u8_rs::parse_playlist_res(out.as_bytes()).unwrap()
        else {
            panic!("expected a master playlist");
        };
        assert_eq!(master.variants.len(), 2);
        assert!(master.variants.iter().all(|v| v.uri.starts_with("/single?")));
        assert!(!out.contains("/ts?"), "no segment rewriting at this stage");
    }

    #[tokio::test]
    async fn single_variant_master_is_flattened() {
        let server = MockServer::start().await;
        mount(&server, "/live/master.m3u8", MASTER_ONE).await;
        mount(&server, "/live/low/index.m3u8", MEDIA).await;

        let url = Url::parse(&format!("{}/live/master.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap();

        let Playlist::MediaPlaylist(media) =
            m3u8_rs::parse_playlist_res(out.as_bytes()).unwrap()
        else {
            panic!("flattened output must be a media playlist");
        };
        assert_eq!(media.segments.len(), 2);
        assert!(media.segments.iter().all(|s| s.uri.starts_with("/ts?")));
        assert!(!out.contains("EXT-X-STREAM-INF"), "master is discarded");
    }

    #[tokio::test]
    async fn flattened_segments_resolve_against_child_base() {
        let server = MockServer::start().await;
        mount(&server, "/live/master.m3u8", MASTER_ONE).await;
        mount(&server, "/live/low/index.m3u8", MEDIA).await;

        let url = Url::parse(&format!("{}/live/master.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap();

        // Relative segments are based on the child playlist's directory
        assert!(
            out.contains("%2Flive%2Flow%2F"),
            "expected child base in links, got:\n{out}"
        );
    }

    #[tokio::test]
    async fn nested_master_is_not_unwrapped_twice() {
        let server = MockServer::start().await;
        mount(&server, "/live/master.m3u8", MASTER_ONE).await;
        // The sole variant points at another master
        Mock::given(method("GET"))
            .and(path("/live/low/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MASTER_TWO))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/live/master.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap();

        let Playlist::MasterPlaylist(master) =
            m3u8_rs::parse_playlist_res(out.as_bytes()).unwrap()
        else {
            panic!("one flattening hop only — nested master stays a master");
        };
        assert_eq!(master.variants.len(), 2);
        assert!(master.variants.iter().all(|v| v.uri.starts_with("/single?")));
    }

    #[tokio::test]
    async fn manifest_fetch_retries_transient_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(MEDIA),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/index.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new()).await;
        assert!(out.is_ok(), "manifest fetch should absorb transient errors");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_origin_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/index.m3u8", server.uri())).unwrap();
        let err = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::OriginUnreachable(_)));
    }

    #[tokio::test]
    async fn non_hls_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not hls</html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/index.m3u8", server.uri())).unwrap();
        let err = build_manifest(&Client::new(), &retry(), &url, &HeaderBundle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ParseError(_)));
    }

    #[tokio::test]
    async fn headers_are_forwarded_to_both_fetches_when_flattening() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/live/master.m3u8"))
            .and(wiremock::matchers::header("x-stream-token", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MASTER_ONE))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/live/low/index.m3u8"))
            .and(wiremock::matchers::header("x-stream-token", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MEDIA))
            .expect(1)
            .mount(&server)
            .await;

        let headers =
            HeaderBundle::from([("x-stream-token".to_string(), "s3cr3t".to_string())]);
        let url = Url::parse(&format!("{}/live/master.m3u8", server.uri())).unwrap();
        let out = build_manifest(&Client::new(), &retry(), &url, &headers).await;
        assert!(out.is_ok(), "both hops must carry the header bundle");
    }
}
