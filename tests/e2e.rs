//! End-to-end tests for the HLS proxy.
//!
//! Starts a real Axum server on a random port, points it at a wiremock
//! origin, and walks master playlist → media playlist → segment entirely
//! through proxied URLs, the way a player would.

use m3u8_proxy::config::Config;
use m3u8_proxy::server::build_router;
use m3u8_rs::Playlist;
use std::net::SocketAddr;
use url::form_urlencoded;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MASTER: &str = "\
#EXTM3U
#EXT-X-VERSION:6
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English\",DEFAULT=YES,URI=\"audio/en.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=1280000,CODECS=\"avc1.4d401f,mp4a.40.2\",RESOLUTION=1280x720,AUDIO=\"aac\"
720p/index.m3u8
";

const MEDIA: &str = "\
#EXTM3U
#EXT-X-VERSION:7
#EXT-X-TARGETDURATION:4
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-MAP:URI=\"init.mp4\"
#EXTINF:4.0,
seg0.m4s
#EXTINF:4.0,
/seg1.m4s
#EXT-X-ENDLIST
";

const SEGMENT: &[u8] = b"\x00\x00\x00\x18ftypmp42";

// ── Test server helpers ───────────────────────────────────────────────────────

async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();

    let config = Config {
        port: addr.port(),
        host: "127.0.0.1".to_string(),
        ..Config::default()
    };

    let app = build_router(config);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn start_origin() -> MockServer {
    let origin = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MASTER, "application/vnd.apple.mpegurl"))
        .mount(&origin)
        .await;

    Mock::given(method("GET"))
        .and(path("/live/720p/index.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MEDIA, "application/vnd.apple.mpegurl"))
        .mount(&origin)
        .await;

    Mock::given(method("GET"))
        .and(path("/live/720p/seg0.m4s"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEGMENT, "video/mp4"))
        .mount(&origin)
        .await;

    origin
}

fn proxied(target: &str, headers: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("url", target);
    if let Some(headers) = headers {
        query.append_pair("headers", headers);
    }
    format!("/v2?{}", query.finish())
}

/// Lines of `playlist` that are proxied references (segment / variant lines).
fn reference_lines(playlist: &str) -> Vec<&str> {
    playlist
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check() {
    let addr = start_server().await;

    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn master_to_segment_through_proxy() {
    let origin = start_origin().await;
    let addr = start_server().await;
    let client = reqwest::Client::new();

    // Master playlist
    let master_url = format!("{}/live/master.m3u8", origin.uri());
    let resp = client
        .get(format!("http://{}{}", addr, proxied(&master_url, None)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");

    let master = resp.text().await.unwrap();
    assert_eq!(master.split('\n').count(), MASTER.split('\n').count());
    assert!(master.contains("CODECS=\"avc1.4d401f,mp4a.40.2\""));
    assert!(master.contains("DEFAULT=YES"));

    match m3u8_rs::parse_playlist_res(master.as_bytes()) {
        Ok(Playlist::MasterPlaylist(pl)) => {
            assert_eq!(pl.variants.len(), 1);
            assert_eq!(
                pl.variants[0].uri,
                proxied(&format!("{}/live/720p/index.m3u8", origin.uri()), None)
            );
            assert_eq!(pl.alternatives.len(), 1);
            assert_eq!(
                pl.alternatives[0].uri.as_deref(),
                Some(proxied(&format!("{}/live/audio/en.m3u8", origin.uri()), None).as_str())
            );
        }
        other => panic!("Expected master playlist, got {:?}", other),
    }

    // Media playlist, fetched through the rewritten variant URL
    let variant = reference_lines(&master)[0].to_string();
    let resp = client
        .get(format!("http://{}{}", addr, variant))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let media = resp.text().await.unwrap();

    match m3u8_rs::parse_playlist_res(media.as_bytes()) {
        Ok(Playlist::MediaPlaylist(pl)) => {
            assert_eq!(pl.segments.len(), 2);
            let map = pl.segments[0].map.as_ref().expect("EXT-X-MAP kept");
            assert_eq!(
                map.uri,
                proxied(&format!("{}/live/720p/init.mp4", origin.uri()), None)
            );
            // Leading slash resolves next to the playlist, not at the host root.
            assert_eq!(
                pl.segments[1].uri,
                proxied(&format!("{}/live/720p/seg1.m4s", origin.uri()), None)
            );
        }
        other => panic!("Expected media playlist, got {:?}", other),
    }

    // Segment, fetched through the rewritten segment URL
    let segment = reference_lines(&media)[0].to_string();
    let resp = client
        .get(format!("http://{}{}", addr, segment))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "video/mp4");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), SEGMENT);
}

#[tokio::test]
async fn headers_follow_every_hop() {
    let origin = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live/index.m3u8"))
        .and(header("referer", "https://player.example/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "#EXTM3U\n#EXTINF:4.0,\nseg0.ts\n",
            "application/vnd.apple.mpegurl",
        ))
        .mount(&origin)
        .await;

    Mock::given(method("GET"))
        .and(path("/live/seg0.ts"))
        .and(header("referer", "https://player.example/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x47u8; 188], "video/mp2t"))
        .mount(&origin)
        .await;

    let addr = start_server().await;
    let client = reqwest::Client::new();
    let headers = r#"{"Referer":"https://player.example/"}"#;

    let playlist_url = format!("{}/live/index.m3u8", origin.uri());
    let playlist = client
        .get(format!("http://{}{}", addr, proxied(&playlist_url, Some(headers))))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let segment = reference_lines(&playlist)[0].to_string();
    assert!(segment.contains("headers="));

    let resp = client
        .get(format!("http://{}{}", addr, segment))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200, "segment hop carried the Referer header");
    assert_eq!(resp.bytes().await.unwrap().len(), 188);
}

#[tokio::test]
async fn missing_url_over_the_wire() {
    let addr = start_server().await;

    let resp = reqwest::get(format!("http://{}/v2", addr)).await.unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "message": "no scrape url provided" })
    );
}
