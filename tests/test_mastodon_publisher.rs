use instadon::error::CrossPostError;
use instadon::models::media::MediaKind;
use instadon::models::types::MediaId;
use instadon::models::visibility::Visibility;
use instadon::publishers::{MastodonPublisher, StatusApi, publish_thread};
use instadon::traits::publisher::NewStatus;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publisher(server: &MockServer) -> MastodonPublisher {
    MastodonPublisher::builder()
        .client(reqwest::Client::new())
        .base_url(format!("{}/", server.uri()))
        .access_token("tok")
        .build()
}

#[tokio::test]
async fn test_upload_sends_multipart_with_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/media"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": "109", "type": "video"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    std::fs::write(file.path(), b"video-bytes").unwrap();

    let id = publisher(&server)
        .upload_media(file.path(), MediaKind::Video, "Sommerfest im Hof")
        .await
        .unwrap();
    assert_eq!(id.as_str(), "109");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"description\""));
    assert!(body.contains("Sommerfest im Hof"));
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("Content-Type: video/mp4") || body.contains("content-type: video/mp4"));
    assert!(body.contains("video-bytes"));
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_upload_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/media"))
        .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"error":"File type not supported"}"#))
        .mount(&server)
        .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    let err = publisher(&server)
        .upload_media(file.path(), MediaKind::Image, "x")
        .await
        .unwrap_err();
    match err {
        CrossPostError::Upload { status, body } => {
            assert_eq!(status.as_u16(), 422);
            assert!(body.contains("File type not supported"));
        }
        other => panic!("expected upload error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .and(body_json(json!({
            "status": "(2/2)",
            "media_ids": ["m5"],
            "visibility": "unlisted",
            "in_reply_to_id": "100"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "101", "url": "https://neubau.social/@kultur/101"})))
        .expect(1)
        .mount(&server)
        .await;

    let post = publisher(&server)
        .create_status(NewStatus {
            text: "(2/2)".to_string(),
            media_ids: vec!["m5".into()],
            visibility: Visibility::Unlisted,
            in_reply_to_id: Some("100".into()),
        })
        .await
        .unwrap();
    assert_eq!(post.id.as_str(), "101");
    assert_eq!(post.url.as_deref(), Some("https://neubau.social/@kultur/101"));
    assert_eq!(post.in_reply_to_id.as_ref().map(|p| p.as_str()), Some("100"));
}

#[tokio::test]
async fn test_thread_stops_at_first_failed_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .and(body_json(json!({"status": "root", "media_ids": ["m1", "m2"], "visibility": "private"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let media: Vec<MediaId> = ["m1", "m2", "m3"].into_iter().map(MediaId::from).collect();
    let err = publish_thread(&publisher(&server), "root", &media, Visibility::Private, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, CrossPostError::Publish { status, .. } if status.as_u16() == 503));
    server.verify().await;
}
