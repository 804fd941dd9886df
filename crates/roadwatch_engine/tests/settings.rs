use std::time::Duration;

use pretty_assertions::assert_eq;
use roadwatch_engine::{
    parse_base_url, ApiError, ClientSettings, ProgressMessage, ReconnectPolicy, StatusReport,
};

#[test]
fn push_endpoint_follows_backend_scheme() {
    let plain = ClientSettings::with_base_url("http://localhost:8000").unwrap();
    assert_eq!(plain.push_endpoint().unwrap().as_str(), "ws://localhost:8000/ws");

    let secure = ClientSettings::with_base_url("https://roads.example.org/app/").unwrap();
    assert_eq!(
        secure.push_endpoint().unwrap().as_str(),
        "wss://roads.example.org/ws"
    );
}

#[test]
fn base_url_must_be_http_origin() {
    assert!(matches!(
        parse_base_url("ftp://example.org"),
        Err(ApiError::InvalidUrl(_))
    ));
    assert!(matches!(parse_base_url("not a url"), Err(ApiError::InvalidUrl(_))));
    assert!(parse_base_url("https://example.org").is_ok());
}

#[test]
fn resolve_joins_server_relative_paths() {
    let settings = ClientSettings::with_base_url("http://localhost:8000").unwrap();
    assert_eq!(
        settings.resolve("/outputs/clip_processed.avi").unwrap().as_str(),
        "http://localhost:8000/outputs/clip_processed.avi"
    );
}

#[test]
fn base_url_reduces_to_origin() {
    let settings = ClientSettings::with_base_url("http://roads.local:8000/app/?x=1#top").unwrap();
    assert_eq!(settings.base_url.as_str(), "http://roads.local:8000/");
    assert_eq!(
        settings.push_endpoint().unwrap().as_str(),
        "ws://roads.local:8000/ws"
    );
    assert_eq!(
        settings.resolve("/outputs/clip.avi").unwrap().as_str(),
        "http://roads.local:8000/outputs/clip.avi"
    );
}

#[test]
fn default_settings_match_backend_conventions() {
    let settings = ClientSettings::default();
    assert_eq!(settings.reconnect.delay, Duration::from_millis(3000));
    assert_eq!(settings.notification_ttl, Duration::from_millis(4000));
    assert_eq!(settings.status_poll_interval, None);
}

#[test]
fn reconnect_delay_without_jitter_is_fixed() {
    let policy = ReconnectPolicy::default();
    for _ in 0..10 {
        assert_eq!(policy.next_delay(), Duration::from_millis(3000));
    }
}

#[test]
fn reconnect_jitter_stays_in_bounds() {
    let policy = ReconnectPolicy {
        delay: Duration::from_millis(1000),
        jitter: Duration::from_millis(250),
    };
    for _ in 0..100 {
        let delay = policy.next_delay();
        assert!(delay >= Duration::from_millis(1000));
        assert!(delay <= Duration::from_millis(1250));
    }
}

#[test]
fn progress_message_fields_are_optional_and_clamped() {
    let empty = ProgressMessage::decode("{}").unwrap();
    assert_eq!(empty, ProgressMessage::default());
    assert_eq!(empty.percent(), None);

    let over = ProgressMessage::decode(r#"{"progress": 140, "processed_frames": 7}"#).unwrap();
    assert_eq!(over.percent(), Some(100));
    assert_eq!(over.processed_frames, Some(7));

    assert!(ProgressMessage::decode("[1, 2]").is_err());
}

#[test]
fn status_report_maps_to_message_by_phase() {
    let running = StatusReport {
        is_processing: true,
        progress: 42,
        total_frames: 100,
        processed_frames: 42,
        ..StatusReport::default()
    };
    assert_eq!(running.into_message().percent(), Some(42));

    let idle = StatusReport::default().into_message();
    assert_eq!(idle.percent(), None);
    assert_eq!(idle.error, None);
    assert_eq!(idle.output_file, None);
}

#[test]
fn user_message_prefers_server_detail() {
    let detail = ApiError::Rejected {
        status: 409,
        detail: Some("Processing already in progress".to_string()),
    };
    assert_eq!(detail.user_message("Processing failed"), "Processing already in progress");

    let bare = ApiError::Rejected {
        status: 500,
        detail: None,
    };
    assert_eq!(bare.user_message("Upload failed"), "Upload failed");
    assert_eq!(bare.to_string(), "http status 500");

    assert_eq!(ApiError::Timeout.user_message("Upload failed"), "request timed out");
}

#[test]
fn invalid_frame_counts_do_not_hide_terminal_fields() {
    let message = ProgressMessage::decode(
        r#"{"progress": 100, "processed_frames": -1, "total_frames": -1,
            "is_processing": false, "output_file": "clip_processed.mp4"}"#,
    )
    .unwrap();
    assert_eq!(
        message,
        ProgressMessage {
            progress: Some(100),
            processed_frames: None,
            total_frames: None,
            output_file: Some("clip_processed.mp4".to_string()),
            error: None,
            is_processing: Some(false),
        }
    );

    let odd = ProgressMessage::decode(
        r#"{"progress": 42.7, "processed_frames": "12", "total_frames": null, "error": "boom"}"#,
    )
    .unwrap();
    assert_eq!(odd.percent(), Some(42));
    assert_eq!(odd.processed_frames, None);
    assert_eq!(odd.error.as_deref(), Some("boom"));
}

#[test]
fn status_report_tolerates_negative_counts() {
    let report: StatusReport = serde_json::from_str(
        r#"{"is_processing": false, "progress": 100, "total_frames": -1,
            "processed_frames": -1, "output_file": "clip_processed.mp4"}"#,
    )
    .unwrap();
    assert_eq!(report.total_frames, 0);
    assert_eq!(
        report.into_message().output_file.as_deref(),
        Some("clip_processed.mp4")
    );
}
