use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, NamedTempFile};

/// A binary invocation that can never reach the network: the key is the
/// placeholder, which also keeps a stray `.env` from supplying one.
fn postgen() -> Command {
    let mut cmd = Command::cargo_bin("postgen").expect("Binary exists");
    cmd.env("HUGGINGFACE_API_KEY", "your_api_key_here");
    cmd
}

#[test]
fn generate_without_key_reports_image_failure_and_fallback_text() {
    postgen()
        .args(["generate", "--topic", "Rust meetups", "--platform", "twitter"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Image failed: Hugging Face API key not configured")
                .and(predicate::str::contains("Topic: Rust meetups (twitter)"))
                .and(predicate::str::contains("Rust meetups"))
                .and(predicate::str::contains(
                    "Hashtags: #rustmeetups #rust #meetups #socialmedia #content",
                ))
                .and(predicate::str::contains("/280"))
                .and(predicate::str::contains("Content generated successfully")),
        );
}

#[test]
fn generate_applies_caption_edit_and_hashtag_removal() {
    postgen()
        .args([
            "generate",
            "--topic",
            "Rust meetups",
            "--caption",
            "Join us on Thursday",
            "--drop-hashtag",
            "0",
            "--drop-hashtag",
            "2",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Caption: Join us on Thursday")
                .and(predicate::str::contains("Characters: 19/2200"))
                .and(predicate::str::contains("Hashtags: #rust #socialmedia #content")),
        );
}

#[test]
fn caption_over_platform_limit_fails() {
    let long = "x".repeat(281);
    postgen()
        .args(["generate", "--topic", "birds", "--platform", "twitter", "--caption", &long])
        .assert()
        .failure()
        .stderr(predicate::str::contains("twitter allows at most 280"));
}

#[test]
fn blank_topic_is_rejected() {
    postgen()
        .args(["generate", "--topic", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid generation request"));
}

#[test]
fn unknown_platform_is_a_usage_error() {
    postgen()
        .args(["generate", "--topic", "birds", "--platform", "myspace"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown platform"));
}

#[test]
fn json_output_is_machine_readable() {
    let output = postgen()
        .args(["generate", "--topic", "tides", "--topic", "moons", "--json"])
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let posts: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let posts = posts.as_array().expect("array of posts");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["topic"], "tides");
    assert_eq!(posts[1]["topic"], "moons");
    assert_eq!(posts[0]["platform"], "instagram");
    assert!(posts[0]["image_error"].as_str().is_some());
    assert!(posts[0]["image_bytes"].is_null());
}

#[test]
fn exports_text_and_csv_to_out_dir() {
    let dir = tempdir().unwrap();
    postgen()
        .args(["generate", "--topic", "harbour", "--export", "text,csv,image", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Exported text to")
                .and(predicate::str::contains("Exported csv to")),
        )
        .stderr(predicate::str::contains("Export image failed: post has no image to export"));

    let text = fs::read_to_string(dir.path().join("post-content.txt")).unwrap();
    assert!(text.contains("harbour"));
    assert!(text.contains("\n\n#harbour"));

    let csv = fs::read_to_string(dir.path().join("post-data.csv")).unwrap();
    assert!(csv.starts_with("Timestamp,Topic,Caption,Hashtags,Image URL\n"));
    assert_eq!(csv.lines().count(), 2);
    assert!(!dir.path().join("social-media-image.png").exists());
}

#[test]
fn config_file_controls_hashtag_count() {
    let config = NamedTempFile::new().expect("temp config");
    fs::write(config.path(), "generation:\n  hashtag_count: 2\n").unwrap();

    postgen()
        .arg("--config")
        .arg(config.path())
        .args(["generate", "--topic", "Rust meetups"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hashtags: #rustmeetups #rust\n"));
}

#[test]
fn check_without_key_reports_unavailable() {
    postgen()
        .arg("check")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Image model unavailable")
                .and(predicate::str::contains("Set HUGGINGFACE_API_KEY")),
        );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use postgen::cli::{run, Cli, Commands};

    // A missing config file makes run fail right after start-up.
    let cli = Cli {
        config: Some(std::path::PathBuf::from("dummy.yaml")),
        command: Commands::Check,
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
