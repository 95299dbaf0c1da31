//! Text adapter behaviour: remote results when usable, local fallbacks otherwise.

use postgen_core::config::InferenceConfig;
use postgen_core::contract::TextGenerator;
use postgen_core::platform::Platform;
use postgen_core::text_gen::{
    caption_templates, clean_caption, extract_hashtags, fallback_hashtags, TextGenerationAdapter,
    GENERIC_HASHTAGS,
};
use postgen_core::transport::{MockInferenceTransport, TransportError, TransportResponse};
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

fn configured() -> InferenceConfig {
    InferenceConfig::default().with_api_key("hf_test_key")
}

fn completion(text: &str) -> TransportResponse {
    let body = serde_json::to_vec(&json!([{ "generated_text": text }])).unwrap();
    TransportResponse::new(200, body).with_content_type("application/json")
}

fn assert_valid_tags(tags: &[String], count: usize) {
    let pattern = Regex::new(r"^#\w+$").unwrap();
    assert!(!tags.is_empty() && tags.len() <= count, "got {tags:?}");
    for tag in tags {
        assert!(pattern.is_match(tag), "malformed tag {tag}");
    }
    let mut distinct = tags.to_vec();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), tags.len(), "duplicate tags in {tags:?}");
}

#[tokio::test]
async fn unconfigured_adapter_never_calls_remote_and_falls_back() {
    let mut transport = MockInferenceTransport::new();
    transport.expect_post_json().never();
    let adapter = TextGenerationAdapter::new(InferenceConfig::default(), Arc::new(transport));

    let tags = adapter.generate_hashtags("Sunset over the ocean", 5).await;
    assert_eq!(
        tags,
        vec!["#sunsetovertheocean", "#sunset", "#over", "#the", "#ocean"]
    );

    let caption = adapter
        .generate_caption("Sunset over the ocean", Platform::Instagram)
        .await;
    assert!(caption.contains("Sunset over the ocean"));
}

#[tokio::test]
async fn failing_remote_caption_falls_back_to_template_with_topic() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .returning(|_, _| Err(TransportError::Request("connection reset".into())));
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    for platform in Platform::ALL {
        let caption = adapter.generate_caption("rust meetups", platform).await;
        assert!(!caption.is_empty());
        assert!(caption.contains("rust meetups"), "caption was {caption}");
    }
}

#[tokio::test]
async fn remote_caption_is_stripped_of_prompt_and_cut_at_first_line() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .withf(|url, body| {
            url == postgen_core::config::DEFAULT_TEXT_MODEL_URL
                && body["parameters"]["max_length"] == 280
                && body["options"]["wait_for_model"] == true
        })
        .times(1)
        .returning(|_, body| {
            let prompt = body["inputs"].as_str().unwrap_or_default().to_string();
            Ok(completion(&format!(
                "{prompt} Golden hour at the pier never gets old\nsecond line"
            )))
        });
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    let caption = adapter.generate_caption("pier sunsets", Platform::Twitter).await;
    assert_eq!(caption, "Golden hour at the pier never gets old");
}

#[tokio::test]
async fn short_remote_caption_is_replaced_by_fallback() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .returning(|_, _| Ok(completion("Too short")));
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    let caption = adapter.generate_caption("coffee", Platform::LinkedIn).await;
    let expected: Vec<String> = caption_templates(Platform::LinkedIn)
        .iter()
        .map(|t| t.replace("{topic}", "coffee"))
        .collect();
    assert!(expected.contains(&caption), "unexpected caption {caption}");
}

#[tokio::test]
async fn remote_hashtags_are_extracted_distinct_and_capped() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .returning(|_, _| Ok(completion("Try #beach #sunset #beach and #travel_life #summer")));
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    let tags = adapter.generate_hashtags("beach", 3).await;
    assert_eq!(tags, vec!["#beach", "#sunset", "#travel_life"]);
    assert_valid_tags(&tags, 3);
}

#[tokio::test]
async fn loading_model_yields_fallback_hashtags() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .returning(|_, _| Ok(TransportResponse::new(503, "loading")));
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    let tags = adapter.generate_hashtags("AI", 5).await;
    assert_eq!(tags, fallback_hashtags("AI", 5));
    assert_valid_tags(&tags, 5);
}

#[tokio::test]
async fn remote_output_without_tags_yields_fallback() {
    let mut transport = MockInferenceTransport::new();
    transport
        .expect_post_json()
        .returning(|_, _| Ok(completion("no tags here at all")));
    let adapter = TextGenerationAdapter::new(configured(), Arc::new(transport));

    let tags = adapter.generate_hashtags("mountain biking", 4).await;
    assert_eq!(tags, fallback_hashtags("mountain biking", 4));
}

#[tokio::test]
async fn seeded_adapters_pick_the_same_fallback_caption() {
    let make = || {
        let mut transport = MockInferenceTransport::new();
        transport.expect_post_json().never();
        TextGenerationAdapter::new(InferenceConfig::default(), Arc::new(transport)).with_seed(42)
    };
    let (a, b) = (make(), make());
    for _ in 0..5 {
        assert_eq!(
            a.generate_caption("gardening", Platform::Twitter).await,
            b.generate_caption("gardening", Platform::Twitter).await
        );
    }
}

#[test]
fn fallback_hashtags_pad_with_generic_tags_without_duplicates() {
    let tags = fallback_hashtags("a b", 5);
    assert_eq!(tags[0], "#ab");
    assert_eq!(&tags[1..], &GENERIC_HASHTAGS[..4]);

    let tags = fallback_hashtags("Content content", 3);
    assert_eq!(tags, vec!["#contentcontent", "#content", "#socialmedia"]);
}

#[test]
fn fallback_hashtags_for_symbol_only_topic_are_generic() {
    let tags = fallback_hashtags("!!! ???", 5);
    assert_eq!(tags, GENERIC_HASHTAGS[..5].to_vec());
    assert_valid_tags(&tags, 5);
}

#[test]
fn fallback_hashtags_are_well_formed_for_non_ascii_topics() {
    let topics = [
        "Café über alles",
        "日本語",
        "İstanbul 2024!!",
        "emoji 🚀🚀 launch",
        "",
        "   ",
        "___",
    ];
    for topic in topics {
        for count in 1..=8 {
            assert_valid_tags(&fallback_hashtags(topic, count), count);
        }
    }

    assert_eq!(
        fallback_hashtags("İstanbul 2024!!", 5),
        vec!["#istanbul2024", "#istanbul", "#2024", "#socialmedia", "#content"]
    );
    assert_eq!(fallback_hashtags("日本語", 3), GENERIC_HASHTAGS[..3].to_vec());
}

#[test]
fn extract_hashtags_skips_non_ascii_tags() {
    assert_eq!(extract_hashtags("#über #ok", 5), vec!["#ok"]);
}

#[test]
fn clean_caption_rejects_short_results() {
    assert_eq!(clean_caption("Prompt: ok", "Prompt:"), None);
    assert_eq!(
        clean_caption("Prompt:   long enough caption  ", "Prompt:").as_deref(),
        Some("long enough caption")
    );
}

#[test]
fn extract_hashtags_respects_count() {
    assert!(extract_hashtags("#a #b #c", 0).is_empty());
    assert_eq!(extract_hashtags("x #one, y #two!", 5), vec!["#one", "#two"]);
}
