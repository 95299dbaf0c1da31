use chrono::{TimeZone, Utc};
use postgen_core::csv_export::{encode, escape_field, PostRecord, CSV_HEADERS};
use postgen_core::export::ExportError;
use std::borrow::Cow;

fn record(caption: &str) -> PostRecord {
    PostRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        topic: "quotes".to_string(),
        caption: caption.to_string(),
        hashtags: vec!["#quotes".to_string(), "#words".to_string()],
        image_ref: None,
    }
}

#[test]
fn quoted_caption_survives_a_standard_csv_reader() {
    let caption = r#"He said, "hi""#;
    let encoded = encode(&[record(caption)]).expect("encode");

    let mut reader = csv::Reader::from_reader(encoded.as_bytes());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADERS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "2024-05-01T12:00:00.000Z");
    assert_eq!(&rows[0][1], "quotes");
    assert_eq!(&rows[0][2], caption);
    assert_eq!(&rows[0][3], "#quotes #words");
    assert_eq!(&rows[0][4], "");
}

#[test]
fn multiline_caption_is_quoted_and_preserved() {
    let caption = "line one\nline two";
    let encoded = encode(&[record(caption)]).expect("encode");
    assert!(encoded.contains("\"line one\nline two\""));

    let mut reader = csv::Reader::from_reader(encoded.as_bytes());
    let row = reader.records().next().expect("one row").expect("row");
    assert_eq!(&row[2], caption);
}

#[test]
fn output_has_header_plus_rows_and_no_trailing_newline() {
    let encoded = encode(&[record("first"), record("second")]).expect("encode");
    assert!(!encoded.ends_with('\n'));
    let lines: Vec<&str> = encoded.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Timestamp,Topic,Caption,Hashtags,Image URL");
    assert_eq!(
        lines[1],
        "2024-05-01T12:00:00.000Z,quotes,first,#quotes #words,"
    );
}

#[test]
fn image_reference_is_written_when_present() {
    let mut rec = record("with image");
    rec.image_ref = Some("data:image/png;base64,AAAA".to_string());
    let encoded = encode(&[rec]).expect("encode");
    assert!(encoded.ends_with(",data:image/png;base64,AAAA"));
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(encode(&[]), Err(ExportError::EmptyInput)));
}

#[test]
fn plain_fields_are_borrowed_unchanged() {
    assert!(matches!(escape_field("plain text"), Cow::Borrowed("plain text")));
    assert_eq!(escape_field("a,b"), "\"a,b\"");
    assert_eq!(escape_field("say \"x\""), "\"say \"\"x\"\"\"");
}
