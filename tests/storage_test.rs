//! Tests for writing session output to disk

use serde_json::json;
use tempfile::TempDir;

use schemascrape::content_saver::REPORT_FILE_NAME;
use schemascrape::{CanonicalDocument, EntityId, SessionReport, save_document, save_report};

#[tokio::test]
async fn test_document_lands_in_mirrored_path() {
    let dir = TempDir::new().unwrap();
    let document = CanonicalDocument {
        page_url: "https://site.test/blog/post.html".into(),
        root_ids: vec![EntityId::from("https://site.test/#post")],
        document: json!({"@context": "https://schema.org", "@type": "BlogPosting"}),
    };

    let path = save_document(&document, dir.path()).await.unwrap();

    assert_eq!(path, dir.path().join("site.test/blog/post/schema.json"));
    let written: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(written, document.document);
}

#[tokio::test]
async fn test_root_page_and_report() {
    let dir = TempDir::new().unwrap();
    let document = CanonicalDocument {
        page_url: "https://site.test/".into(),
        root_ids: vec![],
        document: json!({}),
    };
    let path = save_document(&document, dir.path()).await.unwrap();
    assert!(path.ends_with("site.test/index/schema.json"));

    let report = SessionReport {
        documents: vec![document],
        ..SessionReport::default()
    };
    let report_path = save_report(&report, dir.path()).await.unwrap();
    assert_eq!(report_path, dir.path().join(REPORT_FILE_NAME));

    let restored: SessionReport =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(restored, report);
}
