//! Tests for the type-safe configuration builder and config loading

use std::io::Write;

use schemascrape::MergePolicy;
use schemascrape::config::{CrawlPolicy, DiscoveryConfig};

#[test]
fn test_builder_requires_seed_url() {
    // This should not compile if uncommented - testing compile-time guarantees
    // let config = DiscoveryConfig::builder().build();

    let config = DiscoveryConfig::builder()
        .seed_url("https://example.com/docs/#intro")
        .build()
        .unwrap();
    assert_eq!(config.seed_url(), "https://example.com/docs");
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = DiscoveryConfig::builder()
        .seed_url("example.com")
        .build()
        .unwrap();

    let policy = config.crawl_policy();
    assert_eq!(config.seed_url(), "https://example.com/");
    assert_eq!(policy.max_depth, 3);
    assert_eq!(policy.max_pages, 100);
    assert!(policy.same_domain_only);
    assert_eq!(policy.max_concurrency, 5);
    assert_eq!(policy.per_domain_interval_ms, 1000);
    assert_eq!(policy.max_concurrent_per_domain, None);
    assert_eq!(config.synthesis().max_retries, 0);
    assert_eq!(config.synthesis().max_signal_chars, 4000);
    assert_eq!(config.resolution().max_traversal_depth, 8);
    assert_eq!(config.resolution().merge_policy, MergePolicy::FirstWriterWins);
}

#[test]
fn test_builder_with_optional_fields() {
    let config = DiscoveryConfig::builder()
        .seed_url("https://example.com")
        .max_depth(1)
        .max_pages(10)
        .same_domain_only(false)
        .max_concurrency(2)
        .per_domain_interval_ms(0)
        .max_concurrent_per_domain(1)
        .excluded_paths(["/private", "https://example.com/*.pdf"])
        .synthesis_retries(2, 100)
        .synthesis_model("test-model")
        .synthesis_api_base("http://localhost:8080/v1")
        .merge_policy(MergePolicy::LastWriterWins)
        .max_traversal_depth(4)
        .build()
        .unwrap();

    let policy = config.crawl_policy();
    assert_eq!(policy.max_depth, 1);
    assert_eq!(policy.max_pages, 10);
    assert!(!policy.same_domain_only);
    assert_eq!(config.max_concurrency(), 2);
    assert!(config.per_domain_interval().is_zero());
    assert_eq!(policy.max_concurrent_per_domain, Some(1));
    assert_eq!(policy.excluded_paths.len(), 2);
    assert_eq!(config.synthesis().max_retries, 2);
    assert_eq!(config.synthesis().model, "test-model");
    assert_eq!(config.synthesis().api_base, "http://localhost:8080/v1");
    assert_eq!(config.resolution().merge_policy, MergePolicy::LastWriterWins);
    assert_eq!(config.resolution().max_traversal_depth, 4);
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(DiscoveryConfig::builder().seed_url("ftp://example.com").build().is_err());
    assert!(
        DiscoveryConfig::builder()
            .seed_url("https://example.com")
            .max_concurrency(0)
            .build()
            .is_err()
    );
    assert!(
        DiscoveryConfig::builder()
            .seed_url("https://example.com")
            .max_pages(0)
            .build()
            .is_err()
    );
    assert!(
        DiscoveryConfig::builder()
            .seed_url("https://example.com")
            .max_traversal_depth(0)
            .build()
            .is_err()
    );
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"crawl": {{"max_pages": 12, "excluded_paths": []}}, "resolution": {{"merge_policy": "last_writer_wins"}}}}"#
    )
    .unwrap();

    let config =
        DiscoveryConfig::load_with_env(Some(file.path()), "https://example.com", |_| None).unwrap();
    assert_eq!(config.crawl_policy().max_pages, 12);
    assert!(config.crawl_policy().excluded_paths.is_empty());
    assert_eq!(config.crawl_policy().max_depth, CrawlPolicy::default().max_depth);
    assert_eq!(config.resolution().merge_policy, MergePolicy::LastWriterWins);
}

#[test]
fn test_env_overrides_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"crawl": {{"max_depth": 5, "user_agent": "FileAgent/1.0"}}}}"#).unwrap();

    let config = DiscoveryConfig::load_with_env(Some(file.path()), "https://example.com", |key| {
        match key {
            "MAX_DEPTH" => Some("2".to_string()),
            "PER_DOMAIN_INTERVAL_MS" => Some("0".to_string()),
            _ => None,
        }
    })
    .unwrap();
    assert_eq!(config.crawl_policy().max_depth, 2);
    assert_eq!(config.crawl_policy().per_domain_interval_ms, 0);
    assert_eq!(config.crawl_policy().user_agent, "FileAgent/1.0");
}

#[test]
fn test_bad_config_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(
        DiscoveryConfig::load_with_env(Some(file.path()), "https://example.com", |_| None).is_err()
    );
    assert!(
        DiscoveryConfig::load_with_env(
            Some(std::path::Path::new("/nonexistent/schemascrape.json")),
            "https://example.com",
            |_| None
        )
        .is_err()
    );
}
