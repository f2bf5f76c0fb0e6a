//! Tests for the crawl frontier: dedup, limits and determinism

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use schemascrape::crawl_engine::{
    CrawlError, CrawlRateLimiter, Crawler, PageTask, RetryPolicy, crawl, fetch_page,
};
use schemascrape::{FetchStatus, PageRecord};

mod common;
use common::{StaticFetcher, fast_policy, html_page, links};

const SEED: &str = "https://site.test/";

fn url(path: &str) -> String {
    format!("https://site.test{path}")
}

/// seed -> p1..p4; p1 -> p5,p6; p2 -> p6,p7; p3 -> p1,p8; p4 -> p9;
/// p5..p9 -> p10 and back to the seed
fn branching_site(delays: &[u64]) -> StaticFetcher {
    let graph: Vec<(&str, Vec<&str>)> = vec![
        ("/", vec!["/p1", "/p2", "/p3", "/p4"]),
        ("/p1", vec!["/p5", "/p6"]),
        ("/p2", vec!["/p6", "/p7"]),
        ("/p3", vec!["/p1", "/p8"]),
        ("/p4", vec!["/p9"]),
        ("/p5", vec!["/p10", "/"]),
        ("/p6", vec!["/p10", "/"]),
        ("/p7", vec!["/p10", "/"]),
        ("/p8", vec!["/p10", "/"]),
        ("/p9", vec!["/p10", "/"]),
        ("/p10", vec![]),
    ];

    let mut fetcher = StaticFetcher::new();
    for (i, (path, hrefs)) in graph.into_iter().enumerate() {
        let page_url = url(path);
        fetcher = fetcher.link_page(&page_url, &hrefs);
        if let Some(ms) = delays.get(i) {
            fetcher = fetcher.delay(&page_url, Duration::from_millis(*ms));
        }
    }
    fetcher
}

fn by_sequence(mut records: Vec<PageRecord>) -> Vec<(u64, String, u8)> {
    records.sort_by_key(|r| r.sequence);
    records
        .into_iter()
        .map(|r| (r.sequence, r.url, r.depth))
        .collect()
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let fetcher = Arc::new(branching_site(&[]));
    let records = crawl(SEED, fast_policy(5, 100, 4), fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 11);
    for record in &records {
        assert_eq!(fetcher.fetch_count(&record.url), 1, "{} fetched twice", record.url);
    }
    assert_eq!(fetcher.total_fetches(), 11);
}

#[tokio::test]
async fn test_depth_limit() {
    let fetcher = Arc::new(branching_site(&[]));
    let records = crawl(SEED, fast_policy(1, 100, 3), fetcher, CancellationToken::new())
        .await
        .unwrap();

    let urls: Vec<String> = by_sequence(records.clone())
        .into_iter()
        .map(|(_, url, _)| url)
        .collect();
    assert_eq!(
        urls,
        vec![SEED.to_string(), url("/p1"), url("/p2"), url("/p3"), url("/p4")]
    );
    assert!(records.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_page_limit_keeps_breadth_first_order() {
    let fetcher = Arc::new(branching_site(&[]));
    let records = crawl(SEED, fast_policy(5, 8, 2), fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 8);
    assert_eq!(fetcher.total_fetches(), 8);
    let expected = vec![
        (0, SEED.to_string(), 0),
        (1, url("/p1"), 1),
        (2, url("/p2"), 1),
        (3, url("/p3"), 1),
        (4, url("/p4"), 1),
        (5, url("/p5"), 2),
        (6, url("/p6"), 2),
        (7, url("/p7"), 2),
    ];
    assert_eq!(by_sequence(records), expected);
}

#[tokio::test]
async fn test_frontier_marks_urls_visited_on_enqueue() {
    let mut crawler = Crawler::new(
        SEED,
        fast_policy(5, 3, 1),
        Arc::new(branching_site(&[])),
        CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(crawler.seed_url(), SEED);
    assert!(crawler.has_visited(SEED));

    let first = crawler.next_page().await.unwrap();
    assert_eq!(first.sequence, 0);
    // the page budget caps what the seed's links may enqueue
    assert_eq!(crawler.visited_count(), 3);
    assert!(crawler.has_visited(&url("/p2")));
    assert!(!crawler.has_visited(&url("/p3")));

    while crawler.next_page().await.is_some() {}
    assert_eq!(crawler.visited_count(), 3);
    assert!(!crawler.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_slow_early_page_does_not_change_visit_set() {
    // p1 completes last, after every other depth-1 page
    let fast = by_sequence(
        crawl(
            SEED,
            fast_policy(5, 8, 4),
            Arc::new(branching_site(&[])),
            CancellationToken::new(),
        )
        .await
        .unwrap(),
    );
    let skewed = by_sequence(
        crawl(
            SEED,
            fast_policy(5, 8, 4),
            Arc::new(branching_site(&[0, 500, 1, 1, 1])),
            CancellationToken::new(),
        )
        .await
        .unwrap(),
    );
    assert_eq!(fast, skewed);
}

#[tokio::test]
async fn test_failed_and_non_html_pages_are_recorded_not_expanded() {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .page(
                SEED,
                html_page("Home", "", &links(&["/missing", "/report.pdf", "/ok"])),
            )
            .content(&url("/report.pdf"), "application/pdf", r#"<a href="/hidden">x</a>"#)
            .link_page(&url("/ok"), &[]),
    );

    let records = crawl(SEED, fast_policy(3, 100, 2), fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(records.len(), 4);

    let status_of = |u: &str| {
        records
            .iter()
            .find(|r| r.url == u)
            .map(|r| r.status.clone())
            .unwrap()
    };
    assert_eq!(status_of(&url("/missing")), FetchStatus::HttpError { status: 404 });
    assert!(matches!(
        status_of(&url("/report.pdf")),
        FetchStatus::UnsupportedContent { .. }
    ));
    assert_eq!(fetcher.fetch_count(&url("/hidden")), 0);
}

#[tokio::test]
async fn test_off_site_and_excluded_links_are_skipped() {
    let fetcher = Arc::new(StaticFetcher::new().link_page(
        SEED,
        &[
            "https://other.test/page",
            "/admin/panel",
            "/files/a.zip",
            "https://www.site.test/team",
        ],
    ));
    let mut policy = fast_policy(2, 100, 2);
    policy.excluded_paths = vec!["/admin".into(), "https://site.test/files/*".into()];

    let records = crawl(SEED, policy, fetcher.clone(), CancellationToken::new())
        .await
        .unwrap();

    let mut urls: Vec<String> = records.into_iter().map(|r| r.url).collect();
    urls.sort();
    assert_eq!(urls, vec![SEED.to_string(), "https://www.site.test/team".to_string()]);
    assert_eq!(fetcher.fetch_count("https://other.test/page"), 0);
}

#[tokio::test]
async fn test_invalid_seed_and_policy_are_rejected() {
    let fetcher = Arc::new(StaticFetcher::new());
    let result = Crawler::new(
        "ftp://site.test/",
        fast_policy(1, 10, 1),
        fetcher.clone(),
        CancellationToken::new(),
    );
    assert!(matches!(result, Err(CrawlError::InvalidSeed { .. })));

    let result = Crawler::new(SEED, fast_policy(1, 10, 0), fetcher, CancellationToken::new());
    assert!(matches!(result, Err(CrawlError::InvalidPolicy(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_the_crawl() {
    let fetcher = Arc::new(branching_site(&[0, 10_000, 10_000, 10_000, 10_000]));
    let cancel = CancellationToken::new();
    let mut crawler =
        Crawler::new(SEED, fast_policy(5, 100, 4), fetcher, cancel.clone()).unwrap();

    let first = crawler.next_page().await.unwrap();
    assert_eq!(first.url, SEED);

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    assert!(crawler.next_page().await.is_none());
    assert!(crawler.is_cancelled());
    assert!(crawler.next_page().await.is_none());

    let pre_cancelled = CancellationToken::new();
    pre_cancelled.cancel();
    let result = Crawler::new(
        SEED,
        fast_policy(1, 10, 1),
        Arc::new(StaticFetcher::new()),
        pre_cancelled,
    );
    assert!(matches!(result, Err(CrawlError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_retries_wait_for_the_domain_interval() {
    let fetcher = StaticFetcher::new().status(&url("/flaky"), 503);
    let limiter = CrawlRateLimiter::from_millis(1_000);
    let task = PageTask {
        url: url("/flaky"),
        depth: 1,
        origin_domain: "site.test".into(),
        sequence: 1,
    };
    let retry = RetryPolicy {
        max_retries: 2,
        backoff_ms: 1,
    };

    let start = tokio::time::Instant::now();
    let record = fetch_page(&fetcher, &limiter, &task, retry).await;

    assert_eq!(record.status, FetchStatus::HttpError { status: 503 });
    assert_eq!(fetcher.fetch_count(&url("/flaky")), 3);
    // three attempts, each a full interval after the previous one
    assert!(start.elapsed() >= Duration::from_millis(2_000), "{:?}", start.elapsed());
}

fn run_paused<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_visit_order_is_independent_of_completion_order(
        delays in proptest::collection::vec(0u64..200, 11),
        concurrency in 1usize..6,
        max_pages in 1usize..12,
    ) {
        let reference = run_paused(crawl(
            SEED,
            fast_policy(5, max_pages, 1),
            Arc::new(branching_site(&[])),
            CancellationToken::new(),
        )).unwrap();

        let fetcher = Arc::new(branching_site(&delays));
        let shuffled = run_paused(crawl(
            SEED,
            fast_policy(5, max_pages, concurrency),
            fetcher.clone(),
            CancellationToken::new(),
        )).unwrap();

        prop_assert_eq!(by_sequence(reference), by_sequence(shuffled.clone()));
        prop_assert!(shuffled.len() <= max_pages);
        for record in &shuffled {
            prop_assert_eq!(fetcher.fetch_count(&record.url), 1);
        }
    }
}
