//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use flate2::write::GzEncoder;
use flate2::Compression;
use link_ripple::config::CrawlSettings;
use link_ripple::crawler::{
    CrawlListener, Crawler, DiscoveredLink, FetchError, FetchedPage, SinkListener,
};
use link_ripple::output::CrawlSummary;
use link_ripple::storage::{LinkSink, LinkStore, MemoryLinkWriter};
use link_ripple::CrawlError;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upper bound for any single test crawl
const CRAWL_DEADLINE: Duration = Duration::from_secs(20);

/// Listener that records everything and admits each URL once
#[derive(Default)]
struct Recorder {
    seen: Mutex<HashSet<String>>,
    pages: Mutex<HashMap<String, (u32, String)>>,
    discovered: Mutex<Vec<(String, u32, String)>>,
    errors: Mutex<Vec<(String, String)>>,
}

impl Recorder {
    fn knowing(urls: &[&str]) -> Arc<Self> {
        let recorder = Self::default();
        recorder
            .seen
            .lock()
            .unwrap()
            .extend(urls.iter().map(|u| u.to_string()));
        Arc::new(recorder)
    }

    fn page_depth(&self, url: &str) -> Option<u32> {
        self.pages.lock().unwrap().get(url).map(|(depth, _)| *depth)
    }

    fn page_html(&self, url: &str) -> Option<String> {
        self.pages.lock().unwrap().get(url).map(|(_, html)| html.clone())
    }

    fn page_urls(&self) -> HashSet<String> {
        self.pages.lock().unwrap().keys().cloned().collect()
    }

    fn discovered_urls(&self) -> Vec<String> {
        self.discovered
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect()
    }

    fn error_urls(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

impl CrawlListener for Recorder {
    fn on_page_fetched(&self, page: &FetchedPage<'_>) {
        self.pages
            .lock()
            .unwrap()
            .insert(page.url.to_string(), (page.depth, page.html.to_string()));
    }

    fn on_link_discovered(&self, link: &DiscoveredLink<'_>) -> bool {
        self.discovered.lock().unwrap().push((
            link.url.to_string(),
            link.depth,
            link.anchor_text.to_string(),
        ));
        self.seen.lock().unwrap().insert(link.url.to_string())
    }

    fn on_error(&self, url: &str, error: &FetchError) {
        self.errors
            .lock()
            .unwrap()
            .push((url.to_string(), error.to_string()));
    }
}

/// Creates test settings with a short idle backoff
fn test_settings(seeds: Vec<String>) -> CrawlSettings {
    CrawlSettings {
        threads: 2,
        depth: 0,
        idle_backoff_ms: 50,
        timeout_ms: 5_000,
        seeds,
        ..CrawlSettings::default()
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn run(crawler: &Crawler) -> CrawlSummary {
    tokio::time::timeout(CRAWL_DEADLINE, crawler.crawl())
        .await
        .expect("crawl did not finish in time")
        .expect("crawl failed")
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/page1">Page 1</a><a href="/page2">Page 2</a>"#,
        1,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<a href="/page2">Again</a><a href="/">Home</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/page2", "no links here", 1).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.fetch_errors, 0);
    assert_eq!(summary.links_admitted, 2);
    assert!(!summary.stopped);

    let expected: HashSet<String> = [
        seed.clone(),
        format!("{}/page1", base),
        format!("{}/page2", base),
    ]
    .into_iter()
    .collect();
    assert_eq!(recorder.page_urls(), expected);

    assert_eq!(recorder.page_depth(&seed), Some(1));
    assert_eq!(recorder.page_depth(&format!("{}/page1", base)), Some(2));
    assert_eq!(recorder.page_depth(&format!("{}/page2", base)), Some(2));

    let anchors: Vec<String> = recorder
        .discovered
        .lock()
        .unwrap()
        .iter()
        .filter(|(url, _, _)| url.ends_with("/page1"))
        .map(|(_, _, text)| text.clone())
        .collect();
    assert_eq!(anchors, vec!["Page 1"]);
}

#[tokio::test]
async fn test_depth_limit_stops_expansion() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/d1", r#"<a href="/d2">next</a>"#, 1).await;
    mount_page(&server, "/d2", r#"<a href="/d3">next</a>"#, 1).await;
    mount_page(&server, "/d3", r#"<a href="/d4">next</a>"#, 1).await;
    mount_page(&server, "/d4", "too deep", 0).await;

    let seed = format!("{}/d1", base);
    let recorder = Recorder::knowing(&[&seed]);
    let settings = CrawlSettings {
        depth: 3,
        ..test_settings(vec![seed])
    };
    let crawler = Crawler::new(settings, recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(recorder.page_depth(&format!("{}/d3", base)), Some(3));
    assert!(!recorder
        .discovered_urls()
        .contains(&format!("{}/d4", base)));
}

#[tokio::test]
async fn test_terminates_without_links_for_any_thread_count() {
    for threads in [1u16, 2, 8] {
        let server = MockServer::start().await;
        mount_page(&server, "/", "lonely page", 1).await;

        let settings = CrawlSettings {
            threads,
            ..test_settings(vec![format!("{}/", server.uri())])
        };
        let crawler = Crawler::new(settings, Recorder::knowing(&[])).unwrap();

        let summary = run(&crawler).await;
        assert_eq!(summary.pages_fetched, 1, "threads = {}", threads);
        assert!(!crawler.is_running());
    }
}

#[tokio::test]
async fn test_fetch_errors_are_reported_and_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/ok">Ok</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "fine", 1).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed]), recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.fetch_errors, 1);
    assert_eq!(recorder.error_urls(), vec![format!("{}/broken", base)]);
    assert!(recorder.errors.lock().unwrap()[0].1.contains("500"));
}

#[tokio::test]
async fn test_unreachable_seed_is_an_error_event() {
    // port 9 (discard) is closed on test machines
    let seed = "http://127.0.0.1:9/".to_string();
    let recorder = Recorder::knowing(&[]);
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(summary.fetch_errors, 1);
    assert_eq!(recorder.error_urls(), vec![seed]);
}

#[tokio::test]
async fn test_excluded_hrefs_are_never_enqueued() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"
        <a href="mailto:a@b.com">Mail</a>
        <a href="#frag">Fragment</a>
        <a href="javascript:void(0)">Script</a>
        <a href="/real">Real</a>
        "##,
        1,
    )
    .await;
    mount_page(&server, "/real", "", 1).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed]), recorder.clone()).unwrap();

    run(&crawler).await;

    assert_eq!(recorder.discovered_urls(), vec![format!("{}/real", base)]);
}

#[tokio::test]
async fn test_escape_suffix_is_never_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/report.pdf">PDF</a><a href="/report.html">HTML</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/report.pdf", "binary", 0).await;
    mount_page(&server, "/report.html", "", 1).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let settings = CrawlSettings {
        escape_suffixes: vec![".pdf".to_string()],
        ..test_settings(vec![seed])
    };
    let crawler = Crawler::new(settings, recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.links_rejected, 1);
    assert_eq!(
        recorder.discovered_urls(),
        vec![format!("{}/report.html", base)]
    );
}

#[tokio::test]
async fn test_host_lock_rejects_other_hosts() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="http://localhost:{}/elsewhere">Other</a><a href="/here">Here</a>"#,
            port
        ),
        1,
    )
    .await;
    mount_page(&server, "/here", "", 1).await;
    mount_page(&server, "/elsewhere", "", 0).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed]), recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.links_rejected, 1);
    assert_eq!(recorder.discovered_urls(), vec![format!("{}/here", base)]);
}

#[tokio::test]
async fn test_listener_veto_is_authoritative() {
    struct VetoAll;

    impl CrawlListener for VetoAll {
        fn on_link_discovered(&self, _link: &DiscoveredLink<'_>) -> bool {
            false
        }
    }

    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;
    mount_page(&server, "/a", "", 0).await;
    mount_page(&server, "/b", "", 0).await;

    let crawler = Crawler::new(
        test_settings(vec![format!("{}/", server.uri())]),
        Arc::new(VetoAll),
    )
    .unwrap();

    let summary = run(&crawler).await;
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.links_vetoed, 2);
    assert_eq!(summary.links_admitted, 0);
}

#[tokio::test]
async fn test_gzip_body_is_inflated() {
    let server = MockServer::start().await;
    let base = server.uri();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"<html><body><p>squeezed</p><a href="/after">After</a></body></html>"#)
        .unwrap();
    let packed = encoder.finish().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .insert_header("content-type", "text/html")
                .set_body_bytes(packed),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/after", "", 1).await;

    let seed = format!("{}/", base);
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), recorder.clone()).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 2);
    assert!(recorder.page_html(&seed).unwrap().contains("squeezed"));
}

#[tokio::test]
async fn test_meta_charset_decoding() {
    let server = MockServer::start().await;
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(
        r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=windows-1251"></head><body>Привет</body></html>"#,
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(bytes.into_owned()),
        )
        .mount(&server)
        .await;

    let seed = format!("{}/", server.uri());
    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), recorder.clone()).unwrap();

    run(&crawler).await;

    assert!(recorder.page_html(&seed).unwrap().contains("Привет"));
}

#[tokio::test]
async fn test_cookies_round_trip_when_kept() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html_page(r#"<a href="/members">Members</a>"#)
                .insert_header("set-cookie", "session=abc; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members"))
        .and(header("cookie", "session=abc"))
        .respond_with(html_page("welcome back"))
        .mount(&server)
        .await;

    let seed = format!("{}/", base);

    let recorder = Recorder::knowing(&[&seed]);
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), recorder.clone()).unwrap();
    let summary = run(&crawler).await;
    assert_eq!(summary.pages_fetched, 2);
    assert!(recorder.error_urls().is_empty());

    // without a jar the cookie is not replayed and the mock answers 404
    let recorder = Recorder::knowing(&[&seed]);
    let settings = CrawlSettings {
        keep_cookie: false,
        ..test_settings(vec![seed])
    };
    let crawler = Crawler::new(settings, recorder.clone()).unwrap();
    let summary = run(&crawler).await;
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(recorder.error_urls(), vec![format!("{}/members", base)]);
}

#[tokio::test]
async fn test_stop_ends_a_running_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("slow").set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let recorder = Recorder::knowing(&[]);
    let crawler = Arc::new(
        Crawler::new(
            test_settings(vec![format!("{}/", server.uri())]),
            recorder.clone(),
        )
        .unwrap(),
    );

    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl().await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(crawler.is_running());
    crawler.stop();

    let summary = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("stop did not end the crawl")
        .unwrap()
        .unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.pages_fetched, 0);
    assert!(recorder.error_urls().is_empty());
    assert!(!crawler.is_running());
}

#[tokio::test]
async fn test_stop_right_after_spawn_ends_the_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("slow").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let recorder = Recorder::knowing(&[]);
    let crawler = Arc::new(
        Crawler::new(
            test_settings(vec![format!("{}/", server.uri())]),
            recorder.clone(),
        )
        .unwrap(),
    );

    // the spawned task has not been polled yet when stop is called
    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl().await });
    crawler.stop();

    let summary = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("stop did not end the crawl")
        .unwrap()
        .unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.pages_fetched, 0);
    assert!(recorder.page_urls().is_empty());
    assert!(!crawler.is_running());

    // the stop was consumed by that run, so the next one completes
    let summary = run(&crawler).await;
    assert!(!summary.stopped);
    assert_eq!(summary.pages_fetched, 1);
}

#[tokio::test]
async fn test_second_crawl_while_running_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("slow").set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let crawler = Arc::new(
        Crawler::new(
            test_settings(vec![format!("{}/", server.uri())]),
            Recorder::knowing(&[]),
        )
        .unwrap(),
    );

    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl().await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(matches!(
        crawler.crawl().await,
        Err(CrawlError::AlreadyRunning)
    ));

    crawler.stop();
    let first = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_ok());
}

#[tokio::test]
async fn test_crawler_can_run_again_after_finishing() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "again and again", 2).await;

    let crawler = Crawler::new(
        test_settings(vec![format!("{}/", server.uri())]),
        Recorder::knowing(&[]),
    )
    .unwrap();

    assert_eq!(run(&crawler).await.pages_fetched, 1);
    assert_eq!(run(&crawler).await.pages_fetched, 1);
}

#[tokio::test]
async fn test_sink_listener_records_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/x">X</a><a href="/y">Y</a><a href="/x">X again</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/x", r#"<a href="/y">Y</a>"#, 1).await;
    mount_page(&server, "/y", "", 1).await;

    let seed = format!("{}/", base);
    let writer = MemoryLinkWriter::new();
    let store = Arc::new(LinkStore::new(writer.clone(), 1_000, None).unwrap());
    assert!(store.try_add(&seed));

    let listener = SinkListener::new(Arc::clone(&store));
    let crawler = Crawler::new(test_settings(vec![seed.clone()]), Arc::new(listener)).unwrap();

    let summary = run(&crawler).await;

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(store.len(), 3);

    let recorded: HashSet<String> = writer.links().into_iter().collect();
    let expected: HashSet<String> = [seed, format!("{}/x", base), format!("{}/y", base)]
        .into_iter()
        .collect();
    assert_eq!(recorded, expected);
}

#[tokio::test]
async fn test_politeness_delay_applies() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "", 1).await;

    let settings = CrawlSettings {
        threads: 1,
        auto_speed_limit: true,
        ..test_settings(vec![format!("{}/", server.uri())])
    };
    let crawler = Crawler::new(settings, Recorder::knowing(&[])).unwrap();

    let summary = run(&crawler).await;
    assert_eq!(summary.pages_fetched, 1);
    assert!(summary.elapsed >= Duration::from_secs(1));
}
