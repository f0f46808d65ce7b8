//! End-to-end tests for the discovery → post → comment pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hn_archiver::error::{AppError, Result};
use hn_archiver::models::Config;
use hn_archiver::pipeline::{CrawlContext, PollMode, discover, run_archiver};
use hn_archiver::services::HttpFetcher;
use hn_archiver::storage::{LocalStorage, SnapshotStorage};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer, root: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/", server.uri());
    config.archive.root_dir = root.to_path_buf();
    config.crawler.timeout_secs = 2;
    config.crawler.post_workers = 2;
    config.crawler.comment_workers = 3;
    config.crawler.queue_capacity = 8;
    config
}

fn context(config: Config) -> CrawlContext {
    CrawlContext::from_config(config).expect("context")
}

fn html_page(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
}

/// Front page listing `(target, title, thread id)` rows.
fn front_page(stories: &[(&str, &str, u32)]) -> String {
    let rows: String = stories
        .iter()
        .map(|(href, title, id)| {
            format!(
                r#"<tr class="athing"><td class="title"><a href="{href}" class="storylink">{title}</a></td></tr>
                   <tr><td class="subtext"><a href="user?id=poster">poster</a> |
                   <a href="item?id={id}">discuss</a></td></tr>"#
            )
        })
        .collect();
    html_page("Front Page", &format!("<table>{rows}</table>"))
}

/// Discussion page with one comment per link, each followed by a reply link.
fn discussion(links: &[String]) -> String {
    let rows: String = links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            format!(
                r#"<tr><td><span class="c00">Worth reading: <a href="{link}">{link}</a></span></td></tr>
                   <tr><td><span class="c00"><a href="reply?id={i}">reply</a></span></td></tr>"#
            )
        })
        .collect();
    html_page("Discussion", &format!("<table>{rows}</table>"))
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_thread(server: &MockServer, id: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn sorted_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn archives_posts_and_comment_pages() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[
            (format!("{uri}/story-a").as_str(), "Story A", 101),
            (format!("{uri}/story-b").as_str(), "Story B", 102),
        ]),
    )
    .await;
    mount_html(&server, "/story-a", html_page("Story A", "a")).await;
    mount_html(&server, "/story-b", html_page("Story B", "b")).await;
    mount_thread(&server, "101", discussion(&[]), 1).await;

    let links: Vec<String> = (1..=3).map(|n| format!("{uri}/linked/{n}")).collect();
    mount_thread(&server, "102", discussion(&links), 1).await;
    for n in 1..=3 {
        mount_html(
            &server,
            &format!("/linked/{n}"),
            html_page(format!("Linked page {n}").as_str(), "content"),
        )
        .await;
    }

    let stats = run_archiver(context(test_config(&server, tmp.path())), PollMode::Once)
        .await
        .unwrap();

    assert_eq!(
        sorted_entries(tmp.path()),
        vec!["101_Story-A", "102_Story-B"]
    );
    assert_eq!(
        sorted_entries(&tmp.path().join("101_Story-A")),
        vec!["101_Story-A.html"]
    );
    assert_eq!(
        sorted_entries(&tmp.path().join("102_Story-B")),
        vec![
            "102_Story-B.html",
            "Linked-page-1.html",
            "Linked-page-2.html",
            "Linked-page-3.html",
        ]
    );

    let saved = std::fs::read_to_string(tmp.path().join("102_Story-B/Linked-page-2.html")).unwrap();
    assert!(saved.contains("Linked page 2"));

    assert_eq!(stats.posts_enqueued, 2);
    assert_eq!(stats.posts_done, 2);
    assert_eq!(stats.comments_enqueued, 3);
    assert_eq!(stats.comment_pages_saved, 3);
    assert_eq!(stats.cycles, 1);
}

#[tokio::test]
async fn existing_folder_is_never_recrawled() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    std::fs::create_dir_all(tmp.path().join("101_Story-A")).unwrap();

    mount_html(
        &server,
        "/",
        front_page(&[
            (format!("{uri}/story-a").as_str(), "Story A", 101),
            (format!("{uri}/story-b").as_str(), "Story B", 102),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/story-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("New A", "")))
        .expect(0)
        .mount(&server)
        .await;
    mount_thread(&server, "101", discussion(&[]), 0).await;
    mount_html(&server, "/story-b", html_page("Story B", "b")).await;
    mount_thread(&server, "102", discussion(&[]), 1).await;

    let stats = run_archiver(context(test_config(&server, tmp.path())), PollMode::Once)
        .await
        .unwrap();

    assert_eq!(stats.posts_enqueued, 1);
    assert!(sorted_entries(&tmp.path().join("101_Story-A")).is_empty());
    assert_eq!(
        sorted_entries(&tmp.path().join("102_Story-B")),
        vec!["102_Story-B.html"]
    );
}

#[tokio::test]
async fn discovery_filters_ignored_and_invalid_targets() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[
            (format!("{uri}/paper.pdf").as_str(), "A paper", 1),
            ("ftp://files.example.com/x", "Old school", 2),
            (format!("{uri}/fine").as_str(), "Fine", 3),
        ]),
    )
    .await;

    let ctx = context(test_config(&server, tmp.path()));
    let posts = discover(&ctx).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Fine");
    assert_eq!(posts[0].folder_path, tmp.path().join("3_Fine"));
}

#[tokio::test]
async fn front_page_mismatch_skips_the_cycle() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let broken = html_page(
        "Front Page",
        r#"<table>
            <tr><td><a class="storylink" href="https://example.com/a">A</a></td></tr>
            <tr><td><a class="storylink" href="https://example.com/b">B</a></td></tr>
            <tr><td class="subtext"><a href="item?id=1">discuss</a></td></tr>
        </table>"#,
    );
    mount_html(&server, "/", broken).await;

    let ctx = context(test_config(&server, tmp.path()));
    assert!(matches!(
        discover(&ctx).await,
        Err(AppError::ParseMismatch {
            stories: 2,
            subtexts: 1
        })
    ));

    let stats = run_archiver(ctx, PollMode::Once).await.unwrap();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.cycle_failures, 1);
    assert!(sorted_entries(tmp.path()).is_empty());
}

#[tokio::test]
async fn slow_comment_page_does_not_stop_the_pool() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[(format!("{uri}/story").as_str(), "Story", 7)]),
    )
    .await;
    mount_html(&server, "/story", html_page("Story", "")).await;

    let links = vec![
        format!("{uri}/slow"),
        format!("{uri}/fast-1"),
        format!("{uri}/fast-2"),
    ];
    mount_thread(&server, "7", discussion(&links), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", ""))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/fast-1", html_page("Fast one", "")).await;
    mount_html(&server, "/fast-2", html_page("Fast two", "")).await;

    let mut config = test_config(&server, tmp.path());
    config.crawler.timeout_secs = 1;
    config.crawler.comment_workers = 1;

    let stats = run_archiver(context(config), PollMode::Once).await.unwrap();

    assert_eq!(
        sorted_entries(&tmp.path().join("7_Story")),
        vec!["7_Story.html", "Fast-one.html", "Fast-two.html"]
    );
    assert_eq!(stats.comments_done, 3);
    assert_eq!(stats.fetch_failed, 1);
}

#[tokio::test]
async fn untitled_comment_page_is_skipped() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[(format!("{uri}/story").as_str(), "Story", 8)]),
    )
    .await;
    mount_html(&server, "/story", html_page("Story", "")).await;
    mount_thread(
        &server,
        "8",
        discussion(&[format!("{uri}/untitled"), format!("{uri}/titled")]),
        1,
    )
    .await;
    mount_html(
        &server,
        "/untitled",
        "<html><body>no title</body></html>".to_string(),
    )
    .await;
    mount_html(&server, "/titled", html_page("Has a title", "")).await;

    let stats = run_archiver(context(test_config(&server, tmp.path())), PollMode::Once)
        .await
        .unwrap();

    assert_eq!(
        sorted_entries(&tmp.path().join("8_Story")),
        vec!["8_Story.html", "Has-a-title.html"]
    );
    assert_eq!(stats.comments_done, 2);
    assert_eq!(stats.comment_pages_saved, 1);
}

/// Local storage that refuses to create one particular folder.
struct FailingStorage {
    inner: LocalStorage,
    poisoned: PathBuf,
}

#[async_trait]
impl SnapshotStorage for FailingStorage {
    async fn folder_exists(&self, folder: &Path) -> Result<bool> {
        self.inner.folder_exists(folder).await
    }

    async fn ensure_folder(&self, folder: &Path) -> Result<()> {
        if folder == self.poisoned {
            return Err(AppError::storage(
                folder,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        self.inner.ensure_folder(folder).await
    }

    async fn write_page(&self, path: &Path, content: &str) -> Result<()> {
        self.inner.write_page(path, content).await
    }
}

#[tokio::test]
async fn storage_error_aborts_only_that_post() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[
            (format!("{uri}/story-a").as_str(), "Story A", 201),
            (format!("{uri}/story-b").as_str(), "Story B", 202),
        ]),
    )
    .await;
    mount_html(&server, "/story-a", html_page("Story A", "")).await;
    mount_html(&server, "/story-b", html_page("Story B", "")).await;
    mount_thread(&server, "201", discussion(&[]), 1).await;
    mount_thread(&server, "202", discussion(&[]), 1).await;

    let config = test_config(&server, tmp.path());
    let storage = FailingStorage {
        inner: LocalStorage::new(tmp.path()),
        poisoned: tmp.path().join("201_Story-A"),
    };
    let ctx = CrawlContext::new(
        Arc::new(config.clone()),
        Arc::new(HttpFetcher::new(&config).unwrap()),
        Arc::new(storage),
    );

    let stats = run_archiver(ctx, PollMode::Once).await.unwrap();

    assert_eq!(stats.posts_done, 2);
    assert_eq!(stats.storage_errors, 1);
    assert_eq!(sorted_entries(tmp.path()), vec!["202_Story-B"]);
}

#[tokio::test]
async fn shutdown_stops_the_poller() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_html(&server, "/", front_page(&[])).await;

    let ctx = context(test_config(&server, tmp.path()));
    let token = ctx.shutdown.clone();
    let handle = tokio::spawn(run_archiver(ctx, PollMode::Forever));

    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("archiver did not shut down")
        .unwrap()
        .unwrap();
    assert!(stats.cycles >= 1);
}

#[tokio::test]
async fn clean_once_runs_always_succeed() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_html(&server, "/", front_page(&[])).await;

    for run in 0..30 {
        let mut config = test_config(&server, tmp.path());
        config.crawler.post_workers = 4;
        config.crawler.comment_workers = 4;

        let result = run_archiver(context(config), PollMode::Once).await;
        assert!(result.is_ok(), "run {run} failed: {result:?}");
    }
}

#[tokio::test]
async fn slow_post_is_not_queued_again_by_the_next_cycle() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    mount_html(
        &server,
        "/",
        front_page(&[(format!("{uri}/story").as_str(), "Story", 9)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Story", ""))
                .set_delay(Duration::from_millis(2500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_thread(&server, "9", discussion(&[]), 1).await;

    let mut config = test_config(&server, tmp.path());
    config.crawler.poll_interval_secs = 1;
    config.crawler.timeout_secs = 5;
    config.crawler.post_workers = 1;

    let ctx = context(config);
    let token = ctx.shutdown.clone();
    let handle = tokio::spawn(run_archiver(ctx, PollMode::Forever));

    tokio::time::sleep(Duration::from_millis(1800)).await;
    token.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("archiver did not shut down")
        .unwrap()
        .unwrap();

    assert!(stats.cycles >= 2);
    assert_eq!(stats.posts_enqueued, 1);
    assert_eq!(stats.post_snapshots_saved, 1);
    assert_eq!(
        sorted_entries(&tmp.path().join("9_Story")),
        vec!["9_Story.html"]
    );
}

#[tokio::test]
async fn revisit_mode_refreshes_an_archived_post() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let uri = server.uri();

    let folder = tmp.path().join("101_Story-A");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("101_Story-A.html"), "old snapshot").unwrap();
    std::fs::write(folder.join("Earlier-page.html"), "kept").unwrap();

    mount_html(
        &server,
        "/",
        front_page(&[(format!("{uri}/story-a").as_str(), "Story A", 101)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/story-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Story A", "fresh")))
        .expect(1)
        .mount(&server)
        .await;
    mount_thread(&server, "101", discussion(&[format!("{uri}/new-link")]), 1).await;
    mount_html(&server, "/new-link", html_page("New comment page", "")).await;

    let mut config = test_config(&server, tmp.path());
    config.archive.revisit_archived = true;

    let stats = run_archiver(context(config), PollMode::Once).await.unwrap();

    assert_eq!(stats.posts_enqueued, 1);
    assert_eq!(stats.post_snapshots_saved, 1);
    assert_eq!(stats.comment_pages_saved, 1);
    assert_eq!(
        sorted_entries(&folder),
        vec!["101_Story-A.html", "Earlier-page.html", "New-comment-page.html"]
    );
    let snapshot = std::fs::read_to_string(folder.join("101_Story-A.html")).unwrap();
    assert!(snapshot.contains("fresh"));
}
