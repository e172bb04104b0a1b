use extension_mirror::catalog::{decode_catalog, CatalogEntry};
use extension_mirror::config::MirrorConfig;
use extension_mirror::contract::{MockCatalogSource, MockFetcher};
use extension_mirror::error::{CatalogFetchError, FetchError, GitStep, SyncError};
use extension_mirror::error_log::ErrorLog;
use extension_mirror::layout::DataLayout;
use extension_mirror::synchronise::SyncEngine;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn config(root: &Path) -> MirrorConfig {
    MirrorConfig {
        data_root: root.to_path_buf(),
        ..MirrorConfig::default()
    }
}

fn catalog_of(json: &'static str) -> MockCatalogSource {
    let mut catalog = MockCatalogSource::new();
    catalog
        .expect_fetch_catalog()
        .returning(move || Ok(decode_catalog(json.as_bytes()).unwrap()));
    catalog
}

fn marker(root: &Path, full_name: &str) -> Option<String> {
    fs::read_to_string(DataLayout::new(root).marker_path(full_name)).ok()
}

fn error_lines(root: &Path) -> Vec<(String, String)> {
    ErrorLog::new(DataLayout::new(root).error_log_path())
        .entries()
        .unwrap()
}

const ONE_PLUGIN: &str =
    r#"[{"plugin":"foo","downloadurl":"http://h/foo.zip","lastupdate":"2024-01-01"}]"#;

#[tokio::test]
async fn second_run_with_same_catalog_fetches_nothing() {
    let tmp = tempdir().unwrap();

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .withf(|name, url, version| {
            name == "plugin/foo" && url == "http://h/foo.zip" && version == "2024-01-01"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let engine = SyncEngine::new(&config(tmp.path()), catalog_of(ONE_PLUGIN), fetcher);
    let report = engine.run().await.unwrap();
    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.synced[0].strategy, "archive");
    assert_eq!(marker(tmp.path(), "plugin/foo").as_deref(), Some("2024-01-01"));

    let mut idle = MockFetcher::new();
    idle.expect_download_and_install().never();
    idle.expect_checkout().never();
    let engine = SyncEngine::new(&config(tmp.path()), catalog_of(ONE_PLUGIN), idle);
    let report = engine.run().await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert!(report.synced.is_empty());
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn bumped_version_is_fetched_again() {
    let tmp = tempdir().unwrap();
    let layout = DataLayout::new(tmp.path());
    layout.prepare().unwrap();
    fs::write(layout.marker_path("plugin/foo"), "2023-06-01").unwrap();

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .times(1)
        .returning(|_, _, _| Ok(()));
    let engine = SyncEngine::new(&config(tmp.path()), catalog_of(ONE_PLUGIN), fetcher);
    engine.run().await.unwrap();
    assert_eq!(marker(tmp.path(), "plugin/foo").as_deref(), Some("2024-01-01"));
}

#[tokio::test]
async fn unusable_entries_each_leave_one_error_line() {
    let tmp = tempdir().unwrap();
    let catalog = catalog_of(
        r#"[{"plugin":"widget:foo","downloadurl":"http://h/w.zip","lastupdate":"1"},
            {"plugin":"template:bare","downloadurl":"","lastupdate":"1"}]"#,
    );
    let mut fetcher = MockFetcher::new();
    fetcher.expect_download_and_install().never();
    fetcher.expect_checkout().never();

    let report = SyncEngine::new(&config(tmp.path()), catalog, fetcher)
        .run()
        .await
        .unwrap();

    assert_eq!(report.rejected.len(), 2);
    assert_eq!(
        error_lines(tmp.path()),
        vec![
            ("widget:foo".to_string(), "Unknown type widget".to_string()),
            ("template/bare".to_string(), "no download URL".to_string()),
        ]
    );
    assert!(marker(tmp.path(), "template/bare").is_none());
}

#[tokio::test]
async fn failed_fetch_writes_no_marker_and_run_continues() {
    let tmp = tempdir().unwrap();
    let catalog = catalog_of(
        r#"[{"plugin":"broken","downloadurl":"http://h/broken.zip","lastupdate":"2"},
            {"plugin":"fine","downloadurl":"http://h/fine.zip","lastupdate":"3"}]"#,
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .withf(|name, _, _| name == "plugin/broken")
        .returning(|_, url, _| {
            Err(FetchError::BadResponse {
                url: url.to_string(),
                reason: extension_mirror::error::BadResponseReason::Status(404),
            })
        });
    fetcher
        .expect_download_and_install()
        .withf(|name, _, _| name == "plugin/fine")
        .returning(|_, _, _| Ok(()));

    let report = SyncEngine::new(&config(tmp.path()), catalog, fetcher)
        .run()
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, "plugin/broken");
    assert!(marker(tmp.path(), "plugin/broken").is_none());
    assert_eq!(marker(tmp.path(), "plugin/fine").as_deref(), Some("3"));

    let lines = error_lines(tmp.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, "plugin/broken");
    assert!(lines[0].1.contains("Download failed. Status 404"));
}

#[tokio::test]
async fn checkout_failure_falls_back_to_archive() {
    let tmp = tempdir().unwrap();
    let catalog = catalog_of(
        r#"[{"plugin":"foo","downloadurl":"http://h/foo.zip","lastupdate":"5",
             "sourcerepo":"https://github.com/acme/foo"}]"#,
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_checkout()
        .withf(|name, repo, _| name == "plugin/foo" && repo == "https://github.com/acme/foo.git")
        .times(1)
        .returning(|_, _, _| {
            Err(FetchError::Checkout {
                step: GitStep::Clone,
                detail: "exit status: 128".into(),
            })
        });
    fetcher
        .expect_download_and_install()
        .times(1)
        .returning(|_, _, _| Ok(()));

    let cfg = MirrorConfig {
        prefer_git_checkout: true,
        ..config(tmp.path())
    };
    let report = SyncEngine::new(&cfg, catalog, fetcher).run().await.unwrap();

    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.synced[0].strategy, "archive");
    assert!(error_lines(tmp.path()).is_empty());
    assert_eq!(marker(tmp.path(), "plugin/foo").as_deref(), Some("5"));
}

#[tokio::test]
async fn core_mirror_is_fetched_on_every_run() {
    let tmp = tempdir().unwrap();
    let mut catalog = MockCatalogSource::new();
    catalog
        .expect_fetch_catalog()
        .returning(|| Ok(Vec::<CatalogEntry>::new()));

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .withf(|name, url, version| {
            name == "dokuwiki"
                && url == "https://github.com/dokuwiki/dokuwiki/archive/master.zip"
                && version == "master"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let cfg = MirrorConfig {
        include_core_mirror: true,
        ..config(tmp.path())
    };
    SyncEngine::new(&cfg, catalog, fetcher).run().await.unwrap();
    assert_eq!(marker(tmp.path(), "dokuwiki").as_deref(), Some("master"));

    // The core tracks a branch, so it is fetched on every run.
    let mut catalog = MockCatalogSource::new();
    catalog.expect_fetch_catalog().returning(|| Ok(Vec::new()));
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .times(1)
        .returning(|_, _, _| Ok(()));
    let report = SyncEngine::new(&cfg, catalog, fetcher).run().await.unwrap();
    assert_eq!(report.synced.len(), 1);
}

#[tokio::test]
async fn catalog_failure_aborts_the_run() {
    let tmp = tempdir().unwrap();
    let mut catalog = MockCatalogSource::new();
    catalog.expect_fetch_catalog().returning(|| {
        Err(CatalogFetchError::Status {
            url: "http://catalog".into(),
            status: 503,
        })
    });
    let mut fetcher = MockFetcher::new();
    fetcher.expect_download_and_install().never();

    let err = SyncEngine::new(&config(tmp.path()), catalog, fetcher)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::CatalogFetch(_)));
    assert!(tmp.path().join("meta/plugin").is_dir());
    assert!(tmp.path().join("src/template").is_dir());
}

#[tokio::test]
async fn error_log_only_holds_the_latest_run() {
    let tmp = tempdir().unwrap();
    let layout = DataLayout::new(tmp.path());
    layout.prepare().unwrap();
    fs::write(layout.error_log_path(), "plugin/old\tstale failure\n").unwrap();

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_download_and_install()
        .returning(|_, _, _| Ok(()));
    SyncEngine::new(&config(tmp.path()), catalog_of(ONE_PLUGIN), fetcher)
        .run()
        .await
        .unwrap();
    assert!(error_lines(tmp.path()).is_empty());
}
