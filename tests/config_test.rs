//! 設定ファイルテスト

use job_scrape_common::CountPolicy;
use job_scrape_rust::config::Config;
use job_scrape_rust::error::ScrapeError;
use std::path::PathBuf;
use tempfile::tempdir;

/// 明示パスから読み込む（省略項目はデフォルト）
#[test]
fn test_load_explicit_path() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("job-scrape.json");
    std::fs::write(
        &path,
        r#"{
            "geoop": {"username": "ops@example.com", "login_url": "https://app.geoop.com/login", "jobs_url": "https://app.geoop.com/jobs"},
            "output_dir": "downloads",
            "timeouts": {"element_secs": 30},
            "count_policy": "lenient"
        }"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.geoop.username, "ops@example.com");
    assert_eq!(config.output_dir, PathBuf::from("downloads"));
    assert_eq!(config.timeouts.element_secs, 30);
    assert_eq!(config.timeouts.readiness_secs, 20);
    assert_eq!(config.count_policy, CountPolicy::Lenient);
    assert!(config.require_geoop_urls().is_ok());
}

/// 明示パスが存在しなければエラー
#[test]
fn test_load_missing_explicit_path() {
    let err = Config::load(Some(std::path::Path::new("/nonexistent/job-scrape.json"))).unwrap_err();
    assert!(matches!(err, ScrapeError::FileNotFound(_)));
}

/// 不正なJSONは設定エラー
#[test]
fn test_invalid_json_is_config_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ geoop: ").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ScrapeError::Config(ref m) if m.contains("broken.json")));
}

/// テンプレートの書き出し（既存ファイルは --force なしでは上書きしない）
#[test]
fn test_write_template() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");

    Config::write_template(&path, false).unwrap();
    let written = Config::from_file(&path).unwrap();
    assert_eq!(written.geoop.login_url, "https://app.geoop.com/login");
    assert_eq!(written.download.attempts, 3);

    assert!(Config::write_template(&path, false).is_err());
    assert!(Config::write_template(&path, true).is_ok());
}
