//! エラーケーステスト
//!
//! エラー型の表示と変換を検証

use job_scrape_rust::error::ScrapeError;
use std::time::Duration;

/// ScrapeErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ScrapeError::Config("テスト設定エラー".to_string()),
        ScrapeError::MissingCredentials("GeoOp のパスワード".to_string()),
        ScrapeError::FileNotFound("targets.txt".to_string()),
        ScrapeError::not_found("job id", Duration::from_secs(15)),
        ScrapeError::NotReady("20s".to_string()),
        ScrapeError::Browser("タブが閉じられました".to_string()),
        ScrapeError::Navigation("https://app.geoop.com/jobs/1".to_string()),
        ScrapeError::PageStructure("ノート行が見つかりません".to_string()),
        ScrapeError::Download {
            url: "https://files.geoop.com/a.jpg".to_string(),
            attempts: 3,
            message: "HTTP 503".to_string(),
        },
        ScrapeError::Prompt("中断".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 要素タイムアウトのメッセージと判定
#[test]
fn test_element_not_found() {
    let err = ScrapeError::not_found("visit date", Duration::from_secs(15));
    let display = format!("{}", err);

    assert!(display.contains("visit date"));
    assert!(display.contains("15s"));
    assert!(err.is_not_found());
    assert!(!ScrapeError::Browser("x".into()).is_not_found());
}

/// ダウンロード失敗のメッセージ
#[test]
fn test_download_message() {
    let err = ScrapeError::Download {
        url: "https://files.geoop.com/a.jpg".to_string(),
        attempts: 3,
        message: "HTTP 503".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("3回"));
    assert!(display.contains("https://files.geoop.com/a.jpg"));
}

/// 認証情報不足のメッセージ
#[test]
fn test_missing_credentials_message() {
    let display = format!("{}", ScrapeError::MissingCredentials("GeoOp のパスワード".into()));
    assert!(display.contains("GeoOp のパスワード"));
    assert!(display.contains("環境変数"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: ScrapeError = io_err.into();

    assert!(matches!(err, ScrapeError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: ScrapeError = json_err.into();

    assert!(matches!(err, ScrapeError::JsonParse(_)));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_conversion() {
    let common_err = job_scrape_common::Error::Parse("session file version 2 (expected 1)".to_string());
    let err: ScrapeError = common_err.into();

    assert!(matches!(err, ScrapeError::Common(_)));
    assert!(format!("{}", err).contains("session file version 2"));
}
