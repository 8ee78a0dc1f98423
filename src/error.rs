use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("認証情報が設定されていません: {0}。設定ファイルまたは環境変数で指定してください")]
    MissingCredentials(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("要素が見つかりません: {locator} ({timeout:?} 待機)")]
    ElementNotFound { locator: String, timeout: Duration },

    #[error("ページの描画完了を確認できません: {0}")]
    NotReady(String),

    #[error("ブラウザ操作エラー: {0}")]
    Browser(String),

    #[error("ページ遷移エラー: {0}")]
    Navigation(String),

    #[error("ページ構造が想定と異なります: {0}")]
    PageStructure(String),

    #[error("ダウンロード失敗 ({attempts}回試行): {url}: {message}")]
    Download {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error(transparent)]
    Common(#[from] job_scrape_common::Error),
}

impl ScrapeError {
    /// 要素待機のタイムアウトか
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::ElementNotFound { .. })
    }

    pub fn not_found(locator: impl Into<String>, timeout: Duration) -> Self {
        ScrapeError::ElementNotFound {
            locator: locator.into(),
            timeout,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
