//! スクレイピング結果の型定義
//!
//! CLIとテストで共有される型:
//! - SessionCookie: ブラウザのCookieストアから取り出したセッション情報
//! - DetailRecord: ジョブ詳細画面から読み取ったフィールド
//! - AttachmentRow: Notes & Documents タブの1行分の生データ
//! - JobOutcome: 1ジョブ分の処理結果（ログ・分岐用、永続化しない）

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// セッションCookie（ブラウザのCookieストア形式）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub path: String,

    /// 有効期限（UNIX秒）。セッションCookieは None
    #[serde(default, alias = "expiry", skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub secure: bool,
}

/// セッションファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    /// バージョン（互換性チェック用）
    pub version: u32,
    /// 保存日時（RFC 3339）
    #[serde(default)]
    pub saved_at: String,
    pub cookies: Vec<SessionCookie>,
}

impl SessionFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(saved_at: String, cookies: Vec<SessionCookie>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            saved_at,
            cookies,
        }
    }

    /// JSONからパース（バージョン不一致はエラー）
    ///
    /// Cookieの配列だけのファイル（旧形式）も読み込む。
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let file = match serde_json::from_str::<StoredSession>(json)? {
            StoredSession::Versioned(file) => file,
            StoredSession::Bare(cookies) => return Ok(Self::new(String::new(), cookies)),
        };
        if file.version != Self::CURRENT_VERSION {
            return Err(crate::Error::Parse(format!(
                "session file version {} (expected {})",
                file.version,
                Self::CURRENT_VERSION
            )));
        }
        Ok(file)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Versioned(SessionFile),
    Bare(Vec<SessionCookie>),
}

/// ジョブ詳細
///
/// `None` は画面上で要素が見つからなかったこと、`Some("")` は要素はあったが空だったことを表す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub client: Option<String>,
    pub service: Option<String>,
    pub identifier: Option<String>,
    pub visit_date: Option<String>,
}

impl DetailRecord {
    /// 見つからなかったフィールド名
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client.is_none() {
            missing.push("client");
        }
        if self.service.is_none() {
            missing.push("service");
        }
        if self.identifier.is_none() {
            missing.push("identifier");
        }
        if self.visit_date.is_none() {
            missing.push("visit_date");
        }
        missing
    }

    /// 見つかったが空だったフィールド名
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("client", &self.client),
            ("service", &self.service),
            ("identifier", &self.identifier),
            ("visit_date", &self.visit_date),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().is_some_and(|s| s.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

/// Notes & Documents タブの1行（セルの生テキスト・属性）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachmentRow {
    /// 日付セルのテキスト（例: "12 Mar 2024 10:15 am"）
    pub date_text: Option<String>,
    /// サムネイル画像のURL
    pub image_url: Option<String>,
    /// 添付ドキュメントのリンクURL
    pub document_url: Option<String>,
    /// ファイル名セルのテキスト（例: "quote.pdf (120 KB)"）
    pub file_label: Option<String>,
    /// 説明セルのテキスト
    pub description: Option<String>,
}

/// 行の分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    Image { url: String, label: Option<String> },
    Document { url: String, label: Option<String> },
    Text(String),
    Unrecognized,
}

impl AttachmentKind {
    /// 重複判定に使うキー（URLまたはテキストそのもの）
    pub fn source_key(&self) -> Option<&str> {
        match self {
            AttachmentKind::Image { url, .. } | AttachmentKind::Document { url, .. } => Some(url),
            AttachmentKind::Text(text) => Some(text),
            AttachmentKind::Unrecognized => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttachmentKind::Image { .. } => "image",
            AttachmentKind::Document { .. } => "document",
            AttachmentKind::Text(_) => "text",
            AttachmentKind::Unrecognized => "unrecognized",
        }
    }
}

/// 行ごとの処理状態
#[derive(Debug, Clone, PartialEq)]
pub enum RowStatus {
    /// ファイルを書き込んだ
    Written(PathBuf),
    /// 同じジョブ内で既出のソース
    Duplicate,
    /// 画像・ドキュメント・テキストのいずれもない
    Unrecognized,
    /// 取得または書き込みに失敗
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    /// 1始まりの行番号
    pub sequence: usize,
    pub kind: &'static str,
    pub status: RowStatus,
}

/// 1ジョブ分の処理結果
#[derive(Debug, Clone, Default)]
pub struct JobOutcome {
    pub target: String,
    pub detail: DetailRecord,
    pub destination: PathBuf,
    pub rows: Vec<RowResult>,
}

impl JobOutcome {
    /// 書き込んだファイル数
    pub fn downloaded(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.status, RowStatus::Written(_)))
            .count()
    }

    /// 見た行数
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// 重複・分類不能でスキップした行数
    pub fn expected_skips(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.status, RowStatus::Duplicate | RowStatus::Unrecognized))
            .count()
    }

    /// 失敗した行数
    pub fn failed(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.status, RowStatus::Failed(_)))
            .count()
    }
}

/// ダウンロード件数の判定ポリシー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// downloaded == total でなければ失敗（重複・分類不能行も失敗扱い）
    #[default]
    Strict,
    /// 取得・書き込みに失敗した行がなければ成功
    Lenient,
}

impl CountPolicy {
    pub fn accepts(&self, outcome: &JobOutcome) -> bool {
        match self {
            CountPolicy::Strict => outcome.downloaded() == outcome.total(),
            CountPolicy::Lenient => outcome.failed() == 0,
        }
    }
}

impl std::str::FromStr for CountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(CountPolicy::Strict),
            "lenient" => Ok(CountPolicy::Lenient),
            _ => Err(format!("Unknown count policy: {}. Use strict or lenient", s)),
        }
    }
}

impl std::fmt::Display for CountPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountPolicy::Strict => write!(f, "strict"),
            CountPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// ジョブ一覧のリンク
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobLink {
    pub title: String,
    pub href: String,
}
