//! 添付行の分類と保存先の決定
//!
//! ## 処理フロー
//! 1. 行を画像 / ドキュメント / テキスト / 分類不能に分類
//! 2. 同じジョブ内で既出のソース（URL・テキスト）を除外
//! 3. ジョブ詳細から保存先ディレクトリを決定
//! 4. ファイル名ラベルまたは連番からファイル名を決定

use crate::parser::{parse_row_date_label, UNKNOWN_DATE};
use crate::sanitize::{clean_file_label, extension_from_url, file_extension, sanitize_path_component};
use crate::types::{AttachmentKind, AttachmentRow, DetailRecord};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// ジョブ番号が取れなかった場合のディレクトリ名
pub const MISSING_IDENTIFIER: &str = "no-id";

/// クライアント名が取れなかった場合のディレクトリ名
pub const MISSING_CLIENT: &str = "unknown-client";

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// 行を分類する
///
/// 優先順位: 画像URL → ドキュメントURL → 説明テキスト
pub fn classify(row: &AttachmentRow) -> AttachmentKind {
    let label = non_blank(&row.file_label).map(str::to_string);

    if let Some(url) = non_blank(&row.image_url) {
        return AttachmentKind::Image { url: url.to_string(), label };
    }
    if let Some(url) = non_blank(&row.document_url) {
        return AttachmentKind::Document { url: url.to_string(), label };
    }
    // テキストは前後の空白を含めてそのまま保存する
    match row.description.as_deref() {
        Some(text) if !text.trim().is_empty() => AttachmentKind::Text(text.to_string()),
        _ => AttachmentKind::Unrecognized,
    }
}

/// 行の日付ラベル（サニタイズ済み、取れなければ `UnknownDate`）
pub fn row_date_label(row: &AttachmentRow) -> String {
    let label = row
        .date_text
        .as_deref()
        .map(parse_row_date_label)
        .map(|s| sanitize_path_component(&s))
        .unwrap_or_default();
    if label.is_empty() {
        UNKNOWN_DATE.to_string()
    } else {
        label
    }
}

/// ジョブ内で既出のソースを記録する
#[derive(Debug, Default)]
pub struct SeenSources {
    seen: HashSet<String>,
}

impl SeenSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初出なら true（記録する）、既出なら false
    ///
    /// 分類不能な行はキーを持たないので常に true
    pub fn first_sighting(&mut self, kind: &AttachmentKind) -> bool {
        match kind.source_key() {
            Some(key) => self.seen.insert(key.to_string()),
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn component_or(value: &Option<String>, fallback: &str) -> String {
    let sanitized = value
        .as_deref()
        .map(sanitize_path_component)
        .unwrap_or_default();
    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}

/// ジョブの保存先ディレクトリ `<root>/<番号>/<クライアント>`
pub fn job_dir(root: &Path, detail: &DetailRecord) -> PathBuf {
    root.join(component_or(&detail.identifier, MISSING_IDENTIFIER))
        .join(component_or(&detail.client, MISSING_CLIENT))
}

/// 行の保存先ディレクトリ `<root>/<番号>/<クライアント>/<日付ラベル>`
///
/// 日付ラベルは訪問日を優先し、なければ行の日付ラベルを使う
pub fn destination_dir(root: &Path, detail: &DetailRecord, row_date_label: &str) -> PathBuf {
    let visit = detail
        .visit_date
        .as_deref()
        .map(sanitize_path_component)
        .unwrap_or_default();
    let date_label = if !visit.is_empty() {
        visit
    } else if !row_date_label.is_empty() {
        row_date_label.to_string()
    } else {
        UNKNOWN_DATE.to_string()
    };
    job_dir(root, detail).join(date_label)
}

/// ジョブ内のファイル名を決める（重複しないよう連番を付ける）
#[derive(Debug, Default)]
pub struct FileNamer {
    used: HashSet<PathBuf>,
}

impl FileNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分類結果からファイル名を決める（分類不能なら None）
    pub fn name_for(
        &mut self,
        dir: &Path,
        kind: &AttachmentKind,
        sequence: usize,
        row_date_label: &str,
    ) -> Option<String> {
        let name = base_name(kind, sequence, row_date_label)?;
        let mut candidate = name.clone();
        let mut suffix = sequence;
        while self.used.contains(&dir.join(&candidate)) {
            candidate = with_suffix(&name, suffix);
            suffix += 1;
        }
        self.used.insert(dir.join(&candidate));
        Some(candidate)
    }
}

fn base_name(kind: &AttachmentKind, sequence: usize, row_date_label: &str) -> Option<String> {
    match kind {
        AttachmentKind::Image { url, label } => Some(binary_name(url, label, "image", "jpg", sequence)),
        AttachmentKind::Document { url, label } => {
            Some(binary_name(url, label, "document", "bin", sequence))
        }
        AttachmentKind::Text(_) => Some(format!("{}_{}.txt", row_date_label, sequence)),
        AttachmentKind::Unrecognized => None,
    }
}

fn binary_name(
    url: &str,
    label: &Option<String>,
    prefix: &str,
    default_ext: &str,
    sequence: usize,
) -> String {
    let ext = extension_from_url(url).unwrap_or_else(|| default_ext.to_string());
    match label.as_deref().and_then(clean_file_label) {
        Some(name) if file_extension(&name).is_some() => name,
        Some(name) => format!("{}.{}", name, ext),
        None => format!("{}_{}.{}", prefix, sequence, ext),
    }
}

fn with_suffix(name: &str, sequence: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, sequence, ext),
        _ => format!("{}_{}", name, sequence),
    }
}
