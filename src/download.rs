//! 添付行の保存
//!
//! 行を順に分類し、画像・ドキュメントは取得して書き込み、テキストはそのまま保存する。
//! 書き込みは `.part` に出してからリネームするので、失敗時に中途半端なファイルは残らない。

use crate::config::DownloadConfig;
use crate::error::{Result, ScrapeError};
use crate::fetch::Fetcher;
use job_scrape_common::{
    classify, destination_dir, job_dir, row_date_label, AttachmentKind, AttachmentRow,
    DetailRecord, FileNamer, JobOutcome, RowResult, RowStatus, SeenSources,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 取得の再試行設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadPolicy {
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl From<&DownloadConfig> for DownloadPolicy {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// 最大 `attempts` 回まで取得を試みる（間隔は固定）
pub async fn fetch_with_retry<F: Fetcher>(fetcher: &F, url: &str, policy: &DownloadPolicy) -> Result<Vec<u8>> {
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match fetcher.fetch(url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                tracing::warn!(url, attempt, attempts, "取得失敗: {}", e);
                last_error = e.to_string();
            }
        }
        if attempt < attempts {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    Err(ScrapeError::Download {
        url: url.to_string(),
        attempts,
        message: last_error,
    })
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// `.part` に書いてからリネームする
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part = part_path(path);
    let written = async {
        tokio::fs::write(&part, bytes).await?;
        tokio::fs::rename(&part, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e.into());
    }
    Ok(())
}

/// 1ジョブ分の添付行を保存する
pub struct Downloader<'a, F: Fetcher> {
    fetcher: &'a F,
    output_root: &'a Path,
    policy: DownloadPolicy,
}

impl<'a, F: Fetcher> Downloader<'a, F> {
    pub fn new(fetcher: &'a F, output_root: &'a Path, policy: DownloadPolicy) -> Self {
        Self {
            fetcher,
            output_root,
            policy,
        }
    }

    /// 全行を処理して結果をまとめる
    ///
    /// 行単位の失敗は `RowStatus::Failed` として記録し、残りの行は続行する。
    pub async fn process(&self, target: &str, detail: &DetailRecord, rows: &[AttachmentRow]) -> JobOutcome {
        let mut seen = SeenSources::new();
        let mut namer = FileNamer::new();
        let mut results = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let sequence = index + 1;
            let kind = classify(row);
            let status = if !seen.first_sighting(&kind) {
                tracing::debug!(sequence, kind = kind.name(), "既出のためスキップ");
                RowStatus::Duplicate
            } else {
                self.save_row(detail, row, &kind, sequence, &mut namer).await
            };

            if let RowStatus::Failed(reason) = &status {
                tracing::warn!(job = target, sequence, "行の保存に失敗: {}", reason);
            }
            results.push(RowResult {
                sequence,
                kind: kind.name(),
                status,
            });
        }

        JobOutcome {
            target: target.to_string(),
            detail: detail.clone(),
            destination: job_dir(self.output_root, detail),
            rows: results,
        }
    }

    async fn save_row(
        &self,
        detail: &DetailRecord,
        row: &AttachmentRow,
        kind: &AttachmentKind,
        sequence: usize,
        namer: &mut FileNamer,
    ) -> RowStatus {
        let date_label = row_date_label(row);
        let dir = destination_dir(self.output_root, detail, &date_label);
        let Some(name) = namer.name_for(&dir, kind, sequence, &date_label) else {
            tracing::debug!(sequence, "画像・ドキュメント・テキストのいずれもない行");
            return RowStatus::Unrecognized;
        };
        let path = dir.join(name);

        let saved = match kind {
            AttachmentKind::Image { url, .. } | AttachmentKind::Document { url, .. } => {
                match fetch_with_retry(self.fetcher, url, &self.policy).await {
                    Ok(bytes) => write_atomic(&path, &bytes).await,
                    Err(e) => Err(e),
                }
            }
            AttachmentKind::Text(text) => write_atomic(&path, text.as_bytes()).await,
            AttachmentKind::Unrecognized => return RowStatus::Unrecognized,
        };

        match saved {
            Ok(()) => {
                tracing::info!(sequence, path = %path.display(), "保存");
                RowStatus::Written(path)
            }
            Err(e) => RowStatus::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/out/1/Acme/photo.jpg")),
            PathBuf::from("/out/1/Acme/photo.jpg.part")
        );
    }

    #[test]
    fn test_policy_from_config() {
        let config = DownloadConfig {
            attempts: 0,
            retry_delay_ms: 10,
        };
        let policy = DownloadPolicy::from(&config);
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.retry_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_part_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b.txt");
        write_atomic(&path, b"hello").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert!(!part_path(&path).exists());
    }
}
