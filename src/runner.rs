//! ジョブの逐次処理
//!
//! ## 処理フロー（1ジョブ）
//! 1. ジョブURLを開いて描画完了を待つ
//! 2. 詳細（クライアント・サービス・番号・訪問日）を読む
//! 3. Notes & Documents タブに切り替え、最下部までスクロール
//! 4. 行を読み取り、添付ファイルを保存
//! 5. 件数が合わなければ失敗ログに追記

use crate::browser::{settle, Browser};
use crate::config::Config;
use crate::download::{DownloadPolicy, Downloader};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::pages::{CrmPage, JobPage, NotesDocumentsPage};
use indicatif::{ProgressBar, ProgressStyle};
use job_scrape_common::{parse_target_lines, CountPolicy, JobOutcome};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 失敗したジョブURLの記録（1行1URL、追記）
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, target: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", target)?;
        Ok(())
    }

    /// 記録済みのURL（重複は除く、ファイルがなければ空）
    pub fn read(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(parse_target_lines(&content))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// 件数を判定し、不一致なら失敗ログに追記する（成功なら true）
pub fn record_outcome(outcome: &JobOutcome, policy: CountPolicy, log: &FailureLog) -> Result<bool> {
    if policy.accepts(outcome) {
        return Ok(true);
    }
    tracing::warn!(
        job = %outcome.target,
        downloaded = outcome.downloaded(),
        total = outcome.total(),
        duplicates_or_empty = outcome.expected_skips(),
        failed = outcome.failed(),
        %policy,
        "件数不一致"
    );
    log.append(&outcome.target)?;
    Ok(false)
}

/// 実行結果のまとめ
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub files_written: usize,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed.len()
    }
}

/// ジョブを1件ずつ処理する
pub struct Scraper<'a, B: Browser, F: Fetcher> {
    browser: &'a B,
    fetcher: &'a F,
    config: &'a Config,
    show_progress: bool,
}

impl<'a, B: Browser, F: Fetcher> Scraper<'a, B, F> {
    pub fn new(browser: &'a B, fetcher: &'a F, config: &'a Config) -> Self {
        Self {
            browser,
            fetcher,
            config,
            show_progress: true,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// ジョブ一覧を開く（ログイン後の初期画面）
    pub async fn open_job_list(&self) -> Result<()> {
        self.browser.goto(&self.config.geoop.jobs_url).await?;
        settle(self.browser, self.config.timeouts.readiness(), "job list").await;
        Ok(())
    }

    /// 1ジョブを処理する
    pub async fn process_target(&self, target: &str) -> Result<JobOutcome> {
        let timeouts = &self.config.timeouts;

        self.browser.goto(target).await?;
        settle(self.browser, timeouts.readiness(), "job page").await;

        let job_page = JobPage::new(self.browser, timeouts.element());
        let detail = job_page.detail().await?;
        tracing::info!(
            client = detail.client.as_deref().unwrap_or(""),
            service = detail.service.as_deref().unwrap_or(""),
            identifier = detail.identifier.as_deref().unwrap_or(""),
            "ジョブ詳細"
        );

        job_page.go_to_notes_documents().await?;
        settle(self.browser, timeouts.readiness(), "notes tab").await;

        let notes = NotesDocumentsPage::new(self.browser, timeouts.element());
        notes.scroll_to_bottom().await?;
        if !notes.wait_for_thumbnails().await? {
            tracing::info!(job = target, "サムネイル画像なし");
        }
        let rows = notes.rows().await?;

        let downloader = Downloader::new(
            self.fetcher,
            &self.config.output_dir,
            DownloadPolicy::from(&self.config.download),
        );
        Ok(downloader.process(target, &detail, &rows).await)
    }

    /// 全ターゲットを順に処理する
    ///
    /// 失敗したターゲットは失敗ログに追記して次へ進む。
    pub async fn run(&self, targets: &[String], log: &FailureLog) -> Result<RunSummary> {
        let progress = self.progress_bar(targets.len());
        let mut summary = RunSummary::default();

        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.throttle()).await;
            }
            progress.set_message(target.clone());

            let succeeded = match self.process_target(target).await {
                Ok(outcome) => {
                    summary.files_written += outcome.downloaded();
                    progress.println(format!(
                        "  {} {} ({}/{})",
                        if self.config.count_policy.accepts(&outcome) { "✔" } else { "✘" },
                        target,
                        outcome.downloaded(),
                        outcome.total()
                    ));
                    record_outcome(&outcome, self.config.count_policy, log).unwrap_or_else(|e| {
                        tracing::error!(job = %target, "失敗ログに書き込めません: {}", e);
                        false
                    })
                }
                Err(e) => {
                    tracing::error!(job = %target, "ジョブ処理エラー: {}", e);
                    progress.println(format!("  ✘ {} ({})", target, e));
                    if let Err(e) = log.append(target) {
                        tracing::error!(job = %target, "失敗ログに書き込めません: {}", e);
                    }
                    false
                }
            };

            summary.processed += 1;
            if !succeeded {
                summary.failed.push(target.clone());
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

/// CRM検索の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLookup {
    pub company: String,
    pub parent: Option<String>,
}

/// 取引先ごとに親会社を調べる
///
/// 1社の失敗は警告して `parent: None` とし、残りを続ける。
pub async fn lookup_parents<B: Browser>(browser: &B, config: &Config, companies: &[String]) -> Result<Vec<ParentLookup>> {
    let timeout = Duration::from_secs(config.zoho.search_timeout_secs);
    let crm = CrmPage::new(browser, timeout);
    let mut results = Vec::with_capacity(companies.len());

    for company in companies {
        browser.goto(&config.zoho.accounts_url).await?;
        settle(browser, config.timeouts.readiness(), "crm accounts").await;

        let parent = match crm.lookup_parent(company).await {
            Ok(parent) => parent,
            Err(e) => {
                tracing::warn!(company = %company, "CRM検索失敗: {}", e);
                None
            }
        };
        println!("  {} → {}", company, parent.as_deref().unwrap_or("(なし)"));
        results.push(ParentLookup {
            company: company.clone(),
            parent,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_scrape_common::{RowResult, RowStatus};
    use tempfile::tempdir;

    fn outcome(statuses: Vec<RowStatus>) -> JobOutcome {
        JobOutcome {
            target: "https://app.geoop.com/jobs/42".to_string(),
            rows: statuses
                .into_iter()
                .enumerate()
                .map(|(i, status)| RowResult {
                    sequence: i + 1,
                    kind: "image",
                    status,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_log_append_read_clear() {
        let dir = tempdir().unwrap();
        let log = FailureLog::new(dir.path().join("failed_urls.csv"));
        assert!(log.read().unwrap().is_empty());

        log.append("https://a").unwrap();
        log.append("https://b").unwrap();
        log.append("https://a").unwrap();
        assert_eq!(log.read().unwrap(), vec!["https://a", "https://b"]);

        log.clear().unwrap();
        assert!(!log.path().exists());
        log.clear().unwrap();
    }

    #[test]
    fn test_record_outcome_by_policy() {
        let dir = tempdir().unwrap();
        let log = FailureLog::new(dir.path().join("failed.csv"));
        let with_duplicate = outcome(vec![
            RowStatus::Written(PathBuf::from("a.jpg")),
            RowStatus::Duplicate,
        ]);

        assert!(record_outcome(&with_duplicate, CountPolicy::Lenient, &log).unwrap());
        assert!(log.read().unwrap().is_empty());

        assert!(!record_outcome(&with_duplicate, CountPolicy::Strict, &log).unwrap());
        assert_eq!(log.read().unwrap(), vec!["https://app.geoop.com/jobs/42"]);
    }

    #[test]
    fn test_summary_succeeded() {
        let summary = RunSummary {
            processed: 3,
            files_written: 7,
            failed: vec!["x".into()],
        };
        assert_eq!(summary.succeeded(), 2);
    }
}
