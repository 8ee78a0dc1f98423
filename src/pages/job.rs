//! ジョブ詳細画面

use crate::browser::{optional, wait_for, Browser, Condition, Locator};
use crate::error::Result;
use job_scrape_common::{
    extract_identifier, parse_client_name, parse_service_title, parse_visit_date, DetailRecord,
};
use std::time::Duration;

pub const CLIENT_NAME: Locator = Locator::xpath("client name", "//a[@id='job_client_link']");
pub const JOB_TITLE: Locator = Locator::xpath(
    "job title",
    "//div[contains(@class, 'job-edit-details-limit') and contains(., 'Job Title:')]",
);
pub const JOB_ID: Locator = Locator::xpath("job id", "//span[@data-ng-show='job.id']");
pub const VISIT_DATE: Locator = Locator::xpath("visit date", "//div[@data-ng-hide='visits | isEmpty']");
pub const NOTES_TAB: Locator = Locator::xpath("notes & documents tab", "//li[@id='noteslink']/a");

pub struct JobPage<'a, B: Browser> {
    browser: &'a B,
    timeout: Duration,
}

impl<'a, B: Browser> JobPage<'a, B> {
    pub fn new(browser: &'a B, timeout: Duration) -> Self {
        Self { browser, timeout }
    }

    async fn field_text(&self, locator: &Locator, condition: Condition) -> Result<Option<String>> {
        let element = optional(wait_for(self.browser, None, locator, condition, self.timeout).await)?;
        Ok(element.map(|e| e.text().to_string()))
    }

    pub async fn client_name(&self) -> Result<Option<String>> {
        Ok(self
            .field_text(&CLIENT_NAME, Condition::Present)
            .await?
            .map(|t| parse_client_name(&t)))
    }

    pub async fn service_name(&self) -> Result<Option<String>> {
        Ok(self
            .field_text(&JOB_TITLE, Condition::Present)
            .await?
            .map(|t| parse_service_title(&t)))
    }

    /// ジョブ番号（要素はあるが `#` トークンがない場合は空文字）
    pub async fn identifier(&self) -> Result<Option<String>> {
        Ok(self
            .field_text(&JOB_ID, Condition::Visible)
            .await?
            .map(|t| extract_identifier(&t).unwrap_or_default()))
    }

    pub async fn visit_date(&self) -> Result<Option<String>> {
        Ok(self
            .field_text(&VISIT_DATE, Condition::Visible)
            .await?
            .map(|t| parse_visit_date(&t)))
    }

    /// 4項目をまとめて読み取る
    pub async fn detail(&self) -> Result<DetailRecord> {
        let detail = DetailRecord {
            client: self.client_name().await?,
            service: self.service_name().await?,
            identifier: self.identifier().await?,
            visit_date: self.visit_date().await?,
        };
        let missing = detail.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "ジョブ詳細の一部が見つかりません");
        }
        let blank = detail.blank_fields();
        if !blank.is_empty() {
            tracing::debug!(?blank, "ジョブ詳細の一部が空です");
        }
        Ok(detail)
    }

    /// Notes & Documents タブへ切り替える
    pub async fn go_to_notes_documents(&self) -> Result<()> {
        let tab = wait_for(self.browser, None, &NOTES_TAB, Condition::Clickable, self.timeout).await?;
        self.browser.click(&tab.reference).await
    }
}
