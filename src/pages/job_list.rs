//! ジョブ一覧画面（ページ送りあり）

use crate::browser::{optional, settle, wait_for, wait_for_all, Browser, Condition, Locator};
use crate::error::Result;
use job_scrape_common::JobLink;
use std::collections::HashSet;
use std::time::Duration;

pub const JOB_LINKS: Locator = Locator::xpath("job links", "//a[contains(@class, 'job-column-link')]");
pub const NEXT_PAGE: Locator = Locator::xpath("next page button", "//button[@aria-label='Go to next page']");

pub struct JobListPage<'a, B: Browser> {
    browser: &'a B,
    timeout: Duration,
    pagination_timeout: Duration,
    readiness_timeout: Duration,
}

impl<'a, B: Browser> JobListPage<'a, B> {
    pub fn new(browser: &'a B, timeout: Duration, pagination_timeout: Duration, readiness_timeout: Duration) -> Self {
        Self {
            browser,
            timeout,
            pagination_timeout,
            readiness_timeout,
        }
    }

    /// 現在のページのジョブリンク（なければ空）
    pub async fn jobs(&self) -> Result<Vec<JobLink>> {
        let links = optional(wait_for_all(self.browser, None, &JOB_LINKS, Condition::Present, self.timeout).await)?
            .unwrap_or_default();
        Ok(links
            .iter()
            .filter(|link| link.snapshot.visible)
            .filter_map(|link| {
                link.attr("href").map(|href| JobLink {
                    title: link.text().trim().to_string(),
                    href: href.to_string(),
                })
            })
            .collect())
    }

    /// 次ページへ進む（押せなかった場合は失敗理由を問わず false）
    pub async fn go_to_next_page(&self) -> bool {
        let clicked = async {
            let button =
                wait_for(self.browser, None, &NEXT_PAGE, Condition::Clickable, self.pagination_timeout).await?;
            self.browser.click(&button.reference).await
        }
        .await;

        match clicked {
            Ok(()) => {
                settle(self.browser, self.readiness_timeout, "next page").await;
                true
            }
            Err(e) => {
                tracing::debug!("次ページなし: {}", e);
                false
            }
        }
    }

    /// 全ページのジョブリンクを集める
    ///
    /// 新しいリンクが増えないページに達した場合も打ち切る。
    pub async fn collect_all(&self, max_pages: usize) -> Result<Vec<JobLink>> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        let max_pages = max_pages.max(1);
        for page in 1..=max_pages {
            let before = all.len();
            for link in self.jobs().await? {
                if seen.insert(link.href.clone()) {
                    all.push(link);
                }
            }
            tracing::info!(page, found = all.len() - before, "job list page");

            if all.len() == before && page > 1 {
                break;
            }
            if page == max_pages || !self.go_to_next_page().await {
                break;
            }
        }

        Ok(all)
    }
}
