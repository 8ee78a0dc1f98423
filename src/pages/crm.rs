//! Zoho CRM の取引先検索

use crate::browser::{optional, settle, wait_for, Browser, Condition, Locator};
use crate::error::Result;
use std::time::Duration;

pub const SEARCH_BOX: Locator = Locator::xpath("crm search box", "//input[@placeholder='Search']");
pub const COMPANY_LINK: Locator = Locator::xpath(
    "crm company link",
    "//a[contains(@href, '/tab/Accounts/custom-view')]",
);
pub const PARENT_ACCOUNT: Locator = Locator::xpath(
    "crm parent account",
    "//span[contains(text(), 'Parent Account')]/following-sibling::span",
);

pub struct CrmPage<'a, B: Browser> {
    browser: &'a B,
    timeout: Duration,
}

impl<'a, B: Browser> CrmPage<'a, B> {
    pub fn new(browser: &'a B, timeout: Duration) -> Self {
        Self { browser, timeout }
    }

    /// 取引先名で検索し、最初の一致を開く（一致なしなら false）
    pub async fn open_company(&self, name: &str) -> Result<bool> {
        let search = wait_for(self.browser, None, &SEARCH_BOX, Condition::Visible, self.timeout).await?;
        self.browser.type_text(&search.reference, name).await?;

        let link = optional(
            wait_for(self.browser, None, &COMPANY_LINK, Condition::Clickable, self.timeout).await,
        )?;
        match link {
            Some(link) => {
                self.browser.click(&link.reference).await?;
                settle(self.browser, self.timeout, "crm company").await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 親取引先名（未設定なら None）
    pub async fn parent_company(&self) -> Result<Option<String>> {
        let parent = optional(
            wait_for(self.browser, None, &PARENT_ACCOUNT, Condition::Present, self.timeout).await,
        )?;
        Ok(parent
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// 取引先の親会社を調べる
    pub async fn lookup_parent(&self, company: &str) -> Result<Option<String>> {
        if !self.open_company(company).await? {
            tracing::warn!(company, "CRMに該当する取引先がありません");
            return Ok(None);
        }
        self.parent_company().await
    }
}
