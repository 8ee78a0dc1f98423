//! Notes & Documents タブ

use crate::browser::{find_now, optional, wait_for_all, Browser, Condition, Element, Locator};
use crate::error::{Result, ScrapeError};
use job_scrape_common::AttachmentRow;
use std::time::Duration;

pub const NOTE_ROWS: Locator = Locator::xpath(
    "note rows",
    "//tr[contains(@class, 'message-attachment-list-item')]",
);
pub const THUMBNAILS: Locator = Locator::css("attachment thumbnails", "td.attachment-thumb img");

pub const ROW_DATE: Locator = Locator::xpath(
    "row date",
    ".//td[contains(@class, 'ng-binding') and contains(text(), ':')]",
);
pub const ROW_IMAGE: Locator = Locator::xpath("row image", ".//td[contains(@class, 'attachment-thumb')]//img");
pub const ROW_DOCUMENT: Locator = Locator::xpath(
    "row document link",
    ".//td[contains(@class, 'attachment-name')]//a[@href]",
);
pub const ROW_FILE_LABEL: Locator = Locator::xpath("row file label", ".//td[contains(@class, 'attachment-name')]");
pub const ROW_DESCRIPTION: Locator = Locator::xpath("row description", "./td[4]");

/// モーダル表示用の原寸画像URL
pub const IMAGE_URL_ATTR: &str = "data-geo-image-modal-url";

pub struct NotesDocumentsPage<'a, B: Browser> {
    browser: &'a B,
    timeout: Duration,
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl<'a, B: Browser> NotesDocumentsPage<'a, B> {
    pub fn new(browser: &'a B, timeout: Duration) -> Self {
        Self { browser, timeout }
    }

    /// 遅延読み込みを促すため最下部までスクロール
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.browser.scroll_to_bottom().await
    }

    /// サムネイルが表示されるまで待つ（画像のないジョブでは false）
    pub async fn wait_for_thumbnails(&self) -> Result<bool> {
        let found = optional(
            wait_for_all(self.browser, None, &THUMBNAILS, Condition::Visible, self.timeout).await,
        )?;
        Ok(found.is_some())
    }

    /// 全行を読み取る
    ///
    /// 行が1つも現れない場合はページ構造エラー。
    pub async fn rows(&self) -> Result<Vec<AttachmentRow>> {
        let elements = wait_for_all(self.browser, None, &NOTE_ROWS, Condition::Present, self.timeout)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ScrapeError::PageStructure(format!("ノート行が見つかりません: {}", e))
                } else {
                    e
                }
            })?;

        let mut rows = Vec::with_capacity(elements.len());
        for element in &elements {
            rows.push(self.read_row(element).await?);
        }
        Ok(rows)
    }

    /// 1行分のセルを読み取る（セルがなければ None）
    pub async fn read_row(&self, row: &Element) -> Result<AttachmentRow> {
        let scope = Some(&row.reference);

        let date_text = find_now(self.browser, scope, &ROW_DATE)
            .await?
            .and_then(|e| non_empty(e.text()));

        let image_url = find_now(self.browser, scope, &ROW_IMAGE).await?.and_then(|img| {
            img.attr(IMAGE_URL_ATTR)
                .or_else(|| img.attr("src"))
                .map(str::to_string)
        });

        let document_url = find_now(self.browser, scope, &ROW_DOCUMENT)
            .await?
            .and_then(|a| a.attr("href").map(str::to_string));

        let file_label = find_now(self.browser, scope, &ROW_FILE_LABEL)
            .await?
            .and_then(|e| non_empty(e.text()));

        // 説明は前後の空白も含めてそのまま保存する
        let description = find_now(self.browser, scope, &ROW_DESCRIPTION)
            .await?
            .map(|e| e.text().to_string())
            .filter(|t| !t.trim().is_empty());

        Ok(AttachmentRow {
            date_text,
            image_url,
            document_url,
            file_label,
            description,
        })
    }
}
