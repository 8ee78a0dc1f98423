//! 要素待機
//!
//! 条件（存在 / 表示 / クリック可能）を満たすまでポーリングし、
//! タイムアウトしたら `ScrapeError::ElementNotFound` を返す。
//! 致命的かどうかは呼び出し側が決める。

use super::{Browser, ElementRef, ElementSnapshot, Locator};
use crate::error::{Result, ScrapeError};
use std::time::Duration;
use tokio::time::Instant;

/// ポーリング間隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 待機条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Present,
    Visible,
    Clickable,
}

impl Condition {
    pub fn is_met(&self, snapshot: &ElementSnapshot) -> bool {
        match self {
            Condition::Present => true,
            Condition::Visible => snapshot.visible,
            Condition::Clickable => snapshot.visible && snapshot.enabled,
        }
    }
}

/// 取得した要素
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub reference: ElementRef,
    pub snapshot: ElementSnapshot,
}

impl Element {
    pub fn text(&self) -> &str {
        &self.snapshot.text
    }

    /// 属性値（空文字は None）
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.snapshot
            .attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

fn wrap(scope: Option<&ElementRef>, locator: &Locator, found: Vec<ElementSnapshot>) -> Vec<Element> {
    found
        .into_iter()
        .enumerate()
        .map(|(index, snapshot)| Element {
            reference: ElementRef::scoped(scope, *locator, index),
            snapshot,
        })
        .collect()
}

/// 条件を満たす最初の要素を待つ
pub async fn wait_for<B: Browser>(
    browser: &B,
    scope: Option<&ElementRef>,
    locator: &Locator,
    condition: Condition,
    timeout: Duration,
) -> Result<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        let found = wrap(scope, locator, browser.query(scope, locator).await?);
        if let Some(element) = found.into_iter().find(|e| condition.is_met(&e.snapshot)) {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::not_found(locator.name, timeout));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// 一致する要素すべてを待つ
///
/// 1件以上見つかり、かつ全件が条件を満たした時点で返す。
pub async fn wait_for_all<B: Browser>(
    browser: &B,
    scope: Option<&ElementRef>,
    locator: &Locator,
    condition: Condition,
    timeout: Duration,
) -> Result<Vec<Element>> {
    let deadline = Instant::now() + timeout;
    loop {
        let found = wrap(scope, locator, browser.query(scope, locator).await?);
        if !found.is_empty() && found.iter().all(|e| condition.is_met(&e.snapshot)) {
            return Ok(found);
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::not_found(locator.name, timeout));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// 待機せずに1回だけ探す
pub async fn find_now<B: Browser>(
    browser: &B,
    scope: Option<&ElementRef>,
    locator: &Locator,
) -> Result<Option<Element>> {
    let found = wrap(scope, locator, browser.query(scope, locator).await?);
    Ok(found.into_iter().next())
}

/// 見つからなければ None にする（その他のエラーはそのまま返す）
pub fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
