//! テスト用のブラウザ・取得の差し替え

#![allow(dead_code)]

use job_scrape_common::SessionCookie;
use job_scrape_rust::browser::{Browser, ElementRef, ElementSnapshot, Locator};
use job_scrape_rust::error::{Result, ScrapeError};
use job_scrape_rust::fetch::Fetcher;
use std::collections::HashMap;
use std::sync::Mutex;

/// 画面1枚分の要素（ロケーター名で引く）
#[derive(Debug, Clone, Default)]
pub struct FakeDom {
    root: HashMap<&'static str, Vec<ElementSnapshot>>,
    /// "親ロケーター名#番号>子ロケーター名" → 要素
    scoped: HashMap<String, Vec<ElementSnapshot>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: &Locator, elements: Vec<ElementSnapshot>) -> Self {
        self.root.insert(locator.name, elements);
        self
    }

    pub fn with_child(
        mut self,
        parent: &Locator,
        index: usize,
        child: &Locator,
        elements: Vec<ElementSnapshot>,
    ) -> Self {
        self.scoped.insert(scoped_key(parent.name, index, child.name), elements);
        self
    }
}

fn scoped_key(parent: &str, index: usize, child: &str) -> String {
    format!("{}#{}>{}", parent, index, child)
}

pub fn visible(text: &str) -> ElementSnapshot {
    ElementSnapshot {
        text: text.to_string(),
        visible: true,
        enabled: true,
        attributes: HashMap::new(),
    }
}

pub fn hidden(text: &str) -> ElementSnapshot {
    ElementSnapshot {
        visible: false,
        ..visible(text)
    }
}

pub fn with_attr(mut snapshot: ElementSnapshot, name: &str, value: &str) -> ElementSnapshot {
    snapshot.attributes.insert(name.to_string(), value.to_string());
    snapshot
}

/// 画面遷移を持つ差し替えブラウザ
///
/// `advance_on` の要素をクリックすると次の画面に進む。
#[derive(Default)]
pub struct FakeBrowser {
    screens: Vec<FakeDom>,
    advance_on: Vec<&'static str>,
    broken_queries: Vec<&'static str>,
    current: Mutex<usize>,
    idle: bool,
    pub visited: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<(String, String)>>,
    pub cookie_jar: Mutex<Vec<SessionCookie>>,
    pub reloads: Mutex<usize>,
}

impl FakeBrowser {
    pub fn new(dom: FakeDom) -> Self {
        Self::with_screens(vec![dom])
    }

    pub fn with_screens(screens: Vec<FakeDom>) -> Self {
        Self {
            screens,
            idle: true,
            ..Default::default()
        }
    }

    pub fn advance_on(mut self, locator: &Locator) -> Self {
        self.advance_on.push(locator.name);
        self
    }

    /// このロケーターの検索は常にブラウザ操作エラーになる
    pub fn break_query(mut self, locator: &Locator) -> Self {
        self.broken_queries.push(locator.name);
        self
    }

    pub fn with_cookies(self, cookies: Vec<SessionCookie>) -> Self {
        *self.cookie_jar.lock().unwrap() = cookies;
        self
    }

    pub fn screen(&self) -> usize {
        *self.current.lock().unwrap()
    }

    fn dom(&self) -> FakeDom {
        let index = self.screen().min(self.screens.len().saturating_sub(1));
        self.screens.get(index).cloned().unwrap_or_default()
    }
}

impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        *self.reloads.lock().unwrap() += 1;
        Ok(())
    }

    async fn query(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<Vec<ElementSnapshot>> {
        if self.broken_queries.contains(&locator.name) {
            return Err(ScrapeError::Browser(format!("{}: Execution context was destroyed", locator.name)));
        }
        let dom = self.dom();
        let found = match scope.and_then(|s| s.steps().last()) {
            Some((parent, index)) => dom.scoped.get(&scoped_key(parent.name, *index, locator.name)),
            None => dom.root.get(locator.name),
        };
        Ok(found.cloned().unwrap_or_default())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let name = element.name();
        self.clicks.lock().unwrap().push(name.to_string());
        if self.advance_on.contains(&name) {
            *self.current.lock().unwrap() += 1;
        }
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.typed
            .lock()
            .unwrap()
            .push((element.name().to_string(), text.to_string()));
        Ok(())
    }

    async fn evaluate_bool(&self, _script: &str) -> Result<bool> {
        Ok(self.idle)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(self.cookie_jar.lock().unwrap().clone())
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        self.cookie_jar.lock().unwrap().extend(cookies.iter().cloned());
        Ok(())
    }
}

/// URLごとに「何回目で成功するか」を決められる取得の差し替え
#[derive(Default)]
pub struct FakeFetcher {
    /// URL → 成功するまでの失敗回数（None は常に失敗）
    failures: HashMap<String, Option<usize>>,
    pub calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// `failures` 回失敗した後に成功する
    pub fn flaky(mut self, url: &str, failures: usize) -> Self {
        self.failures.insert(url.to_string(), Some(failures));
        self
    }

    /// 常に失敗する
    pub fn broken(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string(), None);
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let fails = match self.failures.get(url) {
            Some(Some(n)) => attempt <= *n,
            Some(None) => true,
            None => false,
        };
        if fails {
            Err(ScrapeError::Download {
                url: url.to_string(),
                attempts: 1,
                message: "HTTP 503 Service Unavailable".to_string(),
            })
        } else {
            Ok(format!("bytes of {}", url).into_bytes())
        }
    }
}
