//! ブラウザ操作モジュール
//!
//! ページオブジェクトは `Browser` トレイト越しにDOMを参照する。
//! 実装は Chrome (CDP) 版の `ChromeBrowser` と、テスト用の差し替え。

mod chrome;
pub mod locator;
pub mod readiness;
pub mod script;

pub use chrome::ChromeBrowser;
pub use locator::{find_now, optional, wait_for, wait_for_all, Condition, Element};
pub use readiness::{settle, wait_until_idle};

use crate::error::Result;
use job_scrape_common::SessionCookie;
use serde::Deserialize;
use std::collections::HashMap;

/// 要素の指定方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum By {
    Css(&'static str),
    XPath(&'static str),
    Id(&'static str),
}

impl By {
    pub fn kind(&self) -> &'static str {
        match self {
            By::Css(_) => "css",
            By::XPath(_) => "xpath",
            By::Id(_) => "id",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            By::Css(v) | By::XPath(v) | By::Id(v) => v,
        }
    }
}

/// 名前付きの要素ロケーター
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    /// ログ・エラー表示用の名前
    pub name: &'static str,
    pub by: By,
}

impl Locator {
    pub const fn css(name: &'static str, selector: &'static str) -> Self {
        Self { name, by: By::Css(selector) }
    }

    pub const fn xpath(name: &'static str, xpath: &'static str) -> Self {
        Self { name, by: By::XPath(xpath) }
    }

    pub const fn id(name: &'static str, id: &'static str) -> Self {
        Self { name, by: By::Id(id) }
    }
}

/// 取得済み要素への参照（ロケーターと何番目かの連鎖）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    steps: Vec<(Locator, usize)>,
}

impl ElementRef {
    pub fn root(locator: Locator, index: usize) -> Self {
        Self { steps: vec![(locator, index)] }
    }

    pub fn child(&self, locator: Locator, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push((locator, index));
        Self { steps }
    }

    /// スコープ付きの参照を作る（スコープなしならルート）
    pub fn scoped(scope: Option<&ElementRef>, locator: Locator, index: usize) -> Self {
        match scope {
            Some(parent) => parent.child(locator, index),
            None => Self::root(locator, index),
        }
    }

    pub fn steps(&self) -> &[(Locator, usize)] {
        &self.steps
    }

    /// 末尾のロケーター名
    pub fn name(&self) -> &'static str {
        self.steps.last().map(|(l, _)| l.name).unwrap_or("")
    }
}

/// 要素のスナップショット（問い合わせ時点の状態）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    pub attributes: HashMap<String, String>,
}

/// ブラウザ操作の境界
///
/// 1つのタブを逐次操作する前提。
#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn reload(&self) -> Result<()>;

    /// ロケーターに一致する要素のスナップショットを文書順で返す
    async fn query(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<Vec<ElementSnapshot>>;

    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()>;

    async fn evaluate_bool(&self, script: &str) -> Result<bool>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn cookies(&self) -> Result<Vec<SessionCookie>>;

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()>;
}
