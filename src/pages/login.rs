//! ログインフォーム

use crate::browser::{optional, wait_for, Browser, Condition, Locator};
use crate::error::Result;
use std::time::Duration;

/// ログインフォームのロケーター一式
#[derive(Debug, Clone, Copy)]
pub struct LoginForm {
    pub site: &'static str,
    pub username: Locator,
    pub password: Locator,
    pub submit: Locator,
    /// ユーザー名入力後に押す「次へ」（パスワード欄が後から出るフォーム）
    pub next: Option<Locator>,
}

pub const GEOOP_LOGIN: LoginForm = LoginForm {
    site: "GeoOp",
    username: Locator::id("login username", "loginname"),
    password: Locator::id("login password", "geoop-password"),
    submit: Locator::id("login button", "loginID"),
    next: None,
};

pub const ZOHO_LOGIN: LoginForm = LoginForm {
    site: "Zoho",
    username: Locator::id("zoho login id", "login_id"),
    password: Locator::id("zoho password", "password"),
    submit: Locator::id("zoho sign in button", "nextbtn"),
    next: Some(Locator::id("zoho next button", "nextbtn")),
};

pub struct LoginPage<'a, B: Browser> {
    browser: &'a B,
    form: LoginForm,
    timeout: Duration,
}

impl<'a, B: Browser> LoginPage<'a, B> {
    pub fn new(browser: &'a B, form: LoginForm, timeout: Duration) -> Self {
        Self {
            browser,
            form,
            timeout,
        }
    }

    /// ログインフォームが表示されているか（短い待機で確認）
    pub async fn is_displayed(&self, probe: Duration) -> Result<bool> {
        let found = optional(
            wait_for(self.browser, None, &self.form.username, Condition::Visible, probe).await,
        )?;
        Ok(found.is_some())
    }

    pub async fn enter_username(&self, username: &str) -> Result<()> {
        let field = wait_for(self.browser, None, &self.form.username, Condition::Present, self.timeout).await?;
        self.browser.type_text(&field.reference, username).await
    }

    pub async fn enter_password(&self, password: &str) -> Result<()> {
        let field = wait_for(self.browser, None, &self.form.password, Condition::Visible, self.timeout).await?;
        self.browser.type_text(&field.reference, password).await
    }

    /// ログインボタンを押す
    ///
    /// クリック可能にならない場合は、存在さえすればスクリプトでクリックする。
    pub async fn click_login(&self) -> Result<()> {
        self.click(&self.form.submit).await
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        match wait_for(self.browser, None, locator, Condition::Clickable, self.timeout).await {
            Ok(button) => self.browser.click(&button.reference).await,
            Err(e) if e.is_not_found() => {
                tracing::warn!(site = self.form.site, "通常クリック不可、スクリプトでクリックします");
                let button = wait_for(self.browser, None, locator, Condition::Present, self.timeout).await?;
                self.browser.click(&button.reference).await
            }
            Err(e) => Err(e),
        }
    }

    /// ユーザー名・パスワードを入力して送信
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.enter_username(username).await?;
        if let Some(next) = &self.form.next {
            self.click(next).await?;
        }
        self.enter_password(password).await?;
        self.click_login().await
    }
}
