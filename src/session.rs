//! ログインセッションの確立と保存
//!
//! 保存済みCookieで復元を試み、ログインフォームが出たら資格情報でログインする。
//! 認証済みになったら現在のCookieをすべて保存し、次回は2段階認証を省略できる。

use crate::browser::{settle, Browser};
use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::pages::{LoginForm, LoginPage, GEOOP_LOGIN, ZOHO_LOGIN};
use job_scrape_common::{SessionCookie, SessionFile};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// セッション状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    SessionRestored,
    Authenticated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Anonymous => write!(f, "未ログイン"),
            SessionState::SessionRestored => write!(f, "セッション復元"),
            SessionState::Authenticated => write!(f, "ログイン済み"),
        }
    }
}

/// セッションファイル
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 読み込む（ない・壊れている・バージョン違いは None）
    pub fn load(&self) -> Option<SessionFile> {
        if !self.path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "セッションファイルを読めません: {}", e);
                return None;
            }
        };
        match SessionFile::from_json(&content) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "セッションファイルを無視します: {}", e);
                None
            }
        }
    }

    /// Cookieを保存する（既存ファイルは上書き）
    pub fn save(&self, cookies: Vec<SessionCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = SessionFile::new(chrono::Local::now().to_rfc3339(), cookies);
        std::fs::write(&self.path, file.to_json()?)?;
        Ok(())
    }

    /// 削除する（ファイルがあれば true）
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

/// セッション確立の手順
pub struct SessionManager {
    form: LoginForm,
    login_url: String,
    username: String,
    password: Option<String>,
    store: CookieStore,
    element_timeout: Duration,
    probe_timeout: Duration,
    readiness_timeout: Duration,
    interactive: bool,
}

impl SessionManager {
    pub fn geoop(config: &Config) -> Self {
        Self::for_site(
            config,
            GEOOP_LOGIN,
            &config.geoop.login_url,
            &config.geoop.username,
            config.geoop.password.clone(),
            &config.cookies_path,
        )
    }

    pub fn zoho(config: &Config) -> Self {
        Self::for_site(
            config,
            ZOHO_LOGIN,
            &config.zoho.login_url,
            &config.zoho.username,
            config.zoho.password.clone(),
            &config.zoho_cookies_path,
        )
    }

    fn for_site(
        config: &Config,
        form: LoginForm,
        login_url: &str,
        username: &str,
        password: Option<String>,
        cookies_path: &Path,
    ) -> Self {
        Self {
            form,
            login_url: login_url.to_string(),
            username: username.to_string(),
            password,
            store: CookieStore::new(cookies_path),
            element_timeout: config.timeouts.element(),
            probe_timeout: config.timeouts.login_probe(),
            readiness_timeout: config.timeouts.readiness(),
            interactive: config.interactive_login,
        }
    }

    /// セッションを確立する
    ///
    /// 資格情報でのログイン失敗は警告のみで `Anonymous` を返す。
    /// ページ遷移の失敗はエラー。
    pub async fn establish<B: Browser>(&self, browser: &B) -> Result<SessionState> {
        println!("🔎 {} ログインページを開いています...", self.form.site);
        browser.goto(&self.login_url).await?;
        settle(browser, self.readiness_timeout, "login page").await;

        let mut state = SessionState::Anonymous;
        if let Some(file) = self.store.load() {
            println!("🔄 保存済みセッションを読み込み中 ({}件)", file.cookies.len());
            browser.set_cookies(&file.cookies).await?;
            browser.reload().await?;
            settle(browser, self.readiness_timeout, "session restore").await;
            state = SessionState::SessionRestored;
        }

        let login_page = LoginPage::new(browser, self.form, self.element_timeout);
        match self.probe_form(&login_page).await {
            Some(false) => {
                tracing::info!(site = self.form.site, ?state, "ログインフォームなし");
                return self.authenticated(browser).await;
            }
            Some(true) => {}
            None => return Ok(SessionState::Anonymous),
        }

        if let Err(e) = self.credential_login(browser, &login_page).await {
            tracing::warn!(site = self.form.site, "ログイン失敗（続行します）: {}", e);
            return Ok(SessionState::Anonymous);
        }

        match self.probe_form(&login_page).await {
            Some(false) => self.authenticated(browser).await,
            Some(true) => {
                tracing::warn!(site = self.form.site, "ログイン後もログインフォームが表示されています（続行します）");
                Ok(SessionState::Anonymous)
            }
            None => Ok(SessionState::Anonymous),
        }
    }

    /// ログインフォームの有無（確認できなければ警告して None）
    async fn probe_form<B: Browser>(&self, login_page: &LoginPage<'_, B>) -> Option<bool> {
        match login_page.is_displayed(self.probe_timeout).await {
            Ok(displayed) => Some(displayed),
            Err(e) => {
                tracing::warn!(site = self.form.site, "ログインフォームを確認できません（続行します）: {}", e);
                None
            }
        }
    }

    async fn credential_login<B: Browser>(&self, browser: &B, login_page: &LoginPage<'_, B>) -> Result<()> {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ScrapeError::MissingCredentials(format!("{} のパスワード", self.form.site)))?;
        if self.username.trim().is_empty() {
            return Err(ScrapeError::MissingCredentials(format!("{} のユーザー名", self.form.site)));
        }

        println!("🔑 {} にログイン中...", self.form.site);
        login_page.login(&self.username, password).await?;
        settle(browser, self.readiness_timeout, "login submit").await;

        if self.interactive {
            wait_for_operator(self.form.site).await?;
            settle(browser, self.readiness_timeout, "two-factor").await;
        }
        Ok(())
    }

    async fn authenticated<B: Browser>(&self, browser: &B) -> Result<SessionState> {
        match browser.cookies().await {
            Ok(cookies) => match self.store.save(cookies) {
                Ok(()) => println!("✅ セッションを保存しました: {}", self.store.path().display()),
                Err(e) => tracing::warn!("セッションを保存できません: {}", e),
            },
            Err(e) => tracing::warn!("Cookieを取得できません: {}", e),
        }
        Ok(SessionState::Authenticated)
    }
}

/// ブラウザでの2段階認証の完了を待つ
async fn wait_for_operator(site: &'static str) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(format!("{} の2段階認証をブラウザで完了したら Enter", site))
            .default(true)
            .show_default(false)
            .interact()
            .map(|_| ())
            .map_err(|e| ScrapeError::Prompt(e.to_string()))
    })
    .await
    .map_err(|e| ScrapeError::Prompt(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cookie_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("nested").join("cookies.json"));
        assert!(store.load().is_none());

        let cookies = vec![SessionCookie {
            name: "sid".into(),
            value: "abc".into(),
            domain: ".geoop.com".into(),
            path: "/".into(),
            ..Default::default()
        }];
        store.save(cookies.clone()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.cookies, cookies);
        assert_eq!(loaded.version, SessionFile::CURRENT_VERSION);
        assert!(!loaded.saved_at.is_empty());

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_corrupt_cookie_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(CookieStore::new(&path).load().is_none());

        std::fs::write(&path, r#"{"version": 99, "cookies": []}"#).unwrap();
        assert!(CookieStore::new(&path).load().is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Authenticated.to_string(), "ログイン済み");
    }
}
