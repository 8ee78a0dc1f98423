//! Chrome (CDP) によるブラウザ実装

use super::script::{self, Action};
use super::{Browser, ElementRef, ElementSnapshot, Locator};
use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::Page;
use futures::StreamExt;
use job_scrape_common::SessionCookie;
use serde::Deserialize;

fn cdp_error<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> ScrapeError {
    move |e| ScrapeError::Browser(format!("{}: {}", context, e))
}

#[derive(Deserialize)]
struct ActionResult {
    ok: bool,
    #[serde(default)]
    error: String,
}

pub struct ChromeBrowser {
    browser: CdpBrowser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeBrowser {
    /// Chrome を起動して作業用タブを1つ開く
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder =
            BrowserConfig::builder().window_size(settings.window_width, settings.window_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(cdp_error("Chrome 起動失敗"))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("chromiumoxide handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(cdp_error("タブ作成失敗"))?;

        tracing::info!(headless = settings.headless, "browser launched");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    async fn evaluate_string(&self, script: String) -> Result<String> {
        let value = self
            .page
            .evaluate(script)
            .await
            .map_err(cdp_error("スクリプト実行失敗"))?;
        value
            .into_value::<String>()
            .map_err(cdp_error("スクリプト結果の変換失敗"))
    }

    async fn run_action(&self, element: &ElementRef, action: Action<'_>) -> Result<()> {
        let raw = self
            .evaluate_string(script::action_script(element, &action))
            .await?;
        let result: ActionResult = serde_json::from_str(&raw)?;
        if result.ok {
            Ok(())
        } else {
            Err(ScrapeError::Browser(format!(
                "{} への操作に失敗: {}",
                element.name(),
                result.error
            )))
        }
    }

    /// ブラウザを終了する
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

impl Browser for ChromeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "navigate");
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.page
            .reload()
            .await
            .map_err(|e| ScrapeError::Navigation(format!("reload: {}", e)))?;
        Ok(())
    }

    async fn query(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<Vec<ElementSnapshot>> {
        let raw = self
            .evaluate_string(script::query_script(scope, locator))
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.run_action(element, Action::Click).await
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.run_action(element, Action::Type(text)).await
    }

    async fn evaluate_bool(&self, script: &str) -> Result<bool> {
        let value = self
            .page
            .evaluate(script.to_string())
            .await
            .map_err(cdp_error("スクリプト実行失敗"))?;
        Ok(value.into_value::<bool>().unwrap_or(false))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.evaluate_bool(script::SCROLL_TO_BOTTOM).await.map(|_| ())
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(cdp_error("Cookie取得失敗"))?;
        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie {
                expires: if c.session { None } else { Some(c.expires) },
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        let params: Vec<CookieParam> = cookies
            .iter()
            .map(|c| {
                let mut param = CookieParam::new(c.name.clone(), c.value.clone());
                if !c.domain.is_empty() {
                    param.domain = Some(c.domain.clone());
                }
                if !c.path.is_empty() {
                    param.path = Some(c.path.clone());
                }
                param.secure = Some(c.secure);
                param.http_only = Some(c.http_only);
                param.expires = c.expires.map(TimeSinceEpoch::new);
                param
            })
            .collect();
        self.page
            .set_cookies(params)
            .await
            .map_err(cdp_error("Cookie設定失敗"))?;
        Ok(())
    }
}
