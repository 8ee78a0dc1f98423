//! 添付ファイルの取得

use crate::error::{Result, ScrapeError};
use job_scrape_common::SessionCookie;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::Url;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// URLからバイト列を取得する
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest による取得（ブラウザのセッションCookieを付与）
pub struct HttpFetcher {
    client: reqwest::Client,
    cookies: Vec<SessionCookie>,
}

impl HttpFetcher {
    pub fn new(cookies: Vec<SessionCookie>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, cookies })
    }
}

/// Cookieのドメインがホストに一致するか
///
/// 先頭の `.` は無視し、サブドメインも一致とみなす。
pub fn domain_matches(host: &str, cookie_domain: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// URLに送るべきCookieヘッダー値（該当なしなら None）
pub fn cookie_header_for(url: &str, cookies: &[SessionCookie]) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let path = parsed.path();
    let is_https = parsed.scheme() == "https";

    let pairs: Vec<String> = cookies
        .iter()
        .filter(|c| domain_matches(host, &c.domain))
        .filter(|c| c.path.is_empty() || path.starts_with(&c.path))
        .filter(|c| !c.secure || is_https)
        .map(|c| format!("{}={}", c.name, c.value))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(url).header(USER_AGENT, DEFAULT_USER_AGENT);
        if let Some(cookie) = cookie_header_for(url, &self.cookies) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Download {
                url: url.to_string(),
                attempts: 1,
                message: format!("HTTP {}", status),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
