//! クライアント描画の完了待ち
//!
//! 固定スリープの代わりに、AngularJS の未完了リクエスト数が 0 になるまでポーリングする。

use super::Browser;
use crate::error::{Result, ScrapeError};
use std::time::Duration;
use tokio::time::Instant;

/// AngularJS の `$http` に未完了リクエストがなければ true
pub const ANGULAR_IDLE_SCRIPT: &str = "(() => { try { \
    return (window.angular !== undefined) && \
    (angular.element(document.body).injector() !== undefined) && \
    (angular.element(document.body).injector().get('$http').pendingRequests.length === 0) && \
    document.readyState === 'complete'; \
    } catch (e) { return false; } })()";

const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// 述語スクリプトが true を返すまで待つ
pub async fn wait_until<B: Browser>(browser: &B, script: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match browser.evaluate_bool(script).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            // 遷移中は評価に失敗することがあるので待ち続ける
            Err(e) => tracing::trace!("readiness probe failed: {}", e),
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::NotReady(format!(
                "{:?} 以内に未完了リクエストが 0 になりませんでした",
                timeout
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// ページの描画完了を待つ
pub async fn wait_until_idle<B: Browser>(browser: &B, timeout: Duration) -> Result<()> {
    wait_until(browser, ANGULAR_IDLE_SCRIPT, timeout).await
}

/// 描画完了を待ち、確認できなければ警告して続行する
pub async fn settle<B: Browser>(browser: &B, timeout: Duration, context: &str) {
    if let Err(e) = wait_until_idle(browser, timeout).await {
        tracing::warn!(context, "{}", e);
    }
}
