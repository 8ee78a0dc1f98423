use crate::error::{Result, ScrapeError};
use job_scrape_common::CountPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// カレントディレクトリで探す設定ファイル名
pub const LOCAL_CONFIG_FILE: &str = "job-scrape.json";

/// パスワードを上書きする環境変数
pub const GEOOP_PASSWORD_ENV: &str = "GEOOP_PASSWORD";
pub const ZOHO_PASSWORD_ENV: &str = "ZOHO_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geoop: GeoOpConfig,
    pub zoho: ZohoConfig,
    /// 処理対象のジョブURL
    pub targets: Vec<String>,
    pub output_dir: PathBuf,
    pub cookies_path: PathBuf,
    pub zoho_cookies_path: PathBuf,
    pub failure_log: PathBuf,
    pub timeouts: Timeouts,
    /// ジョブ間の待機（ms）
    pub throttle_ms: u64,
    pub download: DownloadConfig,
    pub browser: BrowserSettings,
    pub count_policy: CountPolicy,
    /// ジョブ一覧の最大ページ数
    pub max_pages: usize,
    /// ログイン後に2段階認証の完了を対話で待つ
    pub interactive_login: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoOpConfig {
    pub username: String,
    pub password: Option<String>,
    pub login_url: String,
    pub jobs_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZohoConfig {
    pub username: String,
    pub password: Option<String>,
    pub login_url: String,
    pub accounts_url: String,
    pub search_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// 要素待機
    pub element_secs: u64,
    /// クライアント描画完了の待機
    pub readiness_secs: u64,
    /// 次ページボタンの待機
    pub pagination_secs: u64,
    /// ログインフォーム有無の確認
    pub login_probe_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chrome / Chromium の実行ファイル（省略時は自動検出）
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geoop: GeoOpConfig::default(),
            zoho: ZohoConfig::default(),
            targets: Vec::new(),
            output_dir: PathBuf::from("output"),
            cookies_path: PathBuf::from("cookies.json"),
            zoho_cookies_path: PathBuf::from("zoho_cookies.json"),
            failure_log: PathBuf::from("failed_urls.csv"),
            timeouts: Timeouts::default(),
            throttle_ms: 3000,
            download: DownloadConfig::default(),
            browser: BrowserSettings::default(),
            count_policy: CountPolicy::Strict,
            max_pages: 200,
            interactive_login: false,
        }
    }
}

impl Default for ZohoConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            login_url: "https://accounts.zoho.com/signin".into(),
            accounts_url: String::new(),
            search_timeout_secs: 10,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_secs: 15,
            readiness_secs: 20,
            pagination_secs: 5,
            login_probe_secs: 5,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            window_width: 1400,
            window_height: 1000,
        }
    }
}

impl Timeouts {
    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    pub fn readiness(&self) -> Duration {
        Duration::from_secs(self.readiness_secs)
    }

    pub fn pagination(&self) -> Duration {
        Duration::from_secs(self.pagination_secs)
    }

    pub fn login_probe(&self) -> Duration {
        Duration::from_secs(self.login_probe_secs)
    }
}

impl Config {
    /// 設定を読み込む
    ///
    /// 優先順位: 明示パス → ./job-scrape.json → ~/.config/job-scrape/config.json → デフォルト
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) if !p.exists() => {
                return Err(ScrapeError::FileNotFound(p.display().to_string()));
            }
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(),
        };

        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::user_config_path().ok().filter(|p| p.exists())
    }

    pub fn user_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScrapeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("job-scrape").join("config.json"))
    }

    /// 環境変数でパスワードを上書き（環境変数を優先）
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(pw) = lookup(GEOOP_PASSWORD_ENV).filter(|s| !s.is_empty()) {
            self.geoop.password = Some(pw);
        }
        if let Some(pw) = lookup(ZOHO_PASSWORD_ENV).filter(|s| !s.is_empty()) {
            self.zoho.password = Some(pw);
        }
    }

    /// テンプレートを書き出す
    pub fn write_template(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(ScrapeError::Config(format!(
                "{} は既に存在します（上書きする場合は --force）",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut template = Self::default();
        template.geoop.login_url = "https://app.geoop.com/login".into();
        template.geoop.jobs_url = "https://app.geoop.com/jobs".into();
        let content = serde_json::to_string_pretty(&template)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn require_geoop_urls(&self) -> Result<()> {
        if self.geoop.login_url.trim().is_empty() {
            return Err(ScrapeError::Config("geoop.login_url が設定されていません".into()));
        }
        if self.geoop.jobs_url.trim().is_empty() {
            return Err(ScrapeError::Config("geoop.jobs_url が設定されていません".into()));
        }
        Ok(())
    }

    pub fn require_zoho_urls(&self) -> Result<()> {
        if self.zoho.login_url.trim().is_empty() || self.zoho.accounts_url.trim().is_empty() {
            return Err(ScrapeError::Config(
                "zoho.login_url / zoho.accounts_url が設定されていません".into(),
            ));
        }
        Ok(())
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// 表示用（パスワードを伏せる）
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        let mask = |p: &mut Option<String>| {
            if p.is_some() {
                *p = Some("********".into());
            }
        };
        mask(&mut copy.geoop.password);
        mask(&mut copy.zoho.password);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.download.attempts, 3);
        assert_eq!(config.failure_log, PathBuf::from("failed_urls.csv"));
        assert_eq!(config.count_policy, CountPolicy::Strict);
        assert_eq!(config.timeouts.element(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"geoop": {"username": "ops@example.com"}, "targets": ["https://app.geoop.com/jobs/1"], "count_policy": "lenient"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.geoop.username, "ops@example.com");
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.count_policy, CountPolicy::Lenient);
        assert_eq!(config.throttle_ms, 3000);
        assert_eq!(config.zoho.search_timeout_secs, 10);
    }

    #[test]
    fn test_env_overrides_password() {
        let mut config = Config::default();
        config.geoop.password = Some("from-file".into());
        config.apply_env(|key| match key {
            GEOOP_PASSWORD_ENV => Some("from-env".into()),
            ZOHO_PASSWORD_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.geoop.password.as_deref(), Some("from-env"));
        assert_eq!(config.zoho.password, None);
    }

    #[test]
    fn test_masked_hides_passwords() {
        let mut config = Config::default();
        config.geoop.password = Some("secret".into());
        let masked = config.masked();
        assert_eq!(masked.geoop.password.as_deref(), Some("********"));
        assert_eq!(masked.zoho.password, None);
    }

    #[test]
    fn test_require_urls() {
        let mut config = Config::default();
        assert!(config.require_geoop_urls().is_err());
        config.geoop.login_url = "https://app.geoop.com/login".into();
        config.geoop.jobs_url = "https://app.geoop.com/jobs".into();
        assert!(config.require_geoop_urls().is_ok());
        assert!(config.require_zoho_urls().is_err());
    }
}
