use clap::Parser;
use job_scrape_common::{parse_target_lines, JobLink};
use job_scrape_rust::browser::{settle, Browser, ChromeBrowser};
use job_scrape_rust::{cli, config, error, fetch, pages, runner, session};
use cli::{Cli, Commands};
use config::Config;
use error::{Result, ScrapeError};
use fetch::HttpFetcher;
use runner::{FailureLog, RunSummary, Scraper};
use session::{CookieStore, SessionManager, SessionState};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// 添付ファイル取得のタイムアウト
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .try_init();
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(ScrapeError::FileNotFound(path.display().to_string()));
    }
    Ok(parse_target_lines(&std::fs::read_to_string(path)?))
}

/// ブラウザを起動して処理し、成否に関わらず終了させる
macro_rules! with_browser {
    ($config:expr, |$browser:ident| $body:expr) => {{
        let $browser = ChromeBrowser::launch(&$config.browser).await?;
        let result = async { $body }.await;
        $browser.close().await;
        result
    }};
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.headed {
        config.browser.headless = false;
    }

    match cli.command {
        Commands::Run { urls, targets_file, output, count_policy, interactive } => {
            println!("📥 job-scrape - 添付ファイル収集\n");
            apply_overrides(&mut config, output, interactive);
            if let Some(policy) = count_policy {
                config.count_policy = policy;
            }

            let targets = if !urls.is_empty() {
                parse_target_lines(&urls.join("\n"))
            } else if let Some(path) = targets_file {
                read_lines(&path)?
            } else {
                config.targets.clone()
            };
            if targets.is_empty() {
                return Err(ScrapeError::Config(
                    "処理対象のジョブURLがありません（引数・--targets-file・設定の targets のいずれかで指定）".into(),
                ));
            }

            let log = FailureLog::new(&config.failure_log);
            let summary = scrape(&config, &targets, &log).await?;
            print_summary(&summary, &log);
        }

        Commands::Retry { log, output, interactive } => {
            println!("🔁 job-scrape - 失敗ジョブの再処理\n");
            apply_overrides(&mut config, output, interactive);

            let log = FailureLog::new(log.unwrap_or_else(|| config.failure_log.clone()));
            let targets = log.read()?;
            if targets.is_empty() {
                println!("✔ 再処理するジョブはありません ({})", log.path().display());
                return Ok(());
            }
            println!("- {}件のジョブを再処理します", targets.len());
            log.clear()?;

            let summary = scrape(&config, &targets, &log).await?;
            print_summary(&summary, &log);
        }

        Commands::List { output, max_pages, interactive } => {
            println!("📋 job-scrape - ジョブ一覧取得\n");
            apply_overrides(&mut config, None, interactive);
            config.require_geoop_urls()?;
            let max_pages = max_pages.unwrap_or(config.max_pages);

            let links = with_browser!(config, |browser| {
                SessionManager::geoop(&config).establish(&browser).await?;
                browser.goto(&config.geoop.jobs_url).await?;
                settle(&browser, config.timeouts.readiness(), "job list").await;
                pages::JobListPage::new(
                    &browser,
                    config.timeouts.element(),
                    config.timeouts.pagination(),
                    config.timeouts.readiness(),
                )
                .collect_all(max_pages)
                .await
            })?;

            write_links(&links, output.as_deref())?;
            println!("\n✅ {}件のジョブURLを取得", links.len());
        }

        Commands::Crm { companies, companies_file, output, interactive } => {
            println!("🏢 job-scrape - Zoho CRM 照会\n");
            apply_overrides(&mut config, None, interactive);
            config.require_zoho_urls()?;

            let mut names = companies;
            if let Some(path) = companies_file {
                names.extend(read_lines(&path)?);
            }
            let names = parse_target_lines(&names.join("\n"));
            if names.is_empty() {
                return Err(ScrapeError::Config("照会する取引先名がありません".into()));
            }

            let results = with_browser!(config, |browser| {
                let state = SessionManager::zoho(&config).establish(&browser).await?;
                if state == SessionState::Anonymous {
                    println!("⚠ Zoho にログインできていない可能性があります");
                }
                runner::lookup_parents(&browser, &config, &names).await
            })?;

            let json = serde_json::to_string_pretty(&results)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Session { zoho, clear } => {
            let store = CookieStore::new(if zoho {
                config.zoho_cookies_path.clone()
            } else {
                config.cookies_path.clone()
            });

            if clear {
                if store.clear()? {
                    println!("✔ セッションを削除しました: {}", store.path().display());
                } else {
                    println!("セッションファイルはありません: {}", store.path().display());
                }
                return Ok(());
            }

            match store.load() {
                Some(file) => {
                    println!("セッション: {}", store.path().display());
                    println!("  保存日時: {}", file.saved_at);
                    println!("  Cookie: {}件", file.cookies.len());
                    let mut domains: Vec<&str> = file.cookies.iter().map(|c| c.domain.as_str()).collect();
                    domains.sort_unstable();
                    domains.dedup();
                    println!("  ドメイン: {}", domains.join(", "));
                }
                None => println!("有効なセッションはありません: {}", store.path().display()),
            }
        }

        Commands::Config { init, path, force, show } => {
            if init {
                let path = match path {
                    Some(p) => p,
                    None => Config::user_config_path()?,
                };
                Config::write_template(&path, force)?;
                println!("✔ 設定テンプレートを作成しました: {}", path.display());
            }

            if show || !init {
                println!("{}", serde_json::to_string_pretty(&config.masked())?);
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, output: Option<PathBuf>, interactive: bool) {
    if let Some(output) = output {
        config.output_dir = output;
    }
    if interactive {
        // 2段階認証はブラウザ画面で操作する
        config.interactive_login = true;
        config.browser.headless = false;
    }
}

async fn scrape(config: &Config, targets: &[String], log: &FailureLog) -> Result<RunSummary> {
    config.require_geoop_urls()?;

    with_browser!(config, |browser| {
        let state = SessionManager::geoop(config).establish(&browser).await?;
        println!("✔ セッション: {}\n", state);

        let fetcher = HttpFetcher::new(browser.cookies().await?, FETCH_TIMEOUT)?;
        let scraper = Scraper::new(&browser, &fetcher, config);
        scraper.open_job_list().await?;

        println!("[1/1] {}件のジョブを処理中...", targets.len());
        scraper.run(targets, log).await
    })
}

fn print_summary(summary: &RunSummary, log: &FailureLog) {
    println!(
        "\n✅ 完了: {}件成功 / {}件失敗（保存ファイル {}件）",
        summary.succeeded(),
        summary.failed.len(),
        summary.files_written
    );
    if !summary.failed.is_empty() {
        println!("失敗したジョブは {} に記録しました", log.path().display());
        println!("再処理: job-scrape retry");
    }
}

fn write_links(links: &[JobLink], output: Option<&Path>) -> Result<()> {
    let content: String = links.iter().map(|l| format!("{}\n", l.href)).collect();
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            println!("✔ URLを保存: {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
