use clap::{Parser, Subcommand};
use job_scrape_common::CountPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "job-scrape")]
#[command(about = "GeoOp ジョブ添付ファイル収集・Zoho CRM 照会ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（デフォルト: ./job-scrape.json → ~/.config/job-scrape/config.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// ブラウザ画面を表示して実行
    #[arg(long, global = true)]
    pub headed: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ジョブURLを処理して添付ファイルを保存
    Run {
        /// ジョブURL（省略時は --targets-file または設定ファイルの targets）
        urls: Vec<String>,

        /// ジョブURLを1行1件で書いたファイル（# でコメント）
        #[arg(short = 'f', long)]
        targets_file: Option<PathBuf>,

        /// 出力フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 件数判定 (strict/lenient)
        #[arg(long)]
        count_policy: Option<CountPolicy>,

        /// ログイン後に2段階認証の完了を待つ
        #[arg(short, long)]
        interactive: bool,
    },

    /// 失敗ログのジョブを再処理
    Retry {
        /// 失敗ログ（デフォルト: 設定の failure_log）
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// 出力フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ログイン後に2段階認証の完了を待つ
        #[arg(short, long)]
        interactive: bool,
    },

    /// ジョブ一覧から全ジョブのURLを取得
    List {
        /// URLを書き出すファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 最大ページ数
        #[arg(long)]
        max_pages: Option<usize>,

        /// ログイン後に2段階認証の完了を待つ
        #[arg(short, long)]
        interactive: bool,
    },

    /// Zoho CRM で取引先の親会社を照会
    Crm {
        /// 取引先名
        companies: Vec<String>,

        /// 取引先名を1行1件で書いたファイル
        #[arg(short = 'f', long)]
        companies_file: Option<PathBuf>,

        /// 結果JSONの出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ログイン後に2段階認証の完了を待つ
        #[arg(short, long)]
        interactive: bool,
    },

    /// 保存済みセッションの表示・削除
    Session {
        /// Zoho のセッションを対象にする
        #[arg(long)]
        zoho: bool,

        /// セッションファイルを削除
        #[arg(long)]
        clear: bool,
    },

    /// 設定ファイルの作成・表示
    Config {
        /// テンプレートを書き出す（デフォルト: ~/.config/job-scrape/config.json）
        #[arg(long)]
        init: bool,

        /// 書き出し先
        #[arg(long, requires = "init")]
        path: Option<PathBuf>,

        /// 既存ファイルを上書き
        #[arg(long, requires = "init")]
        force: bool,

        /// 現在の設定を表示（パスワードは伏せる）
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_policy() {
        let cli = Cli::try_parse_from([
            "job-scrape",
            "-v",
            "run",
            "https://app.geoop.com/jobs/1",
            "--count-policy",
            "lenient",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { urls, count_policy, .. } => {
                assert_eq!(urls, vec!["https://app.geoop.com/jobs/1"]);
                assert_eq!(count_policy, Some(CountPolicy::Lenient));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_config_path_requires_init() {
        assert!(Cli::try_parse_from(["job-scrape", "config", "--path", "x.json"]).is_err());
        assert!(Cli::try_parse_from(["job-scrape", "config", "--init", "--path", "x.json"]).is_ok());
    }

    #[test]
    fn test_clap_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
