//! GeoOp ジョブ添付ファイル収集ツール
//!
//! ブラウザ操作・ページオブジェクト・ダウンロード・実行制御。
//! ブラウザに依存しない型と処理は `job_scrape_common` にある。

pub mod browser;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod pages;
pub mod runner;
pub mod session;
