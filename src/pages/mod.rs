//! ページオブジェクト
//!
//! 画面ごとのロケーターと操作をまとめる。ロケーターは対象サイトのマークアップに依存する。

pub mod crm;
pub mod job;
pub mod job_list;
pub mod login;
pub mod notes;

pub use crm::CrmPage;
pub use job::JobPage;
pub use job_list::JobListPage;
pub use login::{LoginForm, LoginPage, GEOOP_LOGIN, ZOHO_LOGIN};
pub use notes::NotesDocumentsPage;
