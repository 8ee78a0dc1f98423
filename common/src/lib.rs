//! Job Scrape Common Library
//!
//! ブラウザ・ネットワークに依存しない型とユーティリティ

pub mod types;
pub mod error;
pub mod parser;
pub mod sanitize;
pub mod classify;

pub use types::{
    AttachmentKind, AttachmentRow, CountPolicy, DetailRecord, JobLink, JobOutcome, RowResult,
    RowStatus, SessionCookie, SessionFile,
};
pub use error::{Error, Result};
pub use parser::{
    extract_identifier, parse_client_name, parse_row_date_label, parse_service_title,
    parse_target_lines, parse_visit_date,
};
pub use sanitize::{clean_file_label, sanitize_path_component, strip_size_annotation};
pub use classify::{classify, destination_dir, job_dir, row_date_label, FileNamer, SeenSources};
