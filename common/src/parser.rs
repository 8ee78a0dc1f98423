//! 画面テキストのパーサー
//!
//! ジョブ詳細・ノート行から読み取ったテキストを、
//! ディレクトリ名に使うフィールドへ変換する

/// ジョブ番号の目印
pub const IDENTIFIER_MARKER: char = '#';

/// サービス名の前置ラベル
pub const SERVICE_PREFIX: &str = "Job Title:";

/// 日付ラベルが取れなかった行のフォールバック
pub const UNKNOWN_DATE: &str = "UnknownDate";

/// クライアント名を整形
///
/// `-` を含む場合は最後の区切りのみ使う（例: `"Acme Ltd - Bob Smith"` → `"Bob Smith"`）
pub fn parse_client_name(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit('-').next() {
        Some(last) if trimmed.contains('-') => last.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// サービス名から `Job Title:` を除去
pub fn parse_service_title(raw: &str) -> String {
    raw.replace(SERVICE_PREFIX, "").trim().to_string()
}

/// テキストからジョブ番号を抽出
///
/// 空白で分割し、`#` で始まるトークンのうち**最後**のものから `#` を除いて返す。
///
/// # Examples
/// ```
/// use job_scrape_common::extract_identifier;
///
/// assert_eq!(extract_identifier("Job #4821 Open"), Some("4821".to_string()));
/// assert_eq!(extract_identifier("Job Open"), None);
/// ```
pub fn extract_identifier(text: &str) -> Option<String> {
    extract_identifier_from_tokens(text.split_whitespace())
}

/// トークン列からジョブ番号を抽出
pub fn extract_identifier_from_tokens<'a, I>(tokens: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .filter(|t| t.starts_with(IDENTIFIER_MARKER))
        .last()
        .map(|t| t.replace(IDENTIFIER_MARKER, ""))
}

/// 時刻を表すトークン（`-` または `:` を含む）を除いた日付トークン
pub fn date_tokens(text: &str) -> Vec<&str> {
    filter_date_tokens(text.split_whitespace())
}

pub fn filter_date_tokens<'a, I>(tokens: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .filter(|t| !t.contains('-') && !t.contains(':'))
        .collect()
}

/// 訪問日をラベル化
///
/// - 残り2トークン: そのまま `_` で連結
/// - 残り4トークン: 先頭2つを連結
/// - それ以外: 空文字
pub fn join_visit_date(tokens: &[&str]) -> String {
    match tokens.len() {
        2 => tokens.join("_"),
        4 => tokens[..2].join("_"),
        _ => String::new(),
    }
}

/// 訪問日テキストをパース
pub fn parse_visit_date(text: &str) -> String {
    join_visit_date(&date_tokens(text))
}

/// ノート行の日付セルをラベル化（先頭3トークンを `_` で連結）
pub fn parse_row_date_label(text: &str) -> String {
    text.split_whitespace().take(3).collect::<Vec<_>>().join("_")
}

/// ターゲット一覧テキストをパース
///
/// 1行1件。空行と `#` で始まる行は無視し、重複は最初の1件のみ残す。
pub fn parse_target_lines(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // ジョブ番号
    // =============================================

    #[test]
    fn test_identifier_from_tokens() {
        let tokens = ["Job", "#4821", "Open"];
        assert_eq!(extract_identifier_from_tokens(tokens), Some("4821".to_string()));
    }

    #[test]
    fn test_identifier_keeps_last_marker_token() {
        assert_eq!(extract_identifier("#12 Job #4821"), Some("4821".to_string()));
    }

    #[test]
    fn test_identifier_missing() {
        assert_eq!(extract_identifier(""), None);
        assert_eq!(extract_identifier("Job 4821"), None);
    }

    #[test]
    fn test_identifier_bare_marker_is_blank() {
        assert_eq!(extract_identifier("Job #"), Some(String::new()));
    }

    // =============================================
    // 訪問日
    // =============================================

    #[test]
    fn test_date_tokens_reject_time_tokens() {
        let tokens = ["10", "May", "2024", "-", "14:00"];
        assert_eq!(filter_date_tokens(tokens), vec!["10", "May", "2024"]);
    }

    #[test]
    fn test_three_tokens_fall_into_empty_branch() {
        let filtered = filter_date_tokens(["10", "May", "2024", "-", "14:00"]);
        assert_eq!(filtered.len(), 3);
        assert_eq!(join_visit_date(&filtered), "");
        assert_eq!(parse_visit_date("10 May 2024 - 14:00"), "");
    }

    #[test]
    fn test_two_tokens_joined() {
        assert_eq!(parse_visit_date("Tue 10:00 - 11:00 14/05"), "Tue_14/05");
        assert_eq!(parse_visit_date("10 May"), "10_May");
    }

    #[test]
    fn test_four_tokens_keep_first_two() {
        assert_eq!(parse_visit_date("10 May 14:00 - 16:00 11 May"), "10_May");
    }

    #[test]
    fn test_empty_visit_text() {
        assert_eq!(parse_visit_date(""), "");
    }

    // =============================================
    // その他フィールド
    // =============================================

    #[test]
    fn test_client_name_last_dash_segment() {
        assert_eq!(parse_client_name("Acme Ltd - Bob Smith"), "Bob Smith");
        assert_eq!(parse_client_name("  Jane Doe "), "Jane Doe");
    }

    #[test]
    fn test_service_title_prefix_removed() {
        assert_eq!(parse_service_title("Job Title: Swap filters"), "Swap filters");
        assert_eq!(parse_service_title("Lawn mowing"), "Lawn mowing");
    }

    #[test]
    fn test_row_date_label() {
        assert_eq!(parse_row_date_label("12 Mar 2024 10:15 am"), "12_Mar_2024");
        assert_eq!(parse_row_date_label("Yesterday"), "Yesterday");
        assert_eq!(parse_row_date_label("  "), "");
    }

    #[test]
    fn test_parse_target_lines() {
        let text = "# failed jobs\nhttps://app.geoop.com/jobs/1\n\n  https://app.geoop.com/jobs/2 \nhttps://app.geoop.com/jobs/1\n";
        assert_eq!(
            parse_target_lines(text),
            vec!["https://app.geoop.com/jobs/1", "https://app.geoop.com/jobs/2"]
        );
    }
}
