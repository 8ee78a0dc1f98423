//! パス要素のサニタイズ
//!
//! 画面から読み取ったテキストをディレクトリ名・ファイル名に使えるように整える。

use regex::Regex;

/// パス要素として使えない文字
pub const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// パス要素をサニタイズ
///
/// 1. 前後の空白を除去
/// 2. 予約文字 `<>:"/\|?*` を `_` に置換
/// 3. 連続する空白を1つの `_` に置換
///
/// `.` / `..` になった場合は `_` を返す。
///
/// # Examples
/// ```
/// use job_scrape_common::sanitize_path_component;
///
/// assert_eq!(sanitize_path_component("Bob's /Lawn\\Care  "), "Bob's__Lawn_Care");
/// ```
pub fn sanitize_path_component(component: &str) -> String {
    lazy_static::lazy_static! {
        static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    }

    let replaced: String = component
        .trim()
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let collapsed = WHITESPACE_RE.replace_all(&replaced, "_").into_owned();

    if collapsed == "." || collapsed == ".." {
        return "_".to_string();
    }
    collapsed
}

/// ファイル名ラベルからサイズ表記を除去
///
/// 例: `"site photo.jpg (1.2 MB)"` → `"site photo.jpg"`
pub fn strip_size_annotation(label: &str) -> String {
    lazy_static::lazy_static! {
        static ref SIZE_RE: Regex = Regex::new(
            r"(?i)[\s\-]*[\(\[]\s*\d+(?:[.,]\d+)?\s*(?:bytes?|b|kb|mb|gb|kib|mib|gib)\s*[\)\]]"
        ).unwrap();
    }

    SIZE_RE.replace_all(label, "").trim().to_string()
}

/// ラベルを整形してファイル名にする（空なら None）
pub fn clean_file_label(label: &str) -> Option<String> {
    let stripped = strip_size_annotation(label);
    let sanitized = sanitize_path_component(&stripped);
    let meaningful = sanitized.trim_matches(|c| c == '_' || c == '.');
    if meaningful.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// ファイル名の拡張子（小文字、ドットなし）
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// URLのパス部分から拡張子を推定
pub fn extension_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = without_query.rsplit('/').next().unwrap_or(without_query);
    file_extension(last_segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_literal_rule() {
        assert_eq!(sanitize_path_component("Bob's /Lawn\\Care  "), "Bob's__Lawn_Care");
    }

    #[test]
    fn test_sanitize_removes_all_reserved() {
        let input = r#" a<b>c:d"e/f\g|h?i*j "#;
        let out = sanitize_path_component(input);
        assert!(!out.chars().any(|c| RESERVED_CHARS.contains(&c)));
        assert_eq!(out, "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_path_component("Swap \t filters\n now"), "Swap_filters_now");
        assert_eq!(sanitize_path_component("   "), "");
    }

    #[test]
    fn test_sanitize_dot_components() {
        assert_eq!(sanitize_path_component(".."), "_");
        assert_eq!(sanitize_path_component(" . "), "_");
        assert_eq!(sanitize_path_component("..."), "...");
    }

    #[test]
    fn test_strip_size_annotation() {
        assert_eq!(strip_size_annotation("site photo.jpg (1.2 MB)"), "site photo.jpg");
        assert_eq!(strip_size_annotation("quote.pdf - (120 KB)"), "quote.pdf");
        assert_eq!(strip_size_annotation("notes.txt [512 bytes]"), "notes.txt");
        assert_eq!(strip_size_annotation("plan (v2).pdf"), "plan (v2).pdf");
    }

    #[test]
    fn test_clean_file_label() {
        assert_eq!(clean_file_label("site photo.jpg (1.2 MB)"), Some("site_photo.jpg".to_string()));
        assert_eq!(clean_file_label("  (3 KB) "), None);
        assert_eq!(clean_file_label("???"), None);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(file_extension("quote.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("no_extension"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(
            extension_from_url("https://cdn.example.com/files/abc/photo.jpeg?sig=1"),
            Some("jpeg".to_string())
        );
        assert_eq!(extension_from_url("https://cdn.example.com/download/123"), None);
    }
}
