//! Width and whitespace normalization.

use super::delimiters::is_sentinel;
use regex::Regex;
use std::sync::LazyLock;

static RE_SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{A0}]+").expect("RE_SPACE_RUN regex"));

/// List markers exposed by width conversion (`＃`, `＊`, `；`, `：`).
static RE_LEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:[*#;:]+ *)+").expect("RE_LEADING_MARKERS regex"));

/// A line holding nothing but one word token (leftover template names, magic words).
static RE_RESIDUE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\w+\s*$").expect("RE_RESIDUE_LINE regex"));

/// Normalizes resolved text into clean lines.
///
/// - Fullwidth ASCII and ideographic space to halfwidth (kana untouched)
/// - Residual sentinels from unbalanced markup removed
/// - Space, tab and no-break space runs collapsed
/// - Leading list markers stripped again after conversion
/// - Single-token residue lines and blank lines removed
///
/// Heading lines start with the topic marker, so the marker pass never
/// touches them.
pub fn normalize_text(input: &str) -> String {
    let halfwidth = to_halfwidth(input);
    let collapsed = RE_SPACE_RUN.replace_all(&halfwidth, " ");
    let unmarked = RE_LEADING_MARKERS.replace_all(&collapsed, "");

    unmarked
        .lines()
        .filter(|line| !line.trim().is_empty() && !RE_RESIDUE_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts fullwidth ASCII forms to halfwidth and drops sentinels.
pub fn to_halfwidth(input: &str) -> String {
    let mut result = String::with_capacity(input.len());

    for c in input.chars() {
        if is_sentinel(c) {
            continue;
        }

        if let Some(normalized) = normalize_fullwidth(c) {
            result.push(normalized);
            continue;
        }

        result.push(c);
    }

    result
}

/// Normalize fullwidth characters to ASCII equivalents
fn normalize_fullwidth(c: char) -> Option<char> {
    match c {
        '\u{3000}' => Some(' '), // Ideographic space -> regular space
        '\u{FF01}'..='\u{FF5E}' => {
            // Fullwidth ASCII variants (！to ～)
            let offset = c as u32 - 0xFF01;
            char::from_u32(0x21 + offset) // Map to ASCII ! to ~
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullwidth_digits_and_parentheses() {
        assert_eq!(to_halfwidth("１２３（テスト）"), "123(テスト)");
    }

    #[test]
    fn test_kana_unchanged() {
        let input = "ひらがなカタカナｶﾀｶﾅ";
        assert_eq!(to_halfwidth(input), input);
    }

    #[test]
    fn test_fullwidth_letters() {
        assert_eq!(to_halfwidth("ＡＢＣｘｙｚ！"), "ABCxyz!");
    }

    #[test]
    fn test_sentinels_dropped() {
        assert_eq!(to_halfwidth("a\u{E000}b\u{E005}c"), "abc");
    }

    #[test]
    fn test_space_runs_collapsed() {
        assert_eq!(normalize_text("東京　　都\t\tの\u{A0}首都 です"), "東京 都 の 首都 です");
    }

    #[test]
    fn test_residue_and_blank_lines_removed() {
        let input = "Infobox\n本文です。\n\n   \n  PAGENAME  \n次の文。";
        assert_eq!(normalize_text(input), "本文です。\n次の文。");
    }

    #[test]
    fn test_heading_lines_survive() {
        let input = "\u{E006}歴史\n江戸時代に発展した。";
        assert_eq!(normalize_text(input), input);
    }

    #[test]
    fn test_fullwidth_list_markers_stripped() {
        let input = "：注意して読むこと。\n＃１位になった。\n＊　＃ 入れ子の項目です。";
        assert_eq!(
            normalize_text(input),
            "注意して読むこと。\n1位になった。\n入れ子の項目です。"
        );
    }

    #[test]
    fn test_markers_inside_line_kept() {
        assert_eq!(normalize_text("第＃１号：開始"), "第#1号:開始");
    }

    #[test]
    fn test_fullwidth_residue_word_removed_after_conversion() {
        assert_eq!(normalize_text("ＡＢＣ\n文章です。"), "文章です。");
    }
}
