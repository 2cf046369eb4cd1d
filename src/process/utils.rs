const SPACE: &str = " ";
const VOID: &str = "";
const QUOTE: &str = "\"";

/// Literal substitutions applied to raw cell text, in this order.
/// `\r\x07` is the end-of-cell mark and must go before the bare `\r`.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\r\x07", VOID),
    ("\x0c", SPACE),
    ("\x0b", SPACE),
    ("\r", SPACE),
    ("\u{201c}", QUOTE),
    ("\u{201d}", QUOTE),
    ("\x00", VOID),
];

/// Unicode whitespace plus the ASCII information separators, which the
/// host emits inside some cells.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Normalize raw cell text: fixed substitutions, then collapse every
/// whitespace run to a single space and trim both ends.
///
/// Total and idempotent. The output never contains a tab or a newline.
pub fn clean_cell(raw: &str) -> String {
    let mut value = raw.to_string();
    for (from, to) in REPLACEMENTS {
        if value.contains(from) {
            value = value.replace(from, to);
        }
    }
    value
        .split(is_blank)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(SPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_sequences() {
        assert_eq!(clean_cell("  Привет\r\n\x0cмир  "), "Привет мир");
        assert_eq!(clean_cell("105,7\r\x07"), "105,7");
        assert_eq!(clean_cell("a\x0bb\x00c"), "a bc");
    }

    #[test]
    fn normalizes_curly_quotes() {
        assert_eq!(
            clean_cell("\u{201c}Газпром\u{201d}"),
            "\"Газпром\""
        );
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(clean_cell(""), "");
        assert_eq!(clean_cell("   \t\r\x07"), "");
        assert_eq!(clean_cell("\r\x07"), "");
    }

    #[test]
    fn collapses_all_whitespace_kinds() {
        let raw = "733,8\t\u{a0}\u{a0}млрд\n\n руб.\x1f";
        assert_eq!(clean_cell(raw), "733,8 млрд руб.");
    }

    #[test]
    fn no_runs_and_idempotent() {
        let samples = [
            "",
            " ",
            "\r\x07\r\x07",
            "  a  b\t\tc ",
            "Индекс\x0bпромышленного\rпроизводства\r\x07",
            "\u{201c} x \u{201d}",
            "\x1c\x1d\x1e",
            "line\u{2028}sep\u{3000}x",
        ];
        for s in samples {
            let once = clean_cell(s);
            assert_eq!(once, once.trim(), "{s:?}");
            assert!(!once.contains("  "), "{s:?} -> {once:?}");
            assert!(!once.contains('\t') && !once.contains('\n'));
            assert_eq!(clean_cell(&once), once, "not idempotent for {s:?}");
        }
    }
}
