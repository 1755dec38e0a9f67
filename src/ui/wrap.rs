/// Word wrap by display width. Always returns at least one line, so an empty
/// item still occupies a row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let wrapped = wrap_ansi::wrap_ansi(text, width, None);
    let mut lines: Vec<String> = wrapped.lines().map(str::to_string).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap("hello world", 5), ["hello", "world"]);
        assert_eq!(wrap("one two three", 8), ["one two", "three"]);
    }

    #[test]
    fn empty_text_is_one_blank_line() {
        assert_eq!(wrap("", 10), [""]);
    }

    #[test]
    fn zero_width_leaves_text_alone() {
        assert_eq!(wrap("a b c", 0), ["a b c"]);
    }

    #[test]
    fn wide_characters_count_double() {
        let lines = wrap("日本 語", 4);
        assert_eq!(lines, ["日本", "語"]);
        assert!(lines.iter().all(|line| line.width() <= 4));
    }

    #[test]
    fn embedded_newlines_start_new_lines() {
        assert_eq!(wrap("a\nb", 10), ["a", "b"]);
    }
}
