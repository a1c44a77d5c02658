//! Comment and trailing-comma stripping for relaxed JSON.
//!
//! Hand-edited JSON files often carry `//` and `/* */` comments and a comma
//! after the last element. [`strip`] turns such input into strict JSON by
//! blanking those bytes out. Every removed byte is replaced by a space and
//! newlines inside comments are kept, so line and column numbers reported by
//! the parser still point into the original text.
//!
//! ```rust
//! use canonconv::sanitize::strip;
//!
//! let relaxed = b"{\"a\": 1, /* note */ \"b\": [1, 2,], // done\n}";
//! let strict = strip(relaxed);
//! let value: serde_json::Value = serde_json::from_slice(&strict).unwrap();
//! assert_eq!(value["b"][1], 2);
//! ```

/// Blanks out comments and dangling commas in `input`.
///
/// Double-quoted strings are copied verbatim (backslash escapes honoured), so
/// `//`, `/*` and `,}` inside a string are left alone. A block comment with no
/// terminator runs to the end of the input.
#[must_use]
pub fn strip(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    // Position in `out` of a comma that so far is followed only by
    // whitespace or comments.
    let mut dangling: Option<usize> = None;
    // Only a comma that follows a value can dangle; `[,]` stays invalid.
    let mut after_value = false;
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'"' => {
                dangling = None;
                after_value = true;
                let end = string_end(input, i);
                out.extend_from_slice(&input[i..end]);
                i = end;
            }
            b'/' if input.get(i + 1) == Some(&b'/') => {
                while i < input.len() && input[i] != b'\n' {
                    out.push(b' ');
                    i += 1;
                }
            }
            b'/' if input.get(i + 1) == Some(&b'*') => {
                let end = find(input, i + 2, b"*/").map_or(input.len(), |pos| pos + 2);
                blank(&input[i..end], &mut out);
                i = end;
            }
            b',' => {
                dangling = after_value.then_some(out.len());
                after_value = false;
                out.push(b',');
                i += 1;
            }
            close @ (b']' | b'}') => {
                if let Some(pos) = dangling.take() {
                    out[pos] = b' ';
                }
                after_value = true;
                out.push(close);
                i += 1;
            }
            ws @ (b' ' | b'\t' | b'\r' | b'\n') => {
                out.push(ws);
                i += 1;
            }
            other => {
                dangling = None;
                after_value = !matches!(other, b'[' | b'{' | b':');
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

/// Index one past the closing quote of the string starting at `start`.
fn string_end(input: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    input.len()
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

fn blank(comment: &[u8], out: &mut Vec<u8>) {
    out.extend(
        comment
            .iter()
            .map(|&b| if b == b'\n' || b == b'\r' { b } else { b' ' }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_str(input: &str) -> String {
        String::from_utf8(strip(input.as_bytes())).unwrap()
    }

    #[test]
    fn test_line_comment_keeps_newline() {
        assert_eq!(strip_str("1 // one\n"), "1       \n");
    }

    #[test]
    fn test_block_comment_keeps_line_count() {
        let out = strip_str("[1, /* a\nb */ 2]");
        assert_eq!(out.lines().count(), 2);
        assert_eq!(out.split_whitespace().collect::<String>(), "[1,2]");
    }

    #[test]
    fn test_trailing_commas() {
        let out = strip_str("{\"a\": [1, 2, ], \"b\": 3,\n}");
        assert_eq!(out.split_whitespace().collect::<String>(), "{\"a\":[1,2],\"b\":3}");
    }

    #[test]
    fn test_trailing_comma_before_comment() {
        let out = strip_str("[1, 2, // last\n /* more */ ]");
        assert_eq!(out.split_whitespace().collect::<String>(), "[1,2]");
    }

    #[test]
    fn test_strings_untouched() {
        let input = r#"{"url": "http://x/*y*/", "t": ",]", "q": "say \"//hi\""}"#;
        assert_eq!(strip_str(input), input);
    }

    #[test]
    fn test_unterminated_block_comment_consumes_rest() {
        assert_eq!(strip_str("[1] /* open").trim_end(), "[1]");
    }

    #[test]
    fn test_comma_without_value_kept() {
        assert_eq!(strip_str("[,]"), "[,]");
        assert_eq!(strip_str("{ , }"), "{ , }");
        assert_eq!(strip_str("[1,,]"), "[1,,]");
        assert_eq!(strip_str("{\"a\": [],}"), "{\"a\": [] }");
    }

    #[test]
    fn test_inner_commas_kept() {
        assert_eq!(strip_str("[1,2,3]"), "[1,2,3]");
        assert_eq!(strip_str("{\"a\":1,\"b\":2}"), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn test_non_ascii_passes_through() {
        assert_eq!(strip_str("[\"zürich\", /* ☃ */ \"東京\",]").split_whitespace().collect::<String>(), "[\"zürich\",\"東京\"]");
    }
}
