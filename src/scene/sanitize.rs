/// Maximum stored length of free-text fields after sanitization.
pub const MAX_TEXT_LEN: usize = 100;

/// Sanitize user text before it is stored in a creation.
///
/// Order matters: script blocks are removed with their content, remaining
/// tags are stripped, and only then are the five reserved HTML characters
/// entity-encoded, so encoded fragments are never re-interpreted as tags.
/// The result is truncated to `max_len` characters and trimmed.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let without_scripts = strip_script_blocks(input);
    let without_tags = strip_tags(&without_scripts);

    let mut encoded = String::with_capacity(without_tags.len());
    for ch in without_tags.chars() {
        match ch {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#039;"),
            _ => encoded.push(ch),
        }
    }

    let truncated: String = encoded.chars().take(max_len).collect();
    truncated.trim().to_owned()
}

/// Remove `<script ...> ... </script>` spans including their content,
/// case-insensitively. An unterminated script block is dropped to the end of
/// the input.
fn strip_script_blocks(input: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(rel_start) = lower[pos..].find("<script") {
        let start = pos + rel_start;
        out.push_str(&input[pos..start]);

        match lower[start..].find("</script>") {
            Some(rel_end) => pos = start + rel_end + "</script>".len(),
            None => return out,
        }
    }

    out.push_str(&input[pos..]);
    out
}

/// Remove complete `<...>` tag spans. A dangling `<` with no closing `>` is
/// not a tag; it survives stripping and is neutralized by entity encoding.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_blocks_with_content() {
        assert_eq!(
            sanitize_text("<script>alert(1)</script>Hi <b>there</b>", MAX_TEXT_LEN),
            "Hi there"
        );
    }

    #[test]
    fn strips_mixed_case_script_blocks() {
        assert_eq!(
            sanitize_text("a<ScRiPt type=\"x\">bad()</sCrIpT>b", MAX_TEXT_LEN),
            "ab"
        );
    }

    #[test]
    fn unterminated_script_drops_to_end() {
        assert_eq!(sanitize_text("safe<script>evil", MAX_TEXT_LEN), "safe");
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(
            sanitize_text("Tom & \"Jerry's\" 1 > 0", MAX_TEXT_LEN),
            "Tom &amp; &quot;Jerry&#039;s&quot; 1 &gt; 0"
        );
    }

    #[test]
    fn stray_angle_bracket_is_encoded_not_stripped() {
        assert_eq!(
            sanitize_text("1 < 2 and done", MAX_TEXT_LEN),
            "1 &lt; 2 and done"
        );
    }

    #[test]
    fn truncates_then_trims() {
        // 99 x's + " end": the cut lands on the space, which trim removes.
        let long = format!("{} end", "x".repeat(99));
        let out = sanitize_text(&long, MAX_TEXT_LEN);
        assert_eq!(out, "x".repeat(99));

        assert_eq!(sanitize_text("  padded  ", MAX_TEXT_LEN), "padded");
    }

    #[test]
    fn empty_and_tag_only_inputs_collapse() {
        assert_eq!(sanitize_text("", MAX_TEXT_LEN), "");
        assert_eq!(sanitize_text("<b></b>", MAX_TEXT_LEN), "");
    }
}
