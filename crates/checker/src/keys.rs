//! Candidate key parsing and masking.

const MASK_GLYPH: char = '•';
const ELLIPSIS: char = '…';
const SHORT_KEY_MAX: usize = 10;
const VISIBLE_TAIL: usize = 4;
const VISIBLE_HEAD: usize = 6;

/// Trim a single raw key, `None` when nothing is left.
pub fn sanitize_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Split free-form text on newlines or commas.
///
/// Pieces are trimmed and empty ones dropped. Order and duplicates are kept.
pub fn parse_keys(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .filter_map(sanitize_key)
        .collect()
}

/// Redact a key for display.
///
/// Keys of up to ten characters keep only their last four characters visible;
/// longer keys render as the first six, an ellipsis and the last four.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();

    if len <= SHORT_KEY_MAX {
        return chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i + VISIBLE_TAIL < len { MASK_GLYPH } else { *c })
            .collect();
    }

    let mut out: String = chars[..VISIBLE_HEAD].iter().collect();
    out.push(ELLIPSIS);
    out.extend(&chars[len - VISIBLE_TAIL..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty_pieces() {
        assert_eq!(parse_keys("  a  ,b\n\n c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_handles_crlf_and_keeps_duplicates() {
        assert_eq!(parse_keys("k1\r\nk2,k1\r\n"), vec!["k1", "k2", "k1"]);
    }

    #[test]
    fn parse_of_blank_input_is_empty() {
        assert!(parse_keys("").is_empty());
        assert!(parse_keys(" ,\n ,, \r\n").is_empty());
    }

    #[test]
    fn parse_is_stable_on_its_own_output() {
        let once = parse_keys(" x ,y\n z");
        let twice = parse_keys(&once.join("\n"));
        assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_rejects_whitespace() {
        assert_eq!(sanitize_key(""), None);
        assert_eq!(sanitize_key(" \t\n"), None);
        assert_eq!(sanitize_key("  AIza  ").as_deref(), Some("AIza"));
    }

    #[test]
    fn mask_short_key_keeps_last_four() {
        assert_eq!(mask_key("short1234"), "•••••1234");
        assert_eq!(mask_key("abcdefghij"), "••••••ghij");
    }

    #[test]
    fn mask_tiny_key_is_left_visible() {
        assert_eq!(mask_key("abcd"), "abcd");
        assert_eq!(mask_key("abc"), "abc");
    }

    #[test]
    fn mask_long_key_shows_head_and_tail() {
        let key = "AIzaSyABCDEFGHIJKLMNOP";
        let masked = mask_key(key);
        assert_eq!(masked, "AIzaSy…MNOP");
        assert!(!masked.contains(key));
    }

    #[test]
    fn mask_boundary_eleven_chars() {
        assert_eq!(mask_key("abcdefghijk"), "abcdef…hijk");
    }

    #[test]
    fn mask_counts_characters_not_bytes() {
        assert_eq!(mask_key("ключключ12"), "••••••юч12");
    }
}
