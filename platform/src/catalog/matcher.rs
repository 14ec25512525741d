/// Whether `query` is eligible for pinyin initial matching.
pub fn is_phonetic_query(query: &str) -> bool {
    !query.is_empty() && query.chars().all(char::is_alphabetic)
}

/// Matches the letters of `query` in order against `hint`, ignoring case.
///
/// The first letter has to be the first character of the hint; every
/// following letter may appear anywhere after the previous one. So `yxlm`
/// matches `yingxiong lianmeng` while `xlm` does not.
pub fn matches_phonetic(query: &str, hint: &str) -> bool {
    let mut hint_chars = hint.chars().flat_map(char::to_lowercase);
    let mut query_chars = query.chars().flat_map(char::to_lowercase);

    let Some(first) = query_chars.next() else {
        return false;
    };
    if hint_chars.next() != Some(first) {
        return false;
    }

    query_chars.all(|wanted| hint_chars.any(|c| c == wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials_match_in_order() {
        assert!(matches_phonetic("yxlm", "yingxiong lianmeng"));
        assert!(matches_phonetic("YXLM", "yingxiong lianmeng"));
        assert!(matches_phonetic("csgo", "csgo"));
        assert!(matches_phonetic("y", "yingxiong lianmeng"));
    }

    #[test]
    fn test_match_is_anchored_at_the_start() {
        assert!(!matches_phonetic("xlm", "yingxiong lianmeng"));
    }

    #[test]
    fn test_out_of_order_letters_do_not_match() {
        assert!(!matches_phonetic("ylxm", "yingxiong lianmeng"));
        assert!(!matches_phonetic("csgoo", "csgo"));
    }

    #[test]
    fn test_phonetic_queries_are_alphabetic_only() {
        assert!(is_phonetic_query("yxlm"));
        assert!(!is_phonetic_query("cs:go"));
        assert!(!is_phonetic_query("2k"));
        assert!(!is_phonetic_query(""));
    }
}
