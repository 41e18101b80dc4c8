pub mod performance;

// ─── Lenient query parsing ───────────────────────────────────────
//
// The admin read path never rejects bad query input: anything that
// fails to parse yields `None` so the caller's documented default
// applies. This keeps the dashboard renderable no matter what a stale
// client sends.

/// "true"/"1"/"yes" and "false"/"0"/"no", case-insensitive.
pub(crate) fn parse_bool(raw: Option<&String>) -> Option<bool> {
    match raw?.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_u32(raw: Option<&String>) -> Option<u32> {
    raw?.parse().ok()
}

pub(crate) fn parse_usize(raw: Option<&String>) -> Option<usize> {
    raw?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool(Some(&s("true"))), Some(true));
        assert_eq!(parse_bool(Some(&s("YES"))), Some(true));
        assert_eq!(parse_bool(Some(&s("1"))), Some(true));
        assert_eq!(parse_bool(Some(&s("false"))), Some(false));
        assert_eq!(parse_bool(Some(&s("no"))), Some(false));
        assert_eq!(parse_bool(Some(&s("0"))), Some(false));
    }

    #[test]
    fn garbage_falls_through_to_defaults() {
        assert_eq!(parse_bool(None), None);
        assert_eq!(parse_bool(Some(&s("maybe"))), None);
        assert_eq!(parse_u32(Some(&s("abc"))), None);
        assert_eq!(parse_u32(Some(&s("-1"))), None);
        assert_eq!(parse_usize(Some(&s("12.5"))), None);
    }

    #[test]
    fn numbers_parse() {
        assert_eq!(parse_u32(Some(&s("900"))), Some(900));
        assert_eq!(parse_usize(Some(&s("25"))), Some(25));
    }
}
