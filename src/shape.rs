//! Shape and case preservation primitives.
//!
//! Pure functions shared by every engine: the same primitive serves the
//! fake, FPE, and HMAC paths so shape behavior cannot drift between them.

/// Re-apply the case and structure of `original` onto `candidate`.
///
/// Walks both strings in parallel. At each position of `original`:
/// uppercase takes the candidate char uppercased, lowercase takes it
/// lowercased, and any other character is kept from the original
/// verbatim. The result always has the length of `original`; candidate
/// characters beyond that length are dropped, and original characters
/// beyond the candidate's length are kept as-is.
pub fn preserve_case(original: &str, candidate: &str) -> String {
    let cand: Vec<char> = candidate.chars().collect();
    original
        .chars()
        .enumerate()
        .map(|(i, oc)| match cand.get(i) {
            Some(&cc) if oc.is_uppercase() => cc.to_ascii_uppercase(),
            Some(&cc) if oc.is_lowercase() => cc.to_ascii_lowercase(),
            _ => oc,
        })
        .collect()
}

/// Replace the digit positions of `template` with successive digits from
/// `digits`, leaving every non-digit character in place. Extra digit
/// positions beyond `digits` keep their original value.
pub fn emplace_digits(template: &str, digits: &str) -> String {
    let mut supply = digits.chars();
    template
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                supply.next().unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Extract only the ASCII digits of a string.
pub fn extract_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Luhn check digit for a digit string (without the check digit).
pub fn luhn_check_digit(digits: &str) -> u8 {
    let sum: u32 = digits
        .chars()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let d = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

/// Whether a digit string passes the Luhn checksum.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.len() < 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let body = &digits[..digits.len() - 1];
    let check = digits.as_bytes()[digits.len() - 1] - b'0';
    luhn_check_digit(body) == check
}

/// Split a domain into its leading labels and trailing TLD.
///
/// `"mail.acme.com"` → `(["mail", "acme"], "com")`. A single-label input
/// has no TLD and returns `([label], "")`.
pub fn split_tld(domain: &str) -> (Vec<&str>, &str) {
    let parts: Vec<&str> = domain.split('.').collect();
    match parts.split_last() {
        Some((tld, labels)) if !labels.is_empty() => (labels.to_vec(), tld),
        _ => (parts, ""),
    }
}

/// Whether a value reads as a bare domain: two or more dot-separated
/// labels of alphanumerics/hyphens with an alphabetic TLD-like tail.
pub fn looks_like_domain(value: &str) -> bool {
    if value.starts_with('.') || value.ends_with('.') || !value.contains('.') {
        return false;
    }
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() < 2 {
        return false;
    }
    let labels_ok = parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_alphanumeric() || c == '-'));
    let tld = parts[parts.len() - 1];
    let tld_ok = (2..=10).contains(&tld.chars().count()) && tld.chars().all(|c| c.is_alphabetic());
    labels_ok && tld_ok
}

/// Truncate a string to at most `max_chars` characters.
/// Safe for UTF-8: uses char boundaries, not byte slicing.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserve_case_basic() {
        assert_eq!(preserve_case("John", "mary"), "Mary");
        assert_eq!(preserve_case("SMITH", "jones"), "JONES");
        assert_eq!(preserve_case("McRae", "bloom"), "BlOom");
    }

    #[test]
    fn test_preserve_case_keeps_original_length() {
        assert_eq!(preserve_case("Jo", "margaret"), "Ma");
        assert_eq!(preserve_case("Jonathan", "al"), "Alnathan");
    }

    #[test]
    fn test_preserve_case_non_alpha_positions() {
        assert_eq!(preserve_case("a-b", "xyz"), "x-z");
        assert_eq!(preserve_case("a.b@c", "vwxyz"), "v.x@z");
    }

    #[test]
    fn test_emplace_digits() {
        assert_eq!(emplace_digits("(03) 9123", "555012"), "(55) 5012");
        // Supply shorter than the template keeps the trailing digits.
        assert_eq!(emplace_digits("12-34", "98"), "98-34");
        assert_eq!(emplace_digits("+61-421-555-829", "987654321"), "+98-765-432-129");
    }

    #[test]
    fn test_emplace_digits_preserves_punctuation() {
        let out = emplace_digits("4111-1111-1111-1111", "9999999999999999");
        assert_eq!(out, "9999-9999-9999-9999");
    }

    #[test]
    fn test_extract_digits() {
        assert_eq!(extract_digits("+61-421-555-829"), "61421555829");
        assert_eq!(extract_digits("no digits"), "");
    }

    #[test]
    fn test_luhn_check_digit() {
        // 411111111111111 + check digit 1 = the classic test PAN
        assert_eq!(luhn_check_digit("411111111111111"), 1);
        assert!(luhn_valid("4111111111111111"));
        assert!(!luhn_valid("4111111111111112"));
    }

    #[test]
    fn test_split_tld() {
        let (labels, tld) = split_tld("mail.acme.com");
        assert_eq!(labels, vec!["mail", "acme"]);
        assert_eq!(tld, "com");

        let (labels, tld) = split_tld("localhost");
        assert_eq!(labels, vec!["localhost"]);
        assert_eq!(tld, "");
    }

    #[test]
    fn test_looks_like_domain() {
        assert!(looks_like_domain("acme.com"));
        assert!(looks_like_domain("tenant.onmicrosoft.com"));
        assert!(!looks_like_domain("hello world"));
        assert!(!looks_like_domain(".acme.com"));
        assert!(!looks_like_domain("acme.com."));
        assert!(!looks_like_domain("192.168.0.1")); // numeric tail
        assert!(!looks_like_domain("noperiod"));
    }

    #[test]
    fn test_truncate_chars_utf8() {
        assert_eq!(truncate_chars("café", 3), "caf");
        assert_eq!(truncate_chars("café", 10), "café");
        assert_eq!(truncate_chars("日本語テキスト", 2), "日本");
    }
}
