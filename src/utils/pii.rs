//! Personally identifiable information patterns for memo text

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Category of a PII match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PiiKind {
    Email,
    Phone,
    CreditCard,
    Ssn,
    IpAddress,
    Iban,
    PersonalName,
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email address",
            Self::Phone => "phone number",
            Self::CreditCard => "card number",
            Self::Ssn => "social security number",
            Self::IpAddress => "IP address",
            Self::Iban => "bank account number",
            Self::PersonalName => "personal name",
        };
        f.write_str(name)
    }
}

/// One PII occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMatch {
    pub kind: PiiKind,
    pub text: String,
    pub start: usize,
}

macro_rules! pii_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: Lazy<Option<Regex>> = Lazy::new(|| Regex::new($regex_str).ok());
    };
}

pii_pattern!(RE_EMAIL, r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}");
pii_pattern!(RE_PHONE, r"(?:^|\s)((?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})(?:[\s.,;:!?)]|$)");
pii_pattern!(
    RE_CREDIT_CARD,
    r"\b(?:4\d{3}|5[1-5]\d{2}|3[47]\d{2}|6(?:011|5\d{2}))[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{3,4}\b"
);
pii_pattern!(RE_SSN, r"\b\d{3}-\d{2}-\d{4}\b");
pii_pattern!(
    RE_IPV4,
    r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b"
);
pii_pattern!(RE_IBAN, r"\b[A-Z]{2}\d{2}[A-Z0-9]{4}\d{7}(?:[A-Z0-9]?\d{0,16})\b");
pii_pattern!(
    RE_NAME,
    r"\b(?i:my name is|name\s*[:=]|from|to|for|paid by|sent by)\s+([A-Z][a-z]+\s+[A-Z][a-z]+)"
);

static PATTERNS: Lazy<Vec<(PiiKind, &'static Lazy<Option<Regex>>)>> = Lazy::new(|| {
    vec![
        (PiiKind::Email, &RE_EMAIL),
        (PiiKind::CreditCard, &RE_CREDIT_CARD),
        (PiiKind::Ssn, &RE_SSN),
        (PiiKind::Phone, &RE_PHONE),
        (PiiKind::IpAddress, &RE_IPV4),
        (PiiKind::Iban, &RE_IBAN),
        (PiiKind::PersonalName, &RE_NAME),
    ]
});

/// Find PII in `text`, ordered by position. A span claimed by an earlier
/// pattern (e.g. a card number) is not reported again by a later one.
pub fn scan(text: &str) -> Vec<PiiMatch> {
    let mut matches: Vec<PiiMatch> = Vec::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for (kind, pattern) in PATTERNS.iter() {
        let regex = match pattern.as_ref() {
            Some(regex) => regex,
            None => continue,
        };
        for captures in regex.captures_iter(text) {
            let m = match captures.get(1).or_else(|| captures.get(0)) {
                Some(m) => m,
                None => continue,
            };
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));
            matches.push(PiiMatch {
                kind: *kind,
                text: m.as_str().trim().to_string(),
                start: m.start(),
            });
        }
    }

    matches.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.kind.cmp(&b.kind)));
    matches
}

/// Whether the text reads as human-written words rather than an opaque
/// token (hash, id, base58 blob).
pub fn is_free_text(text: &str) -> bool {
    text.split_whitespace()
        .filter(|word| word.len() >= 3 && word.chars().all(|c| c.is_alphabetic()))
        .count()
        >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_detected() {
        let matches = scan("invoice for alice@example.com thanks");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, PiiKind::Email);
        assert_eq!(matches[0].text, "alice@example.com");
    }

    #[test]
    fn test_phone_and_card() {
        let matches = scan("call 555-123-4567 card 4111 1111 1111 1111");
        let kinds: Vec<PiiKind> = matches.iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&PiiKind::Phone));
        assert!(kinds.contains(&PiiKind::CreditCard));
        let phone = matches.iter().find(|m| m.kind == PiiKind::Phone).unwrap();
        assert_eq!(phone.text, "555-123-4567");
    }

    #[test]
    fn test_phone_before_punctuation() {
        for memo in ["call 555-123-4567.", "call 555-123-4567, thanks", "(or 555-123-4567)"] {
            let phone = scan(memo).into_iter().find(|m| m.kind == PiiKind::Phone);
            assert_eq!(phone.map(|m| m.text), Some("555-123-4567".to_string()), "{}", memo);
        }
        // digits running on are not a phone number
        assert!(scan("ref 555-123-45678").iter().all(|m| m.kind != PiiKind::Phone));
    }

    #[test]
    fn test_personal_name() {
        let matches = scan("rent paid by John Smith");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, PiiKind::PersonalName);
        assert_eq!(matches[0].text, "John Smith");
    }

    #[test]
    fn test_opaque_tokens_are_clean() {
        assert!(scan("4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi").is_empty());
        assert!(scan("order-8842").is_empty());
        assert!(!is_free_text("4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi"));
        assert!(is_free_text("thanks for dinner"));
    }
}
