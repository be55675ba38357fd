//! Column type detection using header hints and sample pattern matching.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Data types the engine knows how to anonymize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Email,
    Phone,
    Name,
    Uuid,
    Iban,
    CreditCard,
    Abn,
    Address,
    Date,
    NumericId,
    Domain,
    FreeText,
    Unknown,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Name => "name",
            DataType::Uuid => "uuid",
            DataType::Iban => "iban",
            DataType::CreditCard => "credit_card",
            DataType::Abn => "abn",
            DataType::Address => "address",
            DataType::Date => "date",
            DataType::NumericId => "numeric_id",
            DataType::Domain => "domain",
            DataType::FreeText => "free_text",
            DataType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(DataType::Email),
            "phone" => Ok(DataType::Phone),
            "name" => Ok(DataType::Name),
            "uuid" | "guid" => Ok(DataType::Uuid),
            "iban" => Ok(DataType::Iban),
            "credit_card" | "card" => Ok(DataType::CreditCard),
            "abn" => Ok(DataType::Abn),
            "address" => Ok(DataType::Address),
            "date" => Ok(DataType::Date),
            "numeric_id" => Ok(DataType::NumericId),
            "domain" => Ok(DataType::Domain),
            "free_text" => Ok(DataType::FreeText),
            "unknown" => Ok(DataType::Unknown),
            other => Err(format!("unknown data type \"{}\"", other)),
        }
    }
}

/// Detection window: only the first N non-empty samples are examined.
const SAMPLE_WINDOW: usize = 100;

/// Score assigned when a column header names its own type.
const HINT_SCORE: f32 = 0.8;

/// Detects column data types from header names and sample values.
///
/// Detection results are cached per `(column, sample_count)` for the
/// lifetime of the detector; cache hits return with confidence 0.9.
pub struct Detector {
    email: Regex,
    uuid: Regex,
    iban: Regex,
    credit_card: Regex,
    abn: Regex,
    numeric_id: Regex,
    phone: Vec<Regex>,
    date: Vec<Regex>,
    cache: HashMap<(String, usize), DataType>,
}

impl Detector {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"(?i)^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
            uuid: Regex::new(
                r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
            )
            .unwrap(),
            iban: Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{4,30}$").unwrap(),
            credit_card: Regex::new(r"^\d{13,19}$").unwrap(),
            abn: Regex::new(r"^\d{11}$").unwrap(),
            numeric_id: Regex::new(r"^\d+$").unwrap(),
            phone: vec![
                Regex::new(r"^\+?[1-9]\d{1,14}$").unwrap(),
                Regex::new(r"^\+?\d{1,4}[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{1,9}[-.\s]?\d{1,9}$")
                    .unwrap(),
                // Australian
                Regex::new(r"^\+?61[-.\s]?\d[-.\s]?\d{4}[-.\s]?\d{4}$").unwrap(),
                // US/Canada
                Regex::new(r"^\+?1[-.\s]?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}$").unwrap(),
            ],
            date: vec![
                Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap(),
                Regex::new(r"^\d{2}/\d{2}/\d{4}").unwrap(),
                Regex::new(r"^\d{2}-\d{2}-\d{4}").unwrap(),
                Regex::new(r"^\d{4}/\d{2}/\d{2}").unwrap(),
            ],
            cache: HashMap::new(),
        }
    }

    /// Detect the data type of a column from its header and sample values.
    ///
    /// Returns the detected type and a confidence in `[0, 1]`. An explicit
    /// override short-circuits with confidence 1.0.
    pub fn detect(
        &mut self,
        column_name: &str,
        samples: &[String],
        user_override: Option<DataType>,
    ) -> (DataType, f32) {
        if let Some(dt) = user_override {
            return (dt, 1.0);
        }

        let cache_key = (column_name.to_string(), samples.len());
        if let Some(&dt) = self.cache.get(&cache_key) {
            return (dt, 0.9);
        }

        let valid: Vec<&str> = samples
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if valid.is_empty() {
            return (DataType::Unknown, 0.0);
        }
        let window = &valid[..valid.len().min(SAMPLE_WINDOW)];

        let name_lower = column_name.to_lowercase();
        let hinted = |keys: &[&str]| keys.iter().any(|k| name_lower.contains(k));

        // Candidates in declaration order; ratio is kept for tie-breaking
        // (a header hint carries no ratio).
        let mut scored: Vec<(DataType, f32, f32)> = Vec::new();
        let mut push = |dt: DataType, hint: bool, ratio: f32, threshold: f32| {
            if hint {
                scored.push((dt, HINT_SCORE, 0.0));
            } else if ratio > threshold {
                scored.push((dt, ratio, ratio));
            }
        };

        push(
            DataType::Email,
            hinted(&["email", "e-mail"]),
            self.ratio(window, |v| self.email.is_match(v)),
            0.8,
        );
        push(
            DataType::Phone,
            hinted(&["phone", "tel", "mobile"]),
            self.ratio(window, |v| self.phone_like(v)),
            0.7,
        );
        push(
            DataType::Name,
            hinted(&["name", "firstname", "lastname", "surname"]),
            self.ratio(window, looks_like_name),
            0.6,
        );
        push(
            DataType::Uuid,
            hinted(&["uuid", "guid", "id"]),
            self.ratio(window, |v| self.uuid.is_match(v)),
            0.8,
        );
        push(
            DataType::Iban,
            hinted(&["iban"]),
            self.ratio(window, |v| {
                let normalized: String = v
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_uppercase();
                self.iban.is_match(&normalized)
            }),
            0.7,
        );
        push(
            DataType::CreditCard,
            hinted(&["card", "credit", "cc"]),
            self.ratio(window, |v| {
                let digits: String = v.chars().filter(|c| c.is_ascii_digit()).collect();
                self.credit_card.is_match(&digits)
            }),
            0.7,
        );
        push(
            DataType::Abn,
            hinted(&["abn"]),
            self.ratio(window, |v| {
                let digits: String = v.chars().filter(|c| c.is_ascii_digit()).collect();
                self.abn.is_match(&digits)
            }),
            0.7,
        );
        push(
            DataType::Date,
            hinted(&["date", "time", "dob", "birth"]),
            self.ratio(window, |v| self.date.iter().any(|p| p.is_match(v))),
            0.7,
        );
        push(
            DataType::NumericId,
            false,
            self.ratio(window, |v| self.numeric_id.is_match(v)),
            0.9,
        );
        push(
            DataType::Address,
            hinted(&["address", "street", "city", "postcode", "zip"]),
            0.0,
            1.0,
        );

        // Argmax; ties resolved by higher regex ratio, then declaration order.
        let best = scored.iter().fold(None::<(DataType, f32, f32)>, |acc, &c| {
            match acc {
                None => Some(c),
                Some(b) if c.1 > b.1 || (c.1 == b.1 && c.2 > b.2) => Some(c),
                Some(b) => Some(b),
            }
        });

        match best {
            Some((dt, score, _)) => {
                self.cache.insert(cache_key, dt);
                (dt, score)
            }
            None => (DataType::FreeText, 0.3),
        }
    }

    fn ratio(&self, window: &[&str], pred: impl Fn(&str) -> bool) -> f32 {
        let matches = window.iter().filter(|v| pred(v)).count();
        matches as f32 / window.len() as f32
    }

    /// Phone candidacy. The bare patterns are promiscuous (any short
    /// digit run matches), so two guards keep dates, card numbers, and
    /// IBANs out of the phone bucket: the ITU digit-count range and a
    /// date-shape exclusion.
    fn phone_like(&self, raw: &str) -> bool {
        let v = raw.trim();
        if self.date.iter().any(|p| p.is_match(v)) {
            return false;
        }
        let stripped: String = v
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        let digit_count = stripped.chars().filter(|c| c.is_ascii_digit()).count();
        if !(7..=15).contains(&digit_count) {
            return false;
        }
        self.phone.iter().any(|p| p.is_match(&stripped))
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

/// Name heuristic: 1-4 whitespace-delimited tokens, each purely
/// alphabetic, 2-20 chars, starting with an uppercase letter.
fn looks_like_name(value: &str) -> bool {
    let words: Vec<&str> = value.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return false;
    }
    words.iter().all(|w| {
        w.chars().count() >= 2
            && w.chars().count() <= 20
            && w.chars().all(|c| c.is_alphabetic())
            && w.chars().next().is_some_and(|c| c.is_uppercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_override_wins() {
        let mut d = Detector::new();
        let (dt, conf) = d.detect("anything", &strings(&["foo"]), Some(DataType::Phone));
        assert_eq!(dt, DataType::Phone);
        assert_eq!(conf, 1.0);
    }

    #[test]
    fn test_empty_samples_unknown() {
        let mut d = Detector::new();
        let (dt, conf) = d.detect("col", &strings(&["", "   ", "\t"]), None);
        assert_eq!(dt, DataType::Unknown);
        assert_eq!(conf, 0.0);
    }

    #[test]
    fn test_email_by_pattern() {
        let mut d = Detector::new();
        let samples = strings(&["a@b.com", "jane.doe@corp.io", "x+y@site.org"]);
        let (dt, conf) = d.detect("contact", &samples, None);
        assert_eq!(dt, DataType::Email);
        assert!(conf > 0.8);
    }

    #[test]
    fn test_email_by_header_hint() {
        let mut d = Detector::new();
        let (dt, conf) = d.detect("work_email", &strings(&["not-an-email"]), None);
        assert_eq!(dt, DataType::Email);
        assert_eq!(conf, HINT_SCORE);
    }

    #[test]
    fn test_phone_formats() {
        let mut d = Detector::new();
        let samples = strings(&["+61-421-555-829", "+1 212 555 0198", "0412345678"]);
        let (dt, _) = d.detect("c1", &samples, None);
        assert_eq!(dt, DataType::Phone);
    }

    #[test]
    fn test_uuid_by_pattern() {
        let mut d = Detector::new();
        let samples = strings(&[
            "550e8400-e29b-41d4-a716-446655440000",
            "6F9619FF-8B86-D011-B42D-00C04FC964FF",
        ]);
        let (dt, _) = d.detect("ref", &samples, None);
        assert_eq!(dt, DataType::Uuid);
    }

    #[test]
    fn test_numeric_id_beats_id_hint() {
        // "id" header hint raises UUID to 0.8, but an all-digit column
        // matches numeric_id at ratio 1.0 and wins the argmax.
        let mut d = Detector::new();
        let samples = strings(&["10001", "10002", "10003"]);
        let (dt, conf) = d.detect("user_id", &samples, None);
        assert_eq!(dt, DataType::NumericId);
        assert!(conf > 0.9);
    }

    #[test]
    fn test_uuid_column_named_id() {
        let mut d = Detector::new();
        let samples = strings(&["not a uuid", "neither"]);
        let (dt, _) = d.detect("order_id", &samples, None);
        assert_eq!(dt, DataType::Uuid); // hint only; nothing else fires
    }

    #[test]
    fn test_iban_with_spaces() {
        let mut d = Detector::new();
        let samples = strings(&["GB82 WEST 1234 5698 7654 32", "DE89370400440532013000"]);
        let (dt, _) = d.detect("c", &samples, None);
        assert_eq!(dt, DataType::Iban);
    }

    #[test]
    fn test_credit_card_with_dashes() {
        let mut d = Detector::new();
        let samples = strings(&["4111-1111-1111-1111", "5500 0000 0000 0004"]);
        let (dt, _) = d.detect("cc_number", &samples, None);
        assert_eq!(dt, DataType::CreditCard);
    }

    #[test]
    fn test_date_iso() {
        let mut d = Detector::new();
        let samples = strings(&["2021-04-01", "1999-12-31"]);
        let (dt, _) = d.detect("created_date", &samples, None);
        assert_eq!(dt, DataType::Date);
    }

    #[test]
    fn test_name_heuristic() {
        let mut d = Detector::new();
        let samples = strings(&["Alice Smith", "Bob Jones", "Carol White"]);
        let (dt, _) = d.detect("c", &samples, None);
        assert_eq!(dt, DataType::Name);
    }

    #[test]
    fn test_free_text_fallback() {
        let mut d = Detector::new();
        let samples = strings(&["some random notes", "more notes here"]);
        let (dt, conf) = d.detect("c", &samples, None);
        assert_eq!(dt, DataType::FreeText);
        assert_eq!(conf, 0.3);
    }

    #[test]
    fn test_cache_hit_confidence() {
        let mut d = Detector::new();
        let samples = strings(&["a@b.com", "c@d.org"]);
        let (dt1, _) = d.detect("c", &samples, None);
        let (dt2, conf2) = d.detect("c", &samples, None);
        assert_eq!(dt1, dt2);
        assert_eq!(conf2, 0.9);
    }

    #[test]
    fn test_looks_like_name_rejects_initials_and_length() {
        assert!(looks_like_name("John Smith"));
        assert!(!looks_like_name("John Q Smith")); // single-char token
        assert!(!looks_like_name("john smith")); // lowercase
        assert!(!looks_like_name("A B C D E")); // too many tokens
        assert!(!looks_like_name("O'Brien")); // apostrophe
    }

    #[test]
    fn test_data_type_round_trip() {
        for dt in [
            DataType::Email,
            DataType::CreditCard,
            DataType::NumericId,
            DataType::FreeText,
        ] {
            assert_eq!(dt.to_string().parse::<DataType>().unwrap(), dt);
        }
    }
}
