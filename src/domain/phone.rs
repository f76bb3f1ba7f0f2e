use serde::Serialize;
use std::fmt;

const COUNTRY_CODE: &str = "55";
const NATIONAL_LEN: usize = 11;
const LEGACY_LEN: usize = 10;
const AREA_CODE_LEN: usize = 2;

/// Digit-only Brazilian mobile number, 10 or 11 digits long.
///
/// Used as the merge key between the two rosters. Construct it through
/// [`NormalizedPhone::parse`]; a value that exists has already passed the
/// heuristic below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Best-effort canonicalization of a free-form phone cell.
    ///
    /// 1. drop everything that is not an ASCII digit
    /// 2. drop a leading `55` country code when more than 11 digits remain
    /// 3. insert the mobile `9` after the area code of a 10-digit number
    /// 4. accept only 10 or 11 digits
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        if digits.starts_with(COUNTRY_CODE) && digits.len() > NATIONAL_LEN {
            digits.drain(..COUNTRY_CODE.len());
        }

        if digits.len() == LEGACY_LEN {
            digits.insert(AREA_CODE_LEN, '9');
        }

        if (LEGACY_LEN..=NATIONAL_LEN).contains(&digits.len()) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(value: &str) -> Option<String> {
        NormalizedPhone::parse(Some(value)).map(|p| p.as_str().to_string())
    }

    #[test]
    fn test_rejects_absent_and_empty() {
        assert!(NormalizedPhone::parse(None).is_none());
        assert!(norm("").is_none());
        assert!(norm("   ").is_none());
        assert!(norm("sem telefone").is_none());
    }

    #[test]
    fn test_strips_formatting() {
        assert_eq!(norm("(11) 98765-4321").as_deref(), Some("11987654321"));
        assert_eq!(norm(" 11 9 8765 4321 ").as_deref(), Some("11987654321"));
    }

    #[test]
    fn test_strips_country_code() {
        assert_eq!(norm("5511987654321").as_deref(), Some("11987654321"));
        assert_eq!(norm("+55 (11) 98765-4321").as_deref(), Some("11987654321"));
    }

    #[test]
    fn test_country_code_strip_never_yields_overlong_number() {
        // 去掉 55 之後仍有 14 位，不是合法號碼
        assert!(norm("5511987654321012").is_none());
    }

    #[test]
    fn test_area_code_55_is_not_mistaken_for_country_code() {
        assert_eq!(norm("55987654321").as_deref(), Some("55987654321"));
    }

    #[test]
    fn test_inserts_mobile_nine() {
        assert_eq!(norm("1133334444").as_deref(), Some("11933334444"));
        assert_eq!(norm("551133334444").as_deref(), Some("11933334444"));
    }

    #[test]
    fn test_rejects_short_numbers() {
        assert!(norm("987654321").is_none());
        assert!(norm("3333-4444").is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for input in [
            "5511987654321",
            "1133334444",
            "(21) 99876-5432",
            "55987654321",
            "+55 48 3333 4444",
        ] {
            let once = norm(input).unwrap();
            let twice = norm(&once).unwrap();
            assert_eq!(once, twice, "input {}", input);
        }
    }

    #[test]
    fn test_accepted_values_are_short_digit_strings() {
        for input in [
            "5511987654321",
            "1133334444",
            "011 98765 4321",
            "55 55 99999 8888",
            "123456789012345",
            "+1 415 555 1212",
        ] {
            if let Some(phone) = norm(input) {
                assert!(phone.len() == 10 || phone.len() == 11, "input {}", input);
                assert!(phone.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
