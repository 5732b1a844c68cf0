//! Field validators and formatters for associate data
//!
//! All functions here are pure and deterministic, except
//! [`check_field_exists`], which queries whatever [`FieldLookup`] it is
//! handed. Formatters follow a pass-through policy: input that does not have
//! the expected number of digits is returned unchanged.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::StoreResult;
use crate::model::AssociateId;

pub const CPF_DIGITS: usize = 11;
pub const MOBILE_PHONE_DIGITS: usize = 11;
pub const LANDLINE_PHONE_DIGITS: usize = 10;
pub const POSTAL_CODE_DIGITS: usize = 8;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)+$").expect("email pattern is valid")
    })
}

fn cpf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{3})(\d{3})(\d{3})(\d{2})$").expect("cpf pattern is valid")
    })
}

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})(\d{5})(\d{4})$").expect("mobile pattern is valid"))
}

fn landline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})(\d{4})(\d{4})$").expect("landline pattern is valid"))
}

fn postal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{5})(\d{3})$").expect("postal code pattern is valid"))
}

/// True iff `s` looks like `local@domain.tld`.
///
/// Rejects empty input, a missing or repeated `@`, empty local or domain
/// parts, and domains without a dot or with an empty label.
pub fn validate_email(s: &str) -> bool {
    email_regex().is_match(s)
}

/// Strip every non-digit character
pub fn clean_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip CPF punctuation (`123.456.789-01` becomes `12345678901`)
pub fn clean_cpf(s: &str) -> String {
    clean_digits(s)
}

/// Format exactly 11 digits as `XXX.XXX.XXX-XX`.
///
/// Formatting only: callers must run [`clean_cpf`] first, anything that is
/// not 11 bare digits comes back unchanged.
pub fn format_cpf(digits: &str) -> String {
    cpf_regex().replace(digits, "$1.$2.$3-$4").into_owned()
}

/// Format a phone number as `(DD) DDDDD-DDDD` (mobile, 11 digits) or
/// `(DD) DDDD-DDDD` (landline, 10 digits). Any other digit count returns
/// the input unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits = clean_digits(phone);
    match digits.len() {
        MOBILE_PHONE_DIGITS => mobile_regex().replace(&digits, "($1) $2-$3").into_owned(),
        LANDLINE_PHONE_DIGITS => landline_regex().replace(&digits, "($1) $2-$3").into_owned(),
        _ => phone.to_string(),
    }
}

/// Format 8 digits as a CEP `DDDDD-DDD`; anything else passes through.
pub fn format_postal_code(digits: &str) -> String {
    postal_code_regex().replace(digits, "$1-$2").into_owned()
}

/// Check the two CPF verification digits.
///
/// Sequences of one repeated digit pass the arithmetic but are not issued,
/// so they are rejected too.
pub fn validate_cpf_checksum(cpf: &str) -> bool {
    let digits: Vec<u32> = clean_cpf(cpf).chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != CPF_DIGITS {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        match sum % 11 {
            0 | 1 => 0,
            rem => 11 - rem,
        }
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}

/// Fields an associate can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionField {
    Name,
    Email,
    Cpf,
    Phone,
    PostalCode,
}

impl SubmissionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionField::Name => "name",
            SubmissionField::Email => "email",
            SubmissionField::Cpf => "cpf",
            SubmissionField::Phone => "phone",
            SubmissionField::PostalCode => "postal_code",
        }
    }
}

impl fmt::Display for SubmissionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldReason {
    Required,
    InvalidName,
    InvalidEmail,
    EmailInUse,
    InvalidCpfLength,
    InvalidCpfChecksum,
    InvalidPhoneLength,
    InvalidPostalLength,
}

impl FieldReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldReason::Required => "required",
            FieldReason::InvalidName => "invalid_name",
            FieldReason::InvalidEmail => "invalid_email",
            FieldReason::EmailInUse => "email_in_use",
            FieldReason::InvalidCpfLength => "invalid_cpf_length",
            FieldReason::InvalidCpfChecksum => "invalid_cpf_checksum",
            FieldReason::InvalidPhoneLength => "invalid_phone_length",
            FieldReason::InvalidPostalLength => "invalid_postal_length",
        }
    }
}

impl fmt::Display for FieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: SubmissionField,
    pub reason: FieldReason,
}

impl FieldError {
    pub fn new(field: SubmissionField, reason: FieldReason) -> Self {
        Self { field, reason }
    }
}

/// Per-field outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(FieldReason),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    fn check(ok: bool, reason: FieldReason) -> Self {
        if ok {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(reason)
        }
    }
}

pub fn check_email(email: &str) -> ValidationResult {
    ValidationResult::check(validate_email(email), FieldReason::InvalidEmail)
}

pub fn check_cpf_length(cpf: &str) -> ValidationResult {
    ValidationResult::check(clean_cpf(cpf).len() == CPF_DIGITS, FieldReason::InvalidCpfLength)
}

pub fn check_phone_length(phone: &str) -> ValidationResult {
    let len = clean_digits(phone).len();
    ValidationResult::check(
        len == MOBILE_PHONE_DIGITS || len == LANDLINE_PHONE_DIGITS,
        FieldReason::InvalidPhoneLength,
    )
}

pub fn check_postal_length(postal_code: &str) -> ValidationResult {
    ValidationResult::check(
        clean_digits(postal_code).len() == POSTAL_CODE_DIGITS,
        FieldReason::InvalidPostalLength,
    )
}

/// Fields that can be looked up for existence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    Email,
    Cpf,
}

/// Capability to search existing records by a field value
#[async_trait]
pub trait FieldLookup: Send + Sync {
    /// Id of a record holding `value` in `field`, if any
    async fn find_by_field(&self, field: LookupField, value: &str)
        -> StoreResult<Option<AssociateId>>;
}

/// True iff at least one record already holds `value` in `field`
pub async fn check_field_exists<L>(lookup: &L, field: LookupField, value: &str) -> StoreResult<bool>
where
    L: FieldLookup + ?Sized,
{
    Ok(lookup.find_by_field(field, value).await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_validate_email_accepts_plain_addresses() {
        assert!(validate_email("a@b.com"));
        assert!(validate_email("first.last+tag@mail.example.com.br"));
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        for bad in [
            "",
            "test@",
            "@domain.com",
            "user@domain",
            "plainaddress",
            "a@@b.com",
            "a@b@c.com",
            "a@b.",
            "a@.com",
            "a b@c.com",
        ] {
            assert!(!validate_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_cpf_clean_then_format_round_trips() {
        assert_eq!(clean_cpf("123.456.789-01"), "12345678901");
        assert_eq!(format_cpf(&clean_cpf("123.456.789-01")), "123.456.789-01");
    }

    #[test]
    fn test_format_cpf_passes_through_wrong_length() {
        assert_eq!(format_cpf("1234567890"), "1234567890");
        assert_eq!(format_cpf("123456789012"), "123456789012");
        assert_eq!(format_cpf("123.456.789-01"), "123.456.789-01");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("12345"), "12345");
        assert_eq!(format_phone("(11) 98765-4321"), "(11) 98765-4321");
    }

    #[test]
    fn test_format_postal_code() {
        assert_eq!(format_postal_code("01310100"), "01310-100");
        assert_eq!(format_postal_code("0131010"), "0131010");
        assert_eq!(format_postal_code("01310-100"), "01310-100");
    }

    #[test]
    fn test_cpf_checksum() {
        assert!(validate_cpf_checksum("529.982.247-25"));
        assert!(validate_cpf_checksum("11144477735"));
        assert!(!validate_cpf_checksum("12345678901"));
        assert!(!validate_cpf_checksum("11111111111"));
        assert!(!validate_cpf_checksum("5299822472"));
    }

    #[test]
    fn test_length_checks() {
        assert!(check_cpf_length("123.456.789-01").is_valid());
        assert_eq!(
            check_cpf_length("123"),
            ValidationResult::Invalid(FieldReason::InvalidCpfLength)
        );
        assert!(check_phone_length("(11) 3456-7890").is_valid());
        assert!(!check_phone_length("123456789").is_valid());
        assert!(check_postal_length("01310-100").is_valid());
        assert!(!check_postal_length("0131").is_valid());
        assert_eq!(
            check_email("bad"),
            ValidationResult::Invalid(FieldReason::InvalidEmail)
        );
    }

    struct MapLookup(HashMap<String, AssociateId>);

    #[async_trait]
    impl FieldLookup for MapLookup {
        async fn find_by_field(
            &self,
            _field: LookupField,
            value: &str,
        ) -> StoreResult<Option<AssociateId>> {
            Ok(self.0.get(value).copied())
        }
    }

    #[tokio::test]
    async fn test_check_field_exists_uses_lookup() {
        let mut known = HashMap::new();
        known.insert("a@b.com".to_string(), AssociateId::new());
        let lookup = MapLookup(known);

        assert!(check_field_exists(&lookup, LookupField::Email, "a@b.com").await.unwrap());
        assert!(!check_field_exists(&lookup, LookupField::Email, "c@d.com").await.unwrap());
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(FieldReason::InvalidPostalLength.as_str(), "invalid_postal_length");
        let json = serde_json::to_value(FieldError::new(
            SubmissionField::PostalCode,
            FieldReason::InvalidPostalLength,
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "postal_code", "reason": "invalid_postal_length"})
        );
    }
}
