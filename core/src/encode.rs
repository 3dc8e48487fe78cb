//! Field encodings shared by the request builders.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use uuid::Uuid;

use crate::error::UsageError;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// Base64 token for a free-text subject or requestor name.
pub fn encode_subject(name: &str) -> String {
    STANDARD.encode(name.as_bytes())
}

/// Fresh correlation id for peer-broadcast requests.
pub fn request_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_choice<T: Copy>(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
    variants: &[T],
) -> Result<T, UsageError> {
    let upper = value.to_ascii_uppercase();
    allowed
        .iter()
        .position(|candidate| *candidate == upper)
        .map(|idx| variants[idx])
        .ok_or_else(|| UsageError::InvalidChoice {
            field,
            value: value.to_string(),
            allowed,
        })
}

/// Justification for accessing patient data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurposeOfUse {
    Emergency,
    Treatment,
    Patient,
}

impl PurposeOfUse {
    pub const ALLOWED: &'static [&'static str] = &["EMERGENCY", "TREATMENT", "PATIENT"];

    pub fn as_str(self) -> &'static str {
        match self {
            PurposeOfUse::Emergency => "EMERGENCY",
            PurposeOfUse::Treatment => "TREATMENT",
            PurposeOfUse::Patient => "PATIENT",
        }
    }
}

impl FromStr for PurposeOfUse {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(
            "purpose",
            s,
            Self::ALLOWED,
            &[
                PurposeOfUse::Emergency,
                PurposeOfUse::Treatment,
                PurposeOfUse::Patient,
            ],
        )
    }
}

impl fmt::Display for PurposeOfUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HL7 CDA document level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CdaType {
    L1,
    #[default]
    L3,
}

impl CdaType {
    pub const ALLOWED: &'static [&'static str] = &["L1", "L3"];

    pub fn as_str(self) -> &'static str {
        match self {
            CdaType::L1 => "L1",
            CdaType::L3 => "L3",
        }
    }
}

impl FromStr for CdaType {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice("cdatype", s, Self::ALLOWED, &[CdaType::L1, CdaType::L3])
    }
}

impl fmt::Display for CdaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date in literal `YYYY-MM-DD` form.
///
/// Only the shape is checked; the gateway interprets the calendar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for IsoDate {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if DATE_PATTERN.is_match(s) {
            Ok(IsoDate(s.to_string()))
        } else {
            Err(UsageError::InvalidDate {
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_standard_base64() {
        assert_eq!(encode_subject("Trpaslik"), "VHJwYXNsaWs=");
    }

    #[test]
    fn subject_round_trips_for_utf8_names() {
        let names = [
            "",
            "a",
            "Trpaslik",
            "Jiří Dvořák",
            "Žluťoučký kůň úpěl ďábelské ódy",
            "MUDr. Ťok, Ph.D. <ordinace@example.cz>",
            "名前",
            "emoji \u{1F3E5} hospital",
            "line\nbreak\tand\0nul",
        ];
        for name in names {
            let token = encode_subject(name);
            let decoded = STANDARD.decode(&token).unwrap();
            assert_eq!(String::from_utf8(decoded).unwrap(), name, "{name:?}");
        }
    }

    #[test]
    fn subject_round_trips_for_every_char_class() {
        // Dense over the common BMP blocks, sparse up to the last plane.
        let sample: Vec<char> = (0u32..0x3000)
            .step_by(7)
            .chain((0x3000..=char::MAX as u32).step_by(331))
            .filter_map(char::from_u32)
            .collect();
        assert!(sample.iter().filter(|c| c.len_utf8() == 4).count() > 3000);
        assert!(sample.iter().any(|&c| c > '\u{10F000}'));
        for chunk in sample.chunks(13) {
            let name: String = chunk.iter().collect();
            let decoded = STANDARD.decode(encode_subject(&name)).unwrap();
            assert_eq!(String::from_utf8(decoded).unwrap(), name);
        }
    }

    #[test]
    fn request_ids_are_unique_uuids() {
        let a = request_id();
        let b = request_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn purpose_is_case_insensitive_and_upper_cased() {
        let purpose: PurposeOfUse = "emergency".parse().unwrap();
        assert_eq!(purpose, PurposeOfUse::Emergency);
        assert_eq!(purpose.as_str(), "EMERGENCY");
        assert_eq!("Treatment".parse::<PurposeOfUse>().unwrap().as_str(), "TREATMENT");
        assert_eq!("PATIENT".parse::<PurposeOfUse>().unwrap().as_str(), "PATIENT");
    }

    #[test]
    fn purpose_outside_the_set_is_rejected() {
        for value in ["", "RESEARCH", "emergencyy", " EMERGENCY"] {
            let err = value.parse::<PurposeOfUse>().unwrap_err();
            assert!(
                matches!(err, UsageError::InvalidChoice { field: "purpose", .. }),
                "{value:?}"
            );
        }
    }

    #[test]
    fn cda_type_defaults_to_l3() {
        assert_eq!(CdaType::default(), CdaType::L3);
        assert_eq!("l1".parse::<CdaType>().unwrap(), CdaType::L1);
        assert!("L2".parse::<CdaType>().is_err());
    }

    #[test]
    fn dates_must_be_yyyy_mm_dd() {
        assert_eq!("2024-01-31".parse::<IsoDate>().unwrap().as_str(), "2024-01-31");
        for bad in [
            "",
            "2024-1-31",
            "31.01.2024",
            "2024/01/31",
            "2024-01-31T00:00",
            " 2024-01-31",
            "20240-01-31",
            "yyyy-mm-dd",
        ] {
            assert!(
                matches!(bad.parse::<IsoDate>(), Err(UsageError::InvalidDate { .. })),
                "{bad:?}"
            );
        }
    }
}
