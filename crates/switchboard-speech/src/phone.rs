//! Callback phone-number extraction from caller transcripts.

use serde::Serialize;

use crate::normalize::{
    expand_compound_numbers, extract_digits, strip_fillers, translate_digit_words,
};

/// Digits in a domestic (NANP) number, without country code.
const DOMESTIC_LEN: usize = 10;

/// Result of parsing a transcript for a callback phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneParse {
    /// Whether a full phone number was confidently recovered.
    pub matched: bool,
    /// The recovered number in E.164 form (`+1XXXXXXXXXX`), when matched.
    pub e164: Option<String>,
    /// The transcript as received, for logging and re-prompts.
    pub raw_input: String,
}

/// Parses a spoken callback number out of a transcript.
///
/// Runs the full normalization pipeline (filler stripping, digit-word
/// translation, compound-number expansion), then:
///
/// - exactly 10 digits → domestic number, `+1` prefixed;
/// - 11 digits with a leading `1` → already country-prefixed, `+` prefixed;
/// - more than 10 digits → the **trailing** 10 are kept, `+1` prefixed.
///
/// The trailing bias is the opposite of [`crate::parse_code`] on purpose:
/// over-captured phone numbers almost always carry a leading country or
/// carrier artifact, while the number itself comes last.
pub fn parse_phone_number(transcript: &str) -> PhoneParse {
    let tokens = strip_fillers(transcript);
    let translated = translate_digit_words(&tokens);
    let expanded = expand_compound_numbers(&translated);
    let digits = extract_digits(&expanded);

    let e164 = if digits.len() == DOMESTIC_LEN {
        Some(format!("+1{digits}"))
    } else if digits.len() == DOMESTIC_LEN + 1 && digits.starts_with('1') {
        Some(format!("+{digits}"))
    } else if digits.len() > DOMESTIC_LEN {
        let trailing: String = digits
            .chars()
            .skip(digits.len() - DOMESTIC_LEN)
            .collect();
        Some(format!("+1{trailing}"))
    } else {
        None
    };

    PhoneParse {
        matched: e164.is_some(),
        e164,
        raw_input: transcript.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digit_number_gets_country_code() {
        let parse = parse_phone_number("4155551234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn spoken_ten_digits() {
        let parse = parse_phone_number("four one five five five five one two three four");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn eleven_digits_with_leading_one() {
        let parse = parse_phone_number("14155551234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn over_capture_keeps_trailing_ten() {
        // A leading artifact ("001") before the real number.
        let parse = parse_phone_number("0014155551234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn eleven_digits_without_leading_one_keeps_trailing_ten() {
        let parse = parse_phone_number("74155551234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn filler_phrase_is_stripped() {
        let parse = parse_phone_number("my number is 415 555 1234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn punctuated_number() {
        let parse = parse_phone_number("(415) 555-1234");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }

    #[test]
    fn too_few_digits_fails() {
        let parse = parse_phone_number("555 1234");
        assert!(!parse.matched);
        assert_eq!(parse.e164, None);

        let parse = parse_phone_number("call me back");
        assert!(!parse.matched);
        assert_eq!(parse.raw_input, "call me back");
    }

    #[test]
    fn mishearing_words_translate() {
        let parse = parse_phone_number("for won five five five five won to tree for");
        assert!(parse.matched);
        assert_eq!(parse.e164.as_deref(), Some("+14155551234"));
    }
}
