//! Pairing-code extraction from caller transcripts.

use serde::Serialize;

use crate::normalize::{
    expand_compound_numbers, extract_digits, strip_fillers, translate_digit_words,
};

/// Number of digits in a pairing code.
const CODE_LEN: usize = 4;

/// Result of parsing a transcript for a 4-digit pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeParse {
    /// Whether a 4-digit code was confidently recovered.
    pub matched: bool,
    /// The recovered code, when matched.
    pub code: Option<String>,
    /// The transcript as received, for logging and re-prompts.
    pub raw_input: String,
    /// The digit string the code was cut from, when any digits were found.
    pub normalized_digits: Option<String>,
}

impl CodeParse {
    fn no_match(raw_input: &str, digits: String) -> Self {
        Self {
            matched: false,
            code: None,
            raw_input: raw_input.to_string(),
            normalized_digits: if digits.is_empty() {
                None
            } else {
                Some(digits)
            },
        }
    }

    fn matched(raw_input: &str, digits: String) -> Self {
        let code = digits.chars().take(CODE_LEN).collect();
        Self {
            matched: true,
            code: Some(code),
            raw_input: raw_input.to_string(),
            normalized_digits: Some(digits),
        }
    }
}

/// Parses a spoken 4-digit pairing code out of a transcript.
///
/// Stages run in order and stop at the first one that recovers at least 4
/// digits: direct extraction, digit-word translation, compound-number
/// expansion. An over-long digit string keeps its **leading** 4 digits —
/// callers read codes front-to-back, so trailing digits are trailing noise.
///
/// Never fails for malformed input; `matched: false` means fewer than 4
/// digits survived all three stages.
pub fn parse_code(transcript: &str) -> CodeParse {
    let tokens = strip_fillers(transcript);

    // Stage 1: digits spoken as digits.
    let direct = extract_digits(&tokens);
    if direct.len() >= CODE_LEN {
        return CodeParse::matched(transcript, direct);
    }

    // Stage 2: spoken digit words, including mishearings.
    let translated = translate_digit_words(&tokens);
    let worded = extract_digits(&translated);
    if worded.len() >= CODE_LEN {
        return CodeParse::matched(transcript, worded);
    }

    // Stage 3: compound numbers ("forty eight twenty seven").
    let expanded = expand_compound_numbers(&translated);
    let compound = extract_digits(&expanded);
    if compound.len() >= CODE_LEN {
        return CodeParse::matched(transcript, compound);
    }

    CodeParse::no_match(transcript, compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_digit_string_matches_itself() {
        for code in ["0000", "4827", "9999", "0123"] {
            let parse = parse_code(code);
            assert!(parse.matched);
            assert_eq!(parse.code.as_deref(), Some(code));
        }
    }

    #[test]
    fn spoken_digits_match() {
        let parse = parse_code("four eight two seven");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
    }

    #[test]
    fn filler_phrase_is_stripped() {
        let parse = parse_code("the code is four eight two seven");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
    }

    #[test]
    fn compound_numbers_expand() {
        let parse = parse_code("forty eight twenty seven");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
    }

    #[test]
    fn mishearings_translate() {
        let parse = parse_code("for ate to seven");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));

        let parse = parse_code("won oh niner tree");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("1093"));
    }

    #[test]
    fn over_long_capture_keeps_leading_four() {
        let parse = parse_code("482715");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
        assert_eq!(parse.normalized_digits.as_deref(), Some("482715"));

        let parse = parse_code("one two three four five");
        assert_eq!(parse.code.as_deref(), Some("1234"));
    }

    #[test]
    fn mixed_digits_and_words() {
        let parse = parse_code("4 eight 2 seven");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
    }

    #[test]
    fn punctuated_digits_match() {
        let parse = parse_code("4-8-2-7.");
        assert!(parse.matched);
        assert_eq!(parse.code.as_deref(), Some("4827"));
    }

    #[test]
    fn too_few_digits_fails() {
        let parse = parse_code("hello");
        assert!(!parse.matched);
        assert_eq!(parse.code, None);
        assert_eq!(parse.raw_input, "hello");

        let parse = parse_code("four eight two");
        assert!(!parse.matched);
        assert_eq!(parse.normalized_digits.as_deref(), Some("482"));
    }

    #[test]
    fn empty_transcript_fails() {
        let parse = parse_code("");
        assert!(!parse.matched);
        assert_eq!(parse.normalized_digits, None);
    }

    #[test]
    fn deterministic_on_same_input() {
        let a = parse_code("the code is forty eight twenty seven");
        let b = parse_code("the code is forty eight twenty seven");
        assert_eq!(a, b);
    }
}
