//! Shared transcript normalization: filler stripping, digit-word
//! translation, and compound-number expansion.

/// Words dropped from transcripts before digit extraction.
///
/// Deliberately excludes digit-word homophones ("to", "for", "won", "ate",
/// "oh") — those must survive into the translation stage.
const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "my", "code", "number", "phone", "area", "is", "it", "its", "um", "uh",
    "ah", "er", "okay", "ok", "yeah", "yes", "so", "like", "please", "thanks", "alright",
];

/// Spoken digit words and their common speech-recognition mishearings.
const DIGIT_WORDS: &[(&str, char)] = &[
    ("zero", '0'),
    ("oh", '0'),
    ("o", '0'),
    ("one", '1'),
    ("won", '1'),
    ("two", '2'),
    ("to", '2'),
    ("too", '2'),
    ("three", '3'),
    ("tree", '3'),
    ("four", '4'),
    ("for", '4'),
    ("fore", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("ate", '8'),
    ("nine", '9'),
    ("niner", '9'),
];

/// Tens words and the numeral they start: "twenty" → 2x.
const TENS_WORDS: &[(&str, char)] = &[
    ("twenty", '2'),
    ("thirty", '3'),
    ("forty", '4'),
    ("fourty", '4'),
    ("fifty", '5'),
    ("sixty", '6'),
    ("seventy", '7'),
    ("eighty", '8'),
    ("ninety", '9'),
];

/// Teen words mapped to their full 2-digit numeral.
const TEEN_WORDS: &[(&str, &str)] = &[
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
];

/// Lowercases the transcript, maps punctuation to spaces, and drops filler
/// words token-wise.
///
/// Filler phrases like "the code is" fall out because each of their words is
/// an individual filler; dropping per-token keeps digit-word homophones
/// intact.
pub(crate) fn strip_fillers(transcript: &str) -> Vec<String> {
    transcript
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|token| !FILLER_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Keeps only ASCII digits from the token stream.
pub(crate) fn extract_digits(tokens: &[String]) -> String {
    tokens
        .iter()
        .flat_map(|t| t.chars())
        .filter(char::is_ascii_digit)
        .collect()
}

/// Translates spoken digit words (including mishearings) into single-digit
/// tokens. Unrecognized tokens pass through unchanged.
pub(crate) fn translate_digit_words(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| {
            match DIGIT_WORDS.iter().find(|(word, _)| word == token) {
                Some((_, digit)) => digit.to_string(),
                None => token.clone(),
            }
        })
        .collect()
}

/// Expands compound numbers in the token stream.
///
/// A tens word followed by a single-digit token merges into one two-digit
/// number ("forty" "8" → "48"); a bare tens word becomes its round numeral
/// ("forty" → "40"); teens always expand to their full numeral.
pub(crate) fn expand_compound_numbers(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if let Some((_, teen)) = TEEN_WORDS.iter().find(|(word, _)| word == token) {
            out.push((*teen).to_string());
            i += 1;
            continue;
        }

        if let Some((_, tens_digit)) = TENS_WORDS.iter().find(|(word, _)| word == token) {
            let unit = tokens.get(i + 1).and_then(|next| {
                let mut chars = next.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() && c != '0' => Some(c),
                    _ => None,
                }
            });
            match unit {
                Some(unit_digit) => {
                    out.push(format!("{tens_digit}{unit_digit}"));
                    i += 2;
                }
                None => {
                    out.push(format!("{tens_digit}0"));
                    i += 1;
                }
            }
            continue;
        }

        out.push(token.clone());
        i += 1;
    }

    out
}
