//! Caller display-name sanitizing.

/// Fallback shown when nothing usable survives sanitizing.
const PLACEHOLDER_NAME: &str = "Caller";

/// Upper bound on stored display names, in characters.
const MAX_NAME_LEN: usize = 100;

/// Self-introduction lead-ins stripped from the front of the transcript.
const INTRO_PREFIXES: &[&str] = &[
    "my name is",
    "my name's",
    "the name is",
    "name is",
    "this is",
    "you can call me",
    "call me",
    "i am",
    "i'm",
    "hello",
    "hey",
    "hi",
];

/// Filler words dropped wherever they appear.
const NAME_FILLERS: &[&str] = &[
    "um", "uh", "ah", "er", "yeah", "okay", "ok", "so", "like", "it's", "its",
];

/// Turns a raw transcript into a presentable caller display name.
///
/// Drops filler words, strips leading self-introductions ("my name is ..."),
/// keeps only letters, spaces, apostrophes, and hyphens, title-cases each
/// word, and truncates to 100 characters. Total: any input (including empty
/// or pure noise) produces at least the `"Caller"` placeholder.
pub fn sanitize_name(transcript: &str) -> String {
    // Fillers go first so "um, this is chris" still matches the "this is"
    // intro prefix afterwards. Token-edge punctuation is trimmed here too.
    let lowered = transcript.to_lowercase();
    let without_fillers = lowered
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-'))
        .filter(|word| !word.is_empty() && !NAME_FILLERS.contains(word))
        .collect::<Vec<_>>()
        .join(" ");

    // Peel intro prefixes repeatedly: "hi this is chris" sheds "hi" and
    // then "this is". Each strip must land on a word boundary so "hi" never
    // bites into "hillary".
    let mut text = without_fillers.as_str();
    loop {
        let mut stripped = false;
        for prefix in INTRO_PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                if rest.is_empty() || rest.starts_with(' ') {
                    text = rest.trim_start();
                    stripped = true;
                }
            }
        }
        if !stripped {
            break;
        }
    }

    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let name = cleaned
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        return PLACEHOLDER_NAME.to_string();
    }

    name.chars()
        .take(MAX_NAME_LEN)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Capitalizes the first letter of a word, leaving the rest as-is.
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
