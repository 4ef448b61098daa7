//! Categorical selection matching against ordered keyword tables.

use switchboard_types::KeywordTable;

/// Matches a transcript against an ordered keyword table.
///
/// Case-insensitive substring match: the first table entry (in table order)
/// with any keyword contained in the transcript wins. Returns `None` when
/// nothing matches — never a default, so the caller can re-prompt.
pub fn parse_category(transcript: &str, table: KeywordTable) -> Option<&'static str> {
    let lowered = transcript.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(key, _)| *key)
}
