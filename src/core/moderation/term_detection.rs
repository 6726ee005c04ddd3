// Detection engine - decides whether a message contains a banned term and
// builds the redacted rendering.
//
// Everything here is pure: no store access, no Discord types, no state kept
// between calls.

use super::moderation_models::{BannedTerm, DetectionResult};
use regex::{NoExpand, Regex, RegexBuilder};

/// Canonical comparison form: all whitespace removed, the rest upper-cased.
///
/// Only used for comparisons, never shown to users.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Find the first term (in the order supplied) whose normalized text is a
/// substring of the normalized body.
///
/// This is plain substring containment, so "cat" matches "concatenate".
pub fn find_matching_term<'a>(body: &str, terms: &'a [BannedTerm]) -> Option<&'a BannedTerm> {
    let normalized_body = normalize(body);

    terms.iter().find(|term| {
        let normalized_term = normalize(&term.text);
        // A term made only of whitespace would match every message
        !normalized_term.is_empty() && normalized_body.contains(&normalized_term)
    })
}

/// Build the boundary-anchored pattern for a term.
///
/// Each character is escaped on its own and joined with `\s*`, so
/// "bad word" becomes `\bb\s*a\s*d\s*w\s*o\s*r\s*d\b`, case-insensitive.
pub fn build_redaction_pattern(term: &str) -> Result<Regex, regex::Error> {
    let escaped: Vec<String> = term
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect();

    let pattern = format!(r"\b{}\b", escaped.join(r"\s*"));

    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Wrap every anchored occurrence of `term` in `body` with spoiler markup.
///
/// Returns the body unchanged when nothing matches.
pub fn redact(body: &str, term: &str) -> String {
    let pattern = match build_redaction_pattern(term) {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::warn!("Could not build redaction pattern for {:?}: {}", term, e);
            return body.to_string();
        }
    };

    let spoiler = format!("||{}||", term);
    pattern.replace_all(body, NoExpand(&spoiler)).into_owned()
}

/// Run containment and, on a match, redaction.
pub fn detect(body: &str, terms: &[BannedTerm]) -> DetectionResult {
    match find_matching_term(body, terms) {
        Some(term) => DetectionResult::matched(term.text.clone(), redact(body, &term.text)),
        None => DetectionResult::clean(),
    }
}
