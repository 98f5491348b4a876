//! Canned response selection.
//!
//! Maps sanitized input to a response category by ordered keyword
//! matching, then looks the reply up in the active persona's table. Pure
//! and total: input that matches nothing falls back to the persona's
//! default response.

use crate::persona::{Persona, ResponseCategory};

/// Keyword rules in precedence order; the first matching category wins.
const CATEGORY_RULES: [(ResponseCategory, [&str; 3]); 3] = [
    (ResponseCategory::Anxious, ["anxious", "anxiety", "worried"]),
    (ResponseCategory::Sad, ["sad", "depressed", "down"]),
    (ResponseCategory::Stressed, ["stress", "overwhelmed", "busy"]),
];

/// Classify sanitized input into a response category.
///
/// Matching is case-insensitive on keyword substrings. Input matching no
/// rule classifies as [`ResponseCategory::Default`].
#[must_use]
pub fn match_category(input: &str) -> ResponseCategory {
    let lowered = input.to_lowercase();
    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return category;
        }
    }
    ResponseCategory::Default
}

/// Select the persona's reply for sanitized input.
///
/// # Example
///
/// ```
/// use companion_chat::persona::PersonaStore;
/// use companion_chat::responder::respond;
///
/// let store = PersonaStore::builtin().expect("builtin personas are valid");
/// let sarah = store.get("sarah").expect("sarah exists");
///
/// let reply = respond(sarah, "I feel so worried lately");
/// assert_eq!(reply, sarah.responses.anxious);
/// ```
#[must_use]
pub fn respond<'a>(persona: &'a Persona, input: &str) -> &'a str {
    persona.responses.get(match_category(input))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::persona::PersonaStore;
    use test_case::test_case;

    #[test_case("I've been anxious all week", ResponseCategory::Anxious ; "anxious keyword")]
    #[test_case("my ANXIETY is back", ResponseCategory::Anxious ; "anxiety upper case")]
    #[test_case("I'm Worried about tomorrow", ResponseCategory::Anxious ; "worried mixed case")]
    #[test_case("feeling sad today", ResponseCategory::Sad ; "sad keyword")]
    #[test_case("I think I'm depressed", ResponseCategory::Sad ; "depressed keyword")]
    #[test_case("been pretty down lately", ResponseCategory::Sad ; "down keyword")]
    #[test_case("so much stress at work", ResponseCategory::Stressed ; "stress keyword")]
    #[test_case("completely overwhelmed", ResponseCategory::Stressed ; "overwhelmed keyword")]
    #[test_case("too busy to think", ResponseCategory::Stressed ; "busy keyword")]
    #[test_case("tell me about the weather", ResponseCategory::Default ; "no keyword")]
    #[test_case("", ResponseCategory::Default ; "empty input")]
    fn test_match_category(input: &str, expected: ResponseCategory) {
        assert_eq!(match_category(input), expected);
    }

    #[test]
    fn test_precedence_anxious_over_sad() {
        assert_eq!(
            match_category("worried and sad and stressed"),
            ResponseCategory::Anxious
        );
    }

    #[test]
    fn test_precedence_sad_over_stressed() {
        assert_eq!(
            match_category("depressed and overwhelmed"),
            ResponseCategory::Sad
        );
    }

    #[test]
    fn test_substring_matching() {
        // "stressful" contains "stress"; substring semantics are intentional
        assert_eq!(match_category("such a stressful day"), ResponseCategory::Stressed);
    }

    #[test]
    fn test_respond_worried_any_case() {
        let store = PersonaStore::builtin().expect("builtin personas are valid");
        let luna = store.get("luna").expect("luna exists");

        assert_eq!(respond(luna, "I am WORRIED"), luna.responses.anxious);
        assert_eq!(respond(luna, "worried"), luna.responses.anxious);
    }

    #[test]
    fn test_respond_falls_back_to_default() {
        let store = PersonaStore::builtin().expect("builtin personas are valid");
        let alex = store.get("alex").expect("alex exists");

        assert_eq!(respond(alex, "what should I cook"), alex.responses.default);
    }

    #[test]
    fn test_respond_uses_active_persona_table() {
        let store = PersonaStore::builtin().expect("builtin personas are valid");
        let sarah = store.get("sarah").expect("sarah exists");
        let marcus = store.get("marcus").expect("marcus exists");

        assert_ne!(respond(sarah, "sad"), respond(marcus, "sad"));
    }
}
