//! Cheap heuristic classifiers that short-circuit the pipeline.
//!
//! Both classifiers are approximate by design. They are kept as standalone,
//! independently testable values so the phrase sets and thresholds can be
//! tuned without touching pipeline control flow.

use std::collections::HashSet;

/// Phrases matched exactly (after normalization) as greetings.
const GREETING_EXACT: &[&str] = &[
    "hi",
    "hii",
    "hiii",
    "hey",
    "hello",
    "howdy",
    "sup",
    "yo",
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "see you",
    "what's up",
    "whats up",
    "how are you",
    "who are you",
    "what can you do",
    "help",
];

/// Greeting words that flag short mixed messages (e.g. "hii how are u").
const GREETING_WORDS: &[&str] =
    &["hi", "hii", "hiii", "hey", "hello", "howdy", "sup", "yo", "bye", "goodbye"];

/// Messages at or above this many characters are never treated as greetings
/// by the word-overlap rule.
const SHORT_MESSAGE_LIMIT: usize = 60;

/// Phrase markers of a "no evidence found" answer.
const DISCLAIMER_PHRASES: &[&str] = &[
    "couldn't find",
    "could not find",
    "not found",
    "no relevant",
    "no clear support",
    "unclear in ng12",
    "not contain relevant",
];

/// Detects greetings and other non-clinical pleasantries.
///
/// A message is a greeting if, after trimming, lowercasing, and stripping
/// trailing punctuation, it matches the exact phrase set, or it is shorter
/// than [`SHORT_MESSAGE_LIMIT`] characters and shares at least one token
/// with the greeting word set.
#[derive(Debug, Clone)]
pub struct GreetingClassifier {
    exact: HashSet<&'static str>,
    words: HashSet<&'static str>,
    short_limit: usize,
}

impl Default for GreetingClassifier {
    fn default() -> Self {
        Self {
            exact: GREETING_EXACT.iter().copied().collect(),
            words: GREETING_WORDS.iter().copied().collect(),
            short_limit: SHORT_MESSAGE_LIMIT,
        }
    }
}

impl GreetingClassifier {
    /// Whether the message should bypass retrieval and generation.
    pub fn is_greeting(&self, text: &str) -> bool {
        let cleaned = text.trim().to_lowercase();
        let cleaned = cleaned.trim_end_matches(['!', '?', '.', ',']);

        if self.exact.contains(cleaned) {
            return true;
        }

        cleaned.chars().count() < self.short_limit
            && cleaned.split_whitespace().any(|token| self.words.contains(token))
    }
}

/// Detects disclaimer answers ("no supporting evidence was found").
///
/// Case-insensitive substring match against a fixed phrase list. Used by the
/// citation reconciler: a disclaimer and citations must never co-occur.
#[derive(Debug, Clone)]
pub struct DisclaimerClassifier {
    phrases: Vec<&'static str>,
}

impl Default for DisclaimerClassifier {
    fn default() -> Self {
        Self { phrases: DISCLAIMER_PHRASES.to_vec() }
    }
}

impl DisclaimerClassifier {
    /// Whether the answer text reads as a disclaimer.
    pub fn is_disclaimer(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.phrases.iter().any(|phrase| lower.contains(phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_greetings_match_after_normalization() {
        let classifier = GreetingClassifier::default();
        assert!(classifier.is_greeting("hi"));
        assert!(classifier.is_greeting("Hello!!"));
        assert!(classifier.is_greeting("  what's up  "));
        assert!(classifier.is_greeting("Thanks."));
    }

    #[test]
    fn short_messages_with_greeting_words_match() {
        let classifier = GreetingClassifier::default();
        assert!(classifier.is_greeting("hii how are u"));
        assert!(classifier.is_greeting("hey there, quick question"));
    }

    #[test]
    fn clinical_questions_do_not_match() {
        let classifier = GreetingClassifier::default();
        assert!(!classifier.is_greeting("I have a cough for 3 weeks"));
        assert!(!classifier.is_greeting("When should I refer a patient with haemoptysis?"));
        // Greeting word present but the message is too long for the overlap rule.
        assert!(!classifier.is_greeting(
            "hello doctor, my patient is 55 with unexplained weight loss and abdominal pain"
        ));
    }

    #[test]
    fn disclaimer_phrases_match_case_insensitively() {
        let classifier = DisclaimerClassifier::default();
        assert!(classifier.is_disclaimer("I couldn't find clear support in the guidelines."));
        assert!(classifier.is_disclaimer("No RELEVANT passages were retrieved."));
        assert!(!classifier.is_disclaimer("Refer urgently within two weeks."));
    }
}
