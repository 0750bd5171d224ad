//! Transcript reconciliation.
//!
//! The voice service streams growing partial transcripts for whoever is
//! talking, interleaved with the other party and with late "completed"
//! repeats of text already seen. Each fragment either replaces the open
//! entry for its speaker, is dropped as a duplicate, or opens a new entry.

use std::collections::HashSet;

use tracing::debug;

use crate::transcript::{ConversationLog, Utterance};

/// Threshold used when a caller does not pick one.
pub const DEFAULT_INCLUSION_THRESHOLD: f64 = 0.8;

/// Threshold used on the live transcript path.
pub const LIVE_INCLUSION_THRESHOLD: f64 = 0.7;

/// Fraction of the words of `prev` that occur anywhere in `current`.
///
/// Words are whitespace-delimited and compared by set membership, so order
/// and repetition in `current` do not matter. Returns `None` when `prev`
/// has no words.
pub fn match_ratio(prev: &str, current: &str) -> Option<f64> {
    let prev_words: Vec<&str> = prev.split_whitespace().collect();
    if prev_words.is_empty() {
        return None;
    }

    let current_words: HashSet<&str> = current.split_whitespace().collect();
    let matched = prev_words
        .iter()
        .filter(|w| current_words.contains(*w))
        .count();

    Some(matched as f64 / prev_words.len() as f64)
}

/// Whether `current` is judged an update of `prev`.
pub fn is_mostly_included(prev: &str, current: &str, threshold: f64) -> bool {
    match_ratio(prev, current).is_some_and(|ratio| ratio >= threshold)
}

/// What a fragment did to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Appended,
    Replaced,
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub struct TranscriptReconciler {
    threshold: f64,
}

impl Default for TranscriptReconciler {
    fn default() -> Self {
        Self::new(LIVE_INCLUSION_THRESHOLD)
    }
}

impl TranscriptReconciler {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fold one fragment into `log`.
    pub fn reconcile(&self, log: &mut ConversationLog, fragment: Utterance) -> Reconciliation {
        if let Some(last) = log.latest() {
            if last.speaker == fragment.speaker {
                if is_mostly_included(&last.text, &fragment.text, self.threshold) {
                    debug!("Replacing open {} entry: '{}'", fragment.speaker, fragment.text);
                    log.replace_last(fragment);
                    return Reconciliation::Replaced;
                }

                if last.text == fragment.text {
                    debug!("Dropping duplicate {} fragment", fragment.speaker);
                    return Reconciliation::Discarded;
                }
            }
        }

        debug!("Appending {} entry: '{}'", fragment.speaker, fragment.text);
        log.push(fragment);
        Reconciliation::Appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Speaker;

    fn feed(log: &mut ConversationLog, fragments: &[(Speaker, &str)]) -> Vec<Reconciliation> {
        let reconciler = TranscriptReconciler::default();
        fragments
            .iter()
            .map(|(speaker, text)| reconciler.reconcile(log, Utterance::new(*speaker, *text)))
            .collect()
    }

    #[test]
    fn ratio_counts_words_of_previous_text() {
        assert_eq!(match_ratio("Hello there", "Hello there how are you"), Some(1.0));
        assert_eq!(match_ratio("a b c d", "a b x"), Some(0.5));
        assert_eq!(match_ratio("", "anything"), None);
        assert_eq!(match_ratio("   \t ", "anything"), None);
    }

    #[test]
    fn ratio_ignores_order_and_position() {
        assert_eq!(match_ratio("one two three", "three two one"), Some(1.0));
        assert_eq!(match_ratio("the the cat", "cat the"), Some(1.0));
    }

    #[test]
    fn threshold_boundaries() {
        // 7 of 10 words survive
        let prev = "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10";
        let current = "w1 w2 w3 w4 w5 w6 w7 x y z";
        assert!(is_mostly_included(prev, current, LIVE_INCLUSION_THRESHOLD));
        assert!(!is_mostly_included(prev, current, DEFAULT_INCLUSION_THRESHOLD));
        assert!(!is_mostly_included("", "", DEFAULT_INCLUSION_THRESHOLD));
    }

    #[test]
    fn superset_fragment_replaces() {
        let mut log = ConversationLog::new();
        let outcomes = feed(
            &mut log,
            &[
                (Speaker::Agent, "Hello there"),
                (Speaker::Agent, "Hello there how are you"),
                (Speaker::User, "I am fine"),
            ],
        );

        assert_eq!(
            outcomes,
            vec![
                Reconciliation::Appended,
                Reconciliation::Replaced,
                Reconciliation::Appended
            ]
        );
        assert_eq!(
            log.entries(),
            &[
                Utterance::new(Speaker::Agent, "Hello there how are you"),
                Utterance::new(Speaker::User, "I am fine"),
            ]
        );
    }

    #[test]
    fn exact_duplicate_leaves_single_entry() {
        let mut log = ConversationLog::new();
        feed(
            &mut log,
            &[(Speaker::Agent, "Question one"), (Speaker::Agent, "Question one")],
        );
        assert_eq!(log.entries(), &[Utterance::new(Speaker::Agent, "Question one")]);
    }

    #[test]
    fn other_speaker_always_appends() {
        let mut log = ConversationLog::new();
        let outcomes = feed(
            &mut log,
            &[(Speaker::Agent, "yes indeed"), (Speaker::User, "yes indeed")],
        );
        assert_eq!(outcomes[1], Reconciliation::Appended);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn unrelated_same_speaker_text_appends() {
        let mut log = ConversationLog::new();
        feed(
            &mut log,
            &[
                (Speaker::User, "I worked on databases"),
                (Speaker::User, "Mostly Postgres tuning"),
            ],
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn blank_fragments_are_appended_not_merged() {
        let mut log = ConversationLog::new();
        let outcomes = feed(
            &mut log,
            &[
                (Speaker::User, "   "),
                (Speaker::User, "hello"),
                (Speaker::User, ""),
                (Speaker::User, ""),
            ],
        );
        // "   " has no words so "hello" cannot update it; the second empty
        // fragment is an exact duplicate of the first.
        assert_eq!(
            outcomes,
            vec![
                Reconciliation::Appended,
                Reconciliation::Appended,
                Reconciliation::Appended,
                Reconciliation::Discarded
            ]
        );
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn earlier_entries_stay_frozen() {
        let mut log = ConversationLog::new();
        feed(
            &mut log,
            &[
                (Speaker::Agent, "Tell me about Rust"),
                (Speaker::User, "I like it"),
                (Speaker::Agent, "Tell me about Rust ownership"),
            ],
        );
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].text, "Tell me about Rust");
    }

    #[test]
    fn custom_threshold_is_respected() {
        let strict = TranscriptReconciler::new(1.0);
        let mut log = ConversationLog::new();
        strict.reconcile(&mut log, Utterance::new(Speaker::Agent, "alpha beta gamma"));
        let outcome = strict.reconcile(&mut log, Utterance::new(Speaker::Agent, "alpha beta delta"));
        assert_eq!(outcome, Reconciliation::Appended);
        assert_eq!(strict.threshold(), 1.0);
    }
}
