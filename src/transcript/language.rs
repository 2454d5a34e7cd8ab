//! Language-specific sentence completeness policies.
//!
//! The reconciler judges fragment-vs-complete from surface morphology, not
//! grammar: each spoken language supplies a closed set of sentence-final
//! endings. Swapping the policy never touches reconciler control flow.

use anyhow::Result;
use regex::Regex;

/// Judges whether unpunctuated text still reads as a finished sentence in
/// the target spoken language.
pub trait SentencePolicy: Send + Sync {
    /// Whether the text ends in a sentence-final morpheme for this language.
    fn ends_sentence(&self, text: &str) -> bool;

    /// Policy name for logging.
    fn name(&self) -> &'static str;
}

/// Resolve the policy for a language tag. Languages without a configured
/// morpheme set fall back to punctuation-only classification.
pub fn policy_for_language(language: &str) -> Result<Box<dyn SentencePolicy>> {
    Ok(match language {
        "ko" => Box::new(KoreanSentencePolicy::new()?),
        _ => Box::new(PunctuationOnlyPolicy),
    })
}

/// Korean polite/declarative verb endings. A final syllable from this set
/// (요, 다, 죠, 니, 음, 습) marks the utterance as complete even when the
/// speech service omitted punctuation.
pub struct KoreanSentencePolicy {
    ending: Regex,
}

impl KoreanSentencePolicy {
    pub fn new() -> Result<Self> {
        let ending = Regex::new("[요다죠니음습]$")?;
        Ok(Self { ending })
    }
}

impl SentencePolicy for KoreanSentencePolicy {
    fn ends_sentence(&self, text: &str) -> bool {
        self.ending.is_match(text.trim())
    }

    fn name(&self) -> &'static str {
        "korean"
    }
}

/// Fallback for languages without a morpheme set: only punctuation ever
/// closes a sentence, so unpunctuated text always merges forward.
pub struct PunctuationOnlyPolicy;

impl SentencePolicy for PunctuationOnlyPolicy {
    fn ends_sentence(&self, _text: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "punctuation-only"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_korean_declarative_endings() {
        let policy = KoreanSentencePolicy::new().unwrap();
        assert!(policy.ends_sentence("회의를 시작합니다"));
        assert!(policy.ends_sentence("네 알겠어요"));
        assert!(policy.ends_sentence("그렇죠"));
    }

    #[test]
    fn test_korean_mid_sentence_endings() {
        let policy = KoreanSentencePolicy::new().unwrap();
        assert!(!policy.ends_sentence("그래서 제가"));
        assert!(!policy.ends_sentence("다음 주에"));
    }

    #[test]
    fn test_korean_trims_whitespace() {
        let policy = KoreanSentencePolicy::new().unwrap();
        assert!(policy.ends_sentence("시작합니다  "));
    }

    #[test]
    fn test_punctuation_only_never_completes() {
        let policy = PunctuationOnlyPolicy;
        assert!(!policy.ends_sentence("let's get started"));
    }

    #[test]
    fn test_policy_for_language() {
        assert_eq!(policy_for_language("ko").unwrap().name(), "korean");
        assert_eq!(policy_for_language("en").unwrap().name(), "punctuation-only");
    }
}
