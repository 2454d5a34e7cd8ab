//! Incremental transcript reconciliation.
//!
//! The speech service emits partial and final recognition events that can
//! arrive fragmentary or overlapping: a pause mid-sentence splits one spoken
//! sentence into two final events, and timestamps are often missing. The
//! reconciler folds that stream into an ordered list of display-ready
//! sentences: partials replace a transient preview, finals either extend a
//! trailing fragment or append a new sentence, missing timestamps are
//! inferred from the recording clock and the previous sentence, and
//! unpunctuated-but-complete text gets its terminal period synthesized.
//!
//! The repair is best-effort surface morphology, not parsing. The worst
//! outcome of a wrong call is a misplaced sentence boundary, which later
//! events tend to absorb because fragment state is re-derived from the
//! accumulated text on every ingest.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::language::SentencePolicy;
use super::view::TranscriptSink;
use crate::session::clock::ClockHandle;

/// A recognition result from the speech service.
#[derive(Debug, Clone, Default)]
pub struct RecognitionEvent {
    /// Newly recognized span. Events without text are dropped.
    pub text: String,
    /// The service's own accumulated reconstruction of the utterance.
    pub full_text: Option<String>,
    /// The service considers the utterance complete.
    pub is_final: bool,
    /// The service signals a sentence boundary independent of finality.
    pub is_sentence_end: bool,
    /// Service-supplied span timestamps in milliseconds.
    pub start_timestamp: Option<u64>,
    pub end_timestamp: Option<u64>,
    /// Speaker attribution, when the service provides one.
    pub speaker: Option<String>,
}

/// One finalized sentence. Only the last record may still change, and only
/// while its text classifies as a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub text: String,
    /// Milliseconds from recording start.
    pub start_ts: u64,
    pub end_ts: u64,
    pub speaker: String,
}

/// Folds the recognition event stream into the authoritative sentence
/// sequence. One instance per recording session; `ingest` is the only
/// mutator and must be driven by a single caller.
pub struct TranscriptReconciler {
    sentences: Vec<SentenceRecord>,
    partial_preview: Option<String>,
    policy: Box<dyn SentencePolicy>,
    fallback_speaker: String,
    clock: ClockHandle,
    sink: Box<dyn TranscriptSink>,
}

impl TranscriptReconciler {
    pub fn new(
        policy: Box<dyn SentencePolicy>,
        fallback_speaker: String,
        clock: ClockHandle,
        sink: Box<dyn TranscriptSink>,
    ) -> Self {
        debug!("Transcript reconciler using {} policy", policy.name());
        Self {
            sentences: Vec::new(),
            partial_preview: None,
            policy,
            fallback_speaker,
            clock,
            sink,
        }
    }

    /// Fold one recognition event into the transcript.
    ///
    /// Never fails: events without usable text are dropped, missing
    /// timestamps are inferred from the previous sentence and the recording
    /// clock.
    pub fn ingest(&mut self, event: RecognitionEvent) {
        if event.text.is_empty() {
            debug!("Dropping recognition event without text");
            return;
        }

        // Interim result: replace the preview, leave the sentence list alone.
        if !event.is_final && !event.is_sentence_end {
            self.sink.show_preview(&event.text);
            self.partial_preview = Some(event.text);
            return;
        }

        // Finalization supersedes the preview whatever happens next.
        self.partial_preview = None;
        self.sink.clear_preview();

        let final_text = match &event.full_text {
            Some(full) if !full.is_empty() => full.trim(),
            _ => event.text.trim(),
        };
        if final_text.is_empty() {
            return;
        }

        let end_ts = event.end_timestamp.unwrap_or_else(|| self.clock.elapsed_ms());
        let start_ts = match event.start_timestamp {
            Some(ts) => ts,
            None => self.sentences.last().map(|s| s.end_ts).unwrap_or(0),
        };

        let merge = self
            .sentences
            .last()
            .map(|last| self.is_fragment(&last.text))
            .unwrap_or(false);

        let index = if merge {
            // The previous sentence was cut off mid-thought; this event
            // continues it. Its start timestamp stays put.
            let index = self.sentences.len() - 1;
            {
                let last = &mut self.sentences[index];
                last.text.push(' ');
                last.text.push_str(final_text);
                last.end_ts = end_ts;
                if needs_punctuation(&last.text) && self.policy.ends_sentence(&last.text) {
                    last.text.push('.');
                }
            }
            index
        } else {
            let mut text = final_text.to_string();
            if needs_punctuation(&text) && self.policy.ends_sentence(&text) {
                text.push('.');
            }
            let speaker = event
                .speaker
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| self.fallback_speaker.clone());
            self.sentences.push(SentenceRecord {
                text,
                start_ts,
                end_ts,
                speaker,
            });
            self.sentences.len() - 1
        };

        self.sink.upsert_sentence(index, &self.sentences[index]);
        self.sink.set_sentence_count(self.sentences.len());
    }

    /// Grammatically incomplete text: unpunctuated and not ending in a
    /// sentence-final morpheme. Eligible to be continued by the next event.
    fn is_fragment(&self, text: &str) -> bool {
        let trimmed = text.trim();
        needs_punctuation(trimmed) && !self.policy.ends_sentence(trimmed)
    }

    pub fn sentences(&self) -> &[SentenceRecord] {
        &self.sentences
    }

    pub fn partial_preview(&self) -> Option<&str> {
        self.partial_preview.as_deref()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}

/// Text still lacking sentence-final punctuation.
fn needs_punctuation(text: &str) -> bool {
    !text.trim().ends_with(['.', '?', '!'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::RecordingClock;
    use crate::transcript::language::{policy_for_language, KoreanSentencePolicy};
    use crate::transcript::view::LiveTranscriptView;

    struct NullSink;

    impl TranscriptSink for NullSink {
        fn show_preview(&mut self, _text: &str) {}
        fn clear_preview(&mut self) {}
        fn upsert_sentence(&mut self, _index: usize, _sentence: &SentenceRecord) {}
        fn set_sentence_count(&mut self, _count: usize) {}
    }

    fn korean_reconciler(clock: ClockHandle) -> TranscriptReconciler {
        TranscriptReconciler::new(
            Box::new(KoreanSentencePolicy::new().unwrap()),
            "화자".to_string(),
            clock,
            Box::new(NullSink),
        )
    }

    fn final_event(text: &str) -> RecognitionEvent {
        RecognitionEvent {
            text: text.to_string(),
            is_final: true,
            ..Default::default()
        }
    }

    fn partial_event(text: &str) -> RecognitionEvent {
        RecognitionEvent {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_event_is_dropped() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(partial_event("인식 중"));
        reconciler.ingest(final_event(""));

        // Neither the preview nor the sentence list changed.
        assert_eq!(reconciler.partial_preview(), Some("인식 중"));
        assert_eq!(reconciler.sentence_count(), 0);
    }

    #[test]
    fn test_partials_replace_single_preview() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(partial_event("안녕"));
        reconciler.ingest(partial_event("안녕하세요"));

        assert_eq!(reconciler.partial_preview(), Some("안녕하세요"));
        assert_eq!(reconciler.sentence_count(), 0);
    }

    #[test]
    fn test_finalization_clears_preview() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(partial_event("회의를"));
        reconciler.ingest(final_event("회의를 시작합니다."));

        assert!(reconciler.partial_preview().is_none());
        assert_eq!(reconciler.sentence_count(), 1);
    }

    #[test]
    fn test_append_already_punctuated() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("회의를 시작합니다."));

        let sentences = reconciler.sentences();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "회의를 시작합니다.");
        assert_eq!(sentences[0].start_ts, 0);
    }

    #[test]
    fn test_punctuation_synthesized_for_complete_ending() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("네 알겠습니다"));

        assert_eq!(reconciler.sentences()[0].text, "네 알겠습니다.");
    }

    #[test]
    fn test_no_second_terminal_mark() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("시작할까요?"));
        reconciler.ingest(final_event("네 좋습니다."));

        assert_eq!(reconciler.sentences()[0].text, "시작할까요?");
        assert_eq!(reconciler.sentences()[1].text, "네 좋습니다.");
    }

    #[test]
    fn test_fragment_merges_into_previous() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        // Ends without punctuation and without a sentence-final morpheme.
        reconciler.ingest(RecognitionEvent {
            text: "다음 주 회의는".to_string(),
            is_final: true,
            start_timestamp: Some(1000),
            end_timestamp: Some(2500),
            ..Default::default()
        });
        reconciler.ingest(RecognitionEvent {
            text: "곧 시작할게요".to_string(),
            is_final: true,
            end_timestamp: Some(4200),
            ..Default::default()
        });

        let sentences = reconciler.sentences();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "다음 주 회의는 곧 시작할게요.");
        assert_eq!(sentences[0].start_ts, 1000);
        assert_eq!(sentences[0].end_ts, 4200);
    }

    #[test]
    fn test_complete_sentence_does_not_merge() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("네 알겠습니다"));
        reconciler.ingest(final_event("곧 시작할게요"));

        assert_eq!(reconciler.sentence_count(), 2);
    }

    #[test]
    fn test_timestamp_inference_chain() {
        let clock = RecordingClock::new();
        for _ in 0..10 {
            clock.tick();
        }

        let mut reconciler = korean_reconciler(clock.handle());
        reconciler.ingest(RecognitionEvent {
            text: "첫 문장입니다.".to_string(),
            is_final: true,
            start_timestamp: Some(0),
            end_timestamp: Some(4000),
            ..Default::default()
        });
        // No timestamps: start falls back to the previous end, end to the
        // elapsed recording time.
        reconciler.ingest(final_event("다음 문장입니다."));

        let second = &reconciler.sentences()[1];
        assert_eq!(second.start_ts, 4000);
        assert_eq!(second.end_ts, 10_000);
    }

    #[test]
    fn test_first_sentence_starts_at_zero() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("첫 문장입니다."));

        assert_eq!(reconciler.sentences()[0].start_ts, 0);
    }

    #[test]
    fn test_full_text_preferred_over_span() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(RecognitionEvent {
            text: "시작합니다".to_string(),
            full_text: Some("  회의를 시작합니다.  ".to_string()),
            is_final: true,
            ..Default::default()
        });

        assert_eq!(reconciler.sentences()[0].text, "회의를 시작합니다.");
    }

    #[test]
    fn test_empty_full_text_falls_back_to_span() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(RecognitionEvent {
            text: "회의를 시작합니다.".to_string(),
            full_text: Some(String::new()),
            is_final: true,
            ..Default::default()
        });

        assert_eq!(reconciler.sentences()[0].text, "회의를 시작합니다.");
    }

    #[test]
    fn test_whitespace_full_text_discards_event() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(RecognitionEvent {
            text: "시작".to_string(),
            full_text: Some("   ".to_string()),
            is_final: true,
            ..Default::default()
        });

        assert_eq!(reconciler.sentence_count(), 0);
    }

    #[test]
    fn test_sentence_end_without_final_flag_finalizes() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(RecognitionEvent {
            text: "첫 번째 안건입니다.".to_string(),
            is_sentence_end: true,
            ..Default::default()
        });

        assert_eq!(reconciler.sentence_count(), 1);
    }

    #[test]
    fn test_speaker_fallback_and_attribution() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(final_event("첫 문장입니다."));
        reconciler.ingest(RecognitionEvent {
            text: "두 번째 문장입니다.".to_string(),
            is_final: true,
            speaker: Some("speaker_2".to_string()),
            ..Default::default()
        });

        assert_eq!(reconciler.sentences()[0].speaker, "화자");
        assert_eq!(reconciler.sentences()[1].speaker, "speaker_2");
    }

    #[test]
    fn test_merge_keeps_original_speaker() {
        let mut reconciler = korean_reconciler(ClockHandle::default());
        reconciler.ingest(RecognitionEvent {
            text: "다음 주에".to_string(),
            is_final: true,
            speaker: Some("speaker_1".to_string()),
            ..Default::default()
        });
        reconciler.ingest(RecognitionEvent {
            text: "만나요".to_string(),
            is_final: true,
            speaker: Some("speaker_2".to_string()),
            ..Default::default()
        });

        let sentences = reconciler.sentences();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].speaker, "speaker_1");
    }

    #[test]
    fn test_count_tracks_appends_through_view() {
        let view = LiveTranscriptView::default();
        let mut reconciler = TranscriptReconciler::new(
            policy_for_language("ko").unwrap(),
            "화자".to_string(),
            ClockHandle::default(),
            Box::new(view.clone()),
        );

        reconciler.ingest(final_event("첫 문장입니다."));
        reconciler.ingest(final_event("둘째 문장입니다."));
        reconciler.ingest(final_event("셋째 문장입니다."));

        let snapshot = view.snapshot();
        assert_eq!(snapshot.sentence_count, reconciler.sentence_count());
        assert_eq!(snapshot.sentence_count, 3);
        assert_eq!(snapshot.items.len(), 3);
    }

    #[test]
    fn test_merge_updates_existing_view_row() {
        let view = LiveTranscriptView::default();
        let mut reconciler = TranscriptReconciler::new(
            policy_for_language("ko").unwrap(),
            "화자".to_string(),
            ClockHandle::default(),
            Box::new(view.clone()),
        );

        reconciler.ingest(final_event("오늘 회의는"));
        reconciler.ingest(final_event("삼십 분입니다"));

        let snapshot = view.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].text, "오늘 회의는 삼십 분입니다.");
        assert_eq!(snapshot.sentence_count, 1);
    }
}
