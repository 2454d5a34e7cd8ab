//! Incremental transcript reconciliation.
//!
//! Turns the speech service's noisy partial/final event stream into the
//! ordered, display-ready sentence sequence a session persists on finish.

pub mod language;
pub mod reconciler;
pub mod view;

pub use language::{policy_for_language, KoreanSentencePolicy, PunctuationOnlyPolicy, SentencePolicy};
pub use reconciler::{RecognitionEvent, SentenceRecord, TranscriptReconciler};
pub use view::{LiveTranscriptView, TranscriptItem, TranscriptSink, TranscriptViewSnapshot};
