//! Display seam for the reconciler, plus the live view the API serves.
//!
//! The reconciler publishes three things: a transient preview, per-sentence
//! upserts keyed by position, and the finalized-sentence count.
//! `LiveTranscriptView` is the production sink: it maintains the render
//! list behind GET /session/transcript.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use super::reconciler::SentenceRecord;

/// Where the reconciler publishes display updates.
pub trait TranscriptSink: Send {
    /// Replace the in-progress preview.
    fn show_preview(&mut self, text: &str);

    /// Remove the preview (a finalization superseded it).
    fn clear_preview(&mut self);

    /// Append or update the sentence at `index`.
    fn upsert_sentence(&mut self, index: usize, sentence: &SentenceRecord);

    /// Publish the current number of finalized sentences.
    fn set_sentence_count(&mut self, count: usize);
}

/// One rendered transcript row.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptItem {
    pub index: usize,
    /// Clock label derived from the sentence start, e.g. "03:12".
    pub time_label: String,
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TranscriptViewSnapshot {
    pub items: Vec<TranscriptItem>,
    pub preview: Option<String>,
    pub sentence_count: usize,
}

/// Shared render state: written by the reconciler (the single writer),
/// read by API handlers.
#[derive(Clone, Default)]
pub struct LiveTranscriptView {
    inner: Arc<Mutex<TranscriptViewSnapshot>>,
}

impl LiveTranscriptView {
    pub fn snapshot(&self) -> TranscriptViewSnapshot {
        self.inner.lock().unwrap().clone()
    }

    /// Clear everything at session start.
    pub fn reset(&self) {
        let mut state = self.inner.lock().unwrap();
        *state = TranscriptViewSnapshot::default();
    }
}

impl TranscriptSink for LiveTranscriptView {
    fn show_preview(&mut self, text: &str) {
        self.inner.lock().unwrap().preview = Some(text.to_string());
    }

    fn clear_preview(&mut self) {
        self.inner.lock().unwrap().preview = None;
    }

    fn upsert_sentence(&mut self, index: usize, sentence: &SentenceRecord) {
        let mut state = self.inner.lock().unwrap();
        let item = TranscriptItem {
            index,
            time_label: format_clock(sentence.start_ts / 1000),
            speaker: sentence.speaker.clone(),
            text: sentence.text.clone(),
        };
        match state.items.iter_mut().find(|existing| existing.index == index) {
            Some(existing) => *existing = item,
            None => state.items.push(item),
        }
    }

    fn set_sentence_count(&mut self, count: usize) {
        self.inner.lock().unwrap().sentence_count = count;
    }
}

/// mm:ss, rolling to hh:mm:ss past an hour.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
