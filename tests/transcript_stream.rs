//! End-to-end reconciliation: a realistic recognition event stream folded
//! into sentences, rendered through the live view, and mapped into the
//! backend finish payload.

use notula::backend::FinishSessionRequest;
use notula::session::clock::RecordingClock;
use notula::session::status::RecordingUpload;
use notula::transcript::{
    policy_for_language, LiveTranscriptView, RecognitionEvent, TranscriptReconciler,
};

fn reconciler_with_view(clock: &RecordingClock) -> (TranscriptReconciler, LiveTranscriptView) {
    let view = LiveTranscriptView::default();
    let reconciler = TranscriptReconciler::new(
        policy_for_language("ko").unwrap(),
        "화자".to_string(),
        clock.handle(),
        Box::new(view.clone()),
    );
    (reconciler, view)
}

fn partial(text: &str) -> RecognitionEvent {
    RecognitionEvent {
        text: text.to_string(),
        ..Default::default()
    }
}

fn final_at(text: &str, start: Option<u64>, end: Option<u64>) -> RecognitionEvent {
    RecognitionEvent {
        text: text.to_string(),
        is_final: true,
        start_timestamp: start,
        end_timestamp: end,
        ..Default::default()
    }
}

#[test]
fn stream_reconciles_into_display_and_payload() {
    let clock = RecordingClock::new();
    let (mut reconciler, view) = reconciler_with_view(&clock);

    // Opening sentence arrives with service timestamps, preceded by interim
    // results that only ever touch the preview.
    reconciler.ingest(partial("회의"));
    reconciler.ingest(partial("회의를 시작"));
    assert_eq!(view.snapshot().preview.as_deref(), Some("회의를 시작"));
    assert_eq!(view.snapshot().sentence_count, 0);

    reconciler.ingest(final_at("회의를 시작하겠습니다.", Some(0), Some(3200)));
    assert!(view.snapshot().preview.is_none());

    // A pause mid-sentence splits one spoken sentence into two final
    // events: the fragment merges with the continuation, and the merged
    // text earns its synthesized period.
    for _ in 0..8 {
        clock.tick();
    }
    reconciler.ingest(final_at("오늘 안건은", Some(3200), Some(5100)));
    assert_eq!(view.snapshot().sentence_count, 2);
    reconciler.ingest(final_at("예산 검토입니다", None, None));

    let sentences = reconciler.sentences().to_vec();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[1].text, "오늘 안건은 예산 검토입니다.");
    assert_eq!(sentences[1].start_ts, 3200);
    // The missing end timestamp fell back to the elapsed recording time.
    assert_eq!(sentences[1].end_ts, 8000);

    // A third speaker-attributed sentence with no timestamps chains off the
    // merged sentence's end.
    clock.tick();
    reconciler.ingest(RecognitionEvent {
        text: "이의 없습니다".to_string(),
        is_final: true,
        speaker: Some("speaker_2".to_string()),
        ..Default::default()
    });

    let sentences = reconciler.sentences().to_vec();
    assert_eq!(sentences.len(), 3);
    assert_eq!(sentences[2].text, "이의 없습니다.");
    assert_eq!(sentences[2].start_ts, 8000);
    assert_eq!(sentences[2].end_ts, 9000);
    assert_eq!(sentences[2].speaker, "speaker_2");

    // The view mirrors the sentence list row for row.
    let snapshot = view.snapshot();
    assert_eq!(snapshot.items.len(), 3);
    assert_eq!(snapshot.sentence_count, 3);
    assert_eq!(snapshot.items[0].time_label, "00:00");
    assert_eq!(snapshot.items[1].text, "오늘 안건은 예산 검토입니다.");

    // Finish: sentences map into the persistence shape in order.
    let recording = RecordingUpload {
        audio_file_url: "https://storage/stt/meeting.wav".to_string(),
        audio_format: "wav".to_string(),
        audio_file_size: Some(88_000),
        duration_seconds: 0,
    };
    let payload = FinishSessionRequest::from_session(9, &recording, &sentences);

    assert_eq!(payload.duration, 9);
    assert_eq!(payload.recording.duration_seconds, 9);
    assert_eq!(payload.transcripts.len(), 3);
    assert_eq!(payload.transcripts[0].sequence_order, 0);
    assert_eq!(payload.transcripts[2].sequence_order, 2);
    assert_eq!(payload.transcripts[0].speaker_id, "화자");
    assert_eq!(payload.transcripts[0].speaker_label, 0);
    assert_eq!(payload.transcripts[2].speaker_label, 2);
    assert_eq!(payload.transcripts[1].start_time, 3200);
    assert_eq!(payload.transcripts[1].end_time, 8000);
}

#[test]
fn stream_survives_malformed_events() {
    let clock = RecordingClock::new();
    let (mut reconciler, view) = reconciler_with_view(&clock);

    reconciler.ingest(RecognitionEvent::default());
    reconciler.ingest(RecognitionEvent {
        text: "네".to_string(),
        full_text: Some("   ".to_string()),
        is_final: true,
        ..Default::default()
    });

    assert_eq!(reconciler.sentence_count(), 0);
    assert_eq!(view.snapshot().sentence_count, 0);

    // A well-formed event after the junk lands normally.
    reconciler.ingest(final_at("정상적인 문장입니다.", Some(0), Some(1000)));
    assert_eq!(reconciler.sentence_count(), 1);
}

#[test]
fn paused_clock_freezes_inferred_timestamps() {
    let clock = RecordingClock::new();
    let (mut reconciler, _view) = reconciler_with_view(&clock);

    clock.tick();
    clock.tick();
    clock.pause();
    clock.tick();

    reconciler.ingest(final_at("일시정지 전 문장입니다.", None, None));
    assert_eq!(reconciler.sentences()[0].end_ts, 2000);
}
