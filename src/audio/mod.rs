//! Microphone capture feeding the speech-service stream.

pub mod audio_source;
pub mod mic_source;

pub use audio_source::AudioSource;
pub use mic_source::MicAudioSource;
