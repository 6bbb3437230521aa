/// Sound cues: procedural chiptune effects via rodio.
///
/// Every effect is synthesized into an in-memory WAV buffer once at start-up.
/// Playback is fire-and-forget through a detached Sink.
///
/// Build without the "sound" feature to get a silent stub with the same API.

use crate::sim::event::Cue;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::sim::event::Cue;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_boost: Arc<Vec<u8>>,
        sfx_success: Arc<Vec<u8>>,
        sfx_failure: Arc<Vec<u8>>,
        sfx_intro: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, running silent: {e}");
                    return None;
                }
            };
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&sweep(320.0, 720.0, 0.09, 0.22))),
                sfx_boost: Arc::new(make_wav(&sweep(420.0, 1260.0, 0.16, 0.25))),
                sfx_success: Arc::new(make_wav(&arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.09, 0.28))),
                sfx_failure: Arc::new(make_wav(&arpeggio(&[392.0, 311.0, 233.0], 0.11, 0.3))),
                sfx_intro: Arc::new(make_wav(&shimmer())),
            })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match cue {
                Cue::Jumped => &self.sfx_jump,
                Cue::Boosted => &self.sfx_boost,
                Cue::Success => &self.sfx_success,
                Cue::Failure => &self.sfx_failure,
                Cue::IntroShown => &self.sfx_intro,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Pitch sweep with a linear fade.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let square = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                square * (1.0 - t) * volume * 0.6
            })
            .collect()
    }

    /// Notes in sequence, sine + octave for a bright retro tone.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        let mut samples = Vec::with_capacity(n * notes.len());
        for &freq in notes {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        // Tail fade
        let fade = samples.len() / 4;
        let total = samples.len();
        for (k, s) in samples[total - fade..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade.max(1) as f32;
        }
        samples
    }

    /// Icy sting for the title card: detuned high pair with slow decay.
    fn shimmer() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.6) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / n as f32).powf(1.5);
                let wave = (t * 1568.0 * TAU).sin() + (t * 1576.0 * TAU).sin() * 0.8;
                wave * env * 0.12
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&sweep(300.0, 600.0, 0.05, 0.2));
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data_size);
            let riff_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]) as usize;
            assert_eq!(riff_size, wav.len() - 8);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

/// Play every cue the level emitted this tick.
pub fn play_cues(sound: Option<&SoundEngine>, cues: &[Cue]) {
    if let Some(sfx) = sound {
        for &cue in cues {
            sfx.play(cue);
        }
    }
}
