use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::DecodedAudio;
use crate::error::AudioError;

/// Turns the raw bytes of a media file into decoded audio
pub trait AudioDecoder: Send + Sync {
    /// Returns the decoder name for logging
    fn name(&self) -> &'static str;

    /// Decode the first audio track of a media file
    fn decode(
        &self,
        bytes: Vec<u8>,
        extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError>;
}

/// Decoder backed by symphonia's probe and codec registries
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        let mut format = probed.format;

        // Containers may carry video or subtitle tracks alongside audio
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AudioError::NoAudioTrack)?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channel_count = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        let mut interleaved: Vec<f32> = Vec::new();
        let mut skipped = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(AudioError::DecodeError(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    skipped += 1;
                    debug!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(AudioError::DecodeError(e.to_string())),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            let count = *channel_count.get_or_insert(spec.channels.count());
            if spec.channels.count() != count {
                return Err(AudioError::DecodeError(format!(
                    "channel count changed mid-stream ({} -> {})",
                    count,
                    spec.channels.count()
                )));
            }

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }

        if skipped > 0 {
            warn!("Skipped {} undecodable packets", skipped);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| AudioError::DecodeError("unknown sample rate".into()))?;
        let channel_count = channel_count.unwrap_or(1);

        let channels = deinterleave(&interleaved, channel_count);
        let audio = DecodedAudio::new(sample_rate, channels)?;

        debug!(
            "Decoded {} frames x {} channels at {} Hz ({:.2}s)",
            audio.len(),
            audio.number_of_channels(),
            audio.sample_rate(),
            audio.duration().as_secs_f32()
        );

        Ok(audio)
    }
}

/// Split interleaved samples into one vector per channel, dropping a trailing
/// partial frame.
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in out.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hound_wav(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_deinterleave() {
        let planar = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(planar, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_decode_stereo_wav() {
        let bytes = hound_wav(2, 16000, &[0, 16384, -16384, 8192, 0, -32768]);
        let audio = SymphoniaDecoder::new().decode(bytes, Some("wav")).unwrap();

        assert_eq!(audio.sample_rate(), 16000);
        assert_eq!(audio.number_of_channels(), 2);
        assert_eq!(audio.len(), 3);
        assert_eq!(audio.channel_data(0), &[0.0, -0.5, 0.0]);
        assert_eq!(audio.channel_data(1), &[0.5, 0.25, -1.0]);
    }

    #[test]
    fn test_decode_then_encode_preserves_pcm() {
        let pcm: Vec<i16> = vec![0, 1000, -1000, 32767, -32768, 12345];
        let bytes = hound_wav(1, 44100, &pcm);
        let audio = SymphoniaDecoder::new().decode(bytes, None).unwrap();
        let wav = crate::audio::encode_wav(&audio);

        let mut reader = hound::WavReader::new(Cursor::new(wav.into_bytes())).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        // Negative samples survive exactly; positive ones lose at most one step
        for (orig, back) in pcm.iter().zip(&decoded) {
            assert!((i32::from(*orig) - i32::from(*back)).abs() <= 1, "{orig} vs {back}");
        }
    }

    #[test]
    fn test_decode_through_trait_object() {
        let decoder: std::sync::Arc<dyn AudioDecoder> = std::sync::Arc::new(SymphoniaDecoder);
        assert_eq!(decoder.name(), "symphonia");

        let audio = decoder
            .decode(hound_wav(1, 8000, &[0, -16384]), Some("wav"))
            .unwrap();
        assert_eq!(audio.channel_data(0), &[0.0, -0.5]);
    }

    #[test]
    fn test_rejects_garbage() {
        let result = SymphoniaDecoder::new().decode(b"definitely not media".to_vec(), None);
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }
}
