//! 16-bit PCM RIFF/WAVE encoding of decoded audio.

use std::time::Duration;

use crate::error::AudioError;

/// Size of the canonical PCM WAVE header
pub const HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Decoded, planar floating-point audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Build a buffer from per-channel sample data.
    ///
    /// Every channel must hold the same number of samples, and the encoded
    /// size has to fit the 32-bit RIFF size fields.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidBuffer("sample rate must be positive".into()));
        }
        if channels.is_empty() {
            return Err(AudioError::InvalidBuffer("at least one channel is required".into()));
        }
        if channels.len() > u16::MAX as usize {
            return Err(AudioError::InvalidBuffer(format!(
                "{} channels exceeds the WAV limit",
                channels.len()
            )));
        }

        let len = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(AudioError::InvalidBuffer(format!(
                "channel {} has {} samples, expected {}",
                idx,
                ch.len(),
                len
            )));
        }

        let block = (channels.len() * BYTES_PER_SAMPLE) as u64;
        let data_len = (len as u64).checked_mul(block);
        let byte_rate = u64::from(sample_rate) * block;
        match data_len {
            Some(n) if n + (HEADER_LEN as u64 - 8) <= u64::from(u32::MAX) => {}
            _ => {
                return Err(AudioError::InvalidBuffer(
                    "audio is too long for a WAV file".into(),
                ))
            }
        }
        if byte_rate > u64::from(u32::MAX) {
            return Err(AudioError::InvalidBuffer(format!(
                "sample rate {} is too high for {} channels",
                sample_rate,
                channels.len()
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample data of one channel
    ///
    /// # Panics
    /// Panics if `index` is not below [`Self::number_of_channels`].
    pub fn channel_data(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.len() as f64 / f64::from(self.sample_rate))
    }
}

/// An encoded WAV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    bytes: Vec<u8>,
}

impl WavFile {
    pub const MIME_TYPE: &'static str = "audio/wav";

    pub fn mime_type(&self) -> &'static str {
        Self::MIME_TYPE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Little-endian writer over a pre-sized buffer
struct WavCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl WavCursor {
    fn with_len(len: usize) -> Self {
        Self {
            buf: vec![0; len],
            pos: 0,
        }
    }

    fn write_tag(&mut self, tag: &[u8; 4]) {
        self.put(tag);
    }

    fn write_u16(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    fn write_i16(&mut self, value: i16) {
        self.put(&value.to_le_bytes());
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn finish(self) -> Vec<u8> {
        debug_assert_eq!(self.pos, self.buf.len());
        self.buf
    }
}

/// Convert a float sample to signed 16-bit PCM.
///
/// The sample is clamped to [-1, 1], scaled by 32768 when negative and 32767
/// otherwise, then truncated toward zero.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = f64::from(sample).clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    // `as` truncates toward zero; NaN becomes 0
    scaled as i16
}

/// Encode decoded audio as a 16-bit PCM WAV file
pub fn encode_wav(audio: &DecodedAudio) -> WavFile {
    let channels = audio.number_of_channels();
    let frames = audio.len();
    let block_align = channels * BYTES_PER_SAMPLE;
    let data_len = frames * block_align;
    let total_len = HEADER_LEN + data_len;

    let mut cursor = WavCursor::with_len(total_len);

    // RIFF header
    cursor.write_tag(b"RIFF");
    cursor.write_u32((total_len - 8) as u32);
    cursor.write_tag(b"WAVE");

    // fmt chunk
    cursor.write_tag(b"fmt ");
    cursor.write_u32(FMT_CHUNK_LEN);
    cursor.write_u16(FORMAT_PCM);
    cursor.write_u16(channels as u16);
    cursor.write_u32(audio.sample_rate());
    cursor.write_u32(audio.sample_rate() * block_align as u32);
    cursor.write_u16(block_align as u16);
    cursor.write_u16(BITS_PER_SAMPLE);

    // data chunk
    cursor.write_tag(b"data");
    cursor.write_u32(data_len as u32);

    for t in 0..frames {
        for ch in &audio.channels {
            cursor.write_i16(sample_to_i16(ch[t]));
        }
    }

    WavFile {
        bytes: cursor.finish(),
    }
}
