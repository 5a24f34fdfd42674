mod decode;
mod wav;

pub use decode::{AudioDecoder, SymphoniaDecoder};
pub use wav::{encode_wav, sample_to_i16, DecodedAudio, WavFile, HEADER_LEN};

/// Name of the WAV file extracted from `source_name`.
///
/// The stem is everything before the first `.`, so `clip.final.mp4` with the
/// `audio-` prefix becomes `audio-clip.wav`.
pub fn output_file_name(source_name: &str, prefix: &str) -> String {
    numbered_output_file_name(source_name, prefix, 0)
}

/// Like [`output_file_name`], with ` (n)` appended to the stem when `n > 0`
pub fn numbered_output_file_name(source_name: &str, prefix: &str, n: usize) -> String {
    let stem = source_name.split('.').next().unwrap_or_default();
    if n == 0 {
        format!("{}{}.wav", prefix, stem)
    } else {
        format!("{}{} ({}).wav", prefix, stem, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("holiday.mp4", "audio-"), "audio-holiday.wav");
        assert_eq!(output_file_name("clip.final.webm", "audio-"), "audio-clip.wav");
        assert_eq!(output_file_name("noext", "audio-"), "audio-noext.wav");
        assert_eq!(output_file_name("talk.mkv", ""), "talk.wav");
    }

    #[test]
    fn test_numbered_output_file_name() {
        assert_eq!(
            numbered_output_file_name("talk.mp4", "audio-", 0),
            "audio-talk.wav"
        );
        assert_eq!(
            numbered_output_file_name("talk.webm", "audio-", 2),
            "audio-talk (2).wav"
        );
    }
}
