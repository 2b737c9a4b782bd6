//! Audio file formats understood by the command line tool.

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use clap::ValueEnum;
use tracing::warn;

use crate::g711::G711Codec;
use crate::rtp::{self, Packetizer, DEFAULT_PACKET_SAMPLES};

/// SSRC of the RTP streams written by `generate`.
const GENERATED_SSRC: u32 = 0x746F_6E65;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian PCM.
    #[default]
    S16le,
    /// G.711 mu-law, one byte per sample.
    Ulaw,
    /// G.711 A-law, one byte per sample.
    Alaw,
    /// Length-prefixed RTP packets; written as PCMU, read as PCMU or PCMA.
    RtpUlaw,
    /// Length-prefixed RTP packets; written as PCMA, read as PCMU or PCMA.
    RtpAlaw,
}

impl SampleFormat {
    fn codec(self) -> Option<G711Codec> {
        match self {
            Self::S16le => None,
            Self::Ulaw | Self::RtpUlaw => Some(G711Codec::Ulaw),
            Self::Alaw | Self::RtpAlaw => Some(G711Codec::Alaw),
        }
    }

    pub fn is_packetized(self) -> bool {
        matches!(self, Self::RtpUlaw | Self::RtpAlaw)
    }
}

/// Split file contents into the frames handed to the detector: one frame
/// per G.711 packet for RTP input, `chunk` samples otherwise.
pub fn decode_frames(
    bytes: Bytes,
    format: SampleFormat,
    chunk: usize,
) -> anyhow::Result<Vec<Vec<i16>>> {
    if format.is_packetized() {
        let packets = rtp::read_stream(bytes)?;
        return Ok(rtp::depacketize(&packets));
    }

    let samples = match format.codec() {
        Some(codec) => codec.expand(&bytes),
        None => {
            let pairs = bytes.chunks_exact(2);
            if !pairs.remainder().is_empty() {
                warn!("ignoring trailing odd byte in 16-bit input");
            }
            pairs
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect()
        }
    };
    Ok(samples.chunks(chunk.max(1)).map(<[i16]>::to_vec).collect())
}

pub fn encode(samples: &[i16], format: SampleFormat) -> anyhow::Result<Vec<u8>> {
    let Some(codec) = format.codec() else {
        return Ok(samples.iter().flat_map(|s| s.to_le_bytes()).collect());
    };
    if format.is_packetized() {
        let packets =
            Packetizer::new(codec, GENERATED_SSRC, DEFAULT_PACKET_SAMPLES).packetize(samples);
        return Ok(rtp::write_stream(&packets)?.to_vec());
    }
    Ok(codec.compress(samples))
}

pub fn read_frames(
    path: &Path,
    format: SampleFormat,
    chunk: usize,
) -> anyhow::Result<Vec<Vec<i16>>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_frames(Bytes::from(bytes), format, chunk)
        .with_context(|| format!("malformed {:?} input {}", format, path.display()))
}

pub fn write_samples(path: &Path, samples: &[i16], format: SampleFormat) -> anyhow::Result<()> {
    std::fs::write(path, encode(samples, format)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: Vec<u8>, format: SampleFormat) -> Vec<i16> {
        decode_frames(Bytes::from(bytes), format, usize::MAX)
            .unwrap()
            .concat()
    }

    #[test]
    fn test_s16le_layout() {
        let bytes = encode(&[1, -2, 0x1234], SampleFormat::S16le).unwrap();
        assert_eq!(bytes, vec![0x01, 0x00, 0xFE, 0xFF, 0x34, 0x12]);
        assert_eq!(decode(bytes, SampleFormat::S16le), vec![1, -2, 0x1234]);
    }

    #[test]
    fn test_odd_trailing_byte_dropped() {
        assert_eq!(decode(vec![0x01, 0x00, 0x7F], SampleFormat::S16le), vec![1]);
    }

    #[test]
    fn test_companded_sizes() {
        let samples = vec![0i16, 1000, -1000, i16::MAX];
        assert_eq!(encode(&samples, SampleFormat::Ulaw).unwrap().len(), 4);
        let alaw = encode(&samples, SampleFormat::Alaw).unwrap();
        assert_eq!(decode(alaw, SampleFormat::Alaw)[0], 8);
    }

    #[test]
    fn test_chunked_frames() {
        let bytes = encode(&[0i16; 250], SampleFormat::Ulaw).unwrap();
        let frames = decode_frames(Bytes::from(bytes), SampleFormat::Ulaw, 100).unwrap();
        let lens: Vec<usize> = frames.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![100, 100, 50]);
    }

    #[test]
    fn test_rtp_frames_follow_packets() {
        let bytes = encode(&[0i16; 400], SampleFormat::RtpAlaw).unwrap();
        // three packets of 160, 160 and 80 samples, each with a 2-byte prefix
        assert_eq!(bytes.len(), 3 * (2 + 12) + 400);

        // the chunk size does not apply to packetized input
        let frames = decode_frames(Bytes::from(bytes), SampleFormat::RtpUlaw, 7).unwrap();
        let lens: Vec<usize> = frames.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![160, 160, 80]);
    }

    #[test]
    fn test_truncated_rtp_input_is_an_error() {
        let mut bytes = encode(&[0i16; 200], SampleFormat::RtpUlaw).unwrap();
        bytes.pop();
        assert!(decode_frames(Bytes::from(bytes), SampleFormat::RtpUlaw, 160).is_err());
    }

    #[test]
    fn test_digits_survive_companding() {
        use toneline_dtmf::{DetectorConfig, DtmfDetector, ProcessOptions};
        use toneline_tone::DtmfDialer;

        let tones = DtmfDialer::new(8000.0, 60.0, 60.0, 8000.0)
            .dial("2580")
            .unwrap();
        for format in [SampleFormat::Ulaw, SampleFormat::Alaw] {
            let bytes = encode(&tones, format).unwrap();
            let mut detector = DtmfDetector::new(8000, DetectorConfig::default()).unwrap();
            for frame in decode_frames(Bytes::from(bytes), format, 160).unwrap() {
                detector.process(&frame, ProcessOptions::default());
            }
            assert_eq!(detector.sink().digits(), "2580", "{:?}", format);
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.ul");
        write_samples(&path, &[0, 0], SampleFormat::Ulaw).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xFF]);
        assert_eq!(
            read_frames(&path, SampleFormat::Ulaw, 160).unwrap(),
            vec![vec![0, 0]]
        );
        assert!(read_frames(&dir.path().join("missing"), SampleFormat::Ulaw, 160).is_err());
    }
}
