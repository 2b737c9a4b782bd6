//! RTP packets carrying G.711 audio.
//!
//! Packet files hold a sequence of RTP packets, each prefixed with its
//! length as a 16-bit big-endian integer (the RFC 4571 framing used for RTP
//! over stream transports). RTCP is not handled.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::g711::G711Codec;

pub const RTP_VERSION: u8 = 2;

/// Static payload type of G.711 mu-law.
pub const PAYLOAD_PCMU: u8 = 0;
/// Static payload type of G.711 A-law.
pub const PAYLOAD_PCMA: u8 = 8;

/// 20 ms at 8 kHz, the usual G.711 packetization.
pub const DEFAULT_PACKET_SAMPLES: usize = 160;

const HEADER_LEN: usize = 12;
const MAX_CSRC: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RtpError {
    #[error("RTP packet too short: {0} bytes")]
    TooShort(usize),

    #[error("unsupported RTP version {0}")]
    UnsupportedVersion(u8),

    #[error("RTP CSRC list truncated")]
    TruncatedCsrc,

    #[error("RTP header extension truncated")]
    TruncatedExtension,

    #[error("invalid RTP padding length {0}")]
    InvalidPadding(usize),

    #[error("too many CSRC identifiers: {0}")]
    TooManyCsrc(usize),

    #[error("{0} bytes do not fit a 16-bit length field")]
    Oversized(usize),

    #[error("packet stream ends inside a packet")]
    TruncatedFrame,
}

/// G.711 law carried by a static payload type.
pub fn codec_for(payload_type: u8) -> Option<G711Codec> {
    match payload_type {
        PAYLOAD_PCMU => Some(G711Codec::Ulaw),
        PAYLOAD_PCMA => Some(G711Codec::Alaw),
        _ => None,
    }
}

pub fn payload_type_for(codec: G711Codec) -> u8 {
    match codec {
        G711Codec::Ulaw => PAYLOAD_PCMU,
        G711Codec::Alaw => PAYLOAD_PCMA,
    }
}

/// Header extension; `data` is a whole number of 32-bit words on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderExtension {
    pub profile: u16,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub version: u8,
    /// Padding octets after the payload, including the count octet itself.
    /// Zero when the P bit is clear.
    pub padding: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc_list: Vec<u32>,
    pub extension: Option<HeaderExtension>,
    pub payload: Bytes,
}

impl RtpPacket {
    pub fn new(payload_type: u8, sequence_number: u16, timestamp: u32, ssrc: u32) -> Self {
        Self {
            version: RTP_VERSION,
            padding: 0,
            marker: false,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc_list: Vec::new(),
            extension: None,
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    pub fn has_padding(&self) -> bool {
        self.padding > 0
    }

    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    pub fn encode(&self) -> Result<Bytes, RtpError> {
        if self.csrc_list.len() > MAX_CSRC {
            return Err(RtpError::TooManyCsrc(self.csrc_list.len()));
        }
        let ext_words = match &self.extension {
            Some(ext) => {
                let words = (ext.data.len() + 3) / 4;
                if words > u16::MAX as usize {
                    return Err(RtpError::Oversized(ext.data.len()));
                }
                words
            }
            None => 0,
        };

        let mut buf = BytesMut::with_capacity(
            HEADER_LEN
                + self.csrc_list.len() * 4
                + (if self.has_extension() { 4 + ext_words * 4 } else { 0 })
                + self.payload.len()
                + self.padding as usize,
        );

        // V(2) P(1) X(1) CC(4)
        let first_byte = ((self.version & 0x03) << 6)
            | (if self.has_padding() { 1 << 5 } else { 0 })
            | (if self.has_extension() { 1 << 4 } else { 0 })
            | self.csrc_list.len() as u8;
        buf.put_u8(first_byte);
        // M(1) PT(7)
        buf.put_u8((if self.marker { 1 << 7 } else { 0 }) | (self.payload_type & 0x7F));
        buf.put_u16(self.sequence_number);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);

        for &csrc in &self.csrc_list {
            buf.put_u32(csrc);
        }

        if let Some(ext) = &self.extension {
            buf.put_u16(ext.profile);
            buf.put_u16(ext_words as u16);
            buf.put_slice(&ext.data);
            buf.put_bytes(0, ext_words * 4 - ext.data.len());
        }

        buf.put_slice(&self.payload);

        if self.has_padding() {
            buf.put_bytes(0, self.padding as usize - 1);
            buf.put_u8(self.padding);
        }

        Ok(buf.freeze())
    }

    /// Parse one packet. The payload excludes the CSRC list, the header
    /// extension and any padding.
    pub fn decode(mut data: Bytes) -> Result<Self, RtpError> {
        if data.len() < HEADER_LEN {
            return Err(RtpError::TooShort(data.len()));
        }

        let first_byte = data.get_u8();
        let version = first_byte >> 6;
        let has_padding = first_byte & 0x20 != 0;
        let has_extension = first_byte & 0x10 != 0;
        let csrc_count = (first_byte & 0x0F) as usize;

        if version != RTP_VERSION {
            return Err(RtpError::UnsupportedVersion(version));
        }

        let second_byte = data.get_u8();
        let marker = second_byte & 0x80 != 0;
        let payload_type = second_byte & 0x7F;

        let sequence_number = data.get_u16();
        let timestamp = data.get_u32();
        let ssrc = data.get_u32();

        if data.remaining() < csrc_count * 4 {
            return Err(RtpError::TruncatedCsrc);
        }
        let csrc_list = (0..csrc_count).map(|_| data.get_u32()).collect();

        let extension = if has_extension {
            if data.remaining() < 4 {
                return Err(RtpError::TruncatedExtension);
            }
            let profile = data.get_u16();
            let len = data.get_u16() as usize * 4;
            if data.remaining() < len {
                return Err(RtpError::TruncatedExtension);
            }
            Some(HeaderExtension {
                profile,
                data: data.split_to(len),
            })
        } else {
            None
        };

        let padding = if has_padding {
            let count = data.last().copied().unwrap_or(0) as usize;
            if count == 0 || count > data.len() {
                return Err(RtpError::InvalidPadding(count));
            }
            data.truncate(data.len() - count);
            count as u8
        } else {
            0
        };

        Ok(Self {
            version,
            padding,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc_list,
            extension,
            payload: data,
        })
    }

    /// Linear samples of a G.711 payload, `None` for any other payload type.
    pub fn expand_g711(&self) -> Option<Vec<i16>> {
        codec_for(self.payload_type).map(|codec| codec.expand(&self.payload))
    }
}

/// Cuts linear audio into consecutive G.711 packets of a single stream.
pub struct Packetizer {
    codec: G711Codec,
    ssrc: u32,
    sequence_number: u16,
    timestamp: u32,
    samples_per_packet: usize,
    started: bool,
}

impl Packetizer {
    pub fn new(codec: G711Codec, ssrc: u32, samples_per_packet: usize) -> Self {
        Self {
            codec,
            ssrc,
            sequence_number: 0,
            timestamp: 0,
            samples_per_packet: samples_per_packet.max(1),
            started: false,
        }
    }

    /// Packetize `samples`; the marker bit is set on the first packet of the stream.
    pub fn packetize(&mut self, samples: &[i16]) -> Vec<RtpPacket> {
        let mut packets = Vec::with_capacity(samples.len() / self.samples_per_packet + 1);
        for frame in samples.chunks(self.samples_per_packet) {
            let packet = RtpPacket::new(
                payload_type_for(self.codec),
                self.sequence_number,
                self.timestamp,
                self.ssrc,
            )
            .with_marker(!self.started)
            .with_payload(self.codec.compress(frame));
            packets.push(packet);

            self.started = true;
            self.sequence_number = self.sequence_number.wrapping_add(1);
            self.timestamp = self.timestamp.wrapping_add(frame.len() as u32);
        }
        packets
    }
}

/// Expand every G.711 packet in arrival order, one frame per packet.
/// Packets of other payload types are skipped.
pub fn depacketize(packets: &[RtpPacket]) -> Vec<Vec<i16>> {
    let mut frames = Vec::with_capacity(packets.len());
    let mut expected: Option<u16> = None;
    for packet in packets {
        if let Some(seq) = expected {
            if packet.sequence_number != seq {
                warn!(
                    expected = seq,
                    got = packet.sequence_number,
                    "RTP sequence discontinuity"
                );
            }
        }
        expected = Some(packet.sequence_number.wrapping_add(1));

        match packet.expand_g711() {
            Some(samples) => frames.push(samples),
            None => warn!(
                payload_type = packet.payload_type,
                "skipping non-G.711 RTP packet"
            ),
        }
    }
    frames
}

/// Split a length-prefixed packet stream.
pub fn read_stream(mut data: Bytes) -> Result<Vec<RtpPacket>, RtpError> {
    let mut packets = Vec::new();
    while data.has_remaining() {
        if data.remaining() < 2 {
            return Err(RtpError::TruncatedFrame);
        }
        let len = data.get_u16() as usize;
        if data.remaining() < len {
            return Err(RtpError::TruncatedFrame);
        }
        packets.push(RtpPacket::decode(data.split_to(len))?);
    }
    Ok(packets)
}

pub fn write_stream(packets: &[RtpPacket]) -> Result<Bytes, RtpError> {
    let mut buf = BytesMut::new();
    for packet in packets {
        let bytes = packet.encode()?;
        let len = u16::try_from(bytes.len()).map_err(|_| RtpError::Oversized(bytes.len()))?;
        buf.put_u16(len);
        buf.put_slice(&bytes);
    }
    Ok(buf.freeze())
}
