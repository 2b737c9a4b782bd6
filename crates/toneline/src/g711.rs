//! ITU-T G.711 companding between 8-bit codes and 16-bit linear samples.

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32635;

/// Upper bound of each A-law segment, in 13-bit magnitude.
const ALAW_SEG_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

pub fn ulaw_to_linear(code: u8) -> i16 {
    let code = !code;
    let exponent = (code & 0x70) >> 4;
    let magnitude = ((((code & 0x0F) as i32) << 3) + ULAW_BIAS) << exponent;
    if code & 0x80 != 0 {
        (ULAW_BIAS - magnitude) as i16
    } else {
        (magnitude - ULAW_BIAS) as i16
    }
}

pub fn linear_to_ulaw(sample: i16) -> u8 {
    let mut pcm = sample as i32;
    let sign = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0x00
    };
    pcm = pcm.min(ULAW_CLIP) + ULAW_BIAS;

    let mut exponent = 7;
    while exponent > 0 && pcm & (0x80 << exponent) == 0 {
        exponent -= 1;
    }
    let mantissa = (pcm >> (exponent + 3)) & 0x0F;
    !((sign | (exponent << 4) | mantissa) as u8)
}

pub fn alaw_to_linear(code: u8) -> i16 {
    // even bits are inverted on the wire
    let code = code ^ 0x55;
    let segment = (code & 0x70) >> 4;
    let mut magnitude = ((code & 0x0F) as i32) << 4;
    match segment {
        0 => magnitude += 8,
        1 => magnitude += 0x108,
        _ => magnitude = (magnitude + 0x108) << (segment - 1),
    }
    if code & 0x80 != 0 {
        magnitude as i16
    } else {
        -magnitude as i16
    }
}

pub fn linear_to_alaw(sample: i16) -> u8 {
    let mut pcm = (sample as i32) >> 3;
    let mask = if pcm >= 0 {
        0xD5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let Some(segment) = ALAW_SEG_END.iter().position(|&end| pcm <= end) else {
        return 0x7F ^ mask;
    };
    let shift = if segment < 2 { 1 } else { segment };
    let code = ((segment as i32) << 4) | ((pcm >> shift) & 0x0F);
    code as u8 ^ mask
}

/// Companding law of a G.711 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum G711Codec {
    Ulaw,
    Alaw,
}

impl G711Codec {
    pub fn compress(self, samples: &[i16]) -> Vec<u8> {
        let encode = match self {
            Self::Ulaw => linear_to_ulaw,
            Self::Alaw => linear_to_alaw,
        };
        samples.iter().map(|&s| encode(s)).collect()
    }

    pub fn expand(self, codes: &[u8]) -> Vec<i16> {
        let decode = match self {
            Self::Ulaw => ulaw_to_linear,
            Self::Alaw => alaw_to_linear,
        };
        codes.iter().map(|&c| decode(c)).collect()
    }
}
