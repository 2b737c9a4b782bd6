use phf::phf_map;

/// Row and column frequencies of every keypad symbol.
static KEYPAD: phf::Map<char, (f32, f32)> = phf_map! {
    '1' => (697.0, 1209.0),
    '2' => (697.0, 1336.0),
    '3' => (697.0, 1477.0),
    'A' => (697.0, 1633.0),
    '4' => (770.0, 1209.0),
    '5' => (770.0, 1336.0),
    '6' => (770.0, 1477.0),
    'B' => (770.0, 1633.0),
    '7' => (852.0, 1209.0),
    '8' => (852.0, 1336.0),
    '9' => (852.0, 1477.0),
    'C' => (852.0, 1633.0),
    '*' => (941.0, 1209.0),
    '0' => (941.0, 1336.0),
    '#' => (941.0, 1477.0),
    'D' => (941.0, 1633.0),
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("unknown DTMF key {key:?} at byte {pos}")]
    UnknownKey { key: char, pos: usize },

    #[error("invalid tone level: {0}")]
    InvalidLevel(f32),
}

/// Look up the (row, column) frequencies for a key. Letters are case-insensitive.
pub fn key_freqs(key: char) -> Option<(f32, f32)> {
    KEYPAD.get(&key.to_ascii_uppercase()).copied()
}
