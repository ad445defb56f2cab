//! UTF-8 decoder
//!
//! Accumulates a lead byte and its continuation bytes across consecutive
//! receive calls. The receive state machine owns the decision of which
//! table is active; this type only tracks the bytes.

/// Outcome of feeding one byte to the decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Utf8Step {
    /// A full codepoint is available
    Complete(char),
    /// More continuation bytes are expected
    Pending,
    /// The byte cannot start or continue a sequence
    Invalid,
}

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    buffer: [u8; 4],
    length: usize,
    expected: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.length = 0;
        self.expected = 0;
    }

    /// Length of the sequence introduced by `byte`, if it is a valid lead.
    pub fn sequence_length(byte: u8) -> Option<usize> {
        match byte {
            0x00..=0x7F => Some(1),
            0xC2..=0xDF => Some(2),
            0xE0..=0xEF => Some(3),
            0xF0..=0xF4 => Some(4),
            _ => None,
        }
    }

    /// Begin a new sequence with a lead byte.
    pub fn start(&mut self, byte: u8) -> Utf8Step {
        self.reset();
        match Self::sequence_length(byte) {
            Some(1) => Utf8Step::Complete(char::from(byte)),
            Some(expected) => {
                self.buffer[0] = byte;
                self.length = 1;
                self.expected = expected;
                Utf8Step::Pending
            }
            None => Utf8Step::Invalid,
        }
    }

    /// Add a continuation byte to the pending sequence.
    ///
    /// A complete sequence that does not encode a scalar value (overlong
    /// form, surrogate) decodes to U+FFFD.
    pub fn push(&mut self, byte: u8) -> Utf8Step {
        if self.expected == 0 || byte & 0xC0 != 0x80 {
            self.reset();
            return Utf8Step::Invalid;
        }

        self.buffer[self.length] = byte;
        self.length += 1;

        if self.length < self.expected {
            return Utf8Step::Pending;
        }

        let decoded = std::str::from_utf8(&self.buffer[..self.length])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.reset();
        Utf8Step::Complete(decoded)
    }

    pub fn is_pending(&self) -> bool {
        self.expected != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_completes_immediately() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.start(b'a'), Utf8Step::Complete('a'));
        assert!(!decoder.is_pending());
    }

    #[test]
    fn test_euro_sign() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.start(0xE2), Utf8Step::Pending);
        assert_eq!(decoder.push(0x82), Utf8Step::Pending);
        assert_eq!(decoder.push(0xAC), Utf8Step::Complete('\u{20AC}'));
        assert!(!decoder.is_pending());
    }

    #[test]
    fn test_four_byte_sequence() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.start(0xF0), Utf8Step::Pending);
        assert_eq!(decoder.push(0x9F), Utf8Step::Pending);
        assert_eq!(decoder.push(0x98), Utf8Step::Pending);
        assert_eq!(decoder.push(0x80), Utf8Step::Complete('\u{1F600}'));
    }

    #[test]
    fn test_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.start(0x80), Utf8Step::Invalid);
        assert_eq!(decoder.start(0xFF), Utf8Step::Invalid);

        assert_eq!(decoder.start(0xC3), Utf8Step::Pending);
        assert_eq!(decoder.push(b'a'), Utf8Step::Invalid);
        assert!(!decoder.is_pending());
    }

    #[test]
    fn test_surrogate_decodes_to_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.start(0xED), Utf8Step::Pending);
        assert_eq!(decoder.push(0xA0), Utf8Step::Pending);
        assert_eq!(decoder.push(0x80), Utf8Step::Complete(char::REPLACEMENT_CHARACTER));
    }
}
