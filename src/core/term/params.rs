//! Bounded receive-side accumulators
//!
//! Numeric CSI parameters, OSC/DCS/APC/PM string payloads and the debug
//! trace of the sequence currently being received. None of these grow:
//! excess input is dropped in place.

use std::fmt::Write;

pub const CSI_MAX_PARAMS_COUNT: usize = 16;
/// Digits per parameter, including the terminating NUL
pub const CSI_MAX_PARAM_LENGTH: usize = 6;

pub const CONTROL_STRING_LENGTH: usize = 128;

const TRACE_LENGTH: usize = 64;

/// Decimal CSI parameters, stored as ASCII digits
#[derive(Debug, Clone)]
pub struct CsiParams {
    params: [[u8; CSI_MAX_PARAM_LENGTH]; CSI_MAX_PARAMS_COUNT],
    count: usize,
    last_length: usize,
}

impl Default for CsiParams {
    fn default() -> Self {
        Self {
            params: [[0; CSI_MAX_PARAM_LENGTH]; CSI_MAX_PARAMS_COUNT],
            count: 0,
            last_length: 0,
        }
    }
}

impl CsiParams {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Append an ASCII digit to the current parameter.
    pub fn push_digit(&mut self, digit: u8) {
        debug_assert!(digit.is_ascii_digit());

        if self.last_length == 0 {
            if self.count == CSI_MAX_PARAMS_COUNT {
                return;
            }
            self.count += 1;
        }

        // Keep the trailing NUL
        if self.last_length == CSI_MAX_PARAM_LENGTH - 1 {
            return;
        }

        self.params[self.count - 1][self.last_length] = digit;
        self.last_length += 1;
    }

    /// Handle `;`. An empty slot before the delimiter counts as an explicit 0.
    pub fn delimiter(&mut self) {
        if self.last_length == 0 {
            if self.count < CSI_MAX_PARAMS_COUNT {
                self.count += 1;
            }
            return;
        }

        self.last_length = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Numeric value of parameter `index`; missing parameters read as 0.
    pub fn get(&self, index: usize) -> u16 {
        let Some(digits) = self.params.get(index) else {
            return 0;
        };

        digits
            .iter()
            .take_while(|&&b| b != 0)
            .fold(0u16, |acc, &b| {
                acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
            })
    }

    /// Like [`get`](Self::get) but substitutes `default` for 0.
    pub fn get_or(&self, index: usize, default: u16) -> u16 {
        match self.get(index) {
            0 => default,
            value => value,
        }
    }

    /// All parameters, with at least one (0) when none were given.
    pub fn values(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.count.max(1)).map(move |i| self.get(i))
    }
}

/// Which control string is being accumulated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringKind {
    Osc,
    Dcs,
    Apc,
    Pm,
}

/// Raw payload of an OSC/DCS/APC/PM sequence
#[derive(Debug, Clone)]
pub struct ControlString {
    buffer: [u8; CONTROL_STRING_LENGTH],
    length: usize,
}

impl Default for ControlString {
    fn default() -> Self {
        Self {
            buffer: [0; CONTROL_STRING_LENGTH],
            length: 0,
        }
    }
}

impl ControlString {
    pub fn clear(&mut self) {
        self.length = 0;
    }

    /// Append a byte. Returns `false` once the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.length == CONTROL_STRING_LENGTH {
            return false;
        }
        self.buffer[self.length] = byte;
        self.length += 1;
        self.length < CONTROL_STRING_LENGTH
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.length]
    }
}

/// Printable rendering of the bytes of the current sequence, for logs only
#[derive(Debug, Default)]
pub struct SequenceTrace {
    text: String,
}

impl SequenceTrace {
    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn push(&mut self, byte: u8) {
        if self.text.len() >= TRACE_LENGTH {
            return;
        }
        if byte < 0x20 || (0x7F..=0xA0).contains(&byte) {
            let _ = write!(self.text, "\\x{:02x}", byte);
        } else {
            self.text.push(char::from(byte));
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
