//! Serial transport plumbing
//!
//! The terminal owns two rings sized at construction. Replies and key
//! presses are copied into the transmit ring and handed to the
//! [`Uart`](crate::core::host::Uart) collaborator one contiguous run at a
//! time. Received bytes land in the receive ring (written by DMA on
//! hardware, by [`Terminal::push_received`] elsewhere) and are decoded
//! from the tail up to the head the embedding reports.

use crate::config::C1Mode;
use crate::core::host::Host;
use crate::core::terminal::Terminal;

const XON: u8 = 0x11;
const XOFF: u8 = 0x13;

const C1_DCS: u8 = 0x90;
const C1_CSI: u8 = 0x9B;
const C1_ST: u8 = 0x9C;

/// Software flow control state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum XonOff {
    #[default]
    Xon,
    Xoff,
}

/// Fixed-size byte ring. `head` is the next write position.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buffer: Vec<u8>,
    head: usize,
}

impl RingBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0; size.max(1)],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Copy as much of `data` as fits before the end of the ring.
    /// Returns the start offset and length of the written run.
    fn write_run(&mut self, data: &[u8]) -> (usize, usize) {
        let start = self.head;
        let length = data.len().min(self.buffer.len() - start);
        self.buffer[start..start + length].copy_from_slice(&data[..length]);
        self.head = (start + length) % self.buffer.len();
        (start, length)
    }

    fn run(&self, start: usize, length: usize) -> &[u8] {
        &self.buffer[start..start + length]
    }
}

/// Receive side of the transport
#[derive(Debug, Clone)]
pub(crate) struct ReceiveRing {
    ring: RingBuffer,
    tail: usize,
}

impl ReceiveRing {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            ring: RingBuffer::new(size),
            tail: 0,
        }
    }

    fn pending(&self, head: usize) -> usize {
        let size = self.ring.capacity();
        (head % size + size - self.tail) % size
    }
}

impl<H: Host> Terminal<H> {
    /// Send `data` to the host, one contiguous ring run per
    /// [`Uart::transmit`](crate::core::host::Uart::transmit) call. Echoed
    /// locally while SRM is reset.
    pub fn transmit(&mut self, data: &[u8]) {
        let mut rest = data;
        while !rest.is_empty() {
            let (start, length) = self.transmit_ring.write_run(rest);
            let head = self.transmit_ring.head();
            self.host.transmit(self.transmit_ring.run(start, length), head);
            rest = &rest[length..];
        }

        // Echo is bounded by the transmit ring; overflow is dropped
        if !self.modes.send_receive {
            let room = self
                .transmit_ring
                .capacity()
                .saturating_sub(self.local_echo.len());
            self.local_echo.extend(data.iter().copied().take(room));
        }
    }

    /// C1 control `c1` in the current transmit encoding
    fn push_c1(&self, reply: &mut Vec<u8>, c1: u8) {
        match self.modes.transmit_c1 {
            C1Mode::Bit8 => reply.push(c1),
            C1Mode::Bit7 => reply.extend_from_slice(&[0x1B, c1 - 0x40]),
        }
    }

    /// `CSI <body>`
    pub(crate) fn transmit_csi(&mut self, body: &str) {
        let mut reply = Vec::with_capacity(body.len() + 2);
        self.push_c1(&mut reply, C1_CSI);
        reply.extend_from_slice(body.as_bytes());
        self.transmit(&reply);
    }

    /// `DCS <body> ST`
    pub(crate) fn transmit_dcs(&mut self, body: &str) {
        let mut reply = Vec::with_capacity(body.len() + 4);
        self.push_c1(&mut reply, C1_DCS);
        reply.extend_from_slice(body.as_bytes());
        self.push_c1(&mut reply, C1_ST);
        self.transmit(&reply);
    }

    /// Receive ring for DMA writes by the embedding
    pub fn receive_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.receive_ring.ring.buffer
    }

    /// Write position of [`push_received`](Self::push_received)
    pub fn receive_head(&self) -> usize {
        self.receive_ring.ring.head()
    }

    pub fn receive_capacity(&self) -> usize {
        self.receive_ring.ring.capacity()
    }

    /// Append bytes to the receive ring without decoding them. Stops when
    /// the ring is full; returns how many bytes were accepted.
    pub fn push_received(&mut self, data: &[u8]) -> usize {
        let free = self.receive_capacity() - 1 - self.pending(self.receive_head());
        let data = &data[..data.len().min(free)];

        let mut rest = data;
        while !rest.is_empty() {
            let (_, length) = self.receive_ring.ring.write_run(rest);
            rest = &rest[length..];
        }
        data.len()
    }

    /// Bytes written but not yet decoded, given the writer's `head`
    pub fn pending(&self, head: usize) -> usize {
        self.receive_ring.pending(head)
    }

    /// Decode everything from the tail up to `head`, in arrival order.
    pub fn uart_receive(&mut self, head: usize) {
        let size = self.receive_capacity();
        let head = head % size;

        while self.receive_ring.tail != head {
            let byte = self.receive_ring.ring.buffer[self.receive_ring.tail];
            self.receive_ring.tail = (self.receive_ring.tail + 1) % size;
            self.receive_character(byte);
        }
    }

    /// Level-triggered XON/XOFF on the receive fill level
    pub fn flow_control(&mut self, pending: usize) {
        if !self.config.flow_control {
            return;
        }

        let size = self.receive_capacity();
        match self.xon_off_state {
            XonOff::Xon if pending >= size * 3 / 4 => self.xon_off(XonOff::Xoff),
            XonOff::Xoff if pending <= size / 4 => self.xon_off(XonOff::Xon),
            _ => {}
        }
    }

    /// Force the flow control state, sending XON or XOFF.
    pub fn xon_off(&mut self, state: XonOff) {
        tracing::info!("Flow control: {:?}", state);
        self.xon_off_state = state;
        match state {
            XonOff::Xon => self.transmit(&[XON]),
            XonOff::Xoff => self.transmit(&[XOFF]),
        }
    }

    pub fn xon_off_state(&self) -> XonOff {
        self.xon_off_state
    }

    /// Feed locally echoed transmissions back into the decoder.
    pub fn process_local_echo(&mut self) {
        while let Some(byte) = self.local_echo.pop_front() {
            self.receive_character(byte);
        }
    }

    /// Bytes already in the receive ring survive, so a RIS keeps decoding
    /// whatever followed it.
    pub(crate) fn reset_transport(&mut self) {
        self.local_echo.clear();
        self.xon_off_state = XonOff::Xon;
        let length = self.receive_capacity();
        self.host.receive(length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{terminal, terminal_sized, test_config};

    #[test]
    fn test_ring_write_wraps() {
        let mut ring = RingBuffer::new(4);
        assert_eq!(ring.write_run(b"abc"), (0, 3));
        assert_eq!(ring.write_run(b"xyz"), (3, 1));
        assert_eq!(ring.head(), 0);
        assert_eq!(ring.write_run(b"yz"), (0, 2));
        assert_eq!(ring.run(0, 2), b"yz");
    }

    #[test]
    fn test_transmit_splits_at_ring_end() {
        let mut term = terminal_sized(test_config(), 8, 64);
        term.transmit(b"hello");
        term.transmit(b"world");
        let host = term.host();
        assert_eq!(host.transmitted, b"helloworld");
        assert_eq!(host.transmit_calls, vec![(5, 5), (3, 0), (2, 2)]);
    }

    #[test]
    fn test_receive_ring_in_order() {
        let mut term = terminal_sized(test_config(), 64, 8);
        assert_eq!(term.push_received(b"abcde"), 5);
        let head = term.receive_head();
        assert_eq!(term.pending(head), 5);
        term.uart_receive(head);
        assert_eq!(term.pending(head), 0);

        // Wraps around the end of the ring
        assert_eq!(term.push_received(b"fghij"), 5);
        let head = term.receive_head();
        term.uart_receive(head);
        assert_eq!(term.host().grid.row_text(0).trim_end(), "abcdefghij");
    }

    #[test]
    fn test_push_received_stops_when_full() {
        let mut term = terminal_sized(test_config(), 64, 8);
        assert_eq!(term.push_received(b"0123456789"), 7);
        assert_eq!(term.push_received(b"x"), 0);
        let head = term.receive_head();
        term.uart_receive(head);
        assert_eq!(term.push_received(b"x"), 1);
    }

    #[test]
    fn test_reset_keeps_decoding_ring() {
        let mut term = terminal_sized(test_config(), 64, 16);
        term.push_received(b"junk\x1bcok");
        let head = term.receive_head();
        term.uart_receive(head);
        assert_eq!(term.host().resets, 1);
        assert_eq!(term.host().grid.row_text(0).trim_end(), "ok");
        assert_eq!(term.pending(term.receive_head()), 0);
    }

    #[test]
    fn test_dma_style_receive() {
        let mut term = terminal_sized(test_config(), 64, 16);
        term.receive_buffer_mut()[..3].copy_from_slice(b"\x1b[C");
        term.uart_receive(3);
        assert_eq!(term.cursor_position(), (0, 1));
        assert_eq!(term.host().receive_armed, Some(16));
    }

    #[test]
    fn test_flow_control_levels() {
        let mut term = terminal_sized(test_config(), 64, 16);
        term.flow_control(11);
        assert!(term.host().transmitted.is_empty());
        term.flow_control(12);
        assert_eq!(term.host().transmitted, [XOFF]);
        assert_eq!(term.xon_off_state(), XonOff::Xoff);
        term.flow_control(13);
        term.flow_control(5);
        assert_eq!(term.host().transmitted, [XOFF]);
        term.flow_control(4);
        assert_eq!(term.host().transmitted, [XOFF, XON]);
    }

    #[test]
    fn test_flow_control_disabled() {
        let mut config = test_config();
        config.flow_control = false;
        let mut term = terminal_sized(config, 64, 16);
        term.flow_control(16);
        assert!(term.host().transmitted.is_empty());
        term.xon_off(XonOff::Xoff);
        assert_eq!(term.host().transmitted, [XOFF]);
    }

    #[test]
    fn test_local_echo_bounded_by_transmit_ring() {
        let mut term = terminal_sized(test_config(), 8, 64);
        term.receive_string("\x1b[12l");
        term.transmit(b"0123456789");
        term.transmit(b"abc");
        assert_eq!(term.local_echo.len(), 8);
        assert_eq!(term.host().transmitted, b"0123456789abc");

        term.process_local_echo();
        assert_eq!(term.host().grid.row_text(0).trim_end(), "01234567");
        assert!(term.local_echo.is_empty());
    }

    #[test]
    fn test_local_echo_when_srm_reset() {
        let mut term = terminal();
        term.transmit(b"hi");
        term.process_local_echo();
        assert_eq!(term.host().grid.row_text(0).trim_end(), "");

        term.receive_string("\x1b[12l");
        term.transmit(b"hi");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "");
        term.process_local_echo();
        assert_eq!(term.host().grid.row_text(0).trim_end(), "hi");
    }
}
