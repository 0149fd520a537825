//! A wire packet: a [`Header`](crate::header::Header) followed by up to
//! `CHUNK_SIZE` bytes of payload, with no checksum and no fragmentation
//! — one file chunk always maps to exactly one packet.

use crate::config::{CHUNK_SIZE, PACKET_SIZE};
use crate::error::{Error, Result};
use crate::header::{Flags, Header, HEADER_SIZE};

/// A decoded packet: header plus a borrowed payload slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(header: Header, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    pub fn control(seq_num: u16, ack_num: u16, flags: Flags) -> Self {
        Self::new(Header::new(seq_num, ack_num, flags), Vec::new())
    }

    pub fn data(seq_num: u16, ack_num: u16, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CHUNK_SIZE {
            return Err(Error::InvalidState);
        }
        Ok(Self::new(Header::new(seq_num, ack_num, Flags::NONE), payload))
    }

    /// Serializes the header and payload into one datagram buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&self.header.encode());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parses a received datagram into header and payload.
    ///
    /// Accepts any length from `HEADER_SIZE` up to `PACKET_SIZE`; DRTP
    /// has no length field of its own, so the payload is simply
    /// whatever follows the header in the datagram as delivered by the
    /// socket.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() > PACKET_SIZE {
            return Err(Error::MalformedHeader);
        }
        let header = Header::decode(buf)?;
        let payload = buf[HEADER_SIZE..].to_vec();
        Ok(Self { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_packet_has_no_payload() {
        let packet = Packet::control(1, 0, Flags::syn());
        assert!(packet.payload.is_empty());
        assert_eq!(packet.encode().len(), HEADER_SIZE);
    }

    #[test]
    fn data_packet_rejects_oversized_payload() {
        let oversized = vec![0u8; CHUNK_SIZE + 1];
        assert!(matches!(Packet::data(0, 0, oversized), Err(Error::InvalidState)));
    }

    #[test]
    fn packet_roundtrip_preserves_payload() {
        let payload = b"hello DRTP".to_vec();
        let packet = Packet::data(5, 2, payload.clone()).unwrap();
        let encoded = packet.encode();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded.header, packet.header);
        assert_eq!(decoded.payload, payload);
    }
}
