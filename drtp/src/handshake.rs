//! Connection setup and teardown state machines.
//!
//! Three-way handshake (SYN / SYN-ACK / ACK) on connect, two-way
//! teardown (FIN / FIN-ACK) on close. Unlike TCP, neither side retries a
//! handshake or teardown step: any unexpected flag combination or
//! sequence number is a fatal `Error::HandshakeMismatch`, matching the
//! original program's behaviour of raising and exiting rather than
//! retrying.

use std::time::Duration;

use crate::endpoint::{Endpoint, RecvOutcome};
use crate::error::{Error, Result};
use crate::header::{Flags, Header};
use crate::packet::Packet;

/// Connection lifecycle state, mirrored on both sides of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing sent or received yet.
    Idle,
    /// Sender: SYN sent, waiting for SYN-ACK.
    SynSent,
    /// Receiver: SYN received, SYN-ACK sent, waiting for ACK.
    SynReceived,
    /// Handshake complete, data may flow.
    Established,
    /// FIN sent or received, waiting for the other side's half.
    Closing,
    /// Both sides have seen FIN and FIN-ACK.
    Closed,
}

/// Result of a completed handshake: the sequence numbers each side will
/// use as the base for its own data stream.
#[derive(Debug, Clone, Copy)]
pub struct Handshake {
    pub local_seq: u16,
    pub peer_seq: u16,
}

/// Picks a random initial sequence number the way the original program
/// does: a small byte-range value rather than a full 16-bit space, to
/// keep debug output readable.
pub fn random_initial_seq() -> u16 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 256) as u16
}

/// Sender side: send SYN, wait for SYN-ACK, send ACK.
///
/// `timeout` bounds each individual receive; there is no retry budget,
/// so a single timed-out wait is fatal.
pub fn connect(endpoint: &mut dyn Endpoint, local_seq: u16, timeout: Duration) -> Result<Handshake> {
    let syn = Packet::control(local_seq, 0, Flags::syn());
    endpoint.send(&syn.encode())?;
    log::debug!("SYN sent: seq={local_seq}");

    let reply = recv_one(endpoint, timeout)?;
    let header = Header::decode(&reply)?;
    if !(header.flags.syn && header.flags.ack) || header.ack_num != local_seq.wrapping_add(1) {
        return Err(Error::HandshakeMismatch("expected SYN-ACK acking our SYN"));
    }
    let peer_seq = header.seq_num;
    log::debug!("SYN-ACK received: seq={peer_seq}, ack={}", header.ack_num);

    let next_local = header.ack_num;
    let ack = Packet::control(next_local, peer_seq.wrapping_add(1), Flags::ack());
    endpoint.send(&ack.encode())?;
    log::debug!("ACK sent: seq={next_local}, ack={}", peer_seq.wrapping_add(1));

    Ok(Handshake { local_seq: next_local, peer_seq: peer_seq.wrapping_add(1) })
}

/// Receiver side: wait for SYN, send SYN-ACK, wait for ACK.
pub fn accept(endpoint: &mut dyn Endpoint, local_seq: u16, timeout: Duration) -> Result<Handshake> {
    let first = recv_one(endpoint, timeout)?;
    let header = Header::decode(&first)?;
    if !header.flags.syn {
        return Err(Error::HandshakeMismatch("expected SYN"));
    }
    let peer_seq = header.seq_num;
    log::debug!("SYN received: seq={peer_seq}");

    let syn_ack = Packet::control(local_seq, peer_seq.wrapping_add(1), Flags::syn_ack());
    endpoint.send(&syn_ack.encode())?;
    log::debug!("SYN-ACK sent: seq={local_seq}, ack={}", peer_seq.wrapping_add(1));

    let reply = recv_one(endpoint, timeout)?;
    let header = Header::decode(&reply)?;
    if !header.flags.ack || header.ack_num != local_seq.wrapping_add(1) {
        return Err(Error::HandshakeMismatch("expected ACK completing the handshake"));
    }
    log::debug!("ACK received: ack={}", header.ack_num);

    Ok(Handshake {
        local_seq: local_seq.wrapping_add(1),
        peer_seq: header.seq_num,
    })
}

/// Initiator side of teardown: send FIN, wait for FIN-ACK.
pub fn close(endpoint: &mut dyn Endpoint, seq_num: u16, ack_num: u16, timeout: Duration) -> Result<()> {
    let fin = Packet::control(seq_num, ack_num, Flags::fin());
    endpoint.send(&fin.encode())?;
    log::debug!("FIN sent: seq={seq_num}");

    let reply = recv_one(endpoint, timeout)?;
    let header = Header::decode(&reply)?;
    if !(header.flags.fin && header.flags.ack) {
        return Err(Error::HandshakeMismatch("expected FIN-ACK"));
    }
    log::debug!("FIN-ACK received");
    Ok(())
}

/// Responder side of teardown: given an already-received FIN header,
/// send FIN-ACK.
pub fn accept_close(endpoint: &mut dyn Endpoint, fin: &Header, local_seq: u16) -> Result<()> {
    if !fin.flags.fin {
        return Err(Error::HandshakeMismatch("expected FIN"));
    }
    let fin_ack = Packet::control(local_seq, fin.seq_num.wrapping_add(1), Flags::fin_ack());
    endpoint.send(&fin_ack.encode())?;
    log::debug!("FIN-ACK sent");
    Ok(())
}

fn recv_one(endpoint: &mut dyn Endpoint, timeout: Duration) -> Result<Vec<u8>> {
    match endpoint.recv(timeout)? {
        RecvOutcome::Packet(buf) => Ok(buf),
        RecvOutcome::TimedOut => Err(Error::Timeout),
    }
}
