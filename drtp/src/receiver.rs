//! The receiver side of a transfer: handshake, Go-Back-N reception,
//! then teardown, followed by writing the reassembled file to disk.

use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::endpoint::{Endpoint, RecvOutcome};
use crate::error::{Error, Result};
use crate::framer::{self, Reassembler};
use crate::handshake::{self, random_initial_seq};
use crate::packet::Packet;

/// Throughput and byte counters reported once a transfer completes.
#[derive(Debug, Clone, Copy)]
pub struct TransferReport {
    pub bytes_received: u64,
    pub elapsed: std::time::Duration,
}

impl TransferReport {
    /// Throughput in bits per second, `8 * bytes / elapsed_seconds`.
    pub fn bits_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        8.0 * self.bytes_received as f64 / secs
    }

    /// Human readable throughput, matching the original program's
    /// bps/Kbps/Mbps thresholds at powers of 1000.
    pub fn format_throughput(&self) -> String {
        let bps = self.bits_per_second();
        if bps >= 1_000_000.0 {
            format!("{:.2} Mbps", bps / 1_000_000.0)
        } else if bps >= 1_000.0 {
            format!("{:.2} Kbps", bps / 1_000.0)
        } else {
            format!("{bps:.2} bps")
        }
    }
}

/// Accepts one connection on `endpoint`, receives a file and writes it
/// under `out_dir`, then tears the connection down.
///
/// `endpoint` must be freshly bound but not yet connected to a peer;
/// `accept_and_receive` pins it to whichever peer's SYN arrives first.
pub fn accept_and_receive(
    endpoint: &mut dyn Endpoint,
    config: &Config,
    out_dir: &Path,
) -> Result<TransferReport> {
    let local_seq = random_initial_seq();
    let handshake = handshake::accept(endpoint, local_seq, config.receiver_guard_timeout())?;
    log::info!("connection accepted, seq={}", handshake.local_seq);

    let mut expected = handshake.peer_seq;
    let mut reassembler = Reassembler::new();
    let mut bytes_received: u64 = 0;
    let mut discard_used = false;
    let started = Instant::now();

    loop {
        let buf = match endpoint.recv(config.receiver_guard_timeout())? {
            RecvOutcome::Packet(b) => b,
            RecvOutcome::TimedOut => return Err(Error::Timeout),
        };
        let packet = Packet::decode(&buf)?;

        if packet.header.flags.fin {
            handshake::accept_close(endpoint, &packet.header, handshake.local_seq)?;
            break;
        }

        if let Some(discard_seq) = config.discard {
            if !discard_used && packet.header.seq_num == discard_seq {
                discard_used = true;
                log::debug!("discarding packet seq={discard_seq} for test purposes");
                continue;
            }
        }

        let seq_num = packet.header.seq_num;
        // seq_num behind expected (already accepted before): a duplicate, re-ACK it.
        // seq_num ahead of expected: out of order, drop silently, no ACK.
        let is_duplicate = seq_num != expected && expected.wrapping_sub(seq_num) < 0x8000;

        if seq_num == expected {
            let is_sentinel = packet.payload.is_empty();
            if !is_sentinel {
                reassembler.push(&packet.payload)?;
                bytes_received += packet.payload.len() as u64;
            }
            expected = expected.wrapping_add(1);
            log::debug!("DATA accepted: seq={seq_num}, len={}", packet.payload.len());
        } else if is_duplicate {
            log::debug!("DATA duplicate: seq={seq_num}, expected={expected}");
        } else {
            log::debug!("DATA out of order, dropped silently: seq={seq_num}, expected={expected}");
            continue;
        }

        let ack = Packet::control(handshake.local_seq, expected, crate::header::Flags::ack());
        endpoint.send(&ack.encode())?;
    }

    let received = reassembler.finish()?;
    framer::write_output(out_dir, &received.filename, &received.content)?;
    log::info!("wrote {} bytes to {}", received.content.len(), received.filename);

    Ok(TransferReport { bytes_received, elapsed: started.elapsed() })
}
