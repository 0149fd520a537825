//! The sender's Go-Back-N send window: a `VecDeque` of outstanding
//! packets waiting for a cumulative ACK.
//!
//! Unlike the windows in protocols with selective ACK, there is no
//! per-slot ack bit and no independent retransmit timer per packet: GBN
//! acknowledges and retransmits the whole window as one unit, so the
//! only state this type needs is the ordered queue of unacked packets
//! and the RTO clock for the oldest one.

use std::collections::VecDeque;
use std::time::Instant;

use crate::packet::Packet;

/// One packet sitting in the send window, waiting to be acknowledged.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub seq_num: u16,
    pub packet: Packet,
}

/// Fixed-capacity (by packet count) queue of unacknowledged packets plus
/// the clock driving retransmission.
#[derive(Debug)]
pub struct SendWindow {
    capacity: usize,
    entries: VecDeque<InFlight>,
    sent_at: Option<Instant>,
}

impl SendWindow {
    pub fn new(capacity: u16) -> Self {
        Self {
            capacity: capacity.max(1) as usize,
            entries: VecDeque::new(),
            sent_at: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pushes a freshly sent packet onto the window. Starts the RTO
    /// clock if the window was previously empty.
    pub fn push(&mut self, seq_num: u16, packet: Packet, now: Instant) {
        if self.entries.is_empty() {
            self.sent_at = Some(now);
        }
        self.entries.push_back(InFlight { seq_num, packet });
    }

    /// Applies a cumulative ACK: drops every entry whose sequence number
    /// is covered by `ack_num` (ack_num is "next expected", so entries
    /// with `seq_num < ack_num`, accounting for wraparound, are
    /// retired). Returns the number of entries dropped.
    ///
    /// Restarts the RTO clock for whatever remains in the window.
    pub fn ack_cumulative(&mut self, ack_num: u16, now: Instant) -> usize {
        let mut dropped = 0;
        while let Some(front) = self.entries.front() {
            if seq_is_acked(front.seq_num, ack_num) {
                self.entries.pop_front();
                dropped += 1;
            } else {
                break;
            }
        }
        self.sent_at = if self.entries.is_empty() { None } else { Some(now) };
        dropped
    }

    /// True once the oldest in-flight packet has waited longer than
    /// `rto`.
    pub fn is_timed_out(&self, now: Instant, rto: std::time::Duration) -> bool {
        match self.sent_at {
            Some(sent_at) => now.duration_since(sent_at) >= rto,
            None => false,
        }
    }

    /// All packets currently in flight, oldest first — used to resend
    /// the entire window on a GBN timeout.
    pub fn iter(&self) -> impl Iterator<Item = &InFlight> {
        self.entries.iter()
    }

    /// Resets the RTO clock to `now`, used after a full-window resend.
    pub fn restart_clock(&mut self, now: Instant) {
        if !self.entries.is_empty() {
            self.sent_at = Some(now);
        }
    }
}

/// True if `seq` lies strictly before `ack_num` in sequence-number
/// space, treating `ack_num` as "next expected" under 16-bit wraparound.
/// Packets more than half the sequence space behind `ack_num` are
/// treated as already acked rather than far in the future. `seq ==
/// ack_num` is the next packet the peer still expects, not yet acked.
fn seq_is_acked(seq: u16, ack_num: u16) -> bool {
    let diff = ack_num.wrapping_sub(seq);
    diff != 0 && diff < 0x8000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Flags;
    use std::time::Duration;

    fn data_packet(seq: u16) -> Packet {
        Packet::data(seq, 0, vec![1, 2, 3]).unwrap()
    }

    #[test]
    fn cumulative_ack_drops_covered_entries_in_order() {
        let mut window = SendWindow::new(4);
        let now = Instant::now();
        window.push(0, data_packet(0), now);
        window.push(1, data_packet(1), now);
        window.push(2, data_packet(2), now);

        let dropped = window.ack_cumulative(2, now);
        assert_eq!(dropped, 2);
        assert_eq!(window.len(), 1);
        assert_eq!(window.iter().next().unwrap().seq_num, 2);
    }

    #[test]
    fn window_reports_full_at_capacity() {
        let mut window = SendWindow::new(2);
        let now = Instant::now();
        window.push(0, data_packet(0), now);
        assert!(!window.is_full());
        window.push(1, data_packet(1), now);
        assert!(window.is_full());
    }

    #[test]
    fn timeout_fires_only_after_rto_elapses() {
        let mut window = SendWindow::new(4);
        let t0 = Instant::now();
        window.push(0, data_packet(0), t0);

        assert!(!window.is_timed_out(t0, Duration::from_millis(500)));

        let later = t0 + Duration::from_millis(600);
        assert!(window.is_timed_out(later, Duration::from_millis(500)));
    }

    #[test]
    fn empty_window_never_times_out() {
        let window = SendWindow::new(4);
        assert!(!window.is_timed_out(Instant::now(), Duration::from_millis(1)));
    }

    #[test]
    fn seq_wraparound_is_handled() {
        assert!(seq_is_acked(u16::MAX, 0));
        assert!(!seq_is_acked(0, u16::MAX));
    }

    #[test]
    fn syn_packet_is_not_a_data_packet_in_window() {
        let packet = Packet::control(0, 0, Flags::syn());
        assert!(packet.payload.is_empty());
    }
}
