//! Frozen protocol constants and the immutable configuration record.
//!
//! The original program kept `debug`, `show_packets`, `timeout`,
//! `window_size` and the chunk/name sizes as module-scope mutable
//! globals. Here they are split in two: the wire-format constants below
//! are compile-time frozen (§9 of the spec says the 16-bit wire format is
//! frozen), and the per-run knobs (window size, timeout, discard) live on
//! `Config`, built once by the CLI and passed by reference into the
//! endpoint/sender/receiver constructors.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Total datagram size, header included, that the wire format allows.
pub const PACKET_SIZE: usize = 1000;

/// Size of the fixed DRTP header in bytes (`seq_num` + `ack_num` + `flags`,
/// each a big-endian `u16`).
pub const HEADER_SIZE: usize = 6;

/// Maximum payload bytes per packet (`PACKET_SIZE - HEADER_SIZE`).
pub const CHUNK_SIZE: usize = PACKET_SIZE - HEADER_SIZE;

/// Bytes reserved at the start of the first data payload for the file
/// name, NUL-padded.
pub const MAX_FILENAME_LENGTH: usize = 32;

/// Default retransmission timeout (RTO) for the sender.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default window size in packets.
pub const DEFAULT_WINDOW: u16 = 3;

/// Default port the receiver binds to and the sender connects to.
pub const DEFAULT_PORT: u16 = 8088;

/// Default IPv4 address.
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

/// Immutable, per-run configuration shared by the sender and receiver.
///
/// There is no global mutable state anywhere in this crate: every
/// endpoint is constructed with a `&Config` and reads from it, never
/// writes to it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Peer address (sender: the receiver to connect to; receiver: the
    /// address to bind).
    pub ip: Ipv4Addr,

    /// Peer/bind port.
    pub port: u16,

    /// Go-Back-N window size in packets.
    pub window_cap: u16,

    /// Retransmission timeout. The receiver's read-timeout guard is
    /// `10 * timeout` (see `Config::receiver_guard_timeout`).
    pub timeout: Duration,

    /// Receiver-only testing hook: drop the first non-FIN data packet
    /// whose sequence number equals this value.
    pub discard: Option<u16>,
}

impl Config {
    /// Creates a configuration with the given peer address and the
    /// defaults for everything else.
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            ip,
            port,
            window_cap: DEFAULT_WINDOW,
            timeout: DEFAULT_TIMEOUT,
            discard: None,
        }
    }

    /// Sets the window size.
    pub fn with_window(mut self, window_cap: u16) -> Self {
        self.window_cap = window_cap;
        self
    }

    /// Sets the retransmission timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the receiver's one-shot discard sequence number.
    pub fn with_discard(mut self, discard: Option<u16>) -> Self {
        self.discard = discard;
        self
    }

    /// The receiver's long guard timeout: ten times the RTO, primarily to
    /// survive inter-arrival jitter rather than to drive retransmission.
    pub fn receiver_guard_timeout(&self) -> Duration {
        self.timeout * 10
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_IP, DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = Config::default()
            .with_window(8)
            .with_timeout(Duration::from_millis(100))
            .with_discard(Some(2));

        assert_eq!(cfg.window_cap, 8);
        assert_eq!(cfg.timeout, Duration::from_millis(100));
        assert_eq!(cfg.discard, Some(2));
        assert_eq!(cfg.receiver_guard_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn chunk_size_matches_wire_format() {
        assert_eq!(CHUNK_SIZE, 994);
        assert_eq!(PACKET_SIZE - HEADER_SIZE, CHUNK_SIZE);
    }
}
