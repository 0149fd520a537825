use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use drtp::config::Config;
use drtp::endpoint::{Endpoint, UdpEndpoint};
use drtp::sender::send_file;

/// Sends a file to a DRTP receiver over UDP with Go-Back-N retransmission.
#[derive(Parser, Debug)]
#[command(name = "sender", about = "DRTP sender")]
struct Args {
    /// IPv4 address of the receiver.
    #[arg(short, long, default_value = "127.0.0.1", value_parser = parse_ip)]
    ip: Ipv4Addr,

    /// Receiver port, 1024-65535.
    #[arg(short, long, default_value_t = 8088, value_parser = parse_port)]
    port: u16,

    /// File to send.
    #[arg(short, long)]
    file: PathBuf,

    /// Go-Back-N window size in packets.
    #[arg(short, long, default_value_t = 3, value_parser = parse_positive)]
    window: u16,
}

fn parse_ip(s: &str) -> Result<Ipv4Addr, String> {
    s.parse().map_err(|_| format!("{s} is not a valid IPv4 address"))
}

fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s.parse().map_err(|_| format!("{s} is not a valid port number"))?;
    if !(1024..=65535).contains(&port) {
        return Err(format!("{port} is not a valid port number in the range 1024-65535"));
    }
    Ok(port)
}

fn parse_positive(s: &str) -> Result<u16, String> {
    let value: u16 = s.parse().map_err(|_| format!("{s} is not a positive integer"))?;
    if value == 0 {
        return Err(format!("{value} is not a positive integer"));
    }
    Ok(value)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.file.is_file() {
        eprintln!("Error: {} does not exist", args.file.display());
        std::process::exit(1);
    }

    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::new(args.ip, args.port)
        .with_window(args.window)
        .with_timeout(Duration::from_millis(500));

    let peer = SocketAddrV4::new(config.ip, config.port);
    let mut endpoint = UdpEndpoint::connect(peer).context("failed to open UDP socket")?;

    log::info!("connecting to {peer}");
    let stats = send_file(&mut endpoint, &config, &args.file).context("transfer failed")?;
    endpoint.close();

    println!(
        "Sent {} bytes in {} packets ({} retransmissions)",
        stats.bytes_sent, stats.packets_sent, stats.retransmissions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_port_below_privileged_range() {
        assert!(parse_port("1023").is_err());
    }

    #[test]
    fn accepts_port_within_range() {
        assert_eq!(parse_port("8088").unwrap(), 8088);
    }

    #[test]
    fn rejects_zero_window() {
        assert!(parse_positive("0").is_err());
    }
}
