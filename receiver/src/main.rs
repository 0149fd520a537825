use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use drtp::config::Config;
use drtp::endpoint::UdpEndpoint;
use drtp::receiver::accept_and_receive;

/// Receives a file from a DRTP sender over UDP with Go-Back-N retransmission.
#[derive(Parser, Debug)]
#[command(name = "receiver", about = "DRTP receiver")]
struct Args {
    /// IPv4 address to bind to.
    #[arg(short, long, default_value = "127.0.0.1", value_parser = parse_ip)]
    ip: Ipv4Addr,

    /// Port to bind to, 1024-65535.
    #[arg(short, long, default_value_t = 8088, value_parser = parse_port)]
    port: u16,

    /// Drop the first non-FIN data packet with this sequence number,
    /// for exercising Go-Back-N retransmission.
    #[arg(short, long, value_parser = parse_positive)]
    discard: Option<u16>,
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

    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::new(args.ip, args.port).with_discard(args.discard);

    let bind_addr = SocketAddrV4::new(config.ip, config.port);
    let mut endpoint = UdpEndpoint::bind(bind_addr).context("failed to bind UDP socket")?;

    log::info!("listening on {bind_addr}");
    let out_dir = PathBuf::from("output");
    let report = accept_and_receive(&mut endpoint, &config, &out_dir).context("transfer failed")?;

    println!(
        "Received {} bytes in {:?}, throughput {}",
        report.bytes_received,
        report.elapsed,
        report.format_throughput()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_port_above_ephemeral_range_edge() {
        assert!(parse_port("70000").is_err());
    }

    #[test]
    fn accepts_default_discard_as_none_when_absent() {
        let args = Args { ip: Ipv4Addr::LOCALHOST, port: 8088, discard: None };
        assert!(args.discard.is_none());
    }
}
