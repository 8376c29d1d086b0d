//! capsep - capture worker tooling.
//!
//! Operational companion to the library: lists candidate capture
//! interfaces and drives the relay/dispatch path offline with synthetic
//! frames.

use std::net::Ipv4Addr;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use macaddr::MacAddr6;
use tracing_subscriber::EnvFilter;

use capsep::controller;
use capsep::capture::ReplayFilter;
use capsep::domain::{InterfaceSnapshot, InterfaceTable, Protocol, StreamId};
use capsep::sink::ConsoleSink;
use capsep::transport::{ControlChannel, MemoryChannel};
use capsep::worker::Worker;

#[derive(Parser)]
#[command(name = "capsep")]
#[command(about = "Privilege-separated capture worker tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List network interfaces that can host capture workers
    Interfaces,
    /// Run the relay loop and dispatch path over synthetic frames
    Replay {
        /// Protocol stream to replay
        #[arg(long, value_enum, default_value_t = ProtoArg::Bootp)]
        proto: ProtoArg,
        /// Number of synthetic frames to queue
        #[arg(long, default_value_t = 3)]
        frames: usize,
        /// Peer address filter (address-resolution streams only)
        #[arg(long)]
        peer: Option<Ipv4Addr>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProtoArg {
    Arp,
    Bootp,
}

impl From<ProtoArg> for Protocol {
    fn from(arg: ProtoArg) -> Self {
        match arg {
            ProtoArg::Arp => Protocol::Arp,
            ProtoArg::Bootp => Protocol::Bootp,
        }
    }
}

impl std::fmt::Display for ProtoArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtoArg::Arp => f.write_str("arp"),
            ProtoArg::Bootp => f.write_str("bootp"),
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Interfaces => list_interfaces(),
        Commands::Replay {
            proto,
            frames,
            peer,
        } => replay(proto.into(), frames, peer),
    }
}

fn list_interfaces() -> Result<()> {
    for iface in pnet::datalink::interfaces() {
        let status = if iface.is_up() { "UP" } else { "DOWN" };
        let ips: Vec<String> = iface.ips.iter().map(|ip| ip.to_string()).collect();
        println!(
            "{}: {} [{}]",
            iface.name,
            status,
            if ips.is_empty() {
                "no IP".to_string()
            } else {
                ips.join(", ")
            }
        );
    }
    Ok(())
}

/// Queue synthetic frames on a replay filter, drain them through a worker's
/// relay loop, and dispatch the relayed messages to a console sink.
fn replay(proto: Protocol, frames: usize, peer: Option<Ipv4Addr>) -> Result<()> {
    let iface = InterfaceSnapshot {
        index: 1,
        name: "replay0".to_string(),
        hwaddr: MacAddr6::new(0x02, 0x00, 0x00, 0x00, 0x00, 0x01),
        mtu: 1500,
        up: true,
    };
    let mut table = InterfaceTable::new();
    table.insert(iface.clone());

    let filter = ReplayFilter::new();
    for seq in 0..frames {
        filter.queue_frame(synthetic_frame(proto, seq as u8));
    }

    let id = StreamId::new(iface.index, proto, peer);
    let (worker_end, mut controller_end) = MemoryChannel::pair();
    let mut worker = Worker::new(id, proto, Box::new(filter), Box::new(worker_end));
    worker.on_filter_ready();

    let mut sink = ConsoleSink::new();
    while let Some((header, payload)) = controller_end.recv()? {
        controller::dispatch(&table, &mut sink, &header, &payload)?;
    }

    println!("replayed {} frame(s) on stream {}", sink.frames(), id);
    Ok(())
}

fn synthetic_frame(proto: Protocol, seq: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(60);
    frame.extend_from_slice(&[0xff; 6]);
    frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, seq]);
    frame.extend_from_slice(&proto.ethertype().0.to_be_bytes());
    frame.extend_from_slice(&[seq; 46]);
    frame
}
