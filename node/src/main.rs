#[macro_use]
extern crate log;
extern crate bully;
extern crate bully_modules;
extern crate chrono;
extern crate env_logger;

use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::prelude::{DateTime, Local};
use clap::Parser as _;

use bully::{Group, Message, ProcessConfiguration, ProcessTimings, RandomVoteSource};
use bully_modules::{FixedElectionTimer, UdpMulticastTransport, DEFAULT_GROUP_ADDR, DEFAULT_PORT};

/// Runs one member of a Bully group over UDP multicast.
#[derive(clap::Parser, Debug)]
#[command(about = "Runs one member of a Bully group.", version)]
struct Args {
    /// Process id. Discovered from the running group when omitted.
    #[arg(long)]
    id: Option<u64>,
    /// Configured group members are 1..=group-size.
    #[arg(long, default_value_t = 10)]
    group_size: u64,
    /// Heartbeat period.
    #[arg(long, default_value_t = 1000)]
    heartbeat_ms: u64,
    /// Assumed maximum network delay.
    #[arg(long, default_value_t = 2000)]
    delay_ms: u64,
    /// How long a candidate waits for an ANSWER.
    #[arg(long, default_value_t = 5000)]
    election_timeout_ms: u64,
    /// Multicast group address.
    #[arg(long, default_value_t = DEFAULT_GROUP_ADDR)]
    group_addr: Ipv4Addr,
    /// Multicast port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn init_logger() {
    env_logger::builder()
        .format(|buf, record| {
            let now: DateTime<Local> = Local::now();
            writeln!(
                buf,
                "{:5}: {} - {}",
                record.level(),
                now.format("%H:%M:%S.%3f"),
                record.args()
            )
        })
        .init();
}

fn main() {
    init_logger();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("Node failed: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> bully::Result<()> {
    let transport = UdpMulticastTransport::new(args.group_addr, args.port)?;

    let timings = ProcessTimings {
        heartbeat_interval: Duration::from_millis(args.heartbeat_ms),
        max_network_delay: Duration::from_millis(args.delay_ms),
        ..ProcessTimings::default()
    };

    let process_id = match args.id {
        Some(process_id) => process_id,
        None => bully::discover_process_id(&transport, timings.discovery_window),
    };

    // the group is 1..=group_size on every member
    if process_id == 0 || process_id > args.group_size {
        return bully::new_err(
            format!("Process id {} is outside the group", process_id),
            format!("members are 1..={}", args.group_size),
        );
    }

    let group = Group::new((1..=args.group_size).collect());

    let config = ProcessConfiguration {
        process_id,
        group,
        transport: transport.clone(),
        election_timer: FixedElectionTimer::new(args.election_timeout_ms),
        vote_source: RandomVoteSource,
        timings,
    };

    let (_coordinator, worker) = bully::start_process(config)?;
    bully::broadcast_message(
        &transport,
        process_id,
        Message::Test {
            note: format!("Node {} online", process_id),
        },
    );

    info!("Node {} is running", process_id);
    worker.join();

    Ok(())
}
