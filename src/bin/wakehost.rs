use wakehost::arp;
use wakehost::command::canned::CannedSource;
use wakehost::command::process::ProcessSource;
use wakehost::command::TextCommandSource;
use wakehost::devinfo;
use wakehost::host;
use wakehost::mac;
use wakehost::ping;
use wakehost::wol;

use clap::{Parser, Subcommand};
use log::info;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Give up on ping, arp and dig after this many milliseconds. Waits forever if unset.
    #[arg(long, env = "WAKEHOST_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// If true, print the commands that would run instead of running them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a host answers a single ping.
    Ping { ip: String },

    /// Look up a host's MAC address in the neighbor table.
    Mac { ip: String },

    /// Ask a host for its device model over mDNS.
    Info {
        /// mDNS instance name, e.g. "studio" for studio.local.
        host: String,

        /// Address to query. Queries the multicast group if empty.
        #[arg(long, default_value = "")]
        ip: String,
    },

    /// Ping a host, look up its MAC address and optionally its model.
    Survey {
        host: String,

        /// Also query the device model.
        #[arg(long)]
        device_info: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Send a Wake-on-LAN magic packet.
    Wake {
        /// MAC address, in xx:xx:xx:xx:xx:xx form. Leading zeros may be omitted.
        mac: String,

        /// Address the magic packet is sent to.
        #[arg(long, env = "WAKEHOST_BROADCAST", default_value = "255.255.255.255")]
        broadcast: Ipv4Addr,

        /// UDP port the magic packet is sent to.
        #[arg(long, env = "WAKEHOST_PORT", default_value_t = wol::DEFAULT_PORT)]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("INFO"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .init();

    let canned = CannedSource::empty();
    let process = match args.timeout_ms {
        Some(ms) => ProcessSource::with_timeout(Duration::from_millis(ms)),
        None => ProcessSource::new(),
    };
    let source: &dyn TextCommandSource = if args.dry_run { &canned } else { &process };

    match args.command {
        Command::Ping { ip } => {
            let reachable = ping::is_reachable(source, &ip)?;
            println!(
                "{} is {}",
                ip,
                if reachable { "reachable" } else { "unreachable" }
            );
        }
        Command::Mac { ip } => {
            let mac = arp::resolve(source, &ip)?;
            println!("{}", arp::describe(&mac));
        }
        Command::Info { host, ip } => {
            let model = devinfo::resolve(source, &host, &ip)?;
            println!("{}", devinfo::describe(&model));
        }
        Command::Survey {
            host: target,
            device_info,
            json,
        } => {
            let report = host::survey(source, &target, device_info)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::Wake {
            mac: mac_text,
            broadcast,
            port,
        } => {
            // arp drops leading zeros, so accept its output as-is.
            let mac_address: mac::HardwareAddress = mac::normalize(&mac_text).parse()?;
            let config = wol::WolConfig {
                broadcast_address: broadcast,
                port,
                ..wol::WolConfig::default()
            };
            if args.dry_run {
                println!(
                    "would send magic packet for {} to {}",
                    mac_address,
                    config.destination()
                );
            } else {
                info!("Waking {}...", mac_address);
                wol::wake_with(&config, mac_address)?;
                println!("magic packet sent to {}", mac_address);
            }
        }
    }

    if args.dry_run {
        for call in canned.calls() {
            println!("would run: {}", call);
        }
    }
    Ok(())
}
