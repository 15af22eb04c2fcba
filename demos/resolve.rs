//! Resolves names against a saved zone, or a small built-in one.
//!
//! cargo run --example resolve -- [--zone root_zone.json] [--strategy recursive] klein.org.

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use dns_hierarchy::{ResolutionStrategy, ResourceRecord, Resolver, Zone, DEFAULT_TTL};

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve names through a simulated DNS hierarchy")]
struct Cli {
    /// Zone file saved with `Zone::save_state`
    #[arg(short = 'z', long, value_name = "FILE")]
    zone: Option<PathBuf>,

    /// iterative or recursive
    #[arg(short = 's', long, default_value = "iterative", value_parser = ResolutionStrategy::from_str)]
    strategy: ResolutionStrategy,

    /// Names to resolve
    #[arg(default_value = "klein.org.")]
    names: Vec<String>,
}

fn sample_zone() -> Zone {
    Zone::from(vec![
        ResourceRecord::ns(".", DEFAULT_TTL, "a.root-servers.net."),
        ResourceRecord::a("a.root-servers.net.", DEFAULT_TTL, "198.41.0.4"),
        ResourceRecord::ns("org.", DEFAULT_TTL, "a0.org.afilias-nst.info."),
        ResourceRecord::a("a0.org.afilias-nst.info.", DEFAULT_TTL, "199.19.56.1"),
        ResourceRecord::ns("klein.org.", DEFAULT_TTL, "ns3.auth-server.net."),
        ResourceRecord::a("ns3.auth-server.net.", DEFAULT_TTL, "10.0.0.3"),
        ResourceRecord::a("klein.org.", DEFAULT_TTL, "203.0.113.7"),
    ])
}

pub fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("dns_hierarchy=debug");
    builder.init();

    let cli = Cli::parse();

    let zone = match cli.zone {
        Some(ref path) => match Zone::load_state(path) {
            Ok(zone) => zone,
            Err(err) => {
                eprintln!("could not load zone from {}: {}", path.display(), err);
                process::exit(1);
            }
        },
        None => sample_zone(),
    };

    let resolver = Resolver::new(zone);
    println!("known domains: {}", resolver.zone().domains().join(", "));

    let mut failed = false;
    for name in &cli.names {
        match resolver.resolve(name, cli.strategy) {
            Ok(resolved) => {
                println!("{}", resolved.message);
                println!("{} resolved to {}", name, resolved.address);
            }
            Err(failure) => {
                println!("{}", failure.message);
                eprintln!("{}: {}", failure, failure.cause);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(2);
    }
}
