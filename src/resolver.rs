use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use rand::{thread_rng, Rng};
use thiserror::Error;

use crate::config::TopologyConfig;
use crate::dns::{Error, Message, ResponseCode};
use crate::server::{NameServer, RecursiveNameServer};
use crate::topology::NetworkTopology;
use crate::zone::Zone;

/// How a name is walked down the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// The resolver contacts every tier itself
    Iterative,
    /// The root server chains the query through the lower tiers
    Recursive,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ResolutionStrategy::Iterative => "iterative",
            ResolutionStrategy::Recursive => "recursive",
        })
    }
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iterative" => Ok(ResolutionStrategy::Iterative),
            "recursive" => Ok(ResolutionStrategy::Recursive),
            _ => Err(Error::UnsupportedStrategy(s.to_owned())),
        }
    }
}

impl TryFrom<u8> for ResolutionStrategy {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ResolutionStrategy::Iterative),
            2 => Ok(ResolutionStrategy::Recursive),
            _ => Err(Error::UnsupportedStrategy(code.to_string())),
        }
    }
}

/// A successfully resolved name
#[derive(Debug, Clone)]
pub struct Resolved {
    pub address: String,
    pub message: Message,
}

/// A resolution that stopped at some hop
///
/// `message` holds whatever the hops before the failure added, with its
/// response code set to `NameError` for missing records and
/// `ServerFailure` otherwise.
#[derive(Debug, Error)]
#[error("unable to find the ip address for {qname}")]
pub struct Failure {
    pub qname: String,
    #[source]
    pub cause: Error,
    pub message: Message,
}

/// Resolves names against a topology built from a global zone
#[derive(Debug, Clone)]
pub struct Resolver {
    zone: Zone,
    topology: NetworkTopology,
}

impl Resolver {
    pub fn new(zone: Zone) -> Resolver {
        Resolver::with_config(zone, &TopologyConfig::default())
    }

    pub fn with_config(zone: Zone, config: &TopologyConfig) -> Resolver {
        let topology = NetworkTopology::initialize_with(&zone, config);
        Resolver { zone, topology }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(zone: Zone, topology: NetworkTopology) -> Resolver {
        Resolver { zone, topology }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn resolve(&self, name: &str, strategy: ResolutionStrategy) -> Result<Resolved, Failure> {
        self.resolve_with_rng(name, strategy, &mut thread_rng())
    }

    /// Resolves `name`, drawing every random choice from `rng`
    pub fn resolve_with_rng<R: Rng + ?Sized>(
        &self,
        name: &str,
        strategy: ResolutionStrategy,
        rng: &mut R,
    ) -> Result<Resolved, Failure> {
        let mut message = Message::new(name, rng);
        debug!("{} resolution of {} (id {})", strategy, name, message.header.id);

        let result = match strategy {
            ResolutionStrategy::Iterative => self.iterative(&mut message, rng),
            ResolutionStrategy::Recursive => self.recursive(&mut message, rng),
        };

        match result {
            Ok(address) => {
                info!("{} resolved to {}", name, address);
                debug!("{}", message);
                Ok(Resolved { address, message })
            }
            Err(cause) => {
                warn!("unable to find the ip address for {}: {}", name, cause);
                message.header.response_code = match cause {
                    Error::RecordNotFound { .. } => ResponseCode::NameError,
                    _ => ResponseCode::ServerFailure,
                };
                Err(Failure {
                    qname: name.to_owned(),
                    cause,
                    message,
                })
            }
        }
    }

    fn iterative<R: Rng + ?Sized>(&self, message: &mut Message, rng: &mut R) -> Result<String, Error> {
        let root = self.topology.get_random_root(rng)?;
        debug!("contacting root server {}", root.name());
        root.resolve(message, rng)?;

        let tld = self.topology.tld(&final_answer(message)?)?;
        debug!("contacting TLD server {}", tld.name());
        message.header.query = true;
        tld.resolve(message, rng)?;

        let server = self.topology.authoritative(&final_answer(message)?)?;
        debug!("contacting authoritative server {}", server.name());
        message.header.query = true;
        server.resolve(message, rng)?;

        final_answer(message)
    }

    fn recursive<R: Rng + ?Sized>(&self, message: &mut Message, rng: &mut R) -> Result<String, Error> {
        message.header.recursion_desired = true;
        message.header.recursion_available = true;

        let root = self.topology.get_random_root(rng)?;
        debug!("contacting root server {}", root.name());
        root.recursive_resolve(message, &self.topology, rng)?;

        final_answer(message)
    }
}

fn final_answer(message: &Message) -> Result<String, Error> {
    match message.last_answer() {
        Some(rr) => Ok(rr.rdata().to_owned()),
        None => Err(Error::RecordNotFound {
            name: message.qname().to_owned(),
            rtype: message.question.qtype,
        }),
    }
}
