use thiserror::Error;

use super::Type;
use crate::server::ServerKind;

/// Error raised while building or resolving against the simulated hierarchy
#[derive(Debug, Error)]
pub enum Error {
    #[error("no {rtype} record found for {name}")]
    RecordNotFound { name: String, rtype: Type },
    #[error("no {kind} server found at {address}")]
    InstanceNotFound { address: String, kind: ServerKind },
    #[error("no {0} servers in the topology")]
    NoServers(ServerKind),
    #[error("resolution strategy {0:?} is not supported")]
    UnsupportedStrategy(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not (de)serialize zone: {0}")]
    Serialization(#[from] serde_json::Error),
}
