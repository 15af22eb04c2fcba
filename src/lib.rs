//! Simulation of DNS delegation through root, TLD and authoritative servers.
//!
//! A flat [`Zone`] of records is carved into three server tiers by
//! [`NetworkTopology`], each server seeing only the records it was delegated.
//! A [`Resolver`] then walks a name down the tiers, either contacting every
//! server itself ([`ResolutionStrategy::Iterative`]) or letting the root
//! chain the query ([`ResolutionStrategy::Recursive`]).
//!
//! ```
//! use dns_hierarchy::{ResolutionStrategy, ResourceRecord, Resolver, Zone};
//!
//! let zone = Zone::from(vec![
//!     ResourceRecord::ns(".", 3600, "a.root-servers.net."),
//!     ResourceRecord::a("a.root-servers.net.", 3600, "198.41.0.4"),
//!     ResourceRecord::ns("org.", 3600, "a0.org.afilias-nst.info."),
//!     ResourceRecord::a("a0.org.afilias-nst.info.", 3600, "199.19.56.1"),
//!     ResourceRecord::ns("klein.org.", 3600, "ns3.auth-server.net."),
//!     ResourceRecord::a("ns3.auth-server.net.", 3600, "10.0.0.3"),
//!     ResourceRecord::a("klein.org.", 3600, "203.0.113.7"),
//! ]);
//!
//! let resolver = Resolver::new(zone);
//! let resolved = resolver.resolve("klein.org.", ResolutionStrategy::Iterative).unwrap();
//! assert_eq!(resolved.address, "203.0.113.7");
//! ```

pub mod config;
pub mod dns;
pub mod resolver;
pub mod server;
pub mod topology;
pub mod zone;

pub use crate::config::TopologyConfig;
pub use crate::dns::{Class, Error, Message, ResourceRecord, Type};
pub use crate::resolver::{Failure, ResolutionStrategy, Resolved, Resolver};
pub use crate::server::{
    AuthoritativeServer, NameServer, RecursiveNameServer, RootServer, Server, ServerKind,
    TldServer,
};
pub use crate::topology::NetworkTopology;
pub use crate::zone::{Lookup, Zone};

/// TTL used for records the simulation makes up itself
pub const DEFAULT_TTL: u32 = 3600;
