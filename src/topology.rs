use std::collections::HashSet;

use log::{debug, trace, warn};
use multimap::MultiMap;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::TopologyConfig;
use crate::dns::{Error, ResourceRecord, Type};
use crate::server::{
    tld_of, AuthoritativeServer, NameServer, RootServer, Server, ServerKind, TldServer,
};
use crate::zone::{Lookup, Zone};

/// The three server tiers built from one global zone
///
/// Servers are looked up by address. Nothing changes once
/// [`initialize`](#method.initialize) returns.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    roots: Vec<RootServer>,
    tlds: Vec<TldServer>,
    authoritatives: Vec<AuthoritativeServer>,
}

fn find_server<'a, S: NameServer>(
    tier: &'a [S],
    address: &str,
    kind: ServerKind,
) -> Result<&'a S, Error> {
    tier.iter()
        .find(|server| server.address() == address)
        .ok_or_else(|| Error::InstanceNotFound {
            address: address.to_owned(),
            kind,
        })
}

impl NetworkTopology {
    pub fn initialize(zone: &Zone) -> NetworkTopology {
        NetworkTopology::initialize_with(zone, &TopologyConfig::default())
    }

    pub fn initialize_with(zone: &Zone, config: &TopologyConfig) -> NetworkTopology {
        let mut roots: Vec<RootServer> = zone
            .find_roots(Type::A)
            .into_iter()
            .map(|rr| RootServer::new(rr.clone()))
            .collect();

        let mut tlds: Vec<TldServer> = Vec::new();
        for label in &config.known_tlds {
            for ns in zone.find_tlds(label) {
                if ns.rtype() != Type::NS {
                    continue;
                }
                let identity = match zone.find(Type::A, Lookup::Name(ns.rdata())) {
                    Some(rr) => rr,
                    None => {
                        warn!("no address for TLD server {} of {}", ns.rdata(), ns.name());
                        continue;
                    }
                };
                // one instance per address, even when it serves several TLDs
                match tlds.iter().position(|tld| tld.address() == identity.rdata()) {
                    Some(i) => tlds[i].add_tld(ns.name()),
                    None => {
                        let mut tld = TldServer::new(identity.clone());
                        tld.add_tld(ns.name());
                        tlds.push(tld);
                    }
                }
            }
        }

        let mut authoritatives: Vec<AuthoritativeServer> = zone
            .find_containing(&config.authoritative_marker)
            .into_iter()
            .filter(|rr| rr.rtype() == Type::A)
            .map(|rr| AuthoritativeServer::new(rr.clone()))
            .collect();

        debug!(
            "topology: {} root, {} TLD and {} authoritative servers",
            roots.len(),
            tlds.len(),
            authoritatives.len()
        );

        // NS records keyed by the server they delegate to
        let mut delegations: MultiMap<&str, &ResourceRecord> = MultiMap::new();
        for rr in zone.iter().filter(|rr| rr.rtype() == Type::NS) {
            delegations.insert(rr.rdata(), rr);
        }

        for root in &mut roots {
            for tld in &tlds {
                root.delegate(tld.identity().clone());
                for ns in delegations.get_vec(tld.name()).into_iter().flatten() {
                    if tld.serves(ns.name()) {
                        root.delegate((*ns).clone());
                    }
                }
            }
        }

        let authoritative_names: HashSet<&str> =
            authoritatives.iter().map(|server| server.name()).collect();
        for tld in &mut tlds {
            for server in &authoritatives {
                tld.delegate(server.identity().clone());
            }
            let delegated: Vec<ResourceRecord> = zone
                .iter()
                .filter(|rr| {
                    rr.rtype() == Type::NS
                        && authoritative_names.contains(rr.rdata())
                        && tld.serves(&tld_of(rr.name()))
                })
                .cloned()
                .collect();
            trace!("tld {}: {} delegated domains", tld.name(), delegated.len());
            for rr in delegated {
                tld.delegate(rr);
            }
        }

        for server in &mut authoritatives {
            let mut delegated = Vec::new();
            for ns in delegations.get_vec(server.name()).into_iter().flatten() {
                delegated.push((*ns).clone());
                match zone.find(Type::A, Lookup::Name(ns.name())) {
                    Some(host) => delegated.push(host.clone()),
                    None => warn!("no address for {} served by {}", ns.name(), server.name()),
                }
            }
            trace!("authoritative {}: {} records", server.name(), delegated.len());
            for rr in delegated {
                server.delegate(rr);
            }
        }

        NetworkTopology {
            roots,
            tlds,
            authoritatives,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_tiers(
        roots: Vec<RootServer>,
        tlds: Vec<TldServer>,
        authoritatives: Vec<AuthoritativeServer>,
    ) -> NetworkTopology {
        NetworkTopology {
            roots,
            tlds,
            authoritatives,
        }
    }

    pub fn roots(&self) -> &[RootServer] {
        &self.roots
    }

    pub fn tlds(&self) -> &[TldServer] {
        &self.tlds
    }

    pub fn authoritatives(&self) -> &[AuthoritativeServer] {
        &self.authoritatives
    }

    pub fn root(&self, address: &str) -> Result<&RootServer, Error> {
        find_server(&self.roots, address, ServerKind::Root)
    }

    pub fn tld(&self, address: &str) -> Result<&TldServer, Error> {
        find_server(&self.tlds, address, ServerKind::Tld)
    }

    pub fn authoritative(&self, address: &str) -> Result<&AuthoritativeServer, Error> {
        find_server(&self.authoritatives, address, ServerKind::Authoritative)
    }

    /// Finds the server of tier `kind` listening on `address`
    pub fn get_instance(&self, address: &str, kind: ServerKind) -> Result<Server<'_>, Error> {
        Ok(match kind {
            ServerKind::Root => Server::Root(self.root(address)?),
            ServerKind::Tld => Server::Tld(self.tld(address)?),
            ServerKind::Authoritative => Server::Authoritative(self.authoritative(address)?),
        })
    }

    pub fn get_random_root<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&RootServer, Error> {
        self.roots
            .choose(rng)
            .ok_or(Error::NoServers(ServerKind::Root))
    }

    /// Picks one of the TLD servers whose address appears in `records`
    pub fn get_random_tld<R: Rng + ?Sized>(
        &self,
        records: &[ResourceRecord],
        rng: &mut R,
    ) -> Result<&TldServer, Error> {
        let servers: Vec<&TldServer> = records
            .iter()
            .flat_map(|rr| self.tlds.iter().filter(move |tld| tld.address() == rr.rdata()))
            .collect();
        servers
            .choose(rng)
            .copied()
            .ok_or(Error::NoServers(ServerKind::Tld))
    }
}
