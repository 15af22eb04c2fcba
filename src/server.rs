//! The three server tiers of the hierarchy.
//!
//! Each server is an identity record (its own name and address) plus a
//! private zone holding only the records it was delegated. The zones are
//! filled by [`NetworkTopology`](../topology/struct.NetworkTopology.html)
//! and never change afterwards.

use std::fmt;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dns::{Error, Message, ResourceRecord, Type};
use crate::topology::NetworkTopology;
use crate::zone::{Lookup, Zone};

/// The tier a server belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerKind {
    Root,
    Tld,
    Authoritative,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ServerKind::Root => "root",
            ServerKind::Tld => "tld",
            ServerKind::Authoritative => "authoritative",
        })
    }
}

/// Last label of `name` with a trailing dot: `klein.org.` -> `org.`
pub fn tld_of(name: &str) -> String {
    let label = name.trim_end_matches('.').rsplit('.').next().unwrap_or("");
    format!("{}.", label)
}

/// Capability shared by every tier: answer one hop from the local zone
pub trait NameServer {
    fn kind(&self) -> ServerKind;
    fn identity(&self) -> &ResourceRecord;
    fn zone(&self) -> &Zone;

    /// Performs a single, non-chaining hop
    fn resolve<R: Rng + ?Sized>(&self, message: &mut Message, rng: &mut R) -> Result<(), Error>;

    fn name(&self) -> &str {
        self.identity().name()
    }

    fn address(&self) -> &str {
        self.identity().rdata()
    }
}

/// Servers that can forward a query to the next tier themselves
pub trait RecursiveNameServer: NameServer {
    /// Performs this server's hop, then hands the message to the next tier
    /// and returns once the whole chain has answered
    fn recursive_resolve<R: Rng + ?Sized>(
        &self,
        message: &mut Message,
        topology: &NetworkTopology,
        rng: &mut R,
    ) -> Result<(), Error>;
}

fn forward_address(message: &Message) -> Result<String, Error> {
    message
        .last_answer()
        .map(|rr| rr.rdata().to_owned())
        .ok_or_else(|| Error::RecordNotFound {
            name: message.qname().to_owned(),
            rtype: Type::A,
        })
}

#[derive(Debug, Clone)]
pub struct RootServer {
    identity: ResourceRecord,
    zone: Zone,
}

impl RootServer {
    pub fn new(identity: ResourceRecord) -> RootServer {
        RootServer {
            identity,
            zone: Zone::new(),
        }
    }

    pub(crate) fn delegate(&mut self, rr: ResourceRecord) {
        self.zone.add_record(rr);
    }

    /// Picks the address record of one TLD server delegated for the last
    /// label of `qname`
    ///
    /// With several delegations the choice is uniform among those whose
    /// server address is known. The others are skipped.
    pub fn find_tld<R: Rng + ?Sized>(&self, qname: &str, rng: &mut R) -> Result<&ResourceRecord, Error> {
        let tld = tld_of(qname);
        let candidates: Vec<&ResourceRecord> = self
            .zone
            .iter()
            .filter(|rr| rr.rtype() == Type::NS && rr.name() == tld)
            .filter_map(|ns| self.zone.find(Type::A, Lookup::Name(ns.rdata())))
            .collect();

        debug!(
            "root {}: found {} ({}) TLD servers for {}",
            self.name(),
            candidates.len(),
            tld,
            qname
        );

        candidates
            .choose(rng)
            .copied()
            .ok_or(Error::RecordNotFound { name: tld, rtype: Type::NS })
    }
}

impl NameServer for RootServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Root
    }

    fn identity(&self) -> &ResourceRecord {
        &self.identity
    }

    fn zone(&self) -> &Zone {
        &self.zone
    }

    fn resolve<R: Rng + ?Sized>(&self, message: &mut Message, rng: &mut R) -> Result<(), Error> {
        debug!(
            "root {} ({}): looking for a TLD server for {}",
            self.name(),
            self.address(),
            message.qname()
        );
        let answer = self.find_tld(message.qname(), rng)?.clone();

        message.header.query = false;
        message.add_answer(answer);
        Ok(())
    }
}

impl RecursiveNameServer for RootServer {
    fn recursive_resolve<R: Rng + ?Sized>(
        &self,
        message: &mut Message,
        topology: &NetworkTopology,
        rng: &mut R,
    ) -> Result<(), Error> {
        self.resolve(message, rng)?;

        let tld = topology.tld(&forward_address(message)?)?;
        debug!("root {}: forwarding to TLD server {}", self.name(), tld.name());
        message.header.query = true;
        tld.recursive_resolve(message, topology, rng)
    }
}

#[derive(Debug, Clone)]
pub struct TldServer {
    identity: ResourceRecord,
    zone: Zone,
    tlds: Vec<String>,
}

impl TldServer {
    pub fn new(identity: ResourceRecord) -> TldServer {
        TldServer {
            identity,
            zone: Zone::new(),
            tlds: Vec::new(),
        }
    }

    /// Labels (with trailing dot) this server is delegated for
    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    pub fn serves(&self, tld: &str) -> bool {
        self.tlds.iter().any(|t| t == tld)
    }

    pub(crate) fn add_tld(&mut self, tld: &str) {
        if !self.serves(tld) {
            self.tlds.push(tld.to_owned());
        }
    }

    pub(crate) fn delegate(&mut self, rr: ResourceRecord) {
        self.zone.add_record(rr);
    }
}

impl NameServer for TldServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Tld
    }

    fn identity(&self) -> &ResourceRecord {
        &self.identity
    }

    fn zone(&self) -> &Zone {
        &self.zone
    }

    fn resolve<R: Rng + ?Sized>(&self, message: &mut Message, _rng: &mut R) -> Result<(), Error> {
        debug!(
            "tld {} ({}): looking for an authoritative server for {}",
            self.name(),
            self.address(),
            message.qname()
        );
        let ns = self.zone.lookup(Type::NS, Lookup::Name(message.qname()))?;
        let answer = self.zone.lookup(Type::A, Lookup::Name(ns.rdata()))?.clone();

        message.header.query = false;
        message.add_answer(answer);
        Ok(())
    }
}

impl RecursiveNameServer for TldServer {
    fn recursive_resolve<R: Rng + ?Sized>(
        &self,
        message: &mut Message,
        topology: &NetworkTopology,
        rng: &mut R,
    ) -> Result<(), Error> {
        self.resolve(message, rng)?;

        let server = topology.authoritative(&forward_address(message)?)?;
        debug!(
            "tld {}: forwarding to authoritative server {}",
            self.name(),
            server.name()
        );
        message.header.query = true;
        server.resolve(message, rng)
    }
}

#[derive(Debug, Clone)]
pub struct AuthoritativeServer {
    identity: ResourceRecord,
    zone: Zone,
}

impl AuthoritativeServer {
    pub fn new(identity: ResourceRecord) -> AuthoritativeServer {
        AuthoritativeServer {
            identity,
            zone: Zone::new(),
        }
    }

    pub(crate) fn delegate(&mut self, rr: ResourceRecord) {
        self.zone.add_record(rr);
    }
}

impl NameServer for AuthoritativeServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Authoritative
    }

    fn identity(&self) -> &ResourceRecord {
        &self.identity
    }

    fn zone(&self) -> &Zone {
        &self.zone
    }

    fn resolve<R: Rng + ?Sized>(&self, message: &mut Message, _rng: &mut R) -> Result<(), Error> {
        debug!(
            "authoritative {} ({}): resolving {}",
            self.name(),
            self.address(),
            message.qname()
        );
        let answer = self
            .zone
            .lookup(Type::A, Lookup::Name(message.qname()))?
            .clone();

        message.header.query = false;
        message.header.authoritative = true;
        message.add_nameserver(self.identity.clone());
        message.add_answer(answer);
        Ok(())
    }
}

/// A borrowed server of any tier
#[derive(Debug, Clone, Copy)]
pub enum Server<'a> {
    Root(&'a RootServer),
    Tld(&'a TldServer),
    Authoritative(&'a AuthoritativeServer),
}

impl<'a> Server<'a> {
    pub fn kind(&self) -> ServerKind {
        match *self {
            Server::Root(s) => s.kind(),
            Server::Tld(s) => s.kind(),
            Server::Authoritative(s) => s.kind(),
        }
    }

    pub fn identity(&self) -> &'a ResourceRecord {
        match *self {
            Server::Root(s) => &s.identity,
            Server::Tld(s) => &s.identity,
            Server::Authoritative(s) => &s.identity,
        }
    }

    pub fn zone(&self) -> &'a Zone {
        match *self {
            Server::Root(s) => &s.zone,
            Server::Tld(s) => &s.zone,
            Server::Authoritative(s) => &s.zone,
        }
    }

    pub fn resolve<R: Rng + ?Sized>(&self, message: &mut Message, rng: &mut R) -> Result<(), Error> {
        match *self {
            Server::Root(s) => s.resolve(message, rng),
            Server::Tld(s) => s.resolve(message, rng),
            Server::Authoritative(s) => s.resolve(message, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn query(qname: &str) -> Message {
        Message::new(qname, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn tld_of_takes_last_label() {
        assert_eq!(tld_of("klein.org."), "org.");
        assert_eq!(tld_of("klein.org"), "org.");
        assert_eq!(tld_of("org."), "org.");
        assert_eq!(tld_of("."), ".");
    }

    #[test]
    fn kind_names() {
        assert_eq!(ServerKind::Root.to_string(), "root");
        assert_eq!(ServerKind::Tld.to_string(), "tld");
        assert_eq!(ServerKind::Authoritative.to_string(), "authoritative");
    }

    #[test]
    fn root_answers_with_tld_address() {
        let mut root = RootServer::new(ResourceRecord::a("a.root-servers.net.", 3600, "198.41.0.4"));
        root.delegate(ResourceRecord::a("a0.org.afilias-nst.info.", 3600, "199.19.56.1"));
        root.delegate(ResourceRecord::ns("org.", 3600, "a0.org.afilias-nst.info."));

        let mut msg = query("klein.org.");
        root.resolve(&mut msg, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(!msg.header.query);
        assert!(!msg.header.authoritative);
        assert_eq!(msg.header.answers, 1);
        assert_eq!(msg.last_answer().unwrap().rdata(), "199.19.56.1");
    }

    #[test]
    fn root_skips_unresolvable_delegations() {
        let mut root = RootServer::new(ResourceRecord::a("a.root-servers.net.", 3600, "198.41.0.4"));
        root.delegate(ResourceRecord::ns("org.", 3600, "ghost.example."));
        root.delegate(ResourceRecord::a("b0.org.afilias-nst.org.", 3600, "199.19.54.1"));
        root.delegate(ResourceRecord::ns("org.", 3600, "b0.org.afilias-nst.org."));

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let rr = root.find_tld("klein.org.", &mut rng).unwrap();
            assert_eq!(rr.rdata(), "199.19.54.1");
        }
    }

    #[test]
    fn root_without_delegation_fails() {
        let root = RootServer::new(ResourceRecord::a("a.root-servers.net.", 3600, "198.41.0.4"));
        let mut msg = query("klein.xyz.");
        match root.resolve(&mut msg, &mut StdRng::seed_from_u64(0)) {
            Err(Error::RecordNotFound { name, rtype }) => {
                assert_eq!(name, "xyz.");
                assert_eq!(rtype, Type::NS);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(msg.answers.is_empty());
        assert_eq!(msg.header.answers, 0);
    }

    #[test]
    fn tld_answers_with_authoritative_address() {
        let mut tld = TldServer::new(ResourceRecord::a("a0.org.afilias-nst.info.", 3600, "199.19.56.1"));
        tld.add_tld("org.");
        tld.add_tld("org.");
        tld.delegate(ResourceRecord::a("ns3.auth-server.net.", 3600, "10.0.0.3"));
        tld.delegate(ResourceRecord::ns("klein.org.", 3600, "ns3.auth-server.net."));
        assert_eq!(tld.tlds(), &["org.".to_owned()]);

        let mut msg = query("klein.org.");
        tld.resolve(&mut msg, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(msg.last_answer().unwrap().rdata(), "10.0.0.3");

        let mut msg = query("other.org.");
        assert!(tld.resolve(&mut msg, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn authoritative_answer_is_flagged_and_signed() {
        let identity = ResourceRecord::a("ns3.auth-server.net.", 3600, "10.0.0.3");
        let mut auth = AuthoritativeServer::new(identity.clone());
        auth.delegate(ResourceRecord::ns("klein.org.", 3600, "ns3.auth-server.net."));
        auth.delegate(ResourceRecord::a("klein.org.", 3600, "203.0.113.7"));

        let mut msg = query("klein.org.");
        Server::Authoritative(&auth)
            .resolve(&mut msg, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(msg.header.authoritative);
        assert!(!msg.header.query);
        assert_eq!(msg.nameservers, vec![identity]);
        assert_eq!(msg.header.nameservers, 1);
        assert_eq!(msg.last_answer().unwrap().rdata(), "203.0.113.7");
    }

    #[test]
    fn server_enum_exposes_identity() {
        let auth = AuthoritativeServer::new(ResourceRecord::a("ns1.auth-server.net.", 60, "10.0.0.1"));
        let server = Server::Authoritative(&auth);
        assert_eq!(server.kind(), ServerKind::Authoritative);
        assert_eq!(server.identity().rdata(), "10.0.0.1");
        assert!(server.zone().is_empty());
        assert_eq!(auth.address(), "10.0.0.1");
        assert_eq!(auth.name(), "ns1.auth-server.net.");
    }
}
