use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::iter::FromIterator;
use std::path::Path;
use std::slice;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dns::{Error, ResourceRecord, Type};

/// Names containing this marker belong to the authoritative tier
pub const AUTHORITATIVE_MARKER: &str = "auth-server.net";

/// Which field of a record a lookup compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Name(&'a str),
    Rdata(&'a str),
    /// Either field, the first record matching on name or rdata wins
    NameOrRdata(&'a str),
}

impl<'a> Lookup<'a> {
    pub fn target(&self) -> &'a str {
        match *self {
            Lookup::Name(target) | Lookup::Rdata(target) | Lookup::NameOrRdata(target) => target,
        }
    }

    fn matches(&self, rr: &ResourceRecord) -> bool {
        match *self {
            Lookup::Name(target) => rr.name() == target,
            Lookup::Rdata(target) => rr.rdata() == target,
            Lookup::NameOrRdata(target) => rr.name() == target || rr.rdata() == target,
        }
    }
}

/// An ordered record store
///
/// Insertion order is kept and decides which record a lookup returns when
/// several match. Nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone {
    records: Vec<ResourceRecord>,
}

impl Zone {
    pub fn new() -> Zone {
        Zone::default()
    }

    pub fn add_record(&mut self, rr: ResourceRecord) {
        self.records.push(rr);
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn iter(&self) -> slice::Iter<'_, ResourceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the first record of type `rtype` matched by `lookup`
    pub fn find(&self, rtype: Type, lookup: Lookup) -> Option<&ResourceRecord> {
        self.records
            .iter()
            .find(|rr| rr.rtype() == rtype && lookup.matches(rr))
    }

    /// Like [`find`](#method.find), but a miss is an `Error::RecordNotFound`
    pub fn lookup(&self, rtype: Type, lookup: Lookup) -> Result<&ResourceRecord, Error> {
        self.find(rtype, lookup).ok_or_else(|| Error::RecordNotFound {
            name: lookup.target().to_owned(),
            rtype,
        })
    }

    /// Returns the first record of type `rtype` whose name or rdata equals
    /// `target`
    ///
    /// The same call answers "the NS record of this domain" and "the record
    /// pointing at this server". Prefer [`find`](#method.find) with an
    /// explicit field when a name could coincide with some rdata.
    pub fn search_record(&self, target: &str, rtype: Type) -> Option<&ResourceRecord> {
        self.find(rtype, Lookup::NameOrRdata(target))
    }

    /// Root servers: the `.` NS records, or for `Type::A` the address
    /// records they point at (unresolvable ones are left out)
    pub fn find_roots(&self, rtype: Type) -> Vec<&ResourceRecord> {
        let roots_ns = self.records.iter().filter(|rr| rr.name() == ".");
        match rtype {
            Type::NS => roots_ns.collect(),
            Type::A => roots_ns
                .filter_map(|ns| self.search_record(ns.rdata(), Type::A))
                .collect(),
        }
    }

    /// All records named exactly `label.`
    pub fn find_tlds(&self, label: &str) -> Vec<&ResourceRecord> {
        let name = format!("{}.", label);
        self.records.iter().filter(|rr| rr.name() == name).collect()
    }

    /// All records whose name contains [`AUTHORITATIVE_MARKER`]
    pub fn find_authoritatives(&self) -> Vec<&ResourceRecord> {
        self.find_containing(AUTHORITATIVE_MARKER)
    }

    pub(crate) fn find_containing(&self, marker: &str) -> Vec<&ResourceRecord> {
        self.records
            .iter()
            .filter(|rr| rr.name().contains(marker))
            .collect()
    }

    /// Distinct names of address records, in insertion order
    pub fn domains(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.records
            .iter()
            .filter(|rr| rr.rtype() == Type::A && seen.insert(rr.name()))
            .map(|rr| rr.name())
            .collect()
    }

    /// Appends all of `other`'s records
    pub fn merge(&mut self, other: Zone) {
        self.records.extend(other.records);
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: io::Read>(reader: R) -> Result<Zone, Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_state<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        debug!("saving {} records to {}", self.len(), path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_state<P: AsRef<Path>>(path: P) -> Result<Zone, Error> {
        let path = path.as_ref();
        let zone = Zone::read_from(BufReader::new(File::open(path)?))?;
        debug!("loaded {} records from {}", zone.len(), path.display());
        Ok(zone)
    }
}

impl From<Vec<ResourceRecord>> for Zone {
    fn from(records: Vec<ResourceRecord>) -> Zone {
        Zone { records }
    }
}

impl FromIterator<ResourceRecord> for Zone {
    fn from_iter<I: IntoIterator<Item = ResourceRecord>>(iter: I) -> Zone {
        Zone {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<ResourceRecord> for Zone {
    fn extend<I: IntoIterator<Item = ResourceRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Zone {
    type Item = &'a ResourceRecord;
    type IntoIter = slice::Iter<'a, ResourceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rr in &self.records {
            writeln!(f, "{}", rr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::Class;

    fn sample() -> Zone {
        Zone::from(vec![
            ResourceRecord::ns(".", 3600, "a.root-servers.net."),
            ResourceRecord::ns(".", 3600, "b.root-servers.net."),
            ResourceRecord::a("a.root-servers.net.", 3600, "198.41.0.4"),
            ResourceRecord::ns("org.", 3600, "a0.org.afilias-nst.info."),
            ResourceRecord::a("a0.org.afilias-nst.info.", 3600, "199.19.56.1"),
            ResourceRecord::ns("klein.org.", 3600, "ns3.auth-server.net."),
            ResourceRecord::a("ns3.auth-server.net.", 3600, "10.0.0.3"),
            ResourceRecord::a("klein.org.", 3600, "203.0.113.7"),
        ])
    }

    #[test]
    fn search_record_matches_name_or_rdata() {
        let zone = sample();
        let by_name = zone.search_record("klein.org.", Type::NS).unwrap();
        assert_eq!(by_name.rdata(), "ns3.auth-server.net.");

        let by_rdata = zone.search_record("a0.org.afilias-nst.info.", Type::NS).unwrap();
        assert_eq!(by_rdata.name(), "org.");

        assert!(zone.search_record("klein.org.", Type::A).is_some());
        assert!(zone.search_record("missing.org.", Type::A).is_none());
    }

    #[test]
    fn search_record_is_idempotent() {
        let zone = sample();
        let first = zone.search_record("ns3.auth-server.net.", Type::A);
        let second = zone.search_record("ns3.auth-server.net.", Type::A);
        assert_eq!(first, second);
        assert!(std::ptr::eq(first.unwrap(), second.unwrap()));
    }

    #[test]
    fn explicit_lookups_do_not_cross_match() {
        let zone = Zone::from(vec![
            ResourceRecord::ns("alias.org.", 3600, "klein.org."),
            ResourceRecord::ns("klein.org.", 3600, "ns3.auth-server.net."),
        ]);
        assert_eq!(
            zone.search_record("klein.org.", Type::NS).unwrap().name(),
            "alias.org."
        );
        assert_eq!(
            zone.find(Type::NS, Lookup::Name("klein.org.")).unwrap().name(),
            "klein.org."
        );
        assert_eq!(
            zone.find(Type::NS, Lookup::Rdata("klein.org.")).unwrap().name(),
            "alias.org."
        );
    }

    #[test]
    fn first_match_wins() {
        let mut zone = Zone::new();
        zone.add_record(ResourceRecord::a("dup.com.", 60, "10.0.0.1"));
        zone.add_record(ResourceRecord::a("dup.com.", 60, "10.0.0.2"));
        assert_eq!(zone.len(), 2);
        assert_eq!(
            zone.find(Type::A, Lookup::Name("dup.com.")).unwrap().rdata(),
            "10.0.0.1"
        );
    }

    #[test]
    fn lookup_reports_what_was_missing() {
        let zone = sample();
        match zone.lookup(Type::NS, Lookup::Name("nowhere.biz.")) {
            Err(Error::RecordNotFound { name, rtype }) => {
                assert_eq!(name, "nowhere.biz.");
                assert_eq!(rtype, Type::NS);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn find_roots() {
        let zone = sample();
        let ns = zone.find_roots(Type::NS);
        assert_eq!(ns.len(), 2);
        assert!(ns.iter().all(|rr| rr.name() == "."));

        // b.root-servers.net. has no address record
        let a = zone.find_roots(Type::A);
        assert_eq!(a.len(), 1);
        assert!(a.len() <= ns.len());
        assert_eq!(a[0].rdata(), "198.41.0.4");
    }

    #[test]
    fn find_tlds_matches_exact_label() {
        let zone = sample();
        let tlds = zone.find_tlds("org");
        assert_eq!(tlds.len(), 1);
        assert_eq!(tlds[0].rdata(), "a0.org.afilias-nst.info.");
        assert!(zone.find_tlds("info").is_empty());
    }

    #[test]
    fn find_authoritatives_matches_marker() {
        let mut zone = sample();
        zone.add_record(ResourceRecord::ns("ns3.auth-server.net.", 3600, "elsewhere."));
        let found = zone.find_authoritatives();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].rtype(), Type::A);
        assert_eq!(found[1].rtype(), Type::NS);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut zone = sample();
        let before = zone.len();
        zone.merge(Zone::from(vec![
            ResourceRecord::a("klein.org.", 60, "192.0.2.1"),
            ResourceRecord::a("x.com.", 60, "192.0.2.2"),
        ]));
        assert_eq!(zone.len(), before + 2);
        assert_eq!(zone.records()[before].rdata(), "192.0.2.1");
        // the original record still shadows the merged duplicate
        assert_eq!(
            zone.search_record("klein.org.", Type::A).unwrap().rdata(),
            "203.0.113.7"
        );
    }

    #[test]
    fn domains_are_distinct_address_names() {
        let mut zone = sample();
        zone.add_record(ResourceRecord::a("klein.org.", 60, "192.0.2.1"));
        assert_eq!(
            zone.domains(),
            vec![
                "a.root-servers.net.",
                "a0.org.afilias-nst.info.",
                "ns3.auth-server.net.",
                "klein.org.",
            ]
        );
    }

    #[test]
    fn domains_of_a_large_zone() {
        let mut zone = Zone::new();
        for round in 0..3 {
            for i in 0..10_000 {
                zone.add_record(ResourceRecord::a(format!("host{}.com.", i), 60, format!("10.{}.0.1", round)));
            }
        }
        let domains = zone.domains();
        assert_eq!(domains.len(), 10_000);
        assert_eq!(domains[0], "host0.com.");
        assert_eq!(domains[9_999], "host9999.com.");
    }

    #[test]
    fn round_trip_through_writer() {
        let mut zone = sample();
        zone.add_record(ResourceRecord::new("chaos.", Type::A, Class::CH, 0, "127.0.0.1"));
        let mut buf = Vec::new();
        zone.write_to(&mut buf).unwrap();
        let restored = Zone::read_from(&buf[..]).unwrap();
        assert_eq!(restored, zone);
    }

    #[test]
    fn round_trip_through_file() {
        let zone = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root_zone.json");
        zone.save_state(&path).unwrap();
        let restored = Zone::load_state(&path).unwrap();
        assert_eq!(restored.records(), zone.records());
    }

    #[test]
    fn load_state_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match Zone::load_state(dir.path().join("absent.json")) {
            Err(Error::Io(_)) => (),
            other => panic!("unexpected load result: {:?}", other),
        }
    }

    #[test]
    fn display_lists_one_record_per_line() {
        let zone = sample();
        assert_eq!(zone.to_string().lines().count(), zone.len());
    }
}
