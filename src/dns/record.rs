use std::fmt;

use serde::{Deserialize, Serialize};

/// Record types known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// a host address
    A,
    /// an authoritative name server
    NS,
}

/// Record classes known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    /// the Internet
    IN,
    /// the Chaos system
    CH,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Type::A => "A",
            Type::NS => "NS",
        }
    }
}

impl Class {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Class::IN => "IN",
            Class::CH => "CH",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single DNS record
///
/// `rdata` holds an address literal for `A` records and the delegated
/// server name for `NS` records. Records are never modified once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    name: String,
    #[serde(rename = "type")]
    rtype: Type,
    class: Class,
    ttl: u32,
    rdata: String,
}

impl ResourceRecord {
    pub fn new<N, D>(name: N, rtype: Type, class: Class, ttl: u32, rdata: D) -> ResourceRecord
    where
        N: Into<String>,
        D: Into<String>,
    {
        ResourceRecord {
            name: name.into(),
            rtype,
            class,
            ttl,
            rdata: rdata.into(),
        }
    }

    /// Shorthand for an `IN A` record
    pub fn a<N: Into<String>, D: Into<String>>(name: N, ttl: u32, address: D) -> ResourceRecord {
        ResourceRecord::new(name, Type::A, Class::IN, ttl, address)
    }

    /// Shorthand for an `IN NS` record
    pub fn ns<N: Into<String>, D: Into<String>>(name: N, ttl: u32, target: D) -> ResourceRecord {
        ResourceRecord::new(name, Type::NS, Class::IN, ttl, target)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rtype(&self) -> Type {
        self.rtype
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    pub fn rdlength(&self) -> usize {
        self.rdata.len()
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t\t\t{}\t{}\t{}\t{}",
            self.name, self.rtype, self.class, self.ttl, self.rdata
        )
    }
}
