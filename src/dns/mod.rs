//! Records, messages and errors shared by every part of the simulation.

mod error;
mod message;
mod record;

pub use self::error::Error;
pub use self::message::{Header, Message, Opcode, Question, ResponseCode};
pub use self::record::{Class, ResourceRecord, Type};
