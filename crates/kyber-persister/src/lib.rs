//! `kyber-persister`: storage for the freshest known value of each data kind.
//!
//! Jobs write through [`Persister`]; a read-only serving layer reads through
//! the same trait. The freshness flags live alongside the values so a reader
//! always sees a value together with its flag.

pub mod error;
pub mod persister;
pub mod ram;

pub use error::{PersistError, Result};
pub use persister::{new_persister, Persister};
pub use ram::RamPersister;
