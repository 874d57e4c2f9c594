//! Entity structs for the permit ledger.
//!
//! `PermitRecord` is the unit of world state, stored as JSON under its id.
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod file_hash;
mod permit;

pub use file_hash::FileHash;
pub use permit::{DocType, PermitRecord};
