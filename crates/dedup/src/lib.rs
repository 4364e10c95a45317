//! `rollcall-dedup` — Record-linkage engine for organization rosters.
//!
//! Pure engine crate: receives pre-loaded rosters or a people table, returns
//! merged records and reports. No CLI or IO dependencies.

pub mod address;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod key;
pub mod ledger;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod report;
pub mod tier;

pub use address::{AddressTagger, PatternTagger};
pub use config::RollcallConfig;
pub use engine::{run, DedupResult};
pub use error::DedupError;
pub use ledger::{PeopleLedger, Roster};
pub use model::{PeopleTable, PersonRecord};
pub use tier::Tier;
