mod gate;
mod manager;
mod sqlite;
mod store;
mod types;

pub use gate::{Admittance, TrustGate};
pub use manager::TrustManager;
pub use sqlite::SqliteTrustStore;
pub use store::{TrustError, TrustStore};
pub use types::{
    normalize_title, BlockedGroup, BlocklistEntry, BlocklistSpec, Exclusion, ExclusionScope,
    TrustedGroup,
};
