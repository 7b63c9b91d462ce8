//! Application layer - services orchestrating the domain and ports.

mod provenance;
mod governance;

pub use provenance::ProvenanceService;
pub use governance::GovernanceService;
