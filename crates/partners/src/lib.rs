//! Partners domain module.
//!
//! Two kinds of external counterparties: partner organizations and transport
//! providers. Both are plain reference records (validated fields, no events).

pub mod partner;
pub mod statistics;
pub mod transport;

pub use partner::{AccountStatus, Partner, PartnerFields, PartnerService, PartnershipType};
pub use statistics::{PartnerStatistics, TransportStatistics, TypeTotals};
pub use transport::{
    Availability, TransportFields, TransportProvider, TransportType, Vehicle, VehicleStatus,
    VehicleType,
};
