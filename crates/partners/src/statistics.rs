use std::collections::BTreeMap;

use serde::Serialize;

use crate::partner::{AccountStatus, Partner, PartnershipType};
use crate::transport::{Availability, TransportProvider, TransportType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    pub count: u64,
    pub capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportStatistics {
    pub total_providers: u64,
    pub active_providers: u64,
    pub available_providers: u64,
    /// Rounded to two decimals; 0 when there are no providers.
    pub avg_rating: f64,
    pub total_capacity: u64,
    pub type_breakdown: BTreeMap<TransportType, TypeTotals>,
}

impl TransportStatistics {
    pub fn compute<'a>(providers: impl IntoIterator<Item = &'a TransportProvider>) -> Self {
        let mut stats = Self {
            total_providers: 0,
            active_providers: 0,
            available_providers: 0,
            avg_rating: 0.0,
            total_capacity: 0,
            type_breakdown: TransportType::ALL
                .into_iter()
                .map(|t| (t, TypeTotals::default()))
                .collect(),
        };
        let mut rating_sum = 0u64;

        for p in providers {
            stats.total_providers += 1;
            if p.status() == AccountStatus::Active {
                stats.active_providers += 1;
            }
            if p.availability() == Availability::Available {
                stats.available_providers += 1;
            }
            rating_sum += u64::from(p.rating());
            stats.total_capacity = stats.total_capacity.saturating_add(p.capacity());

            let totals = stats.type_breakdown.entry(p.transport_type()).or_default();
            totals.count += 1;
            totals.capacity = totals.capacity.saturating_add(p.capacity());
        }

        stats.avg_rating = average(rating_sum, stats.total_providers);
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerStatistics {
    pub total_partners: u64,
    pub active_partners: u64,
    pub inactive_partners: u64,
    pub suspended_partners: u64,
    pub avg_rating: f64,
    pub type_breakdown: BTreeMap<PartnershipType, u64>,
}

impl PartnerStatistics {
    pub fn compute<'a>(partners: impl IntoIterator<Item = &'a Partner>) -> Self {
        let mut stats = Self {
            total_partners: 0,
            active_partners: 0,
            inactive_partners: 0,
            suspended_partners: 0,
            avg_rating: 0.0,
            type_breakdown: PartnershipType::ALL.into_iter().map(|t| (t, 0)).collect(),
        };
        let mut rating_sum = 0u64;

        for p in partners {
            stats.total_partners += 1;
            match p.status() {
                AccountStatus::Active => stats.active_partners += 1,
                AccountStatus::Inactive => stats.inactive_partners += 1,
                AccountStatus::Suspended => stats.suspended_partners += 1,
            }
            rating_sum += u64::from(p.rating());
            *stats.type_breakdown.entry(p.partnership_type()).or_default() += 1;
        }

        stats.avg_rating = average(rating_sum, stats.total_partners);
        stats
    }
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum as f64 / count as f64 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::PartnerFields;
    use crate::transport::TransportFields;
    use chrono::Utc;
    use relieftrack_core::{OrganizationId, PartnerId, TransportId};

    fn provider(transport_type: TransportType, rating: u8, capacity: u64) -> TransportProvider {
        let fields = TransportFields {
            name: "Carrier".into(),
            location: "Garissa".into(),
            email: "ops@carrier.org".into(),
            phone: "0711000000".into(),
            transport_type,
            capacity,
            availability: Availability::Available,
            rating,
            service_areas: vec![],
            vehicles: vec![],
            notes: None,
            status: AccountStatus::Active,
        };
        TransportProvider::create(OrganizationId::new(), TransportId::new(), fields, Utc::now())
            .unwrap()
    }

    fn partner(status: AccountStatus, rating: u8) -> Partner {
        let fields = PartnerFields {
            organization_name: "Aid Co".into(),
            contact_name: "M. Wanjiru".into(),
            address: "Lodwar Base".into(),
            email: "hello@aid.co".into(),
            phone: "0711000000".into(),
            notes: None,
            status,
            partnership_type: PartnershipType::Recipient,
            partnership_start: None,
            partnership_end: None,
            rating,
            services: vec![],
        };
        Partner::create(OrganizationId::new(), PartnerId::new(), fields, Utc::now()).unwrap()
    }

    #[test]
    fn transport_totals_by_type() {
        let a = provider(TransportType::Rail, 4, 100);
        let b = provider(TransportType::Rail, 3, 50);
        let c = provider(TransportType::AirCargo, 4, 10);

        let stats = TransportStatistics::compute([&a, &b, &c]);

        assert_eq!(stats.total_providers, 3);
        assert_eq!(stats.total_capacity, 160);
        assert_eq!(stats.avg_rating, 3.67);
        assert_eq!(
            stats.type_breakdown[&TransportType::Rail],
            TypeTotals { count: 2, capacity: 150 }
        );
        assert_eq!(stats.type_breakdown[&TransportType::Maritime].count, 0);
    }

    #[test]
    fn partner_status_counts() {
        let a = partner(AccountStatus::Active, 5);
        let b = partner(AccountStatus::Suspended, 2);

        let stats = PartnerStatistics::compute([&a, &b]);

        assert_eq!(stats.active_partners, 1);
        assert_eq!(stats.suspended_partners, 1);
        assert_eq!(stats.avg_rating, 3.5);
        assert_eq!(stats.type_breakdown[&PartnershipType::Recipient], 2);
        assert_eq!(stats.type_breakdown[&PartnershipType::Financial], 0);
    }

    #[test]
    fn empty_sets_average_to_zero() {
        assert_eq!(PartnerStatistics::compute(std::iter::empty()).avg_rating, 0.0);
        assert_eq!(TransportStatistics::compute(std::iter::empty()).avg_rating, 0.0);
    }
}
