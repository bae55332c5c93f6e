//! Stock-status engine.
//!
//! Status is a derived field: it is recomputed from quantity, threshold, expiry
//! and the quarantine flag on every change and never stored independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived stock status of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    Active,
    LowStock,
    OutOfStock,
    Expired,
    Quarantined,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Active => "active",
            StockStatus::LowStock => "low-stock",
            StockStatus::OutOfStock => "out-of-stock",
            StockStatus::Expired => "expired",
            StockStatus::Quarantined => "quarantined",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the stock status from quantity, threshold and expiry.
///
/// First match wins:
/// 1. `quantity == 0` → out-of-stock
/// 2. expiry in the past → expired
/// 3. `quantity <= min_stock_level` → low-stock (inclusive boundary)
/// 4. otherwise → active
pub fn derive_status(
    quantity: u64,
    min_stock_level: u64,
    expiry_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StockStatus {
    if quantity == 0 {
        return StockStatus::OutOfStock;
    }
    if expiry_date.is_some_and(|expiry| expiry < now) {
        return StockStatus::Expired;
    }
    if quantity <= min_stock_level {
        return StockStatus::LowStock;
    }
    StockStatus::Active
}

/// Full status function including the quarantine override.
pub fn item_status(
    quantity: u64,
    min_stock_level: u64,
    expiry_date: Option<DateTime<Utc>>,
    quarantined: bool,
    now: DateTime<Utc>,
) -> StockStatus {
    if quarantined {
        StockStatus::Quarantined
    } else {
        derive_status(quantity, min_stock_level, expiry_date, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn well_stocked_item_is_active() {
        assert_eq!(derive_status(1000, 100, None, now()), StockStatus::Active);
    }

    #[test]
    fn threshold_boundary_is_low_stock() {
        assert_eq!(derive_status(100, 100, None, now()), StockStatus::LowStock);
        assert_eq!(derive_status(101, 100, None, now()), StockStatus::Active);
    }

    #[test]
    fn zero_quantity_beats_expiry() {
        let expired = Some(now() - Duration::days(1));
        assert_eq!(derive_status(0, 10, expired, now()), StockStatus::OutOfStock);
    }

    #[test]
    fn expiry_beats_low_stock() {
        let expired = Some(now() - Duration::days(1));
        assert_eq!(derive_status(5, 10, expired, now()), StockStatus::Expired);
    }

    #[test]
    fn expiry_exactly_now_is_not_expired() {
        assert_eq!(derive_status(50, 10, Some(now()), now()), StockStatus::Active);
    }

    #[test]
    fn quarantine_overrides_everything() {
        assert_eq!(item_status(0, 10, None, true, now()), StockStatus::Quarantined);
        assert_eq!(item_status(500, 10, None, true, now()), StockStatus::Quarantined);
        assert_eq!(item_status(500, 10, None, false, now()), StockStatus::Active);
    }

    #[test]
    fn serializes_as_kebab_case() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out-of-stock\"");
        assert_eq!(StockStatus::LowStock.to_string(), "low-stock");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: without expiry, status partitions on quantity vs threshold.
            #[test]
            fn status_partitions_on_quantity(q in 0u64..100_000, m in 0u64..100_000) {
                let status = derive_status(q, m, None, now());
                prop_assert_eq!(status == StockStatus::OutOfStock, q == 0);
                prop_assert_eq!(status == StockStatus::LowStock, q > 0 && q <= m);
                prop_assert_eq!(status == StockStatus::Active, q > m);
            }

            /// Property: a past expiry always wins over the threshold, unless stock is zero.
            #[test]
            fn past_expiry_wins_over_threshold(
                q in 0u64..100_000,
                m in 0u64..100_000,
                days_ago in 1i64..3650,
            ) {
                let expiry = Some(now() - Duration::days(days_ago));
                let status = derive_status(q, m, expiry, now());
                if q == 0 {
                    prop_assert_eq!(status, StockStatus::OutOfStock);
                } else {
                    prop_assert_eq!(status, StockStatus::Expired);
                }
            }

            /// Property: a future expiry never changes the result.
            #[test]
            fn future_expiry_is_ignored(q in 0u64..100_000, m in 0u64..100_000, days in 0i64..3650) {
                let expiry = Some(now() + Duration::days(days));
                prop_assert_eq!(derive_status(q, m, expiry, now()), derive_status(q, m, None, now()));
            }
        }
    }
}
