//! Property-based tests for the trust ledger and detector.
//!
//! - Any sequence of appends validates cleanly
//! - Corrupting one block's payload is reported at exactly that index
//! - The incremental malicious set always matches a full scan
//! - Suspicion counters never decrease while a vehicle is tracked

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use vanet_core::{Location, RsuId, SimulationConfig, TrafficSummary, VehicleId, VehicleSnapshot};

use crate::{AnomalyDetector, BlockPayload, DetectionOutcome, SharedLedger, TrustLedger};

#[derive(Debug, Clone)]
enum Append {
    Vehicle(u8, f64, f64),
    Rsu(u8, usize),
    Malicious(u8),
}

fn arb_append() -> impl Strategy<Value = Append> {
    prop_oneof![
        (0u8..20, 0.0f64..3000.0, 0.0f64..150.0).prop_map(|(v, x, s)| Append::Vehicle(v, x, s)),
        (0u8..3, 0usize..50).prop_map(|(r, n)| Append::Rsu(r, n)),
        (0u8..20).prop_map(Append::Malicious),
    ]
}

fn build_ledger(appends: &[Append]) -> TrustLedger {
    let genesis = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut ledger = TrustLedger::with_genesis_time(genesis).unwrap();
    for append in appends {
        match append {
            Append::Vehicle(v, x, speed) => {
                let id = VehicleId::new(format!("V_{v}"));
                ledger
                    .record_vehicle_data(id, Location::new(*x, 0.0), *speed, 0.0, "beacon")
                    .unwrap();
            }
            Append::Rsu(r, n) => {
                let traffic = TrafficSummary::new(*n, 75.0, 0.4);
                ledger
                    .record_rsu_data(RsuId::new(format!("RSU_{r}")), Vec::new(), traffic)
                    .unwrap();
            }
            Append::Malicious(v) => {
                ledger.add_malicious_vehicle(&VehicleId::new(format!("V_{v}"))).unwrap();
            }
        }
    }
    ledger
}

// ==================== Ledger Property Tests ====================

proptest! {
    /// Appending never breaks the chain.
    #[test]
    fn appends_always_validate(appends in prop::collection::vec(arb_append(), 0..40)) {
        let ledger = build_ledger(&appends);
        prop_assert_eq!(ledger.validate(), None);
    }

    /// Corrupting one stored payload is reported at exactly that block.
    #[test]
    fn corruption_reports_exact_index(
        appends in prop::collection::vec(arb_append(), 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let ledger = build_ledger(&appends);
        let mut blocks: serde_json::Value = serde_json::from_str(&ledger.to_json().unwrap()).unwrap();
        let target = pick.index(ledger.len());
        blocks[target]["payload"] = serde_json::to_value(BlockPayload::Genesis {
            message: "tampered".into(),
        })
        .unwrap();

        let tampered = TrustLedger::from_json(&blocks.to_string()).unwrap();
        prop_assert_eq!(tampered.validate(), Some(target as u64));
    }

    /// The cached malicious set agrees with a scan of the chain.
    #[test]
    fn malicious_cache_matches_scan(appends in prop::collection::vec(arb_append(), 0..40)) {
        let ledger = build_ledger(&appends);
        prop_assert_eq!(ledger.malicious_vehicles().clone(), ledger.scan_malicious_vehicles());
        let markings = ledger
            .blocks()
            .iter()
            .filter(|b| b.payload.malicious_vehicle().is_some())
            .count();
        prop_assert_eq!(markings, ledger.malicious_vehicles().len());
    }
}

// ==================== Detector Property Tests ====================

proptest! {
    /// Suspicion only grows, and a vehicle is marked exactly once.
    #[test]
    fn suspicion_is_monotonic(
        moves in prop::collection::vec((-50.0f64..3050.0, 0.0f64..200.0), 1..30),
    ) {
        let genesis = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ledger = SharedLedger::new(TrustLedger::with_genesis_time(genesis).unwrap());
        let mut detector = AnomalyDetector::new(
            RsuId::new("RSU_0"),
            SimulationConfig::default(),
            ledger.clone(),
        );
        let id = VehicleId::new("V_0");
        let mut last_count = 0;
        let mut marked = 0;

        for (step, (x, speed)) in moves.into_iter().enumerate() {
            let at = Utc.timestamp_opt(1_700_000_000 + step as i64, 0).unwrap();
            let snapshot = VehicleSnapshot::new("V_0", Location::new(x, 1500.0), speed, 0.0, at);
            match detector.evaluate(snapshot).unwrap() {
                DetectionOutcome::MarkedMalicious { .. } => marked += 1,
                DetectionOutcome::Rejected => prop_assert!(ledger.is_malicious(&id)),
                _ => {
                    let count = detector.suspicion_count(&id).unwrap();
                    prop_assert!(count >= last_count);
                    last_count = count;
                }
            }
        }

        prop_assert!(marked <= 1);
        prop_assert_eq!(ledger.len(), 1 + marked);
    }
}
