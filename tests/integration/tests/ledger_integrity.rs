//! Integration test: ledger export, import and tamper detection.
//!
//! Exercises the full chain lifecycle across crates:
//! 1. Roadside units and vehicles append records to one shared ledger
//! 2. The chain is exported as JSON and imported again
//! 3. Edits made to the exported JSON are located by validation

use serde_json::Value;
use vanet_core::{Location, RsuId, TrafficSummary, VehicleId};
use vanet_integration_tests::{at, fresh_ledger};
use vanet_trust::{BlockPayload, LedgerBlock, SharedLedger, TrustError, TrustLedger};

fn populated_ledger() -> SharedLedger {
    let ledger = fresh_ledger().unwrap();
    for i in 0..5 {
        ledger
            .record_vehicle_data(
                VehicleId::new(format!("V_{i}")),
                Location::new(100.0 * i as f64, 50.0),
                70.0 + i as f64,
                90.0,
                "beacon",
            )
            .unwrap();
    }
    ledger
        .record_rsu_data(
            RsuId::new("RSU_0"),
            vec![VehicleId::new("V_0"), VehicleId::new("V_1")],
            TrafficSummary::new(2, 70.5, 0.47),
        )
        .unwrap();
    ledger.add_malicious_vehicle(&VehicleId::new("V_3")).unwrap();
    ledger
        .record_vehicle_data(
            VehicleId::new("V_4"),
            Location::new(420.0, 50.0),
            74.0,
            90.0,
            "after marking",
        )
        .unwrap();
    ledger
}

fn export(ledger: &SharedLedger) -> Value {
    let json = ledger.with(|l| l.to_json()).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn import(value: &Value) -> TrustLedger {
    TrustLedger::from_json(&value.to_string()).unwrap()
}

#[test]
fn test_populated_chain_is_intact() {
    let ledger = populated_ledger();
    assert_eq!(ledger.len(), 9);
    assert_eq!(ledger.validate(), None);
    ledger.with(|l| {
        for (position, block) in l.blocks().iter().enumerate() {
            assert_eq!(block.index, position as u64);
        }
        assert_eq!(l.blocks()[0].payload.kind(), "genesis");
        assert_eq!(l.blocks()[6].payload.kind(), "rsu_data");
        assert_eq!(l.blocks()[7].payload.kind(), "malicious_vehicle");
    });
}

#[test]
fn test_export_import_preserves_chain_and_marks() {
    let ledger = populated_ledger();
    let imported = import(&export(&ledger));

    assert_eq!(imported.validate(), None);
    assert_eq!(imported.len(), ledger.len());
    assert_eq!(*imported.latest(), ledger.latest());
    assert!(imported.is_malicious(&VehicleId::new("V_3")));
    assert!(!imported.is_malicious(&VehicleId::new("V_4")));
}

#[test]
fn test_imported_chain_keeps_growing() {
    let ledger = populated_ledger();
    let mut imported = import(&export(&ledger));

    // Already marked before export: no second block.
    assert!(imported
        .add_malicious_vehicle(&VehicleId::new("V_3"))
        .unwrap()
        .is_none());

    let tip = imported.latest().hash.clone();
    let block = imported
        .add_malicious_vehicle(&VehicleId::new("V_4"))
        .unwrap()
        .cloned()
        .unwrap();
    assert_eq!(block.index, 9);
    assert_eq!(block.previous_hash, tip);
    assert_eq!(imported.validate(), None);
}

#[test]
fn test_edited_payload_reported_at_its_index() {
    let ledger = populated_ledger();
    let mut value = export(&ledger);
    value[3]["payload"]["speed"] = Value::from(250.0);

    let tampered = import(&value);
    assert_eq!(tampered.validate(), Some(3));
    assert!(matches!(
        tampered.verify_chain(),
        Err(TrustError::HashMismatch { index: 3 })
    ));
}

#[test]
fn test_resealed_block_breaks_next_link() {
    let ledger = populated_ledger();
    let mut value = export(&ledger);
    value[3]["payload"]["message"] = Value::from("forged");

    // Re-seal the edited block so its own hash checks out.
    let forged: LedgerBlock = serde_json::from_value(value[3].clone()).unwrap();
    value[3]["hash"] = Value::from(forged.compute_hash().unwrap());

    let tampered = import(&value);
    assert_eq!(tampered.validate(), Some(4));
    assert!(matches!(
        tampered.verify_chain(),
        Err(TrustError::BrokenLink { index: 4 })
    ));
}

#[test]
fn test_erasing_a_mark_is_detected() {
    let ledger = populated_ledger();
    let mut value = export(&ledger);
    value[7]["payload"] = serde_json::to_value(BlockPayload::VehicleData {
        vehicle_id: VehicleId::new("V_3"),
        location: Location::new(300.0, 50.0),
        speed: 73.0,
        direction: 90.0,
        message: "beacon".to_string(),
    })
    .unwrap();

    let tampered = import(&value);
    // The mark is gone from the rebuilt set, but the chain gives it away.
    assert!(!tampered.is_malicious(&VehicleId::new("V_3")));
    assert_eq!(tampered.validate(), Some(7));
}

#[test]
fn test_dropped_block_is_detected() {
    let ledger = populated_ledger();
    let mut value = export(&ledger);
    value.as_array_mut().unwrap().remove(5);

    let tampered = import(&value);
    assert_eq!(tampered.validate(), Some(5));
}

#[test]
fn test_empty_export_rejected() {
    assert!(matches!(
        TrustLedger::from_json("[]"),
        Err(TrustError::EmptyLedger)
    ));
    assert!(matches!(
        TrustLedger::from_json("{not json"),
        Err(TrustError::Serialization(_))
    ));
}

#[test]
fn test_genesis_anchored_at_epoch() {
    let ledger = fresh_ledger().unwrap();
    let genesis = ledger.latest();
    assert_eq!(genesis.index, 0);
    assert_eq!(genesis.timestamp, at(0));
    assert_eq!(genesis.previous_hash, vanet_trust::GENESIS_PREVIOUS_HASH);
    assert_eq!(
        genesis.payload,
        BlockPayload::Genesis {
            message: vanet_trust::GENESIS_MESSAGE.to_string()
        }
    );
}
