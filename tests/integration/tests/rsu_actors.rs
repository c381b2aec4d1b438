//! Integration test: roadside unit actors over one shared ledger.
//!
//! Tests cover:
//! - Config file round trip into a set of running units
//! - Kinematic plausibility seen end to end through the actor handle
//! - Peer consensus on accident reports
//! - Several units racing to mark the same vehicle

use std::path::PathBuf;

use vanet_core::{Location, SimulationConfig, VehicleId};
use vanet_integration_tests::{at, at_millis, beacon, fresh_ledger};
use vanet_trust::{DetectionOutcome, RoadsideUnit, RsuHandle, SuspicionReason};

fn spawn_units(config: &SimulationConfig) -> (Vec<RsuHandle>, vanet_trust::SharedLedger) {
    let ledger = fresh_ledger().unwrap();
    let handles = RoadsideUnit::from_config(config, &ledger)
        .into_iter()
        .map(|rsu| RsuHandle::spawn(rsu).0)
        .collect();
    (handles, ledger)
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vanet-{}-{name}", std::process::id()))
}

#[tokio::test]
async fn test_units_from_saved_config() {
    let mut config = SimulationConfig::default();
    config.scenario.rsu_locations = vec![
        Location::new(500.0, 500.0),
        Location::new(2500.0, 500.0),
    ];
    config.trust.suspicion_threshold = 2;

    let path = scratch_path("config.toml");
    config.save(&path).unwrap();
    let loaded = SimulationConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.scenario.rsu_locations.len(), 2);
    assert_eq!(loaded.trust.suspicion_threshold, 2);

    let (handles, ledger) = spawn_units(&loaded);
    let ids: Vec<&str> = handles.iter().map(|h| h.id().as_str()).collect();
    assert_eq!(ids, vec!["RSU_0", "RSU_1"]);

    // Lowered threshold: two bad updates are enough.
    let rsu = &handles[1];
    rsu.submit_telemetry(beacon("fast", 2500.0, 500.0, 90.0, 0)).await.unwrap();
    rsu.submit_telemetry(beacon("fast", 2510.0, 500.0, 200.0, 1)).await.unwrap();
    let outcome = rsu
        .submit_telemetry(beacon("fast", 2520.0, 500.0, 200.0, 2))
        .await
        .unwrap();
    assert!(matches!(outcome, DetectionOutcome::MarkedMalicious { block_index: Some(1), .. }));
    assert!(ledger.is_malicious(&VehicleId::new("fast")));
}

#[tokio::test]
async fn test_kinematic_jump_flagged_through_handle() {
    let (handles, ledger) = spawn_units(&SimulationConfig::default());
    let rsu = &handles[0];

    rsu.submit_telemetry(beacon("honest", 0.0, 0.0, 80.0, 0)).await.unwrap();
    rsu.submit_telemetry(beacon("jumper", 0.0, 10.0, 80.0, 0)).await.unwrap();

    // 80 km/h covers about 22 m in one second.
    let honest = rsu
        .submit_telemetry(beacon("honest", 22.0, 0.0, 80.0, 1))
        .await
        .unwrap();
    assert_eq!(honest, DetectionOutcome::Accepted);

    let jumper = rsu
        .submit_telemetry(beacon("jumper", 1000.0, 10.0, 80.0, 1))
        .await
        .unwrap();
    match jumper {
        DetectionOutcome::Suspicious { count, reasons } => {
            assert_eq!(count, 1);
            assert!(matches!(
                reasons.as_slice(),
                [SuspicionReason::ImpossibleMovement { .. }]
            ));
        }
        other => panic!("expected suspicious outcome, got {other:?}"),
    }

    // Suspicion alone writes nothing to the ledger.
    assert_eq!(ledger.len(), 1);
    let tracked = rsu.tracked_vehicles().await.unwrap();
    assert_eq!(tracked, vec![VehicleId::new("honest"), VehicleId::new("jumper")]);
}

#[tokio::test]
async fn test_accident_report_against_peer_majority() {
    let (handles, _ledger) = spawn_units(&SimulationConfig::default());
    let rsu = &handles[0];
    let accident = SimulationConfig::default().scenario.accident_location;

    rsu.submit_telemetry(beacon("denier", accident.x, accident.y - 50.0, 80.0, 0))
        .await
        .unwrap();
    for (i, dx) in [-20.0, 20.0].into_iter().enumerate() {
        let witness = beacon(&format!("W_{i}"), accident.x + dx, accident.y - 40.0, 70.0, 1)
            .with_accident_report(true);
        assert_eq!(
            rsu.submit_telemetry(witness).await.unwrap(),
            DetectionOutcome::FirstSeen
        );
    }

    let mut denial = beacon("denier", accident.x, accident.y - 45.0, 80.0, 1)
        .with_accident_report(false);
    denial.timestamp = at_millis(1_500);
    match rsu.submit_telemetry(denial).await.unwrap() {
        DetectionOutcome::Suspicious { reasons, .. } => assert_eq!(
            reasons,
            vec![SuspicionReason::InconsistentAccidentReport {
                reported: false,
                majority: true,
                peers: 2,
            }]
        ),
        other => panic!("expected suspicious outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_racing_units_write_one_mark() {
    let (handles, ledger) = spawn_units(&SimulationConfig::default());
    let liar = VehicleId::new("LIAR");

    let reports = |rsu: RsuHandle| async move {
        let mut outcomes = Vec::new();
        outcomes.push(rsu.submit_telemetry(beacon("LIAR", 1500.0, 1500.0, 80.0, 0)).await);
        for secs in 1..=4 {
            outcomes.push(
                rsu.submit_telemetry(beacon("LIAR", 1500.0, 1500.0, 400.0, secs))
                    .await,
            );
        }
        outcomes
    };

    let (a, b, c) = tokio::join!(
        reports(handles[0].clone()),
        reports(handles[1].clone()),
        reports(handles[2].clone()),
    );

    let outcomes: Vec<DetectionOutcome> = a
        .into_iter()
        .chain(b)
        .chain(c)
        .collect::<Result<_, _>>()
        .unwrap();
    let new_blocks = outcomes
        .iter()
        .filter(|o| matches!(o, DetectionOutcome::MarkedMalicious { block_index: Some(_), .. }))
        .count();

    assert_eq!(new_blocks, 1);
    assert!(ledger.is_malicious(&liar));
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.validate(), None);

    // Every unit now refuses the vehicle.
    for rsu in &handles {
        let outcome = rsu
            .submit_telemetry(beacon("LIAR", 1500.0, 1500.0, 80.0, 10))
            .await
            .unwrap();
        assert_eq!(outcome, DetectionOutcome::Rejected);
    }
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_published_snapshots_share_the_chain() {
    let (handles, ledger) = spawn_units(&SimulationConfig::default());

    for (i, rsu) in handles.iter().enumerate() {
        let location = SimulationConfig::default().scenario.rsu_locations[i];
        rsu.submit_telemetry(beacon(&format!("V_{i}"), location.x, location.y, 80.0, 1))
            .await
            .unwrap();
    }
    for rsu in &handles {
        rsu.publish_snapshot(at(2)).await.unwrap();
    }

    assert_eq!(ledger.len(), 4);
    assert_eq!(ledger.validate(), None);
    let kinds: Vec<&str> = ledger.with(|l| l.blocks().iter().map(|b| b.payload.kind()).collect());
    assert_eq!(kinds, vec!["genesis", "rsu_data", "rsu_data", "rsu_data"]);

    for rsu in &handles {
        let traffic = rsu.traffic_summary().await.unwrap();
        assert_eq!(traffic.vehicle_count, 1);
    }
}
