//! Shared fixtures for the cross-crate integration tests.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vanet_core::{Location, NeighborMap, SimulationConfig, VehicleSnapshot};
use vanet_trust::{SharedLedger, TrustError, TrustLedger};

/// Fixed simulation epoch so tests are reproducible.
pub const EPOCH_SECS: i64 = 1_700_000_000;

/// `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_SECS + secs, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// `millis` milliseconds after the epoch.
pub fn at_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(EPOCH_SECS * 1000 + millis)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A ledger whose genesis block sits at the epoch.
pub fn fresh_ledger() -> Result<SharedLedger, TrustError> {
    Ok(SharedLedger::new(TrustLedger::with_genesis_time(at(0))?))
}

/// A vehicle beacon at `(x, y)`.
pub fn beacon(id: &str, x: f64, y: f64, speed: f64, secs: i64) -> VehicleSnapshot {
    VehicleSnapshot::new(id, Location::new(x, y), speed, 0.0, at(secs))
}

/// `count` vehicles scattered uniformly over the network, named `V_0`...
/// with speeds inside the configured velocity band.
pub fn scattered_vehicles(config: &SimulationConfig, count: usize, seed: u64) -> NeighborMap {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let location = Location::new(
                rng.gen_range(0.0..config.network.length),
                rng.gen_range(0.0..config.network.width),
            );
            let speed = rng.gen_range(config.vehicles.min_velocity..=config.vehicles.max_velocity);
            let direction = rng.gen_range(0.0..360.0);
            VehicleSnapshot::new(format!("V_{i}"), location, speed, direction, at(0))
        })
        .collect()
}

/// Evenly spaced relays along the x axis from `start` to `end`.
pub fn relay_line(start: f64, end: f64, spacing: f64, y: f64) -> NeighborMap {
    let mut vehicles = NeighborMap::new();
    let mut x = start;
    let mut i = 0;
    while x <= end {
        vehicles.insert(VehicleSnapshot::new(
            format!("R_{i:02}"),
            Location::new(x, y),
            80.0,
            0.0,
            at(0),
        ));
        x += spacing;
        i += 1;
    }
    vehicles
}
