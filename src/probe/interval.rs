//! Maintenance-interval type probe
//!
//! Asks the maintenance-schedule route which `intervalType` it accepts for a
//! known vehicle. `Miles` is tried first; when it is accepted nothing else is
//! requested.

use crate::probe::ProbeClient;
use reqwest::StatusCode;

/// Candidate interval types, most likely first
pub const INTERVAL_TYPES: [&str; 5] = ["Miles", "Distance", "Kilometers", "Month", "Months"];

/// Interval value sent with every probe
pub const PROBE_INTERVAL: u32 = 30000;

/// Result of trying one interval type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalAttempt {
    pub interval_type: &'static str,
    pub accepted: bool,
}

/// Tries each interval type against `vehicle_id`
///
/// Stops after the first attempt when `Miles` is accepted; otherwise every
/// remaining candidate is tried regardless of the outcome.
pub async fn probe_interval_types(probe: &ProbeClient, vehicle_id: &str) -> Vec<IntervalAttempt> {
    let mut attempts = Vec::with_capacity(INTERVAL_TYPES.len());

    for interval_type in INTERVAL_TYPES {
        let accepted = try_interval_type(probe, vehicle_id, interval_type).await;
        attempts.push(IntervalAttempt {
            interval_type,
            accepted,
        });

        if interval_type == "Miles" && accepted {
            break;
        }
    }

    attempts
}

async fn try_interval_type(probe: &ProbeClient, vehicle_id: &str, interval_type: &str) -> bool {
    let mut url = probe.vehicle_route(vehicle_id, &["maintenanceSchedules", "intervals"]);
    url.query_pairs_mut()
        .append_pair("intervalType", interval_type)
        .append_pair("interval", &PROBE_INTERVAL.to_string());

    println!("Testing intervalType='{}'...", interval_type);

    match probe.get(&url).await {
        Ok(response) if response.status == StatusCode::OK => {
            println!("✅ Success! '{}' is valid.", interval_type);
            true
        }
        Ok(response) => {
            println!(
                "❌ HTTP Error {}: {}",
                response.status.as_u16(),
                response.status.canonical_reason().unwrap_or("Unknown")
            );
            println!("   Response: {}", response.text());
            false
        }
        Err(e) => {
            println!("❌ Request Failed: {}", e);
            false
        }
    }
}
