//! telemetry/snapshot.rs
//! Immutable per-message telemetry returned by both pipelines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

/// Counters, ratios, throughput, stage timings and elapsed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub chunks: u64,
    pub bytes_plaintext: u64,
    pub bytes_compressed: u64,
    pub bytes_ciphertext: u64,
    pub bytes_body: u64,
    pub bytes_overhead: u64,
    /// `compressed / plaintext`; 1.0 when uncompressed or empty.
    pub compression_ratio: f64,
    pub throughput_plaintext_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let compression_ratio = if counters.compressed && counters.bytes_plaintext > 0 {
            counters.bytes_compressed as f64 / counters.bytes_plaintext as f64
        } else {
            1.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_plaintext as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            chunks: counters.chunks,
            bytes_plaintext: counters.bytes_plaintext,
            bytes_compressed: counters.cipher_input_bytes(),
            bytes_ciphertext: counters.bytes_ciphertext,
            bytes_body: counters.bytes_body,
            bytes_overhead: counters.bytes_overhead,
            compression_ratio,
            throughput_plaintext_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|s| self.stage_times.contains(*s))
    }

    /// Total record size: body plus every structural byte.
    pub fn output_bytes(&self) -> u64 {
        self.bytes_body + self.bytes_overhead
    }
}
