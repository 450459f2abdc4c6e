#[cfg(test)]
mod telemetry_snapshot_tests {
    use std::time::Duration;

    use pqseal_core::telemetry::{Stage, StageReport, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    fn make_counters() -> TelemetryCounters {
        let mut c = TelemetryCounters::default();
        c.record(&StageReport { bytes_in: 100, ..StageReport::new(Stage::Sign) });
        c.record(&StageReport { bytes_in: 100, bytes_out: 80, ..StageReport::new(Stage::Compress) });
        c.record(&StageReport { bytes_in: 80, bytes_out: 80, ..StageReport::new(Stage::Encrypt) });
        c.record(&StageReport { bytes_in: 80, bytes_out: 84, chunks: 2, overhead: 4, ..StageReport::new(Stage::Encode) });
        c.add_overhead(40);
        c
    }

    fn make_timer() -> TelemetryTimer {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(20)); // ensure elapsed > stage times
        timer.add_stage_time(Stage::Sign, Duration::from_millis(5));
        timer.add_stage_time(Stage::Compress, Duration::from_millis(10));
        timer.add_stage_time(Stage::Compress, Duration::from_millis(1));
        timer.finish();
        timer
    }

    #[test]
    fn snapshot_counts() {
        let snap = TelemetrySnapshot::from(&make_counters(), &make_timer());
        assert_eq!(snap.bytes_plaintext, 100);
        assert_eq!(snap.bytes_compressed, 80);
        assert_eq!(snap.bytes_ciphertext, 80);
        assert_eq!(snap.bytes_body, 80);
        assert_eq!(snap.bytes_overhead, 44);
        assert_eq!(snap.chunks, 2);
        assert_eq!(snap.output_bytes(), 124);
        assert!((snap.compression_ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn stage_times_accumulate() {
        let snap = TelemetrySnapshot::from(&make_counters(), &make_timer());
        assert_eq!(snap.stage_times.get(Stage::Compress), Duration::from_millis(11));
        assert!(snap.has_all_stages(&[Stage::Sign, Stage::Compress]));
        assert!(!snap.has_all_stages(&[Stage::Decrypt]));
        assert!(snap.elapsed >= snap.total_stage_time());
        assert!(snap.throughput_plaintext_bytes_per_sec > 0.0);
    }

    #[test]
    fn uncompressed_ratio_is_one() {
        let mut c = TelemetryCounters::default();
        c.record(&StageReport { bytes_in: 10, ..StageReport::new(Stage::Read) });
        let snap = TelemetrySnapshot::from(&c, &TelemetryTimer::new());
        assert_eq!(snap.compression_ratio, 1.0);
        assert_eq!(snap.bytes_compressed, 10);
    }

    #[test]
    fn snapshot_serializes() {
        let snap = TelemetrySnapshot::from(&make_counters(), &make_timer());
        let json = serde_json::to_string(&snap).unwrap();
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunks, snap.chunks);
        assert_eq!(back.stage_times.get(Stage::Sign), Duration::from_millis(5));
    }
}
