//! Reader → runner → hub wiring, without real hardware.

use chrono::Utc;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use strain_sensor_agent::stats::create_shared_log;
use strain_sensor_agent::{
    Config, Engine, LineReader, LineReaderConfig, LineSource, RunEnd, Runner, SnapshotHub,
    SnapshotPublisher,
};

const CAPTURE: &[u8] = b"boot v1.2\nX:12\nY:3\nTilt:80\nPressure1:160\n\xff\xfe garbage\nPressure2:20\n";

#[test]
fn captured_log_drives_engine_until_source_closes() {
    let mut reader = LineReader::new(LineReaderConfig {
        source: LineSource::Path("capture.log".into()),
        pace: None,
        capacity: 16,
    });
    reader
        .start_with(Cursor::new(CAPTURE.to_vec()))
        .expect("reader starts");

    let hub = SnapshotHub::default();
    let log = create_shared_log();
    let engine = Engine::new(&Config::default(), Utc::now()).expect("default config is valid");
    let mut runner = Runner::new(
        engine,
        Duration::from_secs(3600),
        SnapshotPublisher::with_sink(Arc::new(hub.clone())),
        log.clone(),
    );

    let running = AtomicBool::new(true);
    let end = runner.run(reader.receiver(), &running, |_| {});
    reader.join();

    assert_eq!(end, RunEnd::SourceClosed);

    let latest = runner.engine().latest();
    assert_eq!(latest.axis_x, 12.0);
    assert_eq!(latest.axis_y, 3.0);
    assert_eq!(latest.tilt, 80.0);
    assert_eq!(latest.pressure_a, 160.0);
    assert_eq!(latest.pressure_b, 20.0);

    let stats = log.stats();
    assert_eq!(stats.lines_received, 7);
    assert_eq!(stats.lines_dropped, 2);
    assert_eq!(stats.ticks, 0);

    // One manual tick publishes the accumulated state.
    let mut rx = hub.subscribe();
    let report = runner.run_tick();
    assert_eq!(rx.try_recv().expect("snapshot delivered"), report.snapshot);
    assert_eq!(report.snapshot.pressure, 160.0);
    assert!((report.snapshot.extreme_tilt_norm - 0.1).abs() < 1e-12);
    assert_eq!(hub.latest(), Some(report.snapshot));
}

#[test]
fn missing_capture_file_is_reported() {
    let mut reader = LineReader::new(LineReaderConfig {
        source: LineSource::from_arg("/nonexistent/strain-capture.log"),
        ..LineReaderConfig::default()
    });
    let err = reader.start().unwrap_err();
    assert!(err.to_string().contains("strain-capture.log"));
}
