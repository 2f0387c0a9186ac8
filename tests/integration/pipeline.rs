use std::fs;
use std::sync::Arc;

use harmony_metrics::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use crate::common::TestDumpBuilder;

fn assembler() -> SampleAssembler {
    SampleAssembler::new(Arc::new(CoreRegistry::new()))
}

fn run_dumps(path: &std::path::Path, dumps: &[String]) -> Export {
    let assembler = assembler();
    let mut store = SeriesStore::open(path).unwrap();
    let mut live = LiveAggregator::new();

    for dump in dumps {
        let Ok(sample) = assembler.assemble(dump) else {
            continue;
        };
        let row = store.append(&sample).unwrap();
        live.observe_row(&row);
    }
    live.finish(TimestampFormat::default())
}

#[test]
fn test_end_to_end_live_matches_batch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.csv");

    let dumps = vec![
        TestDumpBuilder::new(1_501_839_064_260)
            .noise("set pkgname: com.example.app")
            .core(1_992_000, "1.000000")
            .core(1_804_800, "0.000000")
            .metric("pss", "484536")
            .metric("nativeHeapPss", "20480")
            .metric("fps", "60")
            .build(),
        "SP_daemon: device busy".to_string(),
        TestDumpBuilder::new(1_501_839_065_260)
            .core(2_400_000, "12.500000")
            .core(1_804_800, "NA")
            .metric("pss", "490112")
            .metric("nativeHeapPss", "NA")
            .metric("fps", "NA")
            .build(),
    ];

    let live = run_dumps(&path, &dumps);
    let batch = aggregate_file(&path, TimestampFormat::default()).unwrap();
    assert_eq!(live, batch);

    let freq = live.family(MetricFamily::CpuFrequency);
    assert_eq!(freq.len(), 2);
    assert_eq!((freq[0].name.as_str(), freq[0].min, freq[0].max), ("cpu0", 1.99, 2.4));
    assert_eq!(live.column("cpu1Usage").unwrap().data.len(), 1);
    assert_eq!(live.column("nativeHeapPss").unwrap().index.max, 20.0);
    assert_eq!(live.column("pss").unwrap().data.metrics[0].value, 473.18);
    assert_eq!(
        live.column("pss").unwrap().data.metrics[0].timestamp,
        TypedValue::from("2017-08-04T17:31:04.260+08:00")
    );
    assert_eq!(live.family(MetricFamily::Fps).len(), 1);

    let rows = load(&path).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_appending_runs_to_one_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.csv");

    let first = [TestDumpBuilder::new(1).core(1_000_000, "10.0").build()];
    let second = [
        TestDumpBuilder::new(2).core(2_000_000, "20.0").metric("fps", "30").build(),
        TestDumpBuilder::new(3).core(3_000_000, "30.0").build(),
    ];
    run_dumps(&path, &first);
    run_dumps(&path, &second);

    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("timestamp,cpu0Frequency,cpu0Usage,cpu0idleUsage,cpu0systemUsage,cpu0userUsage,cpu0irqUsage"));
    assert_eq!(content.matches("timestamp").count(), 1);
    assert_eq!(lines.count(), 3);

    let export = aggregate_file(&path, TimestampFormat::Raw).unwrap();
    let usage = &export.family(MetricFamily::CpuLoad)[0];
    assert_eq!((usage.min, usage.max, usage.mean), (10.0, 30.0, 20.0));
    // `fps` was not in the original header
    assert!(export.column("fps").is_none());
}

#[test]
fn test_empty_store_exports_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.csv");
    SeriesStore::open(&path).unwrap();

    let export = aggregate_file(&path, TimestampFormat::default()).unwrap();
    assert!(export.is_empty());

    let out = dir.path().join("perf.json");
    export.write_json(&out).unwrap();
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(written, json!({}));
}

#[test]
fn test_device_core_count_is_discovered() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perf.csv");

    let mut builder = TestDumpBuilder::new(1);
    for _ in 0..12 {
        builder = builder.core(1_000_000, "5.0");
    }
    let export = run_dumps(&path, &[builder.build()]);

    let names: Vec<&str> = export.family(MetricFamily::CpuLoad).iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names.len(), 12);
    assert_eq!(names[11], "cpu11");
}

#[test]
fn test_dump_without_data_block_is_rejected() {
    let err = assembler().assemble("no data here\nstill nothing").unwrap_err();
    assert!(matches!(err, Error::MalformedDump(_)));
}
