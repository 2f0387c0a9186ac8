use std::fs;
use std::sync::Arc;

use harmony_metrics::prelude::*;
use tempfile::TempDir;

use crate::common::{ScriptedSource, TestDumpBuilder};

fn config(dir: &TempDir) -> SamplerConfig {
    SamplerConfig {
        interval_ms: 5,
        output_dir: dir.path().join("reports"),
        series_file_stem: "session".to_string(),
        ..SamplerConfig::new("com.example.app")
    }
}

#[tokio::test]
async fn test_scheduled_run_writes_series_and_export() {
    let dir = TempDir::new().unwrap();
    let dumps = (0..4).map(|i| {
        TestDumpBuilder::new(1_501_839_064_260 + i * 1000)
            .core(1_992_000, &format!("{}.0", i * 10))
            .metric("pss", "484536")
            .build()
    });

    let mut scheduler = SamplingScheduler::new(config(&dir), Arc::new(ScriptedSource::new(dumps)))
        .with_registry(Arc::new(CoreRegistry::new()));
    scheduler.start().unwrap();
    scheduler.terminated().await;

    let report = scheduler.stop().await.unwrap().unwrap();
    assert_eq!(report.ticks_ok, 4);
    assert!(report.terminated_by.is_some());
    assert_eq!(report.series_path, dir.path().join("reports").join("session.csv"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report.export_path.unwrap()).unwrap()).unwrap();
    assert_eq!(written["cpuFreqIndex"]["data"][0]["mean"], 1.99);
    assert_eq!(written["cpuCoreLoadIndex"]["data"][0]["max"], 30.0);
    assert_eq!(written["memAppInfoIndex"]["data"][0]["name"], "pss");

    let batch = aggregate_file(&report.series_path, TimestampFormat::default()).unwrap();
    assert_eq!(batch, report.export);
}

#[tokio::test]
async fn test_foreground_keeps_running_while_sampling() {
    let dir = TempDir::new().unwrap();
    let dumps = (0..1000).map(|i| TestDumpBuilder::new(i).core(1_000_000, "1.0").build());

    let mut scheduler = SamplingScheduler::new(config(&dir), Arc::new(ScriptedSource::new(dumps)))
        .with_registry(Arc::new(CoreRegistry::new()));
    scheduler.start().unwrap();

    // start() returned, so the foreground can do its own work
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(scheduler.state(), SchedulerState::Running);

    let report = scheduler.stop().await.unwrap().unwrap();
    assert!(report.ticks_ok >= 1);
    assert!(report.terminated_by.is_none());
    assert_eq!(load(&report.series_path).unwrap().len(), report.ticks_ok);
}
