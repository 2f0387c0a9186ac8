use super::*;

#[test]
fn test_core_created_zeroed_on_first_reference() {
    let mut builder = CoreRecordBuilder::new();
    builder.record(2, &CoreField::Usage, TypedValue::Float(12.5));

    let cores = builder.finish();
    let core = &cores[&2];
    assert_eq!(core.usage_pct, 12.5);
    assert_eq!(core.frequency_hz, 0);
    assert_eq!(core.idle_pct, 0.0);
    assert!(core.is_observed(&CoreField::Usage));
    assert!(!core.is_observed(&CoreField::Frequency));
}

#[test]
fn test_all_standard_fields() {
    let mut core = CoreMetric::new();
    core.set(&CoreField::Frequency, TypedValue::Integer(1_992_000));
    core.set(&CoreField::Usage, TypedValue::Float(1.0));
    core.set(&CoreField::Idle, TypedValue::Float(99.0));
    core.set(&CoreField::System, TypedValue::Float(0.25));
    core.set(&CoreField::User, TypedValue::Float(0.75));
    core.set(&CoreField::Irq, TypedValue::Integer(0));

    assert_eq!(core.frequency_hz, 1_992_000);
    assert_eq!(core.frequency().as_mhz_rounded(), 1.99);
    assert_eq!(core.idle_pct, 99.0);
    assert_eq!(core.system_pct, 0.25);
    assert_eq!(core.user_pct, 0.75);
    assert!(core.is_observed(&CoreField::Irq));
    assert_eq!(core.value_of(&CoreField::Irq), TypedValue::Float(0.0));
}

#[test]
fn test_null_keeps_default_and_is_not_observed() {
    let mut core = CoreMetric::new();
    core.set(&CoreField::Frequency, TypedValue::Null);

    assert_eq!(core.frequency_hz, 0);
    assert_eq!(core.value_of(&CoreField::Frequency), TypedValue::Null);
    assert!(core.is_empty());
}

#[test]
fn test_unknown_suffix_lands_in_extra() {
    let mut core = CoreMetric::new();
    let field = CoreField::from_suffix("ioWaitUsage");
    core.set(&field, TypedValue::Float(0.5));

    assert_eq!(core.extra.get("iowaitusage"), Some(&TypedValue::Float(0.5)));
    assert_eq!(core.value_of(&field), TypedValue::Float(0.5));
}

#[test]
fn test_string_for_standard_field_is_preserved() {
    let mut core = CoreMetric::new();
    core.set(&CoreField::Frequency, TypedValue::from("unknown"));

    assert_eq!(core.frequency_hz, 0);
    assert_eq!(core.extra.get("frequency"), Some(&TypedValue::from("unknown")));
}

#[test]
fn test_ensure_cores_adds_empty_records() {
    let mut builder = CoreRecordBuilder::new();
    builder.record(0, &CoreField::Usage, TypedValue::Float(1.0));
    builder.ensure_cores([0, 1, 3]);

    let cores = builder.finish();
    assert_eq!(cores.keys().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
    assert!(cores[&1].is_empty());
    assert!(!cores[&0].is_empty());
}

#[test]
fn test_registry_grows_monotonically() {
    let registry = CoreRegistry::new();
    assert!(registry.is_empty());

    assert!(registry.observe(4));
    assert!(registry.observe(0));
    assert!(!registry.observe(4));

    assert_eq!(registry.indices(), vec![0, 4]);
    assert!(registry.contains(0));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_global_registry_is_shared() {
    let a = CoreRegistry::global();
    let b = CoreRegistry::global();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}
