//! Key classification
//!
//! Routes a flat diagnostic key to the part of a [`crate::sample::Sample`] it belongs to,
//! purely from the shape of the key. Rules are evaluated top to bottom; the first match
//! wins and anything unmatched is kept verbatim in the passthrough bucket.
//!
//! | Rule | Shape | Bucket |
//! |------|-------|--------|
//! | timestamp | exactly `timestamp` | [`Bucket::Timestamp`] |
//! | process | starts with `Proc` | [`Bucket::Process`] |
//! | child process | starts with `ChildProc` | [`Bucket::ChildProcess`] |
//! | system | starts with `Totalcpu` | [`Bucket::System`] |
//! | core | `cpu<N><letters>` | [`Bucket::Core`] |
//! | fallback | anything else | [`Bucket::Passthrough`] |

use std::fmt;

pub const TIMESTAMP_KEY: &str = "timestamp";

/// Prefixes of per-process counters (`ProcCpuUsage`, `ProcId`, ...)
pub const PROCESS_PREFIXES: &[&str] = &["Proc"];

/// Prefix of child-process fields; devices currently report them as `NA` placeholders
pub const CHILD_PROCESS_PREFIX: &str = "ChildProc";

/// Prefix of system-wide CPU aggregates (`TotalcpuUsage`, `TotalcpuidleUsage`, ...)
pub const SYSTEM_PREFIX: &str = "Totalcpu";

/// Leading letters of a per-core key
pub const CORE_MARKER: &str = "cpu";

/// A per-core metric named by the suffix of a `cpu<N><suffix>` key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoreField {
    Frequency,
    Usage,
    Idle,
    System,
    User,
    Irq,
    /// A suffix without a dedicated field, stored lower-cased
    Other(String),
}

impl CoreField {
    /// The fields every core record carries, in column order
    pub const STANDARD: [CoreField; 6] =
        [Self::Frequency, Self::Usage, Self::Idle, Self::System, Self::User, Self::Irq];

    pub fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "Frequency" => Self::Frequency,
            "Usage" => Self::Usage,
            "idleUsage" => Self::Idle,
            "systemUsage" => Self::System,
            "userUsage" => Self::User,
            "irqUsage" => Self::Irq,
            other => Self::Other(other.to_lowercase()),
        }
    }

    /// The key suffix this field is written back out with
    pub fn suffix(&self) -> &str {
        match self {
            Self::Frequency => "Frequency",
            Self::Usage => "Usage",
            Self::Idle => "idleUsage",
            Self::System => "systemUsage",
            Self::User => "userUsage",
            Self::Irq => "irqUsage",
            Self::Other(name) => name,
        }
    }

    /// Flat key for this field on the given core, e.g. `cpu3Frequency`
    pub fn key_for(&self, core: usize) -> String {
        format!("{CORE_MARKER}{core}{}", self.suffix())
    }
}

impl fmt::Display for CoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Destination of one flat key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    Timestamp,
    System,
    Process,
    ChildProcess,
    Core { index: usize, field: CoreField },
    Passthrough,
}

type Rule = fn(&str) -> Option<Bucket>;

const RULES: &[Rule] = &[timestamp_rule, process_rule, child_process_rule, system_rule, core_rule];

fn timestamp_rule(key: &str) -> Option<Bucket> {
    (key == TIMESTAMP_KEY).then_some(Bucket::Timestamp)
}

fn process_rule(key: &str) -> Option<Bucket> {
    PROCESS_PREFIXES.iter().any(|prefix| key.starts_with(*prefix)).then_some(Bucket::Process)
}

fn child_process_rule(key: &str) -> Option<Bucket> {
    key.starts_with(CHILD_PROCESS_PREFIX).then_some(Bucket::ChildProcess)
}

fn system_rule(key: &str) -> Option<Bucket> {
    key.starts_with(SYSTEM_PREFIX).then_some(Bucket::System)
}

fn core_rule(key: &str) -> Option<Bucket> {
    parse_core_key(key).map(|(index, suffix)| Bucket::Core { index, field: CoreField::from_suffix(suffix) })
}

/// Classifies a flat key. Depends on nothing but the key itself.
pub fn classify(key: &str) -> Bucket {
    RULES.iter().find_map(|rule| rule(key)).unwrap_or(Bucket::Passthrough)
}

/// Splits `cpu<N><suffix>` into the core index and the suffix.
///
/// The suffix must be non-empty and purely alphabetic; any other shape is not a core key.
pub fn parse_core_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix(CORE_MARKER)?;
    let digits_end = rest.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }

    let (digits, suffix) = rest.split_at(digits_end);
    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    digits.parse().ok().map(|index| (index, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_exact_match() {
        assert_eq!(classify("timestamp"), Bucket::Timestamp);
        assert_eq!(classify("timestampMs"), Bucket::Passthrough);
    }

    #[test]
    fn test_process_and_child_buckets() {
        assert_eq!(classify("ProcCpuUsage"), Bucket::Process);
        assert_eq!(classify("ProcAppName"), Bucket::Process);
        assert_eq!(classify("ChildProcCpuUsage"), Bucket::ChildProcess);
    }

    #[test]
    fn test_system_bucket() {
        assert_eq!(classify("TotalcpuUsage"), Bucket::System);
        assert_eq!(classify("TotalcpuidleUsage"), Bucket::System);
    }

    #[test]
    fn test_core_keys() {
        assert_eq!(classify("cpu0Frequency"), Bucket::Core { index: 0, field: CoreField::Frequency });
        assert_eq!(classify("cpu11idleUsage"), Bucket::Core { index: 11, field: CoreField::Idle });
        assert_eq!(
            classify("cpu3ioWaitUsage"),
            Bucket::Core { index: 3, field: CoreField::Other("iowaitusage".to_string()) }
        );
    }

    #[test]
    fn test_not_core_shaped() {
        for key in ["cpu", "cpu0", "cpuFrequency", "cpu0Freq1", "cpu0_usage", "gpuLoad", "pss", "fps"] {
            assert_eq!(classify(key), Bucket::Passthrough, "key {key}");
        }
    }

    #[test]
    fn test_core_field_round_trips_through_key() {
        for field in CoreField::STANDARD {
            let key = field.key_for(7);
            assert_eq!(classify(&key), Bucket::Core { index: 7, field });
        }
    }

    #[test]
    fn test_classification_is_idempotent_on_rendered_keys() {
        let other = CoreField::from_suffix("softIrqUsage");
        let key = other.key_for(2);
        assert_eq!(key, "cpu2softirqusage");
        assert_eq!(classify(&key), Bucket::Core { index: 2, field: other });
    }
}
