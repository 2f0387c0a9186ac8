use indexmap::IndexMap;
use serde::Serialize;

use crate::classify::CoreField;
use crate::core::types::{Frequency, TypedValue};

/// One CPU core's state for a single tick
///
/// Every standard field defaults to zero. The record also remembers which fields the tick
/// actually reported, so that a zero default is never mistaken for an observation when the
/// sample is flattened or aggregated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoreMetric {
    /// Current frequency in Hz
    pub frequency_hz: i64,
    /// Total usage percentage
    pub usage_pct: f64,
    /// Idle percentage
    pub idle_pct: f64,
    /// Kernel-space percentage
    pub system_pct: f64,
    /// User-space percentage
    pub user_pct: f64,
    /// Interrupt handling percentage
    pub irq_pct: f64,
    /// Metrics without a dedicated field, keyed by lower-cased suffix
    pub extra: IndexMap<String, TypedValue>,
    #[serde(skip)]
    observed: u8,
}

impl CoreMetric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field named by `field`.
    ///
    /// `Null` leaves the zero default in place. A non-numeric value for a standard field
    /// cannot live in the numeric slot, so it is kept under `extra` instead of being lost.
    pub fn set(&mut self, field: &CoreField, value: TypedValue) {
        let bit = match standard_bit(field) {
            Some(bit) => bit,
            None => {
                self.extra.insert(field.suffix().to_lowercase(), value);
                return;
            },
        };

        if value.is_null() {
            return;
        }

        match (field, value.as_f64()) {
            (CoreField::Frequency, Some(_)) => self.frequency_hz = value.as_i64().unwrap_or_default(),
            (CoreField::Usage, Some(v)) => self.usage_pct = v,
            (CoreField::Idle, Some(v)) => self.idle_pct = v,
            (CoreField::System, Some(v)) => self.system_pct = v,
            (CoreField::User, Some(v)) => self.user_pct = v,
            (CoreField::Irq, Some(v)) => self.irq_pct = v,
            _ => {
                self.extra.insert(field.suffix().to_lowercase(), value);
                return;
            },
        }
        self.observed |= bit;
    }

    /// Whether the tick reported a numeric value for this standard field
    pub fn is_observed(&self, field: &CoreField) -> bool {
        standard_bit(field).is_some_and(|bit| self.observed & bit != 0)
    }

    /// Typed view of a field as it should be flattened: `Null` when the tick never reported it
    pub fn value_of(&self, field: &CoreField) -> TypedValue {
        if let CoreField::Other(name) = field {
            return self.extra.get(name).cloned().unwrap_or_default();
        }
        if !self.is_observed(field) {
            return TypedValue::Null;
        }

        match field {
            CoreField::Frequency => TypedValue::Integer(self.frequency_hz),
            CoreField::Usage => TypedValue::Float(self.usage_pct),
            CoreField::Idle => TypedValue::Float(self.idle_pct),
            CoreField::System => TypedValue::Float(self.system_pct),
            CoreField::User => TypedValue::Float(self.user_pct),
            CoreField::Irq => TypedValue::Float(self.irq_pct),
            CoreField::Other(_) => TypedValue::Null,
        }
    }

    pub fn frequency(&self) -> Frequency {
        Frequency::from_hz(self.frequency_hz as f64)
    }

    /// True when no field at all was reported for this core
    pub fn is_empty(&self) -> bool {
        self.observed == 0 && self.extra.is_empty()
    }
}

fn standard_bit(field: &CoreField) -> Option<u8> {
    match field {
        CoreField::Frequency => Some(1 << 0),
        CoreField::Usage => Some(1 << 1),
        CoreField::Idle => Some(1 << 2),
        CoreField::System => Some(1 << 3),
        CoreField::User => Some(1 << 4),
        CoreField::Irq => Some(1 << 5),
        CoreField::Other(_) => None,
    }
}
