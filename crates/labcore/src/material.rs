use crate::MaterialError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A quantity with a unit and an optional kind (e.g. "microliter" of "PBS")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    pub unit: String,
    pub kind: Option<String>,
}

impl Measure {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    fn describe(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{} {} ({})", self.value, self.unit, kind),
            None => format!("{} {}", self.value, self.unit),
        }
    }
}

/// Material consumed during a behavior execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub specification: String,
    pub amount: Measure,
}

impl Material {
    pub fn new(specification: impl Into<String>, amount: Measure) -> Self {
        Self {
            specification: specification.into(),
            amount,
        }
    }
}

/// Add a list of measures and return a fresh measure.
///
/// Requires that all measures share the same unit and kind.
pub fn sum_measures(measures: &[Measure]) -> Result<Measure, MaterialError> {
    let prototype = measures.first().ok_or(MaterialError::Empty)?;
    for m in measures {
        if m.unit != prototype.unit || m.kind != prototype.kind {
            return Err(MaterialError::IncompatibleMeasures {
                left: prototype.describe(),
                right: m.describe(),
            });
        }
    }
    Ok(Measure {
        value: measures.iter().map(|m| m.value).sum(),
        unit: prototype.unit.clone(),
        kind: prototype.kind.clone(),
    })
}

/// Merge consumed materials per distinct specification, summing amounts
pub fn aggregate_materials(materials: &[Material]) -> Result<Vec<Material>, MaterialError> {
    let mut by_spec: BTreeMap<&str, Vec<Measure>> = BTreeMap::new();
    for m in materials {
        by_spec
            .entry(m.specification.as_str())
            .or_default()
            .push(m.amount.clone());
    }
    let mut merged = Vec::with_capacity(by_spec.len());
    for (spec, amounts) in by_spec {
        merged.push(Material {
            specification: spec.to_string(),
            amount: sum_measures(&amounts)?,
        });
    }
    Ok(merged)
}
