// Process loop domain model
use super::error::TuningError;
use super::tuning::PidSettings;
use super::tuning_record::TuningRecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type LoopId = u64;

/// Dynamic model family of a loop. Selects the marker meaning, the
/// identification formulas and the tuning formula set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    FirstOrder,
    Integrating,
    IntegratingWithLag,
}

impl ProcessType {
    /// Human-readable labels for the T1..T4 markers.
    pub fn marker_labels(&self) -> MarkerLabels {
        match self {
            ProcessType::FirstOrder => MarkerLabels {
                t1: "Initial Start",
                t2: "PV Changed",
                t3: "PV 63%",
                t4: "PV Settled",
            },
            ProcessType::Integrating | ProcessType::IntegratingWithLag => MarkerLabels {
                t1: "Slope 1 Start",
                t2: "Slope 1 Changed",
                t3: "Slope 2 Start",
                t4: "Slope 2 End",
            },
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessType::FirstOrder => "First Order",
            ProcessType::Integrating => "Integrating",
            ProcessType::IntegratingWithLag => "Integrating with Lag",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerLabels {
    pub t1: &'static str,
    pub t2: &'static str,
    pub t3: &'static str,
    pub t4: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineeringRange {
    pub min: f64,
    pub max: f64,
}

impl EngineeringRange {
    pub fn validate(&self, name: &'static str) -> Result<(), TuningError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(TuningError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for EngineeringRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessLoop {
    pub id: LoopId,
    pub name: String,
    pub description: String,
    pub process_type: ProcessType,
    pub pv_range: EngineeringRange,
    pub output_range: EngineeringRange,
    /// Officially adopted tuning, unset until a record is adopted.
    pub adopted: Option<PidSettings>,
    pub adopted_record: Option<TuningRecordId>,
    pub tuning_record_id: TuningRecordId,
}

impl ProcessLoop {
    pub fn new(
        id: LoopId,
        name: String,
        description: String,
        process_type: ProcessType,
        pv_range: EngineeringRange,
        output_range: EngineeringRange,
        tuning_record_id: TuningRecordId,
    ) -> Result<Self, TuningError> {
        pv_range.validate("process variable")?;
        output_range.validate("output")?;
        Ok(Self {
            id,
            name,
            description,
            process_type,
            pv_range,
            output_range,
            adopted: None,
            adopted_record: None,
            tuning_record_id,
        })
    }

    pub fn adopt(&mut self, record_id: TuningRecordId, settings: PidSettings) {
        self.adopted = Some(settings);
        self.adopted_record = Some(record_id);
    }
}
