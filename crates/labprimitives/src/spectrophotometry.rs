use crate::resolve_input;
use labcore::{Behavior, FiringError, Literal, Parameter, ParameterValue};
use labruntime::Primitive;
use serde_json::json;

pub const MEASURE_ABSORBANCE: &str = "spectrophotometry/MeasureAbsorbance";

/// Behavior declaration matched by [`MeasureAbsorbancePrimitive`]
pub fn measure_absorbance_behavior() -> Behavior {
    Behavior::new(MEASURE_ABSORBANCE)
        .with_input("samples", true)
        .with_input("wavelength", false)
        .with_output("measurements", true)
}

/// Derives sample data from the samples placed under the reader
pub struct MeasureAbsorbancePrimitive;

impl Primitive for MeasureAbsorbancePrimitive {
    fn compute_output(
        &self,
        behavior: &Behavior,
        inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError> {
        if output.name != "measurements" {
            return Ok(Literal::String(output.name.clone()));
        }
        let samples = resolve_input(behavior, inputs, "samples").ok_or_else(|| {
            FiringError::MissingParameterValue {
                name: "samples".to_string(),
            }
        })?;
        let wavelength = resolve_input(behavior, inputs, "wavelength");
        Ok(Literal::Json(json!({
            "from_samples": samples.to_json(),
            "wavelength": wavelength.map(|w| w.to_json()),
        })))
    }
}
