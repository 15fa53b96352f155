use crate::plate::well_list;
use crate::resolve_input;
use labcore::{Behavior, FiringError, Literal, Parameter, ParameterValue};
use labruntime::Primitive;
use serde_json::json;

pub const EMPTY_CONTAINER: &str = "sample_arrays/EmptyContainer";
pub const PLATE_COORDINATES: &str = "sample_arrays/PlateCoordinates";

/// Behavior declaration matched by [`EmptyContainerPrimitive`]
pub fn empty_container_behavior() -> Behavior {
    Behavior::new(EMPTY_CONTAINER)
        .with_input("specification", true)
        .with_output("samples", true)
}

/// Behavior declaration matched by [`PlateCoordinatesPrimitive`]
pub fn plate_coordinates_behavior() -> Behavior {
    Behavior::new(PLATE_COORDINATES)
        .with_input("source", true)
        .with_input("coordinates", true)
        .with_output("samples", true)
}

/// Creates a fresh sample array for a container specification
pub struct EmptyContainerPrimitive;

impl Primitive for EmptyContainerPrimitive {
    fn compute_output(
        &self,
        behavior: &Behavior,
        inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError> {
        if output.name != "samples" {
            return Ok(Literal::String(output.name.clone()));
        }
        let specification = resolve_input(behavior, inputs, "specification")
            .ok_or_else(|| FiringError::MissingParameterValue {
                name: "specification".to_string(),
            })?;
        let contents = self.initialize_contents(behavior)?;
        Ok(Literal::Json(json!({
            "name": output.name,
            "container_type": specification.to_json(),
            "contents": contents.to_json(),
        })))
    }

    fn initialize_contents(&self, behavior: &Behavior) -> Result<Literal, FiringError> {
        // No container topology is derivable from the specification yet
        tracing::warn!("assuming the sample array is a 96-well microplate");
        let aliquots = well_list("A1:H12").map_err(|e| FiringError::Primitive {
            behavior: behavior.identity.clone(),
            message: e.to_string(),
        })?;
        Ok(Literal::Json(json!(aliquots)))
    }
}

/// Masks a sample collection down to the wells named by a coordinate range
pub struct PlateCoordinatesPrimitive;

impl Primitive for PlateCoordinatesPrimitive {
    fn compute_output(
        &self,
        behavior: &Behavior,
        inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError> {
        if output.name != "samples" {
            return Ok(Literal::String(output.name.clone()));
        }
        let source = resolve_input(behavior, inputs, "source").ok_or_else(|| {
            FiringError::MissingParameterValue {
                name: "source".to_string(),
            }
        })?;
        let coordinates = resolve_input(behavior, inputs, "coordinates")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| FiringError::MissingParameterValue {
                name: "coordinates".to_string(),
            })?;
        let mask = well_list(&coordinates).map_err(|e| FiringError::Primitive {
            behavior: behavior.identity.clone(),
            message: e.to_string(),
        })?;
        Ok(Literal::Json(json!({
            "source": source.to_json(),
            "mask": mask,
        })))
    }
}
