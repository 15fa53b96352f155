//! Built-in primitive library
//!
//! Domain primitives the engine can delegate output-value computation to:
//! sample-array creation and masking, and absorbance measurement. Behaviors
//! with no primitive registered fall back to the runtime's placeholder.

pub mod plate;
mod sample_arrays;
mod spectrophotometry;

pub use plate::{parse_well, row_label, well_list, CoordinateError, Well};
pub use sample_arrays::{
    empty_container_behavior, plate_coordinates_behavior, EmptyContainerPrimitive,
    PlateCoordinatesPrimitive, EMPTY_CONTAINER, PLATE_COORDINATES,
};
pub use spectrophotometry::{
    measure_absorbance_behavior, MeasureAbsorbancePrimitive, MEASURE_ABSORBANCE,
};

use labcore::{Behavior, Literal, ParameterValue};
use labruntime::PrimitiveRegistry;
use std::sync::Arc;

/// Register all built-in primitives with a registry
pub fn register_all(registry: &mut PrimitiveRegistry) {
    registry.register(EMPTY_CONTAINER, Arc::new(EmptyContainerPrimitive));
    registry.register(PLATE_COORDINATES, Arc::new(PlateCoordinatesPrimitive));
    registry.register(MEASURE_ABSORBANCE, Arc::new(MeasureAbsorbancePrimitive));
}

/// Find the bound value of a behavior input by parameter name
pub(crate) fn resolve_input<'a>(
    behavior: &Behavior,
    inputs: &'a [ParameterValue],
    name: &str,
) -> Option<&'a Literal> {
    inputs
        .iter()
        .find(|pv| {
            behavior
                .parameter_by_id(pv.parameter)
                .map(|p| p.name == name)
                .unwrap_or(false)
        })
        .map(|pv| &pv.value)
}
