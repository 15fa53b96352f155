use labcore::{Behavior, FiringError, Literal, Material, Parameter, ParameterValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Boundary to the domain primitive library.
///
/// The engine never computes domain values itself; it asks the primitive
/// bound to a behavior for the value of each produced output. Computation is
/// synchronous and must return or fail before the firing record is finalized.
pub trait Primitive: Send + Sync {
    /// Compute the value of `output` given the bound input parameter values,
    /// ordered by declared parameter index
    fn compute_output(
        &self,
        behavior: &Behavior,
        inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError>;

    /// Produce initial contents for a container-creation behavior, before any
    /// tokens exist for it
    fn initialize_contents(&self, behavior: &Behavior) -> Result<Literal, FiringError> {
        Err(FiringError::Primitive {
            behavior: behavior.identity.clone(),
            message: "cannot initialize contents".to_string(),
        })
    }

    /// Materials consumed by one invocation, recorded on the call record
    fn consumed_materials(&self, _inputs: &[ParameterValue]) -> Vec<Material> {
        Vec::new()
    }
}

/// Placeholder used when no primitive is registered for a behavior: the
/// output parameter's name stands in for the value, so the engine stays
/// usable without real domain primitives.
pub struct PlaceholderPrimitive;

impl Primitive for PlaceholderPrimitive {
    fn compute_output(
        &self,
        behavior: &Behavior,
        _inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError> {
        tracing::debug!(
            behavior = %behavior.identity,
            output = %output.name,
            "no primitive registered; returning placeholder output"
        );
        Ok(Literal::String(output.name.clone()))
    }
}

/// Registry of primitives keyed by behavior identity
pub struct PrimitiveRegistry {
    primitives: HashMap<String, Arc<dyn Primitive>>,
    fallback: Arc<dyn Primitive>,
}

impl PrimitiveRegistry {
    pub fn new() -> Self {
        Self {
            primitives: HashMap::new(),
            fallback: Arc::new(PlaceholderPrimitive),
        }
    }

    pub fn register(&mut self, identity: impl Into<String>, primitive: Arc<dyn Primitive>) {
        let identity = identity.into();
        tracing::info!("registering primitive: {}", identity);
        self.primitives.insert(identity, primitive);
    }

    /// Resolve a behavior to its primitive, falling back to the placeholder
    pub fn resolve(&self, identity: &str) -> Arc<dyn Primitive> {
        self.primitives
            .get(identity)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn list_identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.primitives.keys().cloned().collect();
        identities.sort();
        identities
    }
}

impl Default for PrimitiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}
