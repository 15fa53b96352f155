use labcore::{ActivityNodeExecution, LabError, Protocol, ProtocolExecution};

/// Observer translating an execution into another system's instructions
/// (e.g. physical-robot commands).
///
/// `process` is best-effort: the engine catches and logs its errors so one
/// observer's fault cannot corrupt the token-flow algorithm.
pub trait BehaviorSpecialization: Send {
    fn on_begin(&mut self, _ex: &ProtocolExecution) -> Result<(), LabError> {
        Ok(())
    }

    /// Called synchronously after every node firing
    fn process(
        &mut self,
        protocol: &Protocol,
        record: &ActivityNodeExecution,
        ex: &ProtocolExecution,
    ) -> Result<(), LabError>;

    fn on_end(&mut self, _ex: &ProtocolExecution) -> Result<(), LabError> {
        Ok(())
    }
}

/// No-op specialization
pub struct DefaultBehaviorSpecialization;

impl BehaviorSpecialization for DefaultBehaviorSpecialization {
    fn process(
        &mut self,
        _protocol: &Protocol,
        _record: &ActivityNodeExecution,
        _ex: &ProtocolExecution,
    ) -> Result<(), LabError> {
        Ok(())
    }
}
