use crate::clock::{ClockMode, ExecutionClock};
use crate::enablement::executable_nodes;
use crate::registry::PrimitiveRegistry;
use crate::specialize::BehaviorSpecialization;
use crate::validation::validate_protocol;
use chrono::{DateTime, Utc};
use labcore::{
    Agent, LabError, ParamId, ParameterValue, Protocol, ProtocolExecution, RunId, TokenId,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Executes protocol activity graphs and records every firing.
///
/// Handles token propagation and the common activity-node kinds; domain
/// values are computed by the primitives registered with the
/// [`PrimitiveRegistry`]. Execution is single-threaded and synchronous; the
/// token pool and record are exclusively owned by the in-flight run.
pub struct ExecutionEngine {
    registry: Arc<PrimitiveRegistry>,
    specializations: Vec<Box<dyn BehaviorSpecialization>>,
    clock_mode: ClockMode,
    pub(crate) clock: ExecutionClock,
    exec_counter: u64,
}

impl ExecutionEngine {
    pub fn new(registry: Arc<PrimitiveRegistry>) -> Self {
        Self {
            registry,
            specializations: Vec::new(),
            clock_mode: ClockMode::WallClock,
            clock: ExecutionClock::start(ClockMode::WallClock, None),
            exec_counter: 0,
        }
    }

    /// Attach a specialization observer; the engine starts with none
    pub fn with_specialization(mut self, specialization: Box<dyn BehaviorSpecialization>) -> Self {
        self.specializations.push(specialization);
        self
    }

    /// Use the synthetic ordinal clock instead of wall-clock-relative time
    pub fn with_ordinal_time(mut self, ordinal: bool) -> Self {
        self.clock_mode = if ordinal {
            ClockMode::Ordinal
        } else {
            ClockMode::WallClock
        };
        self
    }

    pub(crate) fn registry(&self) -> &PrimitiveRegistry {
        &self.registry
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let next = self.exec_counter;
        self.exec_counter += 1;
        next
    }

    /// Execute `protocol` against the provided parameter bindings and return
    /// the sealed execution record.
    ///
    /// Structural violations (bad arity, unsupported node kinds, dangling
    /// references) abort the run with an error. A missing required output is
    /// not an error: it is reported through `completed_normally`.
    pub fn execute(
        &mut self,
        protocol: &Protocol,
        agent: Agent,
        parameter_values: Vec<ParameterValue>,
        run_id: Option<RunId>,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<ProtocolExecution, LabError> {
        validate_protocol(protocol)?;

        let run_id = run_id.unwrap_or_else(Uuid::new_v4);
        let mut ex = ProtocolExecution::new(run_id, protocol, agent);
        ex.parameter_values = parameter_values;

        tracing::info!(protocol = %protocol.name, run = %run_id, "starting protocol execution");

        for specialization in &mut self.specializations {
            if let Err(e) = specialization.on_begin(&ex) {
                tracing::error!(error = %e, "specialization failed on begin");
            }
        }

        self.clock = ExecutionClock::start(self.clock_mode, start_time);
        self.exec_counter = 0;
        ex.start_time = self.clock.start_time();

        // Iteratively fire all unblocked nodes until no more tokens can progress
        let mut pending: Vec<TokenId> = Vec::new();
        let mut ready = protocol.initiating_nodes();
        while !ready.is_empty() {
            for node in ready {
                pending = self.fire_node(protocol, &mut ex, node, pending)?;
            }
            ready = executable_nodes(protocol, &ex, &pending)?;
        }

        ex.end_time = Some(self.clock.now());

        // Completed normally iff all required output parameters have values
        let bound: HashSet<ParamId> = ex.parameter_values.iter().map(|pv| pv.parameter).collect();
        ex.completed_normally = protocol
            .required_outputs()
            .iter()
            .all(|p| bound.contains(&p.id));

        if let Err(e) = ex.aggregate_child_materials() {
            // the rest of the record stays usable without the summary
            tracing::error!(error = %e, "could not aggregate consumed materials");
        }

        for specialization in &mut self.specializations {
            if let Err(e) = specialization.on_end(&ex) {
                tracing::error!(error = %e, "specialization failed on end");
            }
        }

        tracing::info!(
            run = %run_id,
            firings = ex.executions.len(),
            completed_normally = ex.completed_normally,
            "protocol execution sealed"
        );
        Ok(ex)
    }

    /// Hand the most recent firing record to every observer; observer
    /// failures are logged and must not abort the run
    pub(crate) fn notify_process(&mut self, protocol: &Protocol, ex: &ProtocolExecution) {
        let Some(record) = ex.executions.last() else {
            return;
        };
        for specialization in &mut self.specializations {
            if let Err(e) = specialization.process(protocol, record, ex) {
                tracing::error!(error = %e, node = %record.node, "could not process record");
            }
        }
    }
}
