//! Execution plan - the dry-run projection of a command

use serde::{Deserialize, Serialize};

use crate::tool::ToolName;

/// Whether a plan step was confirmed by the backend's dry-run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepVerification {
    /// The backend projected this step without side effects
    Verified,
    /// The tool cannot dry-run; the step is rendered from its descriptor
    Unverified,
}

/// One step of an [`ExecutionPlan`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: ToolName,
    /// What will be run, as reported by the backend or rendered locally
    pub rendered_action: String,
    /// Expected effect on the system
    pub estimated_effect: String,
    pub verification: StepVerification,
}

impl PlanStep {
    pub fn is_verified(&self) -> bool {
        self.verification == StepVerification::Verified
    }
}

/// Ordered dry-run projection, one step per command tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn unverified_steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(|s| !s.is_verified())
    }
}
