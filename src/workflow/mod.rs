//! Developer workflows for mothdev
//!
//! A workflow is a [`Sequence`] of [`Step`]s, each one external command. Steps
//! run strictly one after another and the first non-zero exit stops the
//! sequence; its code becomes the workflow's result.
//!
//! - **launch**: install the plugin bundle, then start the calibre debugger
//! - **check**: generate type stubs on first run, then lint and type-check

pub mod check;
pub mod launch;

use tracing::info;

use crate::error::{DevError, Result};
use crate::runner::{CommandSpec, ProcessRunner};

pub use check::{run_check, CheckOptions, StubCache};
pub use launch::{plan_launch, run_launch, LaunchOptions, LaunchPlan};

/// One named command in a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub command: CommandSpec,
}

impl Step {
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    /// Run the step, turning a non-zero exit into [`DevError::CommandFailed`].
    pub async fn run(&self, runner: &dyn ProcessRunner) -> Result<()> {
        info!(step = %self.name, command = %self.command.display(), "Starting step");
        let code = runner.status(&self.command).await?;
        if code != 0 {
            info!(step = %self.name, code, "Step failed");
            return Err(DevError::CommandFailed {
                program: self.command.program.clone(),
                code,
            });
        }
        info!(step = %self.name, "Step succeeded");
        Ok(())
    }
}

/// Ordered steps with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn then(mut self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, stopping at the first failure.
    pub async fn run(&self, runner: &dyn ProcessRunner) -> Result<()> {
        for step in &self.steps {
            step.run(runner).await?;
        }
        Ok(())
    }
}
