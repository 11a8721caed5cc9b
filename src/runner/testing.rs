//! Scripted runner for workflow tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

use super::types::{CommandOutput, CommandSpec, ProcessRunner};

/// Records every spec it is asked to run and answers from a script.
///
/// Programs without a scripted exit code succeed. Captured commands answer
/// with the scripted stdout for their program, or echo their last argument.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    codes: HashMap<String, i32>,
    stdout: HashMap<String, String>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn exit_with(mut self, program: &str, code: i32) -> Self {
        self.codes.insert(program.to_string(), code);
        self
    }

    pub(crate) fn print(mut self, program: &str, stdout: &str) -> Self {
        self.stdout.insert(program.to_string(), stdout.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn record(&self, spec: &CommandSpec) -> i32 {
        self.calls.lock().unwrap().push(spec.clone());
        self.codes.get(&spec.program).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn status(&self, spec: &CommandSpec) -> Result<i32> {
        Ok(self.record(spec))
    }

    async fn capture(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput> {
        let code = self.record(spec);
        let stdout = match self.stdout.get(&spec.program) {
            Some(out) => out.clone(),
            None => format!("{}\n", spec.args.last().cloned().unwrap_or_default()),
        };
        Ok(CommandOutput {
            code,
            stdout,
            stderr: String::new(),
        })
    }
}
