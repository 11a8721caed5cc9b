//! External process execution for mothdev
//!
//! Workflows never spawn processes directly. They describe each invocation as
//! a [`CommandSpec`] and pass it to a [`ProcessRunner`]:
//! - `SystemRunner`: spawns the child with tokio and waits for it
//! - `DryRunRunner`: prints inherited-stdio commands, delegates captures

pub mod system;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use system::{DryRunRunner, SystemRunner};
pub use types::{exit_code_of, CommandOutput, CommandSpec, ProcessRunner};
