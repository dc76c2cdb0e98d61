//! Shell session state.
//!
//! Everything the built-in applications share across commands lives in one
//! [`Session`] that the dispatcher threads into each handler.

use alloc::sync::Arc;

use log::LevelFilter;
use spin::Once;
use tickos_pool::SlotPool;
use tickos_sched::{Scheduler, SchedulerConfig};

use crate::apps::Registry;
use crate::console::Console;
use crate::context::ContextPool;
use crate::syscall::SyscallGate;

/// Handler result for success.
pub const OK: i32 = 0;

/// Handler result for failure.
pub const ERROR: i32 = 1;

/// Slots in the `pooltest` demonstration pool.
pub const DEMO_SLOTS: usize = 4;

/// Record type of the demonstration pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoObject {
    pub field1: u64,
    pub field2: u64,
}

/// Shell configuration.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Input read size; longer lines arrive in several reads
    pub max_line_len: usize,
    /// Spin iterations per unit of `cnt` for burn tasks
    pub burn_factor: u64,
    /// Maximum number of live scheduler tasks
    pub max_tasks: usize,
    /// Log level for the hosted logger
    pub log_level: LevelFilter,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_line_len: 1024,
            burn_factor: 100_000,
            max_tasks: SchedulerConfig::default().max_tasks,
            log_level: LevelFilter::Warn,
        }
    }
}

/// State shared by all commands of one shell.
pub struct Session {
    pub config: ShellConfig,
    last_return_code: i32,
    /// Private pool behind `pooltest`
    pub demo_pool: SlotPool<DemoObject, DEMO_SLOTS>,
    /// Contexts handed to spawned tasks
    pub contexts: ContextPool,
    pub scheduler: Scheduler,
    /// Host time of the first task status line
    pub task_epoch: Arc<Once<u64>>,
    exit_request: Option<i32>,
    registry: Registry,
}

impl Session {
    /// Creates a new session over the built-in applications.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_registry(config, Registry::builtin())
    }

    /// Creates a new session whose commands come from `registry`.
    pub fn with_registry(config: ShellConfig, registry: Registry) -> Self {
        let scheduler = Scheduler::new(SchedulerConfig {
            max_tasks: config.max_tasks,
        });

        Self {
            config,
            last_return_code: OK,
            demo_pool: SlotPool::new(),
            contexts: ContextPool::new(),
            scheduler,
            task_epoch: Arc::new(Once::new()),
            exit_request: None,
            registry,
        }
    }

    /// Applications this session dispatches to.
    pub fn registry(&self) -> Registry {
        self.registry
    }

    /// Result of the most recent known command.
    pub fn last_return_code(&self) -> i32 {
        self.last_return_code
    }

    pub(crate) fn set_last_return_code(&mut self, code: i32) {
        self.last_return_code = code;
    }

    /// Exit code requested through the syscall boundary, if any.
    pub fn exit_request(&self) -> Option<i32> {
        self.exit_request
    }

    /// Opens the syscall boundary for one handler.
    pub fn syscalls<'a>(&'a mut self, console: &'a mut dyn Console) -> SyscallGate<'a> {
        SyscallGate::new(console, &mut self.exit_request)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}
