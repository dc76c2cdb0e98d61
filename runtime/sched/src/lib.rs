//! # Tick Scheduler
//!
//! The TickOS scheduler multiplexes demonstration tasks over a logical tick
//! clock. It is driven explicitly: nothing runs until a caller hands it a tick
//! budget through [`Scheduler::run`].
//!
//! ## Key Properties
//!
//! 1. **Determinism**: the same spawn sequence and budgets produce the same
//!    interleaving, independent of wall-clock time
//! 2. **Preemption by quota**: a task keeps the CPU for at most `quota`
//!    consecutive ticks before the next ready task is picked
//! 3. **Cooperative suspension**: a task may give up the CPU early by sleeping
//! 4. **Bounded runs**: `run` never executes more ticks than its budget
//!
//! ## Tasks
//!
//! A task body is a resumable state machine. Each scheduled tick calls
//! [`Task::step`] once; the returned [`Step`] tells the scheduler whether the
//! task keeps running, sleeps, or has finished. A finished task is dropped,
//! which releases whatever resources its body owns.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task state in the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Ready to run
    Ready,
    /// Suspended until the clock reaches `until`
    Sleeping { until: u64 },
}

/// Outcome of one scheduled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep running; the task stays ready
    Continue,
    /// Suspend for the given number of ticks (0 yields the rest of the slice)
    Sleep(u64),
    /// The task has finished and is removed
    Exit,
}

/// Per-step view of the scheduler handed to a running task.
#[derive(Debug, Clone, Copy)]
pub struct TaskCx {
    id: TaskId,
    now: u64,
}

impl TaskCx {
    /// The running task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The current tick.
    pub fn now(&self) -> u64 {
        self.now
    }
}

/// What the outside world offers to tasks while the scheduler runs.
pub trait TaskEnv {
    /// Writes task output.
    fn print(&mut self, s: &str) -> fmt::Result;

    /// Host milliseconds since an arbitrary fixed point.
    fn uptime_ms(&self) -> u64 {
        0
    }
}

/// A schedulable task body.
pub trait Task {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "task"
    }

    /// Runs the task for one tick.
    fn step(&mut self, cx: &mut TaskCx, env: &mut dyn TaskEnv) -> Step;
}

impl<F> Task for F
where
    F: FnMut(&mut TaskCx, &mut dyn TaskEnv) -> Step,
{
    fn step(&mut self, cx: &mut TaskCx, env: &mut dyn TaskEnv) -> Step {
        self(cx, env)
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of live tasks
    pub max_tasks: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_tasks: 64 }
    }
}

/// Information about a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    /// Task ID
    pub id: TaskId,
    /// Ticks per time slice
    pub quota: u32,
    /// Current state
    pub state: TaskState,
    /// Number of steps run so far
    pub steps: u64,
}

/// Summary of one [`Scheduler::run`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Ticks consumed from the budget
    pub ticks: u64,
    /// Task steps executed
    pub steps: u64,
    /// Ticks where every task was asleep
    pub idle_ticks: u64,
    /// Tasks that finished during the run
    pub exited: usize,
}

struct TaskEntry {
    id: TaskId,
    quota: u32,
    state: TaskState,
    steps: u64,
    body: Box<dyn Task>,
}

impl TaskEntry {
    fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            quota: self.quota,
            state: self.state,
            steps: self.steps,
        }
    }
}

/// The tick scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    /// Live tasks in spawn order
    tasks: Vec<TaskEntry>,
    /// Index of the task owning the current slice
    current: Option<usize>,
    /// Ticks left in the current slice
    slice_left: u32,
    /// Where the round-robin scan resumes
    next_scan: usize,
    /// Monotonic tick counter
    now: u64,
    next_id: u64,
}

impl Scheduler {
    /// Creates a new scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tasks: Vec::new(),
            current: None,
            slice_left: 0,
            next_scan: 0,
            now: 0,
            next_id: 1,
        }
    }

    /// Registers a new task.
    ///
    /// # Arguments
    ///
    /// * `body` - Task body; dropped when the task exits
    /// * `quota` - Consecutive ticks the task may run before preemption
    ///
    /// On error the body is dropped immediately.
    pub fn new_task(&mut self, body: Box<dyn Task>, quota: i64) -> Result<TaskId, SchedError> {
        let quota = match u32::try_from(quota) {
            Ok(q) if q > 0 => q,
            _ => return Err(SchedError::InvalidQuota(quota)),
        };
        if self.tasks.len() >= self.config.max_tasks {
            return Err(SchedError::TooManyTasks);
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;

        log::info!("sched: new task {} ({}) quota {}", id, body.name(), quota);
        self.tasks.push(TaskEntry {
            id,
            quota,
            state: TaskState::Ready,
            steps: 0,
            body,
        });

        Ok(id)
    }

    /// Suspends a task for `ticks` ticks, starting with the next tick to run.
    pub fn sleep(&mut self, id: TaskId, ticks: u64) -> Result<(), SchedError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(SchedError::TaskNotFound(id))?;

        if ticks > 0 {
            self.tasks[index].state = TaskState::Sleeping {
                until: self.now + ticks,
            };
        }
        if self.current == Some(index) {
            self.slice_left = 0;
        }
        Ok(())
    }

    /// Drives the scheduler for up to `budget` ticks.
    ///
    /// Returns early once no tasks remain. Ticks where every task is asleep
    /// still advance the clock.
    pub fn run(&mut self, budget: u64, env: &mut dyn TaskEnv) -> RunReport {
        let mut report = RunReport::default();

        while report.ticks < budget && !self.tasks.is_empty() {
            self.wake_sleepers();

            match self.pick() {
                Some(index) => {
                    report.steps += 1;
                    if self.step(index, env) {
                        report.exited += 1;
                    }
                }
                None => report.idle_ticks += 1,
            }

            self.now += 1;
            report.ticks += 1;
        }

        log::debug!(
            "sched: ran {} ticks ({} steps, {} idle, {} exited), now {}",
            report.ticks,
            report.steps,
            report.idle_ticks,
            report.exited,
            self.now
        );
        report
    }

    /// Gets the current tick.
    pub fn current_time(&self) -> u64 {
        self.now
    }

    /// Number of live tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Lists all live tasks in spawn order.
    pub fn tasks(&self) -> Vec<TaskInfo> {
        self.tasks.iter().map(TaskEntry::info).collect()
    }

    /// Gets information about a task.
    pub fn task_info(&self, id: TaskId) -> Option<TaskInfo> {
        self.tasks.iter().find(|t| t.id == id).map(TaskEntry::info)
    }

    fn wake_sleepers(&mut self) {
        let now = self.now;
        for task in &mut self.tasks {
            if let TaskState::Sleeping { until } = task.state {
                if until <= now {
                    task.state = TaskState::Ready;
                }
            }
        }
    }

    /// Selects the task for this tick.
    ///
    /// The slice owner keeps the CPU while it is ready and has quota left;
    /// otherwise the scan continues in spawn order after the last pick.
    fn pick(&mut self) -> Option<usize> {
        if let Some(index) = self.current {
            if self.slice_left > 0 && self.tasks[index].state == TaskState::Ready {
                return Some(index);
            }
        }

        let len = self.tasks.len();
        for offset in 0..len {
            let index = (self.next_scan + offset) % len;
            if self.tasks[index].state == TaskState::Ready {
                self.current = Some(index);
                self.next_scan = index + 1;
                self.slice_left = self.tasks[index].quota;
                return Some(index);
            }
        }

        self.current = None;
        None
    }

    /// Runs one step of the task at `index`. Returns true if it exited.
    fn step(&mut self, index: usize, env: &mut dyn TaskEnv) -> bool {
        let now = self.now;
        let entry = &mut self.tasks[index];
        let mut cx = TaskCx { id: entry.id, now };

        entry.steps += 1;
        self.slice_left -= 1;

        match entry.body.step(&mut cx, env) {
            Step::Continue => false,
            Step::Sleep(0) => {
                self.slice_left = 0;
                false
            }
            Step::Sleep(ticks) => {
                log::trace!("sched: task {} sleeps {} ticks at {}", entry.id, ticks, now);
                entry.state = TaskState::Sleeping {
                    until: now + ticks + 1,
                };
                self.slice_left = 0;
                false
            }
            Step::Exit => {
                self.remove(index);
                true
            }
        }
    }

    fn remove(&mut self, index: usize) {
        let entry = self.tasks.remove(index);
        log::debug!(
            "sched: task {} ({}) exited after {} steps",
            entry.id,
            entry.body.name(),
            entry.steps
        );

        self.current = None;
        self.slice_left = 0;
        // The task after the removed one now sits at `index`.
        self.next_scan = index;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Scheduler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Too many live tasks
    TooManyTasks,
    /// Quota must be a positive tick count
    InvalidQuota(i64),
    /// Task not found
    TaskNotFound(TaskId),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::TooManyTasks => write!(f, "too many tasks"),
            SchedError::InvalidQuota(q) => write!(f, "invalid quota {}", q),
            SchedError::TaskNotFound(id) => write!(f, "task {} not found", id),
        }
    }
}
