// Task Domain Model - the request side of the wire contract

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::EnvelopeError;

/// Arguments of a remote function, forwarded verbatim
pub type TaskArgs = serde_json::Map<String, serde_json::Value>;

/// Whether the server runs the task before replying or queues it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Sync,
    #[default]
    Async,
}

/// How the server schedules the calculation inside a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcMode {
    Sync,
    #[default]
    Async,
    Parallel,
}

impl std::fmt::Display for TaskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskMode::Sync => write!(f, "sync"),
            TaskMode::Async => write!(f, "async"),
        }
    }
}

impl std::fmt::Display for CalcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcMode::Sync => write!(f, "sync"),
            CalcMode::Async => write!(f, "async"),
            CalcMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for TaskMode {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(TaskMode::Sync),
            "async" => Ok(TaskMode::Async),
            _ => Err(EnvelopeError::InvalidMode {
                kind: "task_mode",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for CalcMode {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(CalcMode::Sync),
            "async" => Ok(CalcMode::Async),
            "parallel" => Ok(CalcMode::Parallel),
            _ => Err(EnvelopeError::InvalidMode {
                kind: "calc_mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Hardware hints for the cluster that runs the task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_cpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_spot: Option<bool>,
}

/// One remote function invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub func: String,
    pub args: TaskArgs,
    pub overwrite: bool,
    pub overwrite_base_output: bool,
    pub return_data: bool,
    pub verbose: bool,
    pub task_mode: TaskMode,
    pub calc_mode: CalcMode,

    #[serde(flatten)]
    pub cluster: ClusterArgs,
}

/// The task table of a payload; the server only reads the `task_1` slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSlots {
    pub task_1: TaskSpec,
}

/// Request body sent to the execute endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub api_key: String,
    pub tasks: TaskSlots,
}

impl TaskPayload {
    pub fn new(api_key: impl Into<String>, task: TaskSpec) -> Self {
        Self {
            api_key: api_key.into(),
            tasks: TaskSlots { task_1: task },
        }
    }

    pub fn task(&self) -> &TaskSpec {
        &self.tasks.task_1
    }

    pub fn func(&self) -> &str {
        &self.tasks.task_1.func
    }
}
