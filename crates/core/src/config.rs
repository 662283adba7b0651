// Client Configuration & Secrets

use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::domain::{CalcMode, ClusterArgs, TaskArgs, TaskMode, TaskSpec};
use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str = "https://api.byte-genie.com/execute";
pub const DEFAULT_SECRETS_FILE: &str = "secrets.json";

/// Per-call timeout used when the caller does not pass one (15 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Gateway credential sent with every request
pub const DEFAULT_AUTH_TOKEN: &str = "Basic ZTgxMDg5NGY4NWNkNmU5ODc1ZDNiZjY1ODc0ZmExYjk6YjY4YmQ5ZTgwMTgxMzJiZGEyODNhZmZmOWFlNDY5NzU=";

/// Client configuration
///
/// The flags are forwarded verbatim into every task spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Execute endpoint
    pub api_url: String,
    /// JSON file holding `BYTE_GENIE_KEY` (and optionally `USERNAME`)
    pub secrets_file: String,
    pub task_mode: TaskMode,
    pub calc_mode: CalcMode,
    /// Return output data in the reply rather than only the output file path
    pub return_data: bool,
    /// Recompute the task output even if it already exists
    pub overwrite: bool,
    /// Recompute the outputs of upstream tasks too
    pub overwrite_base_output: bool,
    /// Ask the server to log the task
    pub verbose: bool,
    pub timeout: Duration,
    /// Value of the `Authorization` header
    pub auth_token: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            secrets_file: DEFAULT_SECRETS_FILE.to_string(),
            task_mode: TaskMode::Async,
            calc_mode: CalcMode::Async,
            return_data: true,
            overwrite: false,
            overwrite_base_output: false,
            verbose: true,
            timeout: DEFAULT_TIMEOUT,
            auth_token: DEFAULT_AUTH_TOKEN.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_secrets_file(mut self, secrets_file: impl Into<String>) -> Self {
        self.secrets_file = secrets_file.into();
        self
    }

    pub fn with_task_mode(mut self, task_mode: TaskMode) -> Self {
        self.task_mode = task_mode;
        self
    }

    pub fn with_calc_mode(mut self, calc_mode: CalcMode) -> Self {
        self.calc_mode = calc_mode;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_overwrite_base_output(mut self, overwrite_base_output: bool) -> Self {
        self.overwrite_base_output = overwrite_base_output;
        self
    }

    pub fn with_return_data(mut self, return_data: bool) -> Self {
        self.return_data = return_data;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Secrets file path with a leading `~` expanded
    pub fn secrets_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.secrets_file).into_owned())
    }

    /// Task spec for `func` carrying this configuration's modes and flags
    pub fn task_spec(&self, func: impl Into<String>, args: TaskArgs, cluster: ClusterArgs) -> TaskSpec {
        TaskSpec {
            func: func.into(),
            args,
            overwrite: self.overwrite,
            overwrite_base_output: self.overwrite_base_output,
            return_data: self.return_data,
            verbose: self.verbose,
            task_mode: self.task_mode,
            calc_mode: self.calc_mode,
            cluster,
        }
    }
}

/// Contents of the secrets file
///
/// Each key is read on its own: a missing or non-string `BYTE_GENIE_KEY`
/// leaves `api_key` empty without clearing `USERNAME`, and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub api_key: String,
    pub username: String,
}

const API_KEY_FIELD: &str = "BYTE_GENIE_KEY";
const USERNAME_FIELD: &str = "USERNAME";

impl Secrets {
    /// Read and parse the secrets file
    ///
    /// # Errors
    /// - AppError::Io if the file cannot be read
    /// - AppError::Serialization if it is not valid JSON
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)?;
        let secrets: Secrets = contents.parse()?;
        if secrets.api_key.is_empty() {
            debug!(path = %path.display(), "BYTE_GENIE_KEY missing from secrets file");
        }
        Ok(secrets)
    }

    fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Secrets {
            api_key: field(API_KEY_FIELD),
            username: field(USERNAME_FIELD),
        }
    }

    /// Secrets for `config`, or empty credentials if the file is missing or malformed
    pub fn load_or_default(config: &ClientConfig) -> Self {
        let path = config.secrets_path();
        Self::load(&path).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "Secrets unavailable, using empty credentials");
            Secrets::default()
        })
    }
}

impl std::str::FromStr for Secrets {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(&value))
    }
}
