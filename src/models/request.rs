//! Inbound task request decoding and validation.
//!
//! A [`TaskRequest`] is the raw shape of one inbound message; every required
//! field is optional at the wire level so validation can name what is
//! missing. Validation produces an immutable [`TaskSpec`], stamped with the
//! peer identity, which is also what the acknowledgement frame echoes back.

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Raw task request decoded from one inbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    /// Working directory the task runs in.
    pub home: Option<String>,
    /// Executable path or name.
    pub name: Option<String>,
    /// Ordered argument list, passed through without shell interpretation.
    pub args: Option<Vec<String>>,
    /// Ordered `KEY=VALUE` entries fully replacing the server's environment.
    pub envs: Option<Vec<String>>,
    /// Peer address; overwritten by the server on acceptance.
    #[serde(default)]
    pub client: Option<String>,
    /// Peer transport protocol; overwritten by the server on acceptance.
    #[serde(default)]
    pub client_protocol: Option<String>,
}

/// A validated task, immutable once constructed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskSpec {
    /// Working directory the task runs in.
    pub home: String,
    /// Executable path or name.
    pub name: String,
    /// Ordered argument list.
    pub args: Vec<String>,
    /// Ordered `KEY=VALUE` environment entries.
    pub envs: Vec<String>,
    /// Peer address stamped by the server.
    pub client: String,
    /// Peer transport protocol stamped by the server.
    pub client_protocol: String,
}

impl TaskRequest {
    /// Decode one inbound message payload as a JSON task request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the payload is not valid JSON for
    /// this shape.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|err| AppError::Validation(format!("malformed task request: {err}")))
    }

    /// Validate required fields and stamp the peer identity.
    ///
    /// `args` and `envs` must be present but may be empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first missing field.
    pub fn validate(self, client: &str, protocol: &str) -> Result<TaskSpec> {
        let home = require(self.home.filter(|home| !home.is_empty()), "home")?;
        let name = require(self.name.filter(|name| !name.is_empty()), "name")?;
        let args = require(self.args, "args")?;
        let envs = require(self.envs, "envs")?;

        Ok(TaskSpec {
            home,
            name,
            args,
            envs,
            client: client.to_owned(),
            client_protocol: protocol.to_owned(),
        })
    }
}

impl TaskSpec {
    /// Split each `KEY=VALUE` entry for environment injection.
    ///
    /// An entry without `=` becomes a key with an empty value.
    pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.envs
            .iter()
            .map(|entry| entry.split_once('=').unwrap_or((entry.as_str(), "")))
    }
}

fn require<T>(field: Option<T>, field_name: &str) -> Result<T> {
    field.ok_or_else(|| AppError::Validation(format!("missing required field: {field_name}")))
}
