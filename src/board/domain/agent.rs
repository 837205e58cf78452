//! Agents that pick up work on the board.

use super::{AgentId, BoardDomainError, ParseStatusError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Presence status of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// The agent is connected and available.
    #[default]
    Online,
    /// The agent is not currently available.
    Offline,
}

impl AgentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    id: AgentId,
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    status: AgentStatus,
    #[serde(default)]
    capabilities: BTreeSet<String>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Field-level update for an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentPatch {
    /// New display name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// New presence status.
    pub status: Option<AgentStatus>,
    /// Replacement capability set.
    pub capabilities: Option<BTreeSet<String>>,
}

impl AgentPatch {
    /// Creates a patch that only changes presence status.
    #[must_use]
    pub fn status(status: AgentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Agent {
    /// Creates an online agent with a caller-chosen identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyAgentId`] or
    /// [`BoardDomainError::EmptyAgentName`] when either value is blank.
    pub fn new(
        id: impl Into<AgentId>,
        name: impl Into<String>,
        role: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, BoardDomainError> {
        let agent_id = id.into();
        if agent_id.as_str().trim().is_empty() {
            return Err(BoardDomainError::EmptyAgentId);
        }
        let display_name = name.into();
        if display_name.trim().is_empty() {
            return Err(BoardDomainError::EmptyAgentName);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: agent_id,
            name: display_name,
            role: role.into(),
            status: AgentStatus::Online,
            capabilities: BTreeSet::new(),
            registered_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Sets the agent capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Merges `patch` into the agent and bumps `updated_at`.
    pub fn apply_patch(&mut self, patch: AgentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(capabilities) = patch.capabilities {
            self.capabilities = capabilities;
        }
        self.updated_at = now;
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the presence status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the capability set.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Returns the first registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
