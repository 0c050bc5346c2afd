//! Conventional event types and their typed payloads.
//!
//! The bus accepts any non-empty string as an event type. The constants
//! below are the conventions the dashboard uses; [`TypedEvent`] binds a
//! payload struct to one of them so producers and consumers agree on shape.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Event type constants
// ---------------------------------------------------------------------------

/// An agent's status or configuration changed.
pub const AGENT_UPDATED: &str = "agent:updated";
/// A task was created.
pub const TASK_CREATED: &str = "task:created";
/// A task changed.
pub const TASK_UPDATED: &str = "task:updated";
/// A chat message was sent.
pub const MESSAGE_SENT: &str = "message:sent";
/// The UI requested navigation.
pub const UI_NAVIGATE: &str = "ui:navigate";
/// A team changed.
pub const TEAM_UPDATED: &str = "team:updated";
/// A project changed.
pub const PROJECT_UPDATED: &str = "project:updated";
/// A configuration value changed.
pub const CONFIG_CHANGED: &str = "config:changed";
/// An error was reported by some component.
pub const ERROR_OCCURRED: &str = "error:occurred";
/// A performance threshold was crossed.
pub const PERFORMANCE_WARNING: &str = "performance:warning";

/// The conventional event types as an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTopic {
    /// `agent:updated`
    AgentUpdated,
    /// `task:created`
    TaskCreated,
    /// `task:updated`
    TaskUpdated,
    /// `message:sent`
    MessageSent,
    /// `ui:navigate`
    UiNavigate,
    /// `team:updated`
    TeamUpdated,
    /// `project:updated`
    ProjectUpdated,
    /// `config:changed`
    ConfigChanged,
    /// `error:occurred`
    ErrorOccurred,
    /// `performance:warning`
    PerformanceWarning,
}

impl KnownTopic {
    /// Every known topic.
    pub const ALL: [Self; 10] = [
        Self::AgentUpdated,
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::MessageSent,
        Self::UiNavigate,
        Self::TeamUpdated,
        Self::ProjectUpdated,
        Self::ConfigChanged,
        Self::ErrorOccurred,
        Self::PerformanceWarning,
    ];

    /// The event type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgentUpdated => AGENT_UPDATED,
            Self::TaskCreated => TASK_CREATED,
            Self::TaskUpdated => TASK_UPDATED,
            Self::MessageSent => MESSAGE_SENT,
            Self::UiNavigate => UI_NAVIGATE,
            Self::TeamUpdated => TEAM_UPDATED,
            Self::ProjectUpdated => PROJECT_UPDATED,
            Self::ConfigChanged => CONFIG_CHANGED,
            Self::ErrorOccurred => ERROR_OCCURRED,
            Self::PerformanceWarning => PERFORMANCE_WARNING,
        }
    }
}

impl fmt::Display for KnownTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownTopic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| UnknownTopic(s.to_owned()))
    }
}

impl From<KnownTopic> for String {
    fn from(topic: KnownTopic) -> Self {
        topic.as_str().to_owned()
    }
}

/// Returned when parsing a string that is not a [`KnownTopic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type '{0}'")]
pub struct UnknownTopic(pub String);

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// A payload type bound to one event type.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use switchboard_events::{EventBus, TypedEvent};
///
/// #[derive(Serialize, Deserialize)]
/// struct BuildFinished {
///     ok: bool,
/// }
///
/// impl TypedEvent for BuildFinished {
///     const EVENT_TYPE: &'static str = "build:finished";
/// }
///
/// let bus = EventBus::new();
/// bus.emit_typed(&BuildFinished { ok: true }, Some("ci")).unwrap();
/// assert_eq!(bus.history_of("build:finished").len(), 1);
/// ```
pub trait TypedEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Event type this payload is emitted under.
    const EVENT_TYPE: &'static str;
}

/// Payload of [`TASK_CREATED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCreated {
    /// Task identifier.
    pub task_id: String,
    /// Human-readable title.
    pub title: String,
    /// Project the task belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Agent the task is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TypedEvent for TaskCreated {
    const EVENT_TYPE: &'static str = TASK_CREATED;
}

/// Payload of [`TASK_UPDATED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdated {
    /// Task identifier.
    pub task_id: String,
    /// New status label (e.g. `"in_progress"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Changed fields, by name.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub changes: Value,
}

impl TypedEvent for TaskUpdated {
    const EVENT_TYPE: &'static str = TASK_UPDATED;
}

/// Payload of [`AGENT_UPDATED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdated {
    /// Agent identifier.
    pub agent_id: String,
    /// New status label (e.g. `"idle"`, `"working"`).
    pub status: String,
}

impl TypedEvent for AgentUpdated {
    const EVENT_TYPE: &'static str = AGENT_UPDATED;
}

/// Payload of [`MESSAGE_SENT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSent {
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Author label.
    pub author: String,
    /// Message body.
    pub content: String,
}

impl TypedEvent for MessageSent {
    const EVENT_TYPE: &'static str = MESSAGE_SENT;
}

/// Payload of [`UI_NAVIGATE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigate {
    /// Target route.
    pub path: String,
}

impl TypedEvent for Navigate {
    const EVENT_TYPE: &'static str = UI_NAVIGATE;
}

/// Payload of [`CONFIG_CHANGED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChanged {
    /// Dotted key of the changed setting.
    pub key: String,
    /// New value.
    pub value: Value,
}

impl TypedEvent for ConfigChanged {
    const EVENT_TYPE: &'static str = CONFIG_CHANGED;
}

/// Payload of [`ERROR_OCCURRED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOccurred {
    /// Error message.
    pub message: String,
    /// Optional machine-readable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl TypedEvent for ErrorOccurred {
    const EVENT_TYPE: &'static str = ERROR_OCCURRED;
}

/// Payload of [`PERFORMANCE_WARNING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWarning {
    /// Name of the measured metric.
    pub metric: String,
    /// Observed value.
    pub value: f64,
    /// Threshold that was exceeded.
    pub threshold: f64,
}

impl TypedEvent for PerformanceWarning {
    const EVENT_TYPE: &'static str = PERFORMANCE_WARNING;
}
