//! Lifecycle event input model and classification
//!
//! One lifecycle event arrives per invocation as a JSON object on stdin.
//! Classification decides whether the event yields a metric at all; most
//! events yield nothing and the invocation ends silently.
//!
//! Uses `#[serde(default)]` liberally so unrelated hook payloads
//! deserialize cleanly with everything absent.

use serde::Deserialize;

/// Hook event name for prompt submissions
pub const PROMPT_SUBMIT_EVENT: &str = "UserPromptSubmit";

/// Hook event name for tool invocations
pub const TOOL_USE_EVENT: &str = "PreToolUse";

/// Hook event name for session end
pub const SESSION_END_EVENT: &str = "SessionEnd";

/// Tool name whose invocation carries a skill reference
const SKILL_TOOL: &str = "Skill";

/// A single lifecycle event payload from the host
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LifecycleEvent {
    /// Which hook fired (`UserPromptSubmit`, `PreToolUse`, `SessionEnd`, ...)
    pub hook_event_name: Option<String>,

    /// Opaque session correlation id; required for every metric
    pub session_id: Option<String>,

    /// Submitted prompt text (prompt-submit events)
    pub prompt: Option<String>,

    /// Invoked tool name (tool-use events)
    pub tool_name: Option<String>,

    /// Invoked tool parameters (tool-use events)
    pub tool_input: serde_json::Value,

    /// Path to the session transcript (session-end events)
    pub transcript_path: Option<String>,

    /// Why the session ended (session-end events)
    pub reason: Option<String>,
}

/// Kind tag of a per-event metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    SlashCommand,
    Skill,
}

impl MetricKind {
    /// Wire value for the record's `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::SlashCommand => "slash_command",
            MetricKind::Skill => "skill",
        }
    }
}

/// The metric a classified event intends to emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricIntent {
    pub kind: MetricKind,
    /// Command or skill name; never empty
    pub name: String,
    /// Full prompt character count (0 when not applicable)
    pub prompt_length: usize,
}

impl LifecycleEvent {
    /// Classify this event, first match wins.
    ///
    /// 1. Prompt submission starting with `/` → slash-command metric named
    ///    by the characters after `/` up to the first whitespace.
    /// 2. Invocation of the `Skill` tool → skill metric named by
    ///    `tool_input["skill"]`.
    /// 3. Anything else → no metric.
    ///
    /// An intent with an empty name is treated as no intent; a record is
    /// never emitted without a metric name.
    pub fn classify(&self) -> Option<MetricIntent> {
        match self.hook_event_name.as_deref() {
            Some(PROMPT_SUBMIT_EVENT) => {
                let prompt = self.prompt.as_deref()?;
                let rest = prompt.strip_prefix('/')?;
                let name: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
                if name.is_empty() {
                    return None;
                }
                Some(MetricIntent {
                    kind: MetricKind::SlashCommand,
                    name,
                    prompt_length: prompt.chars().count(),
                })
            }
            Some(TOOL_USE_EVENT) if self.tool_name.as_deref() == Some(SKILL_TOOL) => {
                let name = self
                    .tool_input
                    .get("skill")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                if name.is_empty() {
                    return None;
                }
                Some(MetricIntent {
                    kind: MetricKind::Skill,
                    name: name.to_string(),
                    prompt_length: 0,
                })
            }
            _ => None,
        }
    }
}
