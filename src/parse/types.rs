//! Rust types for the editor's workflow JSON.
//!
//! These types are the serde target for both the editor document and the
//! canonical engine payload. Node types are tagged UPPERCASE on the wire; the
//! editor's lowercase spelling is accepted as an alias.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// TOP-LEVEL WORKFLOW
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        WorkflowEdge {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
            label: None,
        }
    }

    /// Branch label used by CONDITIONAL routing: the explicit label if set,
    /// otherwise the source handle, trimmed and upper-cased.
    pub fn branch_label(&self) -> String {
        branch_label(self.label.as_deref(), self.source_handle.as_deref())
    }
}

pub(crate) fn branch_label(label: Option<&str>, source_handle: Option<&str>) -> String {
    label
        .filter(|l| !l.is_empty())
        .or(source_handle)
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// NODE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Start,
    End,
    HttpRequest,
    Command,
    Conditional,
    Timer,
    Parallel,
    ParallelJoin,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        NodeType::Start,
        NodeType::End,
        NodeType::HttpRequest,
        NodeType::Command,
        NodeType::Conditional,
        NodeType::Timer,
        NodeType::Parallel,
        NodeType::ParallelJoin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "START",
            NodeType::End => "END",
            NodeType::HttpRequest => "HTTP_REQUEST",
            NodeType::Command => "COMMAND",
            NodeType::Conditional => "CONDITIONAL",
            NodeType::Timer => "TIMER",
            NodeType::Parallel => "PARALLEL",
            NodeType::ParallelJoin => "PARALLEL_JOIN",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    /// Case-insensitive; accepts both `HTTP_REQUEST` and `http_request`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("Unknown node type '{}'", s))
    }
}

// =============================================================================
// NODE BASE
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NodeData<C> {
    pub label: String,
    pub config: C,
}

/// Node fields shared by every type.
///
/// Reads the canvas shape `{id, position, data: {label, config}}` as well as
/// the flat export shape `{id, label, config, position}`. A null or missing
/// label, config or position reads as the default. Always writes the canvas
/// shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    from = "RawNode<C>",
    bound(deserialize = "C: Deserialize<'de> + Default")
)]
pub struct NodeBase<C> {
    pub id: String,
    pub position: Position,
    pub data: NodeData<C>,
}

#[derive(Deserialize)]
struct RawNode<C> {
    id: String,
    #[serde(default)]
    position: Option<Position>,
    #[serde(default, deserialize_with = "lenient_text")]
    label: Option<String>,
    #[serde(default)]
    config: Option<C>,
    #[serde(default)]
    data: Option<RawData<C>>,
}

#[derive(Deserialize)]
struct RawData<C> {
    #[serde(default, deserialize_with = "lenient_text")]
    label: Option<String>,
    #[serde(default)]
    config: Option<C>,
}

impl<C: Default> From<RawNode<C>> for NodeBase<C> {
    fn from(raw: RawNode<C>) -> Self {
        let (data_label, data_config) = match raw.data {
            Some(data) => (data.label, data.config),
            None => (None, None),
        };
        // Flat fields win over `data`; an empty flat label does not.
        let label = raw
            .label
            .filter(|l| !l.is_empty())
            .or(data_label)
            .unwrap_or_default();
        NodeBase {
            id: raw.id,
            position: raw.position.unwrap_or_default(),
            data: NodeData {
                label,
                config: raw.config.or(data_config).unwrap_or_default(),
            },
        }
    }
}

impl<C> NodeBase<C> {
    pub fn new(id: impl Into<String>, label: impl Into<String>, config: C) -> Self {
        NodeBase {
            id: id.into(),
            position: Position::default(),
            data: NodeData {
                label: label.into(),
                config,
            },
        }
    }
}

// =============================================================================
// WORKFLOW NODE: tagged union over the node types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowNode {
    // Sentinels
    #[serde(rename = "START", alias = "start")]
    Start(NodeBase<EmptyConfig>),
    #[serde(rename = "END", alias = "end")]
    End(NodeBase<EmptyConfig>),

    // Actions
    #[serde(rename = "HTTP_REQUEST", alias = "http_request")]
    HttpRequest(NodeBase<HttpRequestConfig>),
    #[serde(rename = "COMMAND", alias = "command")]
    Command(NodeBase<CommandConfig>),

    // Control Flow
    #[serde(rename = "CONDITIONAL", alias = "conditional")]
    Conditional(NodeBase<ConditionalConfig>),
    #[serde(rename = "TIMER", alias = "timer")]
    Timer(NodeBase<TimerConfig>),
    #[serde(rename = "PARALLEL", alias = "parallel")]
    Parallel(NodeBase<EmptyConfig>),
    #[serde(rename = "PARALLEL_JOIN", alias = "parallel_join")]
    ParallelJoin(NodeBase<EmptyConfig>),
}

impl WorkflowNode {
    pub fn id(&self) -> &str {
        match self {
            WorkflowNode::Start(n) => &n.id,
            WorkflowNode::End(n) => &n.id,
            WorkflowNode::HttpRequest(n) => &n.id,
            WorkflowNode::Command(n) => &n.id,
            WorkflowNode::Conditional(n) => &n.id,
            WorkflowNode::Timer(n) => &n.id,
            WorkflowNode::Parallel(n) => &n.id,
            WorkflowNode::ParallelJoin(n) => &n.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            WorkflowNode::Start(n) => &n.data.label,
            WorkflowNode::End(n) => &n.data.label,
            WorkflowNode::HttpRequest(n) => &n.data.label,
            WorkflowNode::Command(n) => &n.data.label,
            WorkflowNode::Conditional(n) => &n.data.label,
            WorkflowNode::Timer(n) => &n.data.label,
            WorkflowNode::Parallel(n) => &n.data.label,
            WorkflowNode::ParallelJoin(n) => &n.data.label,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            WorkflowNode::Start(n) => n.position,
            WorkflowNode::End(n) => n.position,
            WorkflowNode::HttpRequest(n) => n.position,
            WorkflowNode::Command(n) => n.position,
            WorkflowNode::Conditional(n) => n.position,
            WorkflowNode::Timer(n) => n.position,
            WorkflowNode::Parallel(n) => n.position,
            WorkflowNode::ParallelJoin(n) => n.position,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            WorkflowNode::Start(_) => NodeType::Start,
            WorkflowNode::End(_) => NodeType::End,
            WorkflowNode::HttpRequest(_) => NodeType::HttpRequest,
            WorkflowNode::Command(_) => NodeType::Command,
            WorkflowNode::Conditional(_) => NodeType::Conditional,
            WorkflowNode::Timer(_) => NodeType::Timer,
            WorkflowNode::Parallel(_) => NodeType::Parallel,
            WorkflowNode::ParallelJoin(_) => NodeType::ParallelJoin,
        }
    }

    /// Label shown in issue messages: the user label, else the type.
    pub fn display_label(&self) -> String {
        if !self.label().trim().is_empty() {
            self.label().to_string()
        } else {
            self.node_type().to_string()
        }
    }
}

// =============================================================================
// SHARED CONFIG TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorPolicy {
    StopOnFail,
    ContinueOnFail,
}

/// A numeric form field: the editor may send a JSON number or the raw text
/// of the input box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Numeric value of the field. Blank text reads as 0; unparsable text has
    /// no value. Non-finite values are returned as-is for the caller to reject.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) => Some(*n),
            NumericInput::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    s.parse::<f64>().ok()
                }
            }
        }
    }

    pub fn finite_value(&self) -> Option<f64> {
        self.value().filter(|v| v.is_finite())
    }
}

impl From<f64> for NumericInput {
    fn from(n: f64) -> Self {
        NumericInput::Number(n)
    }
}

// =============================================================================
// NODE CONFIGS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyConfig {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRequestConfig {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<NumericInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<NumericInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<ResponseMap>,
}

/// JSONPath-style extraction of the HTTP response into the context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMap {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommandConfig {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,
}

/// Either a free-form `condition` expression or the structured
/// `leftOperand operator rightOperand` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionalConfig {
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub left_operand: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub right_operand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<NumericInput>,
    #[serde(deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

// =============================================================================
// LENIENT FIELD READERS
// =============================================================================

/// Free-text field from any JSON value. Strings are kept as-is, other scalars
/// keep their JSON spelling (`200`, `true`) and null reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
