//! Node-type registry: per-type config rules and default-node factories.
//!
//! Adding a node type means registering a descriptor; the validator and the
//! editor bridge look types up here instead of matching on them.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::*;
use crate::validate::node_rules;
use crate::validate::report::ValidationIssue;

/// An outgoing edge as seen by a config rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingEdge<'a> {
    pub target: &'a str,
    pub source_handle: Option<&'a str>,
    pub label: Option<&'a str>,
}

impl OutgoingEdge<'_> {
    pub fn branch_label(&self) -> String {
        branch_label(self.label, self.source_handle)
    }
}

/// Graph facts a config rule may look at.
pub struct RuleContext<'a> {
    /// Outgoing edges of the node being checked, in declaration order.
    pub outgoing: Vec<OutgoingEdge<'a>>,
}

impl<'a> RuleContext<'a> {
    /// Outgoing edges the graph could resolve.
    pub fn for_node(node: &WorkflowNode, graph: &'a WorkflowGraph) -> Self {
        RuleContext {
            outgoing: graph
                .successors(node.id())
                .into_iter()
                .map(|(target, edge)| OutgoingEdge {
                    target,
                    source_handle: edge.source_handle.as_deref(),
                    label: edge.label.as_deref(),
                })
                .collect(),
        }
    }

    /// Every edge in `edges` leaving `node_id`, whether or not its target
    /// exists. Used when a node is checked without building a graph.
    pub fn from_edges(node_id: &str, edges: &'a [WorkflowEdge]) -> Self {
        RuleContext {
            outgoing: edges
                .iter()
                .filter(|e| e.source == node_id)
                .map(|e| OutgoingEdge {
                    target: &e.target,
                    source_handle: e.source_handle.as_deref(),
                    label: e.label.as_deref(),
                })
                .collect(),
        }
    }

    /// Context for a node checked on its own, without any edges.
    pub fn detached() -> Self {
        RuleContext { outgoing: vec![] }
    }
}

pub type ConfigRule = fn(&WorkflowNode, &RuleContext<'_>) -> Vec<ValidationIssue>;

/// Builds a fresh node of this type with its default config.
pub type NodeFactory = fn(id: String, label: String, position: Position) -> WorkflowNode;

#[derive(Clone)]
pub struct NodeDescriptor {
    pub node_type: NodeType,
    pub default_label: &'static str,
    pub validate: ConfigRule,
    pub create: NodeFactory,
}

#[derive(Clone, Default)]
pub struct NodeRegistry {
    descriptors: HashMap<NodeType, NodeDescriptor>,
}

static BUILTIN: LazyLock<NodeRegistry> = LazyLock::new(NodeRegistry::builtin);

/// Shared registry with the built-in node types.
pub fn builtin() -> &'static NodeRegistry {
    &BUILTIN
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(NodeDescriptor {
            node_type: NodeType::Start,
            default_label: "Start",
            validate: node_rules::no_rules,
            create: |id, label, position| WorkflowNode::Start(base(id, label, position, EmptyConfig {})),
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::End,
            default_label: "End",
            validate: node_rules::no_rules,
            create: |id, label, position| WorkflowNode::End(base(id, label, position, EmptyConfig {})),
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::HttpRequest,
            default_label: "HTTP_REQUEST",
            validate: node_rules::http_request,
            create: |id, label, position| {
                WorkflowNode::HttpRequest(base(id, label, position, default_http_request()))
            },
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::Command,
            default_label: "COMMAND",
            validate: node_rules::command,
            create: |id, label, position| {
                WorkflowNode::Command(base(id, label, position, default_command()))
            },
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::Conditional,
            default_label: "CONDITIONAL",
            validate: node_rules::conditional,
            create: |id, label, position| {
                WorkflowNode::Conditional(base(id, label, position, default_conditional()))
            },
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::Timer,
            default_label: "TIMER",
            validate: node_rules::no_rules,
            create: |id, label, position| WorkflowNode::Timer(base(id, label, position, default_timer())),
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::Parallel,
            default_label: "PARALLEL",
            validate: node_rules::no_rules,
            create: |id, label, position| {
                WorkflowNode::Parallel(base(id, label, position, EmptyConfig {}))
            },
        });
        registry.register(NodeDescriptor {
            node_type: NodeType::ParallelJoin,
            default_label: "PARALLEL_JOIN",
            validate: node_rules::no_rules,
            create: |id, label, position| {
                WorkflowNode::ParallelJoin(base(id, label, position, EmptyConfig {}))
            },
        });

        registry
    }

    /// Add a descriptor, replacing any previous one for the same type.
    pub fn register(&mut self, descriptor: NodeDescriptor) {
        self.descriptors.insert(descriptor.node_type, descriptor);
    }

    pub fn get(&self, node_type: NodeType) -> Option<&NodeDescriptor> {
        self.descriptors.get(&node_type)
    }

    /// Run the config rule registered for the node's type. Unregistered
    /// types have no rules.
    pub fn validate_config(&self, node: &WorkflowNode, ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
        match self.get(node.node_type()) {
            Some(descriptor) => (descriptor.validate)(node, ctx),
            None => vec![],
        }
    }

    /// New node with the type's default config. A blank label falls back to
    /// the type's default label.
    pub fn make_node(
        &self,
        node_type: NodeType,
        id: impl Into<String>,
        label: Option<&str>,
        position: Position,
    ) -> Option<WorkflowNode> {
        let descriptor = self.get(node_type)?;
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(descriptor.default_label)
            .to_string();
        Some((descriptor.create)(id.into(), label, position))
    }
}

fn base<C>(id: String, label: String, position: Position, config: C) -> NodeBase<C> {
    NodeBase {
        id,
        position,
        data: NodeData { label, config },
    }
}

// =============================================================================
// DEFAULT CONFIGS
// =============================================================================

fn default_http_request() -> HttpRequestConfig {
    HttpRequestConfig {
        method: Some("GET".into()),
        url: Some("https://api.example.com/data".into()),
        timeout_ms: Some(NumericInput::Number(5000.0)),
        retries: Some(NumericInput::Number(3.0)),
        error_policy: Some(ErrorPolicy::StopOnFail),
        map: Some(ResponseMap {
            status: Some("$.status".into()),
            payload: Some("$.data".into()),
        }),
    }
}

fn default_command() -> CommandConfig {
    CommandConfig {
        command: Some(String::new()),
        args: Some(String::new()),
        error_policy: Some(ErrorPolicy::StopOnFail),
        ..CommandConfig::default()
    }
}

fn default_conditional() -> ConditionalConfig {
    ConditionalConfig {
        condition: Some("context.status == 200".into()),
        error_policy: Some(ErrorPolicy::StopOnFail),
        ..ConditionalConfig::default()
    }
}

fn default_timer() -> TimerConfig {
    TimerConfig {
        delay: Some(NumericInput::Number(3.0)),
        unit: Some("s".into()),
    }
}
