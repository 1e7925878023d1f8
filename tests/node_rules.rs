//! Integration tests for per-node config rules (N001–N008) and the node registry.

mod helpers;

use helpers::*;
use miniflow::parse::*;
use miniflow::registry::{self, NodeDescriptor, NodeRegistry, RuleContext};
use miniflow::validate::{self, Severity, ValidationIssue};

fn node_codes(node: &WorkflowNode) -> Vec<String> {
    registry::builtin()
        .validate_config(node, &RuleContext::detached())
        .into_iter()
        .map(|i| i.code)
        .collect()
}

fn http_with(config: HttpRequestConfig) -> WorkflowNode {
    WorkflowNode::HttpRequest(NodeBase::new("h", "Call API", config))
}

#[test]
fn http_request_rules() {
    let empty = http_with(HttpRequestConfig::default());
    assert_eq!(node_codes(&empty), vec!["N001", "N002"]);

    let blank = http_with(HttpRequestConfig {
        url: Some("   ".into()),
        method: Some("POST".into()),
        ..HttpRequestConfig::default()
    });
    assert_eq!(node_codes(&blank), vec!["N001"]);

    assert!(node_codes(&http("h", "https://x")).is_empty());
}

#[test]
fn http_timeout_must_be_positive() {
    for bad in [
        NumericInput::Number(0.0),
        NumericInput::Number(-5.0),
        NumericInput::Text("soon".into()),
        NumericInput::Text("".into()),
        NumericInput::Number(f64::INFINITY),
    ] {
        let node = http_with(HttpRequestConfig {
            url: Some("https://x".into()),
            method: Some("GET".into()),
            timeout_ms: Some(bad.clone()),
            ..HttpRequestConfig::default()
        });
        assert_eq!(node_codes(&node), vec!["N003"], "timeout {:?}", bad);
    }

    let text = http_with(HttpRequestConfig {
        url: Some("https://x".into()),
        method: Some("GET".into()),
        timeout_ms: Some(NumericInput::Text("2500".into())),
        ..HttpRequestConfig::default()
    });
    assert!(node_codes(&text).is_empty());
}

#[test]
fn http_retries_may_be_zero() {
    let zero = http_with(HttpRequestConfig {
        url: Some("https://x".into()),
        method: Some("GET".into()),
        retries: Some(NumericInput::Text(" ".into())),
        ..HttpRequestConfig::default()
    });
    assert!(node_codes(&zero).is_empty());

    let negative = http_with(HttpRequestConfig {
        url: Some("https://x".into()),
        method: Some("GET".into()),
        retries: Some(NumericInput::Number(-1.0)),
        ..HttpRequestConfig::default()
    });
    assert_eq!(node_codes(&negative), vec!["N004"]);
}

#[test]
fn conditional_needs_an_expression() {
    let none = WorkflowNode::Conditional(NodeBase::new("c", "Check", ConditionalConfig::default()));
    let issues = registry::builtin().validate_config(&none, &RuleContext::detached());
    assert_eq!(issues[0].code, "N005");
    assert_eq!(issues[0].message, "CONDITIONAL \"Check\" has no condition");

    let structured = WorkflowNode::Conditional(NodeBase::new(
        "c",
        "Check",
        ConditionalConfig {
            left_operand: Some("status".into()),
            operator: Some("==".into()),
            ..ConditionalConfig::default()
        },
    ));
    assert!(!node_codes(&structured).contains(&"N005".to_string()));

    let half = WorkflowNode::Conditional(NodeBase::new(
        "c",
        "Check",
        ConditionalConfig {
            left_operand: Some("status".into()),
            ..ConditionalConfig::default()
        },
    ));
    assert!(node_codes(&half).contains(&"N005".to_string()));
}

fn conditional_branches(handles: &[&str]) -> Vec<ValidationIssue> {
    let mut nodes = vec![start("s"), conditional("c", "x"), end("e")];
    let mut edges = vec![edge("s", "c")];
    for (i, handle) in handles.iter().enumerate() {
        let target = format!("t{i}");
        nodes.push(command(&target, "x"));
        edges.push(branch("c", &target, handle));
        edges.push(edge(&target, "e"));
    }
    let wf = workflow(nodes, edges);
    let graph = WorkflowGraph::build(&wf);
    validate::validate_node(&wf.nodes[1], &graph, registry::builtin())
}

#[test]
fn conditional_needs_true_and_false() {
    assert!(conditional_branches(&["true", "false"]).is_empty());
    assert!(conditional_branches(&["FALSE", " True "]).is_empty());

    for handles in [
        &["true", "true"][..],
        &["true"][..],
        &["false", "no"][..],
        &["true", "false", "false"][..],
        &[][..],
    ] {
        let issues = conditional_branches(handles);
        assert_eq!(issues.len(), 1, "handles {:?}", handles);
        assert_eq!(issues[0].code, "N006");
        assert_eq!(issues[0].node_id.as_deref(), Some("c"));
    }
}

#[test]
fn conditional_against_a_bare_edge_list() {
    let node = conditional("c", "x > 1");
    let edges = vec![
        edge("start", "c"),
        branch("c", "yes", "true"),
        branch("c", "missing", "false"),
    ];
    let ctx = RuleContext::from_edges("c", &edges);
    let targets: Vec<&str> = ctx.outgoing.iter().map(|e| e.target).collect();
    assert_eq!(targets, vec!["yes", "missing"]);
    assert!(validate::validate_node_with_edges(&node, &edges, registry::builtin()).is_empty());

    let one_branch = vec![branch("c", "yes", "true")];
    let codes: Vec<String> = validate::validate_node_with_edges(&node, &one_branch, registry::builtin())
        .into_iter()
        .map(|i| i.code)
        .collect();
    assert_eq!(codes, vec!["N006"]);
}

#[test]
fn explicit_edge_label_overrides_handle() {
    let wf = workflow(
        vec![start("s"), conditional("c", "x"), command("a", "x"), command("b", "x"), end("e")],
        vec![
            edge("s", "c"),
            WorkflowEdge {
                label: Some("TRUE".into()),
                ..branch("c", "a", "false")
            },
            branch("c", "b", "false"),
            edge("a", "e"),
            edge("b", "e"),
        ],
    );
    let report = validate::validate(&wf);
    assert!(report.is_valid(), "{:?}", report.issues());
}

#[test]
fn command_rules() {
    assert_eq!(node_codes(&command("c", "  ")), vec!["N007"]);
    assert!(node_codes(&command("c", "ls -la")).is_empty());
    assert_eq!(node_codes(&command("c", "python3 -u")), vec!["N008"]);
    assert_eq!(node_codes(&command("c", "PYTHON")), vec!["N008"]);

    let with_script = WorkflowNode::Command(NodeBase::new(
        "c",
        "Run",
        CommandConfig {
            command: Some("python".into()),
            script_path: Some("/opt/job.py".into()),
            ..CommandConfig::default()
        },
    ));
    assert!(node_codes(&with_script).is_empty());
}

#[test]
fn config_issues_are_errors_tagged_to_the_node() {
    let report = validate::validate(&chain(vec![command("job", "")]));
    let issue = report.issues().iter().find(|i| i.code == "N007").expect("N007");
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.node_id.as_deref(), Some("job"));
    assert_eq!(issue.message, "COMMAND \"job\" has no command");
    assert!(!report.is_valid());
}

#[test]
fn rule_free_types_never_fail() {
    for node in [start("s"), end("e"), timer("t"), parallel("p"), join("j")] {
        assert!(node_codes(&node).is_empty(), "{:?}", node.node_type());
    }
}

#[test]
fn default_nodes() {
    let registry = registry::builtin();
    let http = registry
        .make_node(NodeType::HttpRequest, "h-1", None, Position { x: 1.0, y: 2.0 })
        .unwrap();
    assert_eq!(http.label(), "HTTP_REQUEST");
    let WorkflowNode::HttpRequest(h) = &http else {
        panic!("expected HTTP_REQUEST");
    };
    assert_eq!(h.data.config.method.as_deref(), Some("GET"));
    assert_eq!(h.data.config.url.as_deref(), Some("https://api.example.com/data"));
    assert_eq!(h.data.config.timeout_ms, Some(NumericInput::Number(5000.0)));
    assert_eq!(h.data.config.error_policy, Some(ErrorPolicy::StopOnFail));
    assert!(node_codes(&http).is_empty());

    let start = registry
        .make_node(NodeType::Start, "s", Some("  "), Position::default())
        .unwrap();
    assert_eq!(start.label(), "Start");
    let end = registry
        .make_node(NodeType::End, "e", Some("Done"), Position::default())
        .unwrap();
    assert_eq!(end.label(), "Done");

    let cmd = registry
        .make_node(NodeType::Command, "c", None, Position::default())
        .unwrap();
    assert_eq!(node_codes(&cmd), vec!["N007"]);

    let timer = registry
        .make_node(NodeType::Timer, "t", None, Position::default())
        .unwrap();
    let WorkflowNode::Timer(t) = &timer else {
        panic!("expected TIMER");
    };
    assert_eq!(t.data.config.delay, Some(NumericInput::Number(3.0)));
    assert_eq!(t.data.config.unit.as_deref(), Some("s"));
}

#[test]
fn every_builtin_type_is_registered() {
    for node_type in NodeType::ALL {
        let descriptor = registry::builtin().get(node_type).expect("registered");
        assert_eq!(descriptor.node_type, node_type);
    }
}

fn forbid_timer_without_unit(node: &WorkflowNode, _ctx: &RuleContext<'_>) -> Vec<ValidationIssue> {
    match node {
        WorkflowNode::Timer(t) if t.data.config.unit.is_none() => vec![ValidationIssue::error(
            "X001",
            "TIMER needs a unit",
            Some(node.id().to_string()),
        )],
        _ => vec![],
    }
}

#[test]
fn custom_registry_replaces_a_rule() {
    let mut custom = NodeRegistry::builtin();
    let timer_descriptor = custom.get(NodeType::Timer).cloned().unwrap();
    custom.register(NodeDescriptor {
        validate: forbid_timer_without_unit,
        ..timer_descriptor
    });

    let wf = chain(vec![timer("wait")]);
    assert!(validate::validate(&wf).is_valid());
    let report = validate::validate_with(&wf, &custom);
    assert!(has_code(&report, "X001"));
    assert!(!report.is_valid());
}

#[test]
fn empty_registry_has_no_config_rules() {
    let wf = chain(vec![command("job", "")]);
    let report = validate::validate_with(&wf, &NodeRegistry::new());
    assert!(report.is_valid());
    assert!(report.issues().is_empty());
}
