//! Integration tests for rebuilding execution steps from engine stdout.

use std::collections::HashMap;

use miniflow::parse;
use miniflow::trace::{
    self, ExecutionStep, NodeLabelLookup, StepStatus, TraceParser, TraceProtocol,
};
use serde_json::json;

const STDOUT: &str = include_str!("fixtures/engine_stdout.txt");

fn no_labels() -> HashMap<String, String> {
    HashMap::new()
}

fn fixture_nodes() -> Vec<miniflow::parse::WorkflowNode> {
    parse::parse(include_str!("fixtures/linear_workflow.json"))
        .expect("Should parse")
        .nodes
}

#[test]
fn single_node_block() {
    let stdout = "\
[JAVA-STDOUT]: [n1] Nodo: n1 [COMMAND]
[JAVA-STDOUT]: [n1]    -> INPUT DATA: {}
[JAVA-STDOUT]: [n1]    OUTPUT DATA -->: {\"ok\":true}
[JAVA-STDOUT]: [n1]    DURATION -->: 12ms
";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps.len(), 1);
    let step = &steps[0];
    assert_eq!(step.node_id, "n1");
    assert_eq!(step.node_type, "COMMAND");
    assert_eq!(step.status, StepStatus::Success);
    assert_eq!(step.input_data, Some(json!({})));
    assert_eq!(step.output_data, Some(json!({"ok": true})));
    assert_eq!(step.duration_ms, 12);
    assert_eq!(step.error, None);
    assert_eq!(step.config_data, None);
}

#[test]
fn error_marker_fails_the_step() {
    let stdout = "\
[JAVA-STDOUT]: [w] Nodo: w [COMMAND]
[JAVA-STDOUT]: [w]    Resultado: ERROR --> disk full
";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps[0].status, StepStatus::Error);
    assert_eq!(steps[0].error.as_deref(), Some("disk full"));
}

#[test]
fn error_marker_without_message_uses_fallback() {
    let stdout = "[JAVA-STDOUT]: [w] Nodo: w [COMMAND]\n[JAVA-STDOUT]: [w] Resultado: ERROR -->   \n";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps[0].error.as_deref(), Some("Execution error"));

    let protocol = TraceProtocol {
        fallback_error: "Error en ejecución".into(),
        ..TraceProtocol::default()
    };
    let steps = trace::parse_trace_with(stdout, &no_labels(), protocol).steps;
    assert_eq!(steps[0].error.as_deref(), Some("Error en ejecución"));
}

#[test]
fn full_engine_run() {
    let nodes = fixture_nodes();
    let trace = trace::parse_trace(STDOUT, &nodes);
    let ids: Vec<&str> = trace.steps.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["start-1", "http-1", "cmd-1", "end-1"]);

    let http = &trace.steps[1];
    assert_eq!(http.node_label, "Fetch orders");
    assert_eq!(http.node_type, "HTTP_REQUEST");
    assert_eq!(
        http.config_data,
        Some(json!({"method": "GET", "url": "https://api.example.com/orders"}))
    );
    assert_eq!(http.output_data, Some(json!({"status": 200, "data": {"count": 3}})));
    assert_eq!(http.details, Some(json!({"attempts": 1})));
    assert_eq!(http.duration_ms, 245);
    assert_eq!(http.status, StepStatus::Success);

    let cmd = &trace.steps[2];
    assert_eq!(cmd.status, StepStatus::Error);
    assert_eq!(cmd.error.as_deref(), Some("exit status 2: disk full"));
    assert_eq!(cmd.input_data, Some(json!({"status": 200})));
    assert_eq!(cmd.config_data, None, "non-JSON config degrades to null");
    assert_eq!(cmd.duration_ms, 31);

    let end = &trace.steps[3];
    assert_eq!(end.node_label, "Nodo", "blank workflow label falls back");
    assert_eq!(end.input_data, Some(json!({})));

    let completion = trace.completion.expect("finished event");
    assert_eq!(completion.status, "FAILED");
    assert_eq!(completion.duration, Some(290));
}

#[test]
fn untagged_lines_never_touch_steps() {
    let stdout = "\
[JAVA-STDOUT]: Iniciando: demo
Nodo: n1 [COMMAND]
[n1] Nodo: n1 [COMMAND]
[JAVA-STDOUT]:    OUTPUT DATA -->: {\"x\": 1}
   DURATION -->: 99ms
";
    let trace = trace::parse_trace(stdout, &no_labels());
    assert!(trace.steps.is_empty());
    assert!(trace.completion.is_none());
}

#[test]
fn markers_before_init_line_are_dropped() {
    let stdout = "\
[JAVA-STDOUT]: [n1]    -> INPUT DATA: {\"early\": true}
[JAVA-STDOUT]: [n1] Nodo: n1 [TIMER]
[JAVA-STDOUT]: [n1]    OUTPUT DATA -->: {\"late\": true}
";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].input_data, None);
    assert_eq!(steps[0].output_data, Some(json!({"late": true})));
}

#[test]
fn repeated_init_line_keeps_one_step() {
    let stdout = "\
[JAVA-STDOUT]: [n1] Nodo: n1 [COMMAND]
[JAVA-STDOUT]: [n1]    DURATION -->: 5ms
[JAVA-STDOUT]: [n1] Nodo: n1 [COMMAND]
";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].duration_ms, 5);
}

#[test]
fn interleaved_parallel_branches() {
    let stdout = "\
[JAVA-STDOUT]: [a] Nodo: a [COMMAND]
[JAVA-STDOUT]: [b] Nodo: b [COMMAND]
[JAVA-STDOUT]: [b]    OUTPUT DATA -->: {\"branch\": \"b\"}
[JAVA-STDOUT]: [a]    OUTPUT DATA -->: {\"branch\": \"a\"}
[JAVA-STDOUT]: [a]    DURATION -->: 7ms
[JAVA-STDOUT]: [b]    Resultado: ERROR --> timeout
";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps[0].node_id, "a");
    assert_eq!(steps[0].output_data, Some(json!({"branch": "a"})));
    assert_eq!(steps[0].duration_ms, 7);
    assert_eq!(steps[0].status, StepStatus::Success);
    assert_eq!(steps[1].output_data, Some(json!({"branch": "b"})));
    assert_eq!(steps[1].status, StepStatus::Error);
}

#[test]
fn crlf_line_endings() {
    let stdout = "[JAVA-STDOUT]: [n1] Nodo: n1 [END]\r\n[JAVA-STDOUT]: [n1] -> INPUT DATA: {\"a\": 1}\r\n";
    let steps = trace::parse_trace(stdout, &no_labels()).steps;
    assert_eq!(steps[0].node_type, "END");
    assert_eq!(steps[0].input_data, Some(json!({"a": 1})));
}

#[test]
fn chunked_feed_matches_full_parse() {
    let nodes = fixture_nodes();
    let expected = trace::parse_trace(STDOUT, &nodes);

    for chunk_size in [1, 2, 7, 64, 1000] {
        let mut parser = TraceParser::new(&nodes);
        let bytes = STDOUT.as_bytes();
        let mut offset = 0;
        while offset < bytes.len() {
            let mut end = (offset + chunk_size).min(bytes.len());
            while !STDOUT.is_char_boundary(end) {
                end += 1;
            }
            parser.feed(&STDOUT[offset..end]);
            offset = end;
        }
        assert_eq!(parser.finish(), expected, "chunk size {}", chunk_size);
    }
}

#[test]
fn partial_line_waits_for_finish() {
    let labels = no_labels();
    let mut parser = TraceParser::new(&labels);
    parser.feed("[JAVA-STDOUT]: [n1] Nodo: n1 [COMMAND]\n[JAVA-STDOUT]: [n1] DURATION -->: 4");
    assert_eq!(parser.steps().len(), 1);
    assert_eq!(parser.steps()[0].duration_ms, 0);

    parser.feed("2ms");
    let trace = parser.finish();
    assert_eq!(trace.steps[0].duration_ms, 42);
}

#[test]
fn streaming_parser_sees_completion() {
    let labels = no_labels();
    let mut parser = TraceParser::new(&labels);
    assert!(parser.completion().is_none());
    parser.feed("{\"event\": \"WORKFLOW_FINISHED\", \"status\": \"SUCCESS\", \"duration\": 8}\n");
    assert!(parser.completion().is_some_and(|c| c.is_success()));
}

#[test]
fn detect_completion_in_chunk() {
    let event = trace::detect_completion(STDOUT).expect("event");
    assert!(!event.is_success());
    assert_eq!(event.duration, Some(290));
    assert!(trace::detect_completion("[JAVA-STDOUT]: Estado final: EXITOSO\n").is_none());
}

#[test]
fn custom_engine_tag() {
    let protocol: TraceProtocol =
        serde_json::from_str(r#"{"engineTag": "[ENGINE]", "fallbackLabel": "Step"}"#).unwrap();
    let stdout = "[ENGINE] [x] Nodo: x [TIMER]\n[JAVA-STDOUT]: [y] Nodo: y [TIMER]\n";
    let steps = trace::parse_trace_with(stdout, &no_labels(), protocol).steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].node_id, "x");
    assert_eq!(steps[0].node_label, "Step");
}

#[test]
fn label_lookup_sources() {
    let nodes = fixture_nodes();
    assert_eq!(nodes.node_label("http-1"), Some("Fetch orders"));
    assert_eq!(nodes.node_label("end-1"), None);
    assert_eq!(nodes.node_label("missing"), None);

    let mut map = HashMap::new();
    map.insert("a".to_string(), "Alpha".to_string());
    map.insert("b".to_string(), " ".to_string());
    assert_eq!(map.node_label("a"), Some("Alpha"));
    assert_eq!(map.node_label("b"), None);
}

#[test]
fn step_serializes_camel_case() {
    let mut step = ExecutionStep::new("n1", "COMMAND", "Run");
    step.duration_ms = 3;
    let value = serde_json::to_value(&step).unwrap();
    assert_eq!(
        value,
        json!({
            "nodeId": "n1",
            "nodeType": "COMMAND",
            "nodeLabel": "Run",
            "status": "SUCCESS",
            "durationMs": 3,
            "inputData": null,
            "configData": null,
            "outputData": null,
            "details": null
        })
    );
}
