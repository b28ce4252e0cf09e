use filelist::mcp::{default_method_table, StdioExit, StdioServer};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

async fn run_session(input: &str) -> (StdioExit, Vec<Value>) {
    let server = StdioServer::new(Arc::new(default_method_table()));
    let mut output = Vec::new();
    let exit = server.run_with(input.as_bytes(), &mut output).await.unwrap();
    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (exit, responses)
}

fn frame(value: Value) -> String {
    format!("{}\n", value)
}

#[tokio::test]
async fn test_full_lifecycle() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("file.txt"), "some test data").unwrap();
    let output = dir.path().join("catalog.tsv");
    let params = json!({
        "target_dir": source.to_str().unwrap(),
        "output_file": output.to_str().unwrap(),
    });

    let mut input = String::new();
    let create = |id: u32| {
        frame(json!({"jsonrpc": "2.0", "method": "catalog/create", "params": params, "id": id}))
    };
    input.push_str(&frame(json!({
        "jsonrpc": "2.0",
        "method": "initialize",
        "params": {"capabilities": {}},
        "id": 1
    })));
    input.push_str(&create(2));
    input.push_str(&create(3));
    input.push_str(&frame(json!({"jsonrpc": "2.0", "method": "shutdown", "params": null})));
    input.push_str(&frame(json!({"jsonrpc": "2.0", "method": "exit", "params": null})));
    input.push_str(&frame(json!({"jsonrpc": "2.0", "method": "initialize", "id": 4})));

    let (exit, responses) = run_session(&input).await;
    assert_eq!(exit, StdioExit::ExitRequested);
    assert_eq!(responses.len(), 3, "notifications and post-exit frames get no reply");

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["capabilities"]["tools"][0]["name"], "catalog/create");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["status"], "success");
    assert_eq!(responses[2]["id"], 3);
    assert_eq!(responses[2]["error"]["code"], 1001);
    assert!(output.exists());
}

#[tokio::test]
async fn test_parse_error_does_not_stop_loop() {
    let mut input = String::from("this is not json\n");
    input.push_str(&frame(json!({"jsonrpc": "2.0", "method": "initialize", "id": 9})));

    let (exit, responses) = run_session(&input).await;
    assert_eq!(exit, StdioExit::EndOfInput);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 9);
}

#[tokio::test]
async fn test_end_of_input_without_exit() {
    let (exit, responses) = run_session("").await;
    assert_eq!(exit, StdioExit::EndOfInput);
    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_blank_lines_are_skipped() {
    let initialize = frame(json!({"jsonrpc": "2.0", "method": "initialize", "id": 1}));
    let input = format!("\n   \n{}", initialize);
    let (_, responses) = run_session(&input).await;
    assert_eq!(responses.len(), 1);
}

#[tokio::test]
async fn test_last_line_without_newline() {
    let input = json!({"jsonrpc": "2.0", "method": "initialize", "id": 1}).to_string();
    let (exit, responses) = run_session(&input).await;
    assert_eq!(exit, StdioExit::EndOfInput);
    assert_eq!(responses.len(), 1);
}

#[tokio::test]
async fn test_invalid_utf8_is_parse_error() {
    let server = StdioServer::new(Arc::new(default_method_table()));
    let input: &[u8] = b"\xff\xfe\n";
    let mut output = Vec::new();
    server.run_with(input, &mut output).await.unwrap();

    let text = String::from_utf8(output).unwrap();
    let response: Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn test_exit_with_id_is_answered_before_stopping() {
    let mut input = frame(json!({"jsonrpc": "2.0", "method": "exit", "id": 7}));
    input.push_str(&frame(json!({"jsonrpc": "2.0", "method": "initialize", "id": 8})));

    let (exit, responses) = run_session(&input).await;
    assert_eq!(exit, StdioExit::ExitRequested);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 7);
    assert_eq!(responses[0]["result"], Value::Null);
}
