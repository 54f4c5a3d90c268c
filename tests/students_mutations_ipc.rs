use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn spawn_store(doc: PathBuf) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind store");
    let addr = server.server_addr().to_ip().expect("store addr");
    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let response = match *request.method() {
                tiny_http::Method::Get => match std::fs::read(&doc) {
                    Ok(bytes) => tiny_http::Response::from_data(bytes),
                    Err(e) => tiny_http::Response::from_string(format!("read failed: {e}"))
                        .with_status_code(500),
                },
                tiny_http::Method::Post => {
                    let mut body = Vec::new();
                    request
                        .as_reader()
                        .read_to_end(&mut body)
                        .expect("read save body");
                    std::fs::write(&doc, &body).expect("overwrite doc");
                    tiny_http::Response::from_string("OK")
                }
                _ => tiny_http::Response::from_string("Method Not Allowed").with_status_code(405),
            };
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}/students.xml")
}

fn raw_request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = raw_request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = raw_request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
        .to_string()
}

fn listed_ids(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
) -> Vec<String> {
    let result = request_ok(stdin, reader, id, "roster.list", json!({}));
    result
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students array")
        .iter()
        .map(|s| {
            s.get("id")
                .and_then(|v| v.as_str())
                .expect("student id")
                .to_string()
        })
        .collect()
}

#[test]
fn add_synthesizes_next_id_and_persists_full_document() {
    let workspace = temp_dir("roster-add");
    let doc = workspace.join("students.xml");
    std::fs::copy(fixture_path("fixtures/students.xml"), &doc).expect("copy fixture");
    let url = spawn_store(doc.clone());

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "store.select",
        json!({ "url": url, "saveUrl": url }),
    );
    let loaded = request_ok(&mut stdin, &mut reader, "2", "roster.load", json!({}));
    assert_eq!(loaded.get("students").and_then(|v| v.as_u64()), Some(7));

    // Max existing id is S007, so the new student gets S008.
    let added = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.add",
        json!({ "name": "Ada", "course": "Math101", "grade": 92 }),
    );
    assert_eq!(
        added
            .get("student")
            .and_then(|s| s.get("id"))
            .and_then(|v| v.as_str()),
        Some("S008")
    );
    assert_eq!(added.get("save").and_then(|s| s.get("state")).and_then(|v| v.as_str()), Some("saving"));

    let waited = request_ok(&mut stdin, &mut reader, "4", "save.wait", json!({}));
    assert_eq!(waited.get("state").and_then(|v| v.as_str()), Some("succeeded"));

    // The stored document was overwritten with the full re-serialized tree.
    let stored = std::fs::read_to_string(&doc).expect("read stored doc");
    assert!(stored.contains("S008"));
    assert!(stored.contains("Ada"));
    assert!(stored.contains("S001"), "existing entries retransmitted");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn add_rejects_bad_inputs_before_mutating() {
    let workspace = temp_dir("roster-add-invalid");
    let doc = workspace.join("students.xml");
    std::fs::copy(fixture_path("fixtures/students.xml"), &doc).expect("copy fixture");
    let url = spawn_store(doc);

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "store.select",
        json!({ "url": url, "saveUrl": url }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "roster.load", json!({}));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "3",
        "students.add",
        json!({ "name": "", "course": "Math101", "grade": 50 }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "4",
        "students.add",
        json!({ "name": "Ada", "course": "Math101" }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "students.add",
        json!({ "name": "Ada", "course": "Math101", "grade": 101 }),
    );
    assert_eq!(code, "bad_params");

    // Nothing was applied.
    assert_eq!(listed_ids(&mut stdin, &mut reader, "6").len(), 7);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn update_grade_validates_at_entry_point_and_applies_in_range() {
    let workspace = temp_dir("roster-update");
    let doc = workspace.join("students.xml");
    std::fs::copy(fixture_path("fixtures/students.xml"), &doc).expect("copy fixture");
    let url = spawn_store(doc);

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "store.select",
        json!({ "url": url, "saveUrl": url }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "roster.load", json!({}));

    // Out of range is rejected before any mutation.
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "3",
        "students.updateGrade",
        json!({ "id": "S002", "grade": 150 }),
    );
    assert_eq!(code, "bad_params");

    let table = request_ok(&mut stdin, &mut reader, "4", "view.table", json!({}));
    let s002 = table
        .get("rows")
        .and_then(|v| v.as_array())
        .expect("rows")
        .iter()
        .find(|r| r.get("id").and_then(|v| v.as_str()) == Some("S002"))
        .cloned()
        .expect("S002 row");
    assert_eq!(s002.get("grade").and_then(|v| v.as_f64()), Some(78.0));

    // In range applies and shows up in the table immediately.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.updateGrade",
        json!({ "id": "S002", "grade": 81 }),
    );
    let row = updated
        .get("table")
        .and_then(|t| t.get("rows"))
        .and_then(|v| v.as_array())
        .expect("rows")
        .iter()
        .find(|r| r.get("id").and_then(|v| v.as_str()) == Some("S002"))
        .cloned()
        .expect("S002 row");
    assert_eq!(row.get("grade").and_then(|v| v.as_f64()), Some(81.0));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "students.updateGrade",
        json!({ "id": "S999", "grade": 50 }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn delete_removes_exactly_one_and_keeps_order() {
    let workspace = temp_dir("roster-delete");
    let doc = workspace.join("students.xml");
    std::fs::copy(fixture_path("fixtures/students.xml"), &doc).expect("copy fixture");
    let url = spawn_store(doc.clone());

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "store.select",
        json!({ "url": url, "saveUrl": url }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "roster.load", json!({}));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "id": "S003" }),
    );
    assert_eq!(
        listed_ids(&mut stdin, &mut reader, "4"),
        ["S001", "S002", "S004", "S005", "S006", "S007"]
    );

    // A second delete of the same id finds nothing.
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "students.delete",
        json!({ "id": "S003" }),
    );
    assert_eq!(code, "not_found");

    let waited = request_ok(&mut stdin, &mut reader, "6", "save.wait", json!({}));
    assert_eq!(waited.get("state").and_then(|v| v.as_str()), Some("succeeded"));
    let stored = std::fs::read_to_string(&doc).expect("read stored doc");
    assert!(!stored.contains("S003"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
