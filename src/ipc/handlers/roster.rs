use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::xml;
use serde_json::json;

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_store", "select a document store first", None);
    };

    // On any failure the previously loaded roster is kept; the view stays
    // stale until a later load succeeds.
    let text = match store.fetch() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "load_failed", format!("{e:#}"), None),
    };
    let roster = match xml::parse(&text) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "parse_failed", format!("{e:#}"), None),
    };

    let students = roster.len();
    state.roster = Some(roster);
    ok(&req.id, json!({ "students": students }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load the roster first", None);
    };
    let students: Vec<serde_json::Value> = roster
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.name,
                "course": s.course,
                "grade": s.grade,
            })
        })
        .collect();
    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        // Reload is a wholesale replacement, same as the first load.
        "roster.load" | "roster.reload" => Some(handle_load(state, req)),
        "roster.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
