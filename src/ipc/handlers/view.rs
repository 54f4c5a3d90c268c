use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::view;
use serde_json::json;

/// Table payload shared by every handler that answers with the refreshed
/// view: all filtered rows (capped ones flagged `hidden`) plus counts.
pub(crate) fn table_json(state: &AppState) -> serde_json::Value {
    let rows = match state.roster.as_ref() {
        Some(roster) => view::visible_rows(roster, &state.filters, state.showing_all),
        None => Vec::new(),
    };
    let visible = rows.iter().filter(|r| !r.hidden).count();
    json!({
        "rows": rows
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "name": r.name,
                    "course": r.course,
                    "grade": r.grade,
                    "hidden": r.hidden,
                })
            })
            .collect::<Vec<_>>(),
        "visible": visible,
        "matched": rows.len(),
        "showingAll": state.showing_all,
    })
}

fn handle_table(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.roster.is_none() {
        return err(&req.id, "no_roster", "load the roster first", None);
    }
    ok(&req.id, table_json(state))
}

fn handle_courses(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load the roster first", None);
    };
    ok(&req.id, json!({ "courses": roster.courses() }))
}

fn handle_filters_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.roster.is_none() {
        return err(&req.id, "no_roster", "load the roster first", None);
    }

    // Partial update: absent params leave the corresponding filter alone.
    if let Some(v) = req.params.get("search").and_then(|v| v.as_str()) {
        state.filters.search = v.trim().to_string();
    }
    if let Some(v) = req.params.get("course").and_then(|v| v.as_str()) {
        state.filters.course = if v == "all" {
            None
        } else {
            Some(v.to_string())
        };
    }
    if let Some(v) = req.params.get("honorOnly").and_then(|v| v.as_bool()) {
        state.filters.honor_only = v;
    }

    ok(&req.id, table_json(state))
}

fn handle_toggle_show_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.roster.is_none() {
        return err(&req.id, "no_roster", "load the roster first", None);
    }
    state.showing_all = !state.showing_all;
    ok(&req.id, table_json(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "view.table" => Some(handle_table(state, req)),
        "view.courses" => Some(handle_courses(state, req)),
        "view.toggleShowAll" => Some(handle_toggle_show_all(state, req)),
        "filters.set" => Some(handle_filters_set(state, req)),
        _ => None,
    }
}
