use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::SaveStatus;
use crate::xml;
use serde_json::json;

/// Serializes the full tree and hands it to the save thread. Mutation
/// handlers call this after applying their edit; the request never waits for
/// the save to settle, and a failed save never rolls the edit back.
pub(crate) fn submit_save(state: &mut AppState) -> serde_json::Value {
    submit_save_inner(state, false)
}

fn submit_save_inner(state: &mut AppState, force: bool) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return json!({ "state": "disabled", "reason": "no store selected" });
    };
    if !store.config().persist && !force {
        return json!({ "state": "disabled", "reason": "persistence disabled" });
    }
    let Some(roster) = state.roster.as_ref() else {
        return json!({ "state": "disabled", "reason": "no roster loaded" });
    };

    let body = match xml::serialize(roster) {
        Ok(v) => v,
        Err(e) => return json!({ "state": "failed", "reason": format!("{e:#}") }),
    };
    let seq = state.saver.submit(store, body);
    json!({ "state": "saving", "seq": seq })
}

fn status_json(status: &SaveStatus) -> serde_json::Value {
    let mut v = json!({
        "state": status.phase.as_str(),
        "submitted": status.submitted,
        "settled": status.settled,
        "lastAttemptAt": status.last_attempt_at,
        "lastSettledAt": status.last_settled_at,
    });
    if let Some(outcome) = &status.last_outcome {
        v["lastOutcome"] = json!({
            "code": outcome.code(),
            "message": outcome.message(),
        });
    }
    v
}

fn handle_save_now(state: &mut AppState, req: &Request) -> serde_json::Value {
    let force = req
        .params
        .get("force")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if state.roster.is_none() {
        return err(&req.id, "no_roster", "no roster loaded to save", None);
    }
    if state.store.is_none() {
        return err(&req.id, "no_store", "select a document store first", None);
    }
    ok(&req.id, submit_save_inner(state, force))
}

fn handle_save_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, status_json(&state.saver.snapshot()))
}

fn handle_save_wait(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, status_json(&state.saver.wait()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "save.now" => Some(handle_save_now(state, req)),
        "save.status" => Some(handle_save_status(state, req)),
        "save.wait" => Some(handle_save_wait(state, req)),
        _ => None,
    }
}
