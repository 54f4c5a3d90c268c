use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{StoreClient, StoreConfig, DEFAULT_SAVE_TIMEOUT_MS};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "documentUrl": state.store.as_ref().map(|s| s.config().document_url.clone()),
            "rosterLoaded": state.roster.is_some(),
        }),
    )
}

fn handle_store_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let url = req
        .params
        .get("url")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let Some(document_url) = url else {
        return err(&req.id, "bad_params", "missing params.url", None);
    };
    let save_url = req
        .params
        .get("saveUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let Some(save_url) = save_url else {
        return err(&req.id, "bad_params", "missing params.saveUrl", None);
    };
    let timeout_ms = req
        .params
        .get("timeoutMs")
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_SAVE_TIMEOUT_MS);
    let persist = req
        .params
        .get("persist")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    let config = StoreConfig {
        document_url,
        save_url,
        timeout_ms,
        persist,
    };
    match StoreClient::new(config) {
        Ok(client) => {
            let resp = ok(
                &req.id,
                json!({
                    "documentUrl": client.config().document_url,
                    "saveUrl": client.config().save_url,
                    "timeoutMs": client.config().timeout_ms,
                    "persist": client.config().persist,
                }),
            );
            state.store = Some(client);
            resp
        }
        Err(e) => err(&req.id, "store_select_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.select" => Some(handle_store_select(state, req)),
        _ => None,
    }
}
