use serde::Deserialize;

use crate::roster::Roster;
use crate::store::{Saver, StoreClient};
use crate::view::FilterState;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: Option<StoreClient>,
    pub roster: Option<Roster>,
    pub filters: FilterState,
    pub showing_all: bool,
    pub saver: Saver,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: None,
            roster: None,
            filters: FilterState::default(),
            showing_all: false,
            saver: Saver::new(),
        }
    }
}
