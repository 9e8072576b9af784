//! Liveness endpoint for the webhook deployment.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::ServerState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: bool,
}

pub async fn get(State(state): State<ServerState>) -> Json<Health> {
    let database = state.db.ping().await.is_ok();
    Json(Health {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
