//! HTTP endpoints over a [`RuntimeManager`]
//!
//! Every handler notes activity and makes sure the maps are loaded before
//! answering; none of them touch the manager's internals.
//!
//! | Route              | Answer                                   |
//! |--------------------|------------------------------------------|
//! | `GET /list`        | names of the loaded maps                 |
//! | `GET /map?map=...` | snapshot of one map, 400 / 404 otherwise |
//! | `GET /map/default` | snapshot of the default map, 503 if none |

use crate::common::ApiResponse;
use crate::error::{MapkeeperError, Result};
use crate::lifecycle::{MapStore, RuntimeManager};
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    pub map: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MapList {
    pub maps: Vec<String>,
}

/// Build the router; mount it with `Router::merge`
pub fn router<S>(manager: RuntimeManager<S>) -> Router
where
    S: MapStore,
    S::View: Serialize,
{
    Router::new()
        .route("/list", get(list_maps::<S>))
        .route("/map", get(get_map::<S>))
        .route("/map/default", get(get_default_map::<S>))
        .with_state(manager)
}

async fn touch<S: MapStore>(manager: &RuntimeManager<S>) {
    manager.note_activity();
    if let Err(e) = manager.ensure_started().await {
        tracing::warn!("Maps not started: {}", e);
    }
}

async fn list_maps<S: MapStore>(
    State(manager): State<RuntimeManager<S>>,
) -> ApiResponse<MapList> {
    touch(&manager).await;
    let maps = manager.list_names().await.into_iter().collect();
    ApiResponse::ok(MapList { maps })
}

async fn get_map<S>(
    State(manager): State<RuntimeManager<S>>,
    Query(query): Query<MapQuery>,
) -> Result<ApiResponse<S::View>>
where
    S: MapStore,
    S::View: Serialize,
{
    touch(&manager).await;

    let name = query.map.unwrap_or_default();
    if name.is_empty() {
        return Err(MapkeeperError::BadRequest(
            "missing required parameter: map (example: /map?map=office)".to_string(),
        ));
    }

    let view = manager.get(&name).await?;
    Ok(ApiResponse::ok(view))
}

async fn get_default_map<S>(
    State(manager): State<RuntimeManager<S>>,
) -> Result<ApiResponse<S::View>>
where
    S: MapStore,
    S::View: Serialize,
{
    touch(&manager).await;
    let view = manager.get_default().await?;
    Ok(ApiResponse::ok(view))
}
