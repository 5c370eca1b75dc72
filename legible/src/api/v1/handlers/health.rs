use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    /// `ok` when at least one local engine is up, `degraded` otherwise.
    pub status: String,
    pub version: String,
    pub engines: EnginesStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EnginesStatus {
    pub neural: String,
    pub classical: String,
    pub cloud: String,
}

fn describe(available: bool) -> String {
    if available { "available" } else { "unavailable" }.to_string()
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let availability = state.extraction.engines().availability();
    let status = if availability.neural || availability.classical {
        "ok"
    } else {
        "degraded"
    };

    ApiResponse::success(HealthData {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engines: EnginesStatus {
            neural: describe(availability.neural),
            classical: describe(availability.classical),
            cloud: describe(availability.cloud),
        },
    })
}
