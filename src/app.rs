use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dataset::Dataset;
use crate::downloader::{Delivered, DeliveryTarget, deliver};
use crate::error::{Result, SwiftError};
use crate::filter::{FinalSelections, FormView};
use crate::loader::DatasetProvider;
use crate::report::{ProjectMetadata, assemble};
use crate::selection::Selections;

pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub target: DeliveryTarget,
}

#[derive(Deserialize)]
pub struct ReportRequest {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub selections: Selections,
}

#[derive(Serialize)]
struct SaveResponse {
    status: String,
    path: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/options", post(options))
        .route("/api/report", post(report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fetches the dataset once, then serves the form API until the process stops.
pub async fn run<P>(provider: P, target: DeliveryTarget, bind: SocketAddr) -> Result<()>
where
    P: DatasetProvider + Send + 'static,
{
    // The fetch may block on disk or network.
    let dataset = tokio::task::spawn_blocking(move || provider.fetch())
        .await
        .map_err(|e| SwiftError::SourceUnavailable(e.to_string()))??;

    // Fail before listening if the sheet lacks a column.
    FormView::derive(&dataset, &Selections::new())?;

    let state = Arc::new(AppState {
        dataset: Arc::new(dataset),
        target,
    });

    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| SwiftError::Config(format!("cannot bind {}: {}", bind, e)))?;
    info!("Listening on http://{}", bind);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| SwiftError::Config(format!("server stopped: {}", e)))?;

    Ok(())
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn options(
    State(state): State<Arc<AppState>>,
    Json(selections): Json<Selections>,
) -> Result<Json<FormView>> {
    let view = FormView::derive(&state.dataset, &selections.normalized())?;
    Ok(Json(view))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Response> {
    let finals = FinalSelections::resolve(&state.dataset, &request.selections.normalized())?;
    let document = assemble(&request.metadata, &finals);

    match deliver(&document, &state.target)? {
        Delivered::Download(download) => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, download.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", download.file_name),
                ),
            ],
            download.bytes,
        )
            .into_response()),
        Delivered::Saved(path) => Ok(Json(SaveResponse {
            status: "ok".to_string(),
            path: path.display().to_string(),
        })
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn state(target: DeliveryTarget) -> Arc<AppState> {
        let dataset = Dataset::new(
            strings(&[
                "County",
                "Species",
                "Question",
                "Construction",
                "Possible_Construction_Activity",
                "Mitigation_Species",
                "Mitigation_Construction",
                "Mitigation_Id",
                "Mitigation_Description",
            ]),
            vec![strings(&[
                "Denver", "Bat", "Roosting", "Excavation", "Tree removal", "Bat", "Excavation",
                "1", "Use netting",
            ])],
        );
        Arc::new(AppState {
            dataset: Arc::new(dataset),
            target,
        })
    }

    #[tokio::test]
    async fn options_follow_the_selections() {
        let selections = Selections::new().with_county("Denver").with_species("Bat");
        let Json(view) = options(State(state(DeliveryTarget::Download)), Json(selections))
            .await
            .unwrap();
        assert_eq!(view.species, strings(&["Bat"]));
        assert_eq!(view.impacts.selected(), strings(&["Roosting"]));
    }

    #[tokio::test]
    async fn report_is_an_attachment() {
        let request = ReportRequest {
            metadata: ProjectMetadata::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            selections: Selections::new()
                .with_county("Denver")
                .with_species("Bat")
                .with_activity("Excavation"),
        };
        let response = report(State(state(DeliveryTarget::Download)), Json(request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, "attachment; filename=\"SWIFT_2024-01-01.docx\"");
    }

    #[tokio::test]
    async fn schema_errors_become_422() {
        let broken = Arc::new(AppState {
            dataset: Arc::new(Dataset::new(strings(&["County"]), vec![])),
            target: DeliveryTarget::Download,
        });
        let err = options(State(broken), Json(Selections::new())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
