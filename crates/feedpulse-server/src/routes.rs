use std::net::SocketAddr;

use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use feedpulse_core::{OverallSentiment, TopicSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::analyze::{AnalyzeError, Mode, analyze, parse_request_date};
use crate::state::AppState;

const HOME_PAGE: &str = include_str!("../pages/home.html");
const FORM_PAGE: &str = include_str!("../pages/form.html");
const OVERALL_PAGE: &str = include_str!("../pages/overall.html");

pub const NO_DATA: &str = "No data found";
pub const NO_SESSION_DATA: &str = "No data found for this session";

/// Fields posted by the dashboard pages.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeForm {
    #[serde(rename = "COURSE_ID", default)]
    pub course_id: Option<String>,
    #[serde(rename = "DATE", default)]
    pub date: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    mode: Mode,
    topics: Vec<TopicSummary>,
}

#[derive(Serialize)]
struct OverallResponse {
    topics: Vec<OverallSentiment>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/form-sentiments/", get(form_page))
        .route("/overall-sentiments/", get(overall_page))
        .route("/analyze", post(analyze_chart))
        .route("/summary", post(summary))
        .route("/overall", post(overall))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "feedpulse listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

async fn overall_page() -> Html<&'static str> {
    Html(OVERALL_PAGE)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Chart series for the form dashboard.
async fn analyze_chart(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Response, AnalyzeError> {
    let date = parse_request_date(form.date.as_deref())?;
    let analysis = analyze(&state, date).await?;
    if analysis.is_empty() {
        return Ok(Json(json!({ "error": NO_DATA })).into_response());
    }

    let analysis = analysis.for_session(form.course_id.as_deref());
    if analysis.is_empty() {
        return Ok(Json(json!({ "error": NO_SESSION_DATA })).into_response());
    }
    Ok(Json(analysis.chart()).into_response())
}

async fn summary(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Json<SummaryResponse>, AnalyzeError> {
    let date = parse_request_date(form.date.as_deref())?;
    let analysis = analyze(&state, date)
        .await?
        .for_session(form.course_id.as_deref());
    Ok(Json(SummaryResponse {
        mode: analysis.mode,
        topics: analysis.summaries(),
    }))
}

async fn overall(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Json<OverallResponse>, AnalyzeError> {
    let date = parse_request_date(form.date.as_deref())?;
    let analysis = analyze(&state, date)
        .await?
        .for_session(form.course_id.as_deref());
    Ok(Json(OverallResponse {
        topics: analysis.overall(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::NaiveDate;
    use feedpulse_ai::{LexiconSentiment, UnassignedTopics};
    use feedpulse_core::TopicGroups;
    use feedpulse_store::{DataSource, HistoryStore, LiveSource, StoreError, Table};
    use tower::ServiceExt;

    use crate::state::Today;

    const HISTORY: &str = "\
TIMESTAMP,REMARKS,topic,topic_group,sentiment,sentiment_score,session_name
2024-02-28 09:00:00,Great trainer,0,Trainer,positive,0.8,A
2024-02-28 09:05:00,Too fast,1,Pace,negative,-0.5,A
2024-02-28 09:10:00,Fine,1,Pace,neutral,0.0,B
2024-02-28 09:15:00,Loved it,0,Trainer,positive,,B
";

    struct StaticSource(Table);

    #[async_trait]
    impl LiveSource for StaticSource {
        async fn fetch_table(&self) -> Result<Table, StoreError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn live_table() -> Table {
        let strings = |cells: &[&str]| cells.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Table::new(
            strings(&["Timestamp", "Question 11", "REMARKS"]),
            vec![
                strings(&["3/1/2024 9:00:00", "labs", "The labs were excellent"]),
                strings(&["3/1/2024 9:10:00", "", "nil"]),
                strings(&["3/1/2024 9:20:00", "wifi", "wifi was terrible"]),
            ],
        )
    }

    fn app(history: &Path) -> Router {
        let source = DataSource::new(HistoryStore::new(history))
            .with_live(Arc::new(StaticSource(live_table())));
        let state = AppState::new(
            source,
            TopicGroups::builtin(),
            Arc::new(UnassignedTopics),
            Arc::new(LexiconSentiment::default()),
        )
        .with_today(Today::Fixed(today()));
        router(state)
    }

    fn history_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), HISTORY).unwrap();
        file
    }

    async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn pages_are_served() {
        let file = history_file();
        for uri in ["/", "/form-sentiments/", "/overall-sentiments/"] {
            let response = app(file.path())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
            assert!(content_type.to_str().unwrap().starts_with("text/html"));
        }
    }

    #[test]
    fn result_pages_insert_text_not_markup() {
        for page in [FORM_PAGE, OVERALL_PAGE] {
            assert!(!page.contains("innerHTML"));
            assert!(page.contains(".textContent = value"));
        }
    }

    #[tokio::test]
    async fn health_reports_version() {
        let file = history_file();
        let response = app(file.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn analyze_historical_chart() {
        let file = history_file();
        let (status, body) = post_form(app(file.path()), "/analyze", "COURSE_ID=&DATE=2024-02-28").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topics"], json!(["Pace", "Trainer"]));
        assert_eq!(body["positive"], json!([0, 2]));
        assert_eq!(body["neutral"], json!([1, 0]));
        assert_eq!(body["negative"], json!([1, 0]));
    }

    #[tokio::test]
    async fn analyze_filters_by_session() {
        let file = history_file();
        let (_, body) = post_form(app(file.path()), "/analyze", "COURSE_ID=A&DATE=2024-02-28").await;
        assert_eq!(body["topics"], json!(["Pace", "Trainer"]));
        assert_eq!(body["negative"], json!([1, 0]));
        assert_eq!(body["neutral"], json!([0, 0]));

        let (_, body) = post_form(app(file.path()), "/analyze", "COURSE_ID=Z&DATE=2024-02-28").await;
        assert_eq!(body, json!({ "error": NO_SESSION_DATA }));
    }

    #[tokio::test]
    async fn analyze_without_rows_reports_no_data() {
        let file = history_file();
        let (status, body) = post_form(app(file.path()), "/analyze", "DATE=2023-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": NO_DATA }));
    }

    #[tokio::test]
    async fn analyze_today_classifies_live_responses() {
        let file = history_file();
        let (status, body) = post_form(app(file.path()), "/summary", "DATE=2024-03-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "live");

        let topics = body["topics"].as_array().unwrap();
        assert_eq!(topics[0]["topic_group"], "Other");
        assert_eq!(topics[0]["positive_count"], 1);
        assert_eq!(topics[0]["negative_count"], 1);
        assert_eq!(topics[0]["example_positive_remark"], "The labs were excellent");
        assert_eq!(topics[0]["example_negative_remark"], "wifi was terrible");
        assert_eq!(topics[1]["topic_group"], "Nothing, No Suggestion");
    }

    #[tokio::test]
    async fn summary_of_history_is_sorted_pivot() {
        let file = history_file();
        let (_, body) = post_form(app(file.path()), "/summary", "DATE=2024-02-28").await;
        assert_eq!(body["mode"], "historical");
        let topics = body["topics"].as_array().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0]["topic_group"], "Pace");
        assert_eq!(topics[0]["overall_score"], -1);
        assert_eq!(topics[1]["overall_score"], 2);
    }

    #[tokio::test]
    async fn overall_scores_by_topic() {
        let file = history_file();
        let (_, body) = post_form(app(file.path()), "/overall", "DATE=2024-02-28").await;
        let topics = body["topics"].as_array().unwrap();
        let pace = &topics[0];
        assert_eq!(pace["topic_group"], "Pace");
        assert_eq!(pace["overall_score"], -0.25);
        assert_eq!(pace["label"], "Negative");
        assert_eq!(pace["total_sentences"], 2);
        let trainer = &topics[1];
        assert_eq!(trainer["overall_score"], 0.8);
        assert_eq!(trainer["label"], "Positive");
        assert_eq!(trainer["total_sentences"], 2);
    }

    #[tokio::test]
    async fn missing_columns_are_reported_with_ok_status() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "TIMESTAMP,topic_group\n2024-02-28,Pace\n").unwrap();
        let (status, body) = post_form(app(file.path()), "/analyze", "DATE=2024-02-28").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Required columns missing in historical dataset" }));
    }

    #[tokio::test]
    async fn bad_date_is_structural() {
        let file = history_file();
        let (status, body) = post_form(app(file.path()), "/analyze", "DATE=tomorrow").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("tomorrow"));
    }

    #[tokio::test]
    async fn missing_history_file_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            post_form(app(&dir.path().join("absent.csv")), "/analyze", "DATE=2024-02-28").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("absent.csv"));
    }
}
