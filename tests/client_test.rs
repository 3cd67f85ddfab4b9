/// HTTP client and tokio dispatch against an in-process fake backend.
mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use board_controller::config::AnalyzeMethod;
use board_controller::{
    AnalysisClient, Backend, ClientError, ControllerConfig, Mode, Reconciler, ScoreBand, Session,
    SessionEvent, TokioBackend,
};
use common::{MockWidget, RecordingSink};
use serde_json::{json, Value};
use tokio::sync::mpsc;

fn config_for(base_url: &str) -> ControllerConfig {
    ControllerConfig {
        backend_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..ControllerConfig::default()
    }
}

fn client_for(base_url: &str) -> AnalysisClient {
    AnalysisClient::new(&config_for(base_url)).unwrap()
}

fn fake_backend() -> Router {
    Router::new()
        .route(
            "/eval",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let notation = params.get("notation").cloned().unwrap_or_default();
                let fen = params.get("fen").cloned().unwrap_or_default();
                if fen.starts_with("8/") {
                    // Older backends answer with a bare list
                    return Json(json!([{ "depth": 12, "score": -120, "pv": [] }]));
                }
                Json(json!({
                    "fen": fen,
                    "pvs": [
                        { "depth": 20, "score": 35, "pv": ["e5", notation] },
                        { "depth": 20, "score": 20, "pv": ["c5"] }
                    ]
                }))
            }),
        )
        .route(
            "/stats",
            get(|| async { Json(json!({ "analysis_queue": ["fen1", "fen2"] })) }),
        )
        .route(
            "/get_quiz",
            post(|Query(params): Query<HashMap<String, String>>| async move {
                let min = params.get("min").cloned().unwrap_or_default();
                let max = params.get("max").cloned().unwrap_or_default();
                Json(json!({
                    "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                    "answers": [format!("{min}-{max}")]
                }))
            }),
        )
        .route(
            "/upload_pgn",
            put(|body: String| async move {
                if body.contains("name=\"file\"") && body.contains("filename=\"games.pgn\"") {
                    "2 games imported".to_string()
                } else {
                    "missing file field".to_string()
                }
            }),
        )
}

#[tokio::test]
async fn test_evaluation_both_shapes() {
    let base = common::serve(fake_backend()).await;
    let client = client_for(&base);

    let lines = client
        .evaluation("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].score, 35);
    assert_eq!(lines[0].pv, vec!["e5".to_string(), "san".to_string()]);

    let lines = client.evaluation("8/8/8/8/8/8/k7/K7 w - - 0 1").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].depth, 12);
    assert!(lines[0].pv.is_empty());
}

#[tokio::test]
async fn test_queue_both_shapes() {
    let base = common::serve(fake_backend()).await;
    let snapshot = client_for(&base).queue().await.unwrap();
    assert_eq!(snapshot.size, 2);
    assert_eq!(snapshot.pending, vec!["fen1", "fen2"]);

    let counted = Router::new().route("/stats", get(|| async { Json(json!({ "queue": 7 })) }));
    let base = common::serve(counted).await;
    let snapshot = client_for(&base).queue().await.unwrap();
    assert_eq!(snapshot.size, 7);
    assert!(snapshot.pending.is_empty());
}

#[tokio::test]
async fn test_quiz_sends_score_band() {
    let base = common::serve(fake_backend()).await;
    let quiz = client_for(&base)
        .fetch_quiz(ScoreBand { min: 150, max: 250 })
        .await
        .unwrap();
    assert_eq!(quiz.answers, vec!["150-250"]);
}

#[tokio::test]
async fn test_analyze_posts_pgn_with_configured_method() {
    let seen: Arc<Mutex<Vec<(&'static str, Value)>>> = Arc::default();
    let router = Router::new().route(
        "/analyze",
        post({
            let seen = seen.clone();
            move |Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(("POST", body));
                StatusCode::OK
            }
        })
        .put({
            let seen = seen.clone();
            move |Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(("PUT", body));
                StatusCode::OK
            }
        }),
    );
    let base = common::serve(router).await;

    client_for(&base).request_analysis("1. e4 e5").await.unwrap();

    let put_config = ControllerConfig {
        analyze_method: AnalyzeMethod::Put,
        ..config_for(&base)
    };
    AnalysisClient::new(&put_config)
        .unwrap()
        .request_analysis("1. d4")
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], ("POST", json!({ "pgn": "1. e4 e5" })));
    assert_eq!(seen[1], ("PUT", json!({ "pgn": "1. d4" })));
}

#[tokio::test]
async fn test_upload_is_multipart() {
    let base = common::serve(fake_backend()).await;
    let ack = client_for(&base)
        .upload_pgn("games.pgn", b"1. e4 e5 *".to_vec())
        .await
        .unwrap();
    assert_eq!(ack, "2 games imported");
}

#[tokio::test]
async fn test_error_statuses_and_bad_bodies() {
    let router = Router::new()
        .route("/eval", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/stats", get(|| async { "not json" }));
    let base = common::serve(router).await;
    let client = client_for(&base);

    let err = client.evaluation("any").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status {
            endpoint: "eval",
            status: 500
        }
    ));

    let err = client.queue().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { endpoint: "stats", .. }));
}

#[tokio::test]
async fn test_tokio_backend_reports_through_channel() {
    let base = common::serve(fake_backend()).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let backend = TokioBackend::new(client_for(&base), tx);

    let mut reconciler = Reconciler::new();
    let ticket = reconciler.issue(Some("8/8/8/8/8/8/k7/K7 w - - 0 1".into()));
    backend.request_evaluation(ticket.clone(), "8/8/8/8/8/8/k7/K7 w - - 0 1".into());

    match rx.recv().await.unwrap() {
        SessionEvent::Evaluation {
            ticket: returned,
            result,
        } => {
            assert_eq!(returned, ticket);
            assert_eq!(result.unwrap().len(), 1);
        }
        other => panic!("unexpected event {other:?}"),
    }

    backend.upload_pgn("games.pgn".into(), b"1. e4 *".to_vec());
    match rx.recv().await.unwrap() {
        SessionEvent::Acknowledged { call, result } => {
            assert_eq!(call, "upload_pgn");
            assert_eq!(result.unwrap(), "2 games imported");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_session_round_trip_over_http() {
    let base = common::serve(fake_backend()).await;
    let config = ControllerConfig {
        mode: Mode::Analysis,
        ..config_for(&base)
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let backend = TokioBackend::new(AnalysisClient::new(&config).unwrap(), tx);
    let mut session = Session::new(
        &config,
        MockWidget::new(),
        backend,
        Box::new(RecordingSink::default()),
    )
    .unwrap();

    session.start();
    // One evaluation and one stats call
    for _ in 0..2 {
        let event = rx.recv().await.unwrap();
        session.handle(event);
    }

    let status = session.status();
    assert_eq!(status.lines.len(), 2);
    assert_eq!(status.lines_for.as_deref(), Some(status.fen.as_str()));
    assert_eq!(status.queue.as_ref().map(|q| q.size), Some(2));
}
