//! Analysis backend client.
//!
//! Thin wrapper over the backend's evaluation, queue, analyze, quiz and
//! upload endpoints. Responses are decoded into controller types; ordering
//! between overlapping calls is handled by [`reconcile`].

pub mod reconcile;

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::{AnalyzeMethod, ControllerConfig, EvalNotation};
use crate::error::ClientError;
use crate::quiz::{Quiz, ScoreBand};

/// One engine line for a position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvaluationLine {
    #[serde(default)]
    pub depth: u32,
    /// Centipawns from White's point of view
    pub score: i32,
    /// Principal variation
    #[serde(default)]
    pub pv: Vec<String>,
}

/// Outstanding server-side analysis work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// FENs waiting for analysis, when the backend lists them
    pub pending: Vec<String>,
    pub size: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EvalResponse {
    Wrapped { pvs: Vec<EvaluationLine> },
    Bare(Vec<EvaluationLine>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatsResponse {
    Listed { analysis_queue: Vec<String> },
    Counted { queue: usize },
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
    notation: EvalNotation,
    analyze_method: AnalyzeMethod,
}

impl AnalysisClient {
    pub fn new(config: &ControllerConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent("BoardController/1.0")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
            notation: config.eval_notation,
            analyze_method: config.analyze_method,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the cached evaluation lines for a position.
    pub async fn evaluation(&self, fen: &str) -> Result<Vec<EvaluationLine>, ClientError> {
        let resp = self
            .client
            .get(self.url("/eval"))
            .query(&[("notation", self.notation.as_str()), ("fen", fen)])
            .send()
            .await?;

        let body: EvalResponse = decode(resp, "eval").await?;
        let lines = match body {
            EvalResponse::Wrapped { pvs } => pvs,
            EvalResponse::Bare(lines) => lines,
        };
        debug!(fen, lines = lines.len(), "Evaluation received");
        Ok(lines)
    }

    /// Fetch the backend's analysis queue.
    pub async fn queue(&self) -> Result<QueueSnapshot, ClientError> {
        let resp = self.client.get(self.url("/stats")).send().await?;

        let snapshot = match decode::<StatsResponse>(resp, "stats").await? {
            StatsResponse::Listed { analysis_queue } => QueueSnapshot {
                size: analysis_queue.len(),
                pending: analysis_queue,
            },
            StatsResponse::Counted { queue } => QueueSnapshot {
                pending: Vec::new(),
                size: queue,
            },
        };
        Ok(snapshot)
    }

    /// Ask the backend to analyze a game in the background.
    /// The response body is not used.
    pub async fn request_analysis(&self, pgn: &str) -> Result<(), ClientError> {
        let method = match self.analyze_method {
            AnalyzeMethod::Post => Method::POST,
            AnalyzeMethod::Put => Method::PUT,
        };

        let resp = self
            .client
            .request(method, self.url("/analyze"))
            .json(&json!({ "pgn": pgn }))
            .send()
            .await?;

        check_status(resp, "analyze").await?;
        Ok(())
    }

    /// Fetch a new puzzle within the score band.
    pub async fn fetch_quiz(&self, band: ScoreBand) -> Result<Quiz, ClientError> {
        let resp = self
            .client
            .post(self.url("/get_quiz"))
            .query(&[("min", band.min), ("max", band.max)])
            .send()
            .await?;

        decode(resp, "get_quiz").await
    }

    /// Upload a PGN file as a multipart form (field `file`).
    /// Returns the backend's plain-text acknowledgment.
    pub async fn upload_pgn(&self, file_name: &str, contents: Vec<u8>) -> Result<String, ClientError> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("application/x-chess-pgn")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .put(self.url("/upload_pgn"))
            .multipart(form)
            .send()
            .await?;

        let resp = check_status(resp, "upload_pgn").await?;
        Ok(resp.text().await?)
    }
}

async fn check_status(resp: Response, endpoint: &'static str) -> Result<Response, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

async fn decode<T: DeserializeOwned>(resp: Response, endpoint: &'static str) -> Result<T, ClientError> {
    let resp = check_status(resp, endpoint).await?;
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode {
        endpoint,
        reason: e.to_string(),
    })
}
