#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use axum::Router;
use board_controller::chess_core::shakmaty::{Color, Piece, Square};
use board_controller::chess_core::GamePosition;
use board_controller::{
    Backend, BoardWidget, ControllerConfig, Mode, ScoreBand, Session, StatusSink, StatusView,
    Ticket,
};

/// Widget double that records everything pushed into it.
pub struct MockWidget {
    pub fen: Option<String>,
    pub orientation: Color,
    pub placed: Vec<(Square, Option<Piece>)>,
    pub dialogs: Vec<(Square, Color)>,
}

impl MockWidget {
    pub fn new() -> Self {
        Self {
            fen: None,
            orientation: Color::White,
            placed: Vec::new(),
            dialogs: Vec::new(),
        }
    }

    /// Piece on a square of the position last pushed with `set_position`.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let fen = self.fen.as_deref().expect("no position pushed");
        GamePosition::from_fen(fen)
            .expect("widget got a bad FEN")
            .piece_at(square)
    }
}

impl BoardWidget for MockWidget {
    fn set_position(&mut self, fen: &str) {
        self.fen = Some(fen.to_string());
    }

    fn set_orientation(&mut self, color: Color) {
        self.orientation = color;
    }

    fn orientation(&self) -> Color {
        self.orientation
    }

    fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.placed.push((square, piece));
    }

    fn show_promotion_dialog(&mut self, square: Square, color: Color) {
        self.dialogs.push((square, color));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Evaluation { ticket: Ticket, fen: String },
    Queue(Ticket),
    Analysis(String),
    Quiz { ticket: Ticket, band: ScoreBand },
    Upload { file_name: String, bytes: usize },
}

/// Backend double: records requests, the test feeds the responses.
#[derive(Default)]
pub struct RecordingBackend {
    pub requests: RefCell<Vec<Request>>,
}

impl RecordingBackend {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn evaluations(&self) -> Vec<(Ticket, String)> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Evaluation { ticket, fen } => Some((ticket.clone(), fen.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_evaluation(&self) -> (Ticket, String) {
        self.evaluations().pop().expect("no evaluation requested")
    }

    pub fn quiz_requests(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| matches!(r, Request::Quiz { .. }))
            .count()
    }

    pub fn quiz_tickets(&self) -> Vec<Ticket> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Quiz { ticket, .. } => Some(ticket.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl Backend for RecordingBackend {
    fn request_evaluation(&self, ticket: Ticket, fen: String) {
        self.requests
            .borrow_mut()
            .push(Request::Evaluation { ticket, fen });
    }

    fn request_queue(&self, ticket: Ticket) {
        self.requests.borrow_mut().push(Request::Queue(ticket));
    }

    fn request_analysis(&self, pgn: String) {
        self.requests.borrow_mut().push(Request::Analysis(pgn));
    }

    fn request_quiz(&self, ticket: Ticket, band: ScoreBand) {
        self.requests
            .borrow_mut()
            .push(Request::Quiz { ticket, band });
    }

    fn upload_pgn(&self, file_name: String, contents: Vec<u8>) {
        self.requests.borrow_mut().push(Request::Upload {
            file_name,
            bytes: contents.len(),
        });
    }
}

/// Sink that keeps every published view.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub views: Arc<Mutex<Vec<StatusView>>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&mut self, view: &StatusView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

pub type TestSession = Session<MockWidget, RecordingBackend>;

pub fn config(mode: Mode) -> ControllerConfig {
    ControllerConfig {
        mode,
        ..ControllerConfig::default()
    }
}

/// Started session plus a handle on its published views.
pub fn session_with(config: &ControllerConfig) -> (TestSession, RecordingSink) {
    let sink = RecordingSink::default();
    let mut session = Session::new(
        config,
        MockWidget::new(),
        RecordingBackend::default(),
        Box::new(sink.clone()),
    )
    .expect("valid config");
    session.start();
    (session, sink)
}

pub fn session(mode: Mode) -> TestSession {
    session_with(&config(mode)).0
}

/// Serve a router on an ephemeral local port; returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
