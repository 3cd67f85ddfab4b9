//! Fire-and-forget backend calls.
//!
//! The session never awaits the network. Each call is spawned and its
//! result comes back as a `SessionEvent` on the channel the session drains.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::analysis::reconcile::Ticket;
use crate::analysis::AnalysisClient;
use crate::quiz::ScoreBand;
use crate::session::SessionEvent;

pub trait Backend {
    fn request_evaluation(&self, ticket: Ticket, fen: String);

    fn request_queue(&self, ticket: Ticket);

    fn request_analysis(&self, pgn: String);

    fn request_quiz(&self, ticket: Ticket, band: ScoreBand);

    fn upload_pgn(&self, file_name: String, contents: Vec<u8>);
}

#[derive(Clone)]
pub struct TokioBackend {
    client: AnalysisClient,
    tx: UnboundedSender<SessionEvent>,
}

impl TokioBackend {
    pub fn new(client: AnalysisClient, tx: UnboundedSender<SessionEvent>) -> Self {
        Self { client, tx }
    }

    fn send(tx: &UnboundedSender<SessionEvent>, event: SessionEvent) {
        if tx.send(event).is_err() {
            // Session is gone; nothing left to update
            warn!("Dropping backend result, session channel closed");
        }
    }
}

impl Backend for TokioBackend {
    fn request_evaluation(&self, ticket: Ticket, fen: String) {
        debug!(seq = ticket.seq, fen = %fen, "Dispatching eval");
        tokio::spawn({
            let client = self.client.clone();
            let tx = self.tx.clone();
            async move {
                let result = client.evaluation(&fen).await;
                Self::send(&tx, SessionEvent::Evaluation { ticket, result });
            }
        });
    }

    fn request_queue(&self, ticket: Ticket) {
        debug!(seq = ticket.seq, "Dispatching stats");
        tokio::spawn({
            let client = self.client.clone();
            let tx = self.tx.clone();
            async move {
                let result = client.queue().await;
                Self::send(&tx, SessionEvent::Queue { ticket, result });
            }
        });
    }

    fn request_analysis(&self, pgn: String) {
        tokio::spawn({
            let client = self.client.clone();
            let tx = self.tx.clone();
            async move {
                let result = client.request_analysis(&pgn).await.map(|()| String::new());
                Self::send(
                    &tx,
                    SessionEvent::Acknowledged {
                        call: "analyze",
                        result,
                    },
                );
            }
        });
    }

    fn request_quiz(&self, ticket: Ticket, band: ScoreBand) {
        debug!(seq = ticket.seq, min = band.min, max = band.max, "Dispatching get_quiz");
        tokio::spawn({
            let client = self.client.clone();
            let tx = self.tx.clone();
            async move {
                let result = client.fetch_quiz(band).await;
                Self::send(&tx, SessionEvent::Quiz { ticket, result });
            }
        });
    }

    fn upload_pgn(&self, file_name: String, contents: Vec<u8>) {
        debug!(file_name = %file_name, bytes = contents.len(), "Dispatching upload_pgn");
        tokio::spawn({
            let client = self.client.clone();
            let tx = self.tx.clone();
            async move {
                let result = client.upload_pgn(&file_name, contents).await;
                Self::send(
                    &tx,
                    SessionEvent::Acknowledged {
                        call: "upload_pgn",
                        result,
                    },
                );
            }
        });
    }
}
