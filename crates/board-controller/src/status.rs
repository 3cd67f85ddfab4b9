//! Status publisher: projects session state into a view for the text
//! panes next to the board.

use tracing::debug;

use crate::analysis::{EvaluationLine, QueueSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NetworkStatus {
    #[default]
    Ok,
    /// Consecutive failed calls since the last success
    Degraded { failures: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusView {
    pub fen: String,
    pub movetext: String,
    /// Engine lines for `lines_for`
    pub lines: Vec<EvaluationLine>,
    pub lines_for: Option<String>,
    pub queue: Option<QueueSnapshot>,
    pub network: NetworkStatus,
    pub solved: Option<u32>,
    /// One-off message, cleared on the next position change
    pub notice: Option<String>,
}

pub trait StatusSink: Send {
    fn publish(&mut self, view: &StatusView);
}

/// Sink that drops every view.
#[derive(Debug, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&mut self, _view: &StatusView) {}
}

pub struct StatusPublisher {
    view: StatusView,
    sink: Box<dyn StatusSink>,
}

impl StatusPublisher {
    pub fn new(sink: Box<dyn StatusSink>) -> Self {
        Self {
            view: StatusView::default(),
            sink,
        }
    }

    pub fn view(&self) -> &StatusView {
        &self.view
    }

    /// New position on the board. Lines for another position are dropped.
    pub fn set_position(&mut self, fen: String, movetext: String) {
        if self.view.lines_for.as_deref() != Some(fen.as_str()) {
            self.view.lines.clear();
            self.view.lines_for = None;
        }
        self.view.fen = fen;
        self.view.movetext = movetext;
        self.view.notice = None;
        self.publish();
    }

    pub fn set_lines(&mut self, fen: String, lines: Vec<EvaluationLine>) {
        self.view.lines = lines;
        self.view.lines_for = Some(fen);
        self.publish();
    }

    pub fn set_queue(&mut self, queue: QueueSnapshot) {
        self.view.queue = Some(queue);
        self.publish();
    }

    pub fn set_solved(&mut self, solved: u32) {
        self.view.solved = Some(solved);
        self.publish();
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.view.notice = Some(notice.into());
        self.publish();
    }

    pub fn network_ok(&mut self) {
        if self.view.network != NetworkStatus::Ok {
            self.view.network = NetworkStatus::Ok;
            self.publish();
        }
    }

    pub fn network_failed(&mut self) {
        let failures = match self.view.network {
            NetworkStatus::Ok => 1,
            NetworkStatus::Degraded { failures } => failures + 1,
        };
        self.view.network = NetworkStatus::Degraded { failures };
        self.publish();
    }

    fn publish(&mut self) {
        debug!(fen = %self.view.fen, lines = self.view.lines.len(), "Publishing status");
        self.sink.publish(&self.view);
    }
}

/// Centipawns as pawns with an explicit sign: `35` -> `+0.35`.
pub fn format_score(centipawns: i32) -> String {
    let sign = if centipawns < 0 { '-' } else { '+' };
    let abs = centipawns.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// One engine line as shown in the analysis pane.
pub fn format_line(line: &EvaluationLine) -> String {
    format!(
        "{} (d{}) {}",
        format_score(line.score),
        line.depth,
        line.pv.join(" ")
    )
}
