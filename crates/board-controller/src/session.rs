//! The board session: single owner of all controller state.
//!
//! Every input (widget callbacks, promotion answers, user commands and
//! backend completions) arrives as a [`SessionEvent`] and is applied by
//! [`Session::handle`] on one task. Backend calls are fire-and-forget; their
//! results re-enter as events in whatever order they complete, and the
//! reconcilers decide which ones may still touch the display.

use chess_core::{AppliedMove, GamePosition, MoveIntent, PositionError};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::analysis::reconcile::{Reconciler, Ticket};
use crate::analysis::{EvaluationLine, QueueSnapshot};
use crate::config::{ControllerConfig, Mode};
use crate::dispatch::Backend;
use crate::error::ClientError;
use crate::promotion::{PromotionChoice, PromotionResolver, Resolution};
use crate::quiz::{Quiz, QuizProgress, QuizSession, ScoreBand};
use crate::status::{StatusPublisher, StatusSink, StatusView};
use crate::sync::BoardSync;
use crate::training::Trainer;
use crate::validator::{self, AnyLegal, AttemptOutcome, Verdict};
use crate::widget::{BoardInput, BoardWidget};

pub const NO_MORE_MOVES: &str = "no more moves in database!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Take back the last move (or the pending promotion)
    Undo,
    Flip,
    /// Re-publish the position and re-issue evaluation/queue requests
    Refresh,
    RefreshQueue,
    /// Send the current game to the backend for background analysis
    RequestAnalysis,
    UploadPgn { file_name: String, contents: Vec<u8> },
    NextQuiz,
    LoadPgn(String),
    LoadFen(String),
}

#[derive(Debug)]
pub enum SessionEvent {
    Board(BoardInput),
    PromotionChosen(PromotionChoice),
    Command(UserCommand),
    Evaluation {
        ticket: Ticket,
        result: Result<Vec<EvaluationLine>, ClientError>,
    },
    Queue {
        ticket: Ticket,
        result: Result<QueueSnapshot, ClientError>,
    },
    Quiz {
        ticket: Ticket,
        result: Result<Quiz, ClientError>,
    },
    /// Completion of a call whose body only matters as a message
    Acknowledged {
        call: &'static str,
        result: Result<String, ClientError>,
    },
}

pub struct Session<W: BoardWidget, B: Backend> {
    mode: Mode,
    quiz_band: ScoreBand,
    position: GamePosition,
    widget: W,
    backend: B,
    sync: BoardSync,
    resolver: PromotionResolver,
    evals: Reconciler,
    queue: Reconciler,
    quizzes: Reconciler,
    status: StatusPublisher,
    quiz: QuizSession,
    trainer: Trainer,
}

impl<W: BoardWidget, B: Backend> Session<W, B> {
    pub fn new(
        config: &ControllerConfig,
        widget: W,
        backend: B,
        sink: Box<dyn StatusSink>,
    ) -> Result<Self, PositionError> {
        let position = match &config.initial_fen {
            Some(fen) => GamePosition::from_fen(fen)?,
            None => GamePosition::standard(),
        };

        let mut trainer = Trainer::new(config.training_top_n);
        trainer.reset(position.turn());

        Ok(Self {
            mode: config.mode,
            quiz_band: config.quiz_band,
            position,
            widget,
            backend,
            sync: BoardSync::new(),
            resolver: PromotionResolver::new(config.promotion_cancel),
            evals: Reconciler::new(),
            queue: Reconciler::new(),
            quizzes: Reconciler::new(),
            status: StatusPublisher::new(sink),
            quiz: QuizSession::new(config.quiz_advance),
            trainer,
        })
    }

    /// Seed the training reply picker, for reproducible sessions.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.trainer.set_rng(rng);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn position(&self) -> &GamePosition {
        &self.position
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn status(&self) -> &StatusView {
        self.status.view()
    }

    pub fn promotion(&self) -> &PromotionResolver {
        &self.resolver
    }

    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    /// Show the initial position and kick off the first backend calls.
    pub fn start(&mut self) {
        info!(mode = ?self.mode, fen = %self.position.fen(), "Starting board session");
        self.sync.orient(&mut self.widget, self.position.turn());
        self.sync.push_position(&mut self.widget, &self.position);

        if self.mode == Mode::Quiz {
            self.status.set_solved(0);
            self.request_quiz();
        } else {
            self.refresh_status();
        }
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Board(input) => {
                // No return path here, so a refused drop is undone by a resync
                if !self.on_board_input(input) && !self.resolver.is_pending() {
                    self.sync.push_position(&mut self.widget, &self.position);
                }
            }
            SessionEvent::PromotionChosen(choice) => self.on_promotion_choice(choice),
            SessionEvent::Command(command) => self.on_command(command),
            SessionEvent::Evaluation { ticket, result } => self.on_evaluation(ticket, result),
            SessionEvent::Queue { ticket, result } => self.on_queue(ticket, result),
            SessionEvent::Quiz { ticket, result } => self.on_quiz(ticket, result),
            SessionEvent::Acknowledged { call, result } => self.on_acknowledged(call, result),
        }
    }

    /// Widget callback. Returns whether the drop is accepted; the widget
    /// snaps the piece back on `false`. Widgets that post
    /// `SessionEvent::Board` instead get the position re-pushed.
    pub fn on_board_input(&mut self, input: BoardInput) -> bool {
        match input {
            BoardInput::ValidateMoveInput(intent) => self.attempt_move(intent).accepted,
            BoardInput::MoveInputFinished => {
                // Keep the dropped pawn on the last rank while the dialog is open
                if !self.resolver.is_pending() {
                    self.sync.push_position(&mut self.widget, &self.position);
                }
                true
            }
        }
    }

    pub fn attempt_move(&mut self, intent: MoveIntent) -> AttemptOutcome {
        if self.resolver.is_pending() {
            debug!(%intent, "Ignoring move while a promotion is pending");
            return AttemptOutcome {
                accepted: false,
                requires_promotion: false,
            };
        }

        let verdict = match self.mode {
            Mode::Quiz => validator::attempt_move(&mut self.position, intent, &self.quiz),
            Mode::Analysis | Mode::Training => {
                validator::attempt_move(&mut self.position, intent, &AnyLegal)
            }
        };
        let outcome = verdict.outcome();

        match verdict {
            Verdict::Finalized(applied) => self.after_finalized(applied),
            Verdict::NeedsPromotion(pending) => {
                self.resolver.begin(pending);
                self.widget
                    .show_promotion_dialog(pending.intent.to, pending.side);
            }
            Verdict::Rejected(_) => {}
        }
        outcome
    }

    fn on_promotion_choice(&mut self, choice: PromotionChoice) {
        match self.resolver.resolve(choice) {
            Resolution::Chosen(intent) => {
                let result = match self.mode {
                    Mode::Quiz => validator::finalize(&mut self.position, intent, &self.quiz),
                    Mode::Analysis | Mode::Training => {
                        validator::finalize(&mut self.position, intent, &AnyLegal)
                    }
                };

                match result {
                    Ok(applied) => {
                        let promoted = self.position.piece_at(intent.to);
                        self.sync.place_piece(&mut self.widget, intent.to, promoted);
                        self.sync.push_position(&mut self.widget, &self.position);
                        self.after_finalized(applied);
                    }
                    Err(rejection) => {
                        debug!(%intent, %rejection, "Promotion rejected");
                        self.sync.push_position(&mut self.widget, &self.position);
                    }
                }
            }
            Resolution::Reprompt(pending) => {
                self.widget
                    .show_promotion_dialog(pending.intent.to, pending.side);
            }
            Resolution::Abandoned(_) => {
                self.sync.push_position(&mut self.widget, &self.position);
            }
            Resolution::Idle => {}
        }
    }

    fn after_finalized(&mut self, applied: AppliedMove) {
        info!(san = %applied.san, fen = %self.position.fen(), "Move played");
        self.refresh_status();

        match self.mode {
            Mode::Quiz => {
                let progress = self.quiz.record_solved();
                self.status.set_solved(self.quiz.solved());
                if progress == QuizProgress::FetchNext {
                    self.request_quiz();
                }
            }
            Mode::Training if !self.position.is_game_over() => self.trainer.player_moved(),
            Mode::Training | Mode::Analysis => {}
        }
    }

    /// Publish the current position and re-issue the mode's status calls.
    fn refresh_status(&mut self) {
        let fen = self.position.fen();
        self.status.set_position(fen.clone(), self.position.movetext());

        match self.mode {
            Mode::Analysis => {
                self.request_evaluation(fen);
                self.request_queue();
            }
            Mode::Training => self.request_evaluation(fen),
            Mode::Quiz => {}
        }
    }

    fn request_evaluation(&mut self, fen: String) {
        let ticket = self.evals.issue(Some(fen.clone()));
        debug!(seq = ticket.seq, fen = %fen, "Requesting evaluation");
        self.backend.request_evaluation(ticket, fen);
    }

    fn request_queue(&mut self) {
        let ticket = self.queue.issue(None);
        self.backend.request_queue(ticket);
    }

    fn request_quiz(&mut self) {
        let ticket = self.quizzes.issue(None);
        debug!(seq = ticket.seq, "Requesting quiz");
        self.backend.request_quiz(ticket, self.quiz_band);
    }

    fn on_evaluation(&mut self, ticket: Ticket, result: Result<Vec<EvaluationLine>, ClientError>) {
        let fen = self.position.fen();
        let verdict = self.evals.check(&ticket, &fen);

        match result {
            Ok(lines) => {
                if !verdict.is_accepted() {
                    debug!(seq = ticket.seq, ?verdict, "Discarding stale evaluation");
                    return;
                }
                self.status.network_ok();

                if self.mode == Mode::Training && self.trainer.awaiting_reply() {
                    self.play_reply(fen, lines);
                } else {
                    self.status.set_lines(fen, lines);
                }
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "Evaluation request failed");
                if verdict.is_accepted() {
                    self.status.network_failed();
                    if self.trainer.awaiting_reply() {
                        self.trainer.cancel_reply();
                        self.status.set_notice("engine reply unavailable");
                    }
                }
            }
        }
    }

    fn play_reply(&mut self, fen: String, lines: Vec<EvaluationLine>) {
        let Some(reply) = self.trainer.take_reply(&lines) else {
            info!(fen = %fen, "No reply available");
            self.status.set_lines(fen, lines);
            self.status.set_notice(NO_MORE_MOVES);
            return;
        };

        match self.position.play_notation(&reply) {
            Ok(applied) => {
                info!(san = %applied.san, "Engine reply");
                self.sync.push_position(&mut self.widget, &self.position);
                self.refresh_status();
            }
            Err(e) => {
                warn!(reply = %reply, error = %e, "Backend reply is not playable");
                self.status.set_lines(fen, lines);
                self.status.set_notice(format!("cannot play {reply}"));
            }
        }
    }

    fn on_queue(&mut self, ticket: Ticket, result: Result<QueueSnapshot, ClientError>) {
        let verdict = self.queue.check(&ticket, "");

        match result {
            Ok(snapshot) if verdict.is_accepted() => {
                self.status.network_ok();
                self.status.set_queue(snapshot);
            }
            Ok(_) => debug!(seq = ticket.seq, "Discarding stale queue snapshot"),
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "Stats request failed");
                if verdict.is_accepted() {
                    self.status.network_failed();
                }
            }
        }
    }

    fn on_quiz(&mut self, ticket: Ticket, result: Result<Quiz, ClientError>) {
        if self.mode != Mode::Quiz {
            debug!("Ignoring quiz outside quiz mode");
            return;
        }

        let verdict = self.quizzes.check(&ticket, "");
        let quiz = match result {
            Ok(quiz) if verdict.is_accepted() => quiz,
            Ok(_) => {
                debug!(seq = ticket.seq, ?verdict, "Discarding superseded quiz");
                return;
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "Quiz request failed");
                if verdict.is_accepted() {
                    self.status.network_failed();
                }
                return;
            }
        };
        self.status.network_ok();

        match self.quiz.load(quiz) {
            Ok(position) => {
                let side = position.turn();
                self.replace_position(position);
                self.sync.orient(&mut self.widget, side);
            }
            Err(e) => {
                warn!(error = %e, "Quiz has an unusable position");
                self.status.set_notice(format!("invalid quiz: {e}"));
            }
        }
    }

    fn on_acknowledged(&mut self, call: &'static str, result: Result<String, ClientError>) {
        match result {
            Ok(body) => {
                info!(call, "Backend call acknowledged");
                self.status.network_ok();
                let body = body.trim();
                if body.is_empty() {
                    self.status.set_notice(format!("{call}: ok"));
                } else {
                    self.status.set_notice(format!("{call}: {body}"));
                }
            }
            Err(e) => {
                warn!(call, error = %e, "Backend call failed");
                self.status.network_failed();
                self.status.set_notice(format!("{call} failed"));
            }
        }
    }

    fn on_command(&mut self, command: UserCommand) {
        debug!(?command, "Command");
        match command {
            UserCommand::Undo => self.undo(),
            UserCommand::Flip => self.sync.flip(&mut self.widget),
            UserCommand::Refresh => {
                self.sync.push_position(&mut self.widget, &self.position);
                self.refresh_status();
            }
            UserCommand::RefreshQueue => self.request_queue(),
            UserCommand::RequestAnalysis => {
                info!(plies = self.position.ply_count(), "Requesting game analysis");
                self.backend.request_analysis(self.position.pgn());
            }
            UserCommand::UploadPgn {
                file_name,
                contents,
            } => {
                info!(file_name = %file_name, "Uploading PGN");
                self.backend.upload_pgn(file_name, contents);
            }
            UserCommand::NextQuiz => {
                if self.mode == Mode::Quiz {
                    self.request_quiz();
                }
            }
            UserCommand::LoadPgn(text) => match GamePosition::from_pgn(&text) {
                Ok(position) => self.replace_position(position),
                Err(e) => {
                    warn!(error = %e, "Cannot load PGN");
                    self.status.set_notice(format!("cannot load PGN: {e}"));
                }
            },
            UserCommand::LoadFen(fen) => match GamePosition::from_fen(&fen) {
                Ok(position) => self.replace_position(position),
                Err(e) => {
                    warn!(error = %e, "Cannot load FEN");
                    self.status.set_notice(format!("cannot load FEN: {e}"));
                }
            },
        }
    }

    fn undo(&mut self) {
        if self.resolver.is_pending() {
            // The pending move was never committed; just drop it
            self.resolver.reset();
            self.sync.push_position(&mut self.widget, &self.position);
            return;
        }
        if self.mode == Mode::Quiz {
            debug!("Undo is not available in quiz mode");
            return;
        }

        let mut undone = 0;
        while let Some(applied) = self.position.undo() {
            debug!(san = %applied.san, "Undone");
            undone += 1;
            // In training, take back the reply together with the move it answered
            if self.mode != Mode::Training || self.position.turn() == self.trainer.player() {
                break;
            }
        }
        if undone == 0 {
            return;
        }

        self.trainer.cancel_reply();
        self.sync.push_position(&mut self.widget, &self.position);
        self.refresh_status();
    }

    /// Swap in a whole new game, dropping anything tied to the old one.
    fn replace_position(&mut self, position: GamePosition) {
        self.resolver.reset();
        self.trainer.reset(position.turn());
        self.position = position;
        info!(fen = %self.position.fen(), plies = self.position.ply_count(), "Position replaced");

        self.sync.push_position(&mut self.widget, &self.position);
        self.refresh_status();
    }
}
