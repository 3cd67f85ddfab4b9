//! Terminal front end for the board controller.
//!
//! Usage: cargo run --bin board-repl
//!
//! Moves are typed in coordinate notation (`e2e4`); while a promotion is
//! pending, answer with `q`, `r`, `b`, `n` or `cancel`. Reads BOARD_* and
//! QUIZ_* settings from the environment (or `.env`).

use std::path::PathBuf;

use board_controller::chess_core::shakmaty::{Board, Color, File, Piece, Position, Rank, Square};
use board_controller::chess_core::{GamePosition, MoveIntent};
use board_controller::status::{format_line, format_score};
use board_controller::{
    AnalysisClient, BoardInput, BoardWidget, ControllerConfig, NetworkStatus, PromotionChoice,
    Session, SessionEvent, StatusSink, StatusView, TokioBackend, UserCommand,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
moves:    e2e4, e7e8q
promote:  q | r | b | n | cancel (while the dialog is open)
commands: undo, flip, refresh, queue, analyze, next,
          upload <file.pgn>, load <file.pgn>, fen <fen>, help, quit";

/// ASCII board on stdout.
struct TerminalBoard {
    board: Board,
    orientation: Color,
    dirty: bool,
}

impl TerminalBoard {
    fn new() -> Self {
        Self {
            board: Board::default(),
            orientation: Color::White,
            dirty: true,
        }
    }

    fn render_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let (ranks, files): (Vec<Rank>, Vec<File>) = match self.orientation {
            Color::White => (Rank::ALL.into_iter().rev().collect(), File::ALL.to_vec()),
            Color::Black => (Rank::ALL.to_vec(), File::ALL.into_iter().rev().collect()),
        };

        println!();
        for rank in &ranks {
            let row: Vec<String> = files
                .iter()
                .map(|file| {
                    self.board
                        .piece_at(Square::from_coords(*file, *rank))
                        .map(|piece| piece.char().to_string())
                        .unwrap_or_else(|| ".".to_string())
                })
                .collect();
            println!("{} {}", rank.char(), row.join(" "));
        }
        let labels: Vec<String> = files.iter().map(|f| f.char().to_string()).collect();
        println!("  {}", labels.join(" "));
    }
}

impl BoardWidget for TerminalBoard {
    fn set_position(&mut self, fen: &str) {
        match GamePosition::from_fen(fen) {
            Ok(position) => {
                self.board = position.chess().board().clone();
                self.dirty = true;
            }
            Err(e) => warn!(fen, error = %e, "Widget got an unreadable FEN"),
        }
    }

    fn set_orientation(&mut self, color: Color) {
        if self.orientation != color {
            self.orientation = color;
            self.dirty = true;
        }
    }

    fn orientation(&self) -> Color {
        self.orientation
    }

    fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        match piece {
            Some(piece) => self.board.set_piece_at(square, piece),
            None => {
                self.board.remove_piece_at(square);
            }
        }
        self.dirty = true;
    }

    fn show_promotion_dialog(&mut self, square: Square, color: Color) {
        println!("Promote {color:?} pawn on {square}: q / r / b / n (or cancel)");
    }
}

struct TerminalStatus;

impl StatusSink for TerminalStatus {
    fn publish(&mut self, view: &StatusView) {
        println!("{}", view.fen);
        if !view.movetext.is_empty() {
            println!("{}", view.movetext);
        }
        for line in &view.lines {
            println!("  {}", format_line(line));
        }
        if let Some(best) = view.lines.first() {
            println!("eval {}", format_score(best.score));
        }
        if let Some(queue) = &view.queue {
            println!("analysis queue: {}", queue.size);
        }
        if let Some(solved) = view.solved {
            println!("solved: {solved}");
        }
        if let NetworkStatus::Degraded { failures } = view.network {
            println!("[backend unreachable, {failures} failed calls]");
        }
        if let Some(notice) = &view.notice {
            println!("* {notice}");
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Move(MoveIntent),
    Session(UserCommand),
    Upload(PathBuf),
    LoadFile(PathBuf),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "undo" => ReplCommand::Session(UserCommand::Undo),
        "flip" => ReplCommand::Session(UserCommand::Flip),
        "refresh" => ReplCommand::Session(UserCommand::Refresh),
        "queue" => ReplCommand::Session(UserCommand::RefreshQueue),
        "analyze" => ReplCommand::Session(UserCommand::RequestAnalysis),
        "next" => ReplCommand::Session(UserCommand::NextQuiz),
        "fen" if !rest.is_empty() => ReplCommand::Session(UserCommand::LoadFen(rest.to_string())),
        "upload" if !rest.is_empty() => ReplCommand::Upload(PathBuf::from(rest)),
        "load" if !rest.is_empty() => ReplCommand::LoadFile(PathBuf::from(rest)),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        _ => {
            let intent = line
                .parse::<MoveIntent>()
                .map_err(|e| format!("{e} (type 'help')"))?;
            ReplCommand::Move(intent)
        }
    };
    Ok(command)
}

/// Feed one typed line into the session. Returns false on quit.
async fn handle_line(session: &mut Session<TerminalBoard, TokioBackend>, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    if session.promotion().is_pending() {
        let word = line.trim();
        if !word.eq_ignore_ascii_case("undo") && !word.eq_ignore_ascii_case("quit") {
            let choice = PromotionChoice::from_code(Some(word));
            session.handle(SessionEvent::PromotionChosen(choice));
            return true;
        }
    }

    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return true;
        }
    };

    match command {
        ReplCommand::Move(intent) => {
            if session.on_board_input(BoardInput::ValidateMoveInput(intent)) {
                session.on_board_input(BoardInput::MoveInputFinished);
            } else {
                println!("{intent} is not accepted");
            }
        }
        ReplCommand::Session(command) => session.handle(SessionEvent::Command(command)),
        ReplCommand::Upload(path) => match tokio::fs::read(&path).await {
            Ok(contents) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "game.pgn".to_string());
                session.handle(SessionEvent::Command(UserCommand::UploadPgn {
                    file_name,
                    contents,
                }));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot read PGN file"),
        },
        ReplCommand::LoadFile(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => session.handle(SessionEvent::Command(UserCommand::LoadPgn(text))),
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot read PGN file"),
        },
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with the board
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ControllerConfig::from_env()?;
    info!(backend = %config.backend_url, mode = ?config.mode, "Config loaded");

    let client = AnalysisClient::new(&config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let backend = TokioBackend::new(client, tx);

    let mut session = Session::new(&config, TerminalBoard::new(), backend, Box::new(TerminalStatus))?;
    session.start();
    session.widget_mut().render_if_dirty();
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(&mut session, &line).await {
                    break;
                }
            }
            Some(event) = rx.recv() => session.handle(event),
        }
        session.widget_mut().render_if_dirty();
    }

    info!("Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        assert_eq!(
            parse_command("e2e4").unwrap(),
            ReplCommand::Move("e2e4".parse().unwrap())
        );
        assert_eq!(
            parse_command("  e7e8q ").unwrap(),
            ReplCommand::Move("e7e8q".parse().unwrap())
        );
        assert!(parse_command("e9e4").is_err());
        assert!(parse_command("hello").is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("undo").unwrap(),
            ReplCommand::Session(UserCommand::Undo)
        );
        assert_eq!(
            parse_command("QUEUE").unwrap(),
            ReplCommand::Session(UserCommand::RefreshQueue)
        );
        assert_eq!(
            parse_command("upload games/my game.pgn").unwrap(),
            ReplCommand::Upload(PathBuf::from("games/my game.pgn"))
        );
        assert_eq!(
            parse_command("fen 8/8/8/8/8/8/8/K1k5 w - - 0 1").unwrap(),
            ReplCommand::Session(UserCommand::LoadFen("8/8/8/8/8/8/8/K1k5 w - - 0 1".into()))
        );
        // Arguments are required
        assert!(parse_command("upload").is_err());
        assert_eq!(parse_command("quit").unwrap(), ReplCommand::Quit);
    }

    #[test]
    fn test_terminal_board_tracks_pieces() {
        let mut board = TerminalBoard::new();
        board.set_position("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(board.board.piece_at(Square::E1), Some(Color::White.king()));

        board.set_piece(Square::E8, Some(Color::White.queen()));
        assert_eq!(board.board.piece_at(Square::E8), Some(Color::White.queen()));
        board.set_piece(Square::E8, None);
        assert_eq!(board.board.piece_at(Square::E8), None);
    }
}
