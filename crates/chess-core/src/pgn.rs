//! PGN utilities: a lightweight regex-based parser and movetext writer.

use regex::Regex;
use shakmaty::Color;

use crate::error::PositionError;
use crate::game_data::{GameMetadata, GameRecord};

/// Parse a PGN string into a GameRecord.
/// Only the mainline is kept; comments and variations are dropped.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, PositionError> {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#)
        .map_err(|e| PositionError::InvalidPgn(e.to_string()))?;

    let mut metadata = GameMetadata::default();
    let mut setup = None;
    let mut fen = None;

    for cap in header_re.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => metadata.white = Some(value),
            "Black" => metadata.black = Some(value),
            "Result" => metadata.result = Some(value),
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // A FEN header without SetUp is still honoured; SetUp "0" disables it
    if setup.as_deref() != Some("0") {
        metadata.fen = fen;
    }

    let moves = extract_moves(pgn)?;
    if moves.is_empty() && metadata.fen.is_none() && !pgn.contains('[') {
        return Err(PositionError::InvalidPgn("no headers and no moves".into()));
    }

    Ok(GameRecord { metadata, moves })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Result<Vec<String>, PositionError> {
    let regex = |pattern: &str| {
        Regex::new(pattern).map_err(|e| PositionError::InvalidPgn(e.to_string()))
    };

    // Remove headers
    let no_headers = regex(r"\[[^\]]*\]")?.replace_all(pgn, "").into_owned();

    // Remove comments
    let no_comments = regex(r"\{[^}]*\}")?.replace_all(&no_headers, "").into_owned();

    // Remove variations
    let no_variations = regex(r"\([^)]*\)")?.replace_all(&no_comments, "").into_owned();

    // Extract moves
    let move_re = regex(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")?;

    Ok(move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Write numbered movetext: `1. e4 e5 2. Nf3`, or `3... Nc6 4. Bb5` when
/// the game starts with Black to move.
pub fn write_movetext(
    first_move_number: u32,
    first_turn: Color,
    sans: &[String],
    result: Option<&str>,
) -> String {
    let mut parts = Vec::with_capacity(sans.len() + sans.len() / 2 + 2);
    let mut number = first_move_number;
    let mut turn = first_turn;

    for (i, san) in sans.iter().enumerate() {
        match turn {
            Color::White => parts.push(format!("{number}.")),
            Color::Black if i == 0 => parts.push(format!("{number}...")),
            Color::Black => {}
        }
        parts.push(san.clone());

        if turn == Color::Black {
            number += 1;
        }
        turn = !turn;
    }

    if let Some(r) = result {
        parts.push(r.to_string());
    }
    parts.join(" ")
}
