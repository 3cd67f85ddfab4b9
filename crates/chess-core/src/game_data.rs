#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameMetadata {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
    pub fen: Option<String>, // custom start position
}

impl GameMetadata {
    /// Header pairs in PGN seven-tag-roster order, skipping unknown values.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = Vec::new();
        for (key, value) in [
            ("Event", &self.event),
            ("Date", &self.date),
            ("White", &self.white),
            ("Black", &self.black),
            ("Result", &self.result),
        ] {
            if let Some(v) = value {
                headers.push((key, v.as_str()));
            }
        }
        if let Some(fen) = &self.fen {
            headers.push(("SetUp", "1"));
            headers.push(("FEN", fen.as_str()));
        }
        headers
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
}
