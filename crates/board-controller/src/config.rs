//! Controller configuration from environment variables

use std::env;
use std::str::FromStr;

use chess_core::GamePosition;

use crate::error::ConfigError;
use crate::promotion::CancelPolicy;
use crate::quiz::{QuizAdvance, ScoreBand};

/// Which page flavour the controller drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Free play with evaluation lines and the analysis queue
    #[default]
    Analysis,
    /// Puzzle solving against an expected answer
    Quiz,
    /// Free play where the engine answers from its cached lines
    Training,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" | "explore" => Ok(Mode::Analysis),
            "quiz" | "puzzle" => Ok(Mode::Quiz),
            "training" | "train" => Ok(Mode::Training),
            _ => Err(()),
        }
    }
}

/// Notation the backend should use for principal variations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvalNotation {
    #[default]
    San,
    Uci,
}

impl EvalNotation {
    pub fn as_str(self) -> &'static str {
        match self {
            EvalNotation::San => "san",
            EvalNotation::Uci => "uci",
        }
    }
}

impl FromStr for EvalNotation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "san" => Ok(EvalNotation::San),
            "uci" => Ok(EvalNotation::Uci),
            _ => Err(()),
        }
    }
}

/// Deployments disagree on the verb for the analyze call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnalyzeMethod {
    #[default]
    Post,
    Put,
}

impl FromStr for AnalyzeMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(AnalyzeMethod::Post),
            "PUT" => Ok(AnalyzeMethod::Put),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Base URL of the analysis backend, without trailing slash
    pub backend_url: String,
    pub mode: Mode,
    /// Starting position; standard start when unset
    pub initial_fen: Option<String>,
    pub eval_notation: EvalNotation,
    pub analyze_method: AnalyzeMethod,
    pub quiz_band: ScoreBand,
    pub quiz_advance: QuizAdvance,
    /// How many candidate lines the training reply is drawn from
    pub training_top_n: usize,
    pub promotion_cancel: CancelPolicy,
    pub request_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            mode: Mode::default(),
            initial_fen: None,
            eval_notation: EvalNotation::default(),
            analyze_method: AnalyzeMethod::default(),
            quiz_band: ScoreBand::default(),
            quiz_advance: QuizAdvance::default(),
            training_top_n: 5,
            promotion_cancel: CancelPolicy::default(),
            request_timeout_secs: 30,
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend_url = lookup("BOARD_BACKEND_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.backend_url);

        let initial_fen = lookup("BOARD_INITIAL_FEN").filter(|v| !v.trim().is_empty());
        if let Some(fen) = &initial_fen {
            // Fail at startup rather than on the first gesture
            GamePosition::from_fen(fen)?;
        }

        let quiz_band = ScoreBand {
            min: parsed(&lookup, "QUIZ_MIN")?.unwrap_or(defaults.quiz_band.min),
            max: parsed(&lookup, "QUIZ_MAX")?.unwrap_or(defaults.quiz_band.max),
        };
        if quiz_band.min > quiz_band.max {
            return Err(ConfigError::Invalid {
                key: "QUIZ_MIN",
                value: quiz_band.min.to_string(),
            });
        }

        let training_top_n: usize =
            parsed(&lookup, "TRAINING_TOP_N")?.unwrap_or(defaults.training_top_n);
        if training_top_n == 0 {
            return Err(ConfigError::Invalid {
                key: "TRAINING_TOP_N",
                value: "0".into(),
            });
        }

        Ok(Self {
            backend_url,
            mode: parsed(&lookup, "BOARD_MODE")?.unwrap_or(defaults.mode),
            initial_fen,
            eval_notation: parsed(&lookup, "BOARD_EVAL_NOTATION")?
                .unwrap_or(defaults.eval_notation),
            analyze_method: parsed(&lookup, "BOARD_ANALYZE_METHOD")?
                .unwrap_or(defaults.analyze_method),
            quiz_band,
            quiz_advance: parsed(&lookup, "QUIZ_ADVANCE")?.unwrap_or(defaults.quiz_advance),
            training_top_n,
            promotion_cancel: parsed(&lookup, "PROMOTION_CANCEL")?
                .unwrap_or(defaults.promotion_cancel),
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ControllerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.mode, Mode::Analysis);
        assert_eq!(config.quiz_band, ScoreBand { min: 100, max: 300 });
        assert_eq!(config.training_top_n, 5);
        assert_eq!(config.promotion_cancel, CancelPolicy::Reprompt);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_reads_overrides() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("BOARD_BACKEND_URL", "http://engine:9000/"),
            ("BOARD_MODE", "quiz"),
            ("QUIZ_MIN", "50"),
            ("QUIZ_MAX", "150"),
            ("QUIZ_ADVANCE", "await"),
            ("BOARD_ANALYZE_METHOD", "put"),
            ("PROMOTION_CANCEL", "abandon"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "http://engine:9000");
        assert_eq!(config.mode, Mode::Quiz);
        assert_eq!(config.quiz_band, ScoreBand { min: 50, max: 150 });
        assert_eq!(config.quiz_advance, QuizAdvance::AwaitNext);
        assert_eq!(config.analyze_method, AnalyzeMethod::Put);
        assert_eq!(config.promotion_cancel, CancelPolicy::Abandon);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ControllerConfig::from_lookup(lookup_from(&[("BOARD_MODE", "blitz")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup_from(&[("QUIZ_MIN", "abc")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup_from(&[("TRAINING_TOP_N", "0")])).is_err());
        assert!(matches!(
            ControllerConfig::from_lookup(lookup_from(&[("BOARD_INITIAL_FEN", "nonsense")])),
            Err(ConfigError::Position(_))
        ));
    }
}
