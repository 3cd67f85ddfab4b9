pub use chess_core;

pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod promotion;
pub mod quiz;
pub mod session;
pub mod status;
pub mod sync;
pub mod training;
pub mod validator;
pub mod widget;

pub use analysis::reconcile::{Reconciled, Reconciler, StaleReason, Ticket};
pub use analysis::{AnalysisClient, EvaluationLine, QueueSnapshot};
pub use config::{ControllerConfig, Mode};
pub use dispatch::{Backend, TokioBackend};
pub use error::{ClientError, ConfigError};
pub use promotion::{CancelPolicy, PromotionChoice, PromotionResolver, Resolution};
pub use quiz::{Quiz, QuizAdvance, ScoreBand};
pub use session::{Session, SessionEvent, UserCommand};
pub use status::{NetworkStatus, StatusSink, StatusView};
pub use validator::AttemptOutcome;
pub use widget::{BoardInput, BoardWidget};
