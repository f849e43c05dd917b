// src/lib.rs
// Public library surface for integration tests (and embedding apps).

pub mod announcement;
pub mod answers;
pub mod bootstrap;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod logging;
pub mod store;
pub mod title;

// ---- Re-exports for stable public API ----
pub use crate::announcement::{Announcement, AnnouncementType, ARTICLE_TITLE_PLACEHOLDER};
pub use crate::answers::{AnswerStore, FileAnswerStore, MemoryAnswerStore};
pub use crate::bootstrap::SurveyRuntime;
pub use crate::config::SurveyConfig;
pub use crate::eligibility::{
    Evaluation, SkipReason, SurveyEligibilityEvaluator, SurveyEligibilityResult,
    DEBUG_DISPLAY_DELAY,
};
pub use crate::error::AnswerStoreError;
pub use crate::store::AnnouncementStore;
pub use crate::title::{form_encode_title, normalize_title};
