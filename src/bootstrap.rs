// src/bootstrap.rs
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;
use url::Url;

use crate::announcement::Announcement;
use crate::answers::{AnswerStore, FileAnswerStore};
use crate::config::SurveyConfig;
use crate::eligibility::{Evaluation, SurveyEligibilityEvaluator};
use crate::error::AnswerStoreError;
use crate::store::AnnouncementStore;

/// Application-lifetime wiring of config, announcement store and evaluator.
/// Build once at startup and hand clones of the `Arc`s to whoever needs them.
pub struct SurveyRuntime {
    pub cfg: SurveyConfig,
    pub store: Arc<AnnouncementStore>,
    pub evaluator: SurveyEligibilityEvaluator,
}

impl SurveyRuntime {
    /// `SurveyConfig::load()` + file-backed answers.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = SurveyConfig::load()?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: SurveyConfig) -> anyhow::Result<Self> {
        let answers = FileAnswerStore::open(&cfg.answers_path).with_context(|| {
            format!("opening survey answer store {}", cfg.answers_path.display())
        })?;
        info!(
            "survey runtime: debug_mode={}, answers={}",
            cfg.debug_mode,
            cfg.answers_path.display()
        );
        Ok(Self::with_answer_store(cfg, Arc::new(answers)))
    }

    /// Use a custom answer store (platform preference API, tests, ...).
    pub fn with_answer_store(cfg: SurveyConfig, answers: Arc<dyn AnswerStore>) -> Self {
        let store = Arc::new(AnnouncementStore::new());
        let evaluator = SurveyEligibilityEvaluator::new(store.clone(), answers);
        Self {
            cfg,
            store,
            evaluator,
        }
    }

    /// Hand over a freshly fetched announcement list.
    pub fn replace_announcements(&self, list: Vec<Announcement>) {
        self.store.replace(list);
    }

    /// Evaluate using the configured debug mode.
    pub fn evaluate(&self, article_title: &str, site_url: &Url, now: DateTime<Utc>) -> Evaluation {
        self.evaluator
            .evaluate(article_title, site_url, now, self.cfg.debug_mode)
    }

    pub fn mark_answered(
        &self,
        campaign_identifier: &str,
        answer: bool,
    ) -> Result<(), AnswerStoreError> {
        self.evaluator.mark_answered(campaign_identifier, answer)
    }
}
