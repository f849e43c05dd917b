//! # Survey Eligibility
//! Decides whether a reader on a given article/site should get a campaign's
//! survey prompt, and records answers so a campaign is prompted at most once.
//!
//! Policy: announcements are scanned in snapshot order (insertion order of the
//! last `replace`) and the first eligible one wins. Simultaneously eligible
//! campaigns are not ranked.
//!
//! Per announcement, all of these must hold:
//! - identifier, window, domain, titles and delay are present
//! - the action URL template accepts the form-encoded title
//! - the campaign has no answer record
//! - the site host equals the announcement domain
//! - the normalized article title is listed
//! - `start < now < end` (normal mode only)

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::announcement::{Announcement, ARTICLE_TITLE_PLACEHOLDER};
use crate::answers::AnswerStore;
use crate::error::AnswerStoreError;
use crate::logging::anon_hash;
use crate::store::AnnouncementStore;
use crate::title::{form_encode_title, normalize_title};

/// Delay used in debug mode regardless of the campaign's own delay.
pub const DEBUG_DISPLAY_DELAY: Duration = Duration::from_secs(10);

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "survey_eligibility_evaluations_total",
            "Eligibility evaluations performed."
        );
        describe_counter!(
            "survey_eligibility_matches_total",
            "Evaluations that produced an eligible campaign, by mode."
        );
        describe_counter!(
            "survey_eligibility_skipped_total",
            "Announcements skipped during evaluation, by reason."
        );
        describe_counter!(
            "survey_answer_store_errors_total",
            "Answer store lookups or writes that failed."
        );
        describe_counter!("survey_answers_marked_total", "Answer records written.");
    });
}

/// An eligible campaign for the current article view.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyEligibilityResult {
    pub campaign_identifier: String,
    pub announcement: Announcement,
    pub action_url: Url,
    pub display_delay: Duration,
}

/// Outcome of [`SurveyEligibilityEvaluator::evaluate`].
///
/// `lookup_errors` is non-empty when the answer store could not be read for
/// some campaign. Such campaigns were treated as unanswered.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub result: Option<SurveyEligibilityResult>,
    pub lookup_errors: Vec<AnswerStoreError>,
}

impl Evaluation {
    pub fn is_degraded(&self) -> bool {
        !self.lookup_errors.is_empty()
    }

    pub fn into_result(self) -> Option<SurveyEligibilityResult> {
        self.result
    }
}

/// Why an announcement was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingFields,
    InvalidActionUrl,
    AlreadyAnswered,
    OutsideWindow,
    DomainMismatch,
    TitleNotListed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingFields => "missing_fields",
            SkipReason::InvalidActionUrl => "invalid_action_url",
            SkipReason::AlreadyAnswered => "already_answered",
            SkipReason::OutsideWindow => "outside_window",
            SkipReason::DomainMismatch => "domain_mismatch",
            SkipReason::TitleNotListed => "title_not_listed",
        }
    }
}

/// Borrowed view of the fields an announcement needs to be evaluable.
struct Required<'a> {
    identifier: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    domain: &'a str,
    titles: &'a std::collections::BTreeSet<String>,
    delay: Duration,
}

impl<'a> Required<'a> {
    fn of(a: &'a Announcement) -> Option<Self> {
        Some(Self {
            identifier: a.identifier.as_deref()?,
            start: a.start_time?,
            end: a.end_time?,
            domain: a.domain.as_deref()?,
            titles: a.article_titles.as_ref()?,
            delay: a.display_delay?,
        })
    }
}

/// Per-call inputs after validation.
struct Candidate<'a> {
    title: String,
    form_title: String,
    host: &'a str,
    now: DateTime<Utc>,
    debug_mode: bool,
}

/// Eligibility evaluator over a shared announcement store and answer store.
#[derive(Clone)]
pub struct SurveyEligibilityEvaluator {
    store: Arc<AnnouncementStore>,
    answers: Arc<dyn AnswerStore>,
}

impl SurveyEligibilityEvaluator {
    pub fn new(store: Arc<AnnouncementStore>, answers: Arc<dyn AnswerStore>) -> Self {
        ensure_metrics_described();
        Self { store, answers }
    }

    pub fn store(&self) -> &Arc<AnnouncementStore> {
        &self.store
    }

    /// Find the first campaign eligible for `article_title` on `site_url` at `now`.
    ///
    /// With `is_debug_mode` the campaign window is ignored and the display
    /// delay is [`DEBUG_DISPLAY_DELAY`].
    pub fn evaluate(
        &self,
        article_title: &str,
        site_url: &Url,
        now: DateTime<Utc>,
        is_debug_mode: bool,
    ) -> Evaluation {
        counter!("survey_eligibility_evaluations_total").increment(1);
        let mut evaluation = Evaluation::default();

        let Some(host) = site_url.host_str() else {
            debug!(site = %site_url, "site url has no host; nothing eligible");
            return evaluation;
        };
        let Some(title) = normalize_title(article_title) else {
            debug!(
                title_id = %anon_hash(article_title),
                "article title does not normalize; nothing eligible"
            );
            return evaluation;
        };
        let candidate = Candidate {
            form_title: form_encode_title(&title),
            title,
            host,
            now,
            debug_mode: is_debug_mode,
        };

        for announcement in self.store.snapshot() {
            match self.assess(&announcement, &candidate, &mut evaluation.lookup_errors) {
                Ok(result) => {
                    let mode = if is_debug_mode { "debug" } else { "normal" };
                    counter!("survey_eligibility_matches_total", "mode" => mode).increment(1);
                    info!(
                        campaign = %result.campaign_identifier,
                        title_id = %anon_hash(&candidate.title),
                        delay_secs = result.display_delay.as_secs_f64(),
                        mode,
                        "survey campaign eligible"
                    );
                    evaluation.result = Some(result);
                    break;
                }
                Err(reason) => {
                    counter!("survey_eligibility_skipped_total", "reason" => reason.as_str())
                        .increment(1);
                    debug!(
                        campaign = announcement.identifier.as_deref().unwrap_or("<none>"),
                        reason = reason.as_str(),
                        "announcement skipped"
                    );
                }
            }
        }

        evaluation
    }

    fn assess(
        &self,
        announcement: &Announcement,
        c: &Candidate<'_>,
        lookup_errors: &mut Vec<AnswerStoreError>,
    ) -> Result<SurveyEligibilityResult, SkipReason> {
        let req = Required::of(announcement).ok_or(SkipReason::MissingFields)?;

        let action_url = announcement
            .action_url_replacing_placeholder(ARTICLE_TITLE_PLACEHOLDER, &c.form_title)
            .ok_or(SkipReason::InvalidActionUrl)?;

        // A failed lookup counts as unanswered: one extra prompt beats never
        // prompting again. The caller learns about it through `lookup_errors`.
        match self.answers.exists(req.identifier) {
            Ok(true) => return Err(SkipReason::AlreadyAnswered),
            Ok(false) => {}
            Err(e) => {
                counter!("survey_answer_store_errors_total").increment(1);
                warn!(campaign = req.identifier, error = %e, "answer lookup failed; treating as unanswered");
                lookup_errors.push(e);
            }
        }

        if !c.debug_mode && !(c.now > req.start && c.now < req.end) {
            return Err(SkipReason::OutsideWindow);
        }
        if c.host != req.domain {
            return Err(SkipReason::DomainMismatch);
        }
        if !req.titles.contains(&c.title) {
            return Err(SkipReason::TitleNotListed);
        }

        let display_delay = if c.debug_mode {
            DEBUG_DISPLAY_DELAY
        } else {
            req.delay
        };

        Ok(SurveyEligibilityResult {
            campaign_identifier: req.identifier.to_string(),
            announcement: announcement.clone(),
            action_url,
            display_delay,
        })
    }

    /// Record that the reader answered (or dismissed) `campaign_identifier`.
    /// Storage failures are returned as-is and not retried.
    pub fn mark_answered(
        &self,
        campaign_identifier: &str,
        answer: bool,
    ) -> Result<(), AnswerStoreError> {
        match self.answers.set(campaign_identifier, answer) {
            Ok(()) => {
                counter!("survey_answers_marked_total").increment(1);
                info!(campaign = campaign_identifier, answer, "survey answer recorded");
                Ok(())
            }
            Err(e) => {
                counter!("survey_answer_store_errors_total").increment(1);
                warn!(campaign = campaign_identifier, error = %e, "failed to record survey answer");
                Err(e)
            }
        }
    }
}
