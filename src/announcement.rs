// src/announcement.rs
//! Campaign announcement values as delivered by the announcements feed.
//!
//! Every evaluation-relevant field is optional: the feed is tolerated as-is and
//! incomplete entries are skipped later by the evaluator instead of failing the
//! whole decode.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use crate::title::normalize_title;

/// Placeholder token inside `action.url` that receives the article title.
pub const ARTICLE_TITLE_PLACEHOLDER: &str = "{{articleTitle}}";

/// Kind of announcement. Only surveys are kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementType {
    Survey,
    Fundraising,
    #[default]
    #[serde(other)]
    Other,
}

/// A single campaign announcement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "AnnouncementWire")]
pub struct Announcement {
    pub identifier: Option<String>,
    pub announcement_type: AnnouncementType,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub domain: Option<String>,
    /// Already normalized with [`normalize_title`].
    pub article_titles: Option<BTreeSet<String>>,
    pub display_delay: Option<Duration>,
    pub action_url_template: Option<String>,

    // UI copy, passed through untouched.
    pub text: Option<String>,
    pub action_title: Option<String>,
    pub negative_text: Option<String>,
}

impl Announcement {
    /// Empty announcement of the given type; fill it with the `with_*` builders.
    pub fn new(announcement_type: AnnouncementType) -> Self {
        Self {
            identifier: None,
            announcement_type,
            start_time: None,
            end_time: None,
            domain: None,
            article_titles: None,
            display_delay: None,
            action_url_template: None,
            text: None,
            action_title: None,
            negative_text: None,
        }
    }

    /// Survey announcement with the given campaign identifier.
    pub fn survey(identifier: impl Into<String>) -> Self {
        Self::new(AnnouncementType::Survey).with_identifier(identifier)
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Titles are normalized on the way in; ones that do not normalize are dropped.
    pub fn with_article_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.article_titles = Some(normalize_titles(titles));
        self
    }

    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = Some(delay);
        self
    }

    pub fn with_action_url_template(mut self, template: impl Into<String>) -> Self {
        self.action_url_template = Some(template.into());
        self
    }

    pub fn is_survey(&self) -> bool {
        self.announcement_type == AnnouncementType::Survey
    }

    /// Substitute `value` for `placeholder` in the action URL template.
    ///
    /// `None` when there is no template, the template lacks the placeholder, or
    /// the substituted string is not an absolute URL.
    pub fn action_url_replacing_placeholder(&self, placeholder: &str, value: &str) -> Option<Url> {
        let template = self.action_url_template.as_deref()?;
        if placeholder.is_empty() || !template.contains(placeholder) {
            return None;
        }
        Url::parse(&template.replace(placeholder, value)).ok()
    }
}

fn normalize_titles<I, S>(titles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    titles
        .into_iter()
        .filter_map(|t| normalize_title(t.as_ref()))
        .collect()
}

/* ----------------------------
Feed wire format
---------------------------- */

#[derive(Debug, Default, Deserialize)]
struct ActionWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnouncementWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: AnnouncementType,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default, rename = "articleTitles")]
    article_titles: Option<Vec<String>>,
    #[serde(default, rename = "displayDelay")]
    display_delay: Option<f64>,
    #[serde(default)]
    action: Option<ActionWire>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    negative_text: Option<String>,
}

fn parse_time(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl From<AnnouncementWire> for Announcement {
    fn from(w: AnnouncementWire) -> Self {
        let action = w.action.unwrap_or_default();
        Self {
            identifier: w.id.filter(|id| !id.trim().is_empty()),
            announcement_type: w.kind,
            start_time: parse_time(w.start_time),
            end_time: parse_time(w.end_time),
            domain: w.domain,
            article_titles: w.article_titles.map(normalize_titles),
            // negative / NaN / overflowing delays count as missing
            display_delay: w
                .display_delay
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            action_url_template: action.url,
            text: w.text,
            action_title: action.title,
            negative_text: w.negative_text,
        }
    }
}
