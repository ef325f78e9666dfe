//! Derived cache rules.
//!
//! Two values are derived from the database and held in the cache layer:
//! the nearly-sold-out announcement and the per-conference featured speaker.
//! Readers never compute; they return the cached value or an empty string.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::CacheLayer;
use crate::error::AppResult;
use crate::models::{Conference, Session, Speaker};

/// Cache key for the sold-out announcement.
const ANNOUNCEMENT_KEY: &str = "derived:announcement";

/// Global featured-speaker key; last recomputation wins.
const FEATURED_SPEAKER_KEY: &str = "derived:featured-speaker";

/// Cache key prefix for per-conference featured speakers.
const FEATURED_SPEAKER_PREFIX: &str = "derived:featured-speaker:";

/// A conference is nearly sold out with five or fewer seats remaining.
fn format_announcement(names: &[String]) -> String {
    format!(
        "Last chance to attend! The following conferences are nearly sold out: {}",
        names.join(", ")
    )
}

fn format_featured_speaker(conference_name: &str, first_name: &str, last_name: &str) -> String {
    format!("Our featured speaker for {conference_name} is: {first_name} {last_name}!")
}

fn featured_speaker_key(conference_id: Uuid) -> String {
    format!("{FEATURED_SPEAKER_PREFIX}{conference_id}")
}

/// Computes and serves the derived cache values.
#[derive(Debug, Clone)]
pub struct DerivedCacheRules {
    pool: PgPool,
    cache: CacheLayer,
}

impl DerivedCacheRules {
    /// Create a new rule set over the given pool and cache.
    pub fn new(pool: PgPool, cache: CacheLayer) -> Self {
        Self { pool, cache }
    }

    /// Recompute the nearly-sold-out announcement.
    ///
    /// Caches the message when any conference qualifies; clears the key
    /// otherwise so a stale announcement never outlives its conferences.
    /// Returns the stored message, empty when none qualifies.
    pub async fn recompute_announcement(&self) -> AppResult<String> {
        let names = Conference::nearly_sold_out_names(&self.pool).await?;

        if names.is_empty() {
            self.cache.invalidate(ANNOUNCEMENT_KEY).await;
            debug!("no nearly sold out conferences, announcement cleared");
            return Ok(String::new());
        }

        let announcement = format_announcement(&names);
        self.cache.set(ANNOUNCEMENT_KEY, &announcement, 0).await;
        info!(conferences = names.len(), "announcement recomputed");

        Ok(announcement)
    }

    /// Current announcement, empty when none is cached.
    pub async fn announcement(&self) -> String {
        self.cache.get(ANNOUNCEMENT_KEY).await.unwrap_or_default()
    }

    /// Recompute the featured speaker for one conference.
    ///
    /// A speaker with more than one session in the conference becomes
    /// featured; with one or none the key is cleared. Called after each
    /// session creation for the session's speaker.
    pub async fn recompute_featured_speaker(
        &self,
        conference_id: Uuid,
        speaker_id: Uuid,
    ) -> AppResult<String> {
        let key = featured_speaker_key(conference_id);
        let session_count = Session::count_for_speaker(&self.pool, conference_id, speaker_id).await?;

        if session_count <= 1 {
            self.cache.invalidate(&key).await;
            debug!(
                conference_id = %conference_id,
                speaker_id = %speaker_id,
                "speaker not featured, key cleared"
            );
            return Ok(String::new());
        }

        let (Some(conference), Some(speaker)) = (
            Conference::find_by_id(&self.pool, conference_id).await?,
            Speaker::find_by_id(&self.pool, speaker_id).await?,
        ) else {
            self.cache.invalidate(&key).await;
            return Ok(String::new());
        };

        let message =
            format_featured_speaker(&conference.name, &speaker.first_name, &speaker.last_name);
        self.cache.set(&key, &message, 0).await;
        // The global key carries the most recently featured speaker across
        // all conferences.
        self.cache.set(FEATURED_SPEAKER_KEY, &message, 0).await;
        info!(
            conference_id = %conference_id,
            speaker_id = %speaker_id,
            session_count,
            "featured speaker recomputed"
        );

        Ok(message)
    }

    /// Current featured-speaker message, empty when none.
    ///
    /// Without a conference the global key answers: the most recently
    /// featured speaker anywhere.
    pub async fn featured_speaker(&self, conference_id: Option<Uuid>) -> String {
        let key = match conference_id {
            Some(id) => featured_speaker_key(id),
            None => FEATURED_SPEAKER_KEY.to_string(),
        };

        self.cache.get(&key).await.unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn announcement_joins_names_with_commas() {
        let names = vec!["RustConf".to_string(), "StrangeLoop".to_string()];
        assert_eq!(
            format_announcement(&names),
            "Last chance to attend! The following conferences are nearly sold out: \
             RustConf, StrangeLoop"
        );
    }

    #[test]
    fn announcement_with_single_name_has_no_separator() {
        let names = vec!["RustConf".to_string()];
        assert_eq!(
            format_announcement(&names),
            "Last chance to attend! The following conferences are nearly sold out: RustConf"
        );
    }

    #[test]
    fn featured_speaker_message_format() {
        assert_eq!(
            format_featured_speaker("RustConf", "Grace", "Hopper"),
            "Our featured speaker for RustConf is: Grace Hopper!"
        );
    }

    #[test]
    fn featured_speaker_keys_are_per_conference() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_ne!(featured_speaker_key(a), featured_speaker_key(b));
        assert!(featured_speaker_key(a).starts_with(FEATURED_SPEAKER_PREFIX));
    }

    #[test]
    fn global_key_distinct_from_conference_keys() {
        let id = Uuid::now_v7();
        assert_ne!(featured_speaker_key(id), FEATURED_SPEAKER_KEY);
        // And both featured keys stay out of the announcement's namespace.
        assert_ne!(FEATURED_SPEAKER_KEY, ANNOUNCEMENT_KEY);
    }
}
