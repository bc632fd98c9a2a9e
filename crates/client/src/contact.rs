// Contact form: bot heuristics and submission

use folio_content::ContactEndpoint;
use folio_core::Language;
use std::time::Duration;

/// Hidden field real visitors leave empty
pub const HONEYPOT_FIELD: &str = "website";
/// Field carrying the visitor's UI language
pub const LANGUAGE_FIELD: &str = "Lang";
/// Anything faster than this after the form loaded is treated as a bot
pub const MIN_SUBMIT_TIME: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Looked like a bot; nothing was sent
    Ignored,
    Sent,
    Failed(String),
}

pub fn is_bot(fields: &[(String, String)], elapsed: Duration) -> bool {
    let honeypot_filled = fields
        .iter()
        .any(|(name, value)| name == HONEYPOT_FIELD && !value.is_empty());
    honeypot_filled || elapsed < MIN_SUBMIT_TIME
}

/// Fields as submitted: honeypot removed, language set to the current one
pub fn prepare_fields(fields: &[(String, String)], language: Language) -> Vec<(String, String)> {
    let mut prepared: Vec<(String, String)> = fields
        .iter()
        .filter(|(name, _)| name != HONEYPOT_FIELD && name != LANGUAGE_FIELD)
        .cloned()
        .collect();
    prepared.push((LANGUAGE_FIELD.to_string(), language.code().to_string()));
    prepared
}

/// Submit the form unless it looks automated. Bots are dropped silently.
pub async fn submit<E>(
    endpoint: &E,
    fields: &[(String, String)],
    elapsed: Duration,
    language: Language,
) -> SubmitOutcome
where
    E: ContactEndpoint + ?Sized,
{
    if is_bot(fields, elapsed) {
        log::debug!("[client] Dropping contact submission flagged as automated");
        return SubmitOutcome::Ignored;
    }

    match endpoint.submit(&prepare_fields(fields, language)).await {
        Ok(()) => SubmitOutcome::Sent,
        Err(e) => {
            log::error!("[client] Contact submission failed: {}", e);
            SubmitOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folio_core::{Error, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeEndpoint {
        received: Mutex<Vec<Vec<(String, String)>>>,
        fail: bool,
    }

    #[async_trait]
    impl ContactEndpoint for FakeEndpoint {
        async fn submit(&self, fields: &[(String, String)]) -> Result<()> {
            if self.fail {
                return Err(Error::Http("connection refused".to_string()));
            }
            self.received.lock().unwrap().push(fields.to_vec());
            Ok(())
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const HUMAN_DELAY: Duration = Duration::from_secs(20);

    #[test]
    fn test_honeypot_flags_bot() {
        let form = fields(&[("Name", "Sam"), ("website", "http://spam.example")]);
        assert!(is_bot(&form, HUMAN_DELAY));

        let form = fields(&[("Name", "Sam"), ("website", "")]);
        assert!(!is_bot(&form, HUMAN_DELAY));
    }

    #[test]
    fn test_fast_submission_flags_bot() {
        let form = fields(&[("Name", "Sam")]);
        assert!(is_bot(&form, Duration::from_millis(2999)));
        assert!(!is_bot(&form, Duration::from_millis(3000)));
    }

    #[test]
    fn test_prepare_fields() {
        let form = fields(&[
            ("Name", "Sam"),
            ("website", ""),
            ("Lang", "en"),
            ("Message", "Hello"),
        ]);

        assert_eq!(
            prepare_fields(&form, Language::Ar),
            fields(&[("Name", "Sam"), ("Message", "Hello"), ("Lang", "ar")])
        );
    }

    #[tokio::test]
    async fn test_submit_sends_prepared_fields() {
        let endpoint = FakeEndpoint::default();
        let form = fields(&[("Name", "Sam"), ("website", "")]);

        let outcome = submit(&endpoint, &form, HUMAN_DELAY, Language::En).await;

        assert_eq!(outcome, SubmitOutcome::Sent);
        assert_eq!(
            *endpoint.received.lock().unwrap(),
            vec![fields(&[("Name", "Sam"), ("Lang", "en")])]
        );
    }

    #[tokio::test]
    async fn test_bot_submission_is_silently_ignored() {
        let endpoint = FakeEndpoint::default();
        let form = fields(&[("Name", "Sam")]);

        let outcome = submit(&endpoint, &form, Duration::from_millis(500), Language::En).await;

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(endpoint.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_failure_is_reported() {
        let endpoint = FakeEndpoint {
            fail: true,
            ..FakeEndpoint::default()
        };
        let form = fields(&[("Name", "Sam")]);

        let outcome = submit(&endpoint, &form, HUMAN_DELAY, Language::En).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(message) if message.contains("connection refused")));
    }
}
