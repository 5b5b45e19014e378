use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    intents::{Intent, IntentKind},
    owner_of_key,
};
use crate::{
    portfolio::{repo::Repository, repo_types::Record},
    state::AppState,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Delete intents whose object is now gone.
    pub deleted: usize,
    /// Uploads no entity ended up referencing.
    pub orphans_purged: usize,
    /// Uploads found attached; intent just closed.
    pub confirmed: usize,
    /// Delete intents dropped because a record still points at the object.
    pub retained: usize,
    pub failed: usize,
}

impl SweepReport {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Settles every intent older than `grace`.
#[instrument(skip(state))]
pub async fn sweep_once(state: &AppState, grace: Duration) -> anyhow::Result<SweepReport> {
    let cutoff = OffsetDateTime::now_utc() - time::Duration::seconds(grace.as_secs() as i64);
    let pending = state.intents.pending(cutoff).await?;
    let mut report = SweepReport::default();

    for intent in pending {
        match settle_intent(state, &intent).await {
            Ok(Outcome::Deleted) => report.deleted += 1,
            Ok(Outcome::Purged) => report.orphans_purged += 1,
            Ok(Outcome::Confirmed) => report.confirmed += 1,
            Ok(Outcome::Retained) => report.retained += 1,
            Err(e) => {
                warn!(
                    key = %intent.key,
                    kind = intent.kind.as_str(),
                    recorded_at = %intent.created_at,
                    error = ?e,
                    "intent not settled"
                );
                report.failed += 1;
                continue;
            }
        }
        state.intents.complete(intent.id).await?;
    }
    Ok(report)
}

enum Outcome {
    Deleted,
    Purged,
    Confirmed,
    Retained,
}

async fn settle_intent(state: &AppState, intent: &Intent) -> anyhow::Result<Outcome> {
    let referenced = match owner_of_key(&intent.key) {
        Some(owner) => is_referenced(state, owner, &intent.key).await?,
        None => false,
    };
    match intent.kind {
        // the mutation that wanted this gone was aborted
        IntentKind::Delete if referenced => {
            info!(key = %intent.key, "delete intent dropped; object still referenced");
            Ok(Outcome::Retained)
        }
        IntentKind::Delete => {
            state.files.remove_key(&intent.key).await?;
            Ok(Outcome::Deleted)
        }
        IntentKind::Attach => {
            if referenced {
                return Ok(Outcome::Confirmed);
            }
            state.files.remove_key(&intent.key).await?;
            Ok(Outcome::Purged)
        }
    }
}

async fn is_referenced(state: &AppState, owner: Uuid, key: &str) -> anyhow::Result<bool> {
    Ok(references(state.work_experiences.as_ref(), owner, key).await?
        || references(state.certificates.as_ref(), owner, key).await?
        || references(state.educations.as_ref(), owner, key).await?
        || references(state.projects.as_ref(), owner, key).await?)
}

async fn references<R: Record>(
    repo: &dyn Repository<R>,
    owner: Uuid,
    key: &str,
) -> anyhow::Result<bool> {
    Ok(repo
        .list_owned(owner)
        .await?
        .iter()
        .any(|record| record.file_keys().iter().any(|k| k == key)))
}

/// Background sweep on a fixed period. `None` when disabled.
pub fn spawn_sweeper(state: AppState) -> Option<JoinHandle<()>> {
    let period = state.config.sweep.interval_secs;
    if period == 0 {
        info!("storage intent sweep disabled");
        return None;
    }
    let grace = Duration::from_secs(state.config.sweep.grace_secs);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(period));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sweep_once(&state, grace).await {
                Ok(report) if report.is_empty() => {}
                Ok(report) => info!(?report, "storage intents swept"),
                Err(e) => error!(error = ?e, "storage intent sweep failed"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        files::{
            reconcile::{Reconciler, SlotChange},
            IncomingFile,
        },
        portfolio::repo_types::ProjectDraft,
        testing::test_env,
    };
    use bytes::Bytes;

    fn pdf() -> IncomingFile {
        IncomingFile {
            filename: "cv.pdf".into(),
            content_type: "application/pdf".into(),
            body: Bytes::from_static(b"%PDF"),
        }
    }

    #[tokio::test]
    async fn unreferenced_upload_is_purged() {
        let env = test_env();
        let mut rc = Reconciler::new(&env.state, Uuid::new_v4());
        let stored = rc.slot(None, SlotChange::Replace(pdf())).await.unwrap().unwrap();
        drop(rc);

        let report = sweep_once(&env.state, Duration::ZERO).await.unwrap();
        assert_eq!(report.orphans_purged, 1);
        assert!(!env.storage.contains(&stored.key));
        assert!(env.intents.open().is_empty());
    }

    #[tokio::test]
    async fn referenced_upload_is_kept() {
        let env = test_env();
        let owner = Uuid::new_v4();
        let mut rc = Reconciler::new(&env.state, owner);
        let stored = rc.slot(None, SlotChange::Replace(pdf())).await.unwrap().unwrap();
        let draft = crate::portfolio::repo_types::WorkExperienceDraft {
            title: "Engineer".into(),
            company: "Acme".into(),
            employment_type: "Full-time".into(),
            start_date: OffsetDateTime::UNIX_EPOCH,
            end_date: None,
            skills: vec![],
            description: "Built things".into(),
            contract_file: Some(stored.clone()),
            feedback_file: None,
            is_public: true,
        };
        env.state.work_experiences.create(owner, draft).await.unwrap();
        // entity persisted but intent never settled, e.g. a crash between the two
        drop(rc);

        let report = sweep_once(&env.state, Duration::ZERO).await.unwrap();
        assert_eq!(report.confirmed, 1);
        assert!(env.storage.contains(&stored.key));
    }

    #[tokio::test]
    async fn failed_delete_is_retried_until_it_succeeds() {
        let env = test_env();
        let rc = Reconciler::new(&env.state, Uuid::new_v4());
        let key = env
            .state
            .files
            .store(Uuid::new_v4(), "x.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .unwrap()
            .key;
        env.storage.fail_deletes(true);
        assert!(rc.release(&key).await.is_err());

        let report = sweep_once(&env.state, Duration::ZERO).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(env.intents.open_of(IntentKind::Delete), vec![key.clone()]);

        env.storage.fail_deletes(false);
        let report = sweep_once(&env.state, Duration::ZERO).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert!(!env.storage.contains(&key));
        assert!(env.intents.open().is_empty());
    }

    #[tokio::test]
    async fn aborted_delete_keeps_object_the_record_still_uses() {
        let env = test_env();
        let owner = Uuid::new_v4();
        let mut rc = Reconciler::new(&env.state, owner);
        let stored = rc.slot(None, SlotChange::Replace(pdf())).await.unwrap().unwrap();
        rc.settle().await;
        let draft = crate::portfolio::repo_types::WorkExperienceDraft {
            title: "Engineer".into(),
            company: "Acme".into(),
            employment_type: "Full-time".into(),
            start_date: OffsetDateTime::UNIX_EPOCH,
            end_date: None,
            skills: vec![],
            description: "Built things".into(),
            contract_file: Some(stored.clone()),
            feedback_file: None,
            is_public: true,
        };
        env.state.work_experiences.create(owner, draft).await.unwrap();

        env.storage.fail_deletes(true);
        let rc = Reconciler::new(&env.state, owner);
        assert!(rc.release(&stored.key).await.is_err());
        env.storage.fail_deletes(false);

        let report = sweep_once(&env.state, Duration::ZERO).await.unwrap();
        assert_eq!(report.retained, 1);
        assert_eq!(report.deleted, 0);
        assert!(env.storage.contains(&stored.key));
        assert!(env.intents.open().is_empty());
    }

    #[tokio::test]
    async fn young_intents_wait_for_grace_period() {
        let env = test_env();
        let mut rc = Reconciler::new(&env.state, Uuid::new_v4());
        rc.slot(None, SlotChange::Replace(pdf())).await.unwrap();

        let report = sweep_once(&env.state, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(env.intents.open().len(), 1);
    }

    #[tokio::test]
    async fn projects_never_reference_files() {
        let env = test_env();
        let owner = Uuid::new_v4();
        let project = env
            .state
            .projects
            .create(
                owner,
                ProjectDraft {
                    title: "Folio".into(),
                    skills: vec![],
                    description: "This site".into(),
                    project_url: "https://example.com".into(),
                    is_public: true,
                },
            )
            .await
            .unwrap();
        assert!(project.file_keys().is_empty());
        assert!(!is_referenced(&env.state, owner, "anything").await.unwrap());
    }
}
