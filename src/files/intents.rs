//! Write-ahead log of storage side effects.
//!
//! An intent is recorded before an object is uploaded for an entity or deleted,
//! and completed once the effect is settled. Whatever stays pending is picked up
//! by [`super::sweep`].

use anyhow::Context;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Attach,
    Delete,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::Attach => "attach",
            IntentKind::Delete => "delete",
        }
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "attach" => Ok(IntentKind::Attach),
            "delete" => Ok(IntentKind::Delete),
            other => anyhow::bail!("unknown intent kind {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Intent {
    pub id: Uuid,
    pub kind: IntentKind,
    pub key: String,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait IntentLog: Send + Sync {
    async fn record(&self, kind: IntentKind, key: &str) -> anyhow::Result<Uuid>;
    async fn complete(&self, id: Uuid) -> anyhow::Result<()>;
    /// Pending intents created at or before `cutoff`, oldest first.
    async fn pending(&self, cutoff: OffsetDateTime) -> anyhow::Result<Vec<Intent>>;
}

#[async_trait]
impl IntentLog for PgStore {
    async fn record(&self, kind: IntentKind, key: &str) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO storage_intents (id, kind, object_key)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(key)
        .execute(&self.pool)
        .await
        .context("record storage intent")?;
        Ok(id)
    }

    async fn complete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE storage_intents
               SET completed_at = now()
             WHERE id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("complete storage intent")?;
        Ok(())
    }

    async fn pending(&self, cutoff: OffsetDateTime) -> anyhow::Result<Vec<Intent>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, OffsetDateTime)>(
            r#"
            SELECT id, kind, object_key, created_at
              FROM storage_intents
             WHERE completed_at IS NULL AND created_at <= $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .context("list pending storage intents")?;

        rows.into_iter()
            .map(|(id, kind, key, created_at)| {
                Ok(Intent {
                    id,
                    kind: IntentKind::parse(&kind)?,
                    key,
                    created_at,
                })
            })
            .collect()
    }
}
