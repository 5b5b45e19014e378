use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    types::Json,
    FromRow, Postgres,
};
use uuid::Uuid;

use super::repo_types::{
    Certificate, CertificateDraft, Education, EducationDraft, Project, ProjectDraft, Record,
    WorkExperience, WorkExperienceDraft,
};
use crate::db::PgStore;

/// Persistence contract for one entity kind. Mutations are scoped to `(owner, id)`;
/// a record owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait Repository<R: Record>: Send + Sync {
    /// Public records plus the viewer's own private ones.
    async fn list_visible(&self, viewer: Option<Uuid>) -> anyhow::Result<Vec<R>>;
    async fn list_owned(&self, owner: Uuid) -> anyhow::Result<Vec<R>>;
    async fn get(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<R>>;
    async fn create(&self, owner: Uuid, draft: R::Draft) -> anyhow::Result<R>;
    /// Replaces every mutable field. `None` when no such record is owned by `owner`.
    async fn update(&self, owner: Uuid, id: Uuid, draft: R::Draft) -> anyhow::Result<Option<R>>;
    /// `true` when a row was removed.
    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

type RecordQuery<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

/// Table layout of a record. `FIELDS` are the mutable columns, in `bind_draft` order.
pub trait PgRecord: Record + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const FIELDS: &'static [&'static str];

    fn bind_draft<'q>(query: RecordQuery<'q, Self>, draft: Self::Draft) -> RecordQuery<'q, Self>;

    fn select_list() -> String {
        let mut cols = vec!["id", "owner_id"];
        cols.extend_from_slice(Self::FIELDS);
        cols.extend_from_slice(&["created_at", "updated_at"]);
        cols.join(", ")
    }
}

#[async_trait]
impl<R: PgRecord> Repository<R> for PgStore {
    async fn list_visible(&self, viewer: Option<Uuid>) -> anyhow::Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE is_public OR owner_id = $1 ORDER BY created_at DESC",
            R::select_list(),
            R::TABLE
        );
        sqlx::query_as::<_, R>(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("list visible {}", R::TABLE))
    }

    async fn list_owned(&self, owner: Uuid) -> anyhow::Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1 ORDER BY created_at DESC",
            R::select_list(),
            R::TABLE
        );
        sqlx::query_as::<_, R>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("list owned {}", R::TABLE))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND owner_id = $2",
            R::select_list(),
            R::TABLE
        );
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("get {}", R::TABLE))
    }

    async fn create(&self, owner: Uuid, draft: R::Draft) -> anyhow::Result<R> {
        let placeholders = (0..R::FIELDS.len())
            .map(|i| format!("${}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (id, owner_id, {}) VALUES ($1, $2, {}) RETURNING {}",
            R::TABLE,
            R::FIELDS.join(", "),
            placeholders,
            R::select_list()
        );
        let query = sqlx::query_as::<_, R>(&sql).bind(Uuid::new_v4()).bind(owner);
        R::bind_draft(query, draft)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("insert {}", R::TABLE))
    }

    async fn update(&self, owner: Uuid, id: Uuid, draft: R::Draft) -> anyhow::Result<Option<R>> {
        let assignments = R::FIELDS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ${}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {}, updated_at = now() WHERE id = $1 AND owner_id = $2 RETURNING {}",
            R::TABLE,
            assignments,
            R::select_list()
        );
        let query = sqlx::query_as::<_, R>(&sql).bind(id).bind(owner);
        R::bind_draft(query, draft)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("update {}", R::TABLE))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND owner_id = $2", R::TABLE);
        let done = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete {}", R::TABLE))?;
        Ok(done.rows_affected() > 0)
    }
}

impl PgRecord for WorkExperience {
    const TABLE: &'static str = "work_experiences";
    const FIELDS: &'static [&'static str] = &[
        "title",
        "company",
        "employment_type",
        "start_date",
        "end_date",
        "skills",
        "description",
        "contract_file",
        "feedback_file",
        "is_public",
    ];

    fn bind_draft<'q>(query: RecordQuery<'q, Self>, d: WorkExperienceDraft) -> RecordQuery<'q, Self> {
        query
            .bind(d.title)
            .bind(d.company)
            .bind(d.employment_type)
            .bind(d.start_date)
            .bind(d.end_date)
            .bind(d.skills)
            .bind(d.description)
            .bind(d.contract_file.map(Json))
            .bind(d.feedback_file.map(Json))
            .bind(d.is_public)
    }
}

impl PgRecord for Certificate {
    const TABLE: &'static str = "certificates";
    const FIELDS: &'static [&'static str] = &[
        "title",
        "organization",
        "skills",
        "description",
        "date_achieved",
        "certificate_files",
        "is_public",
    ];

    fn bind_draft<'q>(query: RecordQuery<'q, Self>, d: CertificateDraft) -> RecordQuery<'q, Self> {
        query
            .bind(d.title)
            .bind(d.organization)
            .bind(d.skills)
            .bind(d.description)
            .bind(d.date_achieved)
            .bind(Json(d.certificate_files))
            .bind(d.is_public)
    }
}

impl PgRecord for Education {
    const TABLE: &'static str = "educations";
    const FIELDS: &'static [&'static str] = &[
        "degree",
        "program",
        "school",
        "skills",
        "description",
        "start_date",
        "end_date",
        "degree_file",
        "transcript_file",
        "enrollment_file",
        "is_public",
    ];

    fn bind_draft<'q>(query: RecordQuery<'q, Self>, d: EducationDraft) -> RecordQuery<'q, Self> {
        query
            .bind(d.degree)
            .bind(d.program)
            .bind(d.school)
            .bind(d.skills)
            .bind(d.description)
            .bind(d.start_date)
            .bind(d.end_date)
            .bind(d.degree_file.map(Json))
            .bind(d.transcript_file.map(Json))
            .bind(d.enrollment_file.map(Json))
            .bind(d.is_public)
    }
}

impl PgRecord for Project {
    const TABLE: &'static str = "projects";
    const FIELDS: &'static [&'static str] =
        &["title", "skills", "description", "project_url", "is_public"];

    fn bind_draft<'q>(query: RecordQuery<'q, Self>, d: ProjectDraft) -> RecordQuery<'q, Self> {
        query
            .bind(d.title)
            .bind(d.skills)
            .bind(d.description)
            .bind(d.project_url)
            .bind(d.is_public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_list_covers_every_column() {
        assert_eq!(
            Project::select_list(),
            "id, owner_id, title, skills, description, project_url, is_public, created_at, updated_at"
        );
    }

    #[test]
    fn field_counts_match_drafts() {
        assert_eq!(WorkExperience::FIELDS.len(), 10);
        assert_eq!(Certificate::FIELDS.len(), 7);
        assert_eq!(Education::FIELDS.len(), 11);
        assert_eq!(Project::FIELDS.len(), 5);
    }
}
