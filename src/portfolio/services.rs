//! Create/edit/delete workflows for portfolio entities.
//!
//! Order per mutation: validate, load the current record (edit), reconcile each
//! file slot, persist, then settle the upload intents.

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    repo::Repository,
    repo_types::{
        Certificate, CertificateDraft, Education, EducationDraft, Project, ProjectDraft, Record,
        WorkExperience, WorkExperienceDraft,
    },
};
use crate::{
    error::{ApiError, ApiResult},
    files::{
        reconcile::{Reconciler, SlotChange},
        IncomingFile,
    },
    state::AppState,
    validation::{
        clean_skills, ensure_order, optional_date, parse_date, parse_id, project_url, required,
    },
};

#[derive(Debug, Clone)]
pub struct WorkExperienceForm {
    pub title: String,
    pub company: String,
    pub employment_type: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub skills: Vec<String>,
    pub description: String,
    pub contract_file: SlotChange,
    pub feedback_file: SlotChange,
    pub is_public: bool,
}

#[derive(Debug, Clone)]
pub struct CertificateForm {
    pub title: String,
    pub organization: String,
    pub skills: Vec<String>,
    pub description: String,
    pub date_achieved: String,
    pub added_files: Vec<IncomingFile>,
    pub removed_file_urls: Vec<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone)]
pub struct EducationForm {
    pub degree: String,
    pub program: String,
    pub school: String,
    pub skills: Vec<String>,
    pub description: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub degree_file: SlotChange,
    pub transcript_file: SlotChange,
    pub enrollment_file: SlotChange,
    pub is_public: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub title: String,
    pub skills: Vec<String>,
    pub description: String,
    pub project_url: String,
    pub is_public: bool,
}

pub async fn list_visible<R: Record>(
    repo: &dyn Repository<R>,
    viewer: Option<Uuid>,
) -> ApiResult<Vec<R>> {
    repo.list_visible(viewer).await.map_err(ApiError::Persistence)
}

fn edit_target(id: &str) -> ApiResult<Uuid> {
    parse_id(id).ok_or_else(|| ApiError::validation("id", "not a valid id"))
}

async fn load<R: Record>(
    repo: &dyn Repository<R>,
    owner: Uuid,
    id: Option<Uuid>,
) -> ApiResult<Option<R>> {
    let Some(id) = id else {
        return Ok(None);
    };
    repo.get(owner, id)
        .await
        .map_err(ApiError::Persistence)?
        .map(Some)
        .ok_or(ApiError::NotFound(R::KIND))
}

async fn persist<R: Record>(
    repo: &dyn Repository<R>,
    owner: Uuid,
    id: Option<Uuid>,
    draft: R::Draft,
) -> ApiResult<R> {
    let saved = match id {
        None => repo.create(owner, draft).await.map_err(ApiError::Persistence)?,
        Some(id) => repo
            .update(owner, id, draft)
            .await
            .map_err(ApiError::Persistence)?
            .ok_or(ApiError::NotFound(R::KIND))?,
    };
    debug!(
        kind = R::KIND,
        id = %saved.id(),
        owner = %saved.owner_id(),
        public = saved.is_public(),
        created_at = %saved.created_at(),
        "record persisted"
    );
    Ok(saved)
}

/// Releases every attached file, then drops the row. Malformed or unknown ids are `false`.
#[instrument(skip(state, repo), fields(kind = R::KIND))]
pub async fn delete_entity<R: Record>(
    state: &AppState,
    repo: &dyn Repository<R>,
    owner: Uuid,
    id: &str,
) -> ApiResult<bool> {
    let Some(id) = parse_id(id) else {
        return Ok(false);
    };
    let Some(record) = repo.get(owner, id).await.map_err(ApiError::Persistence)? else {
        return Ok(false);
    };

    let files = Reconciler::new(state, owner);
    for key in record.file_keys() {
        files.release(&key).await?;
    }
    let deleted = repo
        .delete(owner, record.id())
        .await
        .map_err(ApiError::Persistence)?;
    info!(%owner, %id, deleted, "entity deleted");
    Ok(deleted)
}

// --- work experience ---

pub async fn create_work_experience(
    state: &AppState,
    owner: Uuid,
    form: WorkExperienceForm,
) -> ApiResult<WorkExperience> {
    save_work_experience(state, owner, None, form).await
}

pub async fn edit_work_experience(
    state: &AppState,
    owner: Uuid,
    id: &str,
    form: WorkExperienceForm,
) -> ApiResult<WorkExperience> {
    let id = edit_target(id)?;
    save_work_experience(state, owner, Some(id), form).await
}

#[instrument(skip(state, form))]
async fn save_work_experience(
    state: &AppState,
    owner: Uuid,
    id: Option<Uuid>,
    form: WorkExperienceForm,
) -> ApiResult<WorkExperience> {
    let title = required("title", &form.title)?;
    let company = required("company", &form.company)?;
    let employment_type = required("type", &form.employment_type)?;
    let description = required("description", &form.description)?;
    let start_date = parse_date("startDate", &form.start_date)?;
    let end_date = optional_date("endDate", form.end_date.as_deref())?;
    ensure_order(start_date, end_date)?;

    let repo = state.work_experiences.as_ref();
    let current = load(repo, owner, id).await?;
    let current = current.as_ref();

    let mut files = Reconciler::new(state, owner);
    let contract_file = files
        .slot(current.and_then(|c| c.contract_file()), form.contract_file)
        .await?;
    let feedback_file = files
        .slot(current.and_then(|c| c.feedback_file()), form.feedback_file)
        .await?;

    let draft = WorkExperienceDraft {
        title,
        company,
        employment_type,
        start_date,
        end_date,
        skills: clean_skills(form.skills),
        description,
        contract_file,
        feedback_file,
        is_public: form.is_public,
    };
    let saved = persist(repo, owner, id, draft).await?;
    files.settle().await;
    info!(%owner, id = %saved.id, "work experience saved");
    Ok(saved)
}

// --- certificate ---

pub async fn create_certificate(
    state: &AppState,
    owner: Uuid,
    form: CertificateForm,
) -> ApiResult<Certificate> {
    save_certificate(state, owner, None, form).await
}

pub async fn edit_certificate(
    state: &AppState,
    owner: Uuid,
    id: &str,
    form: CertificateForm,
) -> ApiResult<Certificate> {
    let id = edit_target(id)?;
    save_certificate(state, owner, Some(id), form).await
}

#[instrument(skip(state, form))]
async fn save_certificate(
    state: &AppState,
    owner: Uuid,
    id: Option<Uuid>,
    form: CertificateForm,
) -> ApiResult<Certificate> {
    let title = required("title", &form.title)?;
    let organization = required("organization", &form.organization)?;
    let description = required("description", &form.description)?;
    let date_achieved = parse_date("dateAchieved", &form.date_achieved)?;

    let repo = state.certificates.as_ref();
    let current = load(repo, owner, id).await?;
    let current_files = current
        .as_ref()
        .map(|c| c.certificate_files.0.as_slice())
        .unwrap_or_default();

    let mut files = Reconciler::new(state, owner);
    let certificate_files = files
        .list(current_files, &form.removed_file_urls, form.added_files)
        .await?;

    let draft = CertificateDraft {
        title,
        organization,
        skills: clean_skills(form.skills),
        description,
        date_achieved,
        certificate_files,
        is_public: form.is_public,
    };
    let saved = persist(repo, owner, id, draft).await?;
    files.settle().await;
    info!(%owner, id = %saved.id, files = saved.certificate_files.len(), "certificate saved");
    Ok(saved)
}

// --- education ---

pub async fn create_education(
    state: &AppState,
    owner: Uuid,
    form: EducationForm,
) -> ApiResult<Education> {
    save_education(state, owner, None, form).await
}

pub async fn edit_education(
    state: &AppState,
    owner: Uuid,
    id: &str,
    form: EducationForm,
) -> ApiResult<Education> {
    let id = edit_target(id)?;
    save_education(state, owner, Some(id), form).await
}

#[instrument(skip(state, form))]
async fn save_education(
    state: &AppState,
    owner: Uuid,
    id: Option<Uuid>,
    form: EducationForm,
) -> ApiResult<Education> {
    let degree = required("degree", &form.degree)?;
    let program = required("program", &form.program)?;
    let school = required("school", &form.school)?;
    let description = required("description", &form.description)?;
    let start_date = parse_date("startDate", &form.start_date)?;
    let end_date = optional_date("endDate", form.end_date.as_deref())?;
    ensure_order(start_date, end_date)?;

    let repo = state.educations.as_ref();
    let current = load(repo, owner, id).await?;
    let current = current.as_ref();

    let mut files = Reconciler::new(state, owner);
    let degree_file = files
        .slot(current.and_then(|c| c.degree_file()), form.degree_file)
        .await?;
    let transcript_file = files
        .slot(current.and_then(|c| c.transcript_file()), form.transcript_file)
        .await?;
    let enrollment_file = files
        .slot(current.and_then(|c| c.enrollment_file()), form.enrollment_file)
        .await?;

    let draft = EducationDraft {
        degree,
        program,
        school,
        skills: clean_skills(form.skills),
        description,
        start_date,
        end_date,
        degree_file,
        transcript_file,
        enrollment_file,
        is_public: form.is_public,
    };
    let saved = persist(repo, owner, id, draft).await?;
    files.settle().await;
    info!(%owner, id = %saved.id, "education saved");
    Ok(saved)
}

// --- project ---

pub async fn create_project(state: &AppState, owner: Uuid, form: ProjectForm) -> ApiResult<Project> {
    save_project(state, owner, None, form).await
}

pub async fn edit_project(
    state: &AppState,
    owner: Uuid,
    id: &str,
    form: ProjectForm,
) -> ApiResult<Project> {
    let id = edit_target(id)?;
    save_project(state, owner, Some(id), form).await
}

#[instrument(skip(state, form))]
async fn save_project(
    state: &AppState,
    owner: Uuid,
    id: Option<Uuid>,
    form: ProjectForm,
) -> ApiResult<Project> {
    let draft = ProjectDraft {
        title: required("title", &form.title)?,
        skills: clean_skills(form.skills),
        description: required("description", &form.description)?,
        project_url: project_url(&form.project_url)?,
        is_public: form.is_public,
    };
    let saved = persist(state.projects.as_ref(), owner, id, draft).await?;
    info!(%owner, id = %saved.id, "project saved");
    Ok(saved)
}
