use async_graphql::{Context, InputObject, SimpleObject, Upload};

use super::{
    repo_types::{Certificate, Education, Project, WorkExperience},
    services::{CertificateForm, EducationForm, ProjectForm, WorkExperienceForm},
};
use crate::{
    config::UploadConfig,
    error::ApiResult,
    files::{
        reconcile::SlotChange,
        upload::{read_all, read_optional},
        StoredFile,
    },
    validation::format_timestamp,
};

async fn slot_change(
    ctx: &Context<'_>,
    field: &str,
    file: Option<&Upload>,
    remove: bool,
    cfg: &UploadConfig,
) -> ApiResult<SlotChange> {
    let file = read_optional(ctx, field, file, cfg).await?;
    Ok(SlotChange::from_parts(file, remove))
}

fn url_of(file: Option<&StoredFile>) -> Option<String> {
    file.map(|f| f.url.clone())
}

// --- inputs ---

/// Shared by `createWorkExperience` and `editWorkExperience`; edits resend every field.
#[derive(InputObject)]
pub struct CreateWorkExperienceInput {
    pub title: String,
    pub company: String,
    #[graphql(name = "type")]
    pub employment_type: String,
    pub start_date: String,
    pub end_date: Option<String>,
    #[graphql(default)]
    pub skills: Vec<String>,
    pub description: String,
    pub contract_file: Option<Upload>,
    #[graphql(default)]
    pub remove_contract_file: bool,
    pub feedback_file: Option<Upload>,
    #[graphql(default)]
    pub remove_feedback_file: bool,
    #[graphql(default = true)]
    pub is_public: bool,
}

impl CreateWorkExperienceInput {
    pub async fn into_form(
        self,
        ctx: &Context<'_>,
        cfg: &UploadConfig,
    ) -> ApiResult<WorkExperienceForm> {
        Ok(WorkExperienceForm {
            contract_file: slot_change(
                ctx,
                "contractFile",
                self.contract_file.as_ref(),
                self.remove_contract_file,
                cfg,
            )
            .await?,
            feedback_file: slot_change(
                ctx,
                "feedbackFile",
                self.feedback_file.as_ref(),
                self.remove_feedback_file,
                cfg,
            )
            .await?,
            title: self.title,
            company: self.company,
            employment_type: self.employment_type,
            start_date: self.start_date,
            end_date: self.end_date,
            skills: self.skills,
            description: self.description,
            is_public: self.is_public,
        })
    }
}

#[derive(InputObject)]
pub struct CreateCertificateInput {
    pub title: String,
    pub organization: String,
    #[graphql(default)]
    pub skills: Vec<String>,
    pub description: String,
    pub date_achieved: String,
    /// Appended to the certificate's files.
    #[graphql(default)]
    pub certificate_files: Vec<Upload>,
    /// Currently attached file URLs to drop.
    #[graphql(default)]
    pub remove_certificate_file_urls: Vec<String>,
    #[graphql(default = true)]
    pub is_public: bool,
}

impl CreateCertificateInput {
    pub async fn into_form(self, ctx: &Context<'_>, cfg: &UploadConfig) -> ApiResult<CertificateForm> {
        Ok(CertificateForm {
            added_files: read_all(ctx, "certificateFiles", &self.certificate_files, cfg).await?,
            removed_file_urls: self.remove_certificate_file_urls,
            title: self.title,
            organization: self.organization,
            skills: self.skills,
            description: self.description,
            date_achieved: self.date_achieved,
            is_public: self.is_public,
        })
    }
}

#[derive(InputObject)]
pub struct CreateEducationInput {
    pub degree: String,
    pub program: String,
    pub school: String,
    #[graphql(default)]
    pub skills: Vec<String>,
    pub description: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub degree_file: Option<Upload>,
    #[graphql(default)]
    pub remove_degree_file: bool,
    pub transcript_file: Option<Upload>,
    #[graphql(default)]
    pub remove_transcript_file: bool,
    pub enrollment_file: Option<Upload>,
    #[graphql(default)]
    pub remove_enrollment_file: bool,
    #[graphql(default = true)]
    pub is_public: bool,
}

impl CreateEducationInput {
    pub async fn into_form(self, ctx: &Context<'_>, cfg: &UploadConfig) -> ApiResult<EducationForm> {
        Ok(EducationForm {
            degree_file: slot_change(
                ctx,
                "degreeFile",
                self.degree_file.as_ref(),
                self.remove_degree_file,
                cfg,
            )
            .await?,
            transcript_file: slot_change(
                ctx,
                "transcriptFile",
                self.transcript_file.as_ref(),
                self.remove_transcript_file,
                cfg,
            )
            .await?,
            enrollment_file: slot_change(
                ctx,
                "enrollmentFile",
                self.enrollment_file.as_ref(),
                self.remove_enrollment_file,
                cfg,
            )
            .await?,
            degree: self.degree,
            program: self.program,
            school: self.school,
            skills: self.skills,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            is_public: self.is_public,
        })
    }
}

#[derive(InputObject)]
pub struct CreateProjectInput {
    pub title: String,
    #[graphql(default)]
    pub skills: Vec<String>,
    pub description: String,
    pub project_url: String,
    #[graphql(default = true)]
    pub is_public: bool,
}

impl From<CreateProjectInput> for ProjectForm {
    fn from(input: CreateProjectInput) -> Self {
        Self {
            title: input.title,
            skills: input.skills,
            description: input.description,
            project_url: input.project_url,
            is_public: input.is_public,
        }
    }
}

// --- outputs ---

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "WorkExperience")]
pub struct WorkExperienceView {
    pub id: String,
    pub title: String,
    pub company: String,
    #[graphql(name = "type")]
    pub employment_type: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub skills: Vec<String>,
    pub description: String,
    pub contract_file_url: Option<String>,
    pub feedback_file_url: Option<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WorkExperience> for WorkExperienceView {
    fn from(w: WorkExperience) -> Self {
        Self {
            id: w.id.to_string(),
            contract_file_url: url_of(w.contract_file()),
            feedback_file_url: url_of(w.feedback_file()),
            start_date: format_timestamp(w.start_date),
            end_date: w.end_date.map(format_timestamp),
            created_at: format_timestamp(w.created_at),
            updated_at: format_timestamp(w.updated_at),
            title: w.title,
            company: w.company,
            employment_type: w.employment_type,
            skills: w.skills,
            description: w.description,
            is_public: w.is_public,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Certificate")]
pub struct CertificateView {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub skills: Vec<String>,
    pub description: String,
    pub date_achieved: String,
    pub certificate_file_url: Vec<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Certificate> for CertificateView {
    fn from(c: Certificate) -> Self {
        Self {
            id: c.id.to_string(),
            certificate_file_url: c.certificate_files.iter().map(|f| f.url.clone()).collect(),
            date_achieved: format_timestamp(c.date_achieved),
            created_at: format_timestamp(c.created_at),
            updated_at: format_timestamp(c.updated_at),
            title: c.title,
            organization: c.organization,
            skills: c.skills,
            description: c.description,
            is_public: c.is_public,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Education")]
pub struct EducationView {
    pub id: String,
    pub degree: String,
    pub program: String,
    pub school: String,
    pub skills: Vec<String>,
    pub description: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub degree_url: Option<String>,
    pub transcript_url: Option<String>,
    pub enrollment_url: Option<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Education> for EducationView {
    fn from(e: Education) -> Self {
        Self {
            id: e.id.to_string(),
            degree_url: url_of(e.degree_file()),
            transcript_url: url_of(e.transcript_file()),
            enrollment_url: url_of(e.enrollment_file()),
            start_date: format_timestamp(e.start_date),
            end_date: e.end_date.map(format_timestamp),
            created_at: format_timestamp(e.created_at),
            updated_at: format_timestamp(e.updated_at),
            degree: e.degree,
            program: e.program,
            school: e.school,
            skills: e.skills,
            description: e.description,
            is_public: e.is_public,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Project")]
pub struct ProjectView {
    pub id: String,
    pub title: String,
    pub skills: Vec<String>,
    pub description: String,
    pub project_url: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectView {
    fn from(p: Project) -> Self {
        Self {
            id: p.id.to_string(),
            created_at: format_timestamp(p.created_at),
            updated_at: format_timestamp(p.updated_at),
            title: p.title,
            skills: p.skills,
            description: p.description,
            project_url: p.project_url,
            is_public: p.is_public,
        }
    }
}
