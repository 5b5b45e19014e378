use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::files::StoredFile;

/// Common surface of every persisted portfolio entity.
pub trait Record: Clone + Send + Sync + Unpin + 'static {
    /// Every mutable field, sent in full on create and update.
    type Draft: Clone + Send + Sync + 'static;

    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
    fn is_public(&self) -> bool;
    fn created_at(&self) -> OffsetDateTime;
    /// Storage keys of every attached file.
    fn file_keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WorkExperience {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub company: String,
    pub employment_type: String,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub skills: Vec<String>,
    pub description: String,
    pub contract_file: Option<Json<StoredFile>>,
    pub feedback_file: Option<Json<StoredFile>>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkExperienceDraft {
    pub title: String,
    pub company: String,
    pub employment_type: String,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub skills: Vec<String>,
    pub description: String,
    pub contract_file: Option<StoredFile>,
    pub feedback_file: Option<StoredFile>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub organization: String,
    pub skills: Vec<String>,
    pub description: String,
    pub date_achieved: OffsetDateTime,
    pub certificate_files: Json<Vec<StoredFile>>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateDraft {
    pub title: String,
    pub organization: String,
    pub skills: Vec<String>,
    pub description: String,
    pub date_achieved: OffsetDateTime,
    pub certificate_files: Vec<StoredFile>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Education {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub degree: String,
    pub program: String,
    pub school: String,
    pub skills: Vec<String>,
    pub description: String,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub degree_file: Option<Json<StoredFile>>,
    pub transcript_file: Option<Json<StoredFile>>,
    pub enrollment_file: Option<Json<StoredFile>>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EducationDraft {
    pub degree: String,
    pub program: String,
    pub school: String,
    pub skills: Vec<String>,
    pub description: String,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub degree_file: Option<StoredFile>,
    pub transcript_file: Option<StoredFile>,
    pub enrollment_file: Option<StoredFile>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub skills: Vec<String>,
    pub description: String,
    pub project_url: String,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub title: String,
    pub skills: Vec<String>,
    pub description: String,
    pub project_url: String,
    pub is_public: bool,
}

fn slot(file: &Option<Json<StoredFile>>) -> Option<&StoredFile> {
    file.as_ref().map(|f| &f.0)
}

impl WorkExperience {
    pub fn contract_file(&self) -> Option<&StoredFile> {
        slot(&self.contract_file)
    }

    pub fn feedback_file(&self) -> Option<&StoredFile> {
        slot(&self.feedback_file)
    }
}

impl Education {
    pub fn degree_file(&self) -> Option<&StoredFile> {
        slot(&self.degree_file)
    }

    pub fn transcript_file(&self) -> Option<&StoredFile> {
        slot(&self.transcript_file)
    }

    pub fn enrollment_file(&self) -> Option<&StoredFile> {
        slot(&self.enrollment_file)
    }
}

macro_rules! record_basics {
    () => {
        fn id(&self) -> Uuid {
            self.id
        }
        fn owner_id(&self) -> Uuid {
            self.owner_id
        }
        fn is_public(&self) -> bool {
            self.is_public
        }
        fn created_at(&self) -> OffsetDateTime {
            self.created_at
        }
    };
}

impl Record for WorkExperience {
    type Draft = WorkExperienceDraft;
    const KIND: &'static str = "work experience";
    record_basics!();

    fn file_keys(&self) -> Vec<String> {
        [self.contract_file(), self.feedback_file()]
            .into_iter()
            .flatten()
            .map(|f| f.key.clone())
            .collect()
    }
}

impl Record for Certificate {
    type Draft = CertificateDraft;
    const KIND: &'static str = "certificate";
    record_basics!();

    fn file_keys(&self) -> Vec<String> {
        self.certificate_files.iter().map(|f| f.key.clone()).collect()
    }
}

impl Record for Education {
    type Draft = EducationDraft;
    const KIND: &'static str = "education";
    record_basics!();

    fn file_keys(&self) -> Vec<String> {
        [self.degree_file(), self.transcript_file(), self.enrollment_file()]
            .into_iter()
            .flatten()
            .map(|f| f.key.clone())
            .collect()
    }
}

impl Record for Project {
    type Draft = ProjectDraft;
    const KIND: &'static str = "project";
    record_basics!();

    fn file_keys(&self) -> Vec<String> {
        Vec::new()
    }
}
