use async_graphql::{Context, ErrorExtensions, Object, Result};

use super::{
    dto::{
        CertificateView, CreateCertificateInput, CreateEducationInput, CreateProjectInput,
        CreateWorkExperienceInput, EducationView, ProjectView, WorkExperienceView,
    },
    services,
};
use crate::{auth::Viewer, state::AppState};

/// Lists are public records plus the caller's private ones, newest first.
#[derive(Default)]
pub struct PortfolioQuery;

#[Object]
impl PortfolioQuery {
    async fn get_work_experiences(&self, ctx: &Context<'_>) -> Result<Vec<WorkExperienceView>> {
        let state = ctx.data::<AppState>()?;
        let viewer = Viewer::from_ctx(ctx);
        let rows = services::list_visible(state.work_experiences.as_ref(), viewer.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_projects(&self, ctx: &Context<'_>) -> Result<Vec<ProjectView>> {
        let state = ctx.data::<AppState>()?;
        let viewer = Viewer::from_ctx(ctx);
        let rows = services::list_visible(state.projects.as_ref(), viewer.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_certificates(&self, ctx: &Context<'_>) -> Result<Vec<CertificateView>> {
        let state = ctx.data::<AppState>()?;
        let viewer = Viewer::from_ctx(ctx);
        let rows = services::list_visible(state.certificates.as_ref(), viewer.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_educations(&self, ctx: &Context<'_>) -> Result<Vec<EducationView>> {
        let state = ctx.data::<AppState>()?;
        let viewer = Viewer::from_ctx(ctx);
        let rows = services::list_visible(state.educations.as_ref(), viewer.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Default)]
pub struct PortfolioMutation;

#[Object]
impl PortfolioMutation {
    async fn create_work_experience(
        &self,
        ctx: &Context<'_>,
        input: CreateWorkExperienceInput,
    ) -> Result<WorkExperienceView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::create_work_experience(state, owner, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn edit_work_experience(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: CreateWorkExperienceInput,
    ) -> Result<WorkExperienceView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::edit_work_experience(state, owner, &id, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn delete_work_experience(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::delete_entity(state, state.work_experiences.as_ref(), owner, &id)
            .await
            .map_err(|e| e.extend())
    }

    async fn create_certificate(
        &self,
        ctx: &Context<'_>,
        input: CreateCertificateInput,
    ) -> Result<CertificateView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::create_certificate(state, owner, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn edit_certificate(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: CreateCertificateInput,
    ) -> Result<CertificateView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::edit_certificate(state, owner, &id, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn delete_certificate(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::delete_entity(state, state.certificates.as_ref(), owner, &id)
            .await
            .map_err(|e| e.extend())
    }

    async fn create_education(
        &self,
        ctx: &Context<'_>,
        input: CreateEducationInput,
    ) -> Result<EducationView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::create_education(state, owner, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn edit_education(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: CreateEducationInput,
    ) -> Result<EducationView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let form = input
            .into_form(ctx, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        let saved = services::edit_education(state, owner, &id, form)
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn delete_education(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::delete_entity(state, state.educations.as_ref(), owner, &id)
            .await
            .map_err(|e| e.extend())
    }

    async fn create_project(
        &self,
        ctx: &Context<'_>,
        input: CreateProjectInput,
    ) -> Result<ProjectView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let saved = services::create_project(state, owner, input.into())
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn edit_project(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: CreateProjectInput,
    ) -> Result<ProjectView> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let saved = services::edit_project(state, owner, &id, input.into())
            .await
            .map_err(|e| e.extend())?;
        Ok(saved.into())
    }

    async fn delete_project(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::delete_entity(state, state.projects.as_ref(), owner, &id)
            .await
            .map_err(|e| e.extend())
    }
}
