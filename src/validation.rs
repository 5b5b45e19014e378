//! Input checks shared by the mutation services. Field names are the GraphQL ones.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};
use url::Url;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub fn required(field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(field, "is required"));
    }
    Ok(value.to_string())
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(field: &str, raw: &str) -> ApiResult<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::validation(field, "is required"));
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| ApiError::validation(field, "expected an RFC 3339 timestamp or YYYY-MM-DD"))
}

/// Absent and blank both mean "no date".
pub fn optional_date(field: &str, raw: Option<&str>) -> ApiResult<Option<OffsetDateTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(field, raw).map(Some),
    }
}

pub fn ensure_order(start: OffsetDateTime, end: Option<OffsetDateTime>) -> ApiResult<()> {
    match end {
        Some(end) if end < start => Err(ApiError::validation(
            "endDate",
            "must not precede startDate",
        )),
        _ => Ok(()),
    }
}

pub fn clean_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn project_url(raw: &str) -> ApiResult<String> {
    let raw = required("projectUrl", raw)?;
    let parsed = Url::parse(&raw)
        .map_err(|_| ApiError::validation("projectUrl", "must be an absolute URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ApiError::validation("projectUrl", "must be an http(s) URL"));
    }
    Ok(raw)
}

pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Engineer ").unwrap(), "Engineer");
        assert_eq!(field_of(required("title", "   ").unwrap_err()), "title");
    }

    #[test]
    fn dates_accept_rfc3339_and_plain_days() {
        assert_eq!(
            parse_date("startDate", "2021-03-01T09:30:00+02:00").unwrap(),
            datetime!(2021-03-01 07:30 UTC)
        );
        assert_eq!(
            parse_date("startDate", "2021-03-01").unwrap(),
            datetime!(2021-03-01 0:00 UTC)
        );
        assert_eq!(field_of(parse_date("startDate", "March 2021").unwrap_err()), "startDate");
    }

    #[test]
    fn optional_date_treats_blank_as_absent() {
        assert_eq!(optional_date("endDate", None).unwrap(), None);
        assert_eq!(optional_date("endDate", Some(" ")).unwrap(), None);
        assert!(optional_date("endDate", Some("2020-13-01")).is_err());
    }

    #[test]
    fn end_may_not_precede_start() {
        let start = datetime!(2022-01-01 0:00 UTC);
        assert!(ensure_order(start, None).is_ok());
        assert!(ensure_order(start, Some(start)).is_ok());
        let err = ensure_order(start, Some(datetime!(2021-12-31 0:00 UTC))).unwrap_err();
        assert_eq!(field_of(err), "endDate");
    }

    #[test]
    fn skills_are_trimmed_and_blanks_dropped() {
        let skills = vec![" rust ".into(), "".into(), "  ".into(), "sql".into()];
        assert_eq!(clean_skills(skills), vec!["rust", "sql"]);
    }

    #[test]
    fn project_url_must_be_http() {
        assert_eq!(
            project_url(" https://github.com/me/folio ").unwrap(),
            "https://github.com/me/folio"
        );
        assert!(project_url("ftp://example.com/x").is_err());
        assert!(project_url("github.com/me").is_err());
    }

    #[test]
    fn ids_parse_leniently() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {id} ")), Some(id));
        assert_eq!(parse_id("42"), None);
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(
            format_timestamp(datetime!(2023-05-06 07:08:09 UTC)),
            "2023-05-06T07:08:09Z"
        );
    }
}
