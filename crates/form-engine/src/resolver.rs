//! Profile value lookup keyed by classification tag.

use autofill_core_types::{ClassificationTag, ControlKind, CoreError, Experience, Profile};
use chrono::{Datelike, NaiveDate};

/// What a field should receive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Text(String),
    /// Checkbox decision; also rendered as `Yes`/`No` on non-checkbox controls.
    Checked(bool),
    /// Nothing to write. Not an error.
    Nothing,
}

impl Resolution {
    fn text(value: Option<&String>) -> Self {
        match value.map(|v| v.trim()) {
            Some(v) if !v.is_empty() => Resolution::Text(v.to_string()),
            _ => Resolution::Nothing,
        }
    }

    fn joined(values: &[String]) -> Self {
        let parts: Vec<&str> = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();
        if parts.is_empty() {
            Resolution::Nothing
        } else {
            Resolution::Text(parts.join(", "))
        }
    }

    fn flag(value: Option<bool>, kind: ControlKind) -> Self {
        match (value, kind) {
            (None, _) => Resolution::Nothing,
            (Some(flag), ControlKind::Checkbox) => Resolution::Checked(flag),
            (Some(true), _) => Resolution::Text("Yes".into()),
            (Some(false), _) => Resolution::Text("No".into()),
        }
    }
}

/// Inputs that are not part of the profile.
#[derive(Clone, Copy, Debug)]
pub struct ResolveContext {
    pub today: NaiveDate,
    pub kind: ControlKind,
}

type ResolveFn = fn(&Profile, &ResolveContext) -> Result<Resolution, CoreError>;

/// Resolves the value for `tag`, formatted for the control in `ctx`.
pub fn resolve(
    profile: &Profile,
    tag: ClassificationTag,
    ctx: &ResolveContext,
) -> Result<Resolution, CoreError> {
    lookup(tag)(profile, ctx)
}

fn lookup(tag: ClassificationTag) -> ResolveFn {
    use ClassificationTag as Tag;
    match tag {
        Tag::FirstName => |p, _| Ok(Resolution::text(p.personal_info.first_name.as_ref())),
        Tag::LastName => |p, _| Ok(Resolution::text(p.personal_info.last_name.as_ref())),
        Tag::FullName => |p, _| Ok(full_name(p)),
        Tag::Email => |p, _| Ok(Resolution::text(p.personal_info.email.as_ref())),
        Tag::Phone => |p, _| {
            Ok(match p.personal_info.phone.as_deref() {
                Some(raw) if !raw.trim().is_empty() => Resolution::Text(format_phone(raw)),
                _ => Resolution::Nothing,
            })
        },
        Tag::Address => |p, _| Ok(Resolution::text(p.personal_info.address.as_ref())),
        Tag::City => |p, _| Ok(Resolution::text(p.personal_info.city.as_ref())),
        Tag::State => |p, _| Ok(Resolution::text(p.personal_info.state.as_ref())),
        Tag::ZipCode => |p, _| Ok(Resolution::text(p.personal_info.zip_code.as_ref())),
        Tag::Country => |p, _| Ok(Resolution::text(p.personal_info.country.as_ref())),
        Tag::Linkedin => |p, _| Ok(Resolution::text(p.personal_info.linkedin.as_ref())),
        Tag::Github => |p, _| Ok(Resolution::text(p.personal_info.github.as_ref())),
        Tag::Portfolio => |p, _| {
            Ok(Resolution::text(
                p.personal_info
                    .portfolio
                    .as_ref()
                    .or(p.personal_info.website.as_ref()),
            ))
        },
        Tag::Website => |p, _| {
            Ok(Resolution::text(
                p.personal_info
                    .website
                    .as_ref()
                    .or(p.personal_info.portfolio.as_ref()),
            ))
        },
        Tag::JobTitle => |p, _| Ok(Resolution::text(latest(p).and_then(|e| e.title.as_ref()))),
        Tag::Company => |p, _| Ok(Resolution::text(latest(p).and_then(|e| e.company.as_ref()))),
        Tag::JobLocation => |p, _| Ok(Resolution::text(latest(p).and_then(|e| e.location.as_ref()))),
        Tag::StartDate => |p, ctx| date_field(latest(p).and_then(|e| e.start_date.as_ref()), ctx),
        Tag::EndDate => |p, ctx| match latest(p) {
            Some(exp) if exp.current => Ok(Resolution::Nothing),
            Some(exp) => date_field(exp.end_date.as_ref(), ctx),
            None => Ok(Resolution::Nothing),
        },
        Tag::CurrentlyWorking => |p, ctx| Ok(Resolution::flag(latest(p).map(|e| e.current), ctx.kind)),
        Tag::JobDescription => |p, _| {
            Ok(Resolution::text(latest(p).and_then(|e| e.description.as_ref())))
        },
        Tag::YearsOfExperience => |p, ctx| years_of_experience(&p.experience, ctx.today),
        Tag::School => |p, _| Ok(Resolution::text(p.education.first().and_then(|e| e.school.as_ref()))),
        Tag::Degree => |p, _| Ok(Resolution::text(p.education.first().and_then(|e| e.degree.as_ref()))),
        Tag::FieldOfStudy => |p, _| {
            Ok(Resolution::text(
                p.education.first().and_then(|e| e.field_of_study.as_ref()),
            ))
        },
        Tag::EducationStartDate => |p, ctx| {
            date_field(p.education.first().and_then(|e| e.start_date.as_ref()), ctx)
        },
        Tag::GraduationDate => |p, ctx| {
            date_field(p.education.first().and_then(|e| e.graduation_date.as_ref()), ctx)
        },
        Tag::Gpa => |p, _| Ok(Resolution::text(p.education.first().and_then(|e| e.gpa.as_ref()))),
        Tag::Skills => |p, _| {
            let skills: Vec<String> = p.skills.flatten().into_iter().map(str::to_string).collect();
            Ok(Resolution::joined(&skills))
        },
        Tag::SalaryExpectation => |p, _| Ok(Resolution::text(p.preferences.salary_expectation.as_ref())),
        Tag::NoticePeriod => |p, _| Ok(Resolution::text(p.preferences.notice_period.as_ref())),
        Tag::JobType => |p, _| Ok(Resolution::joined(&p.preferences.job_types)),
        Tag::WorkArrangement => |p, _| Ok(Resolution::joined(&p.preferences.work_arrangement)),
        Tag::Sponsorship => |p, ctx| Ok(Resolution::flag(p.preferences.sponsorship_required, ctx.kind)),
        Tag::Relocation => |p, ctx| Ok(Resolution::flag(p.preferences.willing_to_relocate, ctx.kind)),
        Tag::WorkAuthorization => |p, ctx| Ok(Resolution::flag(p.preferences.work_authorized, ctx.kind)),
        Tag::RemoteWork => |p, ctx| Ok(Resolution::flag(p.preferences.remote_preferred, ctx.kind)),
        Tag::Veteran => |p, _| Ok(Resolution::text(p.preferences.veteran.as_ref())),
        Tag::Disability => |p, _| Ok(Resolution::text(p.preferences.disability.as_ref())),
        Tag::Gender => |p, _| Ok(Resolution::text(p.preferences.gender.as_ref())),
        // File inputs are handled by the resume pass.
        Tag::Resume => |_, _| Ok(Resolution::Nothing),
        Tag::CoverLetter => |p, _| Ok(Resolution::text(p.cover_letter.as_ref())),
        Tag::ProfessionalSummary => |p, _| Ok(Resolution::text(p.professional_summary.as_ref())),
    }
}

fn latest(profile: &Profile) -> Option<&Experience> {
    profile.experience.first()
}

fn full_name(profile: &Profile) -> Resolution {
    let parts: Vec<&str> = [
        profile.personal_info.first_name.as_deref(),
        profile.personal_info.last_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect();
    if parts.is_empty() {
        Resolution::Nothing
    } else {
        Resolution::Text(parts.join(" "))
    }
}

/// `(AAA) BBB-CCCC` for ten digits, `+1 (AAA) BBB-CCCC` for NANP numbers
/// with a country code, the trimmed input otherwise.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("+1 ({}) {}-{}", &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => raw.trim().to_string(),
    }
}

/// Parses `YYYY-MM` or `YYYY-MM-DD`; a missing day defaults to the first.
pub fn parse_profile_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let invalid = || CoreError::InvalidDate(raw.to_string());
    let mut parts = raw.trim().splitn(3, '-');
    let year: i32 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let month: u32 = parts
        .next()
        .map(|p| p.parse().map_err(|_| invalid()))
        .transpose()?
        .unwrap_or(1);
    let day: u32 = parts
        .next()
        .map(|p| p.get(..2).unwrap_or(p).parse().map_err(|_| invalid()))
        .transpose()?
        .unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

fn date_field(raw: Option<&String>, ctx: &ResolveContext) -> Result<Resolution, CoreError> {
    let Some(raw) = raw.map(|r| r.trim()).filter(|r| !r.is_empty()) else {
        return Ok(Resolution::Nothing);
    };
    let formatted = match ctx.kind {
        ControlKind::Date => parse_profile_date(raw)?.format("%Y-%m-%d").to_string(),
        ControlKind::Month => parse_profile_date(raw)?.format("%Y-%m").to_string(),
        _ => raw.to_string(),
    };
    Ok(Resolution::Text(formatted))
}

fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let months = (end.year() - start.year()) as i64 * 12 + end.month() as i64 - start.month() as i64;
    months.max(0)
}

/// Total tenure across all positions, rounded to whole years.
fn years_of_experience(entries: &[Experience], today: NaiveDate) -> Result<Resolution, CoreError> {
    if entries.is_empty() {
        return Ok(Resolution::Nothing);
    }
    let mut months = 0i64;
    for entry in entries {
        let Some(start) = entry.start_date.as_deref().filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let start = parse_profile_date(start)?;
        let end = if entry.current {
            today
        } else {
            match entry.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
                Some(end) => parse_profile_date(end)?,
                None => continue,
            }
        };
        months += months_between(start, end);
    }
    let years = (months as f64 / 12.0).round() as i64;
    Ok(Resolution::Text(years.to_string()))
}
