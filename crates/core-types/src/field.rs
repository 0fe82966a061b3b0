use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Handle to a live element, issued by the DOM port.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

macro_rules! classification_tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Semantic label assigned to a control by the field detector.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        pub enum ClassificationTag {
            $(#[serde(rename = $name)] $variant,)+
        }

        impl ClassificationTag {
            pub const ALL: &'static [ClassificationTag] = &[$(ClassificationTag::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ClassificationTag::$variant => $name,)+
                }
            }
        }

        impl FromStr for ClassificationTag {
            type Err = CoreError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($name => Ok(ClassificationTag::$variant),)+
                    other => Err(CoreError::UnknownTag(other.to_string())),
                }
            }
        }
    };
}

classification_tags! {
    FirstName => "firstName",
    LastName => "lastName",
    FullName => "fullName",
    Email => "email",
    Phone => "phone",
    Address => "address",
    City => "city",
    State => "state",
    ZipCode => "zipCode",
    Country => "country",
    Linkedin => "linkedin",
    Github => "github",
    Portfolio => "portfolio",
    Website => "website",
    JobTitle => "jobTitle",
    Company => "company",
    JobLocation => "jobLocation",
    StartDate => "startDate",
    EndDate => "endDate",
    CurrentlyWorking => "currentlyWorking",
    JobDescription => "jobDescription",
    YearsOfExperience => "yearsOfExperience",
    School => "school",
    Degree => "degree",
    FieldOfStudy => "fieldOfStudy",
    EducationStartDate => "educationStartDate",
    GraduationDate => "graduationDate",
    Gpa => "gpa",
    Skills => "skills",
    SalaryExpectation => "salaryExpectation",
    NoticePeriod => "noticePeriod",
    JobType => "jobType",
    WorkArrangement => "workArrangement",
    Sponsorship => "sponsorship",
    Relocation => "relocation",
    WorkAuthorization => "workAuthorization",
    RemoteWork => "remoteWork",
    Veteran => "veteran",
    Disability => "disability",
    Gender => "gender",
    Resume => "resume",
    CoverLetter => "coverLetter",
    ProfessionalSummary => "professionalSummary",
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog partition. Declaration order is the fill order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Personal,
    Experience,
    Education,
    Skills,
    Preferences,
    Documents,
    Misc,
    Resume,
}

impl FieldCategory {
    pub const ORDER: [FieldCategory; 8] = [
        FieldCategory::Personal,
        FieldCategory::Experience,
        FieldCategory::Education,
        FieldCategory::Skills,
        FieldCategory::Preferences,
        FieldCategory::Documents,
        FieldCategory::Misc,
        FieldCategory::Resume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Personal => "personal",
            FieldCategory::Experience => "experience",
            FieldCategory::Education => "education",
            FieldCategory::Skills => "skills",
            FieldCategory::Preferences => "preferences",
            FieldCategory::Documents => "documents",
            FieldCategory::Misc => "misc",
            FieldCategory::Resume => "resume",
        }
    }
}

impl FromStr for FieldCategory {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldCategory::ORDER
            .into_iter()
            .find(|category| category.as_str() == raw)
            .ok_or_else(|| CoreError::UnknownCategory(raw.to_string()))
    }
}

/// Kind of form control, derived from the tag name and `type` attribute.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    #[default]
    Text,
    Email,
    Tel,
    Url,
    Number,
    Date,
    Month,
    Textarea,
    Select,
    Checkbox,
    Radio,
    File,
    Other,
}

impl ControlKind {
    pub fn from_parts(tag_name: &str, input_type: Option<&str>) -> Self {
        match tag_name.to_ascii_lowercase().as_str() {
            "select" => return ControlKind::Select,
            "textarea" => return ControlKind::Textarea,
            _ => {}
        }
        match input_type
            .map(|ty| ty.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("text") | Some("search") => ControlKind::Text,
            Some("email") => ControlKind::Email,
            Some("tel") => ControlKind::Tel,
            Some("url") => ControlKind::Url,
            Some("number") => ControlKind::Number,
            Some("date") => ControlKind::Date,
            Some("month") => ControlKind::Month,
            Some("checkbox") => ControlKind::Checkbox,
            Some("radio") => ControlKind::Radio,
            Some("file") => ControlKind::File,
            Some("select-one") | Some("select-multiple") => ControlKind::Select,
            Some("textarea") => ControlKind::Textarea,
            Some(_) => ControlKind::Other,
        }
    }
}

/// Catalog entry as delivered by the detector, before tag validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClassifiedField {
    pub element: NodeId,
    pub classification: String,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub tag_name: String,
}

pub type RawFieldCatalog = BTreeMap<String, Vec<RawClassifiedField>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedField {
    pub element: NodeId,
    pub classification: ClassificationTag,
    pub kind: ControlKind,
    pub tag_name: String,
}

impl TryFrom<RawClassifiedField> for ClassifiedField {
    type Error = CoreError;

    fn try_from(raw: RawClassifiedField) -> Result<Self, Self::Error> {
        let classification = raw.classification.parse()?;
        let kind = ControlKind::from_parts(&raw.tag_name, raw.input_type.as_deref());
        Ok(Self {
            element: raw.element,
            classification,
            kind,
            tag_name: raw.tag_name.to_ascii_lowercase(),
        })
    }
}

/// Catalog entry that failed validation. The run reports it as a field
/// error and fills everything else.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedField {
    pub element: NodeId,
    /// Raw classification tag as delivered.
    pub classification: String,
    /// `None` when the category key itself was not recognised.
    pub category: Option<FieldCategory>,
    pub reason: CoreError,
}

/// Validated, category-partitioned catalog. Read-only during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldCatalog {
    categories: BTreeMap<FieldCategory, Vec<ClassifiedField>>,
    rejected: Vec<RejectedField>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every category key and classification tag. Entries that
    /// fail are kept aside in [`FieldCatalog::rejected`].
    pub fn from_raw(raw: RawFieldCatalog) -> Self {
        let mut catalog = Self::new();
        for (key, fields) in raw {
            let category = key.parse::<FieldCategory>();
            for field in fields {
                let element = field.element;
                let classification = field.classification.clone();
                let validated = match &category {
                    Ok(category) => ClassifiedField::try_from(field).map(|f| (*category, f)),
                    Err(err) => Err(err.clone()),
                };
                match validated {
                    Ok((category, field)) => catalog.push(category, field),
                    Err(reason) => catalog.rejected.push(RejectedField {
                        element,
                        classification,
                        category: category.as_ref().ok().copied(),
                        reason,
                    }),
                }
            }
        }
        catalog
    }

    pub fn push(&mut self, category: FieldCategory, field: ClassifiedField) {
        self.categories.entry(category).or_default().push(field);
    }

    pub fn fields(&self, category: FieldCategory) -> &[ClassifiedField] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All fields in fill order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldCategory, &ClassifiedField)> {
        FieldCategory::ORDER
            .into_iter()
            .flat_map(move |category| self.fields(category).iter().map(move |f| (category, f)))
    }

    pub fn rejected(&self) -> &[RejectedField] {
        &self.rejected
    }

    /// Valid fields only.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(element: u64, tag: &str, ty: &str, tag_name: &str) -> RawClassifiedField {
        RawClassifiedField {
            element: NodeId(element),
            classification: tag.into(),
            input_type: Some(ty.into()),
            tag_name: tag_name.into(),
        }
    }

    #[test]
    fn tags_round_trip_through_their_wire_names() {
        for tag in ClassificationTag::ALL {
            assert_eq!(tag.as_str().parse::<ClassificationTag>().unwrap(), *tag);
        }
    }

    #[test]
    fn invalid_entries_are_set_aside_individually() {
        let mut catalog = RawFieldCatalog::new();
        catalog.insert(
            "personal".into(),
            vec![raw(1, "email", "email", "input"), raw(2, "favouriteColour", "text", "input")],
        );
        catalog.insert("hobbies".into(), vec![raw(3, "email", "text", "input")]);

        let catalog = FieldCatalog::from_raw(catalog);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.fields(FieldCategory::Personal)[0].element, NodeId(1));
        let rejected = catalog.rejected();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].element, NodeId(3));
        assert_eq!(rejected[0].category, None);
        assert_eq!(rejected[0].reason, CoreError::UnknownCategory("hobbies".into()));
        assert_eq!(rejected[1].classification, "favouriteColour");
        assert_eq!(rejected[1].category, Some(FieldCategory::Personal));
        assert_eq!(rejected[1].reason, CoreError::UnknownTag("favouriteColour".into()));
    }

    #[test]
    fn catalog_iterates_in_fill_order() {
        let mut catalog = RawFieldCatalog::new();
        catalog.insert("misc".into(), vec![raw(3, "professionalSummary", "textarea", "textarea")]);
        catalog.insert("personal".into(), vec![raw(1, "email", "email", "input")]);
        catalog.insert("resume".into(), vec![raw(2, "resume", "file", "input")]);
        let catalog = FieldCatalog::from_raw(catalog);
        let order: Vec<_> = catalog.iter().map(|(_, f)| f.element.0).collect();
        assert_eq!(order, vec![1, 3, 2]);
        assert_eq!(catalog.fields(FieldCategory::Misc)[0].kind, ControlKind::Textarea);
    }

    #[test]
    fn control_kind_prefers_tag_name_for_select() {
        assert_eq!(ControlKind::from_parts("SELECT", Some("select-one")), ControlKind::Select);
        assert_eq!(ControlKind::from_parts("input", None), ControlKind::Text);
        assert_eq!(ControlKind::from_parts("input", Some("color")), ControlKind::Other);
    }
}
