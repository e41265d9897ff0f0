use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Backend-assigned identifier. Some endpoints hand out integers, others
/// slugs or uuids; the value is opaque to the client either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ItemId {
    /// Compares against user input such as a CLI argument, where `12` and
    /// `"12"` name the same row.
    pub fn matches_text(&self, raw: &str) -> bool {
        self.to_string() == raw.trim()
    }
}

fn default_active() -> bool {
    true
}

/// One row of a reorderable list. `payload` carries the entity fields and is
/// opaque to the ordering logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedItem<P> {
    pub id: ItemId,
    #[serde(default, alias = "order", alias = "orden")]
    pub position: i64,
    #[serde(default = "default_active", alias = "activo", alias = "activa")]
    pub active: bool,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> OrderedItem<P> {
    pub fn new(id: impl Into<ItemId>, position: i64, payload: P) -> Self {
        Self {
            id: id.into(),
            position,
            active: true,
            payload,
        }
    }
}

/// Text used by list screens to match a search query.
pub trait Searchable {
    fn haystack(&self) -> String;

    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.haystack().to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "cargo")]
    pub role: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default, alias = "departamento")]
    pub area: Option<String>,
}

impl Searchable for Contact {
    fn haystack(&self) -> String {
        [
            Some(self.name.as_str()),
            self.role.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
            self.extension.as_deref(),
            self.area.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StayType {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    #[serde(default, alias = "documentCount", alias = "documentos_count")]
    pub document_count: u32,
}

impl Searchable for StayType {
    fn haystack(&self) -> String {
        format!(
            "{} {}",
            self.name,
            self.description.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    #[serde(default, alias = "obligatorio")]
    pub required: bool,
}

impl Searchable for DocumentType {
    fn haystack(&self) -> String {
        format!(
            "{} {}",
            self.name,
            self.description.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(default, alias = "subtitulo")]
    pub subtitle: Option<String>,
    #[serde(flatten)]
    pub body: SectionBody,
}

impl Searchable for Section {
    fn haystack(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.subtitle.as_deref().unwrap_or_default(),
            self.body.kind().label()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// Section content, one shape per section `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SectionBody {
    Text {
        body: String,
    },
    #[serde(alias = "beca")]
    Scholarship {
        name: String,
        #[serde(default)]
        amount: Option<String>,
        #[serde(default)]
        requirements: Vec<String>,
        #[serde(default)]
        deadline: Option<NaiveDate>,
    },
    #[serde(alias = "directorio")]
    Directory {
        #[serde(default)]
        contact_ids: Vec<ItemId>,
    },
    #[serde(alias = "documentos")]
    Documents {
        #[serde(default)]
        documents: Vec<DocumentLink>,
    },
    #[serde(alias = "aviso")]
    AdmissionNotice {
        headline: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        published_on: Option<NaiveDate>,
        #[serde(default)]
        expires_on: Option<NaiveDate>,
    },
    #[serde(alias = "enlaces")]
    Links {
        #[serde(default)]
        links: Vec<Link>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Text,
    Scholarship,
    Directory,
    Documents,
    AdmissionNotice,
    Links,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Text,
        SectionKind::Scholarship,
        SectionKind::Directory,
        SectionKind::Documents,
        SectionKind::AdmissionNotice,
        SectionKind::Links,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Scholarship => "scholarship",
            Self::Directory => "directory",
            Self::Documents => "documents",
            Self::AdmissionNotice => "admission_notice",
            Self::Links => "links",
        }
    }
}

impl SectionBody {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Text { .. } => SectionKind::Text,
            Self::Scholarship { .. } => SectionKind::Scholarship,
            Self::Directory { .. } => SectionKind::Directory,
            Self::Documents { .. } => SectionKind::Documents,
            Self::AdmissionNotice { .. } => SectionKind::AdmissionNotice,
            Self::Links { .. } => SectionKind::Links,
        }
    }
}

/// Collections the dashboard edits, with their default endpoint paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Contacts,
    StayTypes,
    DocumentTypes,
    Sections,
}

impl ResourceKind {
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Contacts => "directorio",
            Self::StayTypes => "tipos-estadia",
            Self::DocumentTypes => "tipos-documento",
            Self::Sections => "becas/secciones",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::StayTypes => "stay-types",
            Self::DocumentTypes => "document-types",
            Self::Sections => "sections",
        }
    }
}
