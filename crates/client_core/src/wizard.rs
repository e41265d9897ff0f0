//! Step-by-step assembly of a new content section.

use shared::domain::{Section, SectionBody, SectionKind};
use thiserror::Error;

use crate::api::ItemFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    ChooseKind,
    Details,
    Body,
    Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("choose a section type first")]
    KindMissing,
    #[error("the title is required")]
    TitleMissing,
    #[error("the section content is required")]
    BodyMissing,
    #[error("content of type {found} does not fit a {expected} section")]
    BodyMismatch { expected: &'static str, found: &'static str },
    #[error("{0}")]
    Incomplete(&'static str),
    #[error("the wizard is not on the review step")]
    NotReady,
}

#[derive(Debug, Clone)]
pub struct SectionWizard {
    step: WizardStep,
    kind: Option<SectionKind>,
    title: String,
    subtitle: Option<String>,
    body: Option<SectionBody>,
    active: bool,
}

impl Default for SectionWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::ChooseKind,
            kind: None,
            title: String::new(),
            subtitle: None,
            body: None,
            active: true,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn kind(&self) -> Option<SectionKind> {
        self.kind
    }

    /// Changing the type throws away content entered for another type.
    pub fn choose_kind(&mut self, kind: SectionKind) {
        if self.kind != Some(kind) {
            self.body = None;
        }
        self.kind = Some(kind);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_subtitle(&mut self, subtitle: Option<String>) {
        self.subtitle = subtitle.filter(|subtitle| !subtitle.trim().is_empty());
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_body(&mut self, body: SectionBody) {
        self.body = Some(body);
    }

    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        self.validate_step(self.step)?;
        self.step = match self.step {
            WizardStep::ChooseKind => WizardStep::Details,
            WizardStep::Details => WizardStep::Body,
            WizardStep::Body | WizardStep::Review => WizardStep::Review,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::ChooseKind | WizardStep::Details => WizardStep::ChooseKind,
            WizardStep::Body => WizardStep::Details,
            WizardStep::Review => WizardStep::Body,
        };
        self.step
    }

    pub fn preview(&self) -> Option<Section> {
        Some(Section {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.clone(),
            body: self.body.clone()?,
        })
    }

    /// Payload for the create request.
    pub fn finish(&self) -> Result<ItemFields, WizardError> {
        if self.step != WizardStep::Review {
            return Err(WizardError::NotReady);
        }
        for step in [WizardStep::ChooseKind, WizardStep::Details, WizardStep::Body] {
            self.validate_step(step)?;
        }
        let section = self.preview().ok_or(WizardError::BodyMissing)?;
        let fields = ItemFields::from_serializable(&section)
            .map_err(|_| WizardError::Incomplete("section could not be encoded"))?;
        Ok(fields.with("active", self.active))
    }

    fn validate_step(&self, step: WizardStep) -> Result<(), WizardError> {
        match step {
            WizardStep::ChooseKind => self.kind.map(|_| ()).ok_or(WizardError::KindMissing),
            WizardStep::Details => {
                if self.title.trim().is_empty() {
                    Err(WizardError::TitleMissing)
                } else {
                    Ok(())
                }
            }
            WizardStep::Body => {
                let kind = self.kind.ok_or(WizardError::KindMissing)?;
                let body = self.body.as_ref().ok_or(WizardError::BodyMissing)?;
                if body.kind() != kind {
                    return Err(WizardError::BodyMismatch {
                        expected: kind.label(),
                        found: body.kind().label(),
                    });
                }
                validate_body(body)
            }
            WizardStep::Review => Ok(()),
        }
    }
}

fn validate_body(body: &SectionBody) -> Result<(), WizardError> {
    match body {
        SectionBody::Text { body } if body.trim().is_empty() => Err(WizardError::BodyMissing),
        SectionBody::Scholarship { name, .. } if name.trim().is_empty() => {
            Err(WizardError::Incomplete("the scholarship name is required"))
        }
        SectionBody::Directory { contact_ids } if contact_ids.is_empty() => {
            Err(WizardError::Incomplete("pick at least one contact"))
        }
        SectionBody::Documents { documents }
            if documents.is_empty() || documents.iter().any(|doc| doc.url.trim().is_empty()) =>
        {
            Err(WizardError::Incomplete("every document needs a file or url"))
        }
        SectionBody::AdmissionNotice {
            headline,
            published_on,
            expires_on,
            ..
        } => {
            if headline.trim().is_empty() {
                return Err(WizardError::Incomplete("the notice headline is required"));
            }
            match (published_on, expires_on) {
                (Some(published), Some(expires)) if expires < published => Err(
                    WizardError::Incomplete("the notice expires before it is published"),
                ),
                _ => Ok(()),
            }
        }
        SectionBody::Links { links }
            if links.is_empty() || links.iter().any(|link| link.url.trim().is_empty()) =>
        {
            Err(WizardError::Incomplete("every link needs a url"))
        }
        _ => Ok(()),
    }
}
