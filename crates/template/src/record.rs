//! Certificate record

use crate::date::CertificateDate;
use crate::{Result, TemplateError};

/// One recipient's certificate data
///
/// Built only through [`CertificateRecord::new`], so a record in hand always
/// has a non-blank name, course and date. Fields are trimmed; an empty
/// description is stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    name: String,
    course: String,
    date: CertificateDate,
    description: Option<String>,
}

impl CertificateRecord {
    /// Validate and build a record
    ///
    /// # Arguments
    /// * `name` - Recipient name
    /// * `course` - Course, program or workshop title
    /// * `date` - Completion date, ideally `YYYY-MM-DD`
    /// * `description` - Optional extra line for the body paragraph
    ///
    /// # Errors
    /// [`TemplateError::Validation`] naming the first blank mandatory field,
    /// [`TemplateError::ControlCharacter`] if name, course or date contains a
    /// line break or other control character
    pub fn new(
        name: &str,
        course: &str,
        date: &str,
        description: Option<&str>,
    ) -> Result<Self> {
        let name = name.trim();
        let course = course.trim();
        let date = CertificateDate::parse(date);

        if name.is_empty() {
            return Err(TemplateError::Validation("name".to_string()));
        }
        if course.is_empty() {
            return Err(TemplateError::Validation("course".to_string()));
        }
        if date.is_empty() {
            return Err(TemplateError::Validation("date".to_string()));
        }
        for (field, value) in [("name", name), ("course", course), ("date", date.raw())] {
            if value.chars().any(char::is_control) {
                return Err(TemplateError::ControlCharacter(field.to_string()));
            }
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            course: course.to_string(),
            date,
            description,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn date(&self) -> &CertificateDate {
        &self.date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
