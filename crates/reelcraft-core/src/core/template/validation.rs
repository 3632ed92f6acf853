//! Template Validation
//!
//! Structural checks of placeholder geometry and timing against the template
//! canvas and duration, plus required-value checks against render data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::models::{Placeholder, Template};

/// Values supplied at render time, keyed by placeholder id or name
pub type TemplateData = HashMap<String, serde_json::Value>;

/// Validation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the template can be rendered
    pub valid: bool,
    /// Blocking problems
    pub errors: Vec<String>,
    /// Non-blocking problems
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a passing report
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failing report with errors
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Adds an error
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.valid = false;
    }

    /// Adds a warning
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Joins all errors into one message
    pub fn error_summary(&self) -> String {
        self.errors.join("; ")
    }
}

/// Returns the data value for a placeholder, looked up by id then by name.
///
/// `null` and empty strings count as absent.
pub fn lookup_value<'a>(
    placeholder: &Placeholder,
    data: &'a TemplateData,
) -> Option<&'a serde_json::Value> {
    [placeholder.id.as_str(), placeholder.name.as_str()]
        .into_iter()
        .filter_map(|key| data.get(key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Validates a template, optionally against render data
pub fn validate(template: &Template, data: Option<&TemplateData>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for placeholder in &template.placeholders {
        if !placeholder.fits_canvas(template.width, template.height) {
            result.add_error(format!(
                "Placeholder \"{}\" exceeds canvas bounds: ({}, {}) to ({}, {}) outside {}x{}",
                placeholder.name,
                placeholder.x,
                placeholder.y,
                placeholder.right(),
                placeholder.bottom(),
                template.width,
                template.height
            ));
        }

        if !placeholder.fits_duration(template.duration) {
            result.add_error(format!(
                "Placeholder \"{}\" exceeds template duration: {:.2}s to {:.2}s outside 0s to {:.2}s",
                placeholder.name,
                placeholder.start_time,
                placeholder.end_time(),
                template.duration
            ));
        }

        let Some(data) = data else {
            continue;
        };
        if !placeholder.required || lookup_value(placeholder, data).is_some() {
            continue;
        }

        if placeholder.default_value.is_some() {
            result.add_warning(format!(
                "Required placeholder \"{}\" has no value; default value will be used",
                placeholder.name
            ));
        } else {
            result.add_error(format!(
                "Required placeholder \"{}\" has no value",
                placeholder.name
            ));
        }
    }

    result
}

/// Resolves the value rendered into each placeholder (data first, then default)
pub fn resolve_values(template: &Template, data: &TemplateData) -> TemplateData {
    template
        .placeholders
        .iter()
        .filter_map(|p| {
            lookup_value(p, data)
                .cloned()
                .or_else(|| p.default_value.clone())
                .map(|value| (p.id.clone(), value))
        })
        .collect()
}
