//! Page rendering module
//!
//! Renders the conversion page from the embedded Handlebars template.
//! The template is registered once at startup; rendering is read-only and
//! can be shared across connections.

use std::fmt::Display;

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::converter::{ConversionRegistry, ConversionResult};

const PAGE_TEMPLATE_NAME: &str = "index";
const PAGE_TEMPLATE: &str = include_str!("../../templates/index.hbs");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// One `<option>` of the conversion selector
#[derive(Debug, Serialize)]
struct OptionView<'a> {
    id: &'a str,
    label: &'a str,
    selected: bool,
}

/// Data handed to the page template
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    hostname: &'a str,
    conversions: Vec<OptionView<'a>>,
    value: &'a str,
    result: Option<String>,
    unit: Option<&'static str>,
    error: Option<String>,
}

impl<'a> PageView<'a> {
    /// Blank form with the first conversion preselected
    pub fn new(registry: &'a ConversionRegistry, hostname: &'a str) -> Self {
        let conversions = registry
            .iter()
            .enumerate()
            .map(|(index, c)| OptionView {
                id: c.id,
                label: c.label,
                selected: index == 0,
            })
            .collect();

        Self {
            hostname,
            conversions,
            value: "",
            result: None,
            unit: None,
            error: None,
        }
    }

    /// Echo the submitted input back into the form
    #[must_use]
    pub fn with_input(mut self, type_id: &str, value: &'a str) -> Self {
        let type_id = type_id.trim();
        if self.conversions.iter().any(|o| o.id == type_id) {
            for option in &mut self.conversions {
                option.selected = option.id == type_id;
            }
        }
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_result(mut self, outcome: &ConversionResult) -> Self {
        self.result = Some(format_result(outcome.result));
        self.unit = Some(outcome.unit);
        self
    }

    /// Show `error` in the page's error block
    #[must_use]
    pub fn with_error(mut self, error: &impl Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Format a converted value the way it is shown on the page (`1.0`, `3.28084`)
pub fn format_result(value: f64) -> String {
    format!("{value:?}")
}

/// Handlebars-backed renderer for the conversion page
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        // Unknown template variables fail the render instead of printing nothing
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, view: &PageView<'_>) -> Result<String, RenderError> {
        Ok(self.handlebars.render(PAGE_TEMPLATE_NAME, view)?)
    }
}
