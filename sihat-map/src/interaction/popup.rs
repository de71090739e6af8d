//! Popup content templates.

use super::format::{
    escape_html, format_number, format_percent, value_as_number, value_as_text, PLACEHOLDER,
};
use crate::geometry::Properties;
use crate::layer::NumericExpr;
use std::sync::Arc;

/// Which field set a popup shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupDetail {
    /// Hover popup: title plus summary fields
    Summary,
    /// Click popup: every field
    Full,
}

/// How a field value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Escaped text
    Text,
    /// Grouped number with up to this many decimals
    Number(usize),
    /// Ratio rendered as a percentage with this many decimals
    Percent(usize),
}

/// Where a field value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    Property(String),
    Expr(NumericExpr),
}

/// One labelled row of a popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupField {
    pub label: String,
    pub source: FieldSource,
    pub format: FieldFormat,
    /// Shown in hover popups as well as click popups
    pub summary: bool,
}

impl PopupField {
    pub fn text(label: &str, key: &str) -> Self {
        Self {
            label: label.to_string(),
            source: FieldSource::Property(key.to_string()),
            format: FieldFormat::Text,
            summary: false,
        }
    }

    pub fn number(label: &str, key: &str) -> Self {
        Self {
            label: label.to_string(),
            source: FieldSource::Property(key.to_string()),
            format: FieldFormat::Number(3),
            summary: false,
        }
    }

    /// Whole-number count read from `key`; a missing value reads as zero.
    pub fn count(label: &str, key: &str) -> Self {
        Self::computed(label, NumericExpr::sum(&[key]), FieldFormat::Number(0))
    }

    pub fn computed(label: &str, expr: NumericExpr, format: FieldFormat) -> Self {
        Self {
            label: label.to_string(),
            source: FieldSource::Expr(expr),
            format,
            summary: false,
        }
    }

    /// Include the field in hover popups.
    pub fn in_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    /// Rendered value, already escaped, or the placeholder.
    pub fn render_value(&self, properties: &Properties) -> String {
        let number = match &self.source {
            FieldSource::Property(key) => {
                let Some(value) = properties.get(key) else {
                    return PLACEHOLDER.to_string();
                };
                if self.format == FieldFormat::Text {
                    return value_as_text(value)
                        .map(|t| escape_html(&t))
                        .unwrap_or_else(|| PLACEHOLDER.to_string());
                }
                value_as_number(value)
            }
            FieldSource::Expr(expr) => expr.evaluate(properties),
        };

        match (number, self.format) {
            (Some(n), FieldFormat::Number(digits)) => format_number(n, digits),
            (Some(n), FieldFormat::Percent(digits)) => format_percent(n, digits),
            (Some(n), FieldFormat::Text) => format_number(n, 3),
            (None, _) => PLACEHOLDER.to_string(),
        }
    }
}

/// Maps raw feature properties to labelled popup rows for one layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupTemplate {
    /// Property keys tried in order for the heading
    pub title_keys: Vec<String>,
    pub fields: Vec<PopupField>,
}

/// Builds popup HTML for a feature.
pub type ContentBuilder = Arc<dyn Fn(&Properties, PopupDetail) -> String + Send + Sync>;

impl PopupTemplate {
    pub fn new<S: AsRef<str>>(title_keys: &[S]) -> Self {
        Self {
            title_keys: title_keys.iter().map(|k| k.as_ref().to_string()).collect(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: PopupField) -> Self {
        self.fields.push(field);
        self
    }

    /// Escaped heading: the first non-blank title key, else the placeholder.
    pub fn title(&self, properties: &Properties) -> String {
        self.title_keys
            .iter()
            .find_map(|k| properties.get(k).and_then(value_as_text))
            .map(|t| escape_html(&t))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// Popup HTML for a feature.
    pub fn render(&self, properties: &Properties, detail: PopupDetail) -> String {
        let mut html = String::from("<div class=\"popup\">");
        html.push_str("<h3 class=\"popup-title\">");
        html.push_str(&self.title(properties));
        html.push_str("</h3>");

        for field in self
            .fields
            .iter()
            .filter(|f| detail == PopupDetail::Full || f.summary)
        {
            html.push_str("<div class=\"popup-row\"><b>");
            html.push_str(&escape_html(&field.label));
            html.push_str("</b> ");
            html.push_str(&field.render_value(properties));
            html.push_str("</div>");
        }

        html.push_str("</div>");
        html
    }

    /// Wrap the template as a content builder closure.
    pub fn into_builder(self) -> ContentBuilder {
        Arc::new(move |properties: &Properties, detail: PopupDetail| {
            self.render(properties, detail)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Properties {
        value.as_object().cloned().unwrap()
    }

    fn population() -> PopupTemplate {
        PopupTemplate::new(&["namobj"])
            .field(PopupField::number("Penduduk", "jlhpendudu").in_summary())
            .field(PopupField::number("Kepadatan (jiwa/km²)", "kepadatan"))
    }

    #[test]
    fn test_full_popup_formats_numbers() {
        let html = population().render(
            &props(json!({"namobj": "Kelurahan A", "jlhpendudu": 15234, "kepadatan": 4210.5})),
            PopupDetail::Full,
        );
        assert!(html.contains("<h3 class=\"popup-title\">Kelurahan A</h3>"));
        assert!(html.contains("<b>Penduduk</b> 15.234"));
        assert!(html.contains("<b>Kepadatan (jiwa/km²)</b> 4.210,5"));
    }

    #[test]
    fn test_summary_popup_omits_full_only_fields() {
        let html = population().render(
            &props(json!({"namobj": "A", "jlhpendudu": 10, "kepadatan": 1})),
            PopupDetail::Summary,
        );
        assert!(html.contains("Penduduk"));
        assert!(!html.contains("Kepadatan"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = population().render(&props(json!({"namobj": "<b>X</b>"})), PopupDetail::Full);
        assert!(html.contains("&lt;b&gt;X&lt;/b&gt;"));
        assert!(!html.contains("<b>X</b>"));
    }

    #[test]
    fn test_missing_and_blank_values_show_placeholder() {
        let template = PopupTemplate::new(&["namobj"])
            .field(PopupField::text("Alamat", "alamat"))
            .field(PopupField::number("Penduduk", "jlhpendudu"));
        let html = template.render(
            &props(json!({"namobj": "  ", "alamat": null, "jlhpendudu": "n/a"})),
            PopupDetail::Full,
        );
        assert!(html.contains("<h3 class=\"popup-title\">-</h3>"));
        assert!(html.contains("<b>Alamat</b> -"));
        assert!(html.contains("<b>Penduduk</b> -"));
    }

    #[test]
    fn test_title_falls_back_to_next_key() {
        let template = PopupTemplate::new(&["namobj", "nama"]);
        assert_eq!(template.title(&props(json!({"nama": "RS Idaman"}))), "RS Idaman");
    }

    #[test]
    fn test_computed_percent_field() {
        let field = PopupField::computed(
            "Proporsi",
            NumericExpr::ratio(NumericExpr::field("a"), NumericExpr::field("b")),
            FieldFormat::Percent(1),
        );
        assert_eq!(field.render_value(&props(json!({"a": 1, "b": 8}))), "12,5%");
        assert_eq!(field.render_value(&props(json!({"a": 1, "b": 0}))), PLACEHOLDER);
    }

    #[test]
    fn test_label_is_escaped() {
        let template = PopupTemplate::new(&["namobj"]).field(PopupField::number(">75", "x"));
        let html = template.render(&props(json!({"x": 3})), PopupDetail::Full);
        assert!(html.contains("<b>&gt;75</b> 3"));
    }

    #[test]
    fn test_into_builder() {
        let builder = population().into_builder();
        let html = builder(&props(json!({"namobj": "A"})), PopupDetail::Summary);
        assert!(html.contains("<b>Penduduk</b> -"));
    }
}
