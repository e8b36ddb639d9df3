//! Customer-facing text: prompts, re-prompts, and the hand-off summary.
//!
//! Pure string building; delivery and state live elsewhere.

use indexmap::IndexMap;

use crate::catalog::{FieldCatalog, FieldDefinition, FieldKind};
use crate::flow::machine::InvalidReason;
use crate::template::InteractiveMessage;

/// Title of the intake form template.
pub const FORM_TITLE: &str = "Customer Information Form";
/// Subtitle of the intake form template.
pub const FORM_SUBTITLE: &str = "Please provide the following information:";

/// Greeting for idle conversations that didn't use a trigger keyword.
pub fn greeting() -> String {
    "Hello! 👋\n\nI can help you with:\n• Fill out a form (type 'form')\n• Get assistance\n\nHow can I help you today?".to_string()
}

/// Fallback for operations against a conversation with no active flow.
pub fn no_active_flow() -> String {
    "No active form — type 'form' to start.".to_string()
}

/// Courtesy line for messages arriving after the form completed.
pub fn handoff_pending() -> String {
    "Thank you for your patience. An agent will respond shortly.".to_string()
}

/// The intake form as an interactive template, sent when a flow starts.
pub fn intake_template(catalog: &FieldCatalog) -> InteractiveMessage {
    InteractiveMessage::form_from_catalog(catalog, FORM_TITLE, Some(FORM_SUBTITLE))
}

/// Prompt for one field. List-picker prompts enumerate the options as
/// `"<index>. <label>"` in catalog order so a numeric reply is
/// unambiguous.
pub fn field_prompt(field: &FieldDefinition) -> String {
    match field.kind {
        FieldKind::ListPicker => match InteractiveMessage::list_picker_for_field(field) {
            Some(template) => template.format_for_imessage(),
            None => format!("Please provide your {}:", field.label.to_lowercase()),
        },
        FieldKind::Text => format!("What is your {}?", field.label.to_lowercase()),
    }
}

/// Re-prompt after a rejected answer: the reason first, then the same
/// field's prompt again.
pub fn invalid_reprompt(reason: &InvalidReason, field: &FieldDefinition) -> String {
    format!("{reason}\n\n{}", field_prompt(field))
}

/// Hand-off summary once every field is collected. Picker answers are
/// shown by display label rather than stored value.
pub fn completion_summary(catalog: &FieldCatalog, answers: &IndexMap<String, String>) -> String {
    let mut lines = String::new();
    for field in catalog.fields() {
        let Some(value) = answers.get(&field.id) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let shown = display_value(field, value);
        lines.push_str(&format!("• {}: {}\n", field.label, shown));
    }
    format!(
        "✅ Thank you! I've received your information:\n\n📋 **Customer Information:**\n{lines}\nAn agent will be with you shortly to assist you further."
    )
}

fn display_value<'a>(field: &'a FieldDefinition, value: &'a str) -> &'a str {
    field
        .options
        .iter()
        .find(|option| option.value == value)
        .map(|option| option.label.as_str())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDefinition;

    fn make_catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            FieldDefinition::text("name", "Full Name"),
            FieldDefinition::list_picker(
                "country",
                "Country",
                &[("US", "United States"), ("CA", "Canada")],
            ),
            FieldDefinition::email("email", "Email Address"),
        ])
        .unwrap()
    }

    #[test]
    fn text_prompt_asks_the_question() {
        let catalog = make_catalog();
        assert_eq!(
            field_prompt(catalog.field_at(0).unwrap()),
            "What is your full name?"
        );
        assert_eq!(
            field_prompt(catalog.field_at(2).unwrap()),
            "What is your email address?"
        );
    }

    #[test]
    fn list_prompt_enumerates_options_in_catalog_order() {
        let catalog = make_catalog();
        let prompt = field_prompt(catalog.field_at(1).unwrap());

        let first = prompt.find("1. United States").expect("first option listed");
        let second = prompt.find("2. Canada").expect("second option listed");
        assert!(first < second);
        assert!(prompt.contains("Please reply with the number of your choice."));
    }

    #[test]
    fn invalid_reprompt_leads_with_the_reason() {
        let catalog = make_catalog();
        let country = catalog.field_at(1).unwrap();
        let text = invalid_reprompt(&InvalidReason::OptionOutOfRange { max: 2 }, country);

        assert!(text.starts_with("Please pick a number between 1 and 2."));
        assert!(text.contains("1. United States"));
    }

    #[test]
    fn completion_summary_shows_labels_not_stored_values() {
        let catalog = make_catalog();
        let mut answers = IndexMap::new();
        answers.insert("name".to_string(), "Jane Doe".to_string());
        answers.insert("country".to_string(), "US".to_string());
        answers.insert("email".to_string(), "jane@x.com".to_string());

        let summary = completion_summary(&catalog, &answers);
        assert!(summary.starts_with("✅ Thank you!"));
        assert!(summary.contains("• Full Name: Jane Doe\n"));
        assert!(summary.contains("• Country: United States\n"));
        assert!(summary.contains("• Email Address: jane@x.com\n"));
        assert!(summary.ends_with("An agent will be with you shortly to assist you further."));
    }

    #[test]
    fn completion_summary_skips_unanswered_and_empty_fields() {
        let catalog = make_catalog();
        let mut answers = IndexMap::new();
        answers.insert("name".to_string(), String::new());
        answers.insert("email".to_string(), "jane@x.com".to_string());

        let summary = completion_summary(&catalog, &answers);
        assert!(!summary.contains("Full Name"));
        assert!(!summary.contains("Country"));
        assert!(summary.contains("• Email Address: jane@x.com"));
    }

    #[test]
    fn intake_template_covers_the_whole_catalog() {
        let catalog = make_catalog();
        let text = intake_template(&catalog).format_for_imessage();
        assert!(text.contains(FORM_TITLE));
        assert!(text.contains("Full Name *:"));
        assert!(text.contains("  2. Canada"));
        assert!(text.contains("Email Address *:"));
    }
}
