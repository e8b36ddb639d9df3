//! Amazon-Connect-style interactive message templates.
//!
//! BlueBubbles delivers plain text, so every template also renders a
//! text fallback; the JSON form is kept for channels that can display
//! native interactive messages.

use serde::Serialize;

use crate::catalog::{FieldCatalog, FieldDefinition, FieldKind, TextRule};

/// Interactive message template, tagged the way Amazon Connect tags
/// its payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "templateType")]
pub enum InteractiveMessage {
    ListPicker { version: String, data: ListPickerData },
    Form { version: String, data: FormData },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPickerData {
    pub content: ListPickerContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPickerContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub items: Vec<PickerItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerItem {
    pub title: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormData {
    pub content: FormContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFieldType {
    Text,
    Email,
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateField {
    pub label: String,
    pub identifier: String,
    #[serde(rename = "type")]
    pub field_type: TemplateFieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PickerItem>>,
}

impl InteractiveMessage {
    pub const VERSION: &'static str = "1.0";

    /// ListPicker template over `(title, identifier)` items.
    pub fn list_picker(
        title: impl Into<String>,
        subtitle: Option<&str>,
        items: Vec<PickerItem>,
    ) -> Self {
        Self::ListPicker {
            version: Self::VERSION.to_string(),
            data: ListPickerData {
                content: ListPickerContent {
                    title: title.into(),
                    subtitle: subtitle.map(str::to_string),
                    items,
                },
            },
        }
    }

    /// Form template over pre-built fields.
    pub fn form(
        title: impl Into<String>,
        subtitle: Option<&str>,
        fields: Vec<TemplateField>,
    ) -> Self {
        Self::Form {
            version: Self::VERSION.to_string(),
            data: FormData {
                content: FormContent {
                    title: title.into(),
                    subtitle: subtitle.map(str::to_string),
                    fields,
                },
            },
        }
    }

    /// Form template covering every field of a catalog, in order.
    pub fn form_from_catalog(
        catalog: &FieldCatalog,
        title: impl Into<String>,
        subtitle: Option<&str>,
    ) -> Self {
        let fields = catalog.fields().iter().map(template_field).collect();
        Self::form(title, subtitle, fields)
    }

    /// ListPicker template for one field; `None` unless the field is a
    /// list-picker.
    pub fn list_picker_for_field(field: &FieldDefinition) -> Option<Self> {
        if field.kind != FieldKind::ListPicker {
            return None;
        }
        Some(Self::list_picker(
            field.label.clone(),
            None,
            field.options.iter().map(|option| PickerItem {
                title: option.label.clone(),
                identifier: option.value.clone(),
            })
            .collect(),
        ))
    }

    /// Plain-text rendering for channels without interactive message
    /// support. List items are numbered so a numeric reply is
    /// unambiguous.
    pub fn format_for_imessage(&self) -> String {
        match self {
            Self::ListPicker { data, .. } => {
                let content = &data.content;
                let mut text = format!("📋 {}\n", content.title);
                if let Some(subtitle) = &content.subtitle {
                    text.push_str(&format!("{subtitle}\n\n"));
                }
                for (idx, item) in content.items.iter().enumerate() {
                    text.push_str(&format!("{}. {}\n", idx + 1, item.title));
                }
                text.push_str("\nPlease reply with the number of your choice.");
                text
            }
            Self::Form { data, .. } => {
                let content = &data.content;
                let mut text = format!("📝 {}\n", content.title);
                if let Some(subtitle) = &content.subtitle {
                    text.push_str(&format!("{subtitle}\n\n"));
                }
                for field in &content.fields {
                    let marker = if field.required { " *" } else { "" };
                    match &field.options {
                        Some(options) => {
                            text.push_str(&format!("{}{marker}:\n", field.label));
                            for (idx, option) in options.iter().enumerate() {
                                text.push_str(&format!("  {}. {}\n", idx + 1, option.title));
                            }
                        }
                        None => {
                            let hint = field.placeholder.as_deref().unwrap_or("___");
                            text.push_str(&format!("{}{marker}: {hint}\n", field.label));
                        }
                    }
                }
                text.push_str("\nPlease provide your information above.");
                text
            }
        }
    }
}

fn template_field(field: &FieldDefinition) -> TemplateField {
    let field_type = match (field.kind, field.rule) {
        (FieldKind::ListPicker, _) => TemplateFieldType::List,
        (FieldKind::Text, TextRule::Email) => TemplateFieldType::Email,
        (FieldKind::Text, TextRule::FreeText) => TemplateFieldType::Text,
    };
    let options = match field.kind {
        FieldKind::ListPicker => Some(
            field
                .options
                .iter()
                .map(|option| PickerItem {
                    title: option.label.clone(),
                    identifier: option.value.clone(),
                })
                .collect(),
        ),
        FieldKind::Text => None,
    };
    TemplateField {
        label: field.label.clone(),
        identifier: field.id.clone(),
        field_type,
        required: field.required,
        placeholder: field.placeholder.clone(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            FieldDefinition::text("name", "Name").with_placeholder("Enter your full name"),
            FieldDefinition::list_picker(
                "country",
                "Choose Country",
                &[("US", "United States"), ("CA", "Canada")],
            ),
            FieldDefinition::email("email", "Email"),
        ])
        .unwrap()
    }

    #[test]
    fn form_template_matches_the_connect_shape() {
        let template = InteractiveMessage::form_from_catalog(
            &make_catalog(),
            "Customer Information Form",
            Some("Please provide the following information:"),
        );
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(
            value,
            json!({
                "templateType": "Form",
                "version": "1.0",
                "data": {
                    "content": {
                        "title": "Customer Information Form",
                        "subtitle": "Please provide the following information:",
                        "fields": [
                            {
                                "label": "Name",
                                "identifier": "name",
                                "type": "text",
                                "required": true,
                                "placeholder": "Enter your full name"
                            },
                            {
                                "label": "Choose Country",
                                "identifier": "country",
                                "type": "list",
                                "required": true,
                                "options": [
                                    {"title": "United States", "identifier": "US"},
                                    {"title": "Canada", "identifier": "CA"}
                                ]
                            },
                            {
                                "label": "Email",
                                "identifier": "email",
                                "type": "email",
                                "required": true
                            }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn list_picker_template_matches_the_connect_shape() {
        let catalog = make_catalog();
        let country = catalog.field_at(1).unwrap();
        let template = InteractiveMessage::list_picker_for_field(country).unwrap();
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(
            value,
            json!({
                "templateType": "ListPicker",
                "version": "1.0",
                "data": {
                    "content": {
                        "title": "Choose Country",
                        "subtitle": null,
                        "items": [
                            {"title": "United States", "identifier": "US"},
                            {"title": "Canada", "identifier": "CA"}
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn text_fields_have_no_list_picker_template() {
        let catalog = make_catalog();
        let name = catalog.field_at(0).unwrap();
        assert!(InteractiveMessage::list_picker_for_field(name).is_none());
    }

    #[test]
    fn list_picker_fallback_numbers_the_items() {
        let catalog = make_catalog();
        let country = catalog.field_at(1).unwrap();
        let text = InteractiveMessage::list_picker_for_field(country)
            .unwrap()
            .format_for_imessage();

        assert!(text.starts_with("📋 Choose Country\n"));
        assert!(text.contains("1. United States\n"));
        assert!(text.contains("2. Canada\n"));
        assert!(text.ends_with("Please reply with the number of your choice."));
    }

    #[test]
    fn form_fallback_lists_fields_and_markers() {
        let template = InteractiveMessage::form_from_catalog(
            &make_catalog(),
            "Customer Information Form",
            Some("Please provide the following information:"),
        );
        let text = template.format_for_imessage();

        assert!(text.starts_with("📝 Customer Information Form\n"));
        assert!(text.contains("Please provide the following information:\n"));
        assert!(text.contains("Name *: Enter your full name\n"));
        assert!(text.contains("Choose Country *:\n  1. United States\n  2. Canada\n"));
        assert!(text.contains("Email *: ___\n"));
        assert!(text.ends_with("Please provide your information above."));
    }
}
