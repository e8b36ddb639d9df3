//! Form field catalog: the ordered definition of what the form collects.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CatalogError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

// ── Field definitions ───────────────────────────────────────────────

/// How a field collects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form text reply.
    Text,
    /// One choice out of a fixed, ordered option set.
    ListPicker,
}

/// Shape check applied to text answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    FreeText,
    /// Requires a local part, `@`, and a dotted domain.
    Email,
}

impl TextRule {
    pub fn matches(&self, input: &str) -> bool {
        match self {
            TextRule::FreeText => true,
            TextRule::Email => EMAIL_RE.is_match(input),
        }
    }
}

/// One selectable option of a list-picker field: machine-readable
/// `value` plus the label shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One unit of information the form collects.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Unique key the answer is stored under.
    pub id: String,
    /// Label shown in prompts and the hand-off summary.
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Hint shown on template renderings of the field.
    pub placeholder: Option<String>,
    /// Non-empty exactly for list-picker fields.
    pub options: Vec<FieldOption>,
    pub rule: TextRule,
}

impl FieldDefinition {
    /// Required free-text field.
    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required: true,
            placeholder: None,
            options: Vec::new(),
            rule: TextRule::FreeText,
        }
    }

    /// Required text field with the email shape check.
    pub fn email(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            rule: TextRule::Email,
            ..Self::text(id, label)
        }
    }

    /// Required list-picker field over `(value, label)` pairs.
    pub fn list_picker(
        id: impl Into<String>,
        label: impl Into<String>,
        options: &[(&str, &str)],
    ) -> Self {
        Self {
            kind: FieldKind::ListPicker,
            options: options
                .iter()
                .map(|(value, label)| FieldOption::new(*value, *label))
                .collect(),
            ..Self::text(id, label)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// Ordered, validated set of form fields. Static for the process
/// lifetime; built once at startup.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
}

impl FieldCatalog {
    /// Validate and build a catalog. Any failure here is a
    /// misconfiguration and should abort startup.
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self, CatalogError> {
        if fields.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.id.as_str()) {
                return Err(CatalogError::DuplicateFieldId(field.id.clone()));
            }
            match field.kind {
                FieldKind::ListPicker if field.options.is_empty() => {
                    return Err(CatalogError::MissingOptions(field.id.clone()));
                }
                FieldKind::Text if !field.options.is_empty() => {
                    return Err(CatalogError::UnexpectedOptions(field.id.clone()));
                }
                _ => {}
            }
        }
        Ok(Self { fields })
    }

    /// The default customer-intake form: name, company, country, email.
    pub fn customer_intake() -> Result<Self, CatalogError> {
        Self::new(vec![
            FieldDefinition::text("name", "Full Name").with_placeholder("Enter your full name"),
            FieldDefinition::text("company", "Company Name")
                .with_placeholder("Enter your company name"),
            FieldDefinition::list_picker(
                "country",
                "Country",
                &[
                    ("US", "United States"),
                    ("CA", "Canada"),
                    ("UK", "United Kingdom"),
                    ("AU", "Australia"),
                    ("DE", "Germany"),
                    ("FR", "France"),
                    ("JP", "Japan"),
                    ("OTHER", "Other"),
                ],
            ),
            FieldDefinition::email("email", "Email Address")
                .with_placeholder("your.email@example.com"),
        ])
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field_at(&self, index: usize) -> Result<&FieldDefinition, CatalogError> {
        self.fields.get(index).ok_or(CatalogError::IndexOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            FieldCatalog::new(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn duplicate_field_ids_are_rejected() {
        let result = FieldCatalog::new(vec![
            FieldDefinition::text("name", "Full Name"),
            FieldDefinition::text("name", "Nickname"),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateFieldId(id)) if id == "name"));
    }

    #[test]
    fn list_picker_without_options_is_rejected() {
        let result = FieldCatalog::new(vec![FieldDefinition::list_picker("country", "Country", &[])]);
        assert!(matches!(result, Err(CatalogError::MissingOptions(id)) if id == "country"));
    }

    #[test]
    fn text_field_with_options_is_rejected() {
        let mut field = FieldDefinition::text("name", "Full Name");
        field.options.push(FieldOption::new("X", "X"));
        assert!(matches!(
            FieldCatalog::new(vec![field]),
            Err(CatalogError::UnexpectedOptions(id)) if id == "name"
        ));
    }

    #[test]
    fn field_at_out_of_range_reports_index_and_len() {
        let catalog = FieldCatalog::new(vec![FieldDefinition::text("name", "Full Name")]).unwrap();
        assert!(catalog.field_at(0).is_ok());
        assert!(matches!(
            catalog.field_at(1),
            Err(CatalogError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn customer_intake_is_valid_and_ordered() {
        let catalog = FieldCatalog::customer_intake().unwrap();
        let ids: Vec<&str> = catalog.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "company", "country", "email"]);

        let country = catalog.field_at(2).unwrap();
        assert_eq!(country.kind, FieldKind::ListPicker);
        assert_eq!(country.options.len(), 8);
        assert_eq!(country.options[0].label, "United States");
    }

    #[test]
    fn email_rule_requires_at_and_dotted_domain() {
        assert!(TextRule::Email.matches("jane@x.com"));
        assert!(TextRule::Email.matches("jane.doe+tag@mail.example.org"));
        assert!(!TextRule::Email.matches("not-an-email"));
        assert!(!TextRule::Email.matches("jane@nodomain"));
        assert!(!TextRule::Email.matches("@x.com"));
        assert!(!TextRule::Email.matches("jane @x.com"));
    }

    #[test]
    fn free_text_rule_accepts_anything() {
        assert!(TextRule::FreeText.matches("anything at all"));
    }
}
