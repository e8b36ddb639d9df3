//! Pure decision logic: one inbound answer against one conversation flow.

use indexmap::IndexMap;

use crate::catalog::{FieldCatalog, FieldDefinition, FieldKind, TextRule};
use crate::flow::state::ConversationFlow;

/// Outcome of feeding one inbound message to a flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The flow is finished; the message is not consumed.
    Ignore,
    /// The answer failed validation; the same field is re-prompted.
    Invalid {
        field: FieldDefinition,
        reason: InvalidReason,
    },
    /// Answer stored; prompt for the next field.
    NextPrompt { field: FieldDefinition },
    /// Final answer stored; the form is ready for hand-off.
    Completed { answers: IndexMap<String, String> },
}

/// Why an answer was rejected. The display text is customer-facing
/// and leads the re-prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    EmptyAnswer,
    BadEmail,
    OptionOutOfRange { max: usize },
    OptionUnrecognized,
    OptionAmbiguous,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAnswer => write!(f, "That answer looks empty."),
            Self::BadEmail => write!(f, "That doesn't look like a valid email address."),
            Self::OptionOutOfRange { max } => {
                write!(f, "Please pick a number between 1 and {max}.")
            }
            Self::OptionUnrecognized => write!(f, "That doesn't match any of the options."),
            Self::OptionAmbiguous => write!(
                f,
                "That matches more than one option, so reply with the number instead."
            ),
        }
    }
}

/// Feed one inbound message to the flow.
///
/// Terminal flows ignore input; otherwise the message is validated
/// against the field at the cursor. A valid answer is stored
/// normalized (option value for pickers, trimmed text otherwise) and
/// the cursor moves forward, never back. Invalid answers leave the
/// flow untouched and re-prompt the same field, without an attempt
/// limit.
pub fn advance(flow: &mut ConversationFlow, catalog: &FieldCatalog, input: &str) -> Decision {
    if flow.state.is_terminal() {
        return Decision::Ignore;
    }
    let Ok(field) = catalog.field_at(flow.cursor) else {
        return Decision::Ignore;
    };
    let field = field.clone();

    match check_answer(&field, input) {
        Err(reason) => Decision::Invalid { field, reason },
        Ok(value) => {
            flow.record_answer(&field.id, value);
            match catalog.field_at(flow.cursor) {
                Ok(next) => {
                    let next = next.clone();
                    flow.await_field(&next.id);
                    Decision::NextPrompt { field: next }
                }
                Err(_) => {
                    flow.complete();
                    Decision::Completed {
                        answers: flow.answers.clone(),
                    }
                }
            }
        }
    }
}

/// Validate one answer against one field, returning the normalized
/// value to store.
///
/// List-picker input is interpreted as a 1-based index first; numeric
/// input in range always wins over label text. Otherwise the input
/// must match exactly one option's label or value, case-insensitively;
/// matching more than one is never silently resolved.
pub fn check_answer(field: &FieldDefinition, input: &str) -> Result<String, InvalidReason> {
    let trimmed = input.trim();
    match field.kind {
        FieldKind::ListPicker => {
            if trimmed.is_empty() {
                return Err(InvalidReason::EmptyAnswer);
            }
            if let Ok(index) = trimmed.parse::<usize>() {
                if (1..=field.options.len()).contains(&index) {
                    return Ok(field.options[index - 1].value.clone());
                }
            }
            let lowered = trimmed.to_lowercase();
            let mut matches = field.options.iter().filter(|option| {
                option.label.to_lowercase() == lowered || option.value.to_lowercase() == lowered
            });
            match (matches.next(), matches.next()) {
                (Some(option), None) => Ok(option.value.clone()),
                (Some(_), Some(_)) => Err(InvalidReason::OptionAmbiguous),
                (None, _) => {
                    if trimmed.chars().all(|c| c.is_ascii_digit()) {
                        Err(InvalidReason::OptionOutOfRange {
                            max: field.options.len(),
                        })
                    } else {
                        Err(InvalidReason::OptionUnrecognized)
                    }
                }
            }
        }
        FieldKind::Text => {
            if trimmed.is_empty() {
                return if field.required {
                    Err(InvalidReason::EmptyAnswer)
                } else {
                    Ok(String::new())
                };
            }
            if field.rule.matches(trimmed) {
                Ok(trimmed.to_string())
            } else {
                Err(match field.rule {
                    TextRule::Email => InvalidReason::BadEmail,
                    TextRule::FreeText => InvalidReason::EmptyAnswer,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDefinition;
    use crate::flow::state::FlowState;

    fn scenario_catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            FieldDefinition::text("name", "Name"),
            FieldDefinition::list_picker("country", "Country", &[("USA", "USA"), ("Canada", "Canada")]),
            FieldDefinition::email("email", "Email"),
        ])
        .unwrap()
    }

    fn picker(options: &[(&str, &str)]) -> FieldDefinition {
        FieldDefinition::list_picker("country", "Country", options)
    }

    #[test]
    fn end_to_end_scenario() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);

        let decision = advance(&mut flow, &catalog, "Jane Doe");
        assert!(matches!(decision, Decision::NextPrompt { field } if field.id == "country"));

        let decision = advance(&mut flow, &catalog, "1");
        assert!(matches!(decision, Decision::NextPrompt { field } if field.id == "email"));

        let decision = advance(&mut flow, &catalog, "not-an-email");
        assert!(matches!(
            decision,
            Decision::Invalid {
                field,
                reason: InvalidReason::BadEmail
            } if field.id == "email"
        ));

        let decision = advance(&mut flow, &catalog, "jane@x.com");
        let Decision::Completed { answers } = decision else {
            panic!("expected completion, got {decision:?}");
        };
        let collected: Vec<(&str, &str)> = answers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            collected,
            vec![
                ("name", "Jane Doe"),
                ("country", "USA"),
                ("email", "jane@x.com")
            ]
        );
        assert_eq!(flow.state, FlowState::Completed);
    }

    #[test]
    fn cursor_never_decreases() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);
        let inputs = ["", "Jane Doe", "Mars", "canada", "nope", "jane@x.com", "extra"];
        let mut last_cursor = flow.cursor;
        for input in inputs {
            advance(&mut flow, &catalog, input);
            assert!(flow.cursor >= last_cursor, "cursor went backward on {input:?}");
            last_cursor = flow.cursor;
        }
        assert_eq!(flow.state, FlowState::Completed);
    }

    #[test]
    fn completed_flow_has_every_required_answer() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);
        for input in ["Jane Doe", "2", "jane@x.com"] {
            advance(&mut flow, &catalog, input);
        }
        assert_eq!(flow.state, FlowState::Completed);
        for field in catalog.fields().iter().filter(|f| f.required) {
            assert!(
                flow.answers.contains_key(&field.id),
                "missing required answer for {}",
                field.id
            );
        }
    }

    #[test]
    fn terminal_flows_ignore_input() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);
        for input in ["Jane Doe", "1", "jane@x.com"] {
            advance(&mut flow, &catalog, input);
        }
        let answers_before = flow.answers.clone();

        assert_eq!(advance(&mut flow, &catalog, "hello?"), Decision::Ignore);
        assert_eq!(flow.answers, answers_before);

        flow.state = FlowState::Reset;
        assert_eq!(advance(&mut flow, &catalog, "hello?"), Decision::Ignore);
    }

    #[test]
    fn not_started_flow_collects_the_first_field() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);
        flow.state = FlowState::NotStarted;

        let decision = advance(&mut flow, &catalog, "Jane Doe");
        assert!(matches!(decision, Decision::NextPrompt { field } if field.id == "country"));
        assert_eq!(flow.cursor, 1);
    }

    #[test]
    fn numeric_index_selects_the_option() {
        let field = picker(&[("USA", "USA"), ("Canada", "Canada")]);
        assert_eq!(check_answer(&field, "2").unwrap(), "Canada");
        assert_eq!(check_answer(&field, " 1 ").unwrap(), "USA");
    }

    #[test]
    fn in_range_number_wins_over_matching_label() {
        // An option literally labeled "2" does not shadow index 2.
        let field = picker(&[("2", "2"), ("B", "B")]);
        assert_eq!(check_answer(&field, "2").unwrap(), "B");
    }

    #[test]
    fn out_of_range_number_still_tries_labels() {
        let field = picker(&[("7", "7"), ("B", "B")]);
        assert_eq!(check_answer(&field, "7").unwrap(), "7");
        assert_eq!(
            check_answer(&field, "9"),
            Err(InvalidReason::OptionOutOfRange { max: 2 })
        );
    }

    #[test]
    fn label_and_value_match_case_insensitively() {
        let field = picker(&[("US", "United States"), ("CA", "Canada")]);
        assert_eq!(check_answer(&field, "united states").unwrap(), "US");
        assert_eq!(check_answer(&field, "ca").unwrap(), "CA");
        assert_eq!(check_answer(&field, "CANADA").unwrap(), "CA");
    }

    #[test]
    fn ambiguous_label_is_never_resolved() {
        let field = picker(&[("A", "Same"), ("B", "same")]);
        assert_eq!(
            check_answer(&field, "SAME"),
            Err(InvalidReason::OptionAmbiguous)
        );
    }

    #[test]
    fn unknown_option_text_is_invalid() {
        let field = picker(&[("USA", "USA"), ("Canada", "Canada")]);
        assert_eq!(
            check_answer(&field, "Mars"),
            Err(InvalidReason::OptionUnrecognized)
        );
    }

    #[test]
    fn whitespace_only_reprompts_without_consuming_the_field() {
        let catalog = scenario_catalog();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);

        let decision = advance(&mut flow, &catalog, "   ");
        assert!(matches!(
            decision,
            Decision::Invalid {
                reason: InvalidReason::EmptyAnswer,
                ..
            }
        ));
        assert_eq!(flow.cursor, 0);
        assert!(flow.answers.is_empty());
    }

    #[test]
    fn optional_text_field_accepts_an_empty_answer() {
        let catalog = FieldCatalog::new(vec![
            FieldDefinition::text("nickname", "Nickname").optional(),
            FieldDefinition::text("name", "Name"),
        ])
        .unwrap();
        let mut flow = ConversationFlow::begin("chat-1", &catalog);

        let decision = advance(&mut flow, &catalog, "  ");
        assert!(matches!(decision, Decision::NextPrompt { field } if field.id == "name"));
        assert_eq!(flow.answers.get("nickname").map(String::as_str), Some(""));
    }

    #[test]
    fn out_of_range_reason_names_the_valid_range() {
        let reason = InvalidReason::OptionOutOfRange { max: 8 };
        assert!(reason.to_string().contains("between 1 and 8"));
    }
}
