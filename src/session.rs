use crate::dataset::Dataset;
use crate::downloader::{Delivered, DeliveryTarget, deliver};
use crate::error::Result;
use crate::filter::{FinalSelections, FormView, prune_selections};
use crate::report::{ProjectMetadata, ReportDocument, assemble};
use crate::saving::{FormState, load_state, save_state};
use crate::selection::{Field, Selections};
use std::sync::Arc;
use tracing::warn;

/// One user's form: the session's dataset, the project details and the picks so far.
///
/// Each interaction swaps in a new [`Selections`] value and recomputes the view.
pub struct FormSession {
    dataset: Arc<Dataset>,
    pub metadata: ProjectMetadata,
    selections: Selections,
    view: FormView,
}

impl FormSession {
    pub fn new(dataset: Arc<Dataset>, metadata: ProjectMetadata) -> Result<Self> {
        let selections = Selections::new();
        let view = FormView::derive(&dataset, &selections)?;
        Ok(FormSession {
            dataset,
            metadata,
            selections,
            view,
        })
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn view(&self) -> &FormView {
        &self.view
    }

    /// Picks that fell out of their options are dropped, as a multiselect does.
    pub fn update(&mut self, selections: Selections) -> Result<()> {
        let selections = prune_selections(&self.dataset, &selections)?;
        self.view = FormView::derive(&self.dataset, &selections)?;
        self.selections = selections;
        Ok(())
    }

    pub fn report(&self) -> Result<ReportDocument> {
        let finals = FinalSelections::resolve(&self.dataset, &self.selections)?;
        Ok(assemble(&self.metadata, &finals))
    }

    pub fn state(&self) -> FormState {
        FormState {
            metadata: self.metadata.clone(),
            selections: self.selections.clone(),
        }
    }

    pub fn restore(&mut self, state: FormState) -> Result<()> {
        self.update(state.selections)?;
        self.metadata = state.metadata;
        Ok(())
    }

    /// Runs one interactive command and returns the status shown in the prompt.
    pub fn apply(&mut self, command: &str) -> String {
        let command = command.trim();
        let (verb, rest) = match command.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (command, ""),
        };

        let outcome = match verb {
            "county" | "species" | "activity" if !rest.is_empty() => {
                let field = Field::parse(verb).unwrap_or(Field::County);
                let offered = match field {
                    Field::County => &self.view.counties,
                    Field::Species => &self.view.species,
                    Field::Activity => &self.view.constructions,
                };
                if offered.iter().any(|o| o == rest) {
                    let next = self.selections.with_added(field, rest);
                    self.update(next).map(|_| String::from("ok"))
                } else {
                    Ok(format!("unknown {}", verb))
                }
            }
            "drop" => match rest.split_once(char::is_whitespace) {
                Some((kind, value)) => match Field::parse(kind) {
                    Some(field) => {
                        let next = self.selections.without(field, value.trim());
                        self.update(next).map(|_| String::from("ok"))
                    }
                    None => Ok(String::from("invalid field")),
                },
                None => Ok(String::from("invalid command")),
            },
            "check" | "uncheck" if !rest.is_empty() => {
                if self.view.impacts.items.iter().any(|i| i.question == rest) {
                    let next = self.selections.with_impact_checked(rest, verb == "check");
                    self.update(next).map(|_| String::from("ok"))
                } else {
                    Ok(String::from("unknown impact"))
                }
            }
            "set" => {
                let applied = rest
                    .split_once(char::is_whitespace)
                    .is_some_and(|(field, value)| self.metadata.set_field(field, value.trim()));
                Ok(String::from(if applied { "ok" } else { "invalid field" }))
            }
            "save" if !rest.is_empty() => self
                .report()
                .and_then(|doc| deliver(&doc, &DeliveryTarget::Directory(rest.into())))
                .map(|delivered| match delivered {
                    Delivered::Saved(path) => format!("saved {}", path.display()),
                    Delivered::Download(d) => format!("prepared {}", d.file_name),
                }),
            "save-session" if !rest.is_empty() => {
                save_state(&self.state(), rest).map(|_| String::from("ok"))
            }
            "load-session" if !rest.is_empty() => {
                load_state(rest).and_then(|state| self.restore(state).map(|_| String::from("ok")))
            }
            _ => Ok(String::from("invalid command")),
        };

        outcome.unwrap_or_else(|e| {
            warn!(command, error = %e, "command failed");
            e.to_string()
        })
    }

    /// The form as text: every option list, with current picks marked.
    pub fn render(&self) -> String {
        fn list(out: &mut String, title: &str, options: &[String], picked: &[String]) {
            out.push_str(&format!("{}:\n", title));
            if options.is_empty() {
                out.push_str("  (none)\n");
            }
            for option in options {
                let mark = if picked.contains(option) { "x" } else { " " };
                out.push_str(&format!("  [{}] {}\n", mark, option));
            }
        }

        let mut out = String::new();
        let sel = &self.selections;
        list(&mut out, "County", &self.view.counties, &sel.counties);
        list(&mut out, "Species", &self.view.species, &sel.species);

        out.push_str("Potential Impacts:\n");
        if self.view.impacts.items.is_empty() {
            out.push_str("  (none)\n");
        }
        for item in &self.view.impacts.items {
            let mark = if item.checked { "x" } else { " " };
            out.push_str(&format!("  [{}] {}\n", mark, item.question));
        }

        list(&mut out, "Construction Activity", &self.view.constructions, &sel.activities);
        list(&mut out, "Possible Construction Activity", &self.view.possible_activities, &[]);
        list(&mut out, "Mitigation Strategies", &self.view.mitigations, &[]);
        out
    }
}
