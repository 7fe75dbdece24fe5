use serde::{Deserialize, Serialize};

/// Which multiselect a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    County,
    Species,
    Activity,
}

impl Field {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "county" | "counties" => Some(Field::County),
            "species" => Some(Field::Species),
            "activity" | "activities" | "construction" => Some(Field::Activity),
            _ => None,
        }
    }
}

/// The user's choices, as one immutable value.
///
/// Every `with_*` method returns a new value, so the filters never depend on the
/// order in which widgets happened to be evaluated. Picks keep the user's order and
/// repeats are ignored. Impact toggles default to checked; only the questions the
/// user has un-ticked are recorded, keyed by their text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selections {
    pub counties: Vec<String>,
    pub species: Vec<String>,
    pub activities: Vec<String>,
    pub unchecked_impacts: Vec<String>,
}

fn push_unique(list: &[String], value: &str) -> Vec<String> {
    let mut next = list.to_vec();
    if !next.iter().any(|v| v == value) {
        next.push(value.to_string());
    }
    next
}

fn without(list: &[String], value: &str) -> Vec<String> {
    list.iter().filter(|v| *v != value).cloned().collect()
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_county(&self, county: &str) -> Self {
        Selections {
            counties: push_unique(&self.counties, county),
            ..self.clone()
        }
    }

    pub fn with_species(&self, species: &str) -> Self {
        Selections {
            species: push_unique(&self.species, species),
            ..self.clone()
        }
    }

    pub fn with_activity(&self, activity: &str) -> Self {
        Selections {
            activities: push_unique(&self.activities, activity),
            ..self.clone()
        }
    }

    pub fn with_added(&self, field: Field, value: &str) -> Self {
        match field {
            Field::County => self.with_county(value),
            Field::Species => self.with_species(value),
            Field::Activity => self.with_activity(value),
        }
    }

    pub fn without(&self, field: Field, value: &str) -> Self {
        let mut next = self.clone();
        match field {
            Field::County => next.counties = without(&self.counties, value),
            Field::Species => next.species = without(&self.species, value),
            Field::Activity => next.activities = without(&self.activities, value),
        }
        next
    }

    /// Keeps only the picks of `field` that are still offered, in pick order.
    pub fn retaining(&self, field: Field, options: &[String]) -> Self {
        let keep = |list: &[String]| {
            list.iter()
                .filter(|v| options.contains(v))
                .cloned()
                .collect::<Vec<_>>()
        };
        let mut next = self.clone();
        match field {
            Field::County => next.counties = keep(&self.counties),
            Field::Species => next.species = keep(&self.species),
            Field::Activity => next.activities = keep(&self.activities),
        }
        next
    }

    pub fn with_impact_checked(&self, question: &str, checked: bool) -> Self {
        let unchecked_impacts = if checked {
            without(&self.unchecked_impacts, question)
        } else {
            push_unique(&self.unchecked_impacts, question)
        };
        Selections {
            unchecked_impacts,
            ..self.clone()
        }
    }

    pub fn is_impact_checked(&self, question: &str) -> bool {
        !self.unchecked_impacts.iter().any(|q| q == question)
    }

    /// Collapses repeated picks, e.g. after deserializing a hand-written request.
    pub fn normalized(&self) -> Self {
        let dedup = |list: &[String]| {
            list.iter()
                .fold(Vec::new(), |acc: Vec<String>, v| push_unique(&acc, v))
        };
        Selections {
            counties: dedup(&self.counties),
            species: dedup(&self.species),
            activities: dedup(&self.activities),
            unchecked_impacts: dedup(&self.unchecked_impacts),
        }
    }
}

/// One row of the "Potential Impacts" checklist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactToggle {
    pub question: String,
    pub checked: bool,
}

/// Impact options paired with their toggles in a single pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactChecklist {
    pub items: Vec<ImpactToggle>,
}

impl ImpactChecklist {
    pub fn build(options: &[String], selections: &Selections) -> Self {
        let items = options
            .iter()
            .map(|question| ImpactToggle {
                question: question.clone(),
                checked: selections.is_impact_checked(question),
            })
            .collect();
        ImpactChecklist { items }
    }

    /// The checked questions, in option order.
    pub fn selected(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.checked)
            .map(|item| item.question.clone())
            .collect()
    }

    pub fn mask(&self) -> Vec<bool> {
        self.items.iter().map(|item| item.checked).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn picks_keep_order_and_ignore_repeats() {
        let sel = Selections::new()
            .with_county("Weld")
            .with_county("Adams")
            .with_county("Weld");
        assert_eq!(sel.counties, vec!["Weld".to_string(), "Adams".to_string()]);
    }

    #[test]
    fn with_methods_leave_the_original_untouched() {
        let base = Selections::new().with_species("Bat");
        let next = base.with_activity("Excavation");
        assert!(base.activities.is_empty());
        assert_eq!(next.species, base.species);
    }

    #[test]
    fn removing_a_pick() {
        let sel = Selections::new()
            .with_activity("Paving")
            .with_activity("Excavation")
            .without(Field::Activity, "Paving");
        assert_eq!(sel.activities, vec!["Excavation".to_string()]);
    }

    #[test]
    fn retaining_keeps_offered_picks_in_pick_order() {
        let sel = Selections::new()
            .with_species("Owl")
            .with_species("Bat")
            .with_species("Elk")
            .with_county("Weld");
        let options = vec!["Bat".to_string(), "Owl".to_string()];

        let kept = sel.retaining(Field::Species, &options);
        assert_eq!(kept.species, vec!["Owl".to_string(), "Bat".to_string()]);
        assert_eq!(kept.counties, sel.counties);
    }

    #[test]
    fn impacts_default_to_checked() {
        let sel = Selections::new();
        assert!(sel.is_impact_checked("Roosting"));

        let sel = sel.with_impact_checked("Roosting", false);
        assert!(!sel.is_impact_checked("Roosting"));

        let sel = sel.with_impact_checked("Roosting", true);
        assert!(sel.is_impact_checked("Roosting"));
        assert!(sel.unchecked_impacts.is_empty());
    }

    #[test]
    fn checklist_pairs_each_option_with_its_toggle() {
        let options = vec!["Nesting".to_string(), "Roosting".to_string()];
        let sel = Selections::new().with_impact_checked("Nesting", false);
        let checklist = ImpactChecklist::build(&options, &sel);

        assert_eq!(checklist.mask(), vec![false, true]);
        assert_eq!(checklist.selected(), vec!["Roosting".to_string()]);
    }

    #[test]
    fn field_names_parse_loosely() {
        assert_eq!(Field::parse("County"), Some(Field::County));
        assert_eq!(Field::parse("activities"), Some(Field::Activity));
        assert_eq!(Field::parse("impact"), None);
    }

    #[test]
    fn normalized_drops_repeats() {
        let sel = Selections {
            counties: vec!["A".into(), "A".into(), "B".into()],
            ..Selections::default()
        };
        assert_eq!(sel.normalized().counties, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let sel: Selections = serde_json::from_str(r#"{"counties":["Denver"]}"#).unwrap();
        assert_eq!(sel.counties, vec!["Denver".to_string()]);
        assert!(sel.species.is_empty());
    }
}
