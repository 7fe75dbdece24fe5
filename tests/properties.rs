use proptest::prelude::*;
use std::collections::BTreeSet;
use swift::dataset::Dataset;
use swift::{
    county_options, final_impact_selection, impact_options, mitigation_options,
    possible_activity_options, species_options,
};

const HEADERS: [&str; 9] = [
    "County",
    "Species",
    "Question",
    "Construction",
    "Possible_Construction_Activity",
    "Mitigation_Species",
    "Mitigation_Construction",
    "Mitigation_Id",
    "Mitigation_Description",
];

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        6 => "[A-E]",
    ]
}

fn dataset() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(prop::collection::vec(cell(), 9), 0..25).prop_map(|rows| {
        Dataset::new(HEADERS.iter().map(|h| h.to_string()).collect(), rows)
    })
}

fn picks() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-F]", 0..4)
}

fn is_sorted_unique(values: &[String]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

proptest! {
    /// Property: species options only contain species seen in the selected counties
    #[test]
    fn species_are_drawn_from_selected_counties(ds in dataset(), counties in picks()) {
        let species = species_options(&ds, &counties).unwrap();
        let allowed: BTreeSet<&str> = ds
            .records
            .iter()
            .filter(|r| counties.iter().any(|c| c == r.get(0)))
            .map(|r| r.get(1))
            .collect();
        for s in &species {
            prop_assert!(allowed.contains(s.as_str()));
        }
        if counties.is_empty() {
            prop_assert!(species.is_empty());
        }
        prop_assert!(is_sorted_unique(&species));
    }

    /// Property: adding a county never removes a species option
    #[test]
    fn more_counties_never_shrink_species(ds in dataset(), counties in picks(), extra in "[A-F]") {
        let before = species_options(&ds, &counties).unwrap();
        let mut more = counties.clone();
        more.push(extra);
        let after = species_options(&ds, &more).unwrap();
        for s in &before {
            prop_assert!(after.contains(s));
        }
    }

    /// Property: every derived list is reproducible
    #[test]
    fn derived_lists_are_deterministic(ds in dataset(), a in picks(), b in picks()) {
        prop_assert_eq!(county_options(&ds).unwrap(), county_options(&ds).unwrap());
        prop_assert_eq!(impact_options(&ds, &a, &b).unwrap(), impact_options(&ds, &a, &b).unwrap());
        prop_assert_eq!(
            possible_activity_options(&ds, &a).unwrap(),
            possible_activity_options(&ds, &a).unwrap()
        );
        prop_assert!(is_sorted_unique(&impact_options(&ds, &a, &b).unwrap()));
    }

    /// Property: final impacts are an ordered sub-sequence of the options
    #[test]
    fn final_impacts_follow_option_order(
        options in prop::collection::btree_set("[a-z]{1,6}", 0..8),
        mask in prop::collection::vec(any::<bool>(), 0..8),
    ) {
        let options: Vec<String> = options.into_iter().collect();
        let chosen = final_impact_selection(&options, &mask);
        prop_assert!(chosen.len() <= options.len());

        let mut cursor = options.iter();
        for q in &chosen {
            prop_assert!(cursor.any(|o| o == q));
        }
        if mask.len() != options.len() {
            prop_assert_eq!(chosen, options);
        }
    }

    /// Property: no species or no activity means no mitigation
    #[test]
    fn mitigation_needs_both_inputs(ds in dataset(), picked in picks()) {
        prop_assert!(mitigation_options(&ds, &picked, &[]).unwrap().is_empty());
        prop_assert!(mitigation_options(&ds, &[], &picked).unwrap().is_empty());
    }
}
