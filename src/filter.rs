//! Cascading filters: every dropdown's options derived from the choices above it.
//!
//! All functions are pure. Each one validates the columns it needs before looking at
//! the selections, so a malformed sheet fails the same way whatever the user picked.
//! An empty upstream selection yields an empty list, never "everything".

use crate::dataset::{
    CONSTRUCTION, CONSTRUCTION_ACTIVITY, COUNTY, COUNTY_SPECIES_QUESTION, Dataset, MITIGATION,
    MITIGATION_CONSTRUCTION, MITIGATION_DESCRIPTION, MITIGATION_SPECIES,
    POSSIBLE_CONSTRUCTION_ACTIVITY, QUESTION, SPECIES,
};
use crate::error::Result;
use crate::selection::{Field, ImpactChecklist, Selections};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Every county with at least one complete county/species/question row.
pub fn county_options(dataset: &Dataset) -> Result<Vec<String>> {
    dataset
        .project(&COUNTY_SPECIES_QUESTION)?
        .sorted_unique(COUNTY)
}

/// Species recorded in any of the selected counties.
pub fn species_options(dataset: &Dataset, counties: &[String]) -> Result<Vec<String>> {
    let projection = dataset.project(&COUNTY_SPECIES_QUESTION)?;
    if counties.is_empty() {
        return Ok(Vec::new());
    }
    projection
        .filter_in(COUNTY, counties)?
        .sorted_unique(SPECIES)
}

/// Questions for rows matching both a selected county and a selected species.
///
/// Sorted ascending so the checklist is reproducible whatever the sheet order.
pub fn impact_options(
    dataset: &Dataset,
    counties: &[String],
    species: &[String],
) -> Result<Vec<String>> {
    let projection = dataset.project(&COUNTY_SPECIES_QUESTION)?;
    if counties.is_empty() || species.is_empty() {
        return Ok(Vec::new());
    }
    projection
        .filter_in(COUNTY, counties)?
        .filter_in(SPECIES, species)?
        .sorted_unique(QUESTION)
}

/// Keeps the options whose toggle is still set, in option order.
///
/// A mask left over from an earlier render (different length) is thrown away and
/// replaced by a fresh all-checked mask rather than realigned.
pub fn final_impact_selection(options: &[String], mask: &[bool]) -> Vec<String> {
    let fresh;
    let mask: &[bool] = if mask.len() == options.len() {
        mask
    } else {
        warn!(
            options = options.len(),
            mask = mask.len(),
            "stale impact mask, resetting to all checked"
        );
        fresh = vec![true; options.len()];
        &fresh[..]
    };

    options
        .iter()
        .zip(mask)
        .filter(|(_, checked)| **checked)
        .map(|(question, _)| question.clone())
        .collect()
}

pub fn construction_options(dataset: &Dataset) -> Result<Vec<String>> {
    dataset
        .project(&CONSTRUCTION_ACTIVITY)?
        .sorted_unique(CONSTRUCTION)
}

/// Descriptions of what the selected construction activities may involve.
pub fn possible_activity_options(dataset: &Dataset, activities: &[String]) -> Result<Vec<String>> {
    let projection = dataset.project(&CONSTRUCTION_ACTIVITY)?;
    if activities.is_empty() {
        return Ok(Vec::new());
    }
    projection
        .filter_in(CONSTRUCTION, activities)?
        .sorted_unique(POSSIBLE_CONSTRUCTION_ACTIVITY)
}

/// Mitigation strategies whose species and construction were both selected.
pub fn mitigation_options(
    dataset: &Dataset,
    species: &[String],
    activities: &[String],
) -> Result<Vec<String>> {
    let projection = dataset.project(&MITIGATION)?;
    if species.is_empty() || activities.is_empty() {
        return Ok(Vec::new());
    }
    projection
        .filter_in(MITIGATION_SPECIES, species)?
        .filter_in(MITIGATION_CONSTRUCTION, activities)?
        .sorted_unique(MITIGATION_DESCRIPTION)
}

/// Drops picks the form no longer offers: counties and activities missing from the
/// sheet, and species that do not occur in any of the remaining counties.
///
/// A multiselect whose options change loses the picks that fell out of them, so a
/// stale species can never reach the impacts, the mitigations or the report.
pub fn prune_selections(dataset: &Dataset, selections: &Selections) -> Result<Selections> {
    let pruned = selections.retaining(Field::County, &county_options(dataset)?);
    let species = species_options(dataset, &pruned.counties)?;
    let pruned = pruned
        .retaining(Field::Species, &species)
        .retaining(Field::Activity, &construction_options(dataset)?);

    if pruned != *selections {
        debug!(
            counties = selections.counties.len() - pruned.counties.len(),
            species = selections.species.len() - pruned.species.len(),
            activities = selections.activities.len() - pruned.activities.len(),
            "dropped picks that are no longer offered"
        );
    }
    Ok(pruned)
}

/// Every option list the form shows, recomputed from scratch for one set of selections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormView {
    pub counties: Vec<String>,
    pub species: Vec<String>,
    pub impacts: ImpactChecklist,
    pub constructions: Vec<String>,
    pub possible_activities: Vec<String>,
    pub mitigations: Vec<String>,
}

impl FormView {
    pub fn derive(dataset: &Dataset, selections: &Selections) -> Result<Self> {
        let selections = &prune_selections(dataset, selections)?;
        let impact_list = impact_options(dataset, &selections.counties, &selections.species)?;

        let view = FormView {
            counties: county_options(dataset)?,
            species: species_options(dataset, &selections.counties)?,
            impacts: ImpactChecklist::build(&impact_list, selections),
            constructions: construction_options(dataset)?,
            possible_activities: possible_activity_options(dataset, &selections.activities)?,
            mitigations: mitigation_options(dataset, &selections.species, &selections.activities)?,
        };

        debug!(
            counties = view.counties.len(),
            species = view.species.len(),
            impacts = view.impacts.items.len(),
            mitigations = view.mitigations.len(),
            "derived form view"
        );

        Ok(view)
    }
}

/// What ends up in the report: the user's picks that are still offered, plus the
/// derived impact and mitigation lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalSelections {
    pub counties: Vec<String>,
    pub species: Vec<String>,
    pub impacts: Vec<String>,
    pub activities: Vec<String>,
    pub mitigations: Vec<String>,
}

impl FinalSelections {
    pub fn resolve(dataset: &Dataset, selections: &Selections) -> Result<Self> {
        let selections = &prune_selections(dataset, selections)?;
        let options = impact_options(dataset, &selections.counties, &selections.species)?;
        let impacts = ImpactChecklist::build(&options, selections).selected();

        Ok(FinalSelections {
            counties: selections.counties.clone(),
            species: selections.species.clone(),
            impacts,
            activities: selections.activities.clone(),
            mitigations: mitigation_options(dataset, &selections.species, &selections.activities)?,
        })
    }
}
