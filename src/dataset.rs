use crate::error::{Result, SwiftError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const COUNTY: &str = "County";
pub const SPECIES: &str = "Species";
pub const QUESTION: &str = "Question";
pub const CONSTRUCTION: &str = "Construction";
pub const POSSIBLE_CONSTRUCTION_ACTIVITY: &str = "Possible_Construction_Activity";
pub const MITIGATION_SPECIES: &str = "Mitigation_Species";
pub const MITIGATION_CONSTRUCTION: &str = "Mitigation_Construction";
pub const MITIGATION_ID: &str = "Mitigation_Id";
pub const MITIGATION_DESCRIPTION: &str = "Mitigation_Description";

/// `{County, Species, Question}`
pub const COUNTY_SPECIES_QUESTION: [&str; 3] = [COUNTY, SPECIES, QUESTION];
/// `{Construction, Possible_Construction_Activity}`
pub const CONSTRUCTION_ACTIVITY: [&str; 2] = [CONSTRUCTION, POSSIBLE_CONSTRUCTION_ACTIVITY];
/// `{Mitigation_Species, Mitigation_Construction, Mitigation_Id, Mitigation_Description}`
pub const MITIGATION: [&str; 4] = [
    MITIGATION_SPECIES,
    MITIGATION_CONSTRUCTION,
    MITIGATION_ID,
    MITIGATION_DESCRIPTION,
];

/// One row of the sheet. Every field is an untyped string.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Record { fields }
    }

    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }
}

/// The whole sheet: a header row and the records below it, in sheet order.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, padding short rows and truncating long ones to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let width = headers.len();

        let records = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                Record::new(row)
            })
            .collect();

        Dataset { headers, records }
    }

    /// Builds a dataset from the raw grid of a sheet, taking the first row as headers.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Result<Self> {
        if grid.is_empty() {
            return Err(SwiftError::SourceUnavailable(
                "sheet has no header row".to_string(),
            ));
        }
        let headers = grid.remove(0);
        Ok(Dataset::new(headers, grid))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SwiftError::missing_column(name))
    }

    /// Column-subset view: drops rows with any empty field, then deduplicates.
    ///
    /// Row order is the sheet's order of first appearance.
    pub fn project(&self, columns: &[&str]) -> Result<Projection> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for record in &self.records {
            let row: Vec<String> = indices
                .iter()
                .map(|&i| record.get(i).trim().to_string())
                .collect();

            if row.iter().any(|field| field.is_empty()) {
                continue;
            }
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }

        Ok(Projection {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }
}

/// A deduplicated, non-empty column-subset view of a [`Dataset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Projection {
    fn position(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SwiftError::missing_column(column))
    }

    /// Keeps the rows whose `column` value is one of `allowed`.
    pub fn filter_in(&self, column: &str, allowed: &[String]) -> Result<Projection> {
        let idx = self.position(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| allowed.iter().any(|a| a == &row[idx]))
            .cloned()
            .collect();

        Ok(Projection {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Distinct values of `column`, in order of first appearance.
    pub fn unique(&self, column: &str) -> Result<Vec<String>> {
        let idx = self.position(column)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .filter(|row| seen.insert(row[idx].as_str()))
            .map(|row| row[idx].clone())
            .collect())
    }

    /// Distinct values of `column`, sorted ascending.
    pub fn sorted_unique(&self, column: &str) -> Result<Vec<String>> {
        let mut values = self.unique(column)?;
        values.sort();
        Ok(values)
    }
}
