use crate::filter::FinalSelections;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REPORT_TITLE: &str = "SWIFT ANALYSIS";

/// Project details typed into the top of the form.
///
/// `date` is the only timestamp that reaches the report; it is always supplied by the
/// caller, never read from the clock here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_location: String,
    #[serde(default)]
    pub project_number: String,
    #[serde(default)]
    pub sub_account_number: String,
    #[serde(default)]
    pub project_description: String,
    pub date: NaiveDate,
}

impl ProjectMetadata {
    pub fn new(date: NaiveDate) -> Self {
        ProjectMetadata {
            contact: String::new(),
            project_name: String::new(),
            project_location: String::new(),
            project_number: String::new(),
            sub_account_number: String::new(),
            project_description: String::new(),
            date,
        }
    }

    /// The "Project Details" paragraph, one `Label: value` line per field.
    pub fn detail_lines(&self) -> Vec<String> {
        [
            ("CDOT Contact", &self.contact),
            ("Project Name", &self.project_name),
            ("Project Location", &self.project_location),
            ("Project Number", &self.project_number),
            ("Sub Account Number", &self.sub_account_number),
            ("Project Description", &self.project_description),
        ]
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect()
    }

    /// Sets a field by its short name, as typed in the interactive form.
    pub fn set_field(&mut self, field: &str, value: &str) -> bool {
        let slot = match field {
            "contact" => &mut self.contact,
            "name" => &mut self.project_name,
            "location" => &mut self.project_location,
            "number" => &mut self.project_number,
            "sub-account" | "sub_account" => &mut self.sub_account_number,
            "description" => &mut self.project_description,
            "date" => {
                return match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    Ok(date) => {
                        self.date = date;
                        true
                    }
                    Err(_) => false,
                };
            }
            _ => return false,
        };
        *slot = value.to_string();
        true
    }
}

/// The five list sections, in the order they appear in every report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    County,
    Species,
    Impacts,
    ConstructionActivities,
    MitigationStrategies,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::County,
        SectionKind::Species,
        SectionKind::Impacts,
        SectionKind::ConstructionActivities,
        SectionKind::MitigationStrategies,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::County => "County",
            SectionKind::Species => "Species",
            SectionKind::Impacts => "Potential Impacts",
            SectionKind::ConstructionActivities => "Construction Activities",
            SectionKind::MitigationStrategies => "Mitigation Strategies",
        }
    }

    pub fn intro(self) -> &'static str {
        match self {
            SectionKind::County => "Selected County list:",
            SectionKind::Species => "Selected Species list:",
            SectionKind::Impacts => "Selected impacts list:",
            SectionKind::ConstructionActivities => "Selected activities list:",
            SectionKind::MitigationStrategies => "Possible strategies list:",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub items: Vec<String>,
}

/// Flat element stream handed to the document encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    /// Lines of one paragraph, separated by breaks.
    Paragraph(Vec<String>),
    Bullet(String),
}

/// The report tree: title, project details, then the five list sections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub metadata: ProjectMetadata,
    pub sections: Vec<Section>,
}

/// Builds the report. Identical inputs give identical documents; empty lists still
/// get their heading so the layout never shifts.
pub fn assemble(metadata: &ProjectMetadata, selections: &FinalSelections) -> ReportDocument {
    let sections = SectionKind::ALL
        .iter()
        .map(|&kind| {
            let items = match kind {
                SectionKind::County => &selections.counties,
                SectionKind::Species => &selections.species,
                SectionKind::Impacts => &selections.impacts,
                SectionKind::ConstructionActivities => &selections.activities,
                SectionKind::MitigationStrategies => &selections.mitigations,
            };
            Section {
                kind,
                items: items.clone(),
            }
        })
        .collect();

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        metadata: metadata.clone(),
        sections,
    }
}

impl ReportDocument {
    pub fn date(&self) -> NaiveDate {
        self.metadata.date
    }

    /// `SWIFT_{date}.docx`
    pub fn file_name(&self) -> String {
        format!("SWIFT_{}.docx", self.metadata.date.format("%Y-%m-%d"))
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![
            Block::Heading {
                level: 0,
                text: self.title.clone(),
            },
            Block::Paragraph(vec![format!(
                "SWIFT analysis conducted on {}",
                self.metadata.date.format("%Y-%m-%d")
            )]),
            Block::Heading {
                level: 1,
                text: "Project Details".to_string(),
            },
            Block::Paragraph(self.metadata.detail_lines()),
        ];

        for section in &self.sections {
            blocks.push(Block::Heading {
                level: 2,
                text: section.kind.heading().to_string(),
            });
            blocks.push(Block::Paragraph(vec![section.kind.intro().to_string()]));
            blocks.extend(section.items.iter().cloned().map(Block::Bullet));
        }

        blocks
    }
}

impl fmt::Display for ReportDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self.blocks() {
            match block {
                Block::Heading { level: 0, text } => {
                    writeln!(f, "{text}\n{}", "=".repeat(text.len()))?
                }
                Block::Heading { level: 1, text } => {
                    writeln!(f, "\n{text}\n{}", "-".repeat(text.len()))?
                }
                Block::Heading { text, .. } => writeln!(f, "\n## {text}")?,
                Block::Paragraph(lines) => {
                    for line in lines {
                        writeln!(f, "{line}")?;
                    }
                }
                Block::Bullet(item) => writeln!(f, "  * {item}")?,
            }
        }
        Ok(())
    }
}
