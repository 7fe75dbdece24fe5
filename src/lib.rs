/*!
# SWIFT Analysis

Decision support for construction projects near sensitive wildlife: pick the
counties, species and construction activities for a project, review the potential
impacts, and get the mitigation strategies that apply, written up as a Word report.

## Overview

All options come from one shared spreadsheet. The data flows one way and is
recomputed in full on every interaction:

```text
sheet -> projections -> option lists (each narrowed by the picks above it)
      -> final impacts + mitigations -> report tree -> .docx file or download
```

## Architecture

### Data Source Layer
- **Providers**: CSV export, `.xlsx` workbook, or (feature `remote`) a shared
  online sheet addressed by key
- **Session cache**: the sheet is fetched once and reused until restart

### Filter Layer
- **Projections**: deduplicated column subsets with blank rows dropped
- **Cascading filters**: county -> species -> impact checklist; construction ->
  possible activities; species + construction -> mitigation strategies
- **Selections**: an immutable value replaced on every interaction

### Output Layer
- **Report assembler**: title, project details, then County, Species, Potential
  Impacts, Construction Activities and Mitigation Strategies sections
- **Document encoder**: minimal WordprocessingML package
- **Delivery**: save `SWIFT_{date}.docx` to a folder, or hand back bytes for a
  download link

## Modules

- **dataset**: records, column names and projections
- **selection**: user picks and the impact checklist
- **filter**: the cascading option lists, form view and final selections
- **report**: project metadata and the report tree
- **docx**: `.docx` encoding
- **loader**: dataset providers and the session cache
- **downloader**: report delivery
- **saving**: form snapshots (gzip + bincode)
- **session**: the interactive form
- **config**: environment configuration
- **app**: HTTP API (feature `web`)
*/

pub mod config;
pub mod dataset;
pub mod docx;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod report;
pub mod saving;
pub mod selection;
pub mod session;

#[cfg(feature = "web")]
pub mod app;

pub use error::{Result, SwiftError};
pub use filter::{
    FinalSelections, FormView, construction_options, county_options, final_impact_selection,
    impact_options, mitigation_options, possible_activity_options, prune_selections,
    species_options,
};
pub use report::{ProjectMetadata, ReportDocument, assemble};
pub use selection::Selections;
