use crate::config::SourceConfig;
use crate::dataset::Dataset;
use crate::error::{Result, SwiftError};
use once_cell::sync::OnceCell;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Supplies the sheet the filters run against.
pub trait DatasetProvider {
    fn fetch(&self) -> Result<Dataset>;

    /// Human-readable name of the source, for logs.
    fn describe(&self) -> String;
}

impl<P: DatasetProvider + ?Sized> DatasetProvider for Box<P> {
    fn fetch(&self) -> Result<Dataset> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn unavailable(source: &str, err: impl std::fmt::Display) -> SwiftError {
    SwiftError::SourceUnavailable(format!("{source}: {err}"))
}

/// Parses CSV text with a header row. Every field is kept as a string.
pub fn parse_csv<R: Read>(reader: R, source: &str) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| unavailable(source, e))?;
        grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Dataset::from_grid(grid).map_err(|e| match e {
        SwiftError::SourceUnavailable(msg) => unavailable(source, msg),
        other => other,
    })
}

/// A CSV export of the sheet on disk.
pub struct CsvProvider {
    pub path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvProvider { path: path.into() }
    }
}

impl DatasetProvider for CsvProvider {
    fn fetch(&self) -> Result<Dataset> {
        let source = self.describe();
        let file = std::fs::File::open(&self.path).map_err(|e| unavailable(&source, e))?;
        parse_csv(std::io::BufReader::new(file), &source)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

/// One worksheet of an `.xlsx` workbook; the first one unless a name is given.
pub struct WorkbookProvider {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

impl WorkbookProvider {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        WorkbookProvider {
            path: path.into(),
            sheet,
        }
    }
}

impl DatasetProvider for WorkbookProvider {
    fn fetch(&self) -> Result<Dataset> {
        use calamine::{Reader, Xlsx, open_workbook};

        let source = self.describe();
        let mut workbook: Xlsx<_> =
            open_workbook(&self.path).map_err(|e: calamine::XlsxError| unavailable(&source, e))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| unavailable(&source, "no sheets found in workbook"))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| unavailable(&source, e))?;

        let grid = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        Dataset::from_grid(grid).map_err(|e| match e {
            SwiftError::SourceUnavailable(msg) => unavailable(&source, msg),
            other => other,
        })
    }

    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("workbook {} [{}]", self.path.display(), sheet),
            None => format!("workbook {}", self.path.display()),
        }
    }
}

/// Renders a workbook cell the way the CSV export would show it.
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers print without a trailing ".0" while they still fit an i64.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

/// The CSV export of a shared online sheet, addressed by its key.
#[cfg(feature = "remote")]
pub struct PublishedSheetProvider {
    pub key: String,
}

#[cfg(feature = "remote")]
impl PublishedSheetProvider {
    pub fn new(key: impl Into<String>) -> Self {
        PublishedSheetProvider { key: key.into() }
    }

    pub fn export_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            self.key
        )
    }
}

#[cfg(feature = "remote")]
impl DatasetProvider for PublishedSheetProvider {
    fn fetch(&self) -> Result<Dataset> {
        let source = self.describe();
        let response = reqwest::blocking::get(self.export_url())
            .and_then(|r| r.error_for_status())
            .map_err(|e| unavailable(&source, e))?;
        let body = response.bytes().map_err(|e| unavailable(&source, e))?;
        parse_csv(body.as_ref(), &source)
    }

    fn describe(&self) -> String {
        format!("shared sheet {}", self.key)
    }
}

/// Fetches once per session and hands out the same dataset afterwards.
///
/// Failures are not remembered, so the next call tries the source again.
pub struct CachedProvider<P> {
    inner: P,
    cache: OnceCell<Arc<Dataset>>,
}

impl<P: DatasetProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        CachedProvider {
            inner,
            cache: OnceCell::new(),
        }
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cache.get() {
            debug!(source = %self.inner.describe(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = self.cache.get_or_try_init(|| {
            info!(source = %self.inner.describe(), "fetching dataset");
            let dataset = self.inner.fetch()?;
            info!(rows = dataset.len(), columns = dataset.headers.len(), "dataset loaded");
            Ok::<_, SwiftError>(Arc::new(dataset))
        })?;

        Ok(Arc::clone(dataset))
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<P: DatasetProvider> DatasetProvider for CachedProvider<P> {
    fn fetch(&self) -> Result<Dataset> {
        self.dataset().map(|d| (*d).clone())
    }

    fn describe(&self) -> String {
        format!("cached {}", self.inner.describe())
    }
}

/// Picks the provider for the configured source.
pub fn provider_from_config(
    config: &SourceConfig,
) -> Result<Box<dyn DatasetProvider + Send + Sync>> {
    match config {
        SourceConfig::Csv { path } => Ok(Box::new(CsvProvider::new(path.clone()))),
        SourceConfig::Workbook { path, sheet } => {
            Ok(Box::new(WorkbookProvider::new(path.clone(), sheet.clone())))
        }
        #[cfg(feature = "remote")]
        SourceConfig::Sheet { key } => Ok(Box::new(PublishedSheetProvider::new(key.clone()))),
        #[cfg(not(feature = "remote"))]
        SourceConfig::Sheet { .. } => Err(SwiftError::Config(
            "shared sheet sources require the 'remote' feature".to_string(),
        )),
    }
}

/// Detects the format from the file extension, like the spreadsheet importer does.
pub fn provider_for_path(path: impl AsRef<Path>) -> Result<Box<dyn DatasetProvider + Send + Sync>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => Ok(Box::new(CsvProvider::new(path))),
        Some("xlsx") | Some("xlsm") => Ok(Box::new(WorkbookProvider::new(path, None))),
        Some(ext) => Err(SwiftError::Config(format!("Unsupported file extension: {}", ext))),
        None => Err(SwiftError::Config("File has no extension".to_string())),
    }
}
