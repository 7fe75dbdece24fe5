use crate::error::{Result, SwiftError};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_CSV_PATH: &str = "swift.csv";
const DEFAULT_WORKBOOK_PATH: &str = "swift.xlsx";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Where the sheet comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceConfig {
    Csv { path: PathBuf },
    Workbook { path: PathBuf, sheet: Option<String> },
    /// A shared online sheet, addressed by its key.
    Sheet { key: String },
}

/// How finished reports leave the program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Save `SWIFT_{date}.docx` into a directory.
    File { directory: PathBuf },
    /// Hand the bytes back for a browser download.
    Download,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub source: SourceConfig,
    pub delivery: DeliveryMode,
    /// Listen address as written; parsed by [`Config::bind_addr`] when serving.
    pub bind: String,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], with `overrides` (command-line flags) taking precedence.
    pub fn from_env_with(overrides: &[(&str, String)]) -> Result<Self> {
        Self::from_lookup(layered(overrides, |key| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let path = |default: &str| -> PathBuf {
            get("SWIFT_SOURCE_PATH")
                .unwrap_or_else(|| default.to_string())
                .into()
        };
        let source = match get("SWIFT_SOURCE").as_deref().unwrap_or("csv") {
            "csv" => SourceConfig::Csv {
                path: path(DEFAULT_CSV_PATH),
            },
            "xlsx" | "workbook" => SourceConfig::Workbook {
                path: path(DEFAULT_WORKBOOK_PATH),
                sheet: get("SWIFT_WORKSHEET"),
            },
            "sheet" => {
                let key = get("SWIFT_SHEET_KEY")
                    .or_else(|| get("open_by_key"))
                    .ok_or_else(|| {
                        SwiftError::Config(
                            "SWIFT_SHEET_KEY is required for sheet sources".to_string(),
                        )
                    })?;
                SourceConfig::Sheet { key }
            }
            other => {
                return Err(SwiftError::Config(format!(
                    "unknown SWIFT_SOURCE '{}' (expected csv, xlsx or sheet)",
                    other
                )));
            }
        };

        let delivery = match get("SWIFT_DELIVERY").as_deref().unwrap_or("file") {
            "file" => DeliveryMode::File {
                directory: get("SWIFT_OUTPUT_DIR").unwrap_or_else(|| ".".to_string()).into(),
            },
            "download" => DeliveryMode::Download,
            other => {
                return Err(SwiftError::Config(format!(
                    "unknown SWIFT_DELIVERY '{}' (expected file or download)",
                    other
                )));
            }
        };

        Ok(Config {
            source,
            delivery,
            bind: get("SWIFT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|_| SwiftError::Config(format!("invalid SWIFT_BIND '{}'", self.bind)))
    }
}

/// A lookup that answers from `overrides` first and falls back to `lookup`.
fn layered<'a, F>(
    overrides: &'a [(&'a str, String)],
    lookup: F,
) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key: &str| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
            .or_else(|| lookup(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Csv {
                path: PathBuf::from("swift.csv")
            }
        );
        assert_eq!(
            cfg.delivery,
            DeliveryMode::File {
                directory: PathBuf::from(".")
            }
        );
        assert_eq!(cfg.bind_addr().unwrap().port(), 3000);
    }

    fn config_with(env: &[(&str, &str)], overrides: &[(&str, String)]) -> Result<Config> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(layered(overrides, |key| env.get(key).cloned()))
    }

    #[test]
    fn flags_override_the_environment() {
        let env = [("SWIFT_SOURCE", "sheet")];

        let cfg = config_with(
            &env,
            &[
                ("SWIFT_SOURCE", "csv".to_string()),
                ("SWIFT_SOURCE_PATH", "x.csv".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Csv {
                path: PathBuf::from("x.csv")
            }
        );

        let cfg = config_with(&env, &[("SWIFT_SHEET_KEY", "abc".to_string())]).unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Sheet {
                key: "abc".to_string()
            }
        );
    }

    #[test]
    fn workbook_source_defaults_to_an_xlsx_path() {
        let cfg = config_with(&[], &[("SWIFT_SOURCE", "xlsx".to_string())]).unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Workbook {
                path: PathBuf::from("swift.xlsx"),
                sheet: None,
            }
        );
    }

    #[test]
    fn bad_bind_only_fails_when_used() {
        let cfg = config(&[("SWIFT_BIND", "x")]).unwrap();
        assert!(matches!(cfg.bind_addr(), Err(SwiftError::Config(_))));
    }

    #[test]
    fn sheet_source_accepts_legacy_key_name() {
        let cfg = config(&[("SWIFT_SOURCE", "sheet"), ("open_by_key", "abc123")]).unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Sheet {
                key: "abc123".to_string()
            }
        );
    }

    #[test]
    fn sheet_source_needs_a_key() {
        assert!(matches!(
            config(&[("SWIFT_SOURCE", "sheet")]),
            Err(SwiftError::Config(_))
        ));
    }

    #[test]
    fn workbook_with_named_sheet_and_download() {
        let cfg = config(&[
            ("SWIFT_SOURCE", "xlsx"),
            ("SWIFT_SOURCE_PATH", "data/swift.xlsx"),
            ("SWIFT_WORKSHEET", "Sheet2"),
            ("SWIFT_DELIVERY", "download"),
        ])
        .unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Workbook {
                path: PathBuf::from("data/swift.xlsx"),
                sheet: Some("Sheet2".to_string()),
            }
        );
        assert_eq!(cfg.delivery, DeliveryMode::Download);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(config(&[("SWIFT_SOURCE", "ftp")]).is_err());
        assert!(config(&[("SWIFT_DELIVERY", "email")]).is_err());
    }
}
