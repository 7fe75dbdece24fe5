use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use swift::config::{Config, DeliveryMode};
use swift::downloader::{Delivered, DeliveryTarget, deliver};
use swift::filter::{FinalSelections, FormView};
use swift::loader::{CachedProvider, provider_from_config};
use swift::report::{ProjectMetadata, assemble};
use swift::selection::Selections;
use swift::session::FormSession;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swift", about = "Pick mitigation strategies for a construction activity")]
struct Cli {
    /// Data source kind: csv, xlsx or sheet (overrides SWIFT_SOURCE)
    #[arg(long, global = true)]
    source: Option<String>,

    /// File to read for csv/xlsx sources (overrides SWIFT_SOURCE_PATH)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Shared sheet key (overrides SWIFT_SHEET_KEY)
    #[arg(long, global = true)]
    sheet_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every option list for the given picks as JSON
    Options(SelectionArgs),
    /// Assemble the report and deliver it
    Report {
        #[command(flatten)]
        selections: SelectionArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
        /// Directory to save SWIFT_{date}.docx into (overrides SWIFT_OUTPUT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the document to stdout instead of a file
        #[arg(long, conflicts_with = "out")]
        download: bool,
    },
    /// Fill in the form at a prompt
    Interactive(MetadataArgs),
    /// Serve the form API over HTTP
    #[cfg(feature = "web")]
    Serve {
        /// Listen address (overrides SWIFT_BIND)
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long = "county")]
    counties: Vec<String>,
    #[arg(long = "species")]
    species: Vec<String>,
    #[arg(long = "activity")]
    activities: Vec<String>,
    /// Impact question to leave out of the report
    #[arg(long = "uncheck")]
    unchecked: Vec<String>,
}

impl SelectionArgs {
    fn to_selections(&self) -> Selections {
        let mut sel = Selections::new();
        for c in &self.counties {
            sel = sel.with_county(c);
        }
        for s in &self.species {
            sel = sel.with_species(s);
        }
        for a in &self.activities {
            sel = sel.with_activity(a);
        }
        for q in &self.unchecked {
            sel = sel.with_impact_checked(q, false);
        }
        sel
    }
}

#[derive(Args)]
struct MetadataArgs {
    #[arg(long, default_value = "")]
    contact: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = "")]
    number: String,
    #[arg(long, default_value = "")]
    sub_account: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Report date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl MetadataArgs {
    fn to_metadata(&self) -> ProjectMetadata {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        ProjectMetadata {
            contact: self.contact.clone(),
            project_name: self.name.clone(),
            project_location: self.location.clone(),
            project_number: self.number.clone(),
            sub_account_number: self.sub_account.clone(),
            project_description: self.description.clone(),
            date,
        }
    }
}

impl Cli {
    /// Source flags as environment overrides, so they win over `SWIFT_*` variables.
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(source) = &self.source {
            overrides.push(("SWIFT_SOURCE", source.clone()));
        }
        if let Some(path) = &self.path {
            overrides.push(("SWIFT_SOURCE_PATH", path.display().to_string()));
        }
        if let Some(key) = &self.sheet_key {
            overrides.push(("SWIFT_SHEET_KEY", key.clone()));
        }
        overrides
    }
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("swift=info,tower_http=debug")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> swift::Result<()> {
    let config = Config::from_env_with(&cli.overrides())?;
    let provider = CachedProvider::new(provider_from_config(&config.source)?);

    match &cli.command {
        Command::Options(args) => {
            let dataset = provider.dataset()?;
            let view = FormView::derive(&dataset, &args.to_selections())?;
            let json = serde_json::to_string_pretty(&view)
                .map_err(|e| swift::SwiftError::Delivery(e.to_string()))?;
            println!("{}", json);
        }
        Command::Report {
            selections,
            metadata,
            out,
            download,
        } => {
            let dataset = provider.dataset()?;
            let finals = FinalSelections::resolve(&dataset, &selections.to_selections())?;
            let document = assemble(&metadata.to_metadata(), &finals);

            let target = match (out, *download) {
                (_, true) => DeliveryTarget::Download,
                (Some(dir), false) => DeliveryTarget::Directory(dir.clone()),
                (None, false) => DeliveryTarget::from(&config.delivery),
            };

            match deliver(&document, &target)? {
                Delivered::Saved(path) => println!("File saved: {}", path.display()),
                Delivered::Download(payload) => {
                    let mut stdout = io::stdout().lock();
                    stdout
                        .write_all(&payload.bytes)
                        .and_then(|_| stdout.flush())
                        .map_err(|e| swift::SwiftError::Delivery(e.to_string()))?;
                }
            }
        }
        Command::Interactive(metadata) => {
            let dataset = provider.dataset()?;
            interactive(dataset, metadata.to_metadata(), &config.delivery)?;
        }
        #[cfg(feature = "web")]
        Command::Serve { bind } => {
            let bind = match bind {
                Some(bind) => *bind,
                None => config.bind_addr()?,
            };
            let target = DeliveryTarget::from(&config.delivery);
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| swift::SwiftError::Config(e.to_string()))?;
            runtime.block_on(swift::app::run(provider, target, bind))?;
        }
    }

    Ok(())
}

fn interactive(
    dataset: Arc<swift::dataset::Dataset>,
    metadata: ProjectMetadata,
    delivery: &DeliveryMode,
) -> swift::Result<()> {
    let mut session = FormSession::new(dataset, metadata)?;
    let mut status = String::from("ok");
    let mut show = true;

    if let DeliveryMode::File { directory } = delivery {
        println!("Reports are saved with: save {}", directory.display());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if show {
            print!("{}", session.render());
        }
        print!("({}) > ", status);
        io::stdout().flush().ok();

        let command = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };
        let command = command.trim();

        match command {
            "q" | "quit" => break,
            "help" => {
                println!("Commands:");
                println!("  county|species|activity <value>: Add a pick");
                println!("  drop <county|species|activity> <value>: Remove a pick");
                println!("  check|uncheck <question>: Toggle a potential impact");
                println!(
                    "  set <contact|name|location|number|sub-account|description|date> <value>"
                );
                println!("  preview: Show the report as text");
                println!("  save <directory>: Save SWIFT_<date>.docx");
                println!("  save-session|load-session <file>: Keep or resume the form");
                println!("  disable_output|enable_output: Toggle the option display");
                println!("  q: Quit");
                show = false;
            }
            "disable_output" => {
                show = false;
                status = String::from("ok");
            }
            "enable_output" => {
                show = true;
                status = String::from("ok");
            }
            "preview" => match session.report() {
                Ok(doc) => {
                    println!("{}", doc);
                    status = String::from("ok");
                }
                Err(e) => status = e.to_string(),
            },
            _ => status = session.apply(command),
        }
    }

    Ok(())
}
