use anyhow::Context;
use catalog_migrate::batch::catalog::loader::{default_records, SeedFileReader};
use catalog_migrate::configs;
use catalog_migrate::configs::AppConfig;
use catalog_migrate::export::{ExportFormat, ExportSummary, Exporter};
use catalog_migrate::item::repo::{initialize_schema, DieselCatalogRepository};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog-migrate")]
#[command(about = "Import a library catalog seed file and export the stored catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import, export and print statistics (default)
    Run(RunArgs),

    /// Load, clean and import the seed file only
    Import(ImportArgs),

    /// Export the stored catalog only
    Export(ExportArgs),

    /// Print catalog statistics
    Stats,
}

#[derive(Args, Debug, Default)]
struct ImportArgs {
    /// Seed JSON file (defaults to `import.input`)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Fail instead of importing the built-in records when the seed file cannot be read
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug, Default)]
struct ExportArgs {
    /// Base file name (defaults to `data_export_<timestamp>`)
    #[arg(long)]
    base_name: Option<String>,

    /// Formats to export (defaults to `export.formats`)
    #[arg(long, value_enum, value_delimiter = ',')]
    format: Vec<ExportFormat>,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    #[command(flatten)]
    import: ImportArgs,

    #[command(flatten)]
    export: ExportArgs,
}

fn main() -> ExitCode {
    configs::load_dotenv();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = configs::load_config().context("cannot load config")?;
    let _guard = configs::logging::set_global_logging_config(config.logger())
        .context("cannot initialize logging")?;

    let pool = configs::connect_to_database(config.database())
        .with_context(|| format!("cannot connect to database {}", config.database().url()))?;
    initialize_schema(&pool).context("cannot initialize schema")?;
    let repository = DieselCatalogRepository::new(pool);

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            import(&config, &repository, &args.import)?;
            println!();
            export(&config, &repository, &args.export);
            println!();
            stats(&config, &repository)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Import(args) => {
            import(&config, &repository, &args)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Export(args) => {
            let summary = export(&config, &repository, &args);
            Ok(if summary.any_succeeded() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Stats => {
            stats(&config, &repository)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn import(config: &AppConfig, repository: &DieselCatalogRepository, args: &ImportArgs) -> anyhow::Result<()> {
    let input = args.input.as_deref().unwrap_or(config.import().input());
    let reader = if args.strict {
        SeedFileReader::strict(input)
    } else {
        SeedFileReader::new(input, Box::new(default_records))
    };

    info!(input = %input.display(), strict = args.strict, "import started");
    let report = catalog_migrate::create_import_job(repository.clone(), reader)
        .run()
        .context("import failed")?;

    println!("讀取 {} 筆資料, 略過 {} 筆", report.read_count(), report.skipped().len());
    for failed in report.skipped() {
        println!("  略過: {}", failed.message());
    }
    println!("{}", report.summary());
    Ok(())
}

fn export(config: &AppConfig, repository: &DieselCatalogRepository, args: &ExportArgs) -> ExportSummary {
    let exporter = Exporter::new(repository, config.export().dir());
    let base_name = args.base_name.clone().unwrap_or_else(|| exporter.default_base_name());
    let formats = if args.format.is_empty() { config.export().formats() } else { args.format.as_slice() };

    let summary = exporter.export_all(&base_name, formats);
    println!("{}", summary);
    summary
}

fn stats(config: &AppConfig, repository: &DieselCatalogRepository) -> anyhow::Result<()> {
    let stats = catalog_migrate::collect_stats(repository, config.stats().min_books())
        .context("cannot count catalog records")?;

    println!("{}", stats);
    Ok(())
}
