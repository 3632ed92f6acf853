use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use serde::Serialize;

use reelcraft_core::core::template::{
    LibraryConfig, RenderConfig, RenderFormat, SearchFilters, TemplateData,
};
use reelcraft_core::{
    RenderResult, TemplateCatalog, TemplateCategory, TemplateEngine, ValidationResult,
};

#[derive(Parser, Debug)]
#[command(name = "reelcraft", version, about = "Video template catalog and template engine")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the template catalog.
    Catalog(CatalogArgs),
    /// Validate a template JSON file.
    Validate(ValidateArgs),
    /// Validate and render a template JSON file.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CatalogArgs {
    /// Library JSON to load instead of the built-in templates.
    #[arg(long)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    cmd: CatalogCommand,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List every template.
    List,
    /// Search by text and filters.
    Search(SearchArgs),
    /// Most popular templates.
    Popular {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Catalog statistics.
    Stats,
    /// Write the library export to a file.
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct SearchArgs {
    /// Text matched against name, description and tags.
    query: Option<String>,

    #[arg(long)]
    category: Option<TemplateCategory>,

    /// Match templates carrying any of these tags.
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long, default_value_t = false)]
    featured: bool,

    #[arg(long, default_value_t = false)]
    premium: bool,

    #[arg(long)]
    min_rating: Option<f64>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = 20)]
    page_size: usize,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Template JSON (engine template or exported catalog template).
    template: PathBuf,

    /// Render data JSON object keyed by placeholder id or name.
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Template JSON (engine template or exported catalog template).
    template: PathBuf,

    /// Render data JSON object keyed by placeholder id or name.
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, default_value = "renders")]
    output_dir: PathBuf,

    #[arg(long, default_value = "mp4")]
    format: RenderFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderReport {
    template: String,
    validation: ValidationResult,
    render: RenderResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Catalog(args) => cmd_catalog(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Render(args) => cmd_render(args).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_catalog(library: Option<&Path>) -> anyhow::Result<TemplateCatalog> {
    let Some(path) = library else {
        return Ok(TemplateCatalog::default());
    };

    let mut catalog = TemplateCatalog::empty(LibraryConfig::default());
    catalog
        .load_from_path(path)
        .with_context(|| format!("load library '{}'", path.display()))?;
    Ok(catalog)
}

fn cmd_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = open_catalog(args.library.as_deref())?;

    match args.cmd {
        CatalogCommand::List => print_json(&catalog.get_all_templates()),
        CatalogCommand::Search(search) => {
            let filters = SearchFilters {
                category: search.category,
                tags: search.tags,
                featured: search.featured.then_some(true),
                premium: search.premium.then_some(true),
                min_rating: search.min_rating,
                ..Default::default()
            };
            let results = catalog.search(
                search.query.as_deref().unwrap_or_default(),
                &filters,
                search.page,
                search.page_size,
            );
            print_json(&results)
        }
        CatalogCommand::Popular { limit } => print_json(&catalog.get_popular(limit)),
        CatalogCommand::Stats => print_json(&catalog.statistics()),
        CatalogCommand::Export { out } => {
            catalog
                .save_to_path(&out)
                .with_context(|| format!("write library '{}'", out.display()))?;
            tracing::info!(path = %out.display(), "library exported");
            Ok(())
        }
    }
}

fn load_template(engine: &mut TemplateEngine, path: &Path) -> anyhow::Result<String> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read template '{}'", path.display()))?;
    engine
        .import_template(&json)
        .with_context(|| format!("'{}' is not a template record", path.display()))
}

fn load_data(path: Option<&Path>) -> anyhow::Result<TemplateData> {
    let Some(path) = path else {
        return Ok(TemplateData::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read data '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parse data '{}'", path.display()))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let mut engine = TemplateEngine::new();
    let id = load_template(&mut engine, &args.template)?;
    let data = args.data.as_deref().map(|p| load_data(Some(p))).transpose()?;

    let result = engine.validate_template(&id, data.as_ref());
    print_json(&result)?;
    if !result.valid {
        bail!("template is invalid: {}", result.error_summary());
    }
    Ok(())
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut engine = TemplateEngine::new();
    let id = load_template(&mut engine, &args.template)?;
    let data = load_data(args.data.as_deref())?;

    let config = RenderConfig {
        output_dir: args.output_dir,
        format: args.format,
        ..Default::default()
    };
    let validation = engine.validate_template(&id, Some(&data));
    let render = engine.render_template(&id, &data, config).await;
    let success = render.success;
    if let Some(path) = &render.output_path {
        tracing::info!(output = %path.display(), "render finished");
    }

    print_json(&RenderReport {
        template: id,
        validation,
        render,
    })?;
    if !success {
        bail!("render failed");
    }
    Ok(())
}
