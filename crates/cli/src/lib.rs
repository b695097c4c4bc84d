use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use matrix_core::{
    default_filters, dimension_key, discover_payload, parse_dimension_ref, AxisProjector,
    AxisSelection, CoordinateSpace, DimensionFilter, DiscoveryReport, MatrixError,
    MatrixSummary, ProjectorConfig, SortDirection,
};
use matrix_protocol::{
    fingerprint, payload_schema, serialize_json, DisplayTableDocument, ErrorEnvelope,
    MatrixPayload,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

mod report;

const CONFIG_ENV: &str = "MATRIX_CONFIG";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "matrix")]
#[command(about = "Project sparse parameter-sweep results onto display tables", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Projector config file (TOML); overrides MATRIX_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show discovered dimensions, default axes and result statistics
    Inspect(InspectArgs),

    /// Build a display table for the chosen axes
    Project(ProjectArgs),

    /// Print the JSON Schema of the input payload
    Schema,
}

#[derive(Args)]
struct InspectArgs {
    /// Payload file, or `-` for stdin
    payload: String,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ProjectArgs {
    /// Payload file, or `-` for stdin
    payload: String,

    /// Dimension shown as columns (`v0` or `0`)
    #[arg(long)]
    x: Option<String>,

    /// Dimension shown as rows (`v1` or `1`)
    #[arg(long)]
    y: Option<String>,

    /// Fix a non-axis dimension, e.g. `--filter v2=3` (repeatable)
    #[arg(long = "filter", value_name = "DIM=VALUE")]
    filters: Vec<String>,

    /// Pick axes the way a fresh view would (named dimensions first)
    #[arg(long, conflicts_with_all = ["x", "y"])]
    default_axes: bool,

    /// Sort rows by title
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Rows to show before truncating (overrides config)
    #[arg(long)]
    max_rows: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortDirection {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => SortDirection::Ascending,
            SortArg::Desc => SortDirection::Descending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Serialize)]
struct ProjectOutput {
    #[serde(flatten)]
    table: DisplayTableDocument,
    fingerprint: String,
}

#[derive(Serialize)]
struct DimensionInfo {
    key: String,
    name: String,
    named: bool,
    values: Vec<usize>,
    labels: BTreeMap<usize, String>,
}

#[derive(Serialize)]
struct InspectOutput {
    dimensions: Vec<DimensionInfo>,
    default_x: Option<String>,
    default_y: Option<String>,
    default_filters: BTreeMap<String, usize>,
    summary: MatrixSummary,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Inspect(args) => args.json,
        Commands::Project(args) => args.format == OutputFormat::Json,
        Commands::Schema => true,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match run(&cli) {
        Ok(()) => Ok(()),
        Err(err) if json_output => {
            let envelope = error_envelope(&err);
            print_stdout(&serde_json::to_string_pretty(&envelope)?)?;
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Inspect(args) => run_inspect(args, &load_config(cli.config.as_ref())?),
        Commands::Project(args) => run_project(args, load_config(cli.config.as_ref())?),
        Commands::Schema => print_stdout(&serde_json::to_string_pretty(&payload_schema())?),
    }
}

fn load_config(flag: Option<&PathBuf>) -> Result<ProjectorConfig> {
    let path = flag
        .cloned()
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            log::debug!("Loading projector config from {}", path.display());
            Ok(ProjectorConfig::from_path(&path)?)
        }
        None => Ok(ProjectorConfig::default()),
    }
}

fn read_payload(source: &str) -> Result<MatrixPayload> {
    let bytes = if source == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        fs::read(source).with_context(|| format!("Failed to read payload {source}"))?
    };
    let payload = MatrixPayload::from_json_slice(&bytes)
        .map_err(|err| MatrixError::payload(format!("{err:#}")))?;
    log::debug!(
        "Loaded payload with {} coordinates",
        payload.coordinate_count()
    );
    Ok(payload)
}

fn parse_filter(raw: &str) -> Result<DimensionFilter> {
    let (dimension, value) = raw
        .split_once('=')
        .with_context(|| format!("Filter {raw:?} must look like DIM=VALUE"))?;
    let dimension = parse_dimension_ref(dimension.trim())?;
    let value = value
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Filter {raw:?} has a non-numeric value"))?;
    Ok(DimensionFilter::new(dimension, value))
}

fn parse_axis(raw: Option<&String>) -> Result<Option<usize>> {
    raw.map(|value| parse_dimension_ref(value.trim()))
        .transpose()
        .map_err(Into::into)
}

fn run_inspect(args: &InspectArgs, config: &ProjectorConfig) -> Result<()> {
    let payload = read_payload(&args.payload)?;
    let space = CoordinateSpace::from_payload_with_marker(&payload, &config.error_marker);
    let discovery = discover_payload(&payload);
    let summary = MatrixSummary::compute(&space, &discovery);

    if args.json {
        let output = inspect_output(&discovery, summary);
        print_stdout(&serde_json::to_string_pretty(&output)?)
    } else {
        let axes = AxisSelection::default_for(&discovery.dimensions);
        let mut text = report::render_summary(&discovery.dimensions, &summary);
        text.push_str(&format!(
            "default axes: x={} y={}\n",
            axes.x().map_or("-".to_string(), dimension_key),
            axes.y().map_or("-".to_string(), dimension_key),
        ));
        print_stdout(text.trim_end())
    }
}

fn inspect_output(discovery: &DiscoveryReport, summary: MatrixSummary) -> InspectOutput {
    let axes = AxisSelection::default_for(&discovery.dimensions);
    InspectOutput {
        dimensions: discovery
            .dimensions
            .iter()
            .map(|d| DimensionInfo {
                key: d.key(),
                name: d.display_name(),
                named: d.is_named(),
                values: d.values.clone(),
                labels: d
                    .axis_values()
                    .into_iter()
                    .map(|value| (value, d.label(value)))
                    .collect(),
            })
            .collect(),
        default_x: axes.x().map(dimension_key),
        default_y: axes.y().map(dimension_key),
        default_filters: default_filters(&discovery.dimensions, axes)
            .into_iter()
            .map(|f| (dimension_key(f.dimension), f.value))
            .collect(),
        summary,
    }
}

fn run_project(args: &ProjectArgs, mut config: ProjectorConfig) -> Result<()> {
    if let Some(max_rows) = args.max_rows {
        config.max_display_rows = max_rows;
        config.validate()?;
    }

    let payload = read_payload(&args.payload)?;
    let space = CoordinateSpace::from_payload_with_marker(&payload, &config.error_marker);
    let discovery = discover_payload(&payload);

    let axes = if args.default_axes {
        AxisSelection::default_for(&discovery.dimensions)
    } else {
        AxisSelection::new(parse_axis(args.x.as_ref())?, parse_axis(args.y.as_ref())?)?
    };
    let filters = args
        .filters
        .iter()
        .map(|raw| parse_filter(raw))
        .collect::<Result<Vec<_>>>()?;

    let label_max_chars = config.label_max_chars;
    let max_rows = config.max_display_rows;
    let mut table = AxisProjector::new(&space, &discovery.dimensions)
        .with_config(config)
        .project(axes, &filters);
    if let Some(sort) = args.sort {
        table = table.sorted_by_title(sort.into());
    }
    let hidden_rows = table.truncate(max_rows);
    if hidden_rows > 0 {
        log::info!("{hidden_rows} rows hidden; raise --max-rows to show them");
    }

    match args.format {
        OutputFormat::Json => {
            let document = table.to_document(hidden_rows);
            let output = ProjectOutput {
                fingerprint: fingerprint(&document)?,
                table: document,
            };
            let text = if args.pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serialize_json(&output)?
            };
            print_stdout(&text)
        }
        OutputFormat::Markdown => print_stdout(
            report::render_markdown(&table, &discovery.dimensions, label_max_chars, hidden_rows)
                .trim_end(),
        ),
        OutputFormat::Text => print_stdout(
            report::render_text(&table, &discovery.dimensions, label_max_chars, hidden_rows)
                .trim_end(),
        ),
    }
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    let message = format!("{err:#}");
    match err.downcast_ref::<MatrixError>() {
        Some(MatrixError::DuplicateAxis { .. }) => ErrorEnvelope::new("duplicate_axis", message)
            .with_hint("Pick different dimensions for --x and --y"),
        Some(MatrixError::UnknownDimension(_)) => {
            ErrorEnvelope::new("unknown_dimension", message)
                .with_hint("Dimensions are written as v{index} or {index}")
        }
        Some(MatrixError::InvalidConfig(_)) => ErrorEnvelope::new("invalid_config", message),
        Some(MatrixError::Payload(_)) => ErrorEnvelope::new("invalid_payload", message)
            .with_hint("Run `matrix schema` to see the accepted payload shape"),
        Some(MatrixError::MalformedKey(_)) => ErrorEnvelope::new("malformed_key", message),
        None => ErrorEnvelope::new("invalid_request", message),
    }
}
