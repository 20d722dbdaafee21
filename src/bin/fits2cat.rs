use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use fits2cat::logger::{log_error, set_log_file};
use fits2cat::metadata::CatalogMetadata;
use fits2cat::pipeline::DEFAULT_VERSION;
use fits2cat::transform::split_list;
use fits2cat::{ConvertOptions, FitsCatalog, MaskValues, TextMode, TextPolicy, convert_catalog};

#[derive(Parser)]
#[command(
    name = "fits2cat",
    disable_version_flag = true,
    about = "Converts a simple FITS catalog into a plain text ASCII catalog."
)]
struct Cli {
    /// Input catalog.
    #[arg(value_name = "CAT_FITS_FILE", required_unless_present = "print_version")]
    catfile: Option<PathBuf>,

    /// Read the header of the catalog from HDR_FILE.
    #[arg(long, value_name = "HDR_FILE")]
    header: Option<PathBuf>,

    /// Set the file version substituted for {version}.
    #[arg(long = "version", value_name = "VERSION", default_value = DEFAULT_VERSION)]
    catalog_version: String,

    /// Columns whose values are wrapped in double quotes (comma-separated).
    #[arg(long, value_name = "TEXT_COLUMNS", default_value = "")]
    text_columns: String,

    /// How text columns are normalised.
    #[arg(long, value_enum, default_value_t = TextModeArg::Quote)]
    text_mode: TextModeArg,

    /// Columns to drop from the output (comma-separated).
    #[arg(long, value_name = "EXCLUDE_COLUMNS", default_value = "")]
    exclude_columns: String,

    /// Mask the values VALS and write them as -99.
    #[arg(long, value_name = "VALS", default_value = "99,-99")]
    mask_values: String,

    /// Directory the .cat file is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also append warnings and errors to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the table layout instead of converting.
    #[arg(long)]
    inspect: bool,

    /// Emit JSON instead of human readable output (with --inspect).
    #[arg(long, requires = "inspect")]
    json: bool,

    /// Print the program version and exit.
    #[arg(short = 'V', long = "program-version")]
    print_version: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TextModeArg {
    None,
    Quote,
    Underscore,
}

impl From<TextModeArg> for TextMode {
    fn from(arg: TextModeArg) -> Self {
        match arg {
            TextModeArg::None => Self::None,
            TextModeArg::Quote => Self::Quote,
            TextModeArg::Underscore => Self::Underscore,
        }
    }
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.print_version {
        println!("fits2cat {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if let Some(path) = &cli.log_file
        && let Err(err) = set_log_file(path)
    {
        eprintln!("error: cannot open log file {}: {err}", path.display());
        return ExitCode::FAILURE;
    }

    let Some(input) = cli.catfile.clone() else {
        log_error("missing CAT_FITS_FILE");
        return ExitCode::FAILURE;
    };
    let result = if cli.inspect {
        run_inspect(&cli, &input)
    } else {
        run_convert(&cli, &input)
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run_convert(cli: &Cli, input: &Path) -> Result<(), AnyError> {
    let options = convert_options(cli)?;
    convert_catalog(input, &options)?;
    Ok(())
}

/// Maps the command line onto conversion settings.
fn convert_options(cli: &Cli) -> Result<ConvertOptions, AnyError> {
    let text_columns = split_list(&cli.text_columns);
    if cli.text_mode == TextModeArg::Underscore && !text_columns.is_empty() {
        return Err("--text-columns cannot be combined with --text-mode underscore".into());
    }

    let mask_values: MaskValues = cli.mask_values.parse()?;
    let mut options = ConvertOptions::new()
        .with_version(cli.catalog_version.clone())
        .with_mask_values(mask_values)
        .with_text_policy(TextPolicy::from_mode(cli.text_mode.into(), text_columns))
        .with_exclude_columns(split_list(&cli.exclude_columns))
        .with_out_dir(cli.out_dir.clone());
    if let Some(header) = &cli.header {
        options = options.with_header(header.clone());
    }
    Ok(options)
}

fn run_inspect(cli: &Cli, input: &Path) -> Result<(), AnyError> {
    let catalog = FitsCatalog::open(input)?;
    let meta = catalog.metadata();
    if cli.json {
        print_json(meta)?;
    } else {
        println!(
            "Rows: {}  Columns: {}  Extension: {} (HDU {})",
            meta.row_count,
            meta.column_count(),
            meta.extension_name.as_deref().unwrap_or(""),
            meta.hdu_index
        );
        for column in &meta.columns {
            println!(
                "[{idx:>3}] {name:<24}  {format:<6}  unit={unit:<8}  null={null}",
                idx = column.index,
                name = column.name,
                format = format!("{}{}", column.format.repeat, column.format.code.letter()),
                unit = column.unit.as_deref().unwrap_or(""),
                null = column.null.map(|n| n.to_string()).unwrap_or_default(),
            );
        }
    }
    Ok(())
}

fn print_json(meta: &CatalogMetadata) -> Result<(), AnyError> {
    #[derive(serde::Serialize)]
    struct ColumnJson<'a> {
        index: usize,
        name: &'a str,
        format: String,
        width: usize,
        unit: Option<&'a str>,
        display: Option<&'a str>,
        null: Option<i64>,
        scale: f64,
        zero: f64,
    }
    #[derive(serde::Serialize)]
    struct InspectJson<'a> {
        hdu: usize,
        extension: Option<&'a str>,
        row_count: u64,
        column_count: usize,
        row_width: usize,
        columns: Vec<ColumnJson<'a>>,
    }

    let columns = meta
        .columns
        .iter()
        .map(|column| ColumnJson {
            index: column.index,
            name: &column.name,
            format: format!("{}{}", column.format.repeat, column.format.code.letter()),
            width: column.format.byte_width(),
            unit: column.unit.as_deref(),
            display: column.display.as_deref(),
            null: column.null,
            scale: column.scale,
            zero: column.zero,
        })
        .collect();
    let payload = InspectJson {
        hdu: meta.hdu_index,
        extension: meta.extension_name.as_deref(),
        row_count: meta.row_count,
        column_count: meta.column_count(),
        row_width: meta.row_width,
        columns,
    };
    serde_json::to_writer_pretty(std::io::stdout(), &payload)?;
    println!();
    Ok(())
}
