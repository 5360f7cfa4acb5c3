use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use offshore_wind_assessment::analysis::{
    decompose, derive_wind, group_means, overall_means, wind_statistics, yearly_trend, Period,
    WindRose, WindRoseSettings,
};
use offshore_wind_assessment::config::{Config, OutputConfig};
use offshore_wind_assessment::domain::{Frequency, PowerUnit, TimeFrame, WindSample};
use offshore_wind_assessment::energy::AepEstimator;
use offshore_wind_assessment::{export, ingest, quality, telemetry};
use offshore_wind_assessment::mcp::McpCorrector;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offshore wind resource assessment", long_about = None)]
struct Cli {
    /// Configuration file (TOML); OWA__ environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Human-readable logs instead of JSON lines
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load yearly reanalysis files, derive wind vectors and report averages and gaps
    Era5 {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
    },
    /// Gap and duplicate checks on any time-indexed CSV
    Qc {
        input: PathBuf,
        #[arg(long, default_value = "time")]
        time_column: String,
        /// hourly or ten_minutes; defaults to the configured frequency
        #[arg(long)]
        frequency: Option<Frequency>,
        /// Round timestamps onto the sampling grid first
        #[arg(long)]
        align: bool,
    },
    /// Weibull-based annual energy production for a wind-speed column
    Aep {
        input: PathBuf,
        #[arg(long, default_value = "long-term_WS150")]
        speed_column: String,
        #[arg(long, default_value = "time")]
        time_column: String,
        #[arg(long)]
        power_curve: Option<PathBuf>,
        /// W or kW
        #[arg(long)]
        power_unit: Option<PowerUnit>,
    },
    /// Long-term correction of a measurement record against a reference record
    Mcp {
        #[arg(long)]
        reference: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(long, default_value = "time")]
        reference_time_column: String,
        #[arg(long, default_value = "time")]
        target_time_column: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.pretty);

    let cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    std::fs::create_dir_all(&cfg.output.dir)
        .with_context(|| format!("creating output directory {}", cfg.output.dir.display()))?;

    match cli.command {
        Commands::Era5 {
            dir,
            start_year,
            end_year,
        } => run_era5(&cfg, dir, start_year, end_year),
        Commands::Qc {
            input,
            time_column,
            frequency,
            align,
        } => run_qc(&cfg, &input, &time_column, frequency.unwrap_or(cfg.qc.frequency), align),
        Commands::Aep {
            input,
            speed_column,
            time_column,
            power_curve,
            power_unit,
        } => run_aep(&cfg, &input, &speed_column, &time_column, power_curve, power_unit),
        Commands::Mcp {
            reference,
            target,
            reference_time_column,
            target_time_column,
        } => run_mcp(&cfg, &reference, &target, &reference_time_column, &target_time_column),
    }
}

fn run_era5(cfg: &Config, dir: Option<PathBuf>, start: Option<i32>, end: Option<i32>) -> Result<()> {
    let data = &cfg.data;
    let dir = dir.unwrap_or_else(|| data.reanalysis_dir.clone());
    let start = start.unwrap_or(data.start_year);
    let end = end.unwrap_or(data.end_year);

    let mut frame = ingest::load_reanalysis(&dir, &data.file_prefix, start, end, &data.time_column)
        .with_context(|| format!("loading reanalysis files from {}", dir.display()))?;
    let mut speed_columns = Vec::new();
    for level in &data.wind_levels {
        frame = derive_wind(&frame, &format!("u{level}"), &format!("v{level}"), level)?;
        speed_columns.push(format!("WS{level}"));
    }
    let frame = frame.sorted_by_time();
    let report = quality::check_quality(&frame, cfg.qc.frequency)?;
    let frame = decompose(&frame)?;

    let speed_refs: Vec<&str> = speed_columns.iter().map(String::as_str).collect();
    for (column, mean) in speed_refs.iter().zip(overall_means(&frame, &speed_refs)?) {
        info!(column, mean, "overall mean wind speed");
    }

    let yearly = group_means(&frame, Period::Year, &speed_refs)?;
    for column in &speed_refs {
        match yearly_trend(&yearly, column) {
            Ok(trend) => info!(column, slope_per_year = trend.slope, "yearly trend"),
            Err(e) => warn!(column, error = %e, "no yearly trend"),
        }
    }
    let mut monthly_columns: Vec<String> = Vec::new();
    for level in &data.wind_levels {
        monthly_columns.push(format!("WS{level}"));
        monthly_columns.push(format!("WD{level}"));
    }
    let monthly_refs: Vec<&str> = monthly_columns.iter().map(String::as_str).collect();
    let monthly = group_means(&frame, Period::Month, &monthly_refs)?;

    if let Some(level) = data.wind_levels.first() {
        let sample = WindSample::from_frame(&frame, &format!("WS{level}"), &format!("WD{level}"))?;
        wind_statistics(&sample.speeds(), &sample.directions())?;
        let rose = WindRose::build(&sample, &WindRoseSettings::default())?;
        info!(level = %level, prevailing_direction = rose.prevailing_direction(), "wind rose");
    }

    let out = &cfg.output;
    export::write_grouped_means(out.path(&out.yearly_means), &yearly)?;
    export::write_grouped_means(out.path(&out.monthly_means), &monthly)?;
    export::write_frame_csv(out.path(&out.missing_rows), &report.gaps.missing, &data.time_column)?;
    export::write_frame_csv(
        out.path(&out.duplicate_rows),
        &report.duplicates.duplicates,
        &data.time_column,
    )?;
    Ok(())
}

fn run_qc(cfg: &Config, input: &Path, time_column: &str, frequency: Frequency, align: bool) -> Result<()> {
    let mut frame = ingest::read_frame_csv(input, time_column)
        .with_context(|| format!("reading {}", input.display()))?;
    if align {
        frame = quality::align_to_grid(&frame, frequency)?;
    }

    let report = quality::check_quality(&frame, frequency)?;

    let out = &cfg.output;
    export::write_frame_csv(out.path(&out.missing_rows), &report.gaps.missing, time_column)?;
    export::write_frame_csv(out.path(&out.duplicate_rows), &report.duplicates.duplicates, time_column)?;
    print_json(&report)
}

fn run_aep(
    cfg: &Config,
    input: &Path,
    speed_column: &str,
    time_column: &str,
    power_curve: Option<PathBuf>,
    power_unit: Option<PowerUnit>,
) -> Result<()> {
    let frame = ingest::read_frame_csv(input, time_column)
        .with_context(|| format!("reading {}", input.display()))?;
    let speeds = frame.values(speed_column)?;

    let curve_path = power_curve.unwrap_or_else(|| cfg.data.power_curve.clone());
    let curve = ingest::read_power_curve(&curve_path, power_unit.unwrap_or(cfg.data.power_unit))
        .with_context(|| format!("reading power curve {}", curve_path.display()))?;

    let result = AepEstimator::new(cfg.aep.settings()).estimate(&speeds, &curve, &cfg.aep.sites)?;

    let out = &cfg.output;
    export::write_aep_summary(out.path(&out.aep_summary), &result)?;
    export::write_no_wake_yield(out.path(&out.no_wake_yield), result.total)?;
    print_json(&result)
}

fn run_mcp(
    cfg: &Config,
    reference: &Path,
    target: &Path,
    reference_time_column: &str,
    target_time_column: &str,
) -> Result<()> {
    let read = |path: &Path, column: &str| -> Result<TimeFrame> {
        ingest::read_frame_csv(path, column).with_context(|| format!("reading {}", path.display()))
    };
    let reference = read(reference, reference_time_column)?;
    let target = read(target, target_time_column)?;

    let outcome = McpCorrector::new(cfg.mcp.clone()).correct(&reference, &target)?;

    let out: &OutputConfig = &cfg.output;
    export::write_frame_csv(out.path(&out.long_term_series), &outcome.series, reference_time_column)?;
    export::write_grouped_means(out.path(&out.monthly_means), &outcome.monthly)?;
    print_json(&serde_json::json!({
        "fit": outcome.fit,
        "metrics": outcome.metrics,
        "direction_offset": outcome.direction_offset,
        "measured_mean_speed": outcome.measured_mean_speed,
        "corrected_mean_speed": outcome.corrected_mean_speed,
    }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
