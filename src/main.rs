use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use padron_reports::aggregate::{self, AggregationSpec, HeaderPolicy};
use padron_reports::chart;
use padron_reports::config::AppConfig;
use padron_reports::lookup;
use padron_reports::report;
use padron_reports::types::Lookups;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the province year-over-year variation report
    Provinces,
    /// Generate the community population report (Total/Hombre/Mujer)
    Communities,
    /// Generate the 2017 population-by-sex bar chart
    SexChart,
    /// Generate the community variation report by sex
    Variation,
    /// Generate the total-population trend chart
    TrendChart,
    /// Generate every report and chart
    All,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load_from_file(&cli.config)?;

    match cli.command {
        Commands::Provinces => run_provinces(&config)?,
        Commands::Communities => run_communities(&config)?,
        Commands::SexChart => run_sex_chart(&config)?,
        Commands::Variation => run_variation(&config)?,
        Commands::TrendChart => run_trend_chart(&config)?,
        Commands::All => {
            run_provinces(&config)?;
            run_communities(&config)?;
            run_sex_chart(&config)?;
            run_variation(&config)?;
            run_trend_chart(&config)?;
        }
    }

    Ok(())
}

fn header_policy(config: &AppConfig) -> HeaderPolicy {
    match config.input.header_rows {
        Some(n) => HeaderPolicy::SkipRows(n),
        None => HeaderPolicy::Detect,
    }
}

fn load_lookups(config: &AppConfig) -> Result<Lookups> {
    let community_names = lookup::load_community_names(&config.input.communities_table)?;
    let province_to_community = lookup::load_province_to_community(&config.input.provinces_table)?;
    println!(
        "Loaded {} communities and {} province mappings",
        community_names.len(),
        province_to_community.len()
    );
    Ok(Lookups {
        community_names,
        province_to_community,
    })
}

fn run_provinces(config: &AppConfig) -> Result<()> {
    println!("Generating province variation report...");
    let spec = AggregationSpec::provinces().with_header(header_policy(config));
    // province grouping resolves entities from the CSV itself
    let records = aggregate::aggregate(&config.input.population_csv, &spec, &Lookups::default())?;
    println!("Aggregated {} provinces", records.len());

    let html = report::render_province_variation(&records);
    let path = report::write_report(&config.output.reports_dir, report::PROVINCE_REPORT, &html)?;
    println!("Report written to {:?}", path);
    Ok(())
}

fn run_communities(config: &AppConfig) -> Result<()> {
    println!("Generating community population report...");
    let lookups = load_lookups(config)?;
    let spec = AggregationSpec::community_totals().with_header(header_policy(config));
    let records = aggregate::aggregate(&config.input.population_csv, &spec, &lookups)?;

    let chart_href = report::relative_href(
        &config.output.reports_dir,
        &config.output.images_dir.join(chart::SEX_CHART),
    );
    let html = report::render_community_population(&records, &chart_href);
    let path = report::write_report(&config.output.reports_dir, report::COMMUNITY_REPORT, &html)?;
    println!("Report written to {:?}", path);
    Ok(())
}

fn run_sex_chart(config: &AppConfig) -> Result<()> {
    println!("Generating population-by-sex chart...");
    let lookups = load_lookups(config)?;
    let spec = AggregationSpec::community_totals().with_header(header_policy(config));
    let records = aggregate::aggregate(&config.input.population_csv, &spec, &lookups)?;

    let ranking = aggregate::top_by_mean_total(&records, 10);
    let entries = chart::sex_chart_entries(&records, &ranking);
    let svg = chart::render_sex_bar_chart(&entries);
    let path = chart::write_chart(&config.output.images_dir, chart::SEX_CHART, &svg)?;
    println!("Chart written to {:?}", path);
    Ok(())
}

fn run_variation(config: &AppConfig) -> Result<()> {
    println!("Generating community variation report...");
    let lookups = load_lookups(config)?;
    let spec = AggregationSpec::community_by_sex().with_header(header_policy(config));
    let records = aggregate::aggregate(&config.input.population_csv, &spec, &lookups)?;

    let chart_href = report::relative_href(
        &config.output.reports_dir,
        &config.output.images_dir.join(chart::TREND_CHART),
    );
    let html = report::render_community_variation(&records, &chart_href);
    let path = report::write_report(&config.output.reports_dir, report::VARIATION_REPORT, &html)?;
    println!("Report written to {:?}", path);
    Ok(())
}

fn run_trend_chart(config: &AppConfig) -> Result<()> {
    println!("Generating total-population trend chart...");
    let lookups = load_lookups(config)?;
    let spec = AggregationSpec::community_totals().with_header(header_policy(config));
    let records = aggregate::aggregate(&config.input.population_csv, &spec, &lookups)?;

    let ranking = aggregate::top_by_mean_total(&records, 10);
    let entries = chart::trend_entries(&records, &ranking);
    let svg = chart::render_trend_line_chart(&entries);
    let path = chart::write_chart(&config.output.images_dir, chart::TREND_CHART, &svg)?;
    println!("Chart written to {:?}", path);
    Ok(())
}
