use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Arg, ArgAction, Command};
use grant_roadmap::analyzer::{CompanyAnalysis, RankedRecommendation, RecommendationAnalyzer};
use grant_roadmap::models::Config;
use grant_roadmap::roadmap::Roadmap;
use grant_roadmap::source::{FileRecordSource, RecordSource};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// `RUST_LOG` wins over the command-line level when set.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read the clock once; `--today` pins it to midnight UTC of that date.
fn reference_instant(today: Option<&String>) -> Result<DateTime<Utc>> {
    match today {
        Some(value) => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("--today must be YYYY-MM-DD, got {}", value))?;
            Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
        }
        None => Ok(Utc::now()),
    }
}

/// `--company` wins over the config; having neither is an error.
fn select_company(cli: Option<&String>, config: &Config, config_file: &str) -> Result<String> {
    let Some(company_name) = cli.cloned().or_else(|| config.company_name.clone()) else {
        anyhow::bail!(
            "no company selected: pass --company NAME or set company_name in {}",
            config_file
        );
    };
    Ok(company_name)
}

fn main() -> Result<()> {
    let matches = Command::new("grant-roadmap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ranks support program recommendations and builds a 12-month application roadmap")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_FILE),
        )
        .arg(
            Arg::new("company")
                .long("company")
                .value_name("NAME")
                .help("Company to analyze (overrides company_name in the config)"),
        )
        .arg(
            Arg::new("list-companies")
                .long("list-companies")
                .help("List companies present in the data file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("today")
                .long("today")
                .value_name("YYYY-MM-DD")
                .help("Reference date for D-day and recency (defaults to now)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is not set")
                .default_value("info"),
        )
        .get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    init_logging(log_level);

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_FILE);

    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        info!(path = config_file, "loading configuration");
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration: {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        Config::default().save_to_file(config_file)?;
        println!("⚠️  Please edit {} and point data_file at your recommendation export, then run the program again.", config_file);
        return Ok(());
    };

    let source = FileRecordSource::open(&config.data_file)
        .with_context(|| format!("Cannot use data file: {}", config.data_file))?;

    if matches.get_flag("list-companies") {
        let companies = source.companies()?;
        println!("🏢 {} companies in {}", companies.len(), source.path().display());
        for company in companies {
            println!("   - {}", company);
        }
        return Ok(());
    }

    let company_name = select_company(matches.get_one::<String>("company"), &config, config_file)?;

    let now = reference_instant(matches.get_one::<String>("today"))?;

    println!("🔍 Analyzing recommendations for: {}", company_name);
    println!("📂 Reading records from: {}", source.path().display());

    let records = source.recommendations(&company_name)?;
    if records.is_empty() {
        println!("ℹ️  No recommendations found for {}", company_name);
        return Ok(());
    }

    let analyzer = RecommendationAnalyzer::from_config(&config);
    let analysis = analyzer.analyze(&records, now);

    let output_dir = config.output_directory.as_deref().unwrap_or("output");
    fs::create_dir_all(output_dir)?;
    clean_output_directory(output_dir)?;

    generate_recommendations_csv(&analysis.ranked, output_dir, "recommendations.csv")?;
    generate_recommendations_csv(&analysis.recent, output_dir, "new_announcements.csv")?;
    generate_roadmap_csv(&analysis.roadmap, output_dir)?;
    generate_analysis_json(&analysis, output_dir)?;

    print_summary(&analysis, &config);

    println!("\n✅ Analysis complete!");
    println!("📂 Results: {}", output_dir);
    Ok(())
}

fn countdown_cell(item: &RankedRecommendation) -> String {
    item.countdown.map(|d| d.to_string()).unwrap_or_default()
}

fn generate_recommendations_csv(
    items: &[RankedRecommendation],
    output_dir: &str,
    file_name: &str,
) -> Result<()> {
    use csv::Writer;

    let csv_path = Path::new(output_dir).join(file_name);
    let mut writer = Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    writer.write_record([
        "Rank",
        "Title",
        "Agency",
        "Region",
        "Support Field",
        "Application Period",
        "Score",
        "Tier",
        "Days Left",
        "URL",
    ])?;

    for (i, item) in items.iter().enumerate() {
        let record = &item.record;
        writer.write_record([
            (i + 1).to_string().as_str(),
            record.title.as_deref().unwrap_or_default(),
            record.agency.as_deref().unwrap_or_default(),
            record.region.as_deref().unwrap_or_default(),
            record.support_field.as_deref().unwrap_or_default(),
            record.period_raw.as_deref().unwrap_or_default(),
            item.score_percent.to_string().as_str(),
            item.tier.as_str(),
            countdown_cell(item).as_str(),
            record.url.as_deref().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_roadmap_csv(roadmap: &Roadmap, output_dir: &str) -> Result<()> {
    use csv::Writer;

    let csv_path = Path::new(output_dir).join("roadmap.csv");
    let mut writer = Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    writer.write_record([
        "Month",
        "Count",
        "Rank",
        "Title",
        "Agency",
        "Score",
        "Start Date",
        "End Date",
    ])?;

    for bucket in &roadmap.buckets {
        let month = bucket.month.to_string();
        let count = bucket.count.to_string();

        if bucket.top_entries.is_empty() {
            writer.write_record([month.as_str(), count.as_str(), "", "", "", "", "", ""])?;
            continue;
        }

        for (i, entry) in bucket.top_entries.iter().enumerate() {
            writer.write_record([
                month.clone(),
                count.clone(),
                (i + 1).to_string(),
                entry.record.title.clone().unwrap_or_default(),
                entry.record.agency.clone().unwrap_or_default(),
                entry.record.score_percent().to_string(),
                entry.start_date.to_string(),
                entry.end_date.map(|d| d.to_string()).unwrap_or_default(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn generate_analysis_json(analysis: &CompanyAnalysis, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("analysis.json");
    let content = serde_json::to_string_pretty(analysis)?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_summary(analysis: &CompanyAnalysis, config: &Config) {
    println!("\n📊 SUMMARY ({})", analysis.today);
    println!("==========\n");

    println!(
        "🎯 {} of {} recommendations at or above score {:.0} (region: {}, agency: {})",
        analysis.ranked.len(),
        analysis.total_records,
        config.min_score * 100.0,
        config.region,
        config.agency
    );
    for item in analysis.ranked.iter().take(5) {
        let deadline = match item.countdown {
            Some(d) if d > 0 => format!("D-{}", d),
            Some(0) => "closes today".to_string(),
            Some(d) => format!("D+{}", -d),
            None => "no deadline".to_string(),
        };
        println!(
            "   {:>3}  {}  ({})",
            item.score_percent,
            item.record.title.as_deref().unwrap_or("(untitled)"),
            deadline
        );
    }

    println!(
        "\n🔔 {} new announcements in the last {} days",
        analysis.recent.len(),
        config.window_days
    );

    let roadmap = &analysis.roadmap;
    println!("\n🗓️  Roadmap: {} scheduled announcements", roadmap.total_count);
    println!("   Active months: {}", roadmap.active_month_count);
    match roadmap.peak_month {
        Some(month) => println!("   Busiest month: {}", month),
        None => println!("   Busiest month: none"),
    }
    let counts = roadmap
        .monthly_counts()
        .iter()
        .enumerate()
        .map(|(i, count)| format!("{}:{}", i + 1, count))
        .collect::<Vec<_>>()
        .join("  ");
    println!("   {}", counts);

    if analysis.unparseable_count > 0 {
        warn!(
            count = analysis.unparseable_count,
            "records without a readable application period were left off the roadmap"
        );
    }
}

fn clean_output_directory(output_dir: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    if !output_path.exists() {
        return Ok(());
    }

    let items_to_clean = [
        "recommendations.csv",
        "new_announcements.csv",
        "roadmap.csv",
        "analysis.json",
    ];

    for item in &items_to_clean {
        let item_path = output_path.join(item);
        if item_path.exists() {
            fs::remove_file(&item_path)
                .with_context(|| format!("Failed to remove {}", item_path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_company_prefers_command_line() {
        let config = Config {
            company_name: Some("From Config".to_string()),
            ..Config::default()
        };
        let cli = "From CLI".to_string();
        assert_eq!(select_company(Some(&cli), &config, "config.toml").unwrap(), "From CLI");
        assert_eq!(select_company(None, &config, "config.toml").unwrap(), "From Config");
    }

    #[test]
    fn test_select_company_without_any_is_an_error() {
        let err = select_company(None, &Config::default(), "config.toml").unwrap_err();
        assert!(err.to_string().contains("no company selected"));
    }

    #[test]
    fn test_today_pins_midnight_utc() {
        let today = "2025-08-10".to_string();
        let now = reference_instant(Some(&today)).unwrap();
        assert_eq!(now.to_rfc3339(), "2025-08-10T00:00:00+00:00");
        assert!(reference_instant(Some(&"10/08/2025".to_string())).is_err());
    }
}
