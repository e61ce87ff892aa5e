use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};

use cleannest::catalog;
use cleannest::clients::client_values;
use cleannest::config::AppConfig;
use cleannest::db::Database;
use cleannest::finance;
use cleannest::ingest::IngestPipeline;
use cleannest::logging::{init_logging, StageTimer};
use cleannest::models::{DateRange, OutputFormat};
use cleannest::order::{Extra, Order, OrderRequest, OrderSession, Service};
use cleannest::readers::load_holidays;
use cleannest::report::{cohort_table, write_rows, write_rows_to_file, write_table, Table, Tabular};
use cleannest::retention::{monthly_churn, CohortMatrix};
use cleannest::schema;
use cleannest::sheets::build_source;
use cleannest::stats::{filter_by_date, filter_receipts, rolling_mean, Metric, Stats};
use cleannest::utils::{Aggregation, Period};
use cleannest::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Report format (txt, csv or json)
    #[arg(short, long, global = true, default_value = "txt")]
    format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Revenue,
    Loads,
    FullLoads,
    Discounts,
    Collected,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Day,
    Month,
}

#[derive(Clone, Copy, ValueEnum)]
enum AggregationArg {
    Sum,
    Mean,
    Median,
}

#[derive(Subcommand)]
enum Commands {
    /// Load customers, receipts, expenses and the item catalog into the store
    Ingest,
    /// Headline revenue, load and customer numbers
    Summary,
    /// Revenue or load series, or the per-day summary table
    Revenue {
        /// Metric to chart
        #[arg(short, long, value_enum, default_value = "revenue")]
        metric: MetricArg,

        /// Bucket size
        #[arg(short, long, value_enum, default_value = "day")]
        period: PeriodArg,

        /// Reduction applied to each bucket
        #[arg(short, long, value_enum, default_value = "sum")]
        aggregation: AggregationArg,

        /// Rolling-mean window in buckets
        #[arg(short, long, default_value = "60")]
        window: usize,

        /// Show the per-day summary table instead of a series
        #[arg(long)]
        daily: bool,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(short, long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD, exclusive)
        #[arg(short, long)]
        end_date: Option<String>,
    },
    /// Month-over-month churn
    Retention {
        /// Show distinct customers per month instead
        #[arg(long)]
        monthly_customers: bool,

        /// Show loads per weekday and hour instead
        #[arg(long)]
        peak_hours: bool,
    },
    /// Cohort matrix by month of first visit
    Cohort {
        /// Show retention rates instead of customer counts
        #[arg(long)]
        rates: bool,
    },
    /// Lifetime value per client
    Clients,
    /// Expense totals
    Expenses {
        /// Totals per category
        #[arg(long)]
        by_category: bool,

        /// Totals per month
        #[arg(long)]
        monthly: bool,

        /// Every expense row
        #[arg(long)]
        list: bool,
    },
    /// Monthly revenue against expenses
    Cashflow,
    /// Receipts filtered by customer and date
    Receipts {
        /// Customer name; repeat for several
        #[arg(short = 'n', long = "customer")]
        customers: Vec<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(short, long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(short, long)]
        end_date: Option<String>,
    },
    /// List tables in the store with their row counts
    Tables,
    /// Dump one table from the store
    Show {
        /// Table name
        table: String,
    },
    /// Price an order against the item catalog
    Order {
        /// Customer name as stored
        #[arg(short = 'n', long)]
        customer: String,

        /// Service (wash, dry, fold); repeat for several
        #[arg(long = "service")]
        services: Vec<Service>,

        /// Extra ("extra dry", "hand wash"); repeat for several
        #[arg(long = "extra")]
        extras: Vec<Extra>,

        /// Use the TITAN machines
        #[arg(long)]
        titan: bool,

        /// Detergent sachets
        #[arg(long, default_value = "0")]
        detergent: u32,

        /// Fabric conditioner sachets
        #[arg(long, default_value = "0")]
        fabcon: u32,

        /// Bleach sachets
        #[arg(long, default_value = "0")]
        bleach: u32,
    },
    /// Public holidays for a year
    Holidays {
        /// Year, defaults to the current one
        #[arg(short, long)]
        year: Option<i32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref())?;

    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        &config.logging.format,
    )?;

    info!("Starting cleannest");

    let store_path = config.database_path();
    InputValidator::validate_store_path(&store_path)?;
    let mut db = Database::open(&store_path)
        .with_context(|| format!("Failed to open store at {}", store_path.display()))?;

    match &cli.command {
        Commands::Ingest => ingest(&cli, &config, &mut db)?,
        Commands::Summary => summary(&cli, &config, &db)?,
        Commands::Revenue {
            metric,
            period,
            aggregation,
            window,
            daily,
            start_date,
            end_date,
        } => revenue(
            &cli,
            &db,
            *metric,
            *period,
            *aggregation,
            *window,
            *daily,
            start_date.as_deref(),
            end_date.as_deref(),
        )?,
        Commands::Retention {
            monthly_customers,
            peak_hours,
        } => retention(&cli, &db, *monthly_customers, *peak_hours)?,
        Commands::Cohort { rates } => {
            let receipts = db.fetch_receipts().context(NOT_LOADED)?;
            emit_table(&cli, &cohort_table(&CohortMatrix::from_receipts(&receipts), *rates))?;
        }
        Commands::Clients => {
            let customers = db.fetch_customers().context(NOT_LOADED)?;
            let receipts = db.fetch_receipts().context(NOT_LOADED)?;
            let rows = client_values(&customers, &receipts, config.business.promo_every_loads);
            emit_rows(&cli, &rows)?;
        }
        Commands::Expenses {
            by_category,
            monthly,
            list,
        } => expenses(&cli, &db, *by_category, *monthly, *list)?,
        Commands::Cashflow => {
            let receipts = db.fetch_receipts().context(NOT_LOADED)?;
            let expenses = db.fetch_expenses().context(NOT_LOADED)?;
            let mut rows = finance::monthly_cash_flow(&receipts, &expenses);
            rows.reverse();
            emit_rows(&cli, &rows)?;
        }
        Commands::Receipts {
            customers,
            start_date,
            end_date,
        } => receipts(&cli, &db, customers, start_date.as_deref(), end_date.as_deref())?,
        Commands::Tables => {
            let rows = db.table_counts().context("Failed to count stored tables")?;
            emit_table(&cli, &Table::key_values(rows))?;
        }
        Commands::Show { table } => {
            let (headers, rows) = db.dump_table(table)?;
            emit_table(&cli, &Table { headers, rows })?;
        }
        Commands::Order {
            customer,
            services,
            extras,
            titan,
            detergent,
            fabcon,
            bleach,
        } => {
            let request = OrderRequest {
                customer_name: InputValidator::sanitize_text(customer),
                services: services.iter().copied().collect::<BTreeSet<_>>(),
                extras: extras.iter().copied().collect::<BTreeSet<_>>(),
                use_titan: *titan,
                n_detergent: *detergent,
                n_fabcon: *fabcon,
                n_bleach: *bleach,
            };
            order(&cli, &db, &request)?;
        }
        Commands::Holidays { year } => {
            let year = year.unwrap_or_else(|| Local::now().year());
            let holidays = load_holidays(Path::new(&config.data.holidays_dir), year)?;
            emit_rows(&cli, &holidays)?;
        }
    }

    Ok(())
}

const NOT_LOADED: &str = "Store is missing a table; run `cleannest ingest` first";

/// Write typed rows to `--output` or stdout
fn emit_rows<T: Tabular>(cli: &Cli, rows: &[T]) -> Result<()> {
    if let Some(path) = &cli.output {
        write_rows_to_file(rows, cli.format, path)?;
        info!(path = %path.display(), rows = rows.len(), "Report written");
    } else {
        write_rows(rows, cli.format, std::io::stdout().lock())?;
    }
    Ok(())
}

/// Write an untyped table to `--output` or stdout
fn emit_table(cli: &Cli, table: &Table) -> Result<()> {
    if let Some(path) = &cli.output {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_table(table, cli.format, &mut file)?;
        file.flush()?;
        info!(path = %path.display(), rows = table.rows.len(), "Report written");
    } else {
        write_table(table, cli.format, std::io::stdout().lock())?;
    }
    Ok(())
}

fn parse_optional_date(text: Option<&str>) -> Result<Option<NaiveDate>> {
    text.map(InputValidator::parse_date).transpose()
}

fn ingest(cli: &Cli, config: &AppConfig, db: &mut Database) -> Result<()> {
    let settings = config.sheets.source_settings()?;
    let source = build_source(&settings).context("Failed to set up the expense source")?;
    if source.is_none() {
        warn!("sheets.source is \"none\"; expenses will not be loaded");
    }

    let mut pipeline = IngestPipeline::new(config, Local::now().naive_local())?;
    let report = pipeline.run(db, source.as_deref())?;

    let mut rows = vec![
        ("customers".to_string(), report.customers.to_string()),
        ("receipts".to_string(), report.receipts.to_string()),
        (
            "expenses".to_string(),
            report.expenses.map_or_else(|| "skipped".to_string(), |n| n.to_string()),
        ),
        ("items".to_string(), report.items.to_string()),
    ];
    if let Some(n) = report.holidays {
        rows.push(("holidays".to_string(), n.to_string()));
    }
    rows.push(("summary".to_string(), pipeline.metrics().summary()));
    emit_table(cli, &Table::key_values(rows))
}

fn summary(cli: &Cli, config: &AppConfig, db: &Database) -> Result<()> {
    let timer = StageTimer::start("summary");
    let customers = db.fetch_customers().context(NOT_LOADED)?;
    let receipts = db.fetch_receipts().context(NOT_LOADED)?;
    let stats = Stats::new(&customers, &receipts).with_returning_min_gross(config.business.returning_min_gross);
    let overview = finance::overview(
        &customers,
        &receipts,
        config.business.opened_on,
        Local::now().date_naive(),
    );

    let money = |v: f64| format!("{v:.2}");
    let pct = |v: f64| format!("{:.2}%", v * 100.0);
    let rows = vec![
        ("operating_days", overview.operating_days.to_string()),
        ("unique_clients", overview.unique_clients.to_string()),
        ("transactions", overview.transactions.to_string()),
        ("total_revenue", money(stats.total_revenue())),
        ("daily_average_revenue", money(stats.daily_average_revenue())),
        ("revenue_today", money(stats.revenue_today())),
        ("revenue_vs_average", pct(stats.revenue_delta())),
        ("total_load_count", stats.total_load_count().to_string()),
        ("daily_average_load_count", money(stats.daily_average_load_count())),
        ("load_count_today", stats.load_count_today().to_string()),
        ("load_count_vs_average", pct(stats.load_count_delta())),
        ("unique_customers", stats.total_customer_count().to_string()),
        ("returning_customers", stats.returning_customer_count().to_string()),
        ("global_retention_rate", pct(stats.global_retention_rate())),
        ("global_churn_rate", pct(stats.global_churn_rate())),
    ];
    timer.finish();
    emit_table(cli, &Table::key_values(rows))
}

#[allow(clippy::too_many_arguments)]
fn revenue(
    cli: &Cli,
    db: &Database,
    metric: MetricArg,
    period: PeriodArg,
    aggregation: AggregationArg,
    window: usize,
    daily: bool,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<()> {
    InputValidator::validate_window_size(window)?;
    let start = parse_optional_date(start_date)?;
    let end = parse_optional_date(end_date)?;
    InputValidator::validate_date_range(start, end)?;
    let range = DateRange { start, end };

    let receipts = db.fetch_receipts().context(NOT_LOADED)?;
    let stats = Stats::new(&[], &receipts);
    if daily {
        return emit_rows(cli, &stats.daily_summary(range));
    }

    let in_range: Vec<_> = filter_by_date(&receipts, range).into_iter().cloned().collect();
    let metric = match metric {
        MetricArg::Revenue => Metric::Revenue,
        MetricArg::Loads => Metric::Loads,
        MetricArg::FullLoads => Metric::FullLoads,
        MetricArg::Discounts => Metric::Discounts,
        MetricArg::Collected => Metric::Collected,
    };
    let period = match period {
        PeriodArg::Day => Period::Day,
        PeriodArg::Month => Period::Month,
    };
    let aggregation = match aggregation {
        AggregationArg::Sum => Aggregation::Sum,
        AggregationArg::Mean => Aggregation::Mean,
        AggregationArg::Median => Aggregation::Median,
    };

    let series = Stats::new(&[], &in_range).series(period, aggregation, metric);
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let smoothed = rolling_mean(&values, window);
    debug!(buckets = series.len(), window, "Computed series");

    let table = Table {
        headers: vec!["period".into(), "value".into(), "rolling_mean".into()],
        rows: series
            .iter()
            .zip(smoothed)
            .rev()
            .map(|(p, m)| vec![p.period.to_string(), format!("{:.2}", p.value), format!("{m:.2}")])
            .collect(),
    };
    emit_table(cli, &table)
}

fn retention(cli: &Cli, db: &Database, monthly_customers: bool, peak_hours: bool) -> Result<()> {
    let receipts = db.fetch_receipts().context(NOT_LOADED)?;
    if monthly_customers {
        let stats = Stats::new(&[], &receipts);
        return emit_rows(cli, &stats.monthly_unique_customers());
    }
    if peak_hours {
        let stats = Stats::new(&[], &receipts);
        return emit_rows(cli, &stats.peak_hours());
    }
    emit_rows(cli, &monthly_churn(&receipts))
}

fn expenses(cli: &Cli, db: &Database, by_category: bool, monthly: bool, list: bool) -> Result<()> {
    let expenses = db.fetch_expenses().context(NOT_LOADED)?;
    if list {
        return emit_rows(cli, &expenses);
    }
    if by_category {
        let rows = finance::expense_by_category(&expenses)
            .into_iter()
            .map(|(category, total)| (category, format!("{total:.2}")));
        return emit_table(cli, &Table::key_values(rows));
    }
    if monthly {
        let mut rows = finance::monthly_expense(&expenses, Aggregation::Sum);
        rows.reverse();
        return emit_rows(cli, &rows);
    }

    let mut rows = vec![(
        "total_expense".to_string(),
        format!("{:.2}", finance::total_expense(&expenses)),
    )];
    if let Some((month, total)) = finance::latest_month_expense(&expenses) {
        rows.push((format!("total_expense_{}", month.format("%B").to_string().to_lowercase()), format!("{total:.2}")));
    }
    emit_table(cli, &Table::key_values(rows))
}

fn receipts(
    cli: &Cli,
    db: &Database,
    customers: &[String],
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<()> {
    for name in customers {
        InputValidator::validate_customer_name(name)?;
    }
    let start = parse_optional_date(start_date)?;
    let end = parse_optional_date(end_date)?;
    InputValidator::validate_date_range(start, end)?;

    let receipts = db.fetch_receipts().context(NOT_LOADED)?;
    let selected: HashSet<String> = customers.iter().cloned().collect();
    let filter = (!selected.is_empty()).then_some(&selected);
    let rows: Vec<_> = filter_receipts(&receipts, filter, start, end).into_iter().cloned().collect();
    emit_rows(cli, &rows)
}

fn order(cli: &Cli, db: &Database, request: &OrderRequest) -> Result<()> {
    InputValidator::validate_customer_name(&request.customer_name)?;
    for count in [request.n_detergent, request.n_fabcon, request.n_bleach] {
        InputValidator::validate_item_count(count)?;
    }

    let customers = db.fetch_customers().context(NOT_LOADED)?;
    let mut items = if db.has_table(schema::items::TABLE)? {
        db.fetch_items().context("Failed to read the item catalog")?
    } else {
        Vec::new()
    };
    if items.is_empty() {
        warn!("Item catalog not loaded, using the built-in price list");
        items = catalog::default_items(Local::now().naive_local());
    }

    let order = Order::from_request(request, &items, &customers, Local::now().naive_local())?;
    let mut session = OrderSession::new();
    session.add(order);
    info!(total = session.grand_total(), "Order priced");

    emit_rows(cli, &session.rows())
}
