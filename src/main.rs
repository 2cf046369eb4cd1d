use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use gksscraper::{
    catalog::{self, Period},
    config::Config,
    fetch,
    host::DocxHost,
    layout::{DocFile, InterimCsv},
    mapper::{self, IndicatorSpec},
    process, store, Row,
};
use reqwest::Client;
use std::{
    io::{self, Write},
    path::PathBuf,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gksscraper", about = "Rosstat bulletin tables → time series")]
struct Cli {
    /// YAML config (defaults to ./gksscraper.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download bulletin files for one month or a range of months.
    Download {
        #[arg(long)]
        target: String,
        /// First month, YYYY-MM
        #[arg(long)]
        from: Period,
        /// Last month, YYYY-MM (defaults to --from)
        #[arg(long)]
        to: Option<Period>,
    },
    /// Extract every table of a bulletin into a tab-delimited artifact.
    Extract {
        #[arg(long)]
        target: String,
        #[arg(long)]
        period: Period,
        /// Source document (defaults to raw/<file>.docx in the data folder)
        #[arg(long)]
        doc: Option<PathBuf>,
        /// Output artifact (defaults to interim/<target>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Map artifact rows to series records, printed as JSON lines.
    Map {
        #[arg(long)]
        target: String,
        #[arg(long)]
        period: Period,
        /// Artifact to read (defaults to interim/<target>.csv)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// LABEL=NAME; repeatable. Defaults to the configured indicators.
        #[arg(long = "indicator", value_parser = parse_indicator)]
        indicators: Vec<IndicatorSpec>,
    },
}

fn parse_indicator(s: &str) -> std::result::Result<IndicatorSpec, String> {
    let (label, name) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=NAME, got {s:?}"))?;
    if label.is_empty() || name.is_empty() {
        return Err(format!("expected LABEL=NAME, got {s:?}"));
    }
    Ok(IndicatorSpec::new(label, name))
}

fn publication_file(target: &str, period: Period) -> Result<&'static str> {
    catalog::resolve(target, period.month)
        .map(|p| p.file)
        .ok_or_else(|| anyhow!("unknown target {target:?} for {period}"))
}

async fn download(cfg: &Config, target: &str, from: Period, to: Period) -> Result<()> {
    let client = Client::new();
    let mut failures = 0usize;
    for period in catalog::official_dates(from, to) {
        let file = publication_file(target, period)?;
        let doc = DocFile::new(&cfg.data_root, period, file)?;
        info!(%period, url = %doc.url, "downloading");
        match fetch::download_doc(&client, &doc.url, &doc.path).await {
            Ok(_) => info!(%period, kb = ?doc.size_kb(), path = %doc.path.display(), "saved"),
            Err(err) => {
                error!(%period, "download failed: {err:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} download(s) failed");
    }
    Ok(())
}

fn extract(
    cfg: &Config,
    target: &str,
    period: Period,
    doc: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let doc_path = match doc {
        Some(p) => p,
        None => DocFile::new(&cfg.data_root, period, publication_file(target, period)?)?.docx_path(),
    };
    let csv_path = match out {
        Some(p) => p,
        None => InterimCsv::new(&cfg.data_root, period, target)?.path,
    };
    let mut host = DocxHost::new();
    let rows = process::doc_to_csv(&mut host, &doc_path, &csv_path)
        .with_context(|| format!("extracting {}", doc_path.display()))?;
    info!(rows, csv = %csv_path.display(), "extracted");
    Ok(())
}

fn map(
    cfg: &Config,
    target: &str,
    period: Period,
    csv: Option<PathBuf>,
    indicators: Vec<IndicatorSpec>,
) -> Result<()> {
    let csv_path = match csv {
        Some(p) => p,
        None => InterimCsv::new(&cfg.data_root, period, target)?.path,
    };
    let specs = if indicators.is_empty() {
        cfg.indicators.clone()
    } else {
        indicators
    };
    let rows: Vec<Row> = store::read_rows(&csv_path)?.collect::<gksscraper::Result<_>>()?;
    let records = mapper::map_all(&rows, &specs, &cfg.columns, &period.to_string())?;
    info!(rows = rows.len(), records = records.len(), "mapped");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Download { target, from, to } => {
            download(&cfg, &target, from, to.unwrap_or(from)).await
        }
        Command::Extract {
            target,
            period,
            doc,
            out,
        } => extract(&cfg, &target, period, doc, out),
        Command::Map {
            target,
            period,
            csv,
            indicators,
        } => map(&cfg, &target, period, csv, indicators),
    }
}
