use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dbfscan::api::{
    display_value, field_description, find_comps, open_dbf, open_reader, write_csv, BatchCursor,
    CompsCriteria, ExplorerOptions, SalesFilter, ScanOptions, ScanSession,
};
use dbfscan::{DbfFile, HttpConfig, Record};

#[derive(Parser)]
#[command(name = "dbfscan", about = "Scan, filter and export dBASE sales records")]
struct Cli {
    /// Overall HTTP download timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Retries for transient HTTP failures
    #[arg(long, global = true)]
    max_retries: Option<usize>,
    /// Explorer option such as `recent_window=2000` or `comps_limit=20`
    #[arg(
        long = "option",
        global = true,
        value_name = "KEY=VALUE",
        value_parser = parse_key_val
    )]
    options: Vec<(String, String)>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show the header and field table
    Info {
        location: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the first or last records as JSON lines
    Peek {
        location: String,
        #[arg(long)]
        first: Option<u32>,
        #[arg(long)]
        last: Option<u32>,
    },

    /// Filter sales and print a page of results or export them as CSV
    Filter {
        location: String,
        #[arg(long)]
        nbhc: Option<String>,
        /// YYYYMMDD or YYYY-MM-DD
        #[arg(long)]
        min_date: Option<String>,
        #[arg(long)]
        min_amount: Option<f64>,
        /// Buyer (GRANTEE) substring
        #[arg(long)]
        buyer: Option<String>,
        /// Seller (GRANTOR) substring
        #[arg(long)]
        seller: Option<String>,
        #[arg(long)]
        pin: Option<String>,
        #[arg(long)]
        folio: Option<String>,
        /// Reason code (REA_CD)
        #[arg(long)]
        reason: Option<String>,
        #[arg(long, default_value_t = false)]
        qualified: bool,
        #[arg(long)]
        limit: Option<usize>,
        /// Only scan the last N records (default N: the `recent_window` option)
        #[arg(long, value_name = "N", num_args = 0..=1)]
        recent: Option<Option<u32>>,
        #[arg(long, default_value_t = false)]
        forward: bool,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// Write every match to this CSV file instead of printing a page
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Find recent comparable sales in a neighborhood
    Comps {
        location: String,
        #[arg(long)]
        nbhc: String,
        #[arg(long)]
        min_date: Option<String>,
        #[arg(long, default_value_t = false)]
        qualified: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut http = HttpConfig::default();
    if let Some(secs) = cli.timeout_secs {
        http = http.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = cli.max_retries {
        http = http.with_max_retries(retries);
    }
    let explorer_dict: HashMap<String, String> = cli.options.iter().cloned().collect();
    let options = ExplorerOptions::from_dict(&explorer_dict)?;

    match cli.cmd {
        Cmd::Info { location, json } => info(&location, &http, json).await,

        Cmd::Peek {
            location,
            first,
            last,
        } => {
            let reader = open_reader(&location, &http)
                .await
                .with_context(|| format!("opening {}", location))?;
            let records = match (first, last) {
                (_, Some(n)) => reader.tail(n).await?,
                (Some(n), None) => reader.head(n).await?,
                (None, None) => reader.head(5).await?,
            };
            print_json_lines(&records)
        }

        Cmd::Filter {
            location,
            nbhc,
            min_date,
            min_amount,
            buyer,
            seller,
            pin,
            folio,
            reason,
            qualified,
            limit,
            recent,
            forward,
            page,
            page_size,
            csv,
        } => {
            let filter = SalesFilter {
                nbhc,
                min_date,
                min_amount,
                buyer,
                seller,
                pin,
                folio,
                reason,
                qualified_only: qualified,
            };
            let predicate = filter.to_predicate()?;

            let mut scan_options = match recent {
                Some(Some(n)) => ScanOptions::recent(n),
                Some(None) => options.initial_scan(),
                None => ScanOptions::new(),
            };
            if forward {
                scan_options = scan_options.forward();
            }
            if let Some(limit) = limit {
                scan_options = scan_options.with_limit(limit);
            }

            let file = load(&location, &http).await?;
            let session = ScanSession::new(file.clone());
            let result = session
                .run(predicate, scan_options)
                .await?
                .context("scan was superseded")?;
            eprintln!(
                "Rows: {} (Filtered from {})",
                result.len(),
                file.record_count()
            );

            match csv {
                Some(path) => {
                    let out = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    let rows = write_csv(&file, result.indices(), BufWriter::new(out), |done, total| {
                        eprintln!("Exported {}/{}", done, total)
                    })?;
                    eprintln!("Wrote {} rows to {}", rows, path.display());
                    Ok(())
                }
                None => {
                    let size = page_size.unwrap_or(options.batch_size);
                    let cursor = BatchCursor::with_batch_size(result.indices().to_vec(), size);
                    print_grid(&file, &cursor.page(&file, page))
                }
            }
        }

        Cmd::Comps {
            location,
            nbhc,
            min_date,
            qualified,
        } => {
            let file = load(&location, &http).await?;
            let mut criteria = CompsCriteria::from_options(&options).qualified_only(qualified);
            if let Some(date) = min_date {
                criteria = criteria.with_min_date(date);
            }
            let comps = find_comps(&file, &nbhc, &criteria)?;
            eprintln!("{} comps in neighborhood {}", comps.len(), nbhc);
            print_json_lines(&comps)
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

async fn load(location: &str, http: &HttpConfig) -> Result<DbfFile> {
    let mut last_percent = None;
    let file = open_dbf(location, http, move |received, total| {
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = received * 100 / total;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                eprint!("\rDownloading... {}%", percent);
                if received >= total {
                    eprintln!();
                }
            }
        }
    })
    .await
    .with_context(|| format!("loading {}", location))?;
    Ok(file)
}

async fn info(location: &str, http: &HttpConfig, json: bool) -> Result<()> {
    let reader = open_reader(location, http)
        .await
        .with_context(|| format!("opening {}", location))?;
    let header = reader.header();
    let schema = reader.schema();

    if json {
        let value = serde_json::json!({
            "version": header.version,
            "last_update": header.last_update.map(|d| d.to_string()),
            "record_count": header.record_count,
            "header_length": header.header_length,
            "record_length": header.record_length,
            "fields": schema.fields(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Version:        0x{:02X}", header.version);
    if let Some(date) = header.last_update {
        println!("Last update:    {}", date);
    }
    println!("Records:        {}", header.record_count);
    println!("Header length:  {}", header.header_length);
    println!("Record length:  {}", header.record_length);
    println!();
    println!("{:<11} {:<4} {:>6} {:>4}  Description", "Name", "Type", "Length", "Dec");
    for field in schema.fields() {
        let description = field_description(&field.name)
            .map(|d| d.replace('\n', " / "))
            .unwrap_or_default();
        println!(
            "{:<11} {:<4} {:>6} {:>4}  {}",
            field.name,
            field.field_type.to_string(),
            field.length,
            field.decimal_count,
            description
        );
    }
    Ok(())
}

fn print_json_lines(records: &[Record]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_grid(file: &DbfFile, records: &[Record]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let names: Vec<&str> = file.schema().field_names().collect();
    writeln!(out, "{}", names.join("\t"))?;
    for record in records {
        let row: Vec<String> = record
            .iter()
            .map(|(field, value)| display_value(field, value))
            .collect();
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent_of(args: &[&str]) -> Option<Option<u32>> {
        match Cli::try_parse_from(args).unwrap().cmd {
            Cmd::Filter { recent, .. } => recent,
            _ => panic!("Expected filter command"),
        }
    }

    #[test]
    fn test_recent_flag_value_is_optional() {
        assert_eq!(recent_of(&["dbfscan", "filter", "a.dbf"]), None);
        assert_eq!(recent_of(&["dbfscan", "filter", "a.dbf", "--recent"]), Some(None));
        assert_eq!(
            recent_of(&["dbfscan", "filter", "a.dbf", "--recent", "300"]),
            Some(Some(300))
        );
    }

    #[test]
    fn test_options_reach_explorer_options() {
        let cli = Cli::try_parse_from([
            "dbfscan",
            "--option",
            "recent_window=2000",
            "--option",
            "batch_size=25",
            "filter",
            "a.dbf",
        ])
        .unwrap();
        let dict: HashMap<_, _> = cli.options.into_iter().collect();
        let options = ExplorerOptions::from_dict(&dict).unwrap();
        assert_eq!(options.recent_window, 2000);
        assert_eq!(options.batch_size, 25);
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("comps_limit=20"),
            Ok(("comps_limit".to_string(), "20".to_string()))
        );
        assert!(parse_key_val("comps_limit").is_err());
    }
}
