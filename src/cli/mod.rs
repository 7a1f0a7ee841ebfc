mod errors;
mod params;

pub use errors::CliError;
pub use params::{OutputFormat, QueryArgs, SearchArgs};

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::{info, warn};

use crate::export::{self, ExportDocument};
use crate::query::build_query;
use crate::search::{CancelToken, RetrievalRequest, RetrievalSession, get_results};
use crate::serp::{SearchCategory, SerpClient};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Build Google search queries from operators, page through SerpApi results, and export them.
///
/// Configuration via environment variables:
/// - `SERPAPI_API_KEY`: SerpApi credential (or pass `--api-key`)
/// - `RUST_LOG`: log filter, overrides `-v`
#[derive(Parser, Debug)]
#[command(name = "serpx", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the query built from the given operators
    Query(QueryArgs),
    /// Run the query and show or export the results
    #[command(alias = "s")]
    Search(SearchArgs),
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "serpx=warn",
            1 => "serpx=info",
            2 => "serpx=debug",
            _ => "serpx=trace",
        }
    }
}

pub async fn run(cli: Cli, cancel: CancelToken) -> Result<(), CliError> {
    match cli.command {
        Command::Query(args) => {
            let query = non_empty_query(&args)?;
            println!("{query}");
            Ok(())
        }
        Command::Search(args) => search(args, cancel).await,
    }
}

fn non_empty_query(args: &QueryArgs) -> Result<String, CliError> {
    let query = build_query(&args.to_spec());
    if query.is_empty() {
        return Err(CliError::EmptyQuery);
    }
    Ok(query)
}

async fn search(args: SearchArgs, cancel: CancelToken) -> Result<(), CliError> {
    let query = non_empty_query(&args.query)?;

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let client = SerpClient::new(http, args.api_key.as_deref().unwrap_or_default())?;

    eprintln!("query: {query}");
    info!(query = %query, category = %args.category, max_pages = args.max_pages, "search");

    let request = RetrievalRequest::new(&query, args.category, args.max_pages)
        .with_extra_params(&args.params);
    let bar = progress_bar(args.category, args.max_pages, !args.no_progress);
    let session = get_results(&client, &request, &cancel, |p| {
        bar.set_position(u64::from(p.page));
        bar.set_message(format!("{} results", p.items));
    })
    .await;
    bar.finish_and_clear();

    eprintln!("{}", summary(&session));
    if session.stop.is_failure() {
        warn!(stop = %session.stop, "search ended early");
    }
    if session.items.is_empty() {
        return Ok(());
    }

    let now = Local::now().fixed_offset();
    write_results(&session, &query, &args, &now, io::stdout().lock())?;

    if let Some(dir) = &args.export_dir {
        let paths = export::write_exports(dir, &session, &query, &args.params, &now)?;
        eprintln!("saved {}", paths.csv.display());
        eprintln!("saved {}", paths.json.display());
    }

    Ok(())
}

fn progress_bar(category: SearchCategory, max_pages: u32, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::from(max_pages));
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} {prefix} [{bar:30.cyan/blue}] page {pos}/{len} · {msg}")
    {
        bar.set_style(style.progress_chars("█▉ "));
    }
    bar.set_prefix(format!("Fetching {} results", category.label()));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn summary(session: &RetrievalSession) -> String {
    let mut out = format!(
        "{} results · {} page(s) fetched · {}",
        session.items.len(),
        session.pages_fetched,
        session.stop
    );
    if session.discarded > 0 {
        out.push_str(&format!(
            " · {} invalid or empty results filtered",
            session.discarded
        ));
    }
    out
}

fn write_results(
    session: &RetrievalSession,
    query: &str,
    args: &SearchArgs,
    now: &DateTime<FixedOffset>,
    mut out: impl Write,
) -> Result<(), CliError> {
    let fields = session.category.export_fields();
    match args.format {
        OutputFormat::Table => {
            export::ensure_fields(&session.items, fields)?;
            writeln!(out, "{}", export::render_table(&session.items, fields))?;
        }
        OutputFormat::Csv => {
            export::ensure_fields(&session.items, fields)?;
            export::write_csv(&session.items, fields, &mut out)?;
        }
        OutputFormat::Json => {
            let doc = ExportDocument::new(session, query, &args.params, now);
            writeln!(out, "{}", doc.to_json().map_err(export::ExportError::from)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::{fixed_now, session};
    use crate::search::StopReason;
    use crate::serp::SerpError;
    use serde_json::{Value, json};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("serpx").chain(args.iter().copied())).unwrap()
    }

    fn search_args(args: &[&str]) -> SearchArgs {
        let mut argv = vec!["search"];
        argv.extend_from_slice(args);
        match parse(&argv).command {
            Command::Search(a) => a,
            other => panic!("expected search, got: {other:?}"),
        }
    }

    fn rendered(session: &RetrievalSession, args: &SearchArgs) -> Result<String, CliError> {
        let mut buf = Vec::new();
        write_results(session, "q", args, &fixed_now(), &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn search_defaults() {
        let args = search_args(&["cats"]);
        assert_eq!(args.category, SearchCategory::Web);
        assert_eq!(args.max_pages, 1);
        assert_eq!(args.format, OutputFormat::Table);
        assert!(args.params.is_empty());
        assert!(args.export_dir.is_none());
    }

    #[test]
    fn search_flags_parse() {
        let args = search_args(&[
            "cats",
            "dogs",
            "--site",
            "example.com",
            "--type",
            "images",
            "--max-pages",
            "3",
            "--exclude-filetype",
            "doc",
            "--exclude-filetype",
            "ppt",
            "--after",
            "2024-01-31",
            "--param",
            "gl=us",
        ]);
        assert_eq!(args.category, SearchCategory::Images);
        assert_eq!(args.max_pages, 3);
        assert_eq!(args.params, vec![("gl".to_string(), "us".to_string())]);
        assert_eq!(
            build_query(&args.query.to_spec()),
            "cats dogs site:example.com -filetype:doc -filetype:ppt after:2024-01-31"
        );
    }

    #[test]
    fn max_pages_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["serpx", "search", "q", "--max-pages", "0"]).is_err());
        assert!(Cli::try_parse_from(["serpx", "search", "q", "--max-pages", "11"]).is_err());
    }

    #[test]
    fn unknown_filetype_rejected() {
        assert!(Cli::try_parse_from(["serpx", "query", "--filetype", "exe"]).is_err());
    }

    #[test]
    fn bad_date_rejected() {
        assert!(Cli::try_parse_from(["serpx", "query", "--before", "31/01/2024"]).is_err());
    }

    #[test]
    fn verbosity_maps_to_directive() {
        assert_eq!(parse(&["query", "x"]).log_directive(), "serpx=warn");
        assert_eq!(parse(&["-vv", "query", "x"]).log_directive(), "serpx=debug");
    }

    #[tokio::test]
    async fn query_without_operators_is_rejected() {
        let err = run(parse(&["query"]), CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CliError::EmptyQuery));
    }

    #[tokio::test]
    async fn search_without_operators_is_rejected_before_key_check() {
        let mut args = search_args(&[]);
        args.api_key = None;
        let err = search(args, CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CliError::EmptyQuery));
    }

    #[tokio::test]
    async fn search_without_key_is_rejected() {
        let mut args = search_args(&["cats"]);
        args.api_key = Some("   ".into());
        let err = search(args, CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CliError::Serp(SerpError::ApiKeyNotSet)));
    }

    #[test]
    fn summary_mentions_filtered_images() {
        let mut s = session(SearchCategory::Images, vec![json!({"original": "https://a/1.jpg"})]);
        s.discarded = 2;
        let text = summary(&s);
        assert!(text.starts_with("1 results · 1 page(s) fetched · last page reached"));
        assert!(text.contains("2 invalid or empty results filtered"));
    }

    #[test]
    fn summary_reports_failure_reason() {
        let mut s = session(SearchCategory::Web, vec![]);
        s.pages_fetched = 0;
        s.stop = StopReason::Transport("connection refused".into());
        assert!(summary(&s).contains("request failed: connection refused"));
    }

    #[test]
    fn csv_output_projects_fields() {
        let s = session(
            SearchCategory::Videos,
            vec![json!({
                "title": "T", "link": "L", "platform": "YouTube",
                "duration": "3:01", "position": 1, "thumbnail": "ignored"
            })],
        );
        let out = rendered(&s, &search_args(&["q", "--format", "csv"])).unwrap();
        assert_eq!(out, "title,link,platform,duration,position\nT,L,YouTube,3:01,1\n");
    }

    #[test]
    fn json_output_is_full_document() {
        let s = session(SearchCategory::News, vec![json!({"title": "N", "source": "ANSA"})]);
        let out = rendered(&s, &search_args(&["q", "-f", "json"])).unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["search_type"], "news");
        assert_eq!(doc["total_results"], 1);
        assert_eq!(doc["results"][0]["source"], "ANSA");
    }

    #[test]
    fn table_output_requires_expected_fields() {
        let s = session(SearchCategory::Shopping, vec![json!({"unexpected": 1})]);
        let err = rendered(&s, &search_args(&["q"])).unwrap_err();
        assert!(matches!(err, CliError::Export(export::ExportError::MissingFields(_))));
    }
}
