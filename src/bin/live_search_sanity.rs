//! Live round trip against the registry: one phonetic search and one
//! denomination check, printed as JSON.
//!
//! Usage: live_search_sanity <TERM> [CLASS]
//! Config is read from the default location (see `AppConfig::load`), and
//! `IMPI_SEARCH__REGISTRY__MAX_PAGES=2` style variables override it.

use anyhow::{Context, bail};
use impi_search::infrastructure::{RegistryHttpClient, init_logging_with_config, logging};
use impi_search::{AppConfig, DenominationChecker, RegistrySearchClient};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(term) = args.next() else {
        bail!("usage: live_search_sanity <TERM> [CLASS]");
    };
    let class = args
        .next()
        .map(|raw| raw.parse::<i64>().context("CLASS must be a number between 1 and 45"))
        .transpose()?;

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;
    logging::log_system_info(&config.logging);

    let mut client = RegistrySearchClient::from_config(&config)?;
    let result = client.search_term(&term, class).await;

    let checker = DenominationChecker::new(RegistryHttpClient::new(&config.registry)?, &config.registry)?;
    let availability = checker.check(&term).await?;

    let summary = json!({
        "term": result.requested_term,
        "class": class,
        "succeeded": result.succeeded,
        "error": result.error_detail,
        "records": result.records.len(),
        "unique_case_numbers": result.deduplicated_by_case_number().len(),
        "total_reported": result.total_reported,
        "truncated": result.truncated,
        "attempts": result.attempts,
        "pages": result.pages,
        "elapsed_ms": result.elapsed.as_millis(),
        "by_class": result
            .group_by_class()
            .iter()
            .map(|(class, records)| (class.to_string(), records.len()))
            .collect::<std::collections::BTreeMap<_, _>>(),
        "first_records": result.records.iter().take(5).collect::<Vec<_>>(),
        "denomination_check": availability.code(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
