use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use raven_browser_automation::{
    BrowserSessionExecutor, PlaywrightCliExecutor, ScreenshotRequest, DEFAULT_SCREENSHOT_TIMEOUT_MS,
};
use raven_cli::{Cli, CliOutputFormat, FetchArgs, ListArgs, RavenPaths, ShowArgs};
use raven_profile::{render_report, MergePolicy, ProfileIdentifier, ProfileRepository};
use raven_provider::{profile_page_url, ProfileClient, ProfileSource, DEFAULT_WEB_BASE};
use raven_session::{SessionHeaders, SessionStore};

use crate::runtime_output::{fetch_failure, profile_summary_line, session_failure};

pub(crate) fn execute_fetch(
    cli: &Cli,
    paths: &RavenPaths,
    args: &FetchArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let store = SessionStore::new(paths.session_store_config());
    let source = ProfileClient::new(cli.api_base.as_str(), cli.fetch_timeout_ms)?;
    let executor = if args.no_screenshot {
        None
    } else {
        Some(PlaywrightCliExecutor::new(cli.browser_cli.as_str())?)
    };
    let repository = ProfileRepository::new(&paths.profiles_dir).with_policy(MergePolicy {
        keep_known_on_blank: args.keep_known_on_blank,
    });
    fetch_with(
        &store,
        &repository,
        &source,
        executor
            .as_ref()
            .map(|executor| executor as &dyn BrowserSessionExecutor),
        &args.identifier,
        Utc::now(),
        out,
    )
}

/// Fetch, merge, report, and optionally screenshot one profile.
///
/// Session problems stop the command before any remote call.
pub(crate) fn fetch_with(
    store: &SessionStore,
    repository: &ProfileRepository,
    source: &dyn ProfileSource,
    screenshots: Option<&dyn BrowserSessionExecutor>,
    raw_identifier: &str,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let identifier = ProfileIdentifier::parse(raw_identifier)?;
    let session = store
        .require_fresh_at(now)
        .map_err(|error| session_failure(&error))?;
    let headers = SessionHeaders::from_record(&session);

    let fetched = source
        .fetch(&headers, &identifier)
        .map_err(|error| fetch_failure(&error))?;
    let previous_username = repository
        .get(fetched.id)?
        .map(|record| record.username);
    let merged = repository.merge_at(fetched.id, &fetched.fields, now)?;

    writeln!(out, "fetch: {}", profile_summary_line(&merged))?;
    if let Some(previous) = previous_username.filter(|previous| *previous != merged.username) {
        writeln!(out, "fetch: username changed @{previous} -> @{}", merged.username)?;
    }
    let report_path = repository.write_report(&merged)?;
    writeln!(out, "fetch: report={}", report_path.display())?;

    if let Some(executor) = screenshots {
        let request = ScreenshotRequest::for_session(
            profile_page_url(DEFAULT_WEB_BASE, &merged.username),
            &session,
            DEFAULT_SCREENSHOT_TIMEOUT_MS,
        );
        match executor.capture_screenshot(&request) {
            Some(png) => {
                let screenshot_path = repository.write_screenshot(merged.id, &png)?;
                writeln!(out, "fetch: screenshot={}", screenshot_path.display())?;
            }
            None => writeln!(out, "fetch: screenshot unavailable")?,
        }
    }
    Ok(())
}

pub(crate) fn execute_show(paths: &RavenPaths, args: &ShowArgs, out: &mut dyn Write) -> Result<()> {
    let identifier = ProfileIdentifier::parse(&args.identifier)?;
    let repository = ProfileRepository::new(&paths.profiles_dir);
    let Some(record) = repository.find(&identifier)? else {
        bail!(
            "no stored profile for {identifier}\nhint: run `raven fetch {}` first",
            args.identifier.trim()
        );
    };
    match args.format {
        CliOutputFormat::Text => write!(out, "{}", render_report(&record))?,
        CliOutputFormat::Json => writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&record).context("failed to encode profile record")?
        )?,
    }
    Ok(())
}

pub(crate) fn execute_list(paths: &RavenPaths, args: &ListArgs, out: &mut dyn Write) -> Result<()> {
    let records = ProfileRepository::new(&paths.profiles_dir).list()?;
    match args.format {
        CliOutputFormat::Text if records.is_empty() => writeln!(out, "list: no profiles stored")?,
        CliOutputFormat::Text => {
            for record in &records {
                writeln!(out, "{}", profile_summary_line(record))?;
            }
        }
        CliOutputFormat::Json => writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&records).context("failed to encode profile records")?
        )?,
    }
    Ok(())
}
