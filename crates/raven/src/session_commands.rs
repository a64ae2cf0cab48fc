use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use raven_browser_automation::{
    run_interactive_login, BrowserLoginConfig, BrowserSessionExecutor, PlaywrightCliExecutor,
};
use raven_cli::{login_config_from_cli, Cli, RavenPaths, StatusArgs};
use raven_core::format_age_hours;
use raven_session::{
    HttpSessionProbe, SessionCheck, SessionError, SessionProbe, SessionStore,
};

use crate::runtime_output::{login_failure, session_failure};

pub(crate) fn execute_login(cli: &Cli, paths: &RavenPaths, out: &mut dyn Write) -> Result<()> {
    let executor = PlaywrightCliExecutor::new(cli.browser_cli.as_str())?;
    let store = SessionStore::new(paths.session_store_config());
    writeln!(
        out,
        "login: complete the sign-in in the browser window (timeout {} ms)",
        cli.login_timeout_ms
    )?;
    out.flush()?;
    login_with(&executor, &store, &login_config_from_cli(cli), Utc::now(), out)
}

pub(crate) fn login_with(
    executor: &dyn BrowserSessionExecutor,
    store: &SessionStore,
    config: &BrowserLoginConfig,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let outcome =
        run_interactive_login(executor, store, config, now).map_err(|error| login_failure(&error))?;
    writeln!(
        out,
        "login: session saved file={} cookies={}",
        outcome.saved.session_path.display(),
        outcome.cookie_count
    )?;
    if outcome.saved.degraded_key {
        writeln!(
            out,
            "warning: session key could not be persisted; the session is sealed with a degraded fallback key"
        )?;
    }
    Ok(())
}

pub(crate) fn execute_status(
    cli: &Cli,
    paths: &RavenPaths,
    args: &StatusArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let store = SessionStore::new(paths.session_store_config());
    if args.offline {
        return status_offline(&store, Utc::now(), out);
    }
    let probe = HttpSessionProbe::new(cli.api_base.as_str(), cli.probe_timeout_ms)?;
    status_with(&store, &probe, Utc::now(), out)
}

fn status_offline(store: &SessionStore, now: DateTime<Utc>, out: &mut dyn Write) -> Result<()> {
    let record = match store.load() {
        Ok(record) => record,
        Err(error) => return report_unusable_session(&error, out),
    };
    let age = format_age_hours(record.age_at(now));
    if record.is_expired_at(now) {
        writeln!(out, "status: expired age={age}")?;
        writeln!(out, "hint: run `raven login` to renew the session")?;
    } else {
        writeln!(out, "status: present age={age} (remote check skipped)")?;
    }
    Ok(())
}

pub(crate) fn status_with(
    store: &SessionStore,
    probe: &dyn SessionProbe,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let check = match store.check_at(probe, now) {
        Ok(check) => check,
        Err(error) => return report_unusable_session(&error, out),
    };
    match check {
        SessionCheck::Active { age } => {
            writeln!(out, "status: active age={}", format_age_hours(age))?;
        }
        SessionCheck::Expired { age } => {
            writeln!(out, "status: expired age={}", format_age_hours(age))?;
            writeln!(out, "hint: run `raven login` to renew the session")?;
        }
        SessionCheck::Rejected { age, outcome } => {
            writeln!(
                out,
                "status: inactive age={} reason={}",
                format_age_hours(age),
                outcome.reason_code()
            )?;
            writeln!(
                out,
                "hint: the session was kept; run `raven login` if the remote service keeps rejecting it"
            )?;
        }
    }
    Ok(())
}

/// Absent sessions are a normal status; unreadable ones fail the command.
fn report_unusable_session(error: &SessionError, out: &mut dyn Write) -> Result<()> {
    if matches!(error, SessionError::SessionNotFound { .. }) {
        writeln!(out, "status: no session")?;
        writeln!(out, "hint: {}", error.remediation())?;
        return Ok(());
    }
    Err(session_failure(error))
}

pub(crate) fn execute_logout(paths: &RavenPaths, out: &mut dyn Write) -> Result<()> {
    let mut store = SessionStore::new(paths.session_store_config());
    let outcome = store.clear();
    if outcome.removed_anything() {
        writeln!(
            out,
            "logout: removed session={} key={}",
            outcome.session_removed, outcome.key_removed
        )?;
    } else {
        writeln!(out, "logout: no session stored")?;
    }
    for failure in &outcome.failures {
        writeln!(out, "warning: {failure}")?;
    }
    out.flush().context("failed to flush logout output")
}
