//! Command execution
//!
//! Every command runs against a [`Workspace`] and returns its stdout text.
//! [`run`] wraps that with config loading and state persistence.

use crate::cli::{Action, Invocation};
use crate::config::CliConfig;
use crate::state::{StateFile, Workspace};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use stockcheck_core::{ChangeKind, ChangeRow, Gate, ReviewOutcome};
use stockcheck_model::{PendingStockCheck, StockCheckReport};
use stockcheck_store::{Clock, ManualClock, SettingsStore, SystemClock};

/// Load config and state, execute, save when the action mutates.
///
/// # Errors
/// Config/state I/O failures and any review error from the action
pub async fn run(invocation: Invocation) -> anyhow::Result<String> {
    let config = CliConfig::load(invocation.config.as_deref())?;
    run_with(&config, invocation).await
}

/// [`run`] with an already loaded configuration
///
/// # Errors
/// State I/O failures and any review error from the action
pub async fn run_with(config: &CliConfig, invocation: Invocation) -> anyhow::Result<String> {
    let state_path = invocation.state.clone().unwrap_or_else(|| config.state_file.clone());

    let clock: Arc<dyn Clock> = match invocation.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };

    let state = StateFile::load(&state_path)?;
    let workspace = Workspace::new(state, config, clock);

    let mutates = invocation.action.mutates();
    let output = execute(&workspace, invocation.action, invocation.json).await?;

    if mutates {
        workspace.to_state().save(&state_path)?;
        tracing::debug!(path = %state_path.display(), "State saved");
    }
    Ok(output)
}

/// Execute one action
///
/// # Errors
/// Unreadable report files and any review error
pub async fn execute(ws: &Workspace, action: Action, json: bool) -> anyhow::Result<String> {
    let engine = &ws.engine;
    let now = ws.clock.now();

    match action {
        Action::Submit { report, actor } => {
            let text = std::fs::read_to_string(&report)
                .with_context(|| format!("failed to read report {}", report.display()))?;
            let report: StockCheckReport = serde_json::from_str(&text)
                .with_context(|| format!("invalid report {}", report.display()))?;

            let record = engine
                .submit(report, &ws.machines.machines(), &ws.items.items(), &actor)
                .await?;
            let stats = record.report.stats;
            if json {
                return render_json(&json!({
                    "id": record.id,
                    "status": record.status,
                    "submittedAt": record.submitted_at,
                    "stats": stats,
                }));
            }
            Ok(format!(
                "Submitted {} ({} machine(s) checked, {} item(s) verified, {} issue(s))",
                record.id, stats.checked_machines, stats.verified_items, stats.issues_found
            ))
        }
        Action::Pending => {
            let pending = engine.pending().await?;
            if json {
                return render_json(&pending);
            }
            Ok(list(&pending, "No submissions awaiting review", |out, r| {
                let stats = r.report.stats;
                let _ = writeln!(
                    out,
                    "{}  {}  {}  machines={} items={} issues={}",
                    r.id,
                    r.submitted_at.to_rfc3339(),
                    r.submitted_by_name,
                    stats.checked_machines,
                    stats.verified_items,
                    stats.issues_found
                );
            }))
        }
        Action::History { status } => {
            let history = engine.history(status).await?;
            let window = engine.window();
            if json {
                let rows: Vec<_> = history
                    .iter()
                    .map(|r| {
                        json!({
                            "submission": r,
                            "canRestore": window.can_restore(r, now),
                            "restoreDeadline": window.deadline(r),
                        })
                    })
                    .collect();
                return render_json(&rows);
            }
            Ok(list(&history, "No reviewed submissions", |out, r| {
                let remaining = window
                    .remaining_text(r, now)
                    .unwrap_or_else(|| "restore window closed".to_string());
                let _ = writeln!(
                    out,
                    "{}  {}  {}  by {}  {}",
                    r.id,
                    r.status,
                    r.reviewed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                    r.reviewed_by_name.as_deref().unwrap_or("Unknown"),
                    remaining
                );
            }))
        }
        Action::Show { id } => render_json(&engine.get(id).await?),
        Action::Compare { id } => {
            let comparison = engine.compare(id).await?;
            if json {
                return render_json(&json!({
                    "rows": comparison.rows(),
                    "summary": comparison.summary(),
                }));
            }
            let mut out = String::new();
            for row in comparison.rows() {
                let _ = writeln!(out, "{}", describe_row(row));
            }
            let summary = comparison.summary();
            let _ = write!(
                out,
                "{} quantity change(s), {} status change(s), {} issue(s) reported",
                summary.quantity_changes, summary.status_changes, summary.issues_reported
            );
            Ok(out)
        }
        Action::Approve { id, actor } => {
            let outcome = engine.approve(id, &actor).await?;
            render_outcome(&outcome, json, "Approved", "updated")
        }
        Action::Discard { id, actor, reason } => {
            let outcome = engine.discard(id, &actor, reason).await?;
            if json {
                return render_json(&outcome.record);
            }
            Ok(format!("Discarded {}", outcome.record.id))
        }
        Action::Restore { id, actor } => {
            let outcome = engine.restore(id, &actor).await?;
            render_outcome(&outcome, json, "Restored to pending", "rolled back")
        }
        Action::Gate => {
            let status = ws.gate.can_submit().await?;
            if json {
                return render_json(&status);
            }
            Ok(match (status.blocked, status.reason, status.unblock_at) {
                (false, _, _) => "Submissions open".to_string(),
                (true, Some(reason), Some(at)) => format!("Blocked: {reason} (until {})", at.to_rfc3339()),
                (true, Some(reason), None) => format!("Blocked: {reason}"),
                (true, None, _) => "Blocked".to_string(),
            })
        }
        Action::Settings {
            mode,
            block_minutes,
            actor,
        } => {
            let mut settings = ws.settings.get().await?;
            if mode.is_some() || block_minutes.is_some() {
                let actor = actor.context("--user is required to change settings")?;
                settings = ws
                    .settings
                    .update(
                        mode.unwrap_or(settings.queue_mode),
                        block_minutes.or(settings.block_duration_minutes),
                        &actor.id,
                        now,
                    )
                    .await?;
                tracing::info!(mode = %settings.queue_mode, by = %actor.id, "Stock check settings updated");
            }
            if json {
                return render_json(&settings);
            }
            Ok(format!(
                "queue mode: {}\nblock duration: {}\nlast submission: {}",
                settings.queue_mode,
                settings
                    .block_duration_minutes
                    .map_or_else(|| "-".to_string(), |m| format!("{m} min")),
                fmt_time(settings.last_submission_at)
            ))
        }
    }
}

fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode output")
}

fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
}

fn list(
    records: &[PendingStockCheck],
    empty: &str,
    mut line: impl FnMut(&mut String, &PendingStockCheck),
) -> String {
    if records.is_empty() {
        return empty.to_string();
    }
    let mut out = String::new();
    for record in records {
        line(&mut out, record);
    }
    out.trim_end().to_string()
}

fn render_outcome(outcome: &ReviewOutcome, json: bool, verb: &str, effect: &str) -> anyhow::Result<String> {
    let applied = &outcome.applied;
    if json {
        let failures: Vec<_> = applied.failures.iter().map(ToString::to_string).collect();
        return render_json(&json!({
            "submission": outcome.record,
            "machinesUpdated": applied.machines_updated,
            "itemsUpdated": applied.items_updated,
            "failures": failures,
        }));
    }

    let mut out = format!(
        "{verb} {}: {} machine(s), {} item(s) {effect}",
        outcome.record.id, applied.machines_updated, applied.items_updated
    );
    for failure in &applied.failures {
        let _ = write!(out, "\n  warning: {failure}");
    }
    Ok(out)
}

fn describe_row(row: &ChangeRow) -> String {
    let mark = if row.changed { "*" } else { " " };
    let item = row.item_name.as_deref().or(row.item_id.as_deref()).unwrap_or("?");
    let place = row
        .machine_name
        .as_deref()
        .map_or_else(|| "storage".to_string(), ToString::to_string);
    let before = row.before.as_deref().unwrap_or("-");
    let after = row.after.as_deref().unwrap_or("-");

    match row.kind {
        ChangeKind::MachineStatus => format!("{mark} status    {place}: {before} -> {after}"),
        ChangeKind::ItemQuantity => format!("{mark} quantity  {item} @ {place}: {before} -> {after}"),
        ChangeKind::Issue => format!(
            "{mark} issue     {item} @ {place}: {}",
            row.issue.as_deref().unwrap_or_default()
        ),
    }
}
