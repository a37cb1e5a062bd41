use anyhow::bail;

use hostgate::{OrchestratorError, StorageNodeChange};
use hostgate_policy::{HostStateChangeDenied, NodeGroup, SuspensionReasons};

use super::{Context, node_group};
use crate::OutputFormat;

pub fn check(context: &Context, hosts: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let group = node_group(&context.topology, hosts)?;
    match context.orchestrator.check_suspend(&group) {
        Ok(reasons) => print_granted(&group, &reasons, &[], format),
        Err(e) => report_failure(&group, e, format),
    }
}

pub async fn suspend(
    context: &Context,
    hosts: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let group = node_group(&context.topology, hosts)?;
    match context.orchestrator.suspend_group(&group).await {
        Ok(reasons) => {
            let changes = context.orchestrator.controller().changes().await;
            print_granted(&group, &reasons, &changes, format)
        }
        Err(e) => report_failure(&group, e, format),
    }
}

pub async fn resume(
    context: &Context,
    hosts: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let group = node_group(&context.topology, hosts)?;
    context.orchestrator.resume_group(&group).await?;
    let changes = context.orchestrator.controller().changes().await;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "application": group.application_id().to_string(),
                "hosts": group.hosts(),
                "resumed": true,
                "storage_nodes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print_changes(&changes);
            println!("✓ Resumed {group}");
        }
    }
    Ok(())
}

fn print_granted(
    group: &NodeGroup<'_>,
    reasons: &SuspensionReasons,
    changes: &[StorageNodeChange],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "application": group.application_id().to_string(),
                "hosts": group.hosts(),
                "granted": true,
                "reasons": reasons.messages(),
                "storage_nodes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print_changes(changes);
            println!("✓ Suspension of {group} granted");
            for message in reasons.messages() {
                println!("  note: {message}");
            }
        }
    }
    Ok(())
}

fn print_changes(changes: &[StorageNodeChange]) {
    for change in changes {
        println!(
            "  storage node {} in cluster '{}' set {}",
            change.host, change.cluster_id, change.state
        );
    }
}

/// Denials are written to stdout in the requested format before failing.
fn report_failure(
    group: &NodeGroup<'_>,
    error: OrchestratorError,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let Some(denied) = error.denial() else {
        return Err(error.into());
    };
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&denial_json(group, denied))?);
    }
    bail!("{denied}")
}

fn denial_json(group: &NodeGroup<'_>, denied: &HostStateChangeDenied) -> serde_json::Value {
    serde_json::json!({
        "application": group.application_id().to_string(),
        "hosts": group.hosts(),
        "granted": false,
        "constraint": denied.constraint.as_str(),
        "message": denied.message,
    })
}
