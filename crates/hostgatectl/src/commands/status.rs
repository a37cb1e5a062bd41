use anyhow::Context as _;

use hostgate_model::ApplicationId;

use super::Context;
use crate::OutputFormat;

pub fn status(
    context: &Context,
    application: &ApplicationId,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let instance = context
        .topology
        .application(application)
        .with_context(|| format!("application {application} is not in the topology"))?;
    let snapshot = context.orchestrator.store().snapshot(application)?;

    let rows: Vec<(&str, &str)> = instance
        .hosts()
        .into_iter()
        .map(|host| (host.as_str(), snapshot.status_of(host).as_str()))
        .collect();

    match format {
        OutputFormat::Json => {
            let hosts: Vec<_> = rows
                .iter()
                .map(|(host, status)| serde_json::json!({ "host": host, "status": status }))
                .collect();
            let output = serde_json::json!({
                "application": application.to_string(),
                "hosts": hosts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            let width = rows.iter().map(|(h, _)| h.len()).max().unwrap_or(4).max(4);
            println!("{:width$}  STATUS", "HOST");
            for (host, status) in &rows {
                println!("{host:width$}  {status}");
            }
        }
    }
    Ok(())
}
