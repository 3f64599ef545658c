use std::path::Path;

use anyhow::bail;
use colored::Colorize;
use croft_cloud::{CloudProvider, StateManager};
use croft_cloud_aws::AwsProvider;
use croft_core::App;

pub async fn handle(
    app: &App,
    region: &Option<String>,
    project_root: &Path,
    stack: Option<&str>,
) -> anyhow::Result<()> {
    let provider = AwsProvider::connect(region.clone()).await?;

    let auth = provider.check_auth().await?;
    if !auth.authenticated {
        bail!(
            "not authenticated with {}: {}",
            provider.display_name(),
            auth.error.unwrap_or_default()
        );
    }
    println!(
        "{} {}",
        "provider:".bold(),
        format!(
            "{} ({})",
            provider.display_name(),
            auth.account_info.unwrap_or_default()
        )
        .cyan()
    );

    let selected = stack
        .map(|arg| super::resolve_stack(app, arg))
        .transpose()?;

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    let mut failed = None;
    for manifest in app.deploy_order()? {
        if let Some(selected) = selected {
            if manifest.name != selected.name {
                continue;
            }
            // The ordering dependency holds even for single-stack
            // deploys: a dependency must already be in the state.
            for dep in &manifest.depends_on {
                if !state.is_deployed(dep) {
                    // Lock file is cleaned up by the guard's Drop.
                    bail!("{} depends on {dep}; deploy that stack first", manifest.name);
                }
            }
        }

        println!();
        println!("{}", format!("deploying {}", manifest.name).bold());

        let plan = provider.plan(manifest, &state).await?;
        if !plan.has_changes {
            println!("  {} nothing to do", "=".dimmed());
            continue;
        }

        let result = provider.apply(manifest, &plan, &mut state).await?;
        // State is saved even on failure: half-provisioned stacks must
        // stay visible to down.
        manager.save(&state).await?;

        for action in &result.succeeded {
            println!("  {} {}", "✓".green(), action.message);
        }
        for action in &result.failed {
            println!(
                "  {} {}: {}",
                "✗".red(),
                action.action_id,
                action.error.as_deref().unwrap_or("unknown error")
            );
        }
        if !result.is_success() {
            failed = Some(manifest.name.clone());
            break;
        }
    }

    lock.release().await?;
    if let Some(stack_name) = failed {
        bail!("deployment of {stack_name} failed; earlier stacks were left untouched");
    }
    println!();
    println!("{}", "deployment complete".green().bold());

    if let Some(record) = state.find_record(&format!("{}-RestApi", app.api.manifest.prefix)) {
        if let Some(url) = record.get_attribute::<String>("invoke_url") {
            println!("{} {}", "api:".bold(), url.cyan());
        }
    }
    Ok(())
}
