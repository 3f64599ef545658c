use std::io::Write;
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
    yes: bool,
) -> anyhow::Result<()> {
    let selected = stack
        .map(|arg| super::resolve_stack(app, arg))
        .transpose()?;

    let manager = StateManager::new(project_root);
    let mut state = manager.load().await?;

    let targets: Vec<String> = app
        .destroy_order()?
        .into_iter()
        .filter(|m| selected.is_none_or(|s| s.name == m.name))
        .filter(|m| state.is_deployed(&m.name))
        .map(|m| m.name.clone())
        .collect();

    if targets.is_empty() {
        println!("nothing to destroy");
        return Ok(());
    }

    if !yes {
        print!(
            "{} {} [y/N] ",
            "destroy".red().bold(),
            targets.join(", ")
        );
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("aborted");
            return Ok(());
        }
    }

    let provider = AwsProvider::connect(region.clone()).await?;
    let lock = manager.acquire_lock().await?;

    let mut had_failures = false;
    for stack_name in &targets {
        println!();
        println!("{}", format!("destroying {stack_name}").bold());

        let result = provider.destroy_stack(stack_name, &mut state).await?;
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
        had_failures |= !result.is_success();
    }

    lock.release().await?;
    if had_failures {
        bail!("some resources could not be destroyed; re-run `croft down` to retry");
    }
    println!();
    println!("{}", "teardown complete".green().bold());
    Ok(())
}
