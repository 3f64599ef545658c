use std::path::Path;

use colored::Colorize;
use croft_cloud::{ActionType, CloudProvider, StateManager};
use croft_cloud_aws::AwsProvider;
use croft_core::App;

pub async fn handle(
    app: &App,
    region: &Option<String>,
    project_root: &Path,
    stack: Option<&str>,
) -> anyhow::Result<()> {
    let selected = stack
        .map(|arg| super::resolve_stack(app, arg))
        .transpose()?;

    let provider = AwsProvider::connect(region.clone()).await?;
    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    for manifest in app.deploy_order()? {
        if selected.is_some_and(|s| s.name != manifest.name) {
            continue;
        }

        let plan = provider.plan(manifest, &state).await?;
        println!();
        println!(
            "{} {}",
            manifest.name.bold(),
            format!("({})", plan.summary()).dimmed()
        );
        for action in &plan.actions {
            let symbol = match action.action_type {
                ActionType::Create => "+".green(),
                ActionType::Delete => "-".red(),
                ActionType::NoOp => "=".dimmed(),
            };
            println!("  {symbol} {}", action.description);
        }
    }
    Ok(())
}
