use std::path::Path;

use colored::Colorize;
use croft_cloud::StateManager;

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    if state.stacks.is_empty() {
        println!("no deployed stacks");
        return Ok(());
    }

    for (stack_name, stack) in &state.stacks {
        println!();
        println!("{}", stack_name.bold());
        for record in &stack.resources {
            println!(
                "  {} {} {}",
                format!("[{}]", record.kind).dimmed(),
                record.logical_name.cyan(),
                record.physical_id
            );
        }
    }
    println!();
    println!(
        "{}",
        format!("last updated {}", state.updated_at).dimmed()
    );
    Ok(())
}
