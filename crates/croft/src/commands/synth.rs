use croft_core::App;

/// Prints the synthesized manifests as JSON. Fully offline; useful for
/// inspecting the declared topology and for tests.
pub fn handle(app: &App) -> anyhow::Result<()> {
    let manifests: Vec<_> = app.deploy_order()?;
    println!("{}", serde_json::to_string_pretty(&manifests)?);
    Ok(())
}
