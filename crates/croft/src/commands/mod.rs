pub mod down;
pub mod plan;
pub mod status;
pub mod synth;
pub mod up;

use anyhow::bail;
use croft_core::{App, StackManifest};

/// Resolves a user-supplied stack argument (short role like `database`
/// or the full stack name) to its manifest.
pub fn resolve_stack<'a>(app: &'a App, arg: &str) -> anyhow::Result<&'a StackManifest> {
    let candidates = [
        ("database", &app.database.manifest),
        ("api", &app.api.manifest),
        ("frontend", &app.frontend.manifest),
    ];
    for (short, manifest) in candidates {
        if arg.eq_ignore_ascii_case(short) || arg == manifest.name {
            return Ok(manifest);
        }
    }
    bail!("unknown stack '{arg}' (expected database, api or frontend)");
}
