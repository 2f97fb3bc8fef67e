//! `wharf validate` - check manifests without resolving.

use anyhow::Result;
use wharf::ops;

use crate::cli::ValidateArgs;
use crate::commands::build_environment;

pub fn execute(args: ValidateArgs) -> Result<()> {
    let env = build_environment(&args.project)?;
    let requirements = ops::load_requirements(&args.project.project_dir, &env)?;

    for manifest in requirements.manifests() {
        println!(
            "ok: {} ({} dependencies)",
            manifest.name(),
            manifest.dependencies().len()
        );
    }
    Ok(())
}
