use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::{State, STATE_FILENAME};
use crate::installer::Platform;
use crate::Result;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Default platform for installs
    #[arg(long = "default-platform", value_enum, default_value_t = Platform::ClaudeCode)]
    pub default_platform: Platform,

    /// Overwrite an existing crew.json
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: InitArgs) -> Result<()> {
    let state = State::with_defaults(args.default_platform);
    ctx.state_file.init(&state, args.force)?;

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "initialized": true,
            "path": ctx.state_file.path(),
            "defaultPlatform": args.default_platform,
        }));
    }

    output::success(&format!("Created {STATE_FILENAME}"));
    output::detail(&format!("default platform: {}", args.default_platform));
    output::info("");
    output::info("Next: `crew add <employee>` to install your first employee.");
    Ok(())
}
