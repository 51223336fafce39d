pub mod add;
pub mod diff;
pub mod init;
pub mod list;
pub mod remove;
pub mod update;

use clap::Subcommand;

use crate::app::AppContext;
use crate::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create crew.json in the current directory
    Init(init::InitArgs),
    /// Install employees or individual skills
    Add(add::AddArgs),
    /// Remove installed employees or skills
    Remove(remove::RemoveArgs),
    /// Update installed standalone skills to their latest versions
    Update(update::UpdateArgs),
    /// Show drift between installed employees and the registry
    Diff(diff::DiffArgs),
    /// List installed employees and skills
    List(list::ListArgs),
}

pub fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Add(args) => add::run(ctx, args),
        Commands::Remove(args) => remove::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::Diff(args) => diff::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
    }
}
