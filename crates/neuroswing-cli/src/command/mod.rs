use clap::{ArgAction, Parser, Subcommand};

use self::{replay::ReplayArg, show::ShowArg, train::TrainArg};

mod replay;
mod show;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train pendulum agents, resuming from the newest checkpoint
    Train(#[clap(flatten)] TrainArg),
    /// Run a checkpointed agent through one episode
    Replay(#[clap(flatten)] ReplayArg),
    /// Print a checkpoint summary
    Show(#[clap(flatten)] ShowArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    crate::util::init_logging(args.verbose);
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::Show(arg) => show::run(&arg)?,
    }
    Ok(())
}
