//! Root CLI structure for skelanim-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skelanim-rs")]
#[command(about = "Command-line tools for skeletal animation controllers", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Animator controller operations
    Controller {
        #[command(subcommand)]
        command: crate::commands::controller::ControllerCommands,
    },

    /// Skeleton operations
    Skeleton {
        #[command(subcommand)]
        command: crate::commands::skeleton::SkeletonCommands,
    },

    /// Animation clip operations
    Clip {
        #[command(subcommand)]
        command: crate::commands::clip::ClipCommands,
    },

    /// Drive an animator frame by frame and report its state
    Simulate(crate::commands::simulate::SimulateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
