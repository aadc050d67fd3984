use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Connect to the bus and report the result.
    Check {
        /// Also plug in a pad and keep it until Enter is pressed
        #[arg(long)]
        plug: bool,
    },
    /// Plug in a pad and drive it from stdin.
    Play,
}

/// Drive virtual Xbox 360 pads on the gamepad bus.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file, `padbus.yaml` in the current directory by default
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["padbus", "check", "--plug", "-v", "--config", "bus.yaml"]);
        assert_eq!(cli.command, Command::Check { plug: true });
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("bus.yaml")));
    }

    #[test]
    fn play_takes_no_arguments() {
        let cli = Cli::parse_from(["padbus", "--no-color", "play"]);
        assert_eq!(cli.command, Command::Play);
        assert!(cli.no_color);
        assert!(Cli::try_parse_from(["padbus", "play", "now"]).is_err());
    }
}
