mod commands;
mod output;
mod terminal;

use commands::{CommandLine, Commands, scan};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.no_banner, commands.quiet);

    match commands.command {
        Commands::Scan(args) => {
            let cfg = args.to_config(commands.quiet, commands.no_banner)?;
            print::header("starting scanner", cfg.quiet);
            scan::scan(args, &cfg).await
        }
    }
}
