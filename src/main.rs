use anyhow::Result;
use clap::Parser;
use pafrealign::cli::Cli;
use pafrealign::config::Config;
use pafrealign::coordinator::Coordinator;

fn realign() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from(cli);
    Coordinator::production().run(&config)
}

fn main() {
    if let Err(e) = realign() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
