use clap::Parser;
use commands::checkout::{Checkout, Outcome};
use git::GitCliImpl;
use select::FzfSelector;

mod commands;
mod core;
mod errors;
mod git;
mod parser;
mod select;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "easy-checkout", version)]
#[command(about = "Check out a git branch, most recently used first", long_about = None)]
struct Cli {}

fn main() {
    env_logger::init();

    let _args = Cli::parse();

    let git = GitCliImpl::new();
    let selector = FzfSelector::new();

    match Checkout.execute(&git, &selector) {
        Ok(Outcome::CheckedOut(dispatch)) => log::debug!("Done: {:?}", dispatch),
        Ok(Outcome::Cancelled) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
