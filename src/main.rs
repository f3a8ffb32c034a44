mod cli;
mod config;
mod event;
mod filter;
mod input;
mod logging;
mod output;
mod session;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
