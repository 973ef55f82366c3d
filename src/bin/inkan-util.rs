use clap::Parser;

fn main() {
    use inkan::util::cli::*;

    dotenv::dotenv().ok();

    let opts = Options::parse();
    if let Err(e) = run_cli_action(opts) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
