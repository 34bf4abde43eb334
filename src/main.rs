mod cli;
mod prelude;

fn main() {
    env_logger::builder()
        .parse_env(env_logger::Env::new().filter_or("UPT_LOG", "info"))
        .format_timestamp(None)
        .init();

    if let Err(err) = cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
