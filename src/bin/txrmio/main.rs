use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_status;
mod cmd_streams;
mod cmd_get;
mod cmd_exists;
mod cmd_meta;
mod cmd_classify;
mod cmd_truncate;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт - warn (вывод команд идёт в stdout).
    // Пример: RUST_LOG=debug ./txrmio status --path scan.txrm
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Status { path, json } =>
            cmd_status::exec(path, json),

        cli::Cmd::Streams { path, prefix, json } =>
            cmd_streams::exec(path, prefix, json),

        cli::Cmd::Get { path, stream, out } =>
            cmd_get::exec(path, stream, out),

        cli::Cmd::Exists { path, stream } =>
            cmd_exists::exec(path, stream),

        cli::Cmd::Meta { path, field } =>
            cmd_meta::exec(path, field),

        cli::Cmd::Classify { path, threshold, json } =>
            cmd_classify::exec(path, threshold, json),

        cli::Cmd::Truncate { path, keep, out } =>
            cmd_truncate::exec(path, keep, out),
    }
}
