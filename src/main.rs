//! Command-line keyspace profiler for a running Redis server.

use argh::FromArgs;
use eyre::Context;
use redis_sampler::{render::render_report, RedisKeyStore, Sampler};

/// Statistically profile the keyspace of a running Redis server by
/// inspecting a number of random keys.
#[derive(FromArgs)]
struct Args {
    /// host of the server to sample.
    #[argh(option, short = 'h', default = "String::from(\"127.0.0.1\")")]
    host: String,

    /// tcp port of the server.
    #[argh(option, short = 'p', default = "6379")]
    port: u16,

    /// database index to select.
    #[argh(option, short = 'd', default = "0")]
    db: i64,

    /// number of random keys to inspect.
    #[argh(option, short = 'n')]
    samples: usize,
}

fn set_up_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    if let Err(err) = set_up_logger() {
        eprintln!(
            "{:?}",
            eyre::Error::new(err).wrap_err("failed to set up logger")
        );
    }

    let args: Args = argh::from_env();

    println!(
        "Sampling {}:{} DB:{} with {} RANDOMKEYS",
        args.host, args.port, args.db, args.samples
    );

    let url = format!("redis://{}:{}/{}", args.host, args.port, args.db);
    let client = redis::Client::open(url.as_str()).context("invalid connection target")?;
    let con = client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to the server")?;

    let mut sampler = Sampler::new(RedisKeyStore::new(con), args.samples);
    sampler.run().await.context("sampling aborted")?;

    print!("{}", render_report(sampler.tables(), sampler.sample_size()));
    Ok(())
}
