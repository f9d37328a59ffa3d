/*
 * main.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Luxe, a small web browser.
 *
 * Luxe is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Luxe is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Luxe.  If not, see <http://www.gnu.org/licenses/>.
 */

//! `luxe <URL>` fetches one address and prints it as text.
//! `luxe test` runs the fetcher over a fixed set of addresses covering every scheme.

mod display;

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use luxe_core::config::{default_config_path, load_config};
use luxe_core::{Document, FetchConfig, Fetcher};

/// Addresses fetched by `luxe test`, one per scheme plus a redirect and a malformed URL.
const TEST_URLS: [&str; 7] = [
    "http://example.org/",
    "https://example.org/",
    "file:///etc/hosts",
    "data:text/html,Hello%2C%20World!",
    "view-source:http://example.org/",
    "http://browser.engineering/redirect",
    "not a url",
];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "luxe", version, about = "Fetch a URL and print it as text")]
struct Cli {
    /// URL to fetch (http, https, file, data, view-source), or `test`
    target: String,

    /// Config file (default ~/.luxe/config.xml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Redirect hops to follow before failing
    #[arg(long, value_name = "N")]
    max_redirects: Option<u32>,

    /// Connect timeout in seconds, 0 for none
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Read timeout in seconds, 0 for none
    #[arg(long, value_name = "SECS")]
    read_timeout: Option<u64>,

    /// Reuse connections to the same host
    #[arg(long)]
    keep_alive: bool,

    /// User-Agent header value
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Log level; overrides RUST_LOG
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("luxe: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logger(cli.log_level.map(LevelFilter::from)).context("failed to initialise logger")?;
    let config = fetch_config(&cli)?;
    log::debug!("{:?}", config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let mut fetcher = Fetcher::new(config);

    let result = if cli.target == "test" {
        runtime.block_on(run_batch(&mut fetcher));
        Ok(())
    } else {
        runtime
            .block_on(fetcher.fetch(&cli.target))
            .with_context(|| format!("cannot load {}", cli.target))
            .and_then(|doc| print_document(&doc))
    };
    runtime.block_on(fetcher.close());
    result
}

/// RUST_LOG applies unless `--log-level` is given. Redirect hops log at info.
fn init_logger(level: Option<LevelFilter>) -> Result<(), log::SetLoggerError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}",
            record.target(),
            record.level(),
            record.args()
        )
    });
    builder.try_init()
}

/// File settings first, then command-line overrides.
fn fetch_config(cli: &Cli) -> Result<FetchConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = match path {
        Some(path) => load_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FetchConfig::default(),
    };
    if let Some(n) = cli.max_redirects {
        config.max_redirects = n;
    }
    if let Some(secs) = cli.connect_timeout {
        config.connect_timeout = seconds(secs);
    }
    if let Some(secs) = cli.read_timeout {
        config.read_timeout = seconds(secs);
    }
    if cli.keep_alive {
        config.keep_alive = true;
    }
    if let Some(ua) = &cli.user_agent {
        config.user_agent = ua.clone();
    }
    Ok(config)
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn print_document(doc: &Document) -> Result<()> {
    let text = display::render(doc);
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Fetch every TEST_URLS entry, printing the URL before its result. A failure is
/// reported and the batch moves on.
async fn run_batch(fetcher: &mut Fetcher) {
    let mut failed = 0;
    for url in TEST_URLS {
        println!("==> {}", url);
        match fetcher.fetch(url).await {
            Ok(doc) => {
                if let Err(e) = print_document(&doc) {
                    log::error!("cannot print {}: {}", url, e);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("luxe: cannot load {}: {}", url, e);
            }
        }
    }
    println!("{} of {} loaded", TEST_URLS.len() - failed, TEST_URLS.len());
}
