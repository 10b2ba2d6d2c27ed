//! # CLI - StrataKV Interactive Shell
//!
//! A REPL-style command-line interface for the StrataKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! PUT key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! SCAN [lo] [hi]     Range scan, inclusive on both ends
//! FLUSH              Force flush the memtable to an SSTable
//! RESET              Drop every key and every table
//! STATS              Print engine debug info
//! EXIT / QUIT        Shut down gracefully (flushes on drop)
//! ```
//!
//! Keys are u64; values are taken verbatim as UTF-8 from the rest of the
//! line.
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! STRATA_DATA_DIR  Data root directory            (default: "data")
//! STRATA_MEM_KB    Memtable budget in KiB         (default: 2048 = 2 MiB)
//! RUST_LOG         tracing filter (e.g. "engine=debug")
//! ```

use anyhow::Result;
use engine::{Config, Engine};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Reads a configuration value from the environment, falling back to
/// `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let data_dir = env_or("STRATA_DATA_DIR", "data");
    let mem_kb: usize = env_or("STRATA_MEM_KB", "2048").parse().unwrap_or(2048);

    // The engine refuses to invent its data root; the shell provides it.
    std::fs::create_dir_all(&data_dir)?;

    let config = Config {
        mem_max: mem_kb * 1024,
        ..Config::default()
    };
    let mut engine = Engine::open_with_config(&data_dir, config)?;

    println!(
        "StrataKV started (data_dir={}, mem={}KiB, tables={}, ts={})",
        data_dir,
        mem_kb,
        engine.cache_count(),
        engine.time_stamp()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        let cmd = parts.next().unwrap_or("").to_ascii_uppercase();

        match cmd.as_str() {
            "PUT" => match (parse_key(parts.next()), parts.next()) {
                (Some(key), Some(value)) if !value.is_empty() => {
                    engine.put(key, value.as_bytes().to_vec())?;
                    println!("OK");
                }
                _ => println!("usage: PUT <key:u64> <value>"),
            },
            "GET" => match parse_key(parts.next()) {
                Some(key) => match engine.get(key)? {
                    Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                    None => println!("(nil)"),
                },
                None => println!("usage: GET <key:u64>"),
            },
            "DEL" => match parse_key(parts.next()) {
                Some(key) => {
                    let removed = engine.del(key)?;
                    println!("{}", if removed { "1" } else { "0" });
                }
                None => println!("usage: DEL <key:u64>"),
            },
            "SCAN" => {
                let lo = parse_key(parts.next()).unwrap_or(u64::MIN);
                let hi = parse_key(parts.next()).unwrap_or(u64::MAX);
                let pairs = engine.scan(lo, hi)?;
                for (key, value) in &pairs {
                    println!("{} -> {}", key, String::from_utf8_lossy(value));
                }
                println!("({} entries)", pairs.len());
            }
            "FLUSH" => {
                engine.force_flush()?;
                println!("OK");
            }
            "RESET" => {
                engine.reset()?;
                println!("OK");
            }
            "STATS" => println!("{engine:#?}"),
            "EXIT" | "QUIT" => break,
            other => println!("unknown command: {other}"),
        }
    }

    println!("bye");
    Ok(())
}

fn parse_key(token: Option<&str>) -> Option<u64> {
    token.and_then(|t| t.parse().ok())
}
