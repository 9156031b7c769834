//! Command-line front end for the video cache.

use anyhow::Result;
use log::{error, info};
use std::env;

use vidcache::downloader::progress::format_bytes;
use vidcache::{CacheConfig, VideoCacheManager};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "fetch" if args.len() > 2 => fetch(&args[2..]).await,
        "lookup" if args.len() == 3 => lookup(&args[2]),
        "size" => size(),
        "clear" => clear().await,
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <command>");
    eprintln!("  fetch <url>...   download resources into the cache");
    eprintln!("  lookup <url>     print the cached path for a URL");
    eprintln!("  size             print the total cache size");
    eprintln!("  clear            delete every cached file");
}

fn manager() -> Result<VideoCacheManager> {
    VideoCacheManager::with_config(CacheConfig::default())
}

async fn fetch(urls: &[String]) -> Result<()> {
    let manager = manager()?;
    let mut reports = manager.cache_resources(urls.iter().cloned());

    let mut failures = 0usize;
    while let Some(report) = reports.recv().await {
        match &report.local_path {
            Some(path) => println!("{} -> {}", report.url, path.display()),
            None => {
                failures += 1;
                println!("{} -> failed", report.url);
            }
        }
    }

    info!(
        "{} of {} downloads succeeded",
        urls.len() - failures,
        urls.len()
    );
    if failures > 0 {
        anyhow::bail!("{failures} downloads failed");
    }
    Ok(())
}

fn lookup(url: &str) -> Result<()> {
    let manager = manager()?;
    match manager.lookup(url) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => anyhow::bail!("Not cached: {url}"),
    }
}

fn size() -> Result<()> {
    let manager = manager()?;
    let bytes = manager.cache_size_bytes();
    println!("{} ({bytes} bytes)", format_bytes(bytes));
    Ok(())
}

async fn clear() -> Result<()> {
    let manager = manager()?;
    let removed = manager.clear().await;
    println!("Removed {removed} files");
    Ok(())
}
