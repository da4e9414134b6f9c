use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use open_proxy::{
    init_logging,
    proxy::{
        parser::read_list, sink::write_list, CheckerConfig, CrawlerConfig, FileSink,
        ProxyCrawler, ProxyFamily, ProxyType, ResultSink, UserAgent, UserAgentPool,
        ValidationEngine,
    },
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A proxy scraper and concurrent proxy validator
#[derive(Parser)]
#[command(name = "open-proxy")]
#[command(about = "A proxy scraper and concurrent proxy validator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a proxy list and keep only the working proxies
    Check {
        /// Dismiss a proxy after this many seconds
        #[arg(short, long, default_value = "20")]
        timeout: u64,
        /// Proxy type (http, https, socks4, socks5)
        #[arg(short, long, default_value = "http")]
        proxy: String,
        /// Path to the proxy list
        #[arg(short, long, default_value = "output.txt")]
        list: PathBuf,
        /// Where to write working proxies (defaults to the list itself)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// URL to test proxies against
        #[arg(short, long, default_value = "https://google.com/")]
        site: String,
        /// Increase output verbosity
        #[arg(short, long)]
        verbose: bool,
        /// Use a random user agent per proxy
        #[arg(short, long)]
        random_agent: bool,
        /// Fixed user agent when not using random agents
        #[arg(short, long)]
        user_agent: Option<String>,
        /// File with one user agent per line for random selection
        #[arg(long)]
        user_agents: Option<PathBuf>,
        /// Maximum number of proxies checked at once
        #[arg(short, long, default_value = "100")]
        concurrency: usize,
    },
    /// Scrape proxies from public sources
    Scrape {
        /// Proxy type (http, https, socks4, socks5, socks)
        #[arg(short, long)]
        proxy: String,
        /// Output file for scraped proxies
        #[arg(short, long, default_value = "output.txt")]
        output: PathBuf,
        /// Increase output verbosity
        #[arg(short, long)]
        verbose: bool,
        /// Timeout in seconds for each source
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            timeout,
            proxy,
            list,
            output,
            site,
            verbose,
            random_agent,
            user_agent,
            user_agents,
            concurrency,
        } => {
            init_logging(verbose);
            let proxy_type: ProxyType = proxy.parse()?;

            let agent = if random_agent {
                let pool = match user_agents {
                    Some(path) => UserAgentPool::from_file(&path)
                        .with_context(|| format!("loading user agents from {:?}", path))?,
                    None => UserAgentPool::default(),
                };
                UserAgent::Random(pool)
            } else {
                user_agent.map(UserAgent::Fixed).unwrap_or_default()
            };

            let config = CheckerConfig::new()
                .with_timeout(Duration::from_secs(timeout))
                .with_concurrency(concurrency)
                .with_test_url(site)
                .with_user_agent(agent);

            let addresses = read_list(&list)
                .with_context(|| format!("reading proxy list {:?}", list))?;
            let request = config.request(addresses, proxy_type);
            request.verify()?;

            println!("Checking {} proxies", request.addresses.len());
            debug!(
                "Test URL: {}, timeout: {}s, concurrency: {}",
                request.target_url, timeout, config.concurrency
            );

            let engine = ValidationEngine::new(config.concurrency);
            let survivors = engine.validate(&request).await;

            let output_path = output.unwrap_or(list);
            let sink = FileSink::new(&output_path).with_input_order(&request.addresses);
            sink.persist(&survivors)
                .with_context(|| format!("writing results to {:?}", output_path))?;

            println!("Found {} valid proxies", survivors.len());
        }
        Commands::Scrape {
            proxy,
            output,
            verbose,
            timeout,
        } => {
            init_logging(verbose);
            let family: ProxyFamily = proxy.parse()?;
            let start = Instant::now();

            let crawler = ProxyCrawler::with_config(
                CrawlerConfig::new().with_timeout(Duration::from_secs(timeout)),
            )?;
            // Fails before any request when no source serves the family
            crawler.sources_for(family)?;

            info!("Scraping proxies...");
            let addresses = crawler.fetch_candidate_strings(family).await?;

            info!("Writing {} proxies to file...", addresses.len());
            write_list(&output, &addresses)
                .with_context(|| format!("writing proxies to {:?}", output))?;
            info!("Done! Took {:.2} seconds", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::try_parse_from(["open-proxy", "check"]).unwrap();
        match cli.command {
            Commands::Check {
                timeout,
                proxy,
                list,
                output,
                site,
                verbose,
                random_agent,
                concurrency,
                ..
            } => {
                assert_eq!(timeout, 20);
                assert_eq!(proxy, "http");
                assert_eq!(list, PathBuf::from("output.txt"));
                assert!(output.is_none());
                assert_eq!(site, "https://google.com/");
                assert!(!verbose);
                assert!(!random_agent);
                assert_eq!(concurrency, 100);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_scrape_requires_proxy() {
        assert!(Cli::try_parse_from(["open-proxy", "scrape"]).is_err());
        assert!(Cli::try_parse_from(["open-proxy", "scrape", "-p", "socks"]).is_ok());
    }
}
