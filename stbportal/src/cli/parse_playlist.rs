use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::playlist::{Catalog, PAGE_SIZE, open_source};

#[derive(Parser, Debug)]
pub struct ParsePlaylistCommand {
    /// Playlist URL or local path
    pub location: String,

    /// Fetch timeout in seconds
    #[arg(long, default_value = "15")]
    pub fetch_timeout: u64,

    /// Proxy for the fetch (http, https or socks5 URL)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Fail if the playlist yields no channels
    #[arg(long)]
    pub strict: bool,
}

impl ParsePlaylistCommand {
    pub async fn run(self) -> Result<()> {
        let source = open_source(
            &self.location,
            Duration::from_secs(self.fetch_timeout),
            self.proxy.as_deref(),
        )?;

        println!("Fetching playlist: {}", source.location());
        let text = source
            .fetch()
            .await
            .with_context(|| format!("Failed to load {}", source.location()))?;

        let catalog = Catalog::build(&text);
        print!("{}", summarize(&catalog));

        if self.strict && catalog.total_items() == 0 {
            bail!("No channels found in playlist");
        }
        Ok(())
    }
}

fn summarize(catalog: &Catalog) -> String {
    let mut out = format!(
        "  {} channel(s), {} page(s) of {}\n",
        catalog.total_items(),
        catalog.all_pages(),
        PAGE_SIZE
    );

    for channel in catalog.channels() {
        out.push_str(&format!(
            "  {:>4}. {} -> {}\n",
            channel.id, channel.name, channel.cmd
        ));
        if !channel.logo.is_empty() {
            out.push_str(&format!("        logo: {}\n", channel.logo));
        }
    }

    out
}
