use clap::Subcommand;
use restraint_core::feed::{FeedLimiter, SelectorMap};
use restraint_core::storage::Config;

#[derive(Subcommand)]
pub enum FeedAction {
    /// Print the feed-item selector for a host
    Selector { host: String },
    /// Simulate a reveal sequence over a feed
    Simulate {
        /// Total feed items on the page
        #[arg(long)]
        items: usize,
        /// Number of "Show More" actions
        #[arg(long, default_value = "1")]
        clicks: usize,
    },
}

pub fn run(action: FeedAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    match action {
        FeedAction::Selector { host } => {
            let map = SelectorMap::new(&config.feed);
            match map.selector_for(&host) {
                Some(selector) => println!("{selector}"),
                None => return Err(format!("unsupported host: {host}").into()),
            }
        }
        FeedAction::Simulate { items, clicks } => {
            let mut limiter = FeedLimiter::from_config(&config.feed);
            for _ in 0..clicks {
                limiter.show_more();
            }
            let cut = limiter.apply(items);
            println!("{}", serde_json::to_string_pretty(&cut)?);
        }
    }
    Ok(())
}
