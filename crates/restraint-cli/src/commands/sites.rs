use clap::Subcommand;
use restraint_core::sites::SitePolicy;
use restraint_core::storage::Config;
use url::Url;

#[derive(Subcommand)]
pub enum SitesAction {
    /// Check whether a URL is restricted
    Check { url: String },
    /// List restricted hostnames and allow patterns
    List,
}

pub fn run(action: SitesAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    match action {
        SitesAction::Check { url } => {
            let policy = SitePolicy::compile(&config.sites)?;
            let url = Url::parse(&url)?;
            let restricted = policy.is_restricted(&url);
            println!(
                "{}",
                serde_json::json!({ "url": url.as_str(), "restricted": restricted })
            );
        }
        SitesAction::List => {
            println!("{}", serde_json::to_string_pretty(&config.sites)?);
        }
    }
    Ok(())
}
