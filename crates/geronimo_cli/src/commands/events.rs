use geronimo::github::GitHubEvent;

use crate::commands::shared::build_github_client;
use crate::config::Config;

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// A public event, flattened for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct EventDisplay {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,
    #[tabled(rename = "Repository")]
    pub repository: String,
}

impl From<&GitHubEvent> for EventDisplay {
    fn from(event: &GitHubEvent) -> Self {
        Self {
            date: event
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            kind: event.kind.clone().unwrap_or_else(|| "Unknown".to_string()),
            repository: event.repo.name.clone(),
        }
    }
}

fn render(items: &[EventDisplay], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items.iter().cloned());
            table.with(tabled::settings::Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Json => serde_json::to_string_pretty(items),
    }
}

/// List the public events a user performed.
pub(crate) async fn handle_events(
    user: Option<String>,
    limit: u32,
    output: OutputFormat,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(user) = user {
        config.github.user = Some(user);
    }
    let login = config.github_user()?.to_string();
    let (client, _) = build_github_client(&config)?;

    let events = client.list_user_events(&login, limit).await?;
    let items: Vec<EventDisplay> = events.iter().map(EventDisplay::from).collect();

    if items.is_empty() && matches!(output, OutputFormat::Table) {
        println!("No public events for {}", login);
        return Ok(());
    }

    println!("{}", render(&items, output)?);
    Ok(())
}
