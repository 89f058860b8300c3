//! Connect command implementation.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use topsync_client::{
    ClientConfig, Endpoint, EndpointPath, MemoryDocument, ReconnectConfig, ReplaceMode,
    StatusMarkers,
};
use topsync_protocol::Action;
use topsync_ws::Session;
use tracing::{info, warn};

/// Options for a headless session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Fixed endpoint path; the page path when `None`.
    pub fixed_path: Option<String>,
    /// Retry delay in milliseconds; no retries when `None`.
    pub retry_ms: Option<u64>,
    /// Mirror status as classes.
    pub class_markers: bool,
    /// Outer replace semantics.
    pub outer_replace: bool,
    /// Root container id.
    pub root_id: String,
    /// Print the document after each inbound message.
    pub print: bool,
}

impl ConnectOptions {
    fn into_config(self, page_url: &str) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let path = self
            .fixed_path
            .map_or(EndpointPath::SamePath, EndpointPath::Fixed);
        let endpoint = Endpoint::from_page(page_url, path)?;

        let reconnect = match self.retry_ms {
            Some(ms) => ReconnectConfig::fixed(Duration::from_millis(ms)),
            None => ReconnectConfig::disabled(),
        };
        let markers = if self.class_markers {
            StatusMarkers::classes()
        } else {
            StatusMarkers::attributes()
        };
        let replace_mode = if self.outer_replace {
            ReplaceMode::Outer
        } else {
            ReplaceMode::Inner
        };

        Ok(ClientConfig::new(endpoint)
            .with_root_id(self.root_id)
            .with_reconnect(reconnect)
            .with_markers(markers)
            .with_replace_mode(replace_mode))
    }
}

/// Runs the connect command until stdin closes.
pub async fn run(page_url: &str, options: ConnectOptions) -> Result<(), Box<dyn std::error::Error>> {
    let print = options.print;
    let config = options.into_config(page_url)?;
    let document = MemoryDocument::new(&config.root_id);
    info!(endpoint = %config.endpoint, "starting session");

    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(read_actions(tx));

    let mut session = Session::new(config, document);
    let mut seen = 0;
    session
        .run_until(&mut rx, |client| {
            let received = client.stats().messages_received;
            if print && received != seen {
                seen = received;
                println!("{}", client.document().to_html());
            }
            false
        })
        .await;

    let stats = session.client().stats();
    info!(
        sent = stats.actions_sent,
        received = stats.messages_received,
        applied = stats.instructions_applied,
        "session ended"
    );
    Ok(())
}

async fn read_actions(tx: mpsc::Sender<Action>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        match parse_action(&line) {
            Ok(Some(action)) => {
                if tx.send(action).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }
}

/// Parses `update <id> <value>` or `press <id>`. Blank lines and `#`
/// comments yield `None`. The value is the rest of the line.
fn parse_action(line: &str) -> Result<Option<Action>, String> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let (id, value) = rest.split_once(' ').unwrap_or((rest.trim_end(), ""));
    if id.is_empty() {
        return Err(format!("missing id in `{line}`"));
    }
    match verb {
        "update" => Ok(Some(Action::update(id, value))),
        "press" => Ok(Some(Action::press(id))),
        other => Err(format!("unknown command `{other}`, expected update or press")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(
            parse_action("update name Alice Smith").unwrap(),
            Some(Action::update("name", "Alice Smith"))
        );
        assert_eq!(parse_action("update name").unwrap(), Some(Action::update("name", "")));
        assert_eq!(parse_action("press go").unwrap(), Some(Action::press("go")));
        assert_eq!(parse_action("  # note").unwrap(), None);
        assert_eq!(parse_action("").unwrap(), None);
        assert!(parse_action("press").is_err());
        assert!(parse_action("jump x").is_err());
    }

    #[test]
    fn options_build_config() {
        let options = ConnectOptions {
            fixed_path: Some("/ws".into()),
            retry_ms: None,
            class_markers: true,
            outer_replace: true,
            root_id: "app".into(),
            print: false,
        };
        let config = options.into_config("https://example.com/page").unwrap();
        assert_eq!(config.endpoint.url(), "wss://example.com/ws");
        assert!(!config.reconnect.enabled);
        assert_eq!(config.markers, StatusMarkers::classes());
        assert_eq!(config.replace_mode, ReplaceMode::Outer);
        assert_eq!(config.root_id, "app");
    }

    #[test]
    fn bad_page_url_is_an_error() {
        let options = ConnectOptions {
            fixed_path: None,
            retry_ms: Some(1000),
            class_markers: false,
            outer_replace: false,
            root_id: "root".into(),
            print: false,
        };
        assert!(options.into_config("ftp://example.com").is_err());
    }
}
