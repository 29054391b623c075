//! A console chat loop that bridges stdin to a completion endpoint.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use chatline::{AppConfig, ConsoleTransport};
use chatline_core::RouterBuilder;
use chatline_core::store::ConversationStore;
use chatline_openai_gateway::{OpenAIConfigBuilder, OpenAIGateway};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// The sender identity the console loop speaks as.
const SENDER: &str = "console";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "chatline.toml".to_owned());
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load {config_path}: {err}");
            return;
        }
    };

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };

    let mut gateway_config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Some(base_url) = &config.gateway.base_url {
        gateway_config = gateway_config.with_base_url(base_url);
    }
    let gateway = OpenAIGateway::new(gateway_config.build());

    let mut store = ConversationStore::new();
    store.set_message_limit(config.chat.message_limit);

    let (idle_tx, mut idle_rx) = mpsc::unbounded_channel();

    let router = RouterBuilder::new(gateway, ConsoleTransport, config.sampling())
        .with_behavior(config.chat.to_behavior())
        .with_store(store)
        .on_idle(move || {
            idle_tx.send(()).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        router.handle_text(SENDER, line);

        // Spin until the router reports idle, which means the reply (or
        // the fallback) has been printed.
        let mut progress_bar = None;
        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let idle = select! {
                idle = idle_rx.recv() => idle,
                _ = sleep => {
                    continue;
                }
            };

            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            if idle.is_none() {
                return;
            }
            break;
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
