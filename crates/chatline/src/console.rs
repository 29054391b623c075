use async_trait::async_trait;
use chatline_core::transport::{Transport, TransportError};
use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";

/// A transport that prints replies to the terminal.
///
/// Stands in for a real messaging client during local runs: inbound
/// messages come from stdin (driven by the CLI loop) and outbound
/// replies are printed, whoever the recipient is.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(
        &self,
        _recipient: &str,
        text: &str,
    ) -> Result<(), TransportError> {
        println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
        Ok(())
    }
}
