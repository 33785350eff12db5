use std::sync::Arc;

use anyhow::{Result, bail};
use nexus_stream::{AgentSession, RejectReason, SendOutcome};

use crate::cli::{Cli, SendArgs};
use crate::config::CliConfig;
use crate::render::TerminalObserver;

pub async fn run(cli: &Cli, config: &CliConfig, args: SendArgs) -> Result<()> {
    let session_config = config.session_config(cli, args.conversation);
    let observer = Arc::new(TerminalObserver::new(cli.format, args.show_thinking));
    let session = AgentSession::http(session_config, observer)?;

    let text = args.message.join(" ");
    match super::drive(session.send_message(text)).await {
        SendOutcome::Completed => Ok(()),
        SendOutcome::Cancelled => bail!("Cancelled"),
        SendOutcome::Rejected(RejectReason::EmptyMessage) => bail!("Message is empty"),
        SendOutcome::Rejected(reason) => bail!("Message rejected: {:?}", reason),
        SendOutcome::Failed(err) => bail!("{}", err),
    }
}
