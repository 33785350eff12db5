use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use nexus_stream::{AgentSession, RejectReason, SendOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{ChatArgs, Cli};
use crate::config::CliConfig;
use crate::render::TerminalObserver;

const DEFAULT_EXPORT_PATH: &str = "conversation.md";

#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Empty,
    Message(String),
    Help,
    Clear,
    Retry,
    Export(PathBuf),
    Exit,
    Unknown(String),
}

impl ChatInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatInput::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ChatInput::Message(line.to_string());
        };

        let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
        match name {
            "help" => ChatInput::Help,
            "clear" | "new" => ChatInput::Clear,
            "retry" => ChatInput::Retry,
            "export" => {
                let path = rest.trim();
                ChatInput::Export(PathBuf::from(if path.is_empty() {
                    DEFAULT_EXPORT_PATH
                } else {
                    path
                }))
            }
            "exit" | "quit" => ChatInput::Exit,
            _ => ChatInput::Unknown(name.to_string()),
        }
    }
}

pub async fn run(cli: &Cli, config: &CliConfig, args: ChatArgs) -> Result<()> {
    let session_config = config.session_config(cli, args.conversation);
    let observer = Arc::new(TerminalObserver::new(cli.format, args.show_thinking));
    let session = AgentSession::http(session_config, observer)?;

    println!(
        "{} {} {}",
        "nexus".bold(),
        "agent:".dimmed(),
        session.config().agent_id.cyan()
    );
    println!("{}", "Type /help for commands, /exit or Ctrl-D to quit.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match ChatInput::parse(&line) {
            ChatInput::Empty => {}
            ChatInput::Exit => break,
            ChatInput::Help => print_help(),
            ChatInput::Clear => {
                session.clear_messages();
                println!("{}", "Started a new conversation.".dimmed());
            }
            ChatInput::Retry => report(super::drive(session.retry()).await),
            ChatInput::Export(path) => export(&session, &path),
            ChatInput::Unknown(name) => {
                println!("{} /{} (try /help)", "Unknown command:".yellow(), name);
            }
            ChatInput::Message(text) => report(super::drive(session.send_message(text)).await),
        }
    }

    Ok(())
}

fn report(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Completed => {}
        SendOutcome::Cancelled => println!("\n{}", "Cancelled.".yellow()),
        SendOutcome::Rejected(RejectReason::NothingToRetry) => {
            println!("{}", "Nothing to retry.".yellow());
        }
        SendOutcome::Rejected(reason) => {
            println!("{} {:?}", "Message rejected:".yellow(), reason);
        }
        SendOutcome::Failed(err) => {
            eprintln!("\n{} {}", "Error:".red().bold(), err);
            if err.retryable {
                eprintln!("  {} to send the message again.", "/retry".bold());
            }
        }
    }
}

fn export(session: &AgentSession, path: &PathBuf) {
    let markdown = session.snapshot().export_markdown();
    match std::fs::write(path, markdown) {
        Ok(()) => println!("{} {}", "Exported to".dimmed(), path.display()),
        Err(e) => eprintln!("{} {}: {}", "Export failed:".red(), path.display(), e),
    }
}

fn print_help() {
    println!("  /clear         start a new conversation");
    println!("  /retry         resend the last message");
    println!("  /export [path] save the transcript as Markdown");
    println!("  /exit          quit");
    println!("  Ctrl-C         cancel a streaming reply");
}
