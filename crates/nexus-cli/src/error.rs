use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("invalid configuration") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the endpoint and agent id with:");
        eprintln!("  {} nexus config show", "$".dimmed());
    }

    if msg.contains("connection refused") || msg.contains("error sending request") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Make sure the agent server is running and reachable.");
    }

    if msg.contains("unauthorized") || msg.contains("http 401") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your API key with:");
        eprintln!("  {} export NEXUS_API_KEY=<value>", "$".dimmed());
    }

    std::process::exit(1);
}
