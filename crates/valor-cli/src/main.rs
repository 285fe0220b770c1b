use clap::Parser;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use valor_cli::client::{ClientError, ValorClient};
use valor_cli::command::Input;

const GREETING: &str =
    "Hello Commander. I am Valor, your loyal AI assistant. How may I assist you today?";

#[derive(Parser)]
#[command(name = "valor")]
#[command(about = "Chat with a running Valor server from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the Valor server
    #[arg(long, default_value = "http://localhost:8080")]
    server: String,

    /// Conversation to continue
    #[arg(long, default_value = "default")]
    user_id: String,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = ValorClient::new(&cli.server, &cli.user_id)?;
    let mut rl = DefaultEditor::new()?;

    print_welcome();

    loop {
        let line = match rl.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match Input::parse(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Help => print_help(),
            Input::Clear => match client.clear().await {
                Ok(()) => {
                    println!("{}", "Conversation cleared.".yellow());
                    println!("Valor: {GREETING}");
                }
                Err(e) => eprintln!("{} {e}", "Error clearing conversation:".red()),
            },
            Input::Unknown(cmd) => {
                println!("Unknown command: {cmd}");
                println!("Type /help for available commands");
            }
            Input::Message(message) => {
                let _ = rl.add_history_entry(message);
                println!("{}", "Valor is thinking...".yellow());
                match client.ask(message).await {
                    Ok(reply) => println!("{}", format!("Valor: {reply}").cyan()),
                    Err(e) => report(&e),
                }
            }
        }
    }

    println!("{}", "Exiting Valor CLI. Goodbye, Commander.".yellow());
    Ok(())
}

fn print_welcome() {
    println!("{}", "Valor AI".cyan().bold());
    println!(
        "{}",
        "Command Line Interface - Type your messages to chat with Valor.".green()
    );
    print_help();
    println!();
    println!("Valor: {GREETING}");
}

fn print_help() {
    println!("{}", "Commands: /clear - Clear conversation, /exit - Exit Valor CLI".green());
}

fn report(error: &ClientError) {
    eprintln!("{}", error.to_string().red());
    let apology = match error {
        ClientError::Transport(_) => "There seems to be a network issue.",
        _ => "I encountered an error processing your request.",
    };
    println!("{}", format!("Valor: I apologize, Commander. {apology}").red());
}
