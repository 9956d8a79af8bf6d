mod device;
mod logging;
mod render;

use chat_core::ClientConfig;
use chat_session::{SessionController, SessionDriver, UserIntent, WsConnector};
use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::device::DeviceClass;
use crate::render::Renderer;

#[derive(Parser)]
#[command(name = "stranger-chat")]
#[command(about = "Chat with a random stranger through a relay")]
#[command(version)]
struct Cli {
    /// Relay websocket URL
    #[arg(long, env = "STRANGER_RELAY_URL")]
    relay_url: Option<String>,

    /// User agent used to pick the layout
    #[arg(long, env = "STRANGER_USER_AGENT")]
    user_agent: Option<String>,

    /// Drop relay echoes of our own messages
    #[arg(long)]
    dedupe_echo: bool,

    /// Join as soon as the shell starts
    #[arg(long)]
    auto_join: bool,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Join,
    End,
    Quit,
    Help,
    Message(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "/join" => Self::Join,
            "/end" => Self::End,
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            _ => Self::Message(line.to_string()),
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".cyan());
    println!("  /join   find a stranger to chat with");
    println!("  /end    end the current chat");
    println!("  /quit   leave");
    println!("{}", "Anything else is sent as a message.".dimmed());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let mut config = ClientConfig::load();
    if let Some(url) = cli.relay_url {
        config.relay_url = url;
    }
    if let Some(user_agent) = cli.user_agent {
        config.user_agent = Some(user_agent);
    }
    if cli.dedupe_echo {
        config.dedupe_own_echo = true;
    }
    // Reject a bad relay URL before the user types anything.
    config.validate()?;

    let device = DeviceClass::from_user_agent(config.user_agent.as_deref().unwrap_or_default());
    tracing::debug!("device class {:?}, relay {}", device, config.relay_url);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(config, WsConnector::new(event_tx));
    let mut updates = controller.subscribe();

    let (intents, intent_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(SessionDriver::new(controller, intent_rx, event_rx).run());

    let mut renderer = Renderer::new(device.layout());
    let printer = tokio::spawn(async move {
        loop {
            let lines = renderer.render(&updates.borrow_and_update());
            for line in lines {
                println!("{}", line.paint());
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    print_help();
    if cli.auto_join {
        intents.send(UserIntent::Join)?;
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = stdin.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Join => intents.send(UserIntent::Join)?,
            Command::End => intents.send(UserIntent::End)?,
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Message(text) => {
                intents.send(UserIntent::Draft(text))?;
                intents.send(UserIntent::SubmitDraft)?;
            }
        }
    }

    intents.send(UserIntent::Teardown)?;
    let controller = driver.await?;
    let exchanged = controller.transcript().len();
    // The printer exits once the snapshot sender goes away.
    drop(controller);
    printer.await?;

    println!("{}", format!("Left after {exchanged} messages.").dimmed());
    Ok(())
}
