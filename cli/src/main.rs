use std::time::Duration;

use clap::{Parser, Subcommand};
use rocketchat_client::{ClientError, RocketChatClient};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(
        "missing credentials; pass --auth-token or --username/--password \
         (or set ROCKETCHAT_AUTH_TOKEN / ROCKETCHAT_USERNAME / ROCKETCHAT_PASSWORD)"
    )]
    MissingCredentials,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid JSON params: {0}")]
    InvalidParams(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "rocketchat-cli", about = "Rocket.Chat REST and realtime CLI")]
struct Cli {
    /// Host address without scheme, e.g. open.rocket.chat
    #[arg(long, env = "ROCKETCHAT_HOST")]
    host: String,

    #[arg(long, env = "ROCKETCHAT_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ROCKETCHAT_PASSWORD")]
    password: Option<String>,

    /// Resume token; takes precedence over username/password.
    #[arg(long, env = "ROCKETCHAT_AUTH_TOKEN")]
    auth_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the session token for later --auth-token use.
    Login,
    /// Post a message to a room id, #channel or @username.
    Post { channel: String, text: String },
    /// Print the logged-in user's profile.
    Me,
    /// List visible channels.
    Channels,
    /// List the threads of one channel.
    Threads { room_id: String },
    /// Stream a room's messages until Ctrl-C.
    Subscribe {
        room_id: String,
        /// Correlation id for the subscription; random when omitted.
        #[arg(long)]
        id: Option<String>,
    },
    /// Call an arbitrary realtime method and print the reply frame.
    Call {
        method: String,
        /// Method params as a JSON array.
        #[arg(long, default_value = "[]")]
        params: String,
        /// Correlation id for the call; random when omitted.
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = build_client(&cli)?;
    client.initialize()?;

    let result = run(&client, cli.command).await;
    client.cleanup().await;
    result
}

fn build_client(cli: &Cli) -> Result<RocketChatClient, CliError> {
    if let Some(token) = &cli.auth_token {
        return Ok(RocketChatClient::with_token(&cli.host, token));
    }
    match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => {
            Ok(RocketChatClient::with_password(&cli.host, username, password))
        }
        _ => Err(CliError::MissingCredentials),
    }
}

async fn run(client: &RocketChatClient, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login => {
            let response = client.login().await?;
            print_json(&response)?;
            if let Some(token) = client.auth_token() {
                eprintln!("auth token: {token}");
            }
            Ok(())
        }
        Command::Post { channel, text } => {
            login_if_needed(client).await?;
            print_json(&client.post_message(&channel, &text).await?)
        }
        Command::Me => {
            login_if_needed(client).await?;
            print_json(&client.rest().me().await?)
        }
        Command::Channels => {
            login_if_needed(client).await?;
            print_json(&client.rest().channel_list().await?)
        }
        Command::Threads { room_id } => {
            login_if_needed(client).await?;
            print_json(&client.rest().channel_threads(&room_id).await?)
        }
        Command::Subscribe { room_id, id } => {
            let correlation_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            client.subscribe_room_messages(&room_id, &correlation_id).await?;
            eprintln!("subscribed to {room_id} as {correlation_id}; Ctrl-C to stop");

            let mut printed = 0;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    () = tokio::time::sleep(Duration::from_millis(200)) => {
                        let messages = client.streamed_messages();
                        for message in &messages[printed..] {
                            println!("{message}");
                        }
                        printed = messages.len();
                    }
                }
            }

            // Best effort: the server may already have dropped the socket.
            if let Err(error) = client.unsubscribe_room_messages(&correlation_id).await {
                eprintln!("unsubscribe: {error}");
            }
            Ok(())
        }
        Command::Call { method, params, id } => {
            let correlation_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let params: Value = serde_json::from_str(&params)?;
            let reply = client
                .realtime()
                .call_method(&correlation_id, &method, params)
                .await?;
            println!("{reply}");
            Ok(())
        }
    }
}

/// REST calls need the auth headers; log in first unless both are known.
async fn login_if_needed(client: &RocketChatClient) -> Result<(), CliError> {
    if client.auth_token().is_none() || client.user_id().is_none() {
        client.login().await?;
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
