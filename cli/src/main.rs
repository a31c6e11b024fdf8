use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use events::{ClientEvent, Position, RoomObject, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use replica::{CanvasSession, ConnectionStatus};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("health check returned HTTP {0}")]
    Unhealthy(u16),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("event decode failed: {0}")]
    Decode(#[from] events::CodecError),
    #[error("timed out waiting for websocket event")]
    Timeout,
    #[error("invalid object JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("object JSON must be an object with a `type` field")]
    InvalidObject,
}

#[derive(Parser, Debug)]
#[command(name = "roomsync-cli", about = "roomsync websocket CLI")]
struct Cli {
    #[arg(long, env = "ROOMSYNC_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Health-check the server.
    Ping,
    /// Join a room and mirror its event stream to stdout.
    Watch(WatchArgs),
    Object(ObjectCommand),
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, env = "ROOMSYNC_ROOM_ID")]
    room_id: String,
}

#[derive(Args, Debug)]
struct ObjectCommand {
    #[command(subcommand)]
    command: ObjectSubcommand,
}

#[derive(Subcommand, Debug)]
enum ObjectSubcommand {
    /// Create an object in a room.
    Create {
        #[arg(long)]
        room_id: String,
        #[arg(long, help = r#"Object JSON, e.g. '{"type":"sticky","x":0,"y":0}'"#)]
        data: String,
    },
    /// Move an object to an absolute position.
    Move {
        #[arg(long)]
        room_id: String,
        #[arg(long)]
        object_id: String,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    /// Delete an object.
    Delete {
        #[arg(long)]
        room_id: String,
        #[arg(long)]
        object_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => run_ping(&cli.base_url).await,
        Command::Watch(args) => run_watch(&cli.base_url, &args.room_id).await,
        Command::Object(object) => run_object(&cli.base_url, object).await,
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

async fn run_watch(base_url: &str, room_id: &str) -> Result<(), CliError> {
    let mut stream = connect_ws(base_url).await?;
    let mut session = CanvasSession::new();
    session.set_status(ConnectionStatus::Connected);

    send_event(&mut stream, &session.join_room(room_id)).await?;

    loop {
        let event = recv_next(&mut stream, Duration::from_secs(600)).await?;
        session.apply_server(event.clone());
        print_event(&session, &event);
    }
}

async fn run_object(base_url: &str, object: ObjectCommand) -> Result<(), CliError> {
    match object.command {
        ObjectSubcommand::Create { room_id, data } => {
            let object = parse_object_json(&data)?;
            let id = object.id.clone();
            with_joined_room(base_url, &room_id, ClientEvent::CreateObject(object)).await?;
            println!("created {id}");
            Ok(())
        }
        ObjectSubcommand::Move { room_id, object_id, x, y } => {
            let event = ClientEvent::UpdateObject {
                object_id: object_id.clone(),
                position: Position { x, y },
            };
            with_joined_room(base_url, &room_id, event).await?;
            println!("moved {object_id} to ({x}, {y})");
            Ok(())
        }
        ObjectSubcommand::Delete { room_id, object_id } => {
            let event = ClientEvent::DeleteObject { object_id: object_id.clone() };
            with_joined_room(base_url, &room_id, event).await?;
            println!("deleted {object_id}");
            Ok(())
        }
    }
}

/// Connect, join the room, wait for the `room_state` checkpoint, send one
/// event, and close. The protocol is fire-and-forget: there is no ack to
/// wait for beyond the join reply.
async fn with_joined_room(
    base_url: &str,
    room_id: &str,
    event: ClientEvent,
) -> Result<(), CliError> {
    let mut stream = connect_ws(base_url).await?;

    send_event(&mut stream, &ClientEvent::JoinRoom { room_id: room_id.to_owned() }).await?;
    wait_for_room_state(&mut stream).await?;

    send_event(&mut stream, &event).await?;
    let _ = stream.close(None).await;
    Ok(())
}

async fn connect_ws(base_url: &str) -> Result<WsStream, CliError> {
    let url = ws_url(base_url)?;
    let (stream, _) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;
    Ok(stream)
}

fn ws_url(base_url: &str) -> Result<String, CliError> {
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/ws"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/ws"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

async fn send_event(stream: &mut WsStream, event: &ClientEvent) -> Result<(), CliError> {
    stream
        .send(Message::Text(events::encode_event(event).into()))
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))
}

async fn wait_for_room_state(stream: &mut WsStream) -> Result<Vec<RoomObject>, CliError> {
    loop {
        let event = recv_next(stream, Duration::from_secs(5)).await?;
        if let ServerEvent::RoomState(objects) = event {
            return Ok(objects);
        }
    }
}

async fn recv_next(stream: &mut WsStream, timeout: Duration) -> Result<ServerEvent, CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
                Message::Text(text) => {
                    return events::decode_server_event(&text).map_err(CliError::from);
                }
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| CliError::Timeout)?
}

fn print_event(session: &CanvasSession, event: &ServerEvent) {
    match event {
        ServerEvent::RoomState(objects) => {
            println!("room_state: {} objects", objects.len());
        }
        ServerEvent::ObjectCreated(object) => {
            println!(
                "object_created: {} type={} at ({}, {}) [{} total]",
                object.id,
                object.kind,
                object.x,
                object.y,
                session.objects().len()
            );
        }
        ServerEvent::ObjectUpdated { object_id, position } => {
            println!("object_updated: {object_id} -> ({}, {})", position.x, position.y);
        }
        ServerEvent::ObjectDeleted { object_id } => {
            println!("object_deleted: {object_id} [{} total]", session.objects().len());
        }
        ServerEvent::CursorMoved { client_id, x, y } => {
            println!("cursor_moved: {client_id} at ({x}, {y})");
        }
        ServerEvent::PeerLeft { client_id } => {
            println!("peer_left: {client_id}");
        }
    }
}

/// Parse an object payload from the command line. Mints a fresh id when
/// the JSON does not carry one.
fn parse_object_json(data: &str) -> Result<RoomObject, CliError> {
    let mut value: Value = serde_json::from_str(data)?;
    let map = value.as_object_mut().ok_or(CliError::InvalidObject)?;

    if !map.contains_key("type") {
        return Err(CliError::InvalidObject);
    }
    if !map.contains_key("id") {
        map.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
    }
    map.entry("x").or_insert(Value::from(0.0));
    map.entry("y").or_insert(Value::from(0.0));

    Ok(serde_json::from_value(value)?)
}
