//! Client library for the Rocket.Chat REST and realtime APIs.
//!
//! Two halves share one login session:
//! - [`rest::RestClient`] — request/response calls (`login`, `chat.postMessage`,
//!   `me`, `channels.list`, thread listing, arbitrary GET/POST);
//! - [`realtime::RealtimeSession`] — the persistent websocket: connect/login
//!   handshake, `stream-room-messages` subscriptions, keepalive handling and
//!   ad-hoc method calls, all serviced by a single background reader task.
//!
//! [`RocketChatClient`] ties the halves together and carries the
//! `initialize`/`cleanup` lifecycle for the hosting application.

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod realtime;
pub mod rest;
pub mod session;
pub mod transport;

pub use client::RocketChatClient;
pub use config::{ClientConfig, Credentials};
pub use error::ClientError;
pub use realtime::{Phase, RealtimeSession};
pub use rest::{RequestType, RestClient};
