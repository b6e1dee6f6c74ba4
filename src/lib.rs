//! Study and quiz backend: timed quiz sessions with scoring and attempt history,
//! plus flashcard deck reviews, served over HTTP and WebSocket.

pub mod answers;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod flashcards;
pub mod live;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod scoring;
pub mod seeds;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod timer;
pub mod util;
