//! callbell: call-state notifications for chat.
//!
//! Listens to a FreeSWITCH-style event socket, classifies call-state
//! events, and posts short notifications to a Mattermost-compatible
//! incoming webhook for the caller, the callee, and optionally a shared
//! panel channel.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod directory;
pub mod esl;
pub mod event;
pub mod listener;
pub mod logging;
pub mod message;
pub mod router;
pub mod webhook;
