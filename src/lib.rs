//! `exportmail` — send a batch of exported images to the default mail client.
//!
//! A [`Batch`](export::Batch) accumulates the files written by an export
//! job. When the job is done the batch is finalized: the desktop's mail
//! client is detected, a message listing every image is composed for that
//! client and handed to the environment as a `mailto:` URI or a command.

pub mod compose;
pub mod config;
pub mod error;
pub mod export;
pub mod job;
pub mod launch;
pub mod mailer;
pub mod metadata;
pub mod model;
pub mod profile;
