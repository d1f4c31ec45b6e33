//! Chrome DevTools Protocol (CDP) client for typist.
//!
//! Connects to a Chromium-family browser started with remote debugging and
//! exposes the handful of commands typist needs: page discovery, flattened
//! target sessions, `Input.insertText` and `Runtime.evaluate`.
//!
//! ## Setup
//!
//! ```bash
//! # Linux
//! google-chrome --remote-debugging-port=9222
//!
//! # macOS
//! /Applications/Google\ Chrome.app/Contents/MacOS/Google\ Chrome --remote-debugging-port=9222
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let page = client.active_page().await?.expect("a page is open");
//! let session = client.attach_to_target(&page.id).await?;
//! client.insert_text(&session, "hello").await?;
//! client.detach_from_target(&session).await?;
//! ```

mod client;
mod error;
mod protocol;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
