// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state for the Ledgerdesk console.
//!
//! Inbound frames are classified by [`FrameClassifier`] and appended to the
//! [`ConversationLog`]; operator actions go through the [`ActionDispatcher`],
//! which logs them before sending. [`ConsoleSession`] wires the pieces to a
//! [`ledgerdesk_channel::ConnectionManager`].

pub mod classifier;
pub mod dispatcher;
pub mod log;
pub mod session;

pub use classifier::FrameClassifier;
pub use dispatcher::{ActionDispatcher, Command, Dispatched};
pub use log::{ConversationLog, Transcript};
pub use session::ConsoleSession;
