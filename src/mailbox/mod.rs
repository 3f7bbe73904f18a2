// SPDX-License-Identifier: MIT
// Mailbox subsystem — the core of hookd.
//
// Exposes:
//   - store     — MailboxStore, Payload, MailboxSnapshot (single-slot state)
//   - normalize — content-type driven payload canonicalization

pub mod normalize;
pub mod store;

pub use normalize::normalize;
pub use store::{MailboxSnapshot, MailboxStore, Payload};
