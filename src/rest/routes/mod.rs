// SPDX-License-Identifier: MIT
pub mod health;
pub mod metrics;
pub mod poll;
pub mod status;
pub mod webhook;
