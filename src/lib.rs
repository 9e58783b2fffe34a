// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

pub mod chat;
pub mod completion;
pub mod config;
pub mod context;
pub mod proxy;
pub mod stream;
pub mod upstream;
