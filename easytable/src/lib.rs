// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
pub mod config;
pub mod llm;
pub mod relay;
pub mod stream;
