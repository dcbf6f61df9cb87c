// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Infolens: AI infographics from plain text, with persistent colorable highlights.
//!
//! The crate is headless at its core: [`workspace::Workspace`] drives the store, the annotation
//! engine and the dialogs, and [`tui`] is one front-end on top of it.

pub mod config;
pub mod export;
pub mod generate;
pub mod model;
pub mod picker;
pub mod render;
pub mod rich_text;
pub mod store;
pub mod tui;
pub mod workspace;

#[cfg(test)]
mod test_support;
