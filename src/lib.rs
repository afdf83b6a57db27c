// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Partial hydration of server rendered pages.
//!
//! An __island__ is an interactive component that owns a few regions of an
//! otherwise static page. Each region is marked by an __anchor__ element
//! carrying a `data-island` attribute naming the island, and optionally a
//! `data-props` attribute holding the component's props as a JSON object.
//!
//! ```text
//! <div data-island="Counter" data-props='{"start": 5}'></div>
//! ```
//!
//! # Runtime
//!
//! [`island::create_island`] describes an island, and the
//! [`runtime::Runtime`] mounts it. Every render pass resolves the island's
//! anchors in a [`dom::Host`], decodes props per anchor, and either hydrates
//! the anchor's existing markup or mounts a fresh root into it. Problems along
//! the way are warnings, never errors, so one broken anchor cannot take down
//! the rest of the page.
//!
//! # Build Tooling
//!
//! The [`build`] driver turns an islands configuration file into bundles:
//! one shared bundle holding common packages, and per island a client bundle,
//! plus a server bundle that pre-renders the island into static markup. The
//! bundler itself is external, see [`bundle::Bundler`].

pub mod build;
pub mod bundle;
pub mod config;
pub mod dom;
pub mod island;
pub mod path;
pub mod prerender;
pub mod runtime;

pub use island::{create_island, Island, IslandOptions};
pub use runtime::{Environment, Mode, RenderReport, RenderRequest, Runtime};
