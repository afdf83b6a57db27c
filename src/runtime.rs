// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Island render engine.
//!
//! The [`Runtime`] turns an [`Island`] into live render roots on a [`Host`].
//! For every render pass it resolves the island's anchors, decodes each
//! anchor's props, optionally preserves the anchor's original markup as the
//! component's children, binds the decoded props to the component, and then
//! either hydrates the anchor or mounts a fresh root into it.
//!
//! # Failure Model
//!
//! Nothing in a render pass is fatal. Missing anchors, ambiguous matches,
//! malformed props, and host failures are logged as warnings and collected
//! into the returned [`RenderReport`]. Each anchor is handled on its own, so a
//! failure on one anchor never stops the next one from being processed.
//!
//! # Root Bookkeeping
//!
//! The runtime remembers the live root of every anchor it bound. Rendering an
//! island again unmounts the previous root of an anchor before mounting a new
//! one, so roots never pile up on the same anchor. Markup preserved for an
//! anchor is captured the first time the anchor is bound and reused on every
//! remount, since by then the anchor only holds what the island rendered.

pub mod anchor;
pub mod bind;
pub mod markup;
pub mod props;

use crate::{
    dom::{Host, HostError},
    island::Island,
    runtime::{
        anchor::AnchorWarning,
        markup::{Node, PreservedMarkup},
        props::{PropsError, PROPS_ATTRIBUTE},
    },
};

use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Execution environment the runtime is placed in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Interactive document, islands get mounted.
    #[default]
    Browser,

    /// Pre-render pass, islands are never mounted.
    Server,
}

impl Environment {
    pub fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }

    pub fn is_browser(self) -> bool {
        matches!(self, Self::Browser)
    }
}

/// Build mode used to pick a default hydration policy for whole passes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Markup was not pre-rendered, mount fresh roots.
    #[default]
    Development,

    /// Markup was pre-rendered, hydrate it.
    Production,
}

impl Mode {
    /// Determine mode from a `NODE_ENV` style value.
    ///
    /// Unset or blank means development, as does the literal "development"
    /// with surrounding whitespace ignored. Anything else means production.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "development") => Self::Development,
            Some(_) => Self::Production,
        }
    }

    /// Determine mode from the `NODE_ENV` environment variable.
    pub fn from_env() -> Self {
        Self::from_node_env(std::env::var("NODE_ENV").ok().as_deref())
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Per-invocation render settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    /// Hydrate instead of mounting fresh roots. Falls back to the island's
    /// own policy when unset.
    pub hydrate: Option<bool>,
}

impl RenderRequest {
    /// Request hydration of existing markup.
    pub fn hydrate() -> Self {
        Self {
            hydrate: Some(true),
        }
    }

    /// Request fresh roots.
    pub fn create() -> Self {
        Self {
            hydrate: Some(false),
        }
    }
}

/// Outcome of a render pass.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Number of anchors that received a fresh root.
    pub created: usize,

    /// Number of anchors that were hydrated.
    pub hydrated: usize,

    /// Number of previous roots unmounted before remounting.
    pub unmounted: usize,

    /// Whether the pass was skipped because of the environment.
    pub skipped: bool,

    /// Non-fatal diagnostics, in the order they were raised.
    pub warnings: Vec<Warning>,
}

impl RenderReport {
    /// Count anchors that ended up with a root.
    pub fn mounted(&self) -> usize {
        self.created + self.hydrated
    }

    fn merge(&mut self, other: RenderReport) {
        self.created += other.created;
        self.hydrated += other.hydrated;
        self.unmounted += other.unmounted;
        self.skipped |= other.skipped;
        self.warnings.extend(other.warnings);
    }
}

/// Island render engine bound to a host.
#[derive(Debug)]
pub struct Runtime<H>
where
    H: Host,
{
    host: H,
    environment: Environment,
    roots: HashMap<H::Element, H::Root>,

    // Original anchor markup, captured on first bind and kept across failed
    // mounts and unmounts.
    preserved: HashMap<H::Element, String>,
}

impl<H> Runtime<H>
where
    H: Host,
{
    /// Construct new runtime for a browser environment.
    pub fn new(host: H) -> Self {
        Self::with_environment(host, Environment::Browser)
    }

    /// Construct new runtime for given environment.
    pub fn with_environment(host: H, environment: Environment) -> Self {
        Self {
            host,
            environment,
            roots: HashMap::new(),
            preserved: HashMap::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Lookup root currently bound to anchor.
    pub fn root_of(&self, anchor: &H::Element) -> Option<&H::Root> {
        self.roots.get(anchor)
    }

    /// Render island into every anchor it resolves to.
    ///
    /// Hydrates when the request says so, or when the request leaves it open
    /// and the island prefers hydration. Mounts fresh roots otherwise.
    #[instrument(skip(self, island), fields(island = island.name()), level = "debug")]
    pub fn render(&mut self, island: &Island, request: RenderRequest) -> RenderReport {
        let mut report = RenderReport::default();
        if self.environment.is_server() {
            debug!("skip render of island {:?} on server", island.name());
            report.skipped = true;
            return report;
        }

        let options = island.options();
        let resolution = anchor::resolve(&self.host, &options.selector, options.multiple);
        report.warnings.extend(resolution.warning.map(Warning::from));

        let hydrate = request.hydrate.unwrap_or(options.should_hydrate);
        for (index, anchor) in resolution.anchors.into_iter().enumerate() {
            // INVARIANT: Bind at most one anchor unless multiple is enabled.
            //   - Do not rely on the resolver having truncated the matches.
            if index > 0 && !options.multiple {
                break;
            }

            if let Err(warning) = self.mount(island, anchor, hydrate, &mut report) {
                warn!("{warning}");
                report.warnings.push(warning);
            }
        }

        info!(
            "rendered island {:?}: {} created, {} hydrated",
            island.name(),
            report.created,
            report.hydrated
        );

        report
    }

    /// Render every island for a build mode.
    ///
    /// Production hydrates pre-rendered markup. Development mounts fresh roots.
    pub fn render_all<'a>(
        &mut self,
        islands: impl IntoIterator<Item = &'a Island>,
        mode: Mode,
    ) -> RenderReport {
        let request = RenderRequest {
            hydrate: Some(mode.is_production()),
        };

        let mut report = RenderReport::default();
        for island in islands {
            report.merge(self.render(island, request));
        }

        report
    }

    /// Unmount every root this runtime bound.
    pub fn unmount_all(&mut self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (anchor, root) in self.roots.drain() {
            debug!("unmount root of {anchor:?}");
            if let Err(error) = self.host.unmount(root) {
                warnings.push(Warning::Host(error));
            }
        }

        warnings
    }

    fn mount(
        &mut self,
        island: &Island,
        anchor: H::Element,
        hydrate: bool,
        report: &mut RenderReport,
    ) -> Result<(), Warning> {
        let options = island.options();
        let raw = self.host.attribute(&anchor, PROPS_ATTRIBUTE);
        let (mut props, invalid) = props::decode_or_default(raw.as_deref());
        if let Some(source) = invalid {
            report.warnings.push(Warning::Props {
                island: island.name().into(),
                source,
            });
        }

        let preserved = if options.keep_children {
            let html = self
                .preserved
                .entry(anchor.clone())
                .or_insert_with(|| self.host.inner_html(&anchor));
            Some(html.clone())
        } else {
            None
        };

        if let Some(html) = preserved {
            props.set_children(Node::Raw(PreservedMarkup::new(html)));
        }

        // INVARIANT: Unmount previous root of anchor before mounting a new one.
        if let Some(root) = self.roots.remove(&anchor) {
            debug!("unmount previous root of {anchor:?}");
            match self.host.unmount(root) {
                Ok(()) => report.unmounted += 1,
                Err(error) => {
                    warn!("{error}");
                    report.warnings.push(Warning::Host(error));
                }
            }
        }

        let component = bind::with_props(island.component().clone(), props);
        let tree = component(&props::Props::new());

        let root = if hydrate {
            let root = self.host.hydrate_root(&anchor, tree)?;
            report.hydrated += 1;
            root
        } else {
            let root = self.host.create_root(&anchor)?;

            // INVARIANT: A created root is either tracked or unmounted again.
            if let Err(error) = self.host.render(&root, tree) {
                if let Err(unmount) = self.host.unmount(root) {
                    warn!("{unmount}");
                    report.warnings.push(Warning::Host(unmount));
                }
                return Err(error.into());
            }

            report.created += 1;
            root
        };

        self.roots.insert(anchor, root);

        Ok(())
    }
}

/// Non-fatal render diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Warning {
    /// Anchor resolution was not clean.
    #[error(transparent)]
    Anchor(#[from] AnchorWarning),

    /// Props of an anchor could not be decoded, empty props were used.
    #[error("could not parse JSON props for island {island:?}")]
    Props {
        island: String,
        #[source]
        source: PropsError,
    },

    /// Host failed to mount, render, or unmount.
    #[error(transparent)]
    Host(#[from] HostError),
}
