//! Session object
//!
//! Replaces the teacher's process-wide mutable state (active layout,
//! include-argument list, programmer handle, verbosity) with a single
//! object passed by reference. The big lock and powerd interlock become a
//! scoped acquisition tied to the `Session`'s lifetime.

use std::path::Path;

use rflasher_core::layout::{Layout, LayoutSource};

use crate::error::{SessionError, SessionResult};
use crate::handle::FlashHandle;
use crate::lock::ProcessEnvelope;

/// One `name` or `name:file` include argument, as accepted after `--image`.
#[derive(Debug, Clone)]
pub struct IncludeArg {
    /// Region name to include.
    pub name: String,
    /// Optional file providing this region's contents.
    pub file: Option<String>,
}

impl IncludeArg {
    /// Parse a `name` or `name:file` argument.
    pub fn parse(spec: &str) -> SessionResult<Self> {
        match spec.split_once(':') {
            Some((name, file)) if !name.is_empty() => Ok(Self {
                name: name.to_string(),
                file: Some(file.to_string()),
            }),
            Some(_) => Err(SessionError::argument(format!(
                "invalid --image argument '{}': empty region name",
                spec
            ))),
            None => Ok(Self {
                name: spec.to_string(),
                file: None,
            }),
        }
    }
}

/// The live state of one CLI invocation: the open programmer/chip handle,
/// the resolved layout (if any), the include-argument list, and the
/// process-wide lock, all scoped to this object's lifetime.
pub struct Session {
    /// The open flash handle (programmer + probed chip).
    pub handle: FlashHandle,
    /// The resolved layout, if a layout file was given or an FMAP was
    /// found on the device.
    pub layout: Option<Layout>,
    /// Parsed `--image` arguments, in command-line order.
    pub includes: Vec<IncludeArg>,
    /// Number of times `--verbose` was repeated.
    pub verbosity: u8,
    /// `--force` was given.
    pub force: bool,
    /// The held process-wide lock (big lock + powerd interlock), released
    /// when the session is dropped.
    _envelope: ProcessEnvelope,
}

impl Session {
    /// Acquire the process envelope and open the given programmer,
    /// returning a session ready for layout resolution and region ops.
    ///
    /// `ignore_lock` suppresses both lock acquisition and release, for
    /// diagnostic use.
    pub fn open(
        programmer: &str,
        db: &rflasher_core::chip::ChipDatabase,
        ignore_lock: bool,
    ) -> SessionResult<Self> {
        let envelope = if ignore_lock {
            ProcessEnvelope::disabled()
        } else {
            ProcessEnvelope::acquire(
                crate::lock::DEFAULT_LOCK_PATH,
                crate::lock::DEFAULT_POWERD_LOCK_DIR,
                crate::lock::DEFAULT_LOCK_TIMEOUT,
            )?
        };

        let handle = crate::registry::open_flash(programmer, db)
            .map_err(|e| SessionError::TransportError(e.to_string()))?;

        Ok(Self {
            handle,
            layout: None,
            includes: Vec::new(),
            verbosity: 0,
            force: false,
            _envelope: envelope,
        })
    }

    /// Load a layout from a text `start:end name` file, replacing any
    /// layout already attached to this session.
    pub fn load_layout_file(&mut self, path: impl AsRef<Path>) -> SessionResult<()> {
        let layout = Layout::from_text_file(path)?;
        self.layout = Some(layout);
        Ok(())
    }

    /// Discover a layout via FMAP, unless a layout file was already loaded
    /// (a layout file takes precedence over FMAP per the planner's
    /// processing order) or `ignore_fmap` is set.
    pub fn discover_fmap(&mut self, ignore_fmap: bool) -> SessionResult<()> {
        if ignore_fmap || self.layout.is_some() {
            return Ok(());
        }
        match self.handle.read_fmap() {
            Ok(layout) => {
                self.layout = Some(layout);
                Ok(())
            }
            // FMAP discovery failure is not fatal: the caller proceeds
            // without a layout (spec §4.4).
            Err(_) => Ok(()),
        }
    }

    /// Record a parsed `--image` argument and resolve it against the
    /// current layout, rejecting duplicate region names.
    pub fn add_include(&mut self, spec: &str) -> SessionResult<()> {
        let include = IncludeArg::parse(spec)?;
        if self.includes.iter().any(|i| i.name == include.name) {
            return Err(SessionError::argument(format!(
                "duplicate --image region '{}'",
                include.name
            )));
        }

        let layout = self
            .layout
            .as_mut()
            .ok_or_else(|| SessionError::not_found("no layout loaded for --image"))?;
        layout
            .include_region(&include.name)
            .map_err(|_| SessionError::not_found(format!("region '{}' not found", include.name)))?;

        self.includes.push(include);
        Ok(())
    }

    /// Validate that no two included regions overlap.
    pub fn validate_includes(&self) -> SessionResult<()> {
        let Some(layout) = &self.layout else {
            return Ok(());
        };
        let included: Vec<_> = layout.included_regions().collect();
        for (i, r1) in included.iter().enumerate() {
            for r2 in included.iter().skip(i + 1) {
                if r1.overlaps(r2) {
                    return Err(SessionError::ambiguous(format!(
                        "included regions '{}' and '{}' overlap",
                        r1.name, r2.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up the file associated with an included region's name, if any.
    pub fn include_file(&self, region_name: &str) -> Option<&str> {
        self.includes
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(region_name))
            .and_then(|i| i.file.as_deref())
    }

    /// The layout, constructing an empty one if none has been resolved.
    pub fn layout_or_empty(&self) -> Layout {
        self.layout
            .clone()
            .unwrap_or_else(|| Layout::with_source(LayoutSource::Manual))
    }
}
