//! Environment bootstrapping.
//!
//! An [`EnvironmentFactory`] builds an emulated document bound to a URL,
//! seeded with [`BASE_HTML`], and loads the assembled scripts in order before
//! resolving. The resulting [`Window`] is the handle the setup hook, the test
//! engine and the coverage aggregator work against.

use crate::assembler::AssembledScripts;
use crate::console::HostConsole;
use crate::result::{HarnessError, HarnessResult};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Body the document starts with
pub const BASE_HTML: &str = "<div></div>";

/// Global the instrumented sources publish their counters on
pub const COVERAGE_GLOBAL: &str = "__coverage__";

/// Event fired once the document is set up
pub const DOM_CONTENT_LOADED: &str = "DOMContentLoaded";

/// Console method a message was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
    /// `console.debug`
    Debug,
}

/// Who produced a console message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Scripts running in the document
    Application,
    /// The emulation engine itself
    Environment,
}

/// Message emitted inside the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    /// Console method
    pub level: ConsoleLevel,
    /// Producer
    pub origin: MessageOrigin,
    /// Rendered text
    pub text: String,
}

impl ConsoleMessage {
    /// Message written by an application script
    #[must_use]
    pub fn application(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            origin: MessageOrigin::Application,
            text: text.into(),
        }
    }

    /// Internal error reported by the emulation
    #[must_use]
    pub fn environment(text: impl Into<String>) -> Self {
        Self {
            level: ConsoleLevel::Error,
            origin: MessageOrigin::Environment,
            text: text.into(),
        }
    }
}

/// Routes document console output to the host console.
///
/// Application output is forwarded; the emulation's own error chatter is
/// dropped.
#[derive(Clone)]
pub struct VirtualConsole {
    host: Arc<dyn HostConsole>,
}

impl Debug for VirtualConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualConsole").field("host", &self.host).finish()
    }
}

impl VirtualConsole {
    /// Forward to `host`
    #[must_use]
    pub fn new(host: Arc<dyn HostConsole>) -> Self {
        Self { host }
    }

    /// Emit a message; returns whether it reached the host console
    pub fn emit(&self, message: &ConsoleMessage) -> bool {
        if message.origin == MessageOrigin::Environment {
            tracing::debug!(text = %message.text, "dropped environment console message");
            return false;
        }
        match message.level {
            ConsoleLevel::Warn | ConsoleLevel::Error => self.host.error(&message.text),
            ConsoleLevel::Log | ConsoleLevel::Info | ConsoleLevel::Debug => {
                self.host.log(&message.text);
            }
        }
        true
    }
}

/// Synthetic DOM event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event type
    pub kind: String,
    /// Whether the event bubbles
    pub bubbles: bool,
    /// Whether the event is cancelable
    pub cancelable: bool,
}

impl DomEvent {
    /// `DOMContentLoaded`, bubbling and cancelable
    #[must_use]
    pub fn dom_content_loaded() -> Self {
        Self {
            kind: DOM_CONTENT_LOADED.to_string(),
            bubbles: true,
            cancelable: true,
        }
    }
}

/// Non-fatal error raised while loading a script into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// Index in the assembled script list, when known
    pub index: Option<usize>,
    /// Error message
    pub message: String,
}

impl ScriptError {
    /// Create a script error
    #[must_use]
    pub fn new(index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "script #{i}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Everything needed to construct a document
#[derive(Debug, Clone)]
pub struct EnvironmentRequest {
    /// URL the document is bound to
    pub url: String,
    /// Initial body markup
    pub html: String,
    /// Scripts to load, in order, before resolving
    pub scripts: AssembledScripts,
    /// Console routing for the document
    pub console: VirtualConsole,
}

/// Global scope handle of a constructed document
pub trait Window: Debug + Send + Sync {
    /// URL the document is bound to
    fn url(&self) -> &str;

    /// Read a global as JSON, if defined
    fn global(&self, name: &str) -> Option<serde_json::Value>;

    /// Define or replace a global
    fn set_global(&mut self, name: &str, value: serde_json::Value);

    /// Dispatch an event on the document
    fn dispatch_event(&mut self, event: &DomEvent) -> HarnessResult<()>;
}

/// A constructed document and the non-fatal errors of loading it
#[derive(Debug)]
pub struct LoadedDocument {
    /// Window handle
    pub window: Box<dyn Window>,
    /// Script load errors; they do not stop the run
    pub script_errors: Vec<ScriptError>,
}

/// Builds emulated documents
#[async_trait]
pub trait EnvironmentFactory: Debug + Send + Sync {
    /// Construct the document and load every script.
    ///
    /// An `Err` means no usable document exists (for example an unreachable
    /// URL resource).
    async fn create(&self, request: EnvironmentRequest) -> HarnessResult<LoadedDocument>;
}

/// Construct the document for a run.
///
/// Failures of any kind are reported as [`HarnessError::Environment`].
pub async fn bootstrap(
    factory: &dyn EnvironmentFactory,
    request: EnvironmentRequest,
) -> HarnessResult<LoadedDocument> {
    let url = request.url.clone();
    tracing::debug!(%url, scripts = request.scripts.len(), "constructing environment");

    let document = factory.create(request).await.map_err(|e| match e {
        HarnessError::Environment { .. } => e,
        other => HarnessError::Environment {
            url: url.clone(),
            message: other.to_string(),
        },
    })?;

    for error in &document.script_errors {
        tracing::warn!(%url, %error, "script error while loading document");
    }
    Ok(document)
}

/// Raise the ready signal the emulation does not fire by itself
pub fn signal_ready(window: &mut dyn Window) -> HarnessResult<()> {
    tracing::debug!(url = window.url(), "dispatching {DOM_CONTENT_LOADED}");
    window.dispatch_event(&DomEvent::dom_content_loaded())
}
