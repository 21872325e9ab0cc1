//! Livesync Patcher: rewrites packaged app platform trees so that a
//! live-reloading development server can serve their web assets.
//!
//! For each enabled platform (`android`, `ios`, `browser`, `windows`,
//! `electron`) the patcher locates well-known files under the platform's web
//! root or config root and rewrites them in place:
//!
//! - a generated start page next to every `index.html`, which forwards to the
//!   first reachable live server;
//! - `config.xml`, `manifest.json`, `*.appxmanifest` and `cdv-electron-main.js`
//!   pointed at that start page;
//! - `*Info.plist` allowing plain-HTTP loads;
//! - each page's Content-Security-Policy relaxed for the live server.
//!
//! # Architecture
//!
//! Every operation goes through one loop: [`FileLocator`] finds targets, an
//! explicitly chosen [`Format`](format::Format) parses them, the operation
//! mutates the document, and the bytes are written back atomically only when
//! they changed. Markup and script rewrites compile down to a verified
//! byte-span [`Edit`], so bytes outside the patched span are preserved.
//!
//! # Example
//!
//! ```no_run
//! use livesync_patcher::{PatchOptions, Patcher, Platform};
//!
//! let mut patcher = Patcher::new("my-app", [Platform::Android, Platform::Ios]);
//! patcher.prepatch()?;
//!
//! let options = PatchOptions::default().with_server("local", "http://localhost:3000");
//! let report = patcher.patch(&options)?;
//! println!("{} files patched", report.applied());
//! # Ok::<(), livesync_patcher::PatchError>(())
//! ```

pub mod config;
pub mod csp;
pub mod edit;
pub mod events;
pub mod format;
pub mod locator;
pub mod ops;
pub mod patcher;
pub mod platform;
pub mod safety;

// Re-exports
pub use config::{
    load_from_path, load_from_str, ConfigError, PatchOptions, PatcherConfig, ServerMap,
};
pub use csp::Policy;
pub use edit::{Edit, EditError, EditVerification};
pub use events::{EventKind, ListenerId, PatchEvent};
pub use format::FormatError;
pub use locator::{FileLocator, FilePattern, LocateError, PatchTarget};
pub use ops::{Operation, PatchError, PatchOutcome, PatchReport, PatchStatus};
pub use patcher::Patcher;
pub use platform::{Platform, RootKind, UnknownPlatform, DEFAULT_PLATFORMS, START_PAGE};
pub use safety::{PathGuard, SafetyError};
