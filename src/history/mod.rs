//! Browser history subsystem.
//!
//! # Data Flow
//! ```text
//! Programmatic navigate on a root:
//!     → sync.rs fan_out (other roots of the same mode)
//!     → commit → sync.rs publish → push_path / set_hash
//!
//! Browser event (back/forward, hash edit):
//!     → browser.rs listener (one per root)
//!     → sync.rs location() → root transition, no publish
//! ```
//!
//! # Design Decisions
//! - `BrowserNavigation` is the only view of the real browser
//! - `MemoryBrowser` backs tests and headless use

pub mod browser;
pub mod memory;
pub mod sync;

pub use browser::{BrowserNavigation, Listener, Subscription};
pub use memory::MemoryBrowser;
pub use sync::{HistoryMode, HistorySync};
