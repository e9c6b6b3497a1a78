//! # Events Module
//!
//! Event-driven progress reporting for scan consumers.
//!
//! ## Design
//! The engine emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress without the
//! engine knowing who is listening.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Scan(ScanEvent::StageCompleted { stage, elapsed_ms }) => {
//!                 println!("{stage} finished in {elapsed_ms}ms")
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! scan::run_scan_with_events(items, &settings, downloads, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
