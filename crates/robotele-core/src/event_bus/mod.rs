//! # Event Bus Module
//!
//! Decoupled publish/subscribe between the poll loop and whatever renders
//! the operator panel.
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter and receive events of interest
//! - Supports both sync handlers and async broadcast receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use robotele_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Dashboard]),
//!     |event| println!("{}", event.description()),
//! );
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
