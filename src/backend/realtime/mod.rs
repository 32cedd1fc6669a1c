//! Real-time Delivery Module
//!
//! Process-wide state shared by every chat session: which connections
//! exist, which rooms they joined, and which users are online.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── rooms.rs     - Connection registry and room fan-out
//! ├── presence.rs  - User to connection-set registry
//! └── broadcast.rs - Debounced online-list broadcasting
//! ```
//!
//! # Delivery Model
//!
//! Each connection owns a bounded `mpsc` queue drained by its socket writer
//! task. Events sent to one connection arrive in the order they were sent.
//! A slow client loses events rather than stalling the sender.

pub mod broadcast;
pub mod presence;
pub mod rooms;

pub use broadcast::{Debouncer, PresenceBroadcaster};
pub use presence::PresenceRegistry;
pub use rooms::{ConnectionId, EventReceiver, Room, RoomHub};
