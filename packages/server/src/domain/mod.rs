//! Domain layer for the chat room.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod grouping;
pub mod identity;
pub mod repository;
pub mod value_object;
pub mod window;

pub use entity::{Message, NewMessage};
pub use error::{IdentityStoreError, MessageLogError, ValueObjectError};
pub use factory::MessageIdFactory;
pub use grouping::{divider_positions, needs_divider};
pub use identity::{
    Color, IDENTITY_KEY, ResolvedIdentity, color_for, random_display_name, resolve_identity,
    resolve_identity_with,
};
pub use repository::{IdentityStore, MessageLog, SubscriptionHandle};
pub use value_object::{DisplayName, MessageId, MessageText, Timestamp};
pub use window::{DEFAULT_WINDOW_LIMIT, MessageWindow};
