//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod composer;
pub mod error;
pub mod identity;
pub mod live_view;
pub mod publish;
pub mod session;

pub use composer::Composer;
pub use error::SendError;
pub use identity::IdentityUseCase;
pub use live_view::{LiveViewSubscriber, Subscription, UpdateCallback};
pub use publish::PublishMessageUseCase;
pub use session::{ChatSession, IdentityState};
