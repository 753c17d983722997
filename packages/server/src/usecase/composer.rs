//! UseCase: 入力欄（Composer）
//!
//! 1 つの入力欄につき同時に処理中の送信は高々 1 件。
//! 成功時のみ入力内容をクリアし、失敗時は再送できるよう保持します。

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Mutex;

use crate::domain::{DisplayName, MessageId, MessageLog};

use super::{error::SendError, publish::PublishMessageUseCase};

/// 入力欄の状態と送信処理
pub struct Composer {
    author: DisplayName,
    publisher: PublishMessageUseCase,
    draft: Mutex<String>,
    in_flight: AtomicBool,
}

/// drop 時に送信中フラグを戻す（キャンセル時も含む）
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Composer {
    /// 確定済みの表示名で入力欄を作成
    pub fn new(author: DisplayName, log: Arc<dyn MessageLog>) -> Self {
        Self {
            author,
            publisher: PublishMessageUseCase::new(log),
            draft: Mutex::new(String::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn author(&self) -> &DisplayName {
        &self.author
    }

    /// 入力内容を置き換える
    pub async fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().await = text.into();
    }

    /// 現在の入力内容
    pub async fn draft(&self) -> String {
        self.draft.lock().await.clone()
    }

    /// 送信処理中かどうか
    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 入力内容を送信
    ///
    /// # Returns
    ///
    /// * `Ok(MessageId)` - 送信成功（入力内容はクリアされる）
    /// * `Err(SendError::InFlight)` - 既に送信中のため抑止された
    /// * `Err(SendError)` - 送信失敗（入力内容は保持される）
    pub async fn submit(&self) -> Result<MessageId, SendError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Suppressed duplicate submit from '{}'", self.author);
            return Err(SendError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let text = self.draft.lock().await.clone();
        let id = self.publisher.execute(&self.author, &text).await?;

        // 送信中に入力内容が書き換えられていればそちらを残す
        let mut draft = self.draft.lock().await;
        if *draft == text {
            draft.clear();
        }
        Ok(id)
    }
}
