//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PublishMessageUseCase::execute() メソッド
//! - 本文の検証（空白のみ・長さ超過）とログへの追記
//!
//! ### なぜこのテストが必要か
//! - 不正な本文はログに一切触れずに拒否されることを保証
//! - タイムスタンプは呼び出し側ではなくログが付与することを確認
//! - ログ障害時に SendError が返されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：前後の空白を除いた本文が追記される
//! - 異常系：空白のみ・501 文字以上・ログ障害

use std::sync::Arc;

use crate::domain::{DisplayName, MessageId, MessageLog, MessageLogError, MessageText, NewMessage};

use super::error::SendError;

/// メッセージ送信のユースケース
pub struct PublishMessageUseCase {
    /// Message Log（データアクセス層の抽象化）
    log: Arc<dyn MessageLog>,
}

impl PublishMessageUseCase {
    /// 新しい PublishMessageUseCase を作成
    pub fn new(log: Arc<dyn MessageLog>) -> Self {
        Self { log }
    }

    /// メッセージ送信を実行
    ///
    /// 表示名を持つこと自体が送信の前提条件であり、未確定の名前では呼び出せない。
    ///
    /// # Arguments
    ///
    /// * `author` - 送信者の表示名（送信時点の名前が記録される）
    /// * `text` - 入力された本文（前後の空白は除去される）
    ///
    /// # Returns
    ///
    /// * `Ok(MessageId)` - ログが付与した ID
    /// * `Err(SendError)` - 検証エラーまたは送信失敗
    pub async fn execute(&self, author: &DisplayName, text: &str) -> Result<MessageId, SendError> {
        // 1. 本文を検証（ログへのアクセス前に拒否する）
        let text = MessageText::new(text)?;

        // 2. ログに追記（created_at はログ側で付与）
        let id = self
            .log
            .append(NewMessage::new(author.clone(), text))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to publish message from '{}': {}", author, e);
                match e {
                    MessageLogError::Unavailable(reason) => SendError::LogUnavailable(reason),
                    MessageLogError::Rejected(reason) => SendError::Rejected(reason),
                }
            })?;

        tracing::debug!("Published message {} from '{}'", id, author);
        Ok(id)
    }
}
