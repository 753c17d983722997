//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::ValueObjectError;

/// メッセージ送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// 前後の空白を除いた本文が空
    #[error("message text is empty")]
    EmptyText,

    /// 本文が長すぎる
    #[error("message text cannot exceed {max} characters (got {actual})")]
    TextTooLong { max: usize, actual: usize },

    /// 同じ入力欄からの送信が処理中
    #[error("a send from this input is already in flight")]
    InFlight,

    /// ログへの追記に失敗（入力内容は保持される）
    #[error("send failed: {0}")]
    LogUnavailable(String),

    /// ログが内容を不正として拒否した（入力内容は保持される）
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl From<ValueObjectError> for SendError {
    fn from(err: ValueObjectError) -> Self {
        match err {
            ValueObjectError::MessageTextTooLong { max, actual } => {
                SendError::TextTooLong { max, actual }
            }
            _ => SendError::EmptyText,
        }
    }
}
