//! UseCase: 表示名の解決と確定
//!
//! ストレージの障害は「保存済みの名前なし」として扱い、呼び出し元には伝播しません。

use std::sync::Arc;

use crate::domain::{
    DisplayName, IDENTITY_KEY, IdentityStore, ResolvedIdentity, ValueObjectError,
    random_display_name, resolve_identity,
};

/// 表示名のユースケース
pub struct IdentityUseCase {
    store: Arc<dyn IdentityStore>,
}

impl IdentityUseCase {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// 保存済みの名前を復元するか、新しい名前を生成する
    pub fn resolve(&self) -> ResolvedIdentity {
        let stored = match self.store.get(IDENTITY_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Identity store unavailable, treating as first visit: {}", e);
                None
            }
        };
        let resolved = resolve_identity(stored.as_deref());
        tracing::info!(
            "Resolved identity '{}' (restored: {})",
            resolved.display_name,
            resolved.was_restored
        );
        resolved
    }

    /// 別のランダムな名前を引き直す
    pub fn reroll(&self) -> DisplayName {
        random_display_name(&mut rand::rng())
    }

    /// 名前を確定して保存する
    ///
    /// 入力は前後の空白を除去し、空ならランダムな名前を使う。
    ///
    /// # Errors
    ///
    /// 入力が表示名として不正（長すぎる、制御文字を含む）な場合
    pub fn confirm(&self, input: &str) -> Result<DisplayName, ValueObjectError> {
        let trimmed = input.trim();
        let name = if trimmed.is_empty() {
            self.reroll()
        } else {
            DisplayName::new(trimmed.to_string())?
        };

        if let Err(e) = self.store.set(IDENTITY_KEY, name.as_str()) {
            tracing::warn!("Failed to persist identity '{}': {}", name, e);
        }
        Ok(name)
    }
}
