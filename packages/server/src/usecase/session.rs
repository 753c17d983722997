//! UseCase: チャットセッション
//!
//! 表示名の解決、入力欄、ライブビュー購読を 1 つのセッションにまとめます。
//! 購読はプロセス全体ではなくセッションに紐づき、`teardown()` で解除されます。

use std::sync::Arc;

use crate::domain::{
    DisplayName, IdentityStore, MessageLog, MessageLogError, MessageWindow, ValueObjectError,
};

use super::{
    composer::Composer,
    identity::IdentityUseCase,
    live_view::{LiveViewSubscriber, Subscription},
};

/// 表示名の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    /// 名前を選択中（送信不可）
    Choosing { candidate: DisplayName },
    /// 参加済み
    Joined(DisplayName),
}

/// 1 クライアントのチャットセッション
pub struct ChatSession {
    log: Arc<dyn MessageLog>,
    identity: IdentityUseCase,
    state: IdentityState,
    composer: Option<Arc<Composer>>,
    live_view: Option<Subscription>,
}

impl ChatSession {
    /// 表示名を解決してセッションを開始
    ///
    /// 保存済みの名前があれば参加済みの状態で始まる。
    pub fn start(log: Arc<dyn MessageLog>, store: Arc<dyn IdentityStore>) -> Self {
        let identity = IdentityUseCase::new(store);
        let resolved = identity.resolve();

        let mut session = Self {
            log,
            identity,
            state: IdentityState::Choosing {
                candidate: resolved.display_name.clone(),
            },
            composer: None,
            live_view: None,
        };
        if resolved.was_restored {
            session.join(resolved.display_name);
        }
        session
    }

    pub fn state(&self) -> &IdentityState {
        &self.state
    }

    pub fn is_joined(&self) -> bool {
        matches!(self.state, IdentityState::Joined(_))
    }

    /// 現在の名前（選択中なら候補）
    pub fn display_name(&self) -> &DisplayName {
        match &self.state {
            IdentityState::Choosing { candidate } => candidate,
            IdentityState::Joined(name) => name,
        }
    }

    /// 候補を引き直す（選択中のみ）
    pub fn reroll(&mut self) -> &DisplayName {
        if let IdentityState::Choosing { candidate } = &mut self.state {
            *candidate = self.identity.reroll();
        }
        self.display_name()
    }

    /// 入力した名前（空なら候補ではなく新しいランダムな名前）で参加する
    pub fn confirm(&mut self, input: &str) -> Result<&DisplayName, ValueObjectError> {
        let name = self.identity.confirm(input)?;
        self.join(name);
        Ok(self.display_name())
    }

    /// 現在の候補のまま参加する
    pub fn accept_candidate(&mut self) -> Result<&DisplayName, ValueObjectError> {
        let candidate = self.display_name().as_str().to_string();
        self.confirm(&candidate)
    }

    /// 名前の選択に戻る
    ///
    /// 過去のメッセージの投稿者は送信時点の名前のまま変わらない。
    pub fn rename(&mut self) {
        let candidate = self.display_name().clone();
        self.state = IdentityState::Choosing { candidate };
        self.composer = None;
    }

    fn join(&mut self, name: DisplayName) {
        tracing::info!("Joined as '{}'", name);
        self.composer = Some(Arc::new(Composer::new(name.clone(), self.log.clone())));
        self.state = IdentityState::Joined(name);
    }

    /// 入力欄（参加済みの場合のみ）
    pub fn composer(&self) -> Option<Arc<Composer>> {
        self.composer.clone()
    }

    /// ライブビューを開く（既存の購読は解除して置き換える）
    pub async fn open_live_view<F>(&mut self, on_update: F) -> Result<(), MessageLogError>
    where
        F: FnMut(&MessageWindow) + Send + 'static,
    {
        let subscription = LiveViewSubscriber::new(self.log.clone())
            .subscribe(on_update)
            .await?;
        if let Some(previous) = self.live_view.replace(subscription) {
            previous.unsubscribe().await;
        }
        Ok(())
    }

    /// 直近のウィンドウ
    pub async fn snapshot(&self) -> MessageWindow {
        match &self.live_view {
            Some(subscription) => subscription.snapshot().await,
            None => MessageWindow::empty(),
        }
    }

    /// セッションを終了し、購読を解除する
    pub async fn teardown(&mut self) {
        if let Some(subscription) = self.live_view.take() {
            subscription.unsubscribe().await;
        }
        self.composer = None;
    }
}
