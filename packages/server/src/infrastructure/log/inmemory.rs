//! InMemory Message Log 実装
//!
//! ドメイン層が定義する MessageLog trait の具体的な実装。
//! Vec をインメモリ DB として使用し、任意でジャーナルファイルに永続化します。
//!
//! ## 順序の保証
//!
//! タイムスタンプはログ自身の時計で `max(clock(), last + 1)` として付与するため、
//! 追記順と全順序 `(created_at, id)` が常に一致します。
//! 既に配信したメッセージより前に新しいメッセージが割り込むことはありません。

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use hiroba_shared::time::now_millis;

use crate::{
    domain::{
        Message, MessageId, MessageIdFactory, MessageLog, MessageLogError, MessageWindow,
        NewMessage, SubscriptionHandle, Timestamp,
    },
    infrastructure::journal::{Journal, JournalError},
};

/// ログが使用する時計（Unix ミリ秒）
pub type Clock = fn() -> i64;

/// 購読者の情報
struct Subscriber {
    limit: usize,
    sink: UnboundedSender<MessageWindow>,
}

struct LogState {
    /// 全順序で整列済みのメッセージ
    messages: Vec<Message>,
    last_timestamp: Option<i64>,
    subscribers: HashMap<SubscriptionHandle, Subscriber>,
    next_handle: u64,
    journal: Option<Journal>,
}

impl LogState {
    fn window(&self, limit: usize) -> MessageWindow {
        let start = self.messages.len().saturating_sub(limit);
        MessageWindow::new(self.messages[start..].to_vec(), limit)
    }

    fn next_timestamp(&self, now: i64) -> Timestamp {
        let value = match self.last_timestamp {
            Some(last) => now.max(last + 1),
            None => now,
        };
        Timestamp::new(value)
    }

    /// 全購読者に最新のウィンドウを配信し、受信側が閉じた購読者を除去する
    fn notify_all(&mut self) {
        let mut closed = Vec::new();
        for (handle, subscriber) in &self.subscribers {
            if subscriber.sink.send(self.window(subscriber.limit)).is_err() {
                closed.push(*handle);
            }
        }
        for handle in closed {
            self.subscribers.remove(&handle);
            tracing::debug!("Pruned closed subscription {}", handle);
        }
    }
}

/// インメモリ Message Log 実装
///
/// ドメイン層の MessageLog trait を実装します（依存性の逆転）。
pub struct InMemoryMessageLog {
    state: Mutex<LogState>,
    clock: Clock,
}

impl Default for InMemoryMessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageLog {
    /// 新しい空の InMemoryMessageLog を作成
    pub fn new() -> Self {
        Self::with_clock(now_millis)
    }

    /// 時計を指定して作成
    pub fn with_clock(clock: Clock) -> Self {
        Self::from_parts(Vec::new(), None, clock)
    }

    /// 既存のメッセージから作成（全順序で並べ直し、重複 ID は除去）
    pub fn with_messages(messages: Vec<Message>, clock: Clock) -> Self {
        Self::from_parts(messages, None, clock)
    }

    /// ジャーナルを開いて内容を復元し、以降の追記を永続化する
    pub async fn open_journal(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let (journal, messages) = Journal::open(path).await?;
        Ok(Self::from_parts(messages, Some(journal), now_millis))
    }

    fn from_parts(messages: Vec<Message>, journal: Option<Journal>, clock: Clock) -> Self {
        let messages = MessageWindow::new(messages, usize::MAX).into_vec();
        let last_timestamp = messages.last().map(|m| m.created_at.value());
        Self {
            state: Mutex::new(LogState {
                messages,
                last_timestamp,
                subscribers: HashMap::new(),
                next_handle: 1,
                journal,
            }),
            clock,
        }
    }

    /// 直近 `limit` 件のウィンドウを取得
    pub async fn window(&self, limit: usize) -> MessageWindow {
        self.state.lock().await.window(limit)
    }

    /// ログ全体の件数
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 購読中の数
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, message: NewMessage) -> Result<MessageId, MessageLogError> {
        let id = MessageIdFactory::generate()
            .map_err(|e| MessageLogError::Unavailable(e.to_string()))?;

        let mut state = self.state.lock().await;
        let created_at = state.next_timestamp((self.clock)());
        let message = Message::stamp(message, id.clone(), created_at);

        // ジャーナルへの書き込みが成功して初めて追記を確定する
        if let Some(journal) = state.journal.as_mut() {
            journal.append(&message).await.map_err(|e| {
                tracing::error!("Journal write failed: {}", e);
                MessageLogError::Unavailable(e.to_string())
            })?;
        }

        tracing::info!(
            "Appended message {} from '{}' at {}",
            message.id,
            message.author,
            message.created_at
        );
        state.messages.push(message);
        state.last_timestamp = Some(created_at.value());
        state.notify_all();

        Ok(id)
    }

    async fn subscribe_ordered(
        &self,
        limit: usize,
        sink: UnboundedSender<MessageWindow>,
    ) -> Result<SubscriptionHandle, MessageLogError> {
        let mut state = self.state.lock().await;
        let handle = SubscriptionHandle::new(state.next_handle);
        state.next_handle += 1;

        // 登録時点のウィンドウを即座に配信
        sink.send(state.window(limit))
            .map_err(|_| MessageLogError::Unavailable("subscriber sink is closed".to_string()))?;
        state.subscribers.insert(handle, Subscriber { limit, sink });

        tracing::info!("Registered subscription {} (limit {})", handle, limit);
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut state = self.state.lock().await;
        if state.subscribers.remove(&handle).is_some() {
            tracing::info!("Removed subscription {}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, MessageText, entity::test_support::message};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryMessageLog の追記・購読・購読解除
    // - サーバー側で付与するタイムスタンプの単調性
    // - ウィンドウの上限と古いメッセージの押し出し
    //
    // 【なぜこのテストが必要か】
    // - ログは唯一の順序決定者であり、全クライアントの表示の一貫性を担保する
    // - 購読解除後に配信が残るとリソースリークになる
    // ========================================

    fn fixed_clock() -> i64 {
        1_000
    }

    fn new_message(author: &str, text: &str) -> NewMessage {
        NewMessage::new(
            DisplayName::new(author.to_string()).unwrap(),
            MessageText::new(text).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_append_stamps_strictly_increasing_timestamps() {
        // テスト項目: 時計が進まなくてもタイムスタンプは厳密に増加する
        // given (前提条件):
        let log = InMemoryMessageLog::with_clock(fixed_clock);

        // when (操作):
        for i in 0..3 {
            log.append(new_message("alice", &format!("msg {i}")))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let window = log.window(200).await;
        let stamps: Vec<i64> = window.iter().map(|m| m.created_at.value()).collect();
        assert_eq!(stamps, vec![1_000, 1_001, 1_002]);
    }

    #[tokio::test]
    async fn test_append_returns_the_stored_id() {
        // テスト項目: 追記の戻り値の ID でメッセージを特定できる
        // given (前提条件):
        let log = InMemoryMessageLog::new();

        // when (操作):
        let id = log.append(new_message("alice", "  hello  ")).await.unwrap();

        // then (期待する結果):
        let window = log.window(200).await;
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().unwrap().id, id);
        assert_eq!(window.latest().unwrap().text.as_str(), "hello");
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_window_immediately() {
        // テスト項目: 購読登録時に現在のウィンドウが配信される
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        log.append(new_message("alice", "before")).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        log.subscribe_ordered(200, tx).await.unwrap();

        // then (期待する結果):
        let window = rx.recv().await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().unwrap().text.as_str(), "before");
    }

    #[tokio::test]
    async fn test_append_notifies_every_subscriber_with_full_window() {
        // テスト項目: 追記のたびに全購読者へ差分ではなく全ウィンドウが配信される
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        log.subscribe_ordered(200, tx1).await.unwrap();
        log.subscribe_ordered(200, tx2).await.unwrap();
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();

        // when (操作):
        log.append(new_message("alice", "one")).await.unwrap();
        log.append(new_message("bob", "two")).await.unwrap();

        // then (期待する結果):
        assert_eq!(rx1.recv().await.unwrap().len(), 1);
        assert_eq!(rx1.recv().await.unwrap().len(), 2);
        assert_eq!(rx2.recv().await.unwrap().len(), 1);
        let last = rx2.recv().await.unwrap();
        let authors: Vec<&str> = last.iter().map(|m| m.author.as_str()).collect();
        assert_eq!(authors, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_window_is_capped_and_evicts_oldest() {
        // テスト項目: 200 件を超えると各配信は常に 200 件で、最古のメッセージが進む
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        for i in 0..200 {
            log.append(new_message("alice", &format!("msg {i}")))
                .await
                .unwrap();
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        log.subscribe_ordered(200, tx).await.unwrap();
        let mut previous_oldest = rx.recv().await.unwrap().oldest().unwrap().clone();

        for i in 200..210 {
            // when (操作):
            log.append(new_message("bob", &format!("msg {i}")))
                .await
                .unwrap();

            // then (期待する結果):
            let window = rx.recv().await.unwrap();
            assert_eq!(window.len(), 200);
            let oldest = window.oldest().unwrap().clone();
            assert!(oldest > previous_oldest);
            previous_oldest = oldest;
        }

        // ウィンドウからは外れてもログには残る
        assert_eq!(log.len().await, 210);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_and_is_idempotent() {
        // テスト項目: 購読解除後は配信されず、二重に解除してもエラーにならない
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = log.subscribe_ordered(200, tx).await.unwrap();
        rx.recv().await.unwrap();

        // when (操作):
        log.unsubscribe(handle).await;
        log.unsubscribe(handle).await;
        log.append(new_message("alice", "after")).await.unwrap();

        // then (期待する結果): 送信側が破棄されているのでチャンネルは閉じている
        assert_eq!(log.subscriber_count().await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_sink_is_pruned_on_next_append() {
        // テスト項目: 受信側が破棄された購読は次の追記時に除去される
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        let (tx, rx) = mpsc::unbounded_channel();
        log.subscribe_ordered(200, tx).await.unwrap();
        drop(rx);

        // when (操作):
        log.append(new_message("alice", "hello")).await.unwrap();

        // then (期待する結果):
        assert_eq!(log.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_with_messages_restores_order_and_continues_clock() {
        // テスト項目: 既存メッセージから復元した場合も全順序と単調性が保たれる
        // given (前提条件):
        let log = InMemoryMessageLog::with_messages(
            vec![
                message("b", "bob", "second", 5_000),
                message("a", "alice", "first", 4_000),
            ],
            fixed_clock,
        );

        // when (操作): 時計は過去を指している
        log.append(new_message("carol", "third")).await.unwrap();

        // then (期待する結果):
        let window = log.window(200).await;
        let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(window.latest().unwrap().created_at.value(), 5_001);
    }

    #[tokio::test]
    async fn test_open_journal_persists_across_instances() {
        // テスト項目: ジャーナル付きのログは再起動後も内容が復元される
        // given (前提条件):
        let path = std::env::temp_dir().join(format!(
            "hiroba-log-{}-{}.jsonl",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        let log = InMemoryMessageLog::open_journal(&path).await.unwrap();
        log.append(new_message("alice", "persisted")).await.unwrap();
        drop(log);

        // when (操作):
        let reopened = InMemoryMessageLog::open_journal(&path).await.unwrap();

        // then (期待する結果):
        let window = reopened.window(200).await;
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().unwrap().text.as_str(), "persisted");
        let _ = std::fs::remove_file(&path);
    }
}
