//! UseCase: ライブビュー購読
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LiveViewSubscriber::subscribe() と Subscription::unsubscribe()
//! - 配信ごとに全ウィンドウで置き換えられること
//!
//! ### なぜこのテストが必要か
//! - 購読解除後のコールバック呼び出し（解除済み購読者への配信）を防ぐ
//! - 一時的な切断でも直近のウィンドウが失われないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：追記のたびに全ウィンドウが配信される
//! - エッジケース：二重の購読解除、配信中の購読解除、古いウィンドウの到着
//! - 異常系：購読を確立できない

use std::sync::Arc;

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::domain::{
    DEFAULT_WINDOW_LIMIT, MessageLog, MessageLogError, MessageWindow, SubscriptionHandle,
};

/// ウィンドウ更新時に呼ばれるコールバック
pub type UpdateCallback = Box<dyn FnMut(&MessageWindow) + Send + 'static>;

/// 配信タスクと購読ハンドルで共有する状態
struct Shared {
    /// `None` は購読解除済み
    on_update: Mutex<Option<UpdateCallback>>,
    /// 最後に配信したウィンドウ
    last: Mutex<MessageWindow>,
}

/// ライブビュー購読のユースケース
pub struct LiveViewSubscriber {
    log: Arc<dyn MessageLog>,
    limit: usize,
}

impl LiveViewSubscriber {
    /// 直近 200 件を購読する LiveViewSubscriber を作成
    pub fn new(log: Arc<dyn MessageLog>) -> Self {
        Self::with_limit(log, DEFAULT_WINDOW_LIMIT)
    }

    pub fn with_limit(log: Arc<dyn MessageLog>, limit: usize) -> Self {
        Self { log, limit }
    }

    /// 購読を開始
    ///
    /// `on_update` には毎回ソート済みの全ウィンドウが渡される（差分ではない）。
    /// 呼び出し元はブロックされず、配信は別タスクで行われる。
    ///
    /// # Errors
    ///
    /// ログとの購読を確立できない場合は `MessageLogError` を返す
    pub async fn subscribe<F>(&self, on_update: F) -> Result<Subscription, MessageLogError>
    where
        F: FnMut(&MessageWindow) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.log.subscribe_ordered(self.limit, tx).await?;

        let on_update: UpdateCallback = Box::new(on_update);
        let shared = Arc::new(Shared {
            on_update: Mutex::new(Some(on_update)),
            last: Mutex::new(MessageWindow::empty()),
        });
        let task = tokio::spawn(deliver(rx, shared.clone()));

        tracing::info!("Live view subscribed ({})", handle);
        Ok(Subscription {
            log: self.log.clone(),
            handle,
            shared,
            task,
        })
    }

    /// 現在のウィンドウを 1 回だけ取得する
    ///
    /// 購読して最初の配信を受け取り、すぐに解除する。
    pub async fn fetch(&self) -> Result<MessageWindow, MessageLogError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = self.log.subscribe_ordered(self.limit, tx).await?;
        let window = rx.recv().await;
        self.log.unsubscribe(handle).await;
        window.ok_or_else(|| MessageLogError::Unavailable("subscription closed".to_string()))
    }
}

async fn deliver(mut rx: mpsc::UnboundedReceiver<MessageWindow>, shared: Arc<Shared>) {
    while let Some(window) = rx.recv().await {
        // コールバックのロックを保持したまま呼び出すことで、
        // 購読解除は配信中の呼び出しが終わるまで待つ
        let mut slot = shared.on_update.lock().await;
        let Some(on_update) = slot.as_mut() else {
            break;
        };

        {
            let mut last = shared.last.lock().await;
            if window.is_older_than(&last) {
                tracing::debug!("Discarding stale window ({} messages)", window.len());
                continue;
            }
            *last = window.clone();
        }

        tracing::debug!("Delivering window ({} messages)", window.len());
        on_update(&window);
    }
}

/// セッションに紐づく購読ハンドル
///
/// drop した場合も配信は停止する。
pub struct Subscription {
    log: Arc<dyn MessageLog>,
    handle: SubscriptionHandle,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// 最後に配信されたウィンドウ（切断中もクリアされない）
    pub async fn snapshot(&self) -> MessageWindow {
        self.shared.last.lock().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.shared.on_update.lock().await.is_some()
    }

    /// 購読を解除
    ///
    /// 冪等。戻った後にコールバックが呼ばれることはない。
    pub async fn unsubscribe(&self) {
        let was_active = self.shared.on_update.lock().await.take().is_some();
        if !was_active {
            return;
        }
        self.task.abort();
        self.log.unsubscribe(self.handle).await;
        tracing::info!("Live view unsubscribed ({})", self.handle);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // 受信側が破棄されるので、ログ側の購読も次の変更時に除去される
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, MessageText, NewMessage, entity::test_support::message,
            repository::MockMessageLog,
        },
        infrastructure::InMemoryMessageLog,
    };
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedSender;

    fn new_message(author: &str, text: &str) -> NewMessage {
        NewMessage::new(
            DisplayName::new(author.to_string()).unwrap(),
            MessageText::new(text).unwrap(),
        )
    }

    /// コールバックの呼び出しを受け取るチャンネル
    fn recorder() -> (
        impl FnMut(&MessageWindow) + Send + 'static,
        mpsc::UnboundedReceiver<MessageWindow>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |window: &MessageWindow| {
                let _ = tx.send(window.clone());
            },
            rx,
        )
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<MessageWindow>) -> MessageWindow {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for a delivery")
            .expect("delivery channel closed")
    }

    #[tokio::test]
    async fn test_subscribe_delivers_initial_and_subsequent_windows() {
        // テスト項目: 購読直後と追記のたびに全ウィンドウが配信される
        // given (前提条件):
        let log = Arc::new(InMemoryMessageLog::new());
        log.append(new_message("alice", "hello")).await.unwrap();
        let subscriber = LiveViewSubscriber::new(log.clone());
        let (on_update, mut rx) = recorder();

        // when (操作):
        let subscription = subscriber.subscribe(on_update).await.unwrap();
        let initial = next(&mut rx).await;
        log.append(new_message("bob", "  hi there ")).await.unwrap();
        let updated = next(&mut rx).await;

        // then (期待する結果):
        assert_eq!(initial.len(), 1);
        assert_eq!(updated.len(), 2);
        let latest = updated.latest().unwrap();
        assert_eq!(latest.author.as_str(), "bob");
        assert_eq!(latest.text.as_str(), "hi there");
        assert_eq!(subscription.snapshot().await, updated);
    }

    #[tokio::test]
    async fn test_unsubscribe_twice_and_no_delivery_after() {
        // テスト項目: 二重の購読解除はエラーにならず、解除後の配信はない
        // given (前提条件):
        let log = Arc::new(InMemoryMessageLog::new());
        let subscriber = LiveViewSubscriber::new(log.clone());
        let (on_update, mut rx) = recorder();
        let subscription = subscriber.subscribe(on_update).await.unwrap();
        next(&mut rx).await;

        // when (操作):
        subscription.unsubscribe().await;
        subscription.unsubscribe().await;
        log.append(new_message("alice", "after")).await.unwrap();

        // then (期待する結果): コールバックが破棄され、チャンネルは閉じる
        assert!(!subscription.is_active().await);
        assert_eq!(log.subscriber_count().await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_waits_for_in_flight_delivery() {
        // テスト項目: 配信中に購読解除しても、戻った後に配信が起きない
        // given (前提条件): コールバックが完了を通知するまで時間がかかる
        let log = Arc::new(InMemoryMessageLog::new());
        let subscriber = LiveViewSubscriber::new(log.clone());
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let subscription = subscriber
            .subscribe({
                let calls = calls.clone();
                move |_: &MessageWindow| {
                    std::thread::sleep(Duration::from_millis(20));
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }
            })
            .await
            .unwrap();
        for i in 0..5 {
            log.append(new_message("alice", &format!("msg {i}")))
                .await
                .unwrap();
        }
        tokio::task::yield_now().await;

        // when (操作):
        subscription.unsubscribe().await;
        let after_unsubscribe = calls.load(std::sync::atomic::Ordering::SeqCst);
        log.append(new_message("alice", "late")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert_eq!(
            calls.load(std::sync::atomic::Ordering::SeqCst),
            after_unsubscribe
        );
    }

    #[tokio::test]
    async fn test_stale_window_is_discarded() {
        // テスト項目: 既に表示中のものより古いウィンドウは破棄され、表示は後退しない
        // given (前提条件): 任意のウィンドウを流せるログ
        let (sink_tx, sink_rx) = std::sync::mpsc::channel::<UnboundedSender<MessageWindow>>();
        let mut log = MockMessageLog::new();
        log.expect_subscribe_ordered()
            .times(1)
            .returning(move |_, sink| {
                sink_tx.send(sink).unwrap();
                Ok(SubscriptionHandle::new(1))
            });
        log.expect_unsubscribe().returning(|_| ());
        let subscriber = LiveViewSubscriber::new(Arc::new(log));
        let (on_update, mut rx) = recorder();
        let subscription = subscriber.subscribe(on_update).await.unwrap();
        let sink = sink_rx.recv().unwrap();

        let newer = MessageWindow::new(
            vec![message("a", "alice", "1", 1), message("b", "bob", "2", 2)],
            200,
        );
        let older = MessageWindow::new(vec![message("a", "alice", "1", 1)], 200);

        // when (操作):
        sink.send(newer.clone()).unwrap();
        sink.send(older).unwrap();
        sink.send(newer.clone()).unwrap();

        // then (期待する結果): 同じウィンドウの再配信は許容される
        assert_eq!(next(&mut rx).await, newer);
        assert_eq!(next(&mut rx).await, newer);
        assert_eq!(subscription.snapshot().await, newer);
        subscription.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_snapshot_survives_log_disconnect() {
        // テスト項目: ログ側の送信が途絶えても直近のウィンドウは保持される
        // given (前提条件):
        let (sink_tx, sink_rx) = std::sync::mpsc::channel::<UnboundedSender<MessageWindow>>();
        let mut log = MockMessageLog::new();
        log.expect_subscribe_ordered()
            .returning(move |_, sink| {
                sink_tx.send(sink).unwrap();
                Ok(SubscriptionHandle::new(7))
            });
        log.expect_unsubscribe().returning(|_| ());
        let subscriber = LiveViewSubscriber::new(Arc::new(log));
        let (on_update, mut rx) = recorder();
        let subscription = subscriber.subscribe(on_update).await.unwrap();
        let sink = sink_rx.recv().unwrap();
        let window = MessageWindow::new(vec![message("a", "alice", "1", 1)], 200);
        sink.send(window.clone()).unwrap();
        next(&mut rx).await;

        // when (操作): 接続が切れる
        drop(sink);
        tokio::task::yield_now().await;

        // then (期待する結果):
        assert_eq!(subscription.snapshot().await, window);
        assert_eq!(subscription.handle(), SubscriptionHandle::new(7));
    }

    #[tokio::test]
    async fn test_fetch_returns_window_and_releases_subscription() {
        // テスト項目: 1 回だけの取得では現在のウィンドウが返り、購読は残らない
        // given (前提条件):
        let log = Arc::new(InMemoryMessageLog::new());
        for i in 0..5 {
            log.append(new_message("alice", &format!("msg {i}")))
                .await
                .unwrap();
        }
        let subscriber = LiveViewSubscriber::with_limit(log.clone(), 3);

        // when (操作):
        let window = subscriber.fetch().await.unwrap();

        // then (期待する結果):
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest().unwrap().text.as_str(), "msg 2");
        assert_eq!(log.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_failure_reports_log_unavailable() {
        // テスト項目: 購読を確立できない場合はエラーが返される
        // given (前提条件):
        let mut log = MockMessageLog::new();
        log.expect_subscribe_ordered()
            .returning(|_, _| Err(MessageLogError::Unavailable("offline".to_string())));
        let subscriber = LiveViewSubscriber::new(Arc::new(log));

        // when (操作):
        let result = subscriber.subscribe(|_: &MessageWindow| {}).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessageLogError::Unavailable(_))));
    }
}
