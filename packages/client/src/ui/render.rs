//! Terminal rendering of delivered windows.
//!
//! Every delivery is a full window; the renderer only emits the messages it
//! has not printed yet, so the terminal reads as one continuous transcript.

use hiroba_server::domain::{Message, MessageWindow, color_for, needs_divider};
use hiroba_shared::time::format_clock;

const DIVIDER: &str = "────────────────────────";

pub struct Renderer {
    ansi: bool,
    last_printed: Option<Message>,
}

impl Renderer {
    pub fn new(ansi: bool) -> Self {
        Self {
            ansi,
            last_printed: None,
        }
    }

    /// Lines to print for `window`
    pub fn render(&mut self, window: &MessageWindow) -> Vec<String> {
        let messages = window.as_slice();
        let mut lines = Vec::new();

        for (index, message) in messages.iter().enumerate() {
            if self.last_printed.as_ref().is_some_and(|last| message <= last) {
                continue;
            }

            let divider = match (index, &self.last_printed) {
                // first message of the window: compare with what is on screen
                (0, Some(last)) => last.author != message.author,
                _ => needs_divider(messages, index),
            };
            if divider {
                lines.push(self.divider());
            }
            lines.push(self.line(message));
            self.last_printed = Some(message.clone());
        }
        lines
    }

    fn divider(&self) -> String {
        if self.ansi {
            format!("\x1b[2m{DIVIDER}\x1b[0m")
        } else {
            DIVIDER.to_string()
        }
    }

    fn line(&self, message: &Message) -> String {
        let clock = format_clock(message.created_at.value());
        if self.ansi {
            let color = color_for(message.author.as_str());
            format!(
                "{} \x1b[1;38;2;{};{};{}m{}\x1b[0m {}",
                clock, color.r, color.g, color.b, message.author, message.text
            )
        } else {
            format!("{} {} {}", clock, message.author, message.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiroba_server::domain::{DisplayName, MessageId, MessageText, Timestamp};

    fn message(id: &str, author: &str, text: &str, created_at: i64) -> Message {
        Message::new(
            MessageId::new(id.to_string()).unwrap(),
            DisplayName::new(author.to_string()).unwrap(),
            MessageText::new(text).unwrap(),
            Timestamp::new(created_at),
        )
    }

    fn window(messages: Vec<Message>) -> MessageWindow {
        MessageWindow::new(messages, 200)
    }

    fn strip_clock(line: &str) -> &str {
        line.split_once(' ').map(|(_, rest)| rest).unwrap_or(line)
    }

    #[test]
    fn test_divider_between_authors() {
        // テスト項目: 投稿者が変わる位置にだけ区切り線が入る
        // given (前提条件):
        let mut renderer = Renderer::new(false);
        let w = window(vec![
            message("a", "alice", "one", 1),
            message("b", "alice", "two", 2),
            message("c", "bob", "three", 3),
        ]);

        // when (操作):
        let lines = renderer.render(&w);

        // then (期待する結果):
        let lines: Vec<&str> = lines.iter().map(|l| strip_clock(l)).collect();
        assert_eq!(lines, vec!["alice one", "alice two", DIVIDER, "bob three"]);
    }

    #[test]
    fn test_only_new_messages_are_printed() {
        // テスト項目: 2 回目以降の配信では未表示のメッセージだけが出力される
        // given (前提条件):
        let mut renderer = Renderer::new(false);
        renderer.render(&window(vec![message("a", "alice", "one", 1)]));

        // when (操作):
        let lines = renderer.render(&window(vec![
            message("a", "alice", "one", 1),
            message("b", "alice", "two", 2),
        ]));

        // then (期待する結果):
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("alice two"));
    }

    #[test]
    fn test_repeated_window_prints_nothing() {
        // テスト項目: 同じウィンドウが再配信されても何も出力されない
        // given (前提条件):
        let mut renderer = Renderer::new(false);
        let w = window(vec![message("a", "alice", "one", 1)]);
        renderer.render(&w);

        // then (期待する結果):
        assert!(renderer.render(&w).is_empty());
    }

    #[test]
    fn test_divider_across_deliveries() {
        // テスト項目: 配信をまたいでも直前に表示した投稿者と比べて区切り線が入る
        // given (前提条件):
        let mut renderer = Renderer::new(false);
        renderer.render(&window(vec![message("a", "alice", "one", 1)]));

        // when (操作):
        // 上限 1 のウィンドウでは新しいメッセージが先頭になる
        let lines = renderer.render(&MessageWindow::new(
            vec![message("a", "alice", "one", 1), message("b", "bob", "two", 2)],
            1,
        ));

        // then (期待する結果):
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], DIVIDER);
        assert!(lines[1].ends_with("bob two"));
    }

    #[test]
    fn test_ansi_uses_author_color() {
        // テスト項目: ANSI 出力では投稿者名が名前から決まる色で表示される
        // given (前提条件):
        let mut renderer = Renderer::new(true);

        // when (操作):
        let lines = renderer.render(&window(vec![message("a", "Foo", "hi", 1)]));

        // then (期待する結果):
        let color = color_for("Foo");
        let expected = format!("\x1b[1;38;2;{};{};{}mFoo\x1b[0m hi", color.r, color.g, color.b);
        assert!(lines[0].ends_with(&expected));
    }
}
