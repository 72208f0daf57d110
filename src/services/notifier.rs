//! 通知服务 - 业务能力层
//!
//! 只负责"发出通知"能力；推送渠道由调用方实现。

use tracing::warn;

/// 通知接收方
pub trait Notifier {
    fn notify(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str),
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// 只写日志的通知
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!("🔔 {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_closure_notifier() {
        let sent = RefCell::new(Vec::new());
        let notifier = |m: &str| sent.borrow_mut().push(m.to_string());
        notifier.notify("1159 有名额");
        LogNotifier.notify("only logged");
        assert_eq!(sent.into_inner(), vec!["1159 有名额".to_string()]);
    }
}
