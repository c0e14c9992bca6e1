//! Progress side channel.
//!
//! A provisioning session reports human-readable status lines, a completion
//! fraction in `[0, 1]`, overlay visibility and a single failure message.
//! Sinks must not block: they are called from inside the pipeline.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

pub trait ProgressSink: Send + Sync {
    fn status(&self, text: &str);

    fn fraction(&self, value: f64);

    fn overlay(&self, _visible: bool) {}

    fn failure(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn status(&self, _text: &str) {}

    fn fraction(&self, _value: f64) {}

    fn failure(&self, _message: &str) {}
}

/// Forwards progress to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn status(&self, text: &str) {
        tracing::info!(target: "resfs::progress", "{}", text);
    }

    fn fraction(&self, value: f64) {
        tracing::debug!(target: "resfs::progress", percent = value * 100.0, "progress");
    }

    fn overlay(&self, visible: bool) {
        tracing::trace!(target: "resfs::progress", visible, "overlay");
    }

    fn failure(&self, message: &str) {
        tracing::error!(target: "resfs::progress", "{}", message);
    }
}

/// One progress signal, for sinks that forward over a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Status(String),
    Fraction(f64),
    Overlay(bool),
    Failure(String),
}

// A dropped receiver just means nobody is watching.
impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn status(&self, text: &str) {
        let _ = self.send(ProgressEvent::Status(text.to_string()));
    }

    fn fraction(&self, value: f64) {
        let _ = self.send(ProgressEvent::Fraction(value));
    }

    fn overlay(&self, visible: bool) {
        let _ = self.send(ProgressEvent::Overlay(visible));
    }

    fn failure(&self, message: &str) {
        let _ = self.send(ProgressEvent::Failure(message.to_string()));
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn status(&self, text: &str) {
        (**self).status(text)
    }

    fn fraction(&self, value: f64) {
        (**self).fraction(value)
    }

    fn overlay(&self, visible: bool) {
        (**self).overlay(visible)
    }

    fn failure(&self, message: &str) {
        (**self).failure(message)
    }
}
