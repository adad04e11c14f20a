//! Asynchronous diagnostic publication.
//!
//! Resolution must never wait on diagnostic I/O. Batches are handed to
//! an unbounded channel and drained by one background consumer thread
//! that forwards them to the embedder's sink in order.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Sender};

use crate::core::ProjectId;
use crate::host::DiagnosticSink;
use crate::util::Diagnostic;

enum Message {
    Batch(ProjectId, Vec<Diagnostic>),
    Flush(Sender<()>),
}

/// Single-consumer queue in front of a [`DiagnosticSink`].
///
/// Dropping the queue closes the channel and joins the consumer, so
/// every batch published before shutdown reaches the sink.
pub struct DiagnosticQueue {
    tx: Option<Sender<Message>>,
    consumer: Option<JoinHandle<()>>,
}

impl DiagnosticQueue {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        let (tx, rx) = unbounded::<Message>();

        let consumer = std::thread::Builder::new()
            .name("fairway-diagnostics".to_string())
            .spawn(move || {
                while let Ok(message) = rx.recv() {
                    match message {
                        Message::Batch(project, batch) => sink.replace_batch(&project, batch),
                        Message::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .expect("failed to spawn diagnostic consumer thread");

        DiagnosticQueue {
            tx: Some(tx),
            consumer: Some(consumer),
        }
    }

    /// Queue a batch for publication. Never blocks.
    pub fn publish(&self, project: ProjectId, batch: Vec<Diagnostic>) {
        if let Some(tx) = &self.tx {
            if tx.send(Message::Batch(project, batch)).is_err() {
                tracing::warn!("diagnostic consumer gone, dropping batch for `{}`", project);
            }
        }
    }

    /// Wait until every batch queued so far has reached the sink.
    pub fn flush(&self) {
        if let Some(tx) = &self.tx {
            let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
            if tx.send(Message::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.recv();
            }
        }
    }

    /// Close the queue and wait for queued batches to drain.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }
    }
}

impl Drop for DiagnosticQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Default sink: batches go to the log instead of a consumer UI.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn replace_batch(&self, project: &ProjectId, batch: Vec<Diagnostic>) {
        for diagnostic in &batch {
            tracing::debug!("[{}] {}", project, diagnostic);
        }
    }
}
