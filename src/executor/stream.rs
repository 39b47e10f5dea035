// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Live output streaming for long-running or unbounded commands.
//!
//! A [`StreamingPipe`] is a single-pass, FIFO sequence of [`OutputChunk`]s.
//! The producer side is a bounded channel, so a slow consumer applies
//! backpressure and an abandoned one makes the producer's next send fail.
//! Once the stream has ended, [`StreamingPipe::finish`] reports whether the
//! producing session succeeded.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Default number of chunks buffered between producer and consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Size of a single read from the underlying process.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// One item of a streaming pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    Chunk(Vec<u8>),
    /// The producing session ended. Delivered exactly once.
    EndOfStream,
}

/// Returned by [`ChunkSender::send`] once the consumer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeClosed;

impl std::fmt::Display for PipeClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "streaming pipe consumer dropped")
    }
}

impl std::error::Error for PipeClosed {}

/// Producer handle for a [`StreamingPipe`]. Dropping every clone ends the stream.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChunkSender {
    /// Deliver a chunk, waiting while the pipe is full.
    pub async fn send(&self, chunk: impl Into<Vec<u8>>) -> std::result::Result<(), PipeClosed> {
        self.sender.send(chunk.into()).await.map_err(|_| PipeClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the consumer has dropped the pipe.
    pub async fn closed(&self) {
        self.sender.closed().await
    }
}

pub struct StreamingPipe {
    receiver: mpsc::Receiver<Vec<u8>>,
    producer: Option<JoinHandle<()>>,
    status: Option<oneshot::Receiver<Result<()>>>,
    finished: bool,
}

impl StreamingPipe {
    /// Create a pipe fed by the returned sender.
    pub fn channel(capacity: usize) -> (ChunkSender, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let pipe = Self {
            receiver,
            producer: None,
            status: None,
            finished: false,
        };
        (ChunkSender { sender }, pipe)
    }

    /// Create a pipe fed by a background task reading `reader` until EOF.
    ///
    /// After EOF the stream ends and `completion` is awaited; its result is
    /// what [`finish`](Self::finish) returns. `completion` is owned by the
    /// producer task, so a child process spawned with `kill_on_drop` inside it
    /// is cleaned up when the consumer walks away early.
    pub fn from_reader<R, F>(reader: R, completion: F, capacity: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let (sender, mut pipe) = Self::channel(capacity);
        let (status_tx, status_rx) = oneshot::channel();

        let producer = tokio::spawn(async move {
            let mut reader = reader;
            let mut buf = vec![0u8; READ_CHUNK_SIZE];

            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if sender.send(&buf[..n]).await.is_err() {
                            tracing::debug!("Stream consumer dropped, stopping producer");
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Stream read failed, ending stream: {}", e);
                        break;
                    }
                }
            }

            // End the stream before waiting, the consumer may already be draining
            drop(sender);
            let _ = status_tx.send(completion.await);
        });

        pipe.producer = Some(producer);
        pipe.status = Some(status_rx);
        pipe
    }

    /// Next item: chunks in production order, then `EndOfStream` once, then `None`.
    pub async fn next_chunk(&mut self) -> Option<OutputChunk> {
        futures::StreamExt::next(self).await
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the remaining chunks into one buffer.
    pub async fn collect_bytes(mut self) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(OutputChunk::Chunk(chunk)) = self.next_chunk().await {
            bytes.extend_from_slice(&chunk);
        }
        bytes
    }

    /// Drain whatever is left and report how the producing session ended.
    ///
    /// Pipes created with [`channel`](Self::channel) always finish cleanly.
    pub async fn finish(mut self) -> Result<()> {
        while let Some(OutputChunk::Chunk(_)) = self.next_chunk().await {}

        match self.status.take() {
            Some(status) => status.await.unwrap_or_else(|_| {
                Err(Error::transport(
                    "stream",
                    "producer stopped before reporting an exit status",
                ))
            }),
            None => Ok(()),
        }
    }
}

impl Stream for StreamingPipe {
    type Item = OutputChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => Poll::Ready(Some(OutputChunk::Chunk(chunk))),
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(Some(OutputChunk::EndOfStream))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for StreamingPipe {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl std::fmt::Debug for StreamingPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingPipe")
            .field("finished", &self.finished)
            .finish()
    }
}
