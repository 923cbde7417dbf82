//! Client-side cart synchronisation.
//!
//! A storefront session edits its cart many times in quick succession. The
//! [`CartUploader`] owned by that session keeps only the latest snapshot and
//! uploads it once the edits have been quiet for a while. Each session owns
//! its own uploader; nothing is shared process-wide.

use std::{future::Future, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::cart::Cart;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Destination of debounced cart uploads.
pub trait CartSink: Send + Sync + 'static {
    fn upload(&self, cart: Cart) -> impl Future<Output = anyhow::Result<()>> + Send;
}

enum Command {
    Push(Cart),
    Flush(oneshot::Sender<anyhow::Result<()>>),
}

pub struct CartUploader {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl CartUploader {
    pub fn spawn<S: CartSink>(sink: S, quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(sink, quiet, rx));
        Self { tx, task }
    }

    /// Replace the pending snapshot and restart the quiet period.
    pub fn push(&self, cart: Cart) {
        if self.tx.send(Command::Push(cart)).is_err() {
            tracing::warn!("cart uploader stopped, dropping cart update");
        }
    }

    /// Upload the pending snapshot now, if there is one.
    pub async fn flush(&self) -> anyhow::Result<()> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| anyhow::anyhow!("cart uploader stopped"))?;
        done.await
            .map_err(|_| anyhow::anyhow!("cart uploader stopped"))?
    }

    /// Stop accepting edits, upload whatever is pending and wait for the task.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "cart uploader task failed");
        }
    }
}

async fn upload<S: CartSink>(sink: &S, cart: Cart) -> anyhow::Result<()> {
    let lines = cart.len();
    let result = sink.upload(cart).await;
    match &result {
        Ok(()) => tracing::debug!(lines, "cart uploaded"),
        Err(err) => tracing::warn!(error = %err, "cart upload failed"),
    }
    result
}

async fn run<S: CartSink>(sink: S, quiet: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending: Option<Cart> = None;
    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(command) => command,
                Err(_elapsed) => {
                    if let Some(cart) = pending.take() {
                        let _ = upload(&sink, cart).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Push(cart)) => pending = Some(cart),
            Some(Command::Flush(reply)) => {
                let result = match pending.take() {
                    Some(cart) => upload(&sink, cart).await,
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            None => {
                if let Some(cart) = pending.take() {
                    let _ = upload(&sink, cart).await;
                }
                break;
            }
        }
    }
}

/// Posts the cart to the marketplace API as the signed-in buyer.
pub struct HttpCartSink {
    client: reqwest::Client,
    endpoint: String,
    token: SecretString,
}

impl HttpCartSink {
    pub fn new(client: reqwest::Client, api_base: &str, token: SecretString) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/cart", api_base.trim_end_matches('/')),
            token,
        }
    }
}

impl CartSink for HttpCartSink {
    async fn upload(&self, cart: Cart) -> anyhow::Result<()> {
        self.client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "cart": cart }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Cart>>>);

    impl Recorder {
        fn uploads(&self) -> Vec<Cart> {
            self.0.lock().expect("lock").clone()
        }
    }

    impl CartSink for Recorder {
        async fn upload(&self, cart: Cart) -> anyhow::Result<()> {
            self.0.lock().expect("lock").push(cart);
            Ok(())
        }
    }

    fn cart_with(quantity: u32, product: Uuid) -> Cart {
        let mut cart = Cart::new();
        cart.set(product, quantity);
        cart
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_uploads_latest_snapshot_once() {
        let sink = Recorder::default();
        let uploader = CartUploader::spawn(sink.clone(), DEFAULT_QUIET_PERIOD);
        let product = Uuid::new_v4();

        for q in 1..=3 {
            uploader.push(cart_with(q, product));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(sink.uploads().is_empty());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let uploads = sink.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].quantity(&product), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_gaps_produce_separate_uploads() {
        let sink = Recorder::default();
        let uploader = CartUploader::spawn(sink.clone(), DEFAULT_QUIET_PERIOD);
        let product = Uuid::new_v4();

        uploader.push(cart_with(1, product));
        tokio::time::sleep(Duration::from_millis(1200)).await;
        uploader.push(cart_with(2, product));
        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(sink.uploads().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_uploads_immediately_and_close_drains() {
        let sink = Recorder::default();
        let uploader = CartUploader::spawn(sink.clone(), DEFAULT_QUIET_PERIOD);
        let product = Uuid::new_v4();

        uploader.push(cart_with(5, product));
        uploader.flush().await.expect("flush");
        assert_eq!(sink.uploads().len(), 1);

        uploader.flush().await.expect("nothing pending");
        assert_eq!(sink.uploads().len(), 1);

        uploader.push(cart_with(6, product));
        uploader.close().await;
        let uploads = sink.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[1].quantity(&product), 6);
    }
}
