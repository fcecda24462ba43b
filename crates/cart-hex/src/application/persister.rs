use std::sync::Arc;

use cart_types::domain::cart::CartSnapshot;
use cart_types::ports::cart_repository::CartRepository;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::cart_store::{CartStore, Subscription};

// Latest cart seen by the persister, tagged with the store revision it
// came from. Older revisions never replace newer ones.
#[derive(Clone)]
struct Pending {
    revision: u64,
    snapshot: CartSnapshot,
}

/// Writes cart snapshots in the background.
///
/// Store mutations only publish the latest snapshot into a watch channel;
/// a spawned task picks it up and saves it. Snapshots published while a
/// save is in flight collapse into the newest one. A crash can therefore
/// lose the last few changes, which is acceptable for a cart.
pub struct CartPersister {
    subscription: Subscription,
    tx: Arc<watch::Sender<Option<Pending>>>,
    task: JoinHandle<()>,
}

impl CartPersister {
    /// Must be called from inside a tokio runtime.
    pub fn spawn<R>(store: &CartStore, repo: Arc<R>) -> Self
    where
        R: CartRepository + ?Sized,
    {
        let (tx, mut rx) = watch::channel(None::<Pending>);
        let tx = Arc::new(tx);

        let publisher = tx.clone();
        let subscription = store.subscribe(move |change| {
            publisher.send_if_modified(|slot| {
                if matches!(slot, Some(held) if held.revision >= change.revision) {
                    return false;
                }
                *slot = Some(Pending {
                    revision: change.revision,
                    snapshot: CartSnapshot {
                        items: change.items.to_vec(),
                    },
                });
                true
            });
        });

        let task = tokio::spawn(async move {
            // `changed` still yields a value published just before the
            // sender went away, so shutdown flushes the final snapshot.
            while rx.changed().await.is_ok() {
                let pending = rx.borrow_and_update().clone();
                let Some(Pending { revision, snapshot }) = pending else {
                    continue;
                };
                match repo.save(&snapshot).await {
                    Ok(()) => tracing::debug!(
                        revision,
                        items = snapshot.items.len(),
                        "cart snapshot saved"
                    ),
                    Err(e) => tracing::warn!(error = %e, "failed to save cart snapshot"),
                }
            }
            tracing::debug!("cart persister stopped");
        });

        Self {
            subscription,
            tx,
            task,
        }
    }

    /// Detaches from the store, waits for the pending snapshot (if any) to
    /// be written, and stops the background task.
    pub async fn shutdown(self) {
        let Self {
            subscription,
            tx,
            task,
        } = self;
        drop(subscription);
        drop(tx);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "cart persister task failed");
        }
    }
}

impl std::fmt::Debug for CartPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersister")
            .field("subscription", &self.subscription)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
