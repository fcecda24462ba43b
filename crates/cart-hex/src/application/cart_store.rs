use std::fmt;
use std::sync::{Arc, Weak};

use cart_types::domain::cart::{
    Cart, CartError, CartItem, CartSnapshot, CartState, GroupedEntry, RemoveOutcome,
};
use cart_types::domain::money::Money;
use cart_types::ports::cart_repository::CartRepository;
use parking_lot::{Mutex, ReentrantMutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added { id: String },
    Removed { id: String },
    Cleared,
    Restored,
}

/// Delivered to subscribers after a mutation has been applied.
///
/// `revision` grows by one with every applied mutation, so a subscriber can
/// tell a newer cart from an older one.
#[derive(Debug)]
pub struct CartChange<'a> {
    pub kind: ChangeKind,
    pub revision: u64,
    pub items: &'a [CartItem],
}

type Listener = Arc<dyn Fn(&CartChange<'_>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct State {
    cart: Cart,
    revision: u64,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

/// Session-wide cart. Shared as `Arc<CartStore>` between everything that
/// reads or edits the cart.
///
/// Every mutation runs inside one critical section, so a concurrent reader
/// sees the cart either before or after it. Listeners are called after the
/// cart lock is released and may read the store again.
///
/// Mutations from different threads are also serialized with their
/// notifications: listeners see changes in the order they were applied,
/// and the last change delivered always matches the settled cart.
pub struct CartStore {
    state: Mutex<State>,
    // Taken before `state` by every mutation and held through delivery.
    // Reentrant so a listener may itself mutate the store.
    delivery: ReentrantMutex<()>,
    listeners: Arc<Mutex<Listeners>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::with_cart(Cart::new())
    }

    pub fn with_cart(cart: Cart) -> Self {
        Self {
            state: Mutex::new(State { cart, revision: 0 }),
            delivery: ReentrantMutex::new(()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Replaces the in-memory cart with the last persisted snapshot.
    ///
    /// Any failure to load (backend error, corrupt or invalid snapshot)
    /// leaves the store empty; it is logged, never returned. A failed load
    /// is not reported to listeners, so an attached persister does not
    /// overwrite the unreadable snapshot.
    pub async fn restore_from<R>(&self, repo: &R) -> usize
    where
        R: CartRepository + ?Sized,
    {
        let loaded = match repo.load().await {
            Ok(Some(snapshot)) => match snapshot.into_cart() {
                Ok(cart) => Some(cart),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding invalid cart snapshot");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("no cart snapshot stored");
                Some(Cart::new())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load cart snapshot, starting empty");
                None
            }
        };

        let _delivery = self.delivery.lock();
        let Some(cart) = loaded else {
            self.state.lock().cart = Cart::new();
            return 0;
        };
        let restored = cart.len();
        let (revision, items) = {
            let mut state = self.state.lock();
            state.cart = cart;
            (state.bump(), state.cart.items().to_vec())
        };
        tracing::info!(items = restored, "cart restored");
        self.notify(ChangeKind::Restored, revision, &items);
        restored
    }

    /// Appends one unit. Returns the new quantity of that dish.
    pub fn add_item(&self, item: CartItem) -> Result<usize, CartError> {
        let id = item.id.clone();
        let _delivery = self.delivery.lock();
        let (quantity, revision, items) = {
            let mut state = self.state.lock();
            let quantity = state.cart.add(item)?;
            (quantity, state.bump(), state.cart.items().to_vec())
        };
        tracing::debug!(%id, quantity, "added to cart");
        self.notify(ChangeKind::Added { id }, revision, &items);
        Ok(quantity)
    }

    /// Removes the earliest unit of `id`. Missing ids are a no-op.
    pub fn remove_one_unit(&self, id: &str) -> RemoveOutcome {
        let _delivery = self.delivery.lock();
        let (outcome, revision, items) = {
            let mut state = self.state.lock();
            let outcome = state.cart.remove_one(id);
            let revision = if outcome.is_removed() {
                state.bump()
            } else {
                state.revision
            };
            (outcome, revision, state.cart.items().to_vec())
        };
        match &outcome {
            RemoveOutcome::Removed(_) => {
                tracing::debug!(%id, "removed one unit from cart");
                self.notify(ChangeKind::Removed { id: id.to_string() }, revision, &items);
            }
            RemoveOutcome::NotFound => {
                tracing::debug!(%id, "can't remove an item that is not in the cart");
            }
        }
        outcome
    }

    pub fn clear(&self) {
        let _delivery = self.delivery.lock();
        let cleared = {
            let mut state = self.state.lock();
            let dropped = state.cart.clear();
            (dropped > 0).then(|| (dropped, state.bump()))
        };
        if let Some((dropped, revision)) = cleared {
            tracing::debug!(dropped, "cart cleared");
            self.notify(ChangeKind::Cleared, revision, &[]);
        }
    }

    pub fn grouped_view(&self) -> Vec<GroupedEntry> {
        self.state.lock().cart.grouped()
    }

    pub fn subtotal(&self) -> Money {
        self.state.lock().cart.subtotal()
    }

    pub fn quantity_of(&self, id: &str) -> usize {
        self.state.lock().cart.quantity_of(id)
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.state.lock().cart.items().to_vec()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from(&self.state.lock().cart)
    }

    pub fn len(&self) -> usize {
        self.state.lock().cart.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().cart.is_empty()
    }

    pub fn state(&self) -> CartState {
        self.state.lock().cart.state()
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    /// Registers `listener` for every subsequent change. The listener stays
    /// attached until the returned handle is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartChange<'_>) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Ends the session: detaches all listeners, then drops the in-memory
    /// items without reporting a change, so the persisted snapshot survives.
    pub fn teardown(&self) {
        self.listeners.lock().entries.clear();
        self.state.lock().cart.clear();
        tracing::debug!("cart store torn down");
    }

    fn notify(&self, kind: ChangeKind, revision: u64, items: &[CartItem]) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }
        let change = CartChange {
            kind,
            revision,
            items,
        };
        for listener in listeners {
            listener(&change);
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.len())
            .field("revision", &self.revision())
            .field("listeners", &self.listeners.lock().entries.len())
            .finish()
    }
}

/// Handle returned by [`CartStore::subscribe`].
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
