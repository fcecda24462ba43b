use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::money::Money;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("invalid cart item: {0}")]
    InvalidItem(String),
}

/// One unit of a dish, with the price it had when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<(), CartError> {
        if self.id.trim().is_empty() {
            return Err(CartError::InvalidItem("id empty".into()));
        }
        if self.price.is_negative() {
            return Err(CartError::InvalidItem(format!(
                "price {} for {} is negative",
                self.price, self.id
            )));
        }
        if self.price.bounded().is_err() {
            return Err(CartError::InvalidItem(format!(
                "price {} for {} exceeds {}",
                self.price,
                self.id,
                Money::MAX_PRICE
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    Empty,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum RemoveOutcome {
    Removed(CartItem),
    NotFound,
}

impl RemoveOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed(_))
    }
}

/// All entries sharing one dish id. Built on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedEntry {
    pub id: String,
    pub items: Vec<CartItem>,
}

impl GroupedEntry {
    pub fn quantity(&self) -> usize {
        self.items.len()
    }

    /// The earliest entry of the group; supplies name, price and image for display.
    pub fn unit(&self) -> Option<&CartItem> {
        self.items.first()
    }

    pub fn line_total(&self) -> Money {
        self.items.iter().map(|it| it.price).sum()
    }
}

/// Ordered list of added units. Duplicate ids are expected: quantity is
/// the number of entries carrying an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartError> {
        for it in &items {
            it.validate()?;
        }
        Ok(Self { items })
    }

    /// Appends one unit and returns the new quantity of that id.
    pub fn add(&mut self, item: CartItem) -> Result<usize, CartError> {
        item.validate()?;
        let id = item.id.clone();
        self.items.push(item);
        Ok(self.quantity_of(&id))
    }

    /// Removes the earliest entry with `id`.
    pub fn remove_one(&mut self, id: &str) -> RemoveOutcome {
        match self.items.iter().position(|it| it.id == id) {
            Some(idx) => RemoveOutcome::Removed(self.items.remove(idx)),
            None => RemoveOutcome::NotFound,
        }
    }

    /// Empties the cart, returning how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> CartState {
        if self.items.is_empty() {
            CartState::Empty
        } else {
            CartState::Populated
        }
    }

    pub fn quantity_of(&self, id: &str) -> usize {
        self.items.iter().filter(|it| it.id == id).count()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|it| it.price).sum()
    }

    /// Groups entries by id, in order of each id's first appearance.
    pub fn grouped(&self) -> Vec<GroupedEntry> {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<GroupedEntry> = Vec::new();
        for it in &self.items {
            match slots.get(it.id.as_str()) {
                Some(&slot) => {
                    if let Some(group) = groups.get_mut(slot) {
                        group.items.push(it.clone());
                    }
                }
                None => {
                    slots.insert(it.id.as_str(), groups.len());
                    groups.push(GroupedEntry {
                        id: it.id.clone(),
                        items: vec![it.clone()],
                    });
                }
            }
        }
        groups
    }
}

/// Persisted form of a cart: the ordered item list, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn into_cart(self) -> Result<Cart, CartError> {
        Cart::from_items(self.items)
    }
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.clone(),
        }
    }
}
