use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::cart::GroupedEntry;
use crate::domain::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Placed,
    Paid,
}

/// The restaurant whose menu the cart was filled from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestaurantRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderQuote {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl OrderQuote {
    pub fn new(subtotal: Money, delivery_fee: Money) -> Self {
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLine {
    /// Collapses a grouped cart entry into one order line. Units of the same
    /// dish may carry different price snapshots, so the line total is summed
    /// from the entries rather than multiplied.
    pub fn from_group(group: &GroupedEntry) -> Option<Self> {
        let unit = group.unit()?;
        let quantity = u32::try_from(group.quantity()).ok()?;
        Some(Self {
            dish_id: group.id.clone(),
            name: unit.name.clone(),
            quantity,
            unit_price: unit.price,
            line_total: group.line_total(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub estimated_delivery_time: DateTime<Utc>,
}

impl PlaceOrderRequest {
    pub fn new(
        user_id: String,
        restaurant: &RestaurantRef,
        items: Vec<OrderLine>,
        quote: OrderQuote,
        estimated_delivery_time: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        if user_id.trim().is_empty() {
            anyhow::bail!("user_id empty");
        }
        if restaurant.id.trim().is_empty() {
            anyhow::bail!("restaurant id empty");
        }
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        let lines_total: Money = items.iter().map(|l| l.line_total).sum();
        if lines_total != quote.subtotal {
            anyhow::bail!(
                "line totals {} do not match subtotal {}",
                lines_total,
                quote.subtotal
            );
        }
        Ok(Self {
            user_id,
            restaurant_id: restaurant.id.clone(),
            restaurant_name: restaurant.name.clone(),
            status: OrderStatus::Placed,
            items,
            subtotal: quote.subtotal,
            delivery_fee: quote.delivery_fee,
            total: quote.total,
            estimated_delivery_time,
        })
    }
}

/// What the backend hands back once the order row exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedOrder {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub status: OrderStatus,
    pub estimated_delivery_time: DateTime<Utc>,
}

// Backends hand out either serial integers or text/uuid keys.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
