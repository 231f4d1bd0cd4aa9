//! # Order Storage
//!
//! Repository trait for orders, items, and invite tokens, plus the
//! in-memory implementation used by the server and tests. Persistence
//! backends plug in behind the trait; mutations are committed here before
//! any live-update broadcast fires.

use std::sync::RwLock;

use super::model::{InviteToken, Order, OrderItem};
use crate::errors::{AppError, AppResult};

/// Order repository trait
pub trait OrderStore: Send + Sync {
    /// Insert a new order
    fn insert_order(&self, order: &Order) -> AppResult<()>;

    /// Find an order by id
    fn get_order(&self, order_id: &str) -> AppResult<Option<Order>>;

    /// Replace an existing order
    fn update_order(&self, order: &Order) -> AppResult<()>;

    /// Delete an order and cascade to its items and tokens
    fn delete_order(&self, order_id: &str) -> AppResult<()>;

    /// All orders created by this external key, newest first
    fn orders_by_creator(&self, external_key: &str) -> AppResult<Vec<Order>>;

    /// Insert a new item
    fn insert_item(&self, item: &OrderItem) -> AppResult<()>;

    /// Find an item scoped to its owning order
    fn get_item(&self, order_id: &str, item_id: &str) -> AppResult<Option<OrderItem>>;

    /// Replace an existing item
    fn update_item(&self, item: &OrderItem) -> AppResult<()>;

    /// Delete an item scoped to its owning order
    fn delete_item(&self, order_id: &str, item_id: &str) -> AppResult<()>;

    /// All items of an order, oldest first
    fn items_for_order(&self, order_id: &str) -> AppResult<Vec<OrderItem>>;

    /// Insert a new invite token
    fn insert_token(&self, token: &InviteToken) -> AppResult<()>;

    /// Find a token scoped to its order
    fn get_token(&self, order_id: &str, token: &str) -> AppResult<Option<InviteToken>>;
}

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
    items: RwLock<Vec<OrderItem>>,
    tokens: RwLock<Vec<InviteToken>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Storage("Lock poisoned".to_string())
}

impl OrderStore for MemoryOrderStore {
    fn insert_order(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        orders.push(order.clone());
        Ok(())
    }

    fn get_order(&self, order_id: &str) -> AppResult<Option<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    fn update_order(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }

    fn delete_order(&self, order_id: &str) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        let before = orders.len();
        orders.retain(|o| o.id != order_id);
        if orders.len() == before {
            return Err(AppError::NotFound);
        }
        drop(orders);

        // Cascade: items and tokens are owned exclusively by their order
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.retain(|i| i.order_id != order_id);
        drop(items);

        let mut tokens = self.tokens.write().map_err(|_| poisoned())?;
        tokens.retain(|t| t.order_id != order_id);
        Ok(())
    }

    fn orders_by_creator(&self, external_key: &str) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut found: Vec<Order> = orders
            .iter()
            .filter(|o| o.creator_external_key.as_deref() == Some(external_key))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    fn insert_item(&self, item: &OrderItem) -> AppResult<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.push(item.clone());
        Ok(())
    }

    fn get_item(&self, order_id: &str, item_id: &str) -> AppResult<Option<OrderItem>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items
            .iter()
            .find(|i| i.id == item_id && i.order_id == order_id)
            .cloned())
    }

    fn update_item(&self, item: &OrderItem) -> AppResult<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }

    fn delete_item(&self, order_id: &str, item_id: &str) -> AppResult<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let before = items.len();
        items.retain(|i| !(i.id == item_id && i.order_id == order_id));
        if items.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn items_for_order(&self, order_id: &str) -> AppResult<Vec<OrderItem>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        let mut found: Vec<OrderItem> = items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    fn insert_token(&self, token: &InviteToken) -> AppResult<()> {
        let mut tokens = self.tokens.write().map_err(|_| poisoned())?;
        tokens.push(token.clone());
        Ok(())
    }

    fn get_token(&self, order_id: &str, token: &str) -> AppResult<Option<InviteToken>> {
        let tokens = self.tokens.read().map_err(|_| poisoned())?;
        Ok(tokens
            .iter()
            .find(|t| t.token == token && t.order_id == order_id)
            .cloned())
    }
}
