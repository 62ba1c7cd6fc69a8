use crate::error::{CutStockError, Result};

/// A single item type: width and how many pieces of it are demanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub width: f64,
    pub demand: u64,
}

/// A validated cutting stock instance: roll capacity and an ordered item list.
///
/// Construction performs all configuration checks, so every `Instance` in
/// circulation is solvable: positive capacity, at least one item, positive
/// widths not exceeding the capacity, demands of at least one.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub capacity: f64,
    pub items: Vec<Item>,
}

impl Instance {
    pub fn new(name: impl Into<String>, capacity: f64, items: Vec<Item>) -> Result<Self> {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(CutStockError::Configuration(format!(
                "capacity must be positive, got {capacity}"
            )));
        }
        if items.is_empty() {
            return Err(CutStockError::Configuration(
                "instance contains no items".into(),
            ));
        }
        for (i, item) in items.iter().enumerate() {
            if !item.width.is_finite() || item.width <= 0.0 {
                return Err(CutStockError::Configuration(format!(
                    "item {i} has non-positive width {}",
                    item.width
                )));
            }
            if item.width > capacity {
                return Err(CutStockError::Configuration(format!(
                    "item {i} is wider ({}) than the capacity ({capacity})",
                    item.width
                )));
            }
            if item.demand == 0 {
                return Err(CutStockError::Configuration(format!(
                    "item {i} has zero demand"
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            capacity,
            items,
        })
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn total_demand(&self) -> u64 {
        self.items.iter().map(|item| item.demand).sum()
    }
}
