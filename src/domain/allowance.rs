//! Monthly weight allowance.
//!
//! A subscription carries a cap (`limit_in_kg`) and the weight already
//! consumed in the current period (`used_kg`). Creating an order reserves the
//! cart weight against the cap; cancelling a pending order releases it.

use thiserror::Error;

/// Tolerance for float noise when summing cart weights (`0.1 + 0.2`).
const EPSILON_KG: f64 = 1e-9;

/// Anything that contributes weight to an order.
pub trait Weighted {
    fn weight_in_kg(&self) -> f64;
}

impl Weighted for f64 {
    fn weight_in_kg(&self) -> f64 {
        *self
    }
}

/// Sum of the line weights.
pub fn total_weight_in_kg<'a, W, I>(items: I) -> f64
where
    W: Weighted + 'a,
    I: IntoIterator<Item = &'a W>,
{
    items
        .into_iter()
        .fold(0.0, |total, item| total + item.weight_in_kg())
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllowanceError {
    /// The order would push `used_kg` past `limit_in_kg`.
    #[error(
        "Subscription limit exceeded: {remaining_kg:.2} kg remaining, {requested_kg:.2} kg requested"
    )]
    Exceeded {
        remaining_kg: f64,
        requested_kg: f64,
    },

    #[error("Invalid order weight: {0}")]
    InvalidWeight(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allowance {
    pub limit_in_kg: f64,
    pub used_kg: f64,
}

impl Allowance {
    pub fn new(limit_in_kg: f64, used_kg: f64) -> Self {
        Self {
            limit_in_kg,
            used_kg,
        }
    }

    /// Capacity left in the period, never negative.
    pub fn remaining_kg(&self) -> f64 {
        (self.limit_in_kg - self.used_kg).max(0.0)
    }

    /// Returns the new `used_kg` after reserving `requested_kg`.
    pub fn reserve(&self, requested_kg: f64) -> Result<f64, AllowanceError> {
        if !requested_kg.is_finite() || requested_kg < 0.0 {
            return Err(AllowanceError::InvalidWeight(requested_kg));
        }

        let next = self.used_kg + requested_kg;
        if next > self.limit_in_kg + EPSILON_KG {
            return Err(AllowanceError::Exceeded {
                remaining_kg: self.remaining_kg(),
                requested_kg,
            });
        }

        // Keep `used_kg <= limit_in_kg` when the overshoot is only float noise.
        Ok(next.min(self.limit_in_kg.max(self.used_kg)))
    }

    /// Returns the new `used_kg` after giving `kg` back, floored at zero.
    pub fn release(&self, kg: f64) -> f64 {
        (self.used_kg - kg.max(0.0)).max(0.0)
    }
}
