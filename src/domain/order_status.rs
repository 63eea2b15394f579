use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Invalid order status: {0}")]
    Invalid(String),

    #[error("Order is {0} and can no longer change status")]
    Terminal(OrderStatus),

    #[error("Only pending orders can be cancelled (order is {0})")]
    NotCancellable(OrderStatus),

    #[error("Order already paid")]
    AlreadyPaid,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Any whitelisted status may follow any other, except out of a terminal one.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, StatusError> {
        if self.is_terminal() {
            return Err(StatusError::Terminal(self));
        }
        Ok(next)
    }

    /// Customers may only withdraw an order nobody has started on.
    pub fn cancel(self) -> Result<OrderStatus, StatusError> {
        match self {
            OrderStatus::Pending => Ok(OrderStatus::Cancelled),
            other => Err(StatusError::NotCancellable(other)),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| StatusError::Invalid(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}
