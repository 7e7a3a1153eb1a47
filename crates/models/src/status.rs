//! String-backed enumerations stored in text columns.
//!
//! The database keeps the upper-case (or lower-case, for payment intents)
//! spelling; parsing is case-insensitive so query strings like `?status=paid`
//! are accepted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ModelError::Validation(format!(
                    "invalid {}: {} (expected one of {})",
                    $label,
                    s,
                    [$($text),+].join(", ")
                )))
            }
        }
    };
}

string_enum!(
    /// Account role; a user may hold several.
    Role, "role" {
        Customer => "CUSTOMER",
        Admin => "ADMIN",
    }
);

string_enum!(
    /// Order lifecycle. Transitions are not constrained.
    OrderStatus, "order status" {
        Pending => "PENDING",
        Paid => "PAID",
        Processing => "PROCESSING",
        Shipped => "SHIPPED",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
        Refunded => "REFUNDED",
    }
);

string_enum!(
    DisputeStatus, "dispute status" {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Resolved => "RESOLVED",
        Rejected => "REJECTED",
    }
);

string_enum!(
    /// Local view of a gateway transaction.
    PaymentStatus, "payment status" {
        Pending => "pending",
        Succeeded => "succeeded",
        Failed => "failed",
    }
);

impl OrderStatus {
    /// Statuses whose totals count as revenue.
    pub const REVENUE: &'static [OrderStatus] = &[
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];
}

impl DisputeStatus {
    /// A dispute in one of these states blocks a new one on the same order.
    pub const ACTIVE: &'static [DisputeStatus] = &[DisputeStatus::Open, DisputeStatus::InProgress];
}

pub fn as_strings<T: Copy>(items: &[T], f: impl Fn(T) -> &'static str) -> Vec<String> {
    items.iter().map(|i| f(*i).to_string()).collect()
}
