use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParseError, category::Category};

/// Subscription tiers. Each one fixes the monthly cap and which product
/// categories may be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Basic,
    Standard,
    Premium,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Standard, Plan::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Standard => "standard",
            Plan::Premium => "premium",
        }
    }

    pub fn limit_in_kg(&self) -> f64 {
        match self {
            Plan::Basic => 5.0,
            Plan::Standard => 10.0,
            Plan::Premium => 20.0,
        }
    }

    pub fn allowed_categories(&self) -> &'static [Category] {
        match self {
            Plan::Basic => &[Category::Vegetables, Category::Fruits],
            Plan::Standard => &[
                Category::Vegetables,
                Category::Fruits,
                Category::Dairy,
                Category::Bakery,
            ],
            Plan::Premium => &Category::ALL,
        }
    }

    pub fn allows(&self, category: Category) -> bool {
        self.allowed_categories().contains(&category)
    }
}

impl FromStr for Plan {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseError::Plan(s.to_string()))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
