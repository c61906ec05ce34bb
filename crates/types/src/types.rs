// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side a taker on this side trades against
	pub fn opposite(self) -> Side {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}

	pub fn is_buy(self) -> bool {
		matches!(self, Side::Buy)
	}
}

/// Order type
///
/// Limit orders carry a price and rest when not marketable. Market orders
/// execute against available liquidity and never rest: a market buy is
/// driven by quote-currency amount, a market sell by base-currency quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
	Limit,
	Market,
}

/// Order status
///
/// Transitions are monotone: `New -> PartFilled -> AllFilled`, or
/// `New -> Cancelled`. `AllFilled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	#[default]
	New,
	PartFilled,
	AllFilled,
	Cancelled,
}

impl OrderStatus {
	/// Whether no further transition can leave this status
	pub fn is_terminal(self) -> bool {
		matches!(self, OrderStatus::AllFilled | OrderStatus::Cancelled)
	}

	/// Whether an order in this status may rest in a book
	pub fn is_resting(self) -> bool {
		matches!(self, OrderStatus::New | OrderStatus::PartFilled)
	}
}
