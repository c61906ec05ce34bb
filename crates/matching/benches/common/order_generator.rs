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

use bourse_matching::{OrderCommand, OrderType, Side};
use rust_decimal::Decimal;

#[derive(Clone, Copy)]
pub enum Scenario {
	/// Bids and asks on disjoint price ranges; every order rests
	NoCross,
	/// Alternating sides on overlapping prices; most orders trade
	CrossHeavy,
	/// Book built wide, then swept by market orders
	DeepBook,
}

pub struct OrderGenerator {
	counter: u64,
	scenario: Scenario,
}

impl OrderGenerator {
	pub fn new(scenario: Scenario) -> Self {
		Self {
			counter: 0,
			scenario,
		}
	}

	pub fn next_order(&mut self) -> OrderCommand {
		self.counter += 1;
		let n = self.counter;

		match self.scenario {
			Scenario::NoCross => {
				if n.is_multiple_of(2) {
					limit(n, Side::Buy, 44_000 + n % 1_000, 1)
				} else {
					limit(n, Side::Sell, 46_000 + n % 1_000, 1)
				}
			}
			Scenario::CrossHeavy => {
				let side = if n.is_multiple_of(2) { Side::Buy } else { Side::Sell };
				limit(n, side, 45_000 + n % 10, 1 + n % 3)
			}
			Scenario::DeepBook => match n % 10 {
				0 => market_sell(n, 5),
				5 => market_buy(n, 250_000),
				r if r < 5 => limit(n, Side::Buy, 44_000 + n % 500, 1),
				_ => limit(n, Side::Sell, 45_000 + n % 500, 1),
			},
		}
	}
}

fn base(n: u64, side: Side, order_type: OrderType) -> OrderCommand {
	OrderCommand {
		order_id: format!("bench-{}", n),
		sequence_id: n,
		uid: n % 64,
		side,
		order_type,
		price: Decimal::ZERO,
		qty: Decimal::ZERO,
		amount: Decimal::ZERO,
		is_cancel: false,
	}
}

fn limit(n: u64, side: Side, price: u64, qty: u64) -> OrderCommand {
	OrderCommand {
		price: Decimal::from(price),
		qty: Decimal::from(qty),
		..base(n, side, OrderType::Limit)
	}
}

fn market_sell(n: u64, qty: u64) -> OrderCommand {
	OrderCommand {
		qty: Decimal::from(qty),
		..base(n, Side::Sell, OrderType::Market)
	}
}

fn market_buy(n: u64, amount: u64) -> OrderCommand {
	OrderCommand {
		amount: Decimal::from(amount),
		..base(n, Side::Buy, OrderType::Market)
	}
}
