#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resource wallet, construction prices, and refunds.
//!
//! The wallet holds fractional stocks so that per-second income accumulates
//! smoothly across ticks; prices and refunds are whole units.

use std::ops::Add;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_defence_core::{
    DestinationKind, EnemyKind, GroundKind, Stock, TileContent, TowerKind,
};
use tracing::debug;

/// Whole-unit price across every stock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    /// Food units.
    pub food: u32,
    /// Wood units.
    pub wood: u32,
    /// Metal units.
    pub metal: u32,
    /// Crystal units.
    pub crystal: u32,
    /// Gold units.
    pub gold: u32,
}

impl Cost {
    /// Price of nothing.
    pub const FREE: Cost = Cost::new(0, 0, 0, 0, 0);

    /// Creates a price from explicit amounts.
    #[must_use]
    pub const fn new(food: u32, wood: u32, metal: u32, crystal: u32, gold: u32) -> Self {
        Self {
            food,
            wood,
            metal,
            crystal,
            gold,
        }
    }

    /// Price consisting of a single stock.
    #[must_use]
    pub fn of(stock: Stock, amount: u32) -> Self {
        let mut cost = Self::FREE;
        *cost.slot_mut(stock) = amount;
        cost
    }

    /// Amount of the provided stock.
    #[must_use]
    pub const fn amount(&self, stock: Stock) -> u32 {
        match stock {
            Stock::Food => self.food,
            Stock::Wood => self.wood,
            Stock::Metal => self.metal,
            Stock::Crystal => self.crystal,
            Stock::Gold => self.gold,
        }
    }

    /// Whether the price is zero for every stock.
    #[must_use]
    pub fn is_free(&self) -> bool {
        Stock::ALL.iter().all(|stock| self.amount(*stock) == 0)
    }

    /// Share of the raw materials returned when the purchase is torn down.
    ///
    /// Amounts are truncated toward zero and gold is never returned.
    #[must_use]
    pub fn recycled(&self, fraction: f32) -> Self {
        let share = |amount: u32| (amount as f32 * fraction.max(0.0)) as u32;
        Self::new(
            share(self.food),
            share(self.wood),
            share(self.metal),
            share(self.crystal),
            0,
        )
    }

    fn slot_mut(&mut self, stock: Stock) -> &mut u32 {
        match stock {
            Stock::Food => &mut self.food,
            Stock::Wood => &mut self.wood,
            Stock::Metal => &mut self.metal,
            Stock::Crystal => &mut self.crystal,
            Stock::Gold => &mut self.gold,
        }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        Cost::new(
            self.food.saturating_add(other.food),
            self.wood.saturating_add(other.wood),
            self.metal.saturating_add(other.metal),
            self.crystal.saturating_add(other.crystal),
            self.gold.saturating_add(other.gold),
        )
    }
}

/// Raised when a purchase exceeds the wallet's stocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("insufficient resources for {cost:?}")]
pub struct InsufficientFunds {
    /// Price that could not be paid.
    pub cost: Cost,
}

/// Fractional stocks and the income feeding them.
#[derive(Clone, Debug, PartialEq)]
pub struct Wallet {
    stocks: [f32; 5],
    income: [f32; 5],
}

impl Wallet {
    /// Creates a wallet holding the provided starting stocks and no income.
    #[must_use]
    pub fn new(starting: Cost) -> Self {
        Self {
            stocks: Stock::ALL.map(|stock| starting.amount(stock) as f32),
            income: [0.0; 5],
        }
    }

    /// Rebuilds a wallet from persisted stocks and income.
    #[must_use]
    pub const fn from_parts(stocks: [f32; 5], income: [f32; 5]) -> Self {
        Self { stocks, income }
    }

    /// Current amount of the provided stock.
    #[must_use]
    pub const fn amount(&self, stock: Stock) -> f32 {
        self.stocks[stock.slot()]
    }

    /// Units of the provided stock produced per second.
    #[must_use]
    pub const fn income(&self, stock: Stock) -> f32 {
        self.income[stock.slot()]
    }

    /// Every stock in wallet order.
    #[must_use]
    pub const fn stocks(&self) -> [f32; 5] {
        self.stocks
    }

    /// Every income rate in wallet order.
    #[must_use]
    pub const fn incomes(&self) -> [f32; 5] {
        self.income
    }

    /// Whether every stock covers its share of the price.
    #[must_use]
    pub fn can_afford(&self, cost: &Cost) -> bool {
        Stock::ALL
            .iter()
            .all(|stock| self.amount(*stock) >= cost.amount(*stock) as f32)
    }

    /// Deducts the price from the wallet.
    ///
    /// # Errors
    ///
    /// Leaves the wallet untouched when any stock falls short.
    pub fn spend(&mut self, cost: &Cost) -> Result<(), InsufficientFunds> {
        if !self.can_afford(cost) {
            return Err(InsufficientFunds { cost: *cost });
        }
        for stock in Stock::ALL {
            self.stocks[stock.slot()] -= cost.amount(stock) as f32;
        }
        Ok(())
    }

    /// Adds whole units to the wallet.
    pub fn earn(&mut self, amount: &Cost) {
        for stock in Stock::ALL {
            self.stocks[stock.slot()] += amount.amount(stock) as f32;
        }
    }

    /// Replaces the income with the gathering of every destination.
    ///
    /// Each contributing neighbour yields `rate` units per second.
    pub fn set_income<I>(&mut self, gathering: I, rate: f32)
    where
        I: IntoIterator<Item = (Stock, u32)>,
    {
        let mut income = [0.0; 5];
        for (stock, count) in gathering {
            income[stock.slot()] += count as f32 * rate;
        }
        if income != self.income {
            debug!(?income, "wallet income changed");
        }
        self.income = income;
    }

    /// Accrues income for `seconds` of simulated time.
    pub fn collect(&mut self, seconds: f32) {
        for (stock, rate) in self.stocks.iter_mut().zip(self.income) {
            *stock += rate * seconds;
        }
    }
}

/// Prices of everything the player can construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildCosts {
    /// Price of a wall.
    pub wall: Cost,
    /// Price of a laser tower.
    pub laser_tower: Cost,
    /// Price of an archer tower.
    pub archer_tower: Cost,
    /// Price of a farm.
    pub farm: Cost,
    /// Price of a camp.
    pub camp: Cost,
    /// Price of a bridge.
    pub bridge: Cost,
}

impl Default for BuildCosts {
    fn default() -> Self {
        Self {
            wall: Cost::new(0, 2, 0, 0, 0),
            laser_tower: Cost::new(0, 2, 4, 2, 0),
            archer_tower: Cost::new(0, 5, 2, 0, 0),
            farm: Cost::new(0, 6, 0, 0, 0),
            camp: Cost::new(4, 6, 0, 0, 0),
            bridge: Cost::new(0, 8, 2, 0, 0),
        }
    }
}

impl BuildCosts {
    /// Price of constructing the content, if the player can build it.
    #[must_use]
    pub const fn cost_of(&self, content: TileContent) -> Option<Cost> {
        let cost = match content {
            TileContent::Wall => self.wall,
            TileContent::Tower(TowerKind::Laser) => self.laser_tower,
            TileContent::Tower(TowerKind::Archer) => self.archer_tower,
            TileContent::Destination(DestinationKind::Farm) => self.farm,
            TileContent::Destination(DestinationKind::Camp) => self.camp,
            TileContent::Ground(GroundKind::Bridge) => self.bridge,
            _ => return None,
        };
        Some(cost)
    }
}

/// Gold awarded for each defeated enemy kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounties {
    /// Gold for a small enemy.
    pub small: u32,
    /// Gold for a medium enemy.
    pub medium: u32,
    /// Gold for a large enemy.
    pub large: u32,
}

impl Default for Bounties {
    fn default() -> Self {
        Self {
            small: 1,
            medium: 2,
            large: 4,
        }
    }
}

impl Bounties {
    /// Gold awarded for defeating the provided kind.
    #[must_use]
    pub const fn for_kind(&self, kind: EnemyKind) -> u32 {
        match kind {
            EnemyKind::Small => self.small,
            EnemyKind::Medium => self.medium,
            EnemyKind::Large => self.large,
        }
    }
}

/// Economy tuning read from configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Stocks the wallet starts with.
    pub starting: Cost,
    /// Construction prices.
    pub costs: BuildCosts,
    /// Percentage of a building's price returned when it is demolished.
    pub recycle_percent: u32,
    /// Units of raw material yielded by clearing a resource deposit.
    pub resource_yield: u32,
    /// Units per second produced by each neighbour a destination gathers from.
    pub gathering_rate: f32,
    /// Gold awarded per defeated enemy.
    pub bounties: Bounties,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting: Cost::new(20, 40, 20, 10, 0),
            costs: BuildCosts::default(),
            recycle_percent: 50,
            resource_yield: 5,
            gathering_rate: 0.1,
            bounties: Bounties::default(),
        }
    }
}

impl EconomyConfig {
    /// Materials returned when `previous` is torn down.
    ///
    /// Buildings return their recycle share, resource deposits yield their
    /// stock in full, and anything else returns nothing.
    #[must_use]
    pub fn salvage(&self, previous: TileContent) -> Cost {
        if let TileContent::Resource(kind) = previous {
            return Cost::of(kind.stock(), self.resource_yield);
        }
        self.costs
            .cost_of(previous)
            .map_or(Cost::FREE, |cost| {
                cost.recycled(self.recycle_percent as f32 / 100.0)
            })
    }
}
