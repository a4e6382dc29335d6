//! Denomination ledger for the itemized cash count.
//!
//! The set of coins and bills is closed, so counts live in a fixed ordered
//! table indexed by [`Denomination`] rather than a keyed map.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::money::parse_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenominationKind {
    Coin,
    Bill,
}

/// One of the 15 accepted coin and bill values, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Denomination {
    Cents1,
    Cents2,
    Cents5,
    Cents10,
    Cents20,
    Cents50,
    Coin1,
    Coin2,
    Bill5,
    Bill10,
    Bill20,
    Bill50,
    Bill100,
    Bill200,
    Bill500,
}

pub const DENOMINATION_COUNT: usize = 15;

impl Denomination {
    pub const ALL: [Denomination; DENOMINATION_COUNT] = [
        Denomination::Cents1,
        Denomination::Cents2,
        Denomination::Cents5,
        Denomination::Cents10,
        Denomination::Cents20,
        Denomination::Cents50,
        Denomination::Coin1,
        Denomination::Coin2,
        Denomination::Bill5,
        Denomination::Bill10,
        Denomination::Bill20,
        Denomination::Bill50,
        Denomination::Bill100,
        Denomination::Bill200,
        Denomination::Bill500,
    ];

    /// Face value in cents.
    fn cents(self) -> i64 {
        match self {
            Denomination::Cents1 => 1,
            Denomination::Cents2 => 2,
            Denomination::Cents5 => 5,
            Denomination::Cents10 => 10,
            Denomination::Cents20 => 20,
            Denomination::Cents50 => 50,
            Denomination::Coin1 => 100,
            Denomination::Coin2 => 200,
            Denomination::Bill5 => 500,
            Denomination::Bill10 => 1_000,
            Denomination::Bill20 => 2_000,
            Denomination::Bill50 => 5_000,
            Denomination::Bill100 => 10_000,
            Denomination::Bill200 => 20_000,
            Denomination::Bill500 => 50_000,
        }
    }

    /// Face value with two-digit precision.
    pub fn value(self) -> Decimal {
        Decimal::new(self.cents(), 2)
    }

    /// Label used on the count sheet and as the key in submitted details.
    pub fn label(self) -> &'static str {
        match self {
            Denomination::Cents1 => "0.01",
            Denomination::Cents2 => "0.02",
            Denomination::Cents5 => "0.05",
            Denomination::Cents10 => "0.10",
            Denomination::Cents20 => "0.20",
            Denomination::Cents50 => "0.50",
            Denomination::Coin1 => "1",
            Denomination::Coin2 => "2",
            Denomination::Bill5 => "5",
            Denomination::Bill10 => "10",
            Denomination::Bill20 => "20",
            Denomination::Bill50 => "50",
            Denomination::Bill100 => "100",
            Denomination::Bill200 => "200",
            Denomination::Bill500 => "500",
        }
    }

    pub fn kind(self) -> DenominationKind {
        if self.cents() <= 200 {
            DenominationKind::Coin
        } else {
            DenominationKind::Bill
        }
    }

    /// Resolve a written face value ("0.1", "0.10", "50", "50.00").
    pub fn from_label(label: &str) -> Option<Self> {
        let value = Decimal::from_str(label.trim()).ok()?;
        Self::ALL.into_iter().find(|d| d.value() == value)
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenominationLedger {
    counts: [u32; DENOMINATION_COUNT],
}

impl DenominationLedger {
    /// Store the count typed for one denomination. Bad input is read as 0.
    pub fn set_count(&mut self, denomination: Denomination, raw: &str) {
        self.counts[denomination.index()] = parse_count(raw);
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts[denomination.index()]
    }

    pub fn line_total(&self, denomination: Denomination) -> Decimal {
        denomination.value() * Decimal::from(self.count(denomination))
    }

    /// Σ value × count across every denomination.
    pub fn subtotal(&self) -> Decimal {
        Denomination::ALL
            .into_iter()
            .map(|d| self.line_total(d))
            .sum()
    }

    /// All `(denomination, count)` pairs in table order.
    pub fn lines(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        Denomination::ALL.into_iter().map(|d| (d, self.count(d)))
    }

    pub fn lines_of(
        &self,
        kind: DenominationKind,
    ) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.lines().filter(move |(d, _)| d.kind() == kind)
    }

    /// Subtotal of coins only, or bills only.
    pub fn subtotal_of(&self, kind: DenominationKind) -> Decimal {
        self.lines_of(kind)
            .map(|(d, _)| self.line_total(d))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }

    pub fn reset(&mut self) {
        self.counts = [0; DENOMINATION_COUNT];
    }
}
