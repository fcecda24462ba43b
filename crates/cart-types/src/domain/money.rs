//! Currency amounts held as integer cents.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("not a decimal amount: {0}")]
    Parse(String),

    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// An amount in minor units (cents). Arithmetic never goes through
/// floating point, so sums of many small prices stay exact.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    /// Largest price a single cart entry or fee may carry (1,000,000.00).
    /// Keeping entries under this bound keeps every cart total far from
    /// `i64` overflow.
    pub const MAX_PRICE: Money = Money { cents: 100_000_000 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub const fn cents(self) -> i64 {
        self.cents
    }

    /// Converts a decimal amount such as `8.50`. Sub-cent precision is
    /// rejected rather than rounded.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > 2 {
            return Err(MoneyError::TooPrecise(amount));
        }
        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.to_i64())
            .ok_or(MoneyError::OutOfRange(amount))?;
        Ok(Self { cents })
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.cents, 2)
    }

    pub const fn is_negative(self) -> bool {
        self.cents < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Fails with [`MoneyError::OutOfRange`] above [`Money::MAX_PRICE`].
    pub fn bounded(self) -> Result<Money, MoneyError> {
        if self > Money::MAX_PRICE {
            return Err(MoneyError::OutOfRange(self.to_decimal()));
        }
        Ok(self)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount = Decimal::from_str(trimmed).map_err(|_| MoneyError::Parse(s.to_string()))?;
        Self::from_decimal(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

// The operators assume bounded operands; see `Money::MAX_PRICE`.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::from_cents(self.cents + rhs.cents)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.cents += rhs.cents;
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money::from_cents(self.cents * i64::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings_into_cents() {
        assert_eq!("8.50".parse::<Money>().unwrap().cents(), 850);
        assert_eq!("5".parse::<Money>().unwrap().cents(), 500);
        assert_eq!("$0.10".parse::<Money>().unwrap().cents(), 10);
        assert_eq!(" 12.3 ".parse::<Money>().unwrap().cents(), 1230);
        assert_eq!("1.500".parse::<Money>().unwrap().cents(), 150);
    }

    #[test]
    fn rejects_sub_cent_and_garbage() {
        assert!(matches!(
            "0.125".parse::<Money>(),
            Err(MoneyError::TooPrecise(_))
        ));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Parse(_))));
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(2200).to_string(), "22.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn ten_thousand_dimes_sum_exactly() {
        let dime: Money = "0.10".parse().unwrap();
        let total: Money = std::iter::repeat(dime).take(10_000).sum();
        assert_eq!(total, Money::from_cents(100_000));
        assert_eq!(total.to_string(), "1000.00");
    }

    #[test]
    fn prices_above_the_cap_are_out_of_range() {
        let cap: Money = "1000000.00".parse().unwrap();
        assert_eq!(cap.bounded(), Ok(Money::MAX_PRICE));

        let huge: Money = "92233720368547758.07".parse().unwrap();
        assert!(matches!(huge.bounded(), Err(MoneyError::OutOfRange(_))));
        assert!(matches!(
            "92233720368547758.08".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn serializes_as_integer_cents() {
        let json = serde_json::to_string(&Money::from_cents(850)).unwrap();
        assert_eq!(json, "850");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), 850);
    }
}
