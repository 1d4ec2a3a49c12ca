use common::{Error, Result};
use datafusion::common::ParamValues;
use datafusion::scalar::ScalarValue;
use serde::Deserialize;

/// Optional filters over trip records. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TripFilter {
    pub vendor_id: Option<i64>,
    pub passenger_count: Option<i64>,
    /// 0 = Monday .. 6 = Sunday
    pub pickup_day: Option<i64>,
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
}

impl TripFilter {
    /// Rejects a day-of-week outside 0..=6. Duration bounds are not
    /// cross-checked; an inverted range simply matches nothing.
    pub fn validate(&self) -> Result<()> {
        if let Some(day) = self.pickup_day {
            if !(0..=6).contains(&day) {
                return Err(Error::InvalidInput(format!(
                    "pickup_day must be between 0 (Monday) and 6 (Sunday), got {}",
                    day
                )));
            }
        }
        Ok(())
    }
}

/// Left-hand sides a condition may use. Only these fixed expressions ever
/// reach the predicate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripColumn {
    VendorId,
    PassengerCount,
    PickupWeekday,
    TripDuration,
}

impl TripColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TripColumn::VendorId => "vendor_id",
            TripColumn::PassengerCount => "passenger_count",
            // date_part('dow') counts from Sunday; shift so Monday is 0
            TripColumn::PickupWeekday => {
                "CAST((date_part('dow', pickup_datetime) + 6) % 7 AS BIGINT)"
            }
            TripColumn::TripDuration => "trip_duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    GtEq,
    LtEq,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::GtEq => ">=",
            Comparison::LtEq => "<=",
        }
    }
}

/// A conjunctive predicate with positional `$n` placeholders and the values
/// bound to them, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<ScalarValue>,
}

impl Predicate {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[ScalarValue] {
        &self.params
    }

    pub fn param_values(&self) -> ParamValues {
        ParamValues::List(self.params.clone())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PredicateBuilder {
    conditions: Vec<String>,
    params: Vec<ScalarValue>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `column <op> $n`, binding `value` as parameter `n`.
    pub fn condition(mut self, column: TripColumn, comparison: Comparison, value: i64) -> Self {
        self.params.push(ScalarValue::Int64(Some(value)));
        self.conditions.push(format!(
            "{} {} ${}",
            column.as_sql(),
            comparison.as_sql(),
            self.params.len()
        ));
        self
    }

    fn condition_opt(self, column: TripColumn, comparison: Comparison, value: Option<i64>) -> Self {
        match value {
            Some(value) => self.condition(column, comparison, value),
            None => self,
        }
    }

    /// Clause order is fixed: vendor, passenger count, weekday, min
    /// duration, max duration.
    pub fn from_filter(filter: &TripFilter) -> Predicate {
        Self::new()
            .condition_opt(TripColumn::VendorId, Comparison::Eq, filter.vendor_id)
            .condition_opt(TripColumn::PassengerCount, Comparison::Eq, filter.passenger_count)
            .condition_opt(TripColumn::PickupWeekday, Comparison::Eq, filter.pickup_day)
            .condition_opt(TripColumn::TripDuration, Comparison::GtEq, filter.min_duration)
            .condition_opt(TripColumn::TripDuration, Comparison::LtEq, filter.max_duration)
            .build()
    }

    pub fn build(self) -> Predicate {
        let sql = if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        Predicate {
            sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> ScalarValue {
        ScalarValue::Int64(Some(value))
    }

    #[test]
    fn test_no_filters_is_tautology() {
        let predicate = PredicateBuilder::from_filter(&TripFilter::default());
        assert_eq!(predicate.sql(), "TRUE");
        assert!(predicate.params().is_empty());
        assert!(predicate.is_unconstrained());
    }

    #[test]
    fn test_all_filters_in_fixed_order() {
        let filter = TripFilter {
            vendor_id: Some(2),
            passenger_count: Some(3),
            pickup_day: Some(6),
            min_duration: Some(120),
            max_duration: Some(3600),
        };
        let predicate = PredicateBuilder::from_filter(&filter);

        assert_eq!(
            predicate.sql(),
            "vendor_id = $1 AND passenger_count = $2 AND \
             CAST((date_part('dow', pickup_datetime) + 6) % 7 AS BIGINT) = $3 AND \
             trip_duration >= $4 AND trip_duration <= $5"
        );
        assert_eq!(
            predicate.params(),
            &[int(2), int(3), int(6), int(120), int(3600)]
        );
    }

    #[test]
    fn test_placeholders_renumber_for_sparse_filters() {
        let filter = TripFilter {
            passenger_count: Some(1),
            max_duration: Some(900),
            ..Default::default()
        };
        let predicate = PredicateBuilder::from_filter(&filter);

        assert_eq!(predicate.sql(), "passenger_count = $1 AND trip_duration <= $2");
        assert_eq!(predicate.params(), &[int(1), int(900)]);
    }

    #[test]
    fn test_values_never_appear_in_predicate_text() {
        let filter = TripFilter {
            vendor_id: Some(987_654_321),
            passenger_count: Some(-424_242),
            pickup_day: None,
            min_duration: Some(555_555),
            max_duration: Some(777_777),
        };
        let predicate = PredicateBuilder::from_filter(&filter);

        for needle in ["987654321", "424242", "555555", "777777"] {
            assert!(!predicate.sql().contains(needle), "{} leaked into SQL", needle);
        }
        assert_eq!(predicate.params().len(), 4);
    }

    #[test]
    fn test_inverted_duration_range_is_accepted() {
        let filter = TripFilter {
            min_duration: Some(1000),
            max_duration: Some(100),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
        let predicate = PredicateBuilder::from_filter(&filter);
        assert_eq!(predicate.params(), &[int(1000), int(100)]);
    }

    #[test]
    fn test_each_filter_contributes_one_condition() {
        let single = [
            TripFilter { vendor_id: Some(1), ..Default::default() },
            TripFilter { passenger_count: Some(1), ..Default::default() },
            TripFilter { pickup_day: Some(0), ..Default::default() },
            TripFilter { min_duration: Some(1), ..Default::default() },
            TripFilter { max_duration: Some(1), ..Default::default() },
        ];
        for filter in single {
            let predicate = PredicateBuilder::from_filter(&filter);
            assert_eq!(predicate.params().len(), 1);
            assert!(predicate.sql().ends_with("$1"));
            assert!(!predicate.sql().contains(" AND "));
        }
    }

    #[test]
    fn test_weekday_out_of_range_rejected() {
        for day in [-1, 7] {
            let filter = TripFilter { pickup_day: Some(day), ..Default::default() };
            assert!(matches!(filter.validate(), Err(Error::InvalidInput(_))));
        }
    }
}
