use super::TemplateError;
use super::expr::{Number, NumericArray, Operand, Values};

/// Reducers allowed as placeholder functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Len,
    Sum,
    Max,
    Min,
    Mean,
    Std,
}

impl Aggregate {
    pub const ALL: [Self; 6] = [
        Self::Len,
        Self::Sum,
        Self::Max,
        Self::Min,
        Self::Mean,
        Self::Std,
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|aggregate| aggregate.name() == name)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
            Self::Mean => "mean",
            Self::Std => "std",
        }
    }

    /// Reduces an evaluated expression to one number.
    ///
    /// `len` counts every element; the other reducers skip missing cells.
    /// `sum`, `max` and `min` keep integer input integer. Single-precision
    /// input gives single-precision results, so `E` columns print without
    /// widening noise. `mean` and `std` (population) always return floats.
    ///
    /// # Errors
    ///
    /// Returns an error for `len` of a scalar, and for `max`, `min`, `mean`
    /// or `std` when no cell is present.
    pub fn apply(self, operand: &Operand) -> Result<Number, TemplateError> {
        match operand {
            Operand::Scalar(value) => self.apply_scalar(*value),
            Operand::Array(array) => self.apply_array(array),
        }
    }

    fn apply_scalar(self, value: Number) -> Result<Number, TemplateError> {
        match self {
            Self::Len => Err(TemplateError::ScalarLen),
            Self::Sum | Self::Max | Self::Min => Ok(value),
            Self::Mean => Ok(match value {
                Number::Float32(_) => value,
                _ => Number::Float(value.as_f64()),
            }),
            Self::Std => Ok(match value {
                Number::Float32(v) => Number::Float32(v - v),
                _ => Number::Float(value.as_f64() - value.as_f64()),
            }),
        }
    }

    fn apply_array(self, array: &NumericArray) -> Result<Number, TemplateError> {
        let empty = || TemplateError::EmptyAggregate {
            function: self.name(),
        };
        match (self, &array.values) {
            (Self::Len, _) => Ok(Number::Int(
                i64::try_from(array.len()).unwrap_or(i64::MAX),
            )),
            (Self::Sum, Values::Int(values)) => Ok(Number::Int(
                present(values, &array.mask).fold(0_i64, i64::wrapping_add),
            )),
            (Self::Sum, Values::Float32(values)) => Ok(Number::Float32(
                present(values, &array.mask).fold(0.0, |acc, value| acc + value),
            )),
            (Self::Sum, Values::Float(values)) => {
                Ok(Number::Float(
                    present(values, &array.mask).fold(0.0, |acc, value| acc + value),
                ))
            }
            (Self::Max, Values::Int(values)) => present(values, &array.mask)
                .max()
                .map(Number::Int)
                .ok_or_else(empty),
            (Self::Min, Values::Int(values)) => present(values, &array.mask)
                .min()
                .map(Number::Int)
                .ok_or_else(empty),
            (Self::Max, Values::Float(values)) => extreme(present(values, &array.mask), f64::max)
                .map(Number::Float)
                .ok_or_else(empty),
            (Self::Min, Values::Float(values)) => extreme(present(values, &array.mask), f64::min)
                .map(Number::Float)
                .ok_or_else(empty),
            (Self::Max, Values::Float32(values)) => {
                extreme(present(values, &array.mask).map(f64::from), f64::max)
                    .map(narrow)
                    .ok_or_else(empty)
            }
            (Self::Min, Values::Float32(values)) => {
                extreme(present(values, &array.mask).map(f64::from), f64::min)
                    .map(narrow)
                    .ok_or_else(empty)
            }
            (Self::Mean, Values::Float32(_)) => {
                moments(array).map(|(mean, _)| narrow(mean)).ok_or_else(empty)
            }
            (Self::Std, Values::Float32(_)) => moments(array)
                .map(|(_, variance)| narrow(variance.sqrt()))
                .ok_or_else(empty),
            (Self::Mean, _) => moments(array)
                .map(|(mean, _)| Number::Float(mean))
                .ok_or_else(empty),
            (Self::Std, _) => moments(array)
                .map(|(_, variance)| Number::Float(variance.sqrt()))
                .ok_or_else(empty),
        }
    }
}

fn present<'a, T: Copy>(values: &'a [T], mask: &'a [bool]) -> impl Iterator<Item = T> + 'a {
    values
        .iter()
        .zip(mask)
        .filter(|(_, missing)| !**missing)
        .map(|(value, _)| *value)
}

/// Folds with `pick`; any NaN makes the result NaN.
fn extreme(mut values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    let first = values.next()?;
    Some(values.fold(first, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f64::NAN
        } else {
            pick(acc, value)
        }
    }))
}

#[allow(clippy::cast_possible_truncation)]
const fn narrow(value: f64) -> Number {
    Number::Float32(value as f32)
}

/// Mean and population variance of the present cells.
#[allow(clippy::cast_precision_loss)]
fn moments(array: &NumericArray) -> Option<(f64, f64)> {
    let floats: Vec<f64> = match &array.values {
        Values::Int(values) => present(values, &array.mask).map(|v| v as f64).collect(),
        Values::Float32(values) => present(values, &array.mask).map(f64::from).collect(),
        Values::Float(values) => present(values, &array.mask).collect(),
    };
    if floats.is_empty() {
        return None;
    }
    let count = floats.len() as f64;
    let mean = floats.iter().sum::<f64>() / count;
    let variance = floats
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / count;
    Some((mean, variance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[f64], mask: &[bool]) -> Operand {
        Operand::Array(NumericArray {
            values: Values::Float(values.to_vec()),
            mask: mask.to_vec(),
        })
    }

    fn ints(values: &[i64]) -> Operand {
        Operand::Array(NumericArray {
            values: Values::Int(values.to_vec()),
            mask: vec![false; values.len()],
        })
    }

    #[test]
    fn names_round_trip() {
        for aggregate in Aggregate::ALL {
            assert_eq!(Aggregate::from_name(aggregate.name()), Some(aggregate));
        }
        assert_eq!(Aggregate::from_name("median"), None);
        assert_eq!(Aggregate::from_name("MEAN"), None);
    }

    #[test]
    fn mean_and_std_are_population_statistics() {
        let flux = floats(&[10.0, 20.0, 30.0], &[false; 3]);
        assert_eq!(Aggregate::Mean.apply(&flux).unwrap().format(), "20.0");

        let sample = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(Aggregate::Std.apply(&sample), Ok(Number::Float(2.0)));
    }

    #[test]
    fn len_counts_missing_cells_but_reducers_skip_them() {
        let flux = floats(&[10.0, 99.0, 30.0], &[false, true, false]);
        assert_eq!(Aggregate::Len.apply(&flux), Ok(Number::Int(3)));
        assert_eq!(Aggregate::Sum.apply(&flux), Ok(Number::Float(40.0)));
        assert_eq!(Aggregate::Max.apply(&flux), Ok(Number::Float(30.0)));
        assert_eq!(Aggregate::Mean.apply(&flux), Ok(Number::Float(20.0)));
    }

    #[test]
    fn single_precision_reducers_print_shortest_digits() {
        let mag = Operand::Array(NumericArray {
            values: Values::Float32(vec![23.45, 0.1, 1.7]),
            mask: vec![false; 3],
        });
        let printed = |aggregate: Aggregate| aggregate.apply(&mag).unwrap().format();
        assert_eq!(printed(Aggregate::Max), "23.45");
        assert_eq!(printed(Aggregate::Min), "0.1");
        assert_eq!(printed(Aggregate::Sum), "25.250002");
        assert!(matches!(Aggregate::Mean.apply(&mag), Ok(Number::Float32(_))));
    }

    #[test]
    fn integer_reducers_keep_integer_type() {
        let ids = ints(&[3, 1, 2]);
        assert_eq!(Aggregate::Sum.apply(&ids), Ok(Number::Int(6)));
        assert_eq!(Aggregate::Min.apply(&ids), Ok(Number::Int(1)));
        assert_eq!(Aggregate::Max.apply(&ids), Ok(Number::Int(3)));
    }

    #[test]
    fn empty_and_scalar_inputs() {
        let all_missing = floats(&[1.0], &[true]);
        assert_eq!(
            Aggregate::Mean.apply(&all_missing),
            Err(TemplateError::EmptyAggregate { function: "mean" })
        );
        assert_eq!(Aggregate::Sum.apply(&all_missing), Ok(Number::Float(0.0)));
        assert_eq!(
            Aggregate::Len.apply(&Operand::Scalar(Number::Int(4))),
            Err(TemplateError::ScalarLen)
        );
        assert_eq!(
            Aggregate::Mean.apply(&Operand::Scalar(Number::Int(4))),
            Ok(Number::Float(4.0))
        );
    }
}
