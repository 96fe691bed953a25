//! Arrow utility functions for data type conversions and operations
//!
//! This module provides utility functions for working with Arrow arrays and data types,
//! with a focus on extracting individual cells as normalized, hashable [`MatchValue`]s
//! so that cells from two different record batches can be compared for equality.

use crate::algorithm::matching::types::MatchValue;
use crate::error::Result;
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, LargeStringArray, StringArray,
    StringViewArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::util::display::array_value_to_string;

const MILLIS_PER_DAY: i64 = 86_400_000;

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        ArrowError::CastError(format!(
            "Array with data type {} could not be downcast",
            array.data_type()
        ))
        .into()
    })
}

/// Normalize a floating point value
///
/// Finite integral values become [`MatchValue::Integer`] so that `30` and `30.0`
/// compare equal. `-0.0` folds into `0`, and every NaN shares one bit pattern.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn normalize_float(value: f64) -> MatchValue {
    if value.is_nan() {
        return MatchValue::Float(f64::NAN.to_bits());
    }

    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    if value.fract() == 0.0 && in_range {
        return MatchValue::Integer(value as i64);
    }

    MatchValue::Float(value.to_bits())
}

/// Extract the value at `index` of an Arrow array as a [`MatchValue`]
///
/// Nulls become [`MatchValue::Null`]. Types without a dedicated variant fall back to
/// their display representation, which still gives exact equality for values of the
/// same type.
///
/// # Arguments
/// * `array` - The Arrow array
/// * `index` - The index of the value to extract
pub fn arrow_array_to_match_value(array: &ArrayRef, index: usize) -> Result<MatchValue> {
    if array.is_null(index) {
        return Ok(MatchValue::Null);
    }

    let value = match array.data_type() {
        DataType::Boolean => MatchValue::Boolean(downcast::<BooleanArray>(array)?.value(index)),
        DataType::Int8 => {
            MatchValue::Integer(i64::from(downcast::<Int8Array>(array)?.value(index)))
        }
        DataType::Int16 => {
            MatchValue::Integer(i64::from(downcast::<Int16Array>(array)?.value(index)))
        }
        DataType::Int32 => {
            MatchValue::Integer(i64::from(downcast::<Int32Array>(array)?.value(index)))
        }
        DataType::Int64 => MatchValue::Integer(downcast::<Int64Array>(array)?.value(index)),
        DataType::UInt8 => {
            MatchValue::Integer(i64::from(downcast::<UInt8Array>(array)?.value(index)))
        }
        DataType::UInt16 => {
            MatchValue::Integer(i64::from(downcast::<UInt16Array>(array)?.value(index)))
        }
        DataType::UInt32 => {
            MatchValue::Integer(i64::from(downcast::<UInt32Array>(array)?.value(index)))
        }
        DataType::UInt64 => {
            let raw = downcast::<UInt64Array>(array)?.value(index);
            // Values above i64::MAX cannot collide with any signed value
            i64::try_from(raw)
                .map_or_else(|_| MatchValue::Other(raw.to_string()), MatchValue::Integer)
        }
        DataType::Float32 => {
            normalize_float(f64::from(downcast::<Float32Array>(array)?.value(index)))
        }
        DataType::Float64 => normalize_float(downcast::<Float64Array>(array)?.value(index)),
        DataType::Utf8 => {
            MatchValue::Text(downcast::<StringArray>(array)?.value(index).to_string())
        }
        DataType::LargeUtf8 => {
            MatchValue::Text(downcast::<LargeStringArray>(array)?.value(index).to_string())
        }
        DataType::Utf8View => {
            MatchValue::Text(downcast::<StringViewArray>(array)?.value(index).to_string())
        }
        DataType::Date32 => MatchValue::Date(downcast::<Date32Array>(array)?.value(index)),
        DataType::Date64 => {
            let millis = downcast::<Date64Array>(array)?.value(index);
            let days = millis.div_euclid(MILLIS_PER_DAY);
            i32::try_from(days)
                .map_or_else(|_| MatchValue::Other(millis.to_string()), MatchValue::Date)
        }
        _ => MatchValue::Other(array_value_to_string(array, index)?),
    };

    Ok(value)
}
