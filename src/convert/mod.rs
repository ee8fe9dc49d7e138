mod converter;
mod debounce;
mod math;

pub use converter::{ActiveField, ConversionOutcome, Converter, Field, FieldView, LinkedAmounts};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use math::{base_to_quote, parse_amount, quote_to_base};
