use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::config::SwapConfig;
use crate::convert::math::{base_to_quote, parse_amount, quote_to_base};
use crate::convert::{Debouncer, DEFAULT_DEBOUNCE};
use crate::pricing::QuoteCache;
use crate::types::{AssetSpec, PriceQuote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Base,
    Quote,
}

impl Field {
    pub fn other(self) -> Self {
        match self {
            Self::Base => Self::Quote,
            Self::Quote => Self::Base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveField {
    Base,
    Quote,
    #[default]
    None,
}

impl From<Field> for ActiveField {
    fn from(value: Field) -> Self {
        match value {
            Field::Base => Self::Base,
            Field::Quote => Self::Quote,
        }
    }
}

/// The pair of input boxes the converter writes into.
pub trait FieldView {
    fn set_text(&self, field: Field, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkedAmounts {
    pub base: Option<Decimal>,
    pub quote: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Updated {
        field: Field,
        value: Decimal,
        text: String,
    },
    Cleared {
        field: Field,
    },
    Suppressed,
    /// A later keystroke arrived before the debounce delay ran out.
    Superseded,
}

struct UpdateGuard<'a>(&'a Cell<bool>);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Keeps the base and quote amount fields consistent with the cached quote.
///
/// Single-threaded UI object: the guard is a plain `Cell`, so a change event raised
/// while the derived field is being written is dropped instead of recursing.
pub struct Converter {
    quotes: Arc<QuoteCache>,
    base_asset: AssetSpec,
    quote_asset: AssetSpec,
    active: Cell<ActiveField>,
    amounts: Cell<LinkedAmounts>,
    updating: Cell<bool>,
    debouncer: Debouncer,
}

impl Converter {
    pub fn new(quotes: Arc<QuoteCache>) -> Self {
        let base_asset = quotes.base_asset().clone();
        let quote_asset = quotes.quote_asset().clone();
        Self {
            quotes,
            base_asset,
            quote_asset,
            active: Cell::new(ActiveField::None),
            amounts: Cell::new(LinkedAmounts::default()),
            updating: Cell::new(false),
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
        }
    }

    pub fn from_config(quotes: Arc<QuoteCache>, config: &SwapConfig) -> Self {
        Self::new(quotes).with_debounce(config.debounce)
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn active_field(&self) -> ActiveField {
        self.active.get()
    }

    /// Unrounded amounts behind the two fields.
    pub fn last_values(&self) -> LinkedAmounts {
        self.amounts.get()
    }

    pub fn on_base_amount_changed(&self, new_value: &str, view: &dyn FieldView) -> ConversionOutcome {
        self.on_changed(Field::Base, new_value, view)
    }

    pub fn on_quote_amount_changed(
        &self,
        new_value: &str,
        view: &dyn FieldView,
    ) -> ConversionOutcome {
        self.on_changed(Field::Quote, new_value, view)
    }

    /// Keystroke entry point: converts only once input has been quiet for the debounce delay.
    pub async fn on_base_amount_typed(
        &self,
        new_value: &str,
        view: &dyn FieldView,
    ) -> ConversionOutcome {
        self.debounced(Field::Base, new_value, view).await
    }

    pub async fn on_quote_amount_typed(
        &self,
        new_value: &str,
        view: &dyn FieldView,
    ) -> ConversionOutcome {
        self.debounced(Field::Quote, new_value, view).await
    }

    /// Re-derives the passive field from the last edited amount, e.g. after a quote refresh.
    pub fn recompute(&self, view: &dyn FieldView) -> ConversionOutcome {
        let amounts = self.amounts.get();
        let edited = match (self.active.get(), amounts.base, amounts.quote) {
            (ActiveField::Base, Some(amount), _) => (Field::Base, amount),
            (ActiveField::Quote, _, Some(amount)) => (Field::Quote, amount),
            _ => return ConversionOutcome::Suppressed,
        };
        self.guarded(|| self.derive(edited.0, edited.1, view))
    }

    fn on_changed(&self, edited: Field, new_value: &str, view: &dyn FieldView) -> ConversionOutcome {
        self.guarded(|| match parse_amount(new_value) {
            Some(amount) => self.derive(edited, amount, view),
            None => self.clear(edited, view),
        })
    }

    async fn debounced(
        &self,
        edited: Field,
        new_value: &str,
        view: &dyn FieldView,
    ) -> ConversionOutcome {
        if !self.debouncer.settle().await {
            return ConversionOutcome::Superseded;
        }
        self.on_changed(edited, new_value, view)
    }

    fn guarded(&self, update: impl FnOnce() -> ConversionOutcome) -> ConversionOutcome {
        if self.updating.replace(true) {
            trace!("change event raised by a programmatic write, ignoring");
            return ConversionOutcome::Suppressed;
        }
        let _guard = UpdateGuard(&self.updating);
        update()
    }

    fn derive(&self, edited: Field, amount: Decimal, view: &dyn FieldView) -> ConversionOutcome {
        let quote: PriceQuote = self.quotes.get_quote();
        let derived = edited.other();
        let value = match edited {
            Field::Base => base_to_quote(amount, &quote),
            Field::Quote => quote_to_base(amount, &quote),
        };
        let Some(value) = value else {
            debug!(?edited, %amount, "converted amount overflows, clearing derived field");
            return self.clear(edited, view);
        };

        self.amounts.set(match edited {
            Field::Base => LinkedAmounts {
                base: Some(amount),
                quote: Some(value),
            },
            Field::Quote => LinkedAmounts {
                base: Some(value),
                quote: Some(amount),
            },
        });
        self.active.set(edited.into());

        let text = self.asset(derived).format_amount(value);
        view.set_text(derived, &text);
        trace!(?edited, %amount, %value, "derived field updated");

        ConversionOutcome::Updated {
            field: derived,
            value,
            text,
        }
    }

    fn clear(&self, edited: Field, view: &dyn FieldView) -> ConversionOutcome {
        let derived = edited.other();
        self.amounts.set(LinkedAmounts::default());
        self.active.set(ActiveField::None);
        view.set_text(derived, "");
        ConversionOutcome::Cleared { field: derived }
    }

    fn asset(&self, field: Field) -> &AssetSpec {
        match field {
            Field::Base => &self.base_asset,
            Field::Quote => &self.quote_asset,
        }
    }
}
