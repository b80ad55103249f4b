//! Display currency and the fixed list users pick from.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl Currency {
    fn new(code: &str, symbol: &str, name: &str) -> Currency {
        Currency {
            code: code.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    /// The account default, USD.
    pub fn default_currency() -> Currency {
        Currency::new("USD", "$", "Dólar estadounidense")
    }

    /// Look up a currency by code in the fixed list.
    pub fn by_code(code: &str) -> Option<Currency> {
        CURRENCIES.iter().find(|c| c.code == code).cloned()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::default_currency()
    }
}

/// The selectable currencies. Display formatting only; stored magnitudes
/// are never converted.
pub static CURRENCIES: Lazy<Vec<Currency>> = Lazy::new(|| {
    vec![
        Currency::new("USD", "$", "Dólar estadounidense"),
        Currency::new("EUR", "€", "Euro"),
        Currency::new("MXN", "$", "Peso mexicano"),
        Currency::new("COP", "$", "Peso colombiano"),
        Currency::new("ARS", "$", "Peso argentino"),
        Currency::new("CLP", "$", "Peso chileno"),
        Currency::new("PEN", "S/", "Sol peruano"),
        Currency::new("BOB", "Bs", "Boliviano"),
        Currency::new("UYU", "$", "Peso uruguayo"),
        Currency::new("PYG", "₲", "Guaraní paraguayo"),
        Currency::new("VES", "Bs.", "Bolívar soberano"),
        Currency::new("BRL", "R$", "Real brasileño"),
        Currency::new("GBP", "£", "Libra esterlina"),
        Currency::new("JPY", "¥", "Yen japonés"),
        Currency::new("CNY", "¥", "Yuan chino"),
    ]
});

impl From<Currency> for shared::Currency {
    fn from(currency: Currency) -> Self {
        shared::Currency {
            code: currency.code,
            symbol: currency.symbol,
            name: currency.name,
        }
    }
}
