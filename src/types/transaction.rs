//! Transaction record submitted for fraud scoring

use crate::error::{ScoringError, ScoringResult};
use crate::features::temporal::parse_timestamp;
use serde::{Deserialize, Serialize};

/// A transaction as submitted through the scoring form.
///
/// Every field arrives as text; a missing key and an empty value are
/// treated alike. Use [`Transaction::try_from`] to validate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionForm {
    #[serde(rename = "TransactionId", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "BatchId", default)]
    pub batch_id: Option<String>,
    #[serde(rename = "AccountId", default)]
    pub account_id: Option<String>,
    #[serde(rename = "SubscriptionId", default)]
    pub subscription_id: Option<String>,
    #[serde(rename = "CustomerId", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "CurrencyCode", default)]
    pub currency_code: Option<String>,
    #[serde(rename = "CountryCode", default)]
    pub country_code: Option<String>,
    #[serde(rename = "ProviderId", default)]
    pub provider_id: Option<String>,
    #[serde(rename = "ProductId", default)]
    pub product_id: Option<String>,
    #[serde(rename = "ProductCategory", default)]
    pub product_category: Option<String>,
    #[serde(rename = "ChannelId", default)]
    pub channel_id: Option<String>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
    #[serde(rename = "TransactionStartTime", default)]
    pub transaction_start_time: Option<String>,
    #[serde(rename = "PricingStrategy", default)]
    pub pricing_strategy: Option<String>,
}

/// A validated transaction record.
///
/// Only `customer_id`, `transaction_id`, `amount`, `value`,
/// `transaction_start_time` and `pricing_strategy` feed the feature
/// pipeline; the rest is carried for the response echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    pub transaction_id: i64,
    pub batch_id: i64,
    pub account_id: i64,
    pub subscription_id: i64,
    pub customer_id: i64,
    pub currency_code: String,
    pub country_code: String,
    pub provider_id: i64,
    pub product_id: i64,
    pub product_category: String,
    pub channel_id: i64,
    pub amount: f64,
    pub value: f64,
    /// Raw timestamp text; parsed by the temporal extractor
    pub transaction_start_time: String,
    /// `None` when left blank; imputed from the most frequent label
    pub pricing_strategy: Option<String>,
}

impl Transaction {
    /// Create a transaction with the fields the pipeline reads; the
    /// remaining identifiers are zeroed.
    pub fn new(
        transaction_id: i64,
        customer_id: i64,
        amount: f64,
        value: f64,
        transaction_start_time: &str,
        pricing_strategy: Option<&str>,
    ) -> Self {
        Self {
            transaction_id,
            batch_id: 0,
            account_id: 0,
            subscription_id: 0,
            customer_id,
            currency_code: "UGX".to_string(),
            country_code: "256".to_string(),
            provider_id: 0,
            product_id: 0,
            product_category: String::new(),
            channel_id: 0,
            amount,
            value,
            transaction_start_time: transaction_start_time.to_string(),
            pricing_strategy: pricing_strategy.map(str::to_string),
        }
    }
}

impl TryFrom<TransactionForm> for Transaction {
    type Error = ScoringError;

    fn try_from(form: TransactionForm) -> ScoringResult<Self> {
        Ok(Self {
            transaction_id: parse_int("TransactionId", form.transaction_id)?,
            batch_id: parse_int("BatchId", form.batch_id)?,
            account_id: parse_int("AccountId", form.account_id)?,
            subscription_id: parse_int("SubscriptionId", form.subscription_id)?,
            customer_id: parse_int("CustomerId", form.customer_id)?,
            currency_code: required_text("CurrencyCode", form.currency_code)?,
            country_code: required_text("CountryCode", form.country_code)?,
            provider_id: parse_int("ProviderId", form.provider_id)?,
            product_id: parse_int("ProductId", form.product_id)?,
            product_category: required_text("ProductCategory", form.product_category)?,
            channel_id: parse_int("ChannelId", form.channel_id)?,
            amount: parse_decimal("Amount", form.amount)?,
            value: parse_decimal("Value", form.value)?,
            transaction_start_time: parse_start_time(form.transaction_start_time)?,
            pricing_strategy: optional_text(form.pricing_strategy),
        })
    }
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required_text(field: &str, raw: Option<String>) -> ScoringResult<String> {
    optional_text(raw).ok_or_else(|| ScoringError::validation(field, "missing value"))
}

/// Keep the raw text for the echo, but reject it now if it will not parse.
fn parse_start_time(raw: Option<String>) -> ScoringResult<String> {
    let text = required_text("TransactionStartTime", raw)?;
    parse_timestamp(&text)?;
    Ok(text)
}

fn parse_int(field: &str, raw: Option<String>) -> ScoringResult<i64> {
    let text = required_text(field, raw)?;
    text.parse::<i64>()
        .map_err(|e| ScoringError::validation(field, format!("{text:?} is not an integer ({e})")))
}

fn parse_decimal(field: &str, raw: Option<String>) -> ScoringResult<f64> {
    let text = required_text(field, raw)?;
    let value = text
        .parse::<f64>()
        .map_err(|e| ScoringError::validation(field, format!("{text:?} is not a number ({e})")))?;
    if !value.is_finite() {
        return Err(ScoringError::validation(
            field,
            format!("{text:?} is not a finite number"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_form() -> TransactionForm {
        TransactionForm {
            transaction_id: Some("1".into()),
            batch_id: Some("101".into()),
            account_id: Some("1001".into()),
            subscription_id: Some("2001".into()),
            customer_id: Some("3001".into()),
            currency_code: Some("USD".into()),
            country_code: Some("US".into()),
            provider_id: Some("1".into()),
            product_id: Some("4001".into()),
            product_category: Some("A".into()),
            channel_id: Some("1".into()),
            amount: Some("100.0".into()),
            value: Some("10.0".into()),
            transaction_start_time: Some("2023-01-02 11:00:00".into()),
            pricing_strategy: Some("A".into()),
        }
    }

    #[test]
    fn test_valid_form_parses() {
        let tx = Transaction::try_from(sample_form()).unwrap();

        assert_eq!(tx.transaction_id, 1);
        assert_eq!(tx.customer_id, 3001);
        assert_eq!(tx.amount, 100.0);
        assert_eq!(tx.value, 10.0);
        assert_eq!(tx.transaction_start_time, "2023-01-02 11:00:00");
        assert_eq!(tx.pricing_strategy.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let mut form = sample_form();
        form.customer_id = None;

        let err = Transaction::try_from(form).unwrap_err();
        assert_eq!(err.field(), Some("CustomerId"));
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_malformed_amount_rejected() {
        let mut form = sample_form();
        form.amount = Some("12,5".into());
        assert_eq!(
            Transaction::try_from(form).unwrap_err().field(),
            Some("Amount")
        );

        let mut form = sample_form();
        form.value = Some("NaN".into());
        assert_eq!(
            Transaction::try_from(form).unwrap_err().field(),
            Some("Value")
        );
    }

    #[test]
    fn test_unparseable_start_time_rejected() {
        let mut form = sample_form();
        form.transaction_start_time = Some("not-a-date".into());

        let err = Transaction::try_from(form).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert_eq!(err.field(), Some("TransactionStartTime"));
    }

    #[test]
    fn test_blank_pricing_strategy_is_left_for_imputation() {
        let mut form = sample_form();
        form.pricing_strategy = Some("   ".into());

        let tx = Transaction::try_from(form).unwrap();
        assert_eq!(tx.pricing_strategy, None);
    }

    #[test]
    fn test_transaction_echo_uses_form_field_names() {
        let tx = Transaction::try_from(sample_form()).unwrap();
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["TransactionId"], 1);
        assert_eq!(json["TransactionStartTime"], "2023-01-02 11:00:00");
        assert_eq!(json["PricingStrategy"], "A");
    }
}
