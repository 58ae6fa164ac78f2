use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::Serialize;

use crate::error::GenError;
use crate::reference::merchant;
use crate::sampler::SampledTransaction;

pub const NUM_DECIMAL_PLACES: u32 = 4;

/// Output column names, in file order.
pub const COLUMNS: [&str; 18] = [
    "id",
    "provider",
    "transaction_value",
    "timestamp",
    "merchant_name",
    "merchant_ssn",
    "merchant_mcc",
    "acquiring_bank",
    "issuing_bank",
    "hashed_customer_id",
    "network",
    "card_type",
    "is_reversal",
    "transaction_status",
    "currency",
    "merchant_location",
    "device_type",
    "payment_method",
];

/// A flat output row. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub id: String,
    pub provider: i64,
    pub transaction_value: Decimal,
    pub timestamp: DateTime<Utc>,
    pub merchant_name: String,
    pub merchant_ssn: Option<i64>,
    pub merchant_mcc: Option<i64>,
    pub acquiring_bank: i64,
    pub issuing_bank: i64,
    pub hashed_customer_id: String,
    pub network: String,
    pub card_type: String,
    pub is_reversal: bool,
    pub transaction_status: String,
    pub currency: String,
    pub merchant_location: Option<i64>,
    pub device_type: String,
    pub payment_method: String,
}

/// Reads a numeric-looking field as an integer, `None` when it does not parse.
fn coerce_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

impl TryFrom<&SampledTransaction> for TransactionRecord {
    type Error = GenError;
    fn try_from(sample: &SampledTransaction) -> Result<Self, Self::Error> {
        let merchant = merchant(sample.merchant_name)?;
        let mut transaction_value =
            Decimal::from_f64(sample.amount).ok_or(GenError::InvalidAmount(sample.amount))?;
        transaction_value.rescale(NUM_DECIMAL_PLACES);
        // rescale stops short of the target scale when the mantissa would overflow
        if transaction_value.scale() != NUM_DECIMAL_PLACES {
            return Err(GenError::InvalidAmount(sample.amount));
        }

        Ok(TransactionRecord {
            id: sample.id.to_string(),
            provider: sample.provider.tax_id(),
            transaction_value,
            timestamp: sample.timestamp,
            merchant_name: merchant.name.to_string(),
            merchant_ssn: coerce_int(merchant.ssn),
            merchant_mcc: coerce_int(sample.mcc.code()),
            acquiring_bank: merchant.bank.tax_id(),
            issuing_bank: sample.issuing_bank.tax_id(),
            hashed_customer_id: sample.hashed_customer_id.clone(),
            network: sample.network.to_string(),
            card_type: sample.card_type.to_string(),
            is_reversal: sample.is_reversal,
            transaction_status: sample.status.to_string(),
            currency: sample.currency.to_string(),
            merchant_location: Some(i64::from(sample.location.postal_code())),
            device_type: sample.device_type.to_string(),
            payment_method: sample.payment_method.to_string(),
        })
    }
}

/// # Errors
/// Errors when a sample names a merchant missing from the table, or carries an amount that is
/// not finite or too large to keep [`NUM_DECIMAL_PLACES`] decimal places
pub fn assemble(samples: &[SampledTransaction]) -> Result<Vec<TransactionRecord>, GenError> {
    samples.iter().map(TransactionRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::reference::{
        Bank, CardType, Currency, DeviceType, Location, Mcc, Network, PaymentMethod, Provider,
        TransactionStatus,
    };

    fn sample() -> SampledTransaction {
        SampledTransaction {
            id: Uuid::nil(),
            provider: Provider::Taya,
            amount: 1234.567_891,
            timestamp: Utc.with_ymd_and_hms(2023, 7, 4, 9, 30, 0).unwrap(),
            merchant_name: "N1",
            mcc: Mcc::AutomatedFuelDispensers,
            location: Location::Hafnarfjordur,
            issuing_bank: Bank::Arion,
            hashed_customer_id: "0123456789".to_string(),
            network: Network::Amex,
            card_type: CardType::Debit,
            is_reversal: false,
            status: TransactionStatus::Pending,
            currency: Currency::Isk,
            device_type: DeviceType::PosTerminal,
            payment_method: PaymentMethod::EmvChip,
        }
    }

    #[test]
    fn test_assemble_pulls_merchant_attributes() {
        let record = TransactionRecord::try_from(&sample()).unwrap();
        assert_eq!(record.merchant_name, "N1");
        assert_eq!(record.merchant_ssn, Some(4_110_033_370));
        assert_eq!(record.acquiring_bank, Bank::Islandsbanki.tax_id());
        assert_eq!(record.issuing_bank, Bank::Arion.tax_id());
        assert_eq!(record.provider, 4_406_861_259);
        assert_eq!(record.merchant_mcc, Some(5542));
        assert_eq!(record.merchant_location, Some(220));
        assert_eq!(record.network, "AMEX");
        assert_eq!(record.device_type, "POS");
        assert_eq!(record.payment_method, "EMV Chip");
        assert_eq!(record.id, "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_amount_is_rescaled() {
        let record = TransactionRecord::try_from(&sample()).unwrap();
        assert_eq!(record.transaction_value.scale(), NUM_DECIMAL_PLACES);
        assert_eq!(record.transaction_value, Decimal::new(12_345_679, 4));
    }

    #[test]
    fn test_unknown_merchant_fails() {
        let mut bad = sample();
        bad.merchant_name = "HAGKAUP";
        assert!(matches!(
            TransactionRecord::try_from(&bad),
            Err(GenError::UnknownMerchant(_))
        ));

        let mut nan = sample();
        nan.amount = f64::NAN;
        assert!(matches!(
            assemble(&[sample(), nan]),
            Err(GenError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_too_large_for_scale_fails() {
        let mut huge = sample();
        huge.amount = 1e25;
        assert!(matches!(
            TransactionRecord::try_from(&huge),
            Err(GenError::InvalidAmount(_))
        ));

        let mut large = sample();
        large.amount = 1e20;
        let record = TransactionRecord::try_from(&large).unwrap();
        assert_eq!(record.transaction_value.scale(), NUM_DECIMAL_PLACES);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("0101"), Some(101));
        assert_eq!(coerce_int(" 5411 "), Some(5411));
        assert_eq!(coerce_int("n/a"), None);
    }
}
