use std::convert::TryFrom;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rand::distributions::{Bernoulli, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use sha2::{Digest, Sha256};
use uuid::{Builder, Uuid};

use crate::config::GeneratorConfig;
use crate::distribution::AmountSampler;
use crate::error::GenError;
use crate::reference::{
    Bank, CardType, Currency, DeviceType, Location, Mcc, Network, PaymentMethod, Provider,
    TransactionStatus, MERCHANTS,
};

/// Number of hex characters kept from the customer id digest.
pub const CUSTOMER_ID_LEN: usize = 10;

/// One draw, before it is flattened into a [`crate::record::TransactionRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTransaction {
    pub id: Uuid,
    pub provider: Provider,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub merchant_name: &'static str,
    pub mcc: Mcc,
    pub location: Location,
    pub issuing_bank: Bank,
    pub hashed_customer_id: String,
    pub network: Network,
    pub card_type: CardType,
    pub is_reversal: bool,
    pub status: TransactionStatus,
    pub currency: Currency,
    pub device_type: DeviceType,
    pub payment_method: PaymentMethod,
}

pub struct Sampler {
    rng: StdRng,
    amount: AmountSampler,
    currencies: Vec<Currency>,
    currency_index: WeightedIndex<f64>,
    reversal: Bernoulli,
    window_start: DateTime<Utc>,
    window_micros: i64,
}

impl Sampler {
    /// Builds a sampler whose timestamps fall in the `window_days` leading up to `now`.
    ///
    /// # Errors
    /// Errors when the amount distribution parameters, currency weights or reversal
    /// probability in `config` cannot form a distribution, or the window reaches past the
    /// earliest representable date
    pub fn new(config: &GeneratorConfig, now: DateTime<Utc>) -> Result<Self, GenError> {
        let seed = config.seed.unwrap_or_else(|| thread_rng().gen());
        let amount = AmountSampler::try_from(config.amount)?;
        let (currencies, weights): (Vec<Currency>, Vec<f64>) =
            config.currency_weights.iter().copied().unzip();
        let currency_index = WeightedIndex::new(weights)?;
        let reversal = Bernoulli::new(config.reversal_probability)
            .map_err(|e| GenError::InvalidConfig(e.to_string()))?;
        let window = Duration::days(i64::from(config.window_days));
        let window_micros = window
            .num_microseconds()
            .ok_or_else(|| GenError::InvalidConfig("window_days is too large".into()))?;
        let window_start = now.checked_sub_signed(window).ok_or_else(|| {
            GenError::InvalidConfig("window_days reaches before the earliest date".into())
        })?;

        Ok(Sampler {
            rng: StdRng::seed_from_u64(seed),
            amount,
            currencies,
            currency_index,
            reversal,
            window_start,
            window_micros,
        })
    }

    /// # Errors
    /// Errors only when a reference list turns out to be empty, which is a defect in the tables
    pub fn sample(&mut self) -> Result<SampledTransaction, GenError> {
        let device_type: DeviceType = self.rng.gen();
        let payment_method = *choose(
            &mut self.rng,
            device_type.payment_methods(),
            "payment methods",
        )?;
        let network = *choose(&mut self.rng, payment_method.networks(), "networks")?;
        let card_type = *choose(&mut self.rng, payment_method.card_types(), "card types")?;

        let merchant = choose(&mut self.rng, &MERCHANTS, "merchants")?;
        let mcc = *choose(&mut self.rng, merchant.mcc_codes, "merchant category codes")?;
        let location = *choose(&mut self.rng, merchant.locations, "merchant locations")?;

        let id = self.random_uuid();
        let customer = self.random_uuid();
        let offset = self.rng.gen_range(0..=self.window_micros);

        Ok(SampledTransaction {
            id,
            provider: self.rng.gen(),
            amount: self.rng.sample(self.amount),
            timestamp: self.window_start + Duration::microseconds(offset),
            merchant_name: merchant.name,
            mcc,
            location,
            issuing_bank: self.rng.gen(),
            hashed_customer_id: pseudonymize(&customer),
            network,
            card_type,
            is_reversal: self.rng.sample(self.reversal),
            status: self.rng.gen(),
            currency: self.currencies[self.rng.sample(&self.currency_index)],
            device_type,
            payment_method,
        })
    }

    /// # Errors
    /// See [`Sampler::sample`]
    pub fn sample_batch(&mut self, count: usize) -> Result<Vec<SampledTransaction>, GenError> {
        debug!("Sampling {} transactions", count);
        (0..count).map(|_| self.sample()).collect()
    }

    fn random_uuid(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }
}

fn choose<'a, T>(
    rng: &mut StdRng,
    items: &'a [T],
    kind: &'static str,
) -> Result<&'a T, GenError> {
    items.choose(rng).ok_or(GenError::EmptyReference(kind))
}

/// Short stand-in for a customer id: the leading hex digits of its SHA-256.
#[must_use]
pub fn pseudonymize(id: &Uuid) -> String {
    let digest = Sha256::digest(id.to_string().as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(CUSTOMER_ID_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use chrono::TimeZone;

    use super::*;
    use crate::reference::merchant;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn seeded(seed: u64) -> Sampler {
        let config = GeneratorConfig {
            seed: Some(seed),
            ..Default::default()
        };
        Sampler::new(&config, now()).unwrap()
    }

    #[test]
    fn test_choices_respect_reference_tables() {
        let batch = seeded(1).sample_batch(5_000).unwrap();
        for tx in &batch {
            assert!(tx.device_type.payment_methods().contains(&tx.payment_method));
            assert!(tx.payment_method.networks().contains(&tx.network));
            assert!(tx.payment_method.card_types().contains(&tx.card_type));

            let m = merchant(tx.merchant_name).unwrap();
            assert!(m.mcc_codes.contains(&tx.mcc));
            assert!(m.locations.contains(&tx.location));
        }
    }

    #[test]
    fn test_online_gateway_never_sees_amex_or_debit() {
        let batch = seeded(2).sample_batch(5_000).unwrap();
        let online: Vec<_> = batch
            .iter()
            .filter(|tx| tx.payment_method == PaymentMethod::OnlineGateway)
            .collect();
        assert!(!online.is_empty());
        assert!(online.iter().all(|tx| tx.network != Network::Amex));
        assert!(online.iter().all(|tx| tx.card_type == CardType::Credit));
        assert!(batch
            .iter()
            .filter(|tx| tx.device_type == DeviceType::Desktop)
            .all(|tx| tx.payment_method == PaymentMethod::OnlineGateway));
    }

    #[allow(clippy::cast_precision_loss)]
    #[test]
    fn test_currency_converges_to_weights() {
        let n = 50_000;
        let batch = seeded(3).sample_batch(n).unwrap();
        let mut counts: HashMap<Currency, usize> = HashMap::new();
        for tx in &batch {
            *counts.entry(tx.currency).or_default() += 1;
        }
        let config = GeneratorConfig::default();
        let total: f64 = config.currency_weights.iter().map(|(_, w)| w).sum();
        for (currency, weight) in &config.currency_weights {
            let expected = weight / total;
            let observed = *counts.get(currency).unwrap_or(&0) as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "{currency}: expected {expected:.4}, observed {observed:.4}"
            );
        }
    }

    #[allow(clippy::cast_precision_loss)]
    #[test]
    fn test_reversals_are_rare() {
        let n = 50_000;
        let batch = seeded(4).sample_batch(n).unwrap();
        let rate = batch.iter().filter(|tx| tx.is_reversal).count() as f64 / n as f64;
        assert!((rate - 0.01).abs() < 0.003, "rate was {rate}");
    }

    #[test]
    fn test_timestamps_fall_in_trailing_window() {
        let batch = seeded(5).sample_batch(2_000).unwrap();
        let start = now() - Duration::days(730);
        assert!(batch
            .iter()
            .all(|tx| tx.timestamp >= start && tx.timestamp <= now()));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = seeded(6).sample_batch(50).unwrap();
        let b = seeded(6).sample_batch(50).unwrap();
        let c = seeded(7).sample_batch(50).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_identifiers() {
        let batch = seeded(8).sample_batch(1_000).unwrap();
        let ids: HashSet<_> = batch.iter().map(|tx| tx.id).collect();
        assert_eq!(ids.len(), batch.len());
        for tx in &batch {
            assert_eq!(tx.id.get_version_num(), 4);
            assert_eq!(tx.hashed_customer_id.len(), CUSTOMER_ID_LEN);
            assert!(tx
                .hashed_customer_id
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_pseudonymize_is_stable() {
        let id = Uuid::nil();
        assert_eq!(pseudonymize(&id), pseudonymize(&id));
        assert_eq!(pseudonymize(&id).len(), CUSTOMER_ID_LEN);
    }

    #[test]
    fn test_window_past_calendar_range_is_rejected() {
        let config = GeneratorConfig {
            window_days: 100_000_000,
            ..Default::default()
        };
        assert!(matches!(
            Sampler::new(&config, now()),
            Err(GenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_weights_are_rejected() {
        let config = GeneratorConfig {
            currency_weights: vec![(Currency::Isk, 0.0), (Currency::Usd, 0.0)],
            ..Default::default()
        };
        assert!(matches!(
            Sampler::new(&config, now()),
            Err(GenError::WeightsError(_))
        ));
    }
}
