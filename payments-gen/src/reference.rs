//! Fixed reference tables the sampler draws from.
//!
//! Every enum carries its output label, parses back from that label and can be drawn uniformly
//! with `rng.gen()`. Enums with a payload (allowed payment methods, networks, card types, tax ids,
//! codes) expose it through a `const`-backed lookup returning `&'static` data.
use std::fmt;
use std::str::FromStr;

use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GenError;

macro_rules! reference_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = GenError;
            fn from_str(label: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.label() == label)
                    .ok_or_else(|| GenError::UnknownLabel {
                        kind: $kind,
                        label: label.to_string(),
                    })
            }
        }

        impl Distribution<$name> for Standard {
            fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> $name {
                $name::ALL[rng.gen_range(0..$name::ALL.len())]
            }
        }
    };
}

reference_enum! {
    TransactionStatus as "transaction status" {
        Completed => "Completed",
        Pending => "Pending",
        Failed => "Failed",
        Reversed => "Reversed",
    }
}

reference_enum! {
    Currency as "currency" {
        Isk => "ISK",
        Usd => "USD",
        Eur => "EUR",
        Gbp => "GBP",
        Jpy => "JPY",
    }
}

reference_enum! {
    Network as "network" {
        Visa => "Visa",
        MasterCard => "MasterCard",
        Amex => "AMEX",
        Discover => "Discover",
    }
}

reference_enum! {
    CardType as "card type" {
        Credit => "Credit",
        Debit => "Debit",
    }
}

reference_enum! {
    DeviceType as "device type" {
        Mobile => "Mobile",
        Tablet => "Tablet",
        Desktop => "Desktop",
        PosTerminal => "POS",
    }
}

reference_enum! {
    PaymentMethod as "payment method" {
        Nfc => "NFC",
        EmvChip => "EMV Chip",
        MagneticStripe => "Magnetic Stripe",
        OnlineGateway => "Online Payment Gateway",
    }
}

reference_enum! {
    /// Payment service providers, written out by tax id.
    Provider as "provider" {
        Rapyd => "Rapyd",
        Taya => "Taya",
        Straumur => "Straumur",
    }
}

reference_enum! {
    /// Merchant category codes.
    Mcc as "merchant category" {
        Airlines => "Airlines",
        GroceryStores => "Grocery Stores",
        Hotels => "Hotels",
        OfficeSupplies => "Office Supplies",
        AutomatedFuelDispensers => "Automated Fuel Dispensers",
        Electronics => "Electronics",
        GasStations => "Gas Stations",
        Pharmacies => "Pharmacies",
    }
}

reference_enum! {
    /// Banks acting as either acquirer or issuer, written out by tax id.
    Bank as "bank" {
        Landsbankinn => "Landsbankinn",
        Arion => "Arion",
        Islandsbanki => "Islandsbanki",
    }
}

reference_enum! {
    /// Merchant locations, written out by postal code.
    Location as "location" {
        Kopavogur => "Kopavogur",
        Reykjavik => "Reykjavik",
        Akureyri => "Akureyri",
        Hafnarfjordur => "Hafnarfjordur",
        Keflavik => "Keflavik",
    }
}

const ALL_NETWORKS: &[Network] = &[
    Network::Visa,
    Network::MasterCard,
    Network::Amex,
    Network::Discover,
];

impl DeviceType {
    /// Payment methods a device of this type can present.
    #[must_use]
    pub fn payment_methods(self) -> &'static [PaymentMethod] {
        match self {
            DeviceType::Mobile | DeviceType::Tablet => {
                &[PaymentMethod::Nfc, PaymentMethod::OnlineGateway]
            }
            DeviceType::Desktop => &[PaymentMethod::OnlineGateway],
            DeviceType::PosTerminal => &[
                PaymentMethod::Nfc,
                PaymentMethod::EmvChip,
                PaymentMethod::MagneticStripe,
                PaymentMethod::OnlineGateway,
            ],
        }
    }
}

impl PaymentMethod {
    #[must_use]
    pub fn networks(self) -> &'static [Network] {
        match self {
            PaymentMethod::Nfc | PaymentMethod::EmvChip | PaymentMethod::MagneticStripe => {
                ALL_NETWORKS
            }
            PaymentMethod::OnlineGateway => &[Network::Visa, Network::MasterCard],
        }
    }

    #[must_use]
    pub fn card_types(self) -> &'static [CardType] {
        match self {
            PaymentMethod::Nfc | PaymentMethod::OnlineGateway => &[CardType::Credit],
            PaymentMethod::EmvChip | PaymentMethod::MagneticStripe => {
                &[CardType::Credit, CardType::Debit]
            }
        }
    }
}

impl Provider {
    #[must_use]
    pub fn tax_id(self) -> i64 {
        match self {
            Provider::Rapyd => 5_006_830_589,
            Provider::Taya => 4_406_861_259,
            Provider::Straumur => 6_209_221_020,
        }
    }
}

impl Mcc {
    /// The four digit code as it appears on the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Mcc::Airlines => "3000",
            Mcc::GroceryStores => "5411",
            Mcc::Hotels => "7011",
            Mcc::OfficeSupplies => "5111",
            Mcc::AutomatedFuelDispensers => "5542",
            Mcc::Electronics => "5732",
            Mcc::GasStations => "5541",
            Mcc::Pharmacies => "5912",
        }
    }
}

impl Bank {
    #[must_use]
    pub fn tax_id(self) -> i64 {
        match self {
            Bank::Landsbankinn => 4_710_080_280,
            Bank::Arion => 5_810_080_150,
            Bank::Islandsbanki => 4_910_080_160,
        }
    }
}

impl Location {
    #[must_use]
    pub fn postal_code(self) -> u16 {
        match self {
            Location::Kopavogur => 200,
            Location::Reykjavik => 101,
            Location::Akureyri => 600,
            Location::Hafnarfjordur => 220,
            Location::Keflavik => 230,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Merchant {
    pub name: &'static str,
    /// Tax id, kept as text since that is how merchants report it.
    pub ssn: &'static str,
    pub mcc_codes: &'static [Mcc],
    pub bank: Bank,
    pub locations: &'static [Location],
}

pub static MERCHANTS: [Merchant; 6] = [
    Merchant {
        name: "KRONAN",
        ssn: "7112982239",
        mcc_codes: &[Mcc::GroceryStores, Mcc::Pharmacies],
        bank: Bank::Landsbankinn,
        locations: &[Location::Reykjavik, Location::Kopavogur, Location::Akureyri],
    },
    Merchant {
        name: "ELKO",
        ssn: "5610003280",
        mcc_codes: &[Mcc::Electronics],
        bank: Bank::Arion,
        locations: &[Location::Akureyri, Location::Keflavik],
    },
    Merchant {
        name: "N1",
        ssn: "4110033370",
        mcc_codes: &[Mcc::GasStations, Mcc::AutomatedFuelDispensers],
        bank: Bank::Islandsbanki,
        locations: &[Location::Hafnarfjordur],
    },
    Merchant {
        name: "BONUS",
        ssn: "4501993389",
        mcc_codes: &[Mcc::GroceryStores],
        bank: Bank::Landsbankinn,
        locations: &[Location::Reykjavik, Location::Kopavogur, Location::Akureyri],
    },
    Merchant {
        name: "OLIS",
        ssn: "5002693249",
        mcc_codes: &[Mcc::GasStations],
        bank: Bank::Arion,
        locations: &[Location::Reykjavik, Location::Hafnarfjordur, Location::Keflavik],
    },
    Merchant {
        name: "SAMKAUP",
        ssn: "5712983769",
        mcc_codes: &[Mcc::GroceryStores, Mcc::Pharmacies],
        bank: Bank::Islandsbanki,
        locations: &[Location::Akureyri, Location::Keflavik],
    },
];

/// # Errors
/// Errors when no merchant in [`MERCHANTS`] has the given `name`
pub fn merchant(name: &str) -> Result<&'static Merchant, GenError> {
    MERCHANTS
        .iter()
        .find(|merchant| merchant.name == name)
        .ok_or_else(|| GenError::UnknownMerchant(name.to_string()))
}
