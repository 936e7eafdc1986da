use std::fmt;

use serde_json::Value as Json;

use crate::content::params::{ParamKind, ParamSpec, validate_params};
use crate::error::SchemaError;

const FAKER_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("generator", ParamKind::String, true),
    ParamSpec::new("locale", ParamKind::String, false),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FakerLocale {
    #[default]
    En,
    FrFr,
    PtBr,
}

impl FakerLocale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "en" | "en_us" => Some(Self::En),
            "fr_fr" => Some(Self::FrFr),
            "pt_br" => Some(Self::PtBr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::FrFr => "fr_fr",
            Self::PtBr => "pt_br",
        }
    }
}

impl fmt::Display for FakerLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! faker_kinds {
    ($($variant:ident => [$($name:literal),+]),+ $(,)?) => {
        /// Closed catalog of faker generators.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum FakerKind {
            $($variant,)+
        }

        impl FakerKind {
            pub const ALL: &'static [FakerKind] = &[$(FakerKind::$variant,)+];

            /// Looks up a generator by its canonical name or one of its aliases.
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($($name)|+ => Some(FakerKind::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(FakerKind::$variant => faker_kinds!(@first $($name),+),)+
                }
            }
        }
    };
    (@first $first:literal $(, $rest:literal)*) => {
        $first
    };
}

faker_kinds! {
    FirstName => ["first_name"],
    LastName => ["last_name"],
    Name => ["name"],
    NameWithTitle => ["name_with_title"],
    Title => ["title", "prefix"],
    Suffix => ["suffix"],
    Username => ["username", "user_name"],
    FreeEmail => ["free_email"],
    SafeEmail => ["safe_email", "email"],
    FreeEmailProvider => ["free_email_provider"],
    DomainSuffix => ["domain_suffix"],
    Ipv4 => ["ipv4"],
    Ipv6 => ["ipv6"],
    MacAddress => ["mac_address"],
    UserAgent => ["user_agent"],
    CityName => ["city_name", "city"],
    CountryName => ["country_name", "country"],
    CountryCode => ["country_code"],
    StreetName => ["street_name"],
    StreetSuffix => ["street_suffix"],
    BuildingNumber => ["building_number"],
    ZipCode => ["zip_code", "postcode"],
    StateName => ["state_name", "state"],
    StateAbbr => ["state_abbr"],
    TimeZone => ["time_zone", "timezone"],
    CompanyName => ["company_name", "company"],
    CompanySuffix => ["company_suffix"],
    Industry => ["industry"],
    Profession => ["profession", "job"],
    Buzzword => ["buzzword"],
    CatchPhrase => ["catch_phrase"],
    Bs => ["bs"],
    PhoneNumber => ["phone_number"],
    CellNumber => ["cell_number"],
    CurrencyCode => ["currency_code"],
    CurrencyName => ["currency_name"],
    CurrencySymbol => ["currency_symbol"],
    CreditCardNumber => ["credit_card_number", "credit_card"],
    Word => ["word"],
    Sentence => ["sentence"],
    Paragraph => ["paragraph"],
    FileName => ["file_name"],
    FileExtension => ["file_extension"],
}

impl fmt::Display for FakerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakerContent {
    pub kind: FakerKind,
    pub locale: FakerLocale,
}

impl FakerContent {
    /// Accepts either `"first_name"` or `{"generator": "first_name", "locale": "fr_fr"}`.
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let (name, locale) = match body {
            Json::String(name) => (name.as_str(), None),
            _ => {
                let params = validate_params(body, FAKER_PARAMS, path)?;
                (params.require_str("generator")?, params.get_str("locale"))
            }
        };

        let kind = FakerKind::parse(name).ok_or_else(|| SchemaError::UnknownFaker {
            path: path.to_string(),
            name: name.to_string(),
        })?;
        let locale = match locale {
            Some(locale) => FakerLocale::parse(locale).ok_or_else(|| {
                SchemaError::invalid(path, format!("unsupported faker locale '{locale}'"))
            })?,
            None => FakerLocale::default(),
        };
        Ok(Self { kind, locale })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(FakerKind::parse("email"), Some(FakerKind::SafeEmail));
        assert_eq!(FakerKind::SafeEmail.as_str(), "safe_email");
        assert_eq!(FakerKind::parse("user_name"), Some(FakerKind::Username));
        for kind in FakerKind::ALL {
            assert_eq!(FakerKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn unknown_generators_are_schema_errors() {
        let result = FakerContent::parse(&json!({"generator": "shoe_size"}), "users.shoe");
        assert!(matches!(result, Err(SchemaError::UnknownFaker { name, .. }) if name == "shoe_size"));
    }

    #[test]
    fn locales_are_case_insensitive() {
        let parsed = FakerContent::parse(&json!({"generator": "city", "locale": "pt_BR"}), "c")
            .expect("parse");
        assert_eq!(parsed.locale, FakerLocale::PtBr);
        assert!(FakerContent::parse(&json!({"generator": "city", "locale": "xx"}), "c").is_err());
    }
}
