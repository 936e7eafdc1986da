use fake::Fake;
use fake::faker::address::raw as address;
use fake::faker::company::raw as company;
use fake::faker::creditcard::raw as creditcard;
use fake::faker::currency::raw as currency;
use fake::faker::filesystem::raw as filesystem;
use fake::faker::internet::raw as internet;
use fake::faker::lorem::raw as lorem;
use fake::faker::name::raw as name;
use fake::faker::phone_number::raw as phone_number;
use fake::locales::{EN, FR_FR, PT_BR};
use rand::RngCore;

use weft_core::{FakerContent, FakerKind, FakerLocale, Value};

const SENTENCE_WORDS: std::ops::Range<usize> = 4..10;
const PARAGRAPH_SENTENCES: std::ops::Range<usize> = 3..6;

/// Faker match for one concrete locale. The `Dummy` impls in `fake` carry
/// per-faker locale bounds, so this is expanded per locale.
macro_rules! fake_string {
    ($kind:expr, $locale:expr, $rng:expr) => {
        match $kind {
            FakerKind::FirstName => name::FirstName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::LastName => name::LastName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Name => name::Name($locale).fake_with_rng::<String, _>($rng),
            FakerKind::NameWithTitle => name::NameWithTitle($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Title => name::Title($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Suffix => name::Suffix($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Username => internet::Username($locale).fake_with_rng::<String, _>($rng),
            FakerKind::FreeEmail => internet::FreeEmail($locale).fake_with_rng::<String, _>($rng),
            FakerKind::SafeEmail => internet::SafeEmail($locale).fake_with_rng::<String, _>($rng),
            FakerKind::FreeEmailProvider => internet::FreeEmailProvider($locale).fake_with_rng::<String, _>($rng),
            FakerKind::DomainSuffix => internet::DomainSuffix($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Ipv4 => internet::IPv4($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Ipv6 => internet::IPv6($locale).fake_with_rng::<String, _>($rng),
            FakerKind::MacAddress => internet::MACAddress($locale).fake_with_rng::<String, _>($rng),
            FakerKind::UserAgent => internet::UserAgent($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CityName => address::CityName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CountryName => address::CountryName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CountryCode => address::CountryCode($locale).fake_with_rng::<String, _>($rng),
            FakerKind::StreetName => address::StreetName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::StreetSuffix => address::StreetSuffix($locale).fake_with_rng::<String, _>($rng),
            FakerKind::BuildingNumber => address::BuildingNumber($locale).fake_with_rng::<String, _>($rng),
            FakerKind::ZipCode => address::ZipCode($locale).fake_with_rng::<String, _>($rng),
            FakerKind::StateName => address::StateName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::StateAbbr => address::StateAbbr($locale).fake_with_rng::<String, _>($rng),
            FakerKind::TimeZone => address::TimeZone($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CompanyName => company::CompanyName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CompanySuffix => company::CompanySuffix($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Industry => company::Industry($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Profession => company::Profession($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Buzzword => company::Buzzword($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CatchPhrase => company::CatchPhrase($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Bs => company::Bs($locale).fake_with_rng::<String, _>($rng),
            FakerKind::PhoneNumber => phone_number::PhoneNumber($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CellNumber => phone_number::CellNumber($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CurrencyCode => currency::CurrencyCode($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CurrencyName => currency::CurrencyName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CurrencySymbol => currency::CurrencySymbol($locale).fake_with_rng::<String, _>($rng),
            FakerKind::CreditCardNumber => creditcard::CreditCardNumber($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Word => lorem::Word($locale).fake_with_rng::<String, _>($rng),
            FakerKind::Sentence => lorem::Sentence($locale, SENTENCE_WORDS).fake_with_rng::<String, _>($rng),
            FakerKind::Paragraph => lorem::Paragraph($locale, PARAGRAPH_SENTENCES).fake_with_rng::<String, _>($rng),
            FakerKind::FileName => filesystem::FileName($locale).fake_with_rng::<String, _>($rng),
            FakerKind::FileExtension => filesystem::FileExtension($locale).fake_with_rng::<String, _>($rng),
        }
    };
}

pub(crate) fn sample_faker(content: &FakerContent, rng: &mut dyn RngCore) -> Value {
    let text = match content.locale {
        FakerLocale::En => fake_string!(content.kind, EN, rng),
        FakerLocale::FrFr => fake_string!(content.kind, FR_FR, rng),
        FakerLocale::PtBr => fake_string!(content.kind, PT_BR, rng),
    };
    Value::String(text)
}
