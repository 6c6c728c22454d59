//! Payment QR codes delivered as a ready-made extraction result.
//!
//! Supported payloads:
//! - EPC069-12 SEPA credit transfer ("BCD" header, one field per line)
//! - BezahlCode `bank://singlepaymentsepa?...` URIs
//!
//! Both map to `paymentRecipient`, `iban`, `bic`, `amountToPay` and
//! `paymentReference`. Amounts become `"<units>.<cents>:EUR"`.

use crate::error::DocumentServiceError;

use models::{Extraction, ExtractionResult};

use std::collections::BTreeMap;

use log::debug;
use url::Url;

const EPC_HEADER: &str = "BCD";
const EPC_IDENTIFICATION: &str = "SCT";
const BEZAHLCODE_SCHEME: &str = "bank";
const BEZAHLCODE_SEPA_PAYMENT: &str = "singlepaymentsepa";
const CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQrCode {
    pub recipient: String,
    pub iban: String,
    pub bic: Option<String>,
    /// Normalized `"950.00:EUR"`.
    pub amount: Option<String>,
    pub reference: Option<String>,
}

impl PaymentQrCode {
    pub fn parse(content: &str) -> Result<Self, DocumentServiceError> {
        let content = content.trim();

        if content.starts_with(EPC_HEADER) {
            parse_epc(content)
        } else if content
            .get(..BEZAHLCODE_SCHEME.len() + 3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bank://"))
        {
            parse_bezahlcode(content)
        } else {
            Err(DocumentServiceError::unsupported_qr_code(
                "Neither an EPC nor a BezahlCode payload",
            ))
        }
    }

    pub fn into_extraction_result(self) -> ExtractionResult {
        let mut extractions = vec![
            Extraction::new("paymentRecipient", "companyname", self.recipient),
            Extraction::new("iban", "iban", self.iban),
        ];
        if let Some(bic) = self.bic {
            extractions.push(Extraction::new("bic", "bic", bic));
        }
        if let Some(amount) = self.amount {
            extractions.push(Extraction::new("amountToPay", "amount", amount));
        }
        if let Some(reference) = self.reference {
            extractions.push(Extraction::new("paymentReference", "reference", reference));
        }

        ExtractionResult::new(extractions, BTreeMap::new(), BTreeMap::new())
    }
}

/// Parse a payment QR code straight into an extraction result.
pub fn extraction_result_from_qr(content: &str) -> Result<ExtractionResult, DocumentServiceError> {
    let code = PaymentQrCode::parse(content)?;
    debug!("Payment QR code parsed for recipient '{}'", code.recipient);
    Ok(code.into_extraction_result())
}

fn parse_epc(content: &str) -> Result<PaymentQrCode, DocumentServiceError> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let field = |index: usize| lines.get(index).copied().filter(|value| !value.is_empty());

    if field(0) != Some(EPC_HEADER) {
        return Err(DocumentServiceError::unsupported_qr_code("Missing BCD header"));
    }
    if field(3) != Some(EPC_IDENTIFICATION) {
        return Err(DocumentServiceError::unsupported_qr_code(
            "EPC code is not a SEPA credit transfer",
        ));
    }

    let recipient = field(5)
        .ok_or_else(|| DocumentServiceError::unsupported_qr_code("EPC code has no recipient"))?;
    let iban = normalize_iban(field(6).unwrap_or_default())?;

    let amount = match field(7) {
        Some(raw) => {
            let value = raw
                .strip_prefix(CURRENCY)
                .ok_or_else(|| {
                    DocumentServiceError::unsupported_qr_code("EPC amount is not in EUR")
                })?;
            Some(normalize_amount(value)?)
        }
        None => None,
    };

    Ok(PaymentQrCode {
        recipient: recipient.to_string(),
        iban,
        bic: field(4).map(str::to_uppercase),
        amount,
        reference: field(9).or_else(|| field(10)).map(str::to_string),
    })
}

fn parse_bezahlcode(content: &str) -> Result<PaymentQrCode, DocumentServiceError> {
    let url = Url::parse(content).map_err(|e| {
        DocumentServiceError::unsupported_qr_code(format!("Malformed BezahlCode: {e}"))
    })?;

    if !url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(BEZAHLCODE_SEPA_PAYMENT))
    {
        return Err(DocumentServiceError::unsupported_qr_code(
            "Only SEPA single payment BezahlCodes are supported",
        ));
    }

    let params: BTreeMap<String, String> = url
        .query_pairs()
        .map(|(key, value)| (key.to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect();

    let recipient = params
        .get("name")
        .ok_or_else(|| DocumentServiceError::unsupported_qr_code("BezahlCode has no name"))?;
    let iban = normalize_iban(params.get("iban").map(String::as_str).unwrap_or_default())?;
    let amount = params
        .get("amount")
        .map(|value| normalize_amount(value))
        .transpose()?;
    let reference = params.get("reason").or_else(|| params.get("reason1")).cloned();

    Ok(PaymentQrCode {
        recipient: recipient.clone(),
        iban,
        bic: params.get("bic").map(|bic| bic.to_uppercase()),
        amount,
        reference,
    })
}

fn normalize_iban(raw: &str) -> Result<String, DocumentServiceError> {
    let iban: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if is_valid_iban(&iban) {
        Ok(iban)
    } else {
        Err(DocumentServiceError::unsupported_qr_code(format!(
            "Invalid IBAN '{iban}'"
        )))
    }
}

/// ISO 13616 mod-97 check.
pub fn is_valid_iban(iban: &str) -> bool {
    if !(15..=34).contains(&iban.len()) || !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let (head, tail) = iban.split_at(4);
    let mut remainder: u32 = 0;

    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder == 1
}

/// `"950"`, `"950.5"`, `"9,50"` → `"950.00:EUR"`, `"950.50:EUR"`, `"9.50:EUR"`.
pub fn normalize_amount(raw: &str) -> Result<String, DocumentServiceError> {
    let raw = raw.trim().replace(',', ".");
    let (units, cents) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if units.is_empty() || !is_digits(units) || !is_digits(cents) || cents.len() > 2 {
        return Err(DocumentServiceError::unsupported_qr_code(format!(
            "Invalid amount '{raw}'"
        )));
    }

    let units = units.trim_start_matches('0');
    let units = if units.is_empty() { "0" } else { units };

    Ok(format!("{units}.{cents:0<2}:{CURRENCY}"))
}
