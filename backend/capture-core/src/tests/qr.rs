use crate::documents::qr::{
    PaymentQrCode, extraction_result_from_qr, is_valid_iban, normalize_amount,
};
use crate::error::DocumentServiceError;

const EPC_PAYLOAD: &str = concat!(
    "BCD\n002\n1\nSCT\nCOBADEFFXXX\nMöbelhaus Nord GmbH\n",
    "DE89 3704 0044 0532 0130 00\nEUR950\n\nRE-2024-0815\n",
);

/// **VALUE**: Verifies an EPC code becomes the payment extractions the review screen shows.
///
/// **WHY THIS MATTERS**: QR payments skip analysis entirely; these five fields are all the user
/// gets.
///
/// **BUG THIS CATCHES**: Would catch off-by-one line indexing or the amount left as "EUR950".
#[test]
fn given_epc_code_when_parsed_then_payment_extractions() {
    // GIVEN/WHEN: Parsing an EPC payload
    let result = extraction_result_from_qr(EPC_PAYLOAD).expect("EPC should parse");

    // THEN: All payment fields are present and normalized
    let value = |name: &str| result.extraction(name).map(|e| e.value.clone());
    assert_eq!(value("paymentRecipient").as_deref(), Some("Möbelhaus Nord GmbH"));
    assert_eq!(value("iban").as_deref(), Some("DE89370400440532013000"));
    assert_eq!(value("bic").as_deref(), Some("COBADEFFXXX"));
    assert_eq!(value("amountToPay").as_deref(), Some("950.00:EUR"));
    assert_eq!(value("paymentReference").as_deref(), Some("RE-2024-0815"));
}

/// **VALUE**: Verifies a BezahlCode URI maps to the same fields.
///
/// **WHY THIS MATTERS**: German invoices still carry BezahlCodes next to EPC codes.
///
/// **BUG THIS CATCHES**: Would catch the comma decimal separator being rejected or percent
/// escapes left in the recipient name.
#[test]
fn given_bezahlcode_when_parsed_then_payment_fields() {
    let content = concat!(
        "bank://singlepaymentsepa?name=M%C3%B6belhaus%20Nord&reason=RE-1",
        "&iban=DE89370400440532013000&bic=cobadeffxxx&amount=9,5",
    );

    let code = PaymentQrCode::parse(content).expect("BezahlCode should parse");

    assert_eq!(code.recipient, "Möbelhaus Nord");
    assert_eq!(code.iban, "DE89370400440532013000");
    assert_eq!(code.bic.as_deref(), Some("COBADEFFXXX"));
    assert_eq!(code.amount.as_deref(), Some("9.50:EUR"));
    assert_eq!(code.reference.as_deref(), Some("RE-1"));
}

/// **VALUE**: Verifies payloads that are not payment codes are rejected with a typed error.
///
/// **WHY THIS MATTERS**: Shop and ticket QR codes are scanned by accident all the time.
///
/// **BUG THIS CATCHES**: Would catch a bad IBAN checksum being accepted.
#[test]
fn given_unsupported_payloads_when_parsed_then_unsupported_qr_code() {
    let cases = [
        "https://example.com/ticket/42",
        "BCD\n002\n1\nSCT\n\nShop\nDE89370400440532013001\nEUR1",
        "BCD\n002\n1\nINST\n\nShop\nDE89370400440532013000\nEUR1",
        "bank://singlepayment?name=Shop&account=123&bnc=456",
    ];

    for content in cases {
        assert!(
            matches!(
                PaymentQrCode::parse(content),
                Err(DocumentServiceError::UnsupportedQrCode { .. })
            ),
            "expected rejection of {content:?}"
        );
    }
}

/// **VALUE**: Verifies amount normalization without floating point.
///
/// **WHY THIS MATTERS**: `0.1 + 0.2` style rounding in a payment amount is a real money bug.
///
/// **BUG THIS CATCHES**: Would catch a float round-trip turning "19.99" into "19.98".
#[test]
fn given_amount_strings_when_normalized_then_two_decimals_and_currency() {
    assert_eq!(normalize_amount("950").expect("amount"), "950.00:EUR");
    assert_eq!(normalize_amount("19.99").expect("amount"), "19.99:EUR");
    assert_eq!(normalize_amount("0019,9").expect("amount"), "19.90:EUR");
    assert_eq!(normalize_amount("0.5").expect("amount"), "0.50:EUR");

    assert!(normalize_amount("1.999").is_err());
    assert!(normalize_amount("-5").is_err());
    assert!(normalize_amount(".5").is_err());
}

#[test]
fn given_ibans_when_checked_then_mod_97_applies() {
    assert!(is_valid_iban("DE89370400440532013000"));
    assert!(is_valid_iban("GB82WEST12345698765432"));
    assert!(!is_valid_iban("DE89370400440532013001"));
    assert!(!is_valid_iban("DE89"));
}
