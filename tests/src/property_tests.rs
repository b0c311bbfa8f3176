//! Property-based tests for decimal rendering, normalization and signing

mod common;

use common::*;
use proptest::prelude::*;
use tradebot_exchanges::binance::auth::build_query_string;
use tradebot_exchanges::binance::{BinanceCredentials, BinanceSigner};
use tradebot_exchanges::prelude::*;

fn signer() -> BinanceSigner {
    BinanceSigner::new(BinanceCredentials::new(API_KEY, API_SECRET)).unwrap()
}

proptest! {
    #[test]
    fn plain_decimals_render_as_typed(s in "(0|[1-9][0-9]{0,8})\\.[0-9]{1,8}") {
        let value = Fixed::from_str_exact(&s).unwrap();
        prop_assert_eq!(value.to_wire_string(), s);
    }

    #[test]
    fn scientific_input_renders_positionally(mantissa in 1u32..100_000, exp in -8i32..=8) {
        let value = Fixed::from_str_exact(&format!("{mantissa}e{exp}")).unwrap();
        let wire = value.to_wire_string();
        prop_assert!(!wire.contains('e') && !wire.contains('E'), "got {}", wire);

        let back = Fixed::from_str_exact(&wire).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn symbol_and_side_are_normalized(symbol in "[a-zA-Z]{3,12}", side in "[bB][uU][yY]|[sS][eE][lL][lL]") {
        let side: OrderSide = side.parse().unwrap();
        let order = OrderRequest::market(&symbol, side, fixed("1"));
        let params = order.to_params();

        prop_assert_eq!(&params[0].1, &symbol.to_ascii_uppercase());
        prop_assert!(params[1].1 == "BUY" || params[1].1 == "SELL");
        prop_assert!(order.validate().is_ok());
    }

    #[test]
    fn non_positive_quantities_are_rejected(units in 0i64..1_000_000, scale in 0u32..8) {
        let quantity = Fixed::from_str_exact(&format!("-{units}e-{scale}")).unwrap();
        let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, quantity);
        prop_assert!(order.validate().unwrap_err().is_validation());
    }

    #[test]
    fn signature_covers_exact_payload(
        symbol in "[A-Z]{3,10}",
        quantity in "[1-9][0-9]{0,4}\\.[0-9]{1,6}",
        timestamp in 1_500_000_000_000u64..2_500_000_000_000,
    ) {
        let params = vec![
            ("symbol".to_string(), symbol.clone()),
            ("side".to_string(), "BUY".to_string()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), quantity.clone()),
        ];

        let signed = signer().sign_at(params.clone(), timestamp).unwrap();

        let mut expected_pairs = params;
        expected_pairs.push(("timestamp".to_string(), timestamp.to_string()));
        let payload = build_query_string(&expected_pairs);

        prop_assert_eq!(signed.signing_payload(), payload.as_str());
        prop_assert_eq!(signed.signature(), expected_signature(API_SECRET, &payload));
        prop_assert_eq!(
            signed.query_string(),
            format!("{}&signature={}", payload, signed.signature())
        );
        prop_assert!(signer().validate_signature(&payload, signed.signature()));
    }
}
