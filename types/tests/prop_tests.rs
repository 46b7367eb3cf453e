use proptest::prelude::*;

use votatoon_types::{ClientId, ContestantType, RaceId};

proptest! {
    /// Big-endian encoding preserves numeric order, so LMDB key order is
    /// race order.
    #[test]
    fn race_id_bytes_sort_like_numbers(a in any::<u64>(), b in any::<u64>()) {
        let (x, y) = (RaceId::new(a), RaceId::new(b));
        prop_assert_eq!(x.to_be_bytes().cmp(&y.to_be_bytes()), x.cmp(&y));
    }

    /// Contestant types parse regardless of case and surrounding space.
    #[test]
    fn contestant_type_parse_ignores_case(upper in any::<bool>(), pad in 0usize..3, is_a in any::<bool>()) {
        let letter = match (is_a, upper) {
            (true, true) => "A",
            (true, false) => "a",
            (false, true) => "B",
            (false, false) => "b",
        };
        let raw = format!("{}{letter}{}", " ".repeat(pad), " ".repeat(pad));
        let expected = if is_a { ContestantType::A } else { ContestantType::B };
        prop_assert_eq!(raw.parse::<ContestantType>().unwrap(), expected);
    }

    /// Anything other than a single a/b letter is rejected.
    #[test]
    fn contestant_type_rejects_other_strings(raw in "[c-zC-Z0-9]{1,4}") {
        prop_assert!(raw.parse::<ContestantType>().is_err());
    }

    /// Client ids with visible characters are accepted; blank ones are not.
    #[test]
    fn client_id_rejects_only_blank(raw in "[ \t]{0,4}[a-z0-9-]{0,8}") {
        let result = ClientId::new(raw.clone());
        prop_assert_eq!(result.is_ok(), !raw.trim().is_empty());
    }
}
