//! Property-based tests using proptest
//!
//! These tests verify resource id parsing, location normalization and
//! declaration decoding using randomized inputs.

use azrm_lngw::azure::location::normalize_location;
use azrm_lngw::azure::resource_id::AzureResourceId;
use azrm_lngw::resource::local_network_gateway;
use proptest::prelude::*;
use serde_json::json;

/// Generate a resource id segment value
fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._-]{0,30}"
}

proptest! {
    /// Every well-formed gateway id parses back to its parts
    #[test]
    fn gateway_id_parses(
        subscription in "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        resource_group in arb_segment(),
        name in arb_segment(),
    ) {
        let id = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/localNetworkGateways/{}",
            subscription, resource_group, name
        );

        let parsed: AzureResourceId = id.parse().unwrap();

        prop_assert_eq!(&parsed.subscription_id, &subscription);
        prop_assert_eq!(&parsed.resource_group, &resource_group);
        prop_assert_eq!(parsed.segment("localNetworkGateways").unwrap(), name.as_str());
        prop_assert_eq!(parsed.to_string(), id);
    }

    /// An odd number of segments never parses
    #[test]
    fn odd_segment_count_is_rejected(
        segments in (0usize..6).prop_flat_map(|n| prop::collection::vec(arb_segment(), 2 * n + 1))
    ) {
        let id = format!("/{}", segments.join("/"));
        prop_assert!(id.parse::<AzureResourceId>().is_err());
    }

    /// Normalizing twice is the same as normalizing once
    #[test]
    fn normalize_location_is_idempotent(location in "[A-Za-z0-9 ]{0,30}") {
        let once = normalize_location(&location);
        prop_assert_eq!(normalize_location(&once), once.clone());
        prop_assert!(!once.contains(' '));
        prop_assert_eq!(once.to_lowercase(), once);
    }

    /// Any spelling of a region decodes to the same stored location
    #[test]
    fn declared_location_is_normalized(location in "[A-Za-z]{1,10}( [A-Za-z0-9]{1,5}){0,2}") {
        let declaration = json!({
            "name": "gw1",
            "location": location,
            "gateway_address": "203.0.113.1",
            "address_space": ["10.0.0.0/24"]
        });

        let data = local_network_gateway::schema()
            .decode(declaration.as_object().unwrap())
            .unwrap();

        let expected = normalize_location(&location);
        prop_assert_eq!(data.get_str("location"), Some(expected.as_str()));
    }

    /// Address prefixes are stored verbatim, without local validation
    #[test]
    fn address_space_is_opaque(space in prop::collection::vec(".{0,20}", 0..6)) {
        let declaration = json!({
            "name": "gw1",
            "gateway_address": "203.0.113.1",
            "address_space": space
        });

        let data = local_network_gateway::schema()
            .decode(declaration.as_object().unwrap())
            .unwrap();

        prop_assert_eq!(data.get_list("address_space").unwrap(), space.as_slice());
    }
}
