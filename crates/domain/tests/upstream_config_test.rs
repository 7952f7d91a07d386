use rally_dns_domain::config::{parse_groups, UpstreamGroup};
use rally_dns_domain::DomainError;
use std::net::SocketAddr;

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

#[test]
fn test_single_spec_single_server() {
    let groups = parse_groups(&["8.8.8.8:53".to_string()], false).unwrap();
    assert_eq!(groups, vec![UpstreamGroup::new(vec![addr("8.8.8.8:53")])]);
}

#[test]
fn test_comma_split_forms_one_group() {
    let groups = parse_groups(&["8.8.8.8:53,8.8.4.4:53".to_string()], false).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].servers,
        vec![addr("8.8.8.8:53"), addr("8.8.4.4:53")]
    );
}

#[test]
fn test_separate_specs_preserve_argument_order() {
    let specs = vec![
        "10.0.0.1:53,10.0.0.2:53".to_string(),
        "1.1.1.1:53".to_string(),
    ];
    let groups = parse_groups(&specs, false).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups[0].servers,
        vec![addr("10.0.0.1:53"), addr("10.0.0.2:53")]
    );
    assert_eq!(groups[1].servers, vec![addr("1.1.1.1:53")]);
}

#[test]
fn test_merged_specs_collapse_into_single_group() {
    let specs = vec![
        "10.0.0.1:53,10.0.0.2:53".to_string(),
        "1.1.1.1:53".to_string(),
    ];
    let groups = parse_groups(&specs, true).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].servers,
        vec![addr("10.0.0.1:53"), addr("10.0.0.2:53"), addr("1.1.1.1:53")]
    );
}

#[test]
fn test_no_specs_means_no_groups() {
    let groups = parse_groups(&[], false).unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_merged_no_specs_still_yields_one_empty_group() {
    let groups = parse_groups(&[], true).unwrap();
    assert_eq!(groups, vec![UpstreamGroup::new(vec![])]);
}

#[test]
fn test_ipv6_server() {
    let groups = parse_groups(&["[2001:4860:4860::8888]:53".to_string()], false).unwrap();
    assert_eq!(
        groups[0].servers,
        vec![addr("[2001:4860:4860::8888]:53")]
    );
}

#[test]
fn test_whitespace_around_members_is_tolerated() {
    let groups = parse_groups(&["8.8.8.8:53, 8.8.4.4:53".to_string()], false).unwrap();
    assert_eq!(
        groups[0].servers,
        vec![addr("8.8.8.8:53"), addr("8.8.4.4:53")]
    );
}

#[test]
fn test_invalid_address_is_rejected() {
    let err = parse_groups(&["not-an-address".to_string()], false).unwrap_err();
    assert!(matches!(err, DomainError::InvalidUpstreamAddress(s) if s == "not-an-address"));
}

#[test]
fn test_missing_port_is_rejected() {
    assert!(parse_groups(&["8.8.8.8".to_string()], false).is_err());
}
