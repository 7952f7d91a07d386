use rally_dns_domain::LogLevel;

#[test]
fn test_parse_all_levels() {
    assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
    assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
    assert_eq!("fatal".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
}

#[test]
fn test_unknown_level_is_rejected() {
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn test_fatal_filters_like_error() {
    assert_eq!(LogLevel::Fatal.as_filter(), "error");
    assert_eq!(LogLevel::Error.as_filter(), "error");
}

#[test]
fn test_default_is_warn() {
    assert_eq!(LogLevel::default(), LogLevel::Warn);
}
