use crate::enrichment::geoip::maxmind::location_labels;
use crate::enrichment::geoip::{
    AddressClass, GeoEnricher, GeoError, GeoLookup, Location, classify_address,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct SlowLookup(Duration);

impl GeoLookup for SlowLookup {
    fn lookup(&self, _ip: IpAddr) -> Result<Location, GeoError> {
        std::thread::sleep(self.0);
        Ok(Location::new("Somewhere", "Elsewhere"))
    }
}

struct FixedLookup;

impl GeoLookup for FixedLookup {
    fn lookup(&self, _ip: IpAddr) -> Result<Location, GeoError> {
        Ok(Location::new("Bavaria", "Germany"))
    }
}

struct FailingLookup;

impl GeoLookup for FailingLookup {
    fn lookup(&self, _ip: IpAddr) -> Result<Location, GeoError> {
        Err(GeoError::Lookup("address not found".into()))
    }
}

#[test]
fn classifies_special_addresses() {
    assert_eq!(classify_address("127.0.0.1"), AddressClass::Local);
    assert_eq!(classify_address("::1"), AddressClass::Local);
    assert_eq!(classify_address("0.0.0.0"), AddressClass::Local);
    assert_eq!(classify_address("localhost"), AddressClass::Local);
    assert_eq!(classify_address("10.1.2.3"), AddressClass::Private);
    assert_eq!(classify_address("172.20.0.9"), AddressClass::Private);
    assert_eq!(classify_address("192.168.1.1"), AddressClass::Private);
    assert_eq!(classify_address("not-an-ip"), AddressClass::Invalid);
    assert!(matches!(
        classify_address("172.32.0.1"),
        AddressClass::Public(_)
    ));
}

#[test]
fn ipv4_mapped_addresses_are_classified_as_ipv4() {
    assert_eq!(classify_address("::ffff:192.168.1.5"), AddressClass::Private);
    assert_eq!(classify_address("::ffff:10.0.0.1"), AddressClass::Private);
    assert_eq!(classify_address("::ffff:127.0.0.1"), AddressClass::Local);
    assert_eq!(
        classify_address("::ffff:8.8.8.8"),
        AddressClass::Public("8.8.8.8".parse().unwrap())
    );
}

#[tokio::test]
async fn disabled_enricher_resolves_public_addresses_to_unknown() {
    let enricher = GeoEnricher::disabled();

    assert!(!enricher.is_enabled());
    assert_eq!(enricher.locate("8.8.8.8").await, Location::unknown());
    assert_eq!(enricher.locate("::ffff:127.0.0.1").await, Location::local());
}

#[test]
fn disabled_enricher_needs_no_timer() {
    let enricher = GeoEnricher::disabled();
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    // Timers are disabled on this runtime; a bounded lookup would panic.
    let location = runtime.block_on(enricher.locate("8.8.8.8"));

    assert_eq!(location, Location::unknown());
}

#[tokio::test]
async fn sentinels_skip_the_lookup() {
    let enricher = GeoEnricher::new(Arc::new(FailingLookup));

    assert_eq!(enricher.locate("127.0.0.1").await, Location::local());
    assert_eq!(
        enricher.locate("192.168.0.10").await,
        Location::private_network()
    );
}

#[tokio::test]
async fn public_addresses_use_the_lookup() {
    let enricher = GeoEnricher::new(Arc::new(FixedLookup));

    assert_eq!(
        enricher.locate("8.8.8.8").await,
        Location::new("Bavaria", "Germany")
    );
}

#[tokio::test]
async fn lookup_errors_degrade_to_unknown() {
    let enricher = GeoEnricher::new(Arc::new(FailingLookup));

    assert_eq!(enricher.locate("8.8.8.8").await, Location::unknown());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hung_lookup_is_abandoned_at_the_deadline() {
    // Arrange
    let enricher = GeoEnricher::new(Arc::new(SlowLookup(Duration::from_millis(500))))
        .with_timeout(Duration::from_millis(50));

    // Act
    let started = Instant::now();
    let location = enricher.locate("8.8.8.8").await;

    // Assert
    assert_eq!(location, Location::unknown());
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[test]
fn home_country_addresses_get_their_region() {
    let loc = location_labels(Some("CN"), Some("China"), Some("Beijing"), Some("cn"));

    assert_eq!(loc, Location::new("Beijing", "China"));
}

#[test]
fn foreign_addresses_are_overseas() {
    let loc = location_labels(Some("US"), Some("United States"), Some("Ohio"), Some("CN"));

    assert_eq!(loc, Location::new("overseas", "United States"));
}

#[test]
fn missing_country_is_unknown() {
    assert_eq!(
        location_labels(None, None, Some("Ohio"), Some("US")),
        Location::unknown()
    );
}

#[test]
fn home_country_without_region_falls_back_to_country() {
    let loc = location_labels(Some("DE"), Some("Germany"), None, Some("DE"));

    assert_eq!(loc, Location::new("Germany", "Germany"));
}
