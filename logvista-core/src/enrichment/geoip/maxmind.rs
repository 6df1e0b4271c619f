use crate::enrichment::geoip::{GeoError, GeoLookup, Location, OVERSEAS, UNKNOWN};
use maxminddb::PathElement;
use std::net::IpAddr;
use std::path::Path;

/// GeoLite2 / GeoIP2 City database reader.
pub struct MaxMindGeoLookup {
    reader: maxminddb::Reader<maxminddb::Mmap>,
    home_country: Option<String>,
}

impl MaxMindGeoLookup {
    pub fn open(path: &Path, home_country: Option<&str>) -> anyhow::Result<Self> {
        // Safety note on the memory-mapped database...
        // - File is opened read-only
        // - Lifetime is bound to MaxMindGeoLookup
        // - logvista never mutates the mmdb file
        let reader = unsafe { maxminddb::Reader::open_mmap(path)? };

        Ok(Self {
            reader,
            home_country: home_country.map(str::to_ascii_uppercase),
        })
    }
}

impl GeoLookup for MaxMindGeoLookup {
    fn lookup(&self, ip: IpAddr) -> Result<Location, GeoError> {
        let lookup = self
            .reader
            .lookup(ip)
            .map_err(|e| GeoError::Lookup(e.to_string()))?;

        let iso_code = lookup
            .decode_path::<String>(&[PathElement::Key("country"), PathElement::Key("iso_code")])
            .ok()
            .flatten();

        let country = lookup
            .decode_path::<String>(&[
                PathElement::Key("country"),
                PathElement::Key("names"),
                PathElement::Key("en"),
            ])
            .ok()
            .flatten();

        let region = lookup
            .decode_path::<String>(&[
                PathElement::Key("subdivisions"),
                PathElement::Index(0),
                PathElement::Key("names"),
                PathElement::Key("en"),
            ])
            .ok()
            .flatten();

        Ok(location_labels(
            iso_code.as_deref(),
            country.as_deref(),
            region.as_deref(),
            self.home_country.as_deref(),
        ))
    }
}

/// Domestic label: region inside the home country, [`OVERSEAS`] elsewhere.
/// Global label: country name, ISO code when the name is missing.
pub(crate) fn location_labels(
    iso_code: Option<&str>,
    country: Option<&str>,
    region: Option<&str>,
    home_country: Option<&str>,
) -> Location {
    let Some(global) = country.or(iso_code).filter(|c| !c.is_empty()) else {
        return Location::unknown();
    };

    let at_home = match (iso_code, home_country) {
        (Some(iso), Some(home)) => iso.eq_ignore_ascii_case(home),
        _ => false,
    };

    let domestic = if at_home {
        region.filter(|r| !r.is_empty()).unwrap_or(global)
    } else if home_country.is_some() {
        OVERSEAS
    } else {
        UNKNOWN
    };

    Location::new(domestic, global)
}
