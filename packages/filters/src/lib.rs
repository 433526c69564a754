#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map filter options and the state store that holds them.
//!
//! [`MapFilters`] is the typed form of the map page's filter controls.
//! [`FilterStore`] owns the current value for a session and is handed
//! top-down to everything that reads or changes it. The filters can be
//! converted to and from a URL query string so a filtered view stays
//! shareable, but the store itself does not depend on any address bar.

pub mod store;

use std::borrow::Cow;

use strum_macros::{AsRefStr, Display, EnumString};

pub use store::FilterStore;

/// Query-string parameter carrying the fatality filter.
pub const FATALITIES_ONLY_PARAM: &str = "fatalitiesOnly";

/// The "show only fatal accidents" toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FatalityFilter {
    /// Only accidents with at least one fatality.
    Yes,
    /// All accidents.
    No,
}

/// Filter options for the accident map.
///
/// `None` means the option is unset. Only
/// `fatalities_only == Some(FatalityFilter::Yes)` narrows results; unset
/// and `No` both mean "show all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MapFilters {
    /// The fatality toggle.
    pub fatalities_only: Option<FatalityFilter>,
}

impl MapFilters {
    /// Filters with only the fatality toggle set.
    #[must_use]
    pub const fn fatalities_only(value: FatalityFilter) -> Self {
        Self {
            fatalities_only: Some(value),
        }
    }

    /// Whether these filters restrict results to fatal accidents.
    #[must_use]
    pub const fn fatal_only(&self) -> bool {
        matches!(self.fatalities_only, Some(FatalityFilter::Yes))
    }

    /// The value that actually affects results, for use in cache keys.
    ///
    /// Unset and `No` produce the same result set and therefore the same
    /// key.
    #[must_use]
    pub const fn effective_key(&self) -> &'static str {
        if self.fatal_only() { "yes" } else { "all" }
    }

    /// Applies a partial update: every field set in `update` overwrites
    /// the corresponding field here, unset fields are left alone.
    ///
    /// Returns `true` if anything changed.
    pub fn merge(&mut self, update: Self) -> bool {
        let mut changed = false;
        if let Some(value) = update.fatalities_only {
            changed |= self.fatalities_only != Some(value);
            self.fatalities_only = Some(value);
        }
        changed
    }

    /// Parses filters from a URL query string such as
    /// `"?fatalitiesOnly=yes&zoom=13"`.
    ///
    /// Keys and values are percent-decoded (`+` is a space). Unrelated
    /// parameters are ignored. The first occurrence of a parameter wins.
    /// Unrecognized values leave the option unset.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let raw = query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .map(|(key, value)| (decode_component(key), decode_component(value)))
            .find(|(key, _)| key == FATALITIES_ONLY_PARAM)
            .map(|(_, value)| value);

        let fatalities_only = raw.and_then(|value| {
            value.parse::<FatalityFilter>().map_or_else(
                |_| {
                    log::warn!("Ignoring unrecognized {FATALITIES_ONLY_PARAM} value {value:?}");
                    None
                },
                Some,
            )
        });

        Self { fatalities_only }
    }

    /// Renders the filters as a query string without the leading `?`.
    ///
    /// Unset options are omitted, so default filters render as `""`.
    #[must_use]
    pub fn to_query(&self) -> String {
        self.fatalities_only
            .map(|value| format!("{FATALITIES_ONLY_PARAM}={value}"))
            .unwrap_or_default()
    }
}

/// Percent-decodes one `application/x-www-form-urlencoded` component.
///
/// Malformed escapes are kept literally and invalid UTF-8 is replaced.
fn decode_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '+']) {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => match bytes.get(i + 1..i + 3).and_then(decode_hex_pair) {
                Some(byte) => {
                    decoded.push(byte);
                    i += 3;
                }
                None => {
                    decoded.push(b'%');
                    i += 1;
                }
            },
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}

fn decode_hex_pair(pair: &[u8]) -> Option<u8> {
    let digit = |b: u8| char::from(b).to_digit(16);
    let (hi, lo) = (digit(*pair.first()?)?, digit(*pair.get(1)?)?);
    u8::try_from(hi * 16 + lo).ok()
}
