use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

/// Integer primary key used by every backend entity.
pub type DbId = i64;

/// Normalized list payload.
///
/// The backend is inconsistent about list shapes: some endpoints return a bare
/// array, some wrap it as `{"$values": [...]}`, newer ones as `{"items": [...]}`.
/// All three collapse into `items` here so nothing past the HTTP boundary
/// branches on shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvelope<T> {
    Bare(Vec<T>),
    Values {
        #[serde(rename = "$values")]
        values: Vec<T>,
    },
    Items {
        items: Vec<T>,
    },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match RawEnvelope::deserialize(deserializer)? {
            RawEnvelope::Bare(items) => items,
            RawEnvelope::Values { values } => values,
            RawEnvelope::Items { items } => items,
        };
        Ok(Envelope { items })
    }
}

impl<T> Envelope<T> {
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Server-side filter applied when (re)loading the request list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestFilter {
    #[default]
    All,
    Status(super::request::RequestStatus),
    /// Inclusive on both ends.
    DateRange { from: Date, to: Date },
    MonthYear { month: u8, year: i32 },
}

/// Accepts `"42"`, `42` or `null` and yields a string (`""` for null).
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Signed(n)) => n.to_string(),
        Some(Raw::Unsigned(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Like `#[serde(default)]`, but also maps an explicit `null` to the default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Calendar dates on the wire.
///
/// Outgoing dates are plain `YYYY-MM-DD`. Incoming values may be full ISO
/// datetimes (`2024-03-01T00:00:00`); only the date part is kept.
pub mod wire_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(raw: &str) -> Option<Date> {
        let day = raw.trim().split(['T', ' ']).next()?;
        Date::parse(day, FORMAT).ok()
    }

    pub fn format(date: Date) -> String {
        date.format(FORMAT).unwrap_or_default()
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Date>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&format(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date `{}`", text))),
        }
    }
}
