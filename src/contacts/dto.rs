use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo::Contact;

/// `YYYY-MM-DD` (de)serialization for birthday fields.
pub(crate) mod date_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Body for contact create and update (full replacement on update).
#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(with = "date_format")]
    pub birthday: Date,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone_number: c.phone_number,
            birthday: c.birthday,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn payload_parses_iso_birthday() {
        let payload: ContactPayload = serde_json::from_str(
            r#"{
                "first_name": "Dexter",
                "last_name": "Morgan",
                "email": "dexter@example.com",
                "phone_number": "123456789",
                "birthday": "2000-01-01"
            }"#,
        )
        .unwrap();
        assert_eq!(payload.birthday, date!(2000 - 01 - 01));
    }

    #[test]
    fn payload_rejects_non_iso_birthday() {
        let result = serde_json::from_str::<ContactPayload>(
            r#"{
                "first_name": "Dexter",
                "last_name": "Morgan",
                "email": "dexter@example.com",
                "phone_number": "123456789",
                "birthday": "01/01/2000"
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn response_serializes_iso_birthday() {
        let resp = ContactResponse {
            id: Uuid::new_v4(),
            first_name: "Dexter".into(),
            last_name: "Morgan".into(),
            email: "dexter@example.com".into(),
            phone_number: "123456789".into(),
            birthday: date!(2000 - 01 - 01),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"birthday\":\"2000-01-01\""));
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 10);
    }
}
