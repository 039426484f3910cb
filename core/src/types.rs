//! Graph object records.
//!
//! # Design
//! Each record's serde derive is its field-mapping table: JSON keys map to
//! typed fields at compile time, unknown keys are ignored and missing
//! optional keys become `None`. `id` is required on every object record; a
//! Graph object without one is not usable.
//!
//! Nested objects (`Post::likes`, `Thread::to`, ...) go through the same
//! derive, so mapping is recursive. Graph timestamps use the long format
//! `2011-03-01T12:34:56+0000`; a value in any other shape fails the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Graph long-format timestamps.
pub mod graph_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_str(s, FORMAT).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("bad timestamp '{s}': {e}"))),
        }
    }
}

type Timestamp = Option<DateTime<Utc>>;

/// The smallest Graph object: an id and a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedFacebookType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A `{ "data": [...] }` list of named objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedList {
    #[serde(default)]
    pub data: Vec<NamedFacebookType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Likes {
    #[serde(default)]
    pub data: Vec<NamedFacebookType>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comments {
    #[serde(default)]
    pub data: Vec<Comment>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub timezone: Option<f64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub to: Option<NamedList>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub likes: Option<Likes>,
    #[serde(default)]
    pub comments: Option<Comments>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    /// Fan count.
    #[serde(default)]
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub owner: Option<NamedFacebookType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept verbatim: events carry date-only and local-time variants.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub tags: Option<NamedList>,
    #[serde(default)]
    pub place: Option<Place>,
    #[serde(default)]
    pub application: Option<NamedFacebookType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub owner: Option<NamedFacebookType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub embed_html: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A message thread from a user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub to: Option<NamedList>,
    #[serde(default)]
    pub unread: Option<i64>,
    #[serde(default)]
    pub unseen: Option<i64>,
    #[serde(default)]
    pub comments: Option<Comments>,
    #[serde(default, with = "graph_time")]
    pub updated_time: Timestamp,
}

/// An outbox or updates thread: an inbox thread plus its message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxThread {
    #[serde(flatten)]
    pub thread: Thread,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<InsightValue>,
}

/// A page a user is connected to (likes, music, books, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConnection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub administrator: Option<bool>,
}

/// A page or application the user administers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// An object an application has been tagged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedObject {
    pub id: String,
    #[serde(default)]
    pub from: Option<NamedFacebookType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Timestamp,
}

/// The id returned by a publish operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
    #[serde(default)]
    pub post_id: Option<String>,
}

/// A record type the response mapper can produce.
pub trait GraphEntity: Sized {
    const KIND: EntityKind;

    fn from_entity(entity: Entity) -> Option<Self>;
}

macro_rules! entity_kinds {
    ($($kind:ident => $ty:ty),* $(,)?) => {
        /// Tag for each Graph object shape.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EntityKind {
            $($kind),*
        }

        /// A mapped record of any kind.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Entity {
            $($kind($ty)),*
        }

        impl EntityKind {
            pub fn name(&self) -> &'static str {
                match self {
                    $(EntityKind::$kind => stringify!($kind)),*
                }
            }

            pub(crate) fn decode(self, value: serde_json::Value) -> Result<Entity, serde_json::Error> {
                match self {
                    $(EntityKind::$kind => serde_json::from_value::<$ty>(value).map(Entity::$kind)),*
                }
            }
        }

        impl Entity {
            pub fn kind(&self) -> EntityKind {
                match self {
                    $(Entity::$kind(_) => EntityKind::$kind),*
                }
            }
        }

        $(
            impl GraphEntity for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn from_entity(entity: Entity) -> Option<Self> {
                    match entity {
                        Entity::$kind(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

entity_kinds! {
    User => User,
    Post => Post,
    Page => Page,
    Event => Event,
    Album => Album,
    Photo => Photo,
    Comment => Comment,
    Checkin => Checkin,
    Group => Group,
    Link => Link,
    Note => Note,
    StatusMessage => StatusMessage,
    Video => Video,
    Application => Application,
    Thread => Thread,
    OutboxThread => OutboxThread,
    Insight => Insight,
    PageConnection => PageConnection,
    NamedFacebookType => NamedFacebookType,
    Likes => Likes,
    Member => Member,
    Account => Account,
    TaggedObject => TaggedObject,
    Created => Created,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn graph_time_parses_long_format() {
        let dt = graph_time::parse("2011-03-01T12:34:56+0000").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2011, 3, 1));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (12, 34, 56));
    }

    #[test]
    fn graph_time_normalizes_offset_to_utc() {
        let dt = graph_time::parse("2011-03-01T12:00:00+0200").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn timestamps_serialize_in_long_format_and_read_back() {
        let user: User = serde_json::from_str(
            r#"{"id":"9","updated_time":"2011-03-01T12:34:56+0000"}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains(r#""updated_time":"2011-03-01T12:34:56+0000""#), "{json}");
        let again: User = serde_json::from_str(&json).unwrap();
        assert_eq!(again, user);

        let entity = Entity::User(user);
        let again: User = serde_json::from_value(serde_json::to_value(&entity).unwrap()).unwrap();
        assert!(again.updated_time.is_some());
    }

    #[test]
    fn user_optional_fields_default_to_none() {
        let user: User = serde_json::from_str(r#"{"id":"123","name":"Ann"}"#).unwrap();
        assert_eq!(user.id, "123");
        assert_eq!(user.name.as_deref(), Some("Ann"));
        assert!(user.email.is_none());
        assert!(user.updated_time.is_none());
    }

    #[test]
    fn record_without_id_is_rejected() {
        assert!(serde_json::from_str::<User>(r#"{"name":"Ann"}"#).is_err());
    }

    #[test]
    fn post_maps_nested_likes_and_comments() {
        let post: Post = serde_json::from_str(
            r#"{
                "id": "1_2",
                "from": {"id": "1", "name": "Ann"},
                "type": "status",
                "likes": {"data": [{"id": "7", "name": "Bo"}], "count": 1},
                "comments": {"data": [{"id": "c1", "message": "hi"}], "count": 1},
                "created_time": "2011-03-01T12:34:56+0000"
            }"#,
        )
        .unwrap();
        assert_eq!(post.kind.as_deref(), Some("status"));
        assert_eq!(post.from.unwrap().name.as_deref(), Some("Ann"));
        let likes = post.likes.unwrap();
        assert_eq!(likes.count, Some(1));
        assert_eq!(likes.data[0].id, "7");
        assert_eq!(post.comments.unwrap().data[0].message.as_deref(), Some("hi"));
        assert!(post.created_time.is_some());
    }

    #[test]
    fn outbox_thread_flattens_thread_fields() {
        let t: OutboxThread = serde_json::from_str(
            r#"{
                "id": "t1",
                "from": {"id": "1", "name": "Ann"},
                "to": {"data": [{"id": "2", "name": "Bo"}, {"id": "3", "name": "Cy"}]},
                "unread": 2,
                "updated_time": "2011-05-06T07:08:09+0000",
                "message": "hello"
            }"#,
        )
        .unwrap();
        assert_eq!(t.thread.id, "t1");
        assert_eq!(t.thread.to.as_ref().unwrap().data.len(), 2);
        assert_eq!(t.thread.unread, Some(2));
        assert_eq!(t.message.as_deref(), Some("hello"));
    }

    #[test]
    fn bad_timestamp_fails_the_record() {
        let res = serde_json::from_str::<StatusMessage>(
            r#"{"id":"s1","updated_time":"yesterday-ish"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn entity_kind_decode_and_downcast() {
        let entity = EntityKind::Page
            .decode(serde_json::json!({"id": "p1", "likes": 40}))
            .unwrap();
        assert_eq!(entity.kind(), EntityKind::Page);
        let page = Page::from_entity(entity.clone()).unwrap();
        assert_eq!(page.likes, Some(40));
        assert!(User::from_entity(entity).is_none());
    }
}
