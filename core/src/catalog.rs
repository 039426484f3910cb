//! The operation catalog: every Graph endpoint the connector exposes.
//!
//! Built once on first use and read-only afterwards. Operation names are the
//! snake_case form callers pass to `GraphConnector::invoke`.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::descriptor::{AuthPlacement, EndpointDescriptor as Op, ParamSpec};
use crate::types::EntityKind::{self, *};

/// Name-indexed, ordered set of descriptors.
pub struct Catalog {
    ops: Vec<Op>,
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&Op> {
        self.index.get(name).map(|&i| &self.ops[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
    let ops = operations();
    let index = ops.iter().enumerate().map(|(i, op)| (op.name, i)).collect();
    Catalog { ops, index }
});

/// The process-wide catalog.
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

pub fn lookup(name: &str) -> Option<&'static Op> {
    CATALOG.get(name)
}

/// `GET {id}` with the `metadata` flag.
fn object(name: &'static str, id: &'static str, template: &'static str, kind: EntityKind) -> Op {
    Op::get(name, template)
        .param(ParamSpec::path(id))
        .metadata()
        .single(kind)
}

/// `GET {id}/<connection>` with paging.
fn connection(name: &'static str, id: &'static str, template: &'static str, kind: EntityKind) -> Op {
    Op::get(name, template)
        .param(ParamSpec::path(id))
        .paging()
        .list(kind)
}

fn picture(name: &'static str, id: &'static str, template: &'static str) -> Op {
    Op::get(name, template).param(ParamSpec::path(id)).picture()
}

fn search(name: &'static str, kind: EntityKind) -> Op {
    Op::get(name, "search")
        .param(ParamSpec::query("q"))
        .paging()
        .list(kind)
}

/// `POST {id}/<connection>` carrying only the token.
fn action(name: &'static str, id: &'static str, template: &'static str) -> Op {
    Op::post(name, template)
        .authenticated()
        .param(ParamSpec::path(id))
}

fn operations() -> Vec<Op> {
    vec![
        // Session and search
        Op::get("logged_user_details", "me").authenticated().single(User),
        search("search_posts", Post),
        search("search_users", User).authenticated().fixed("type", "user"),
        search("search_pages", Page).fixed("type", "page"),
        search("search_events", Event).authenticated().fixed("type", "event"),
        search("search_groups", Group).authenticated().fixed("type", "group"),
        Op::get("search_checkins", "search")
            .authenticated()
            .paging()
            .fixed("type", "checkin")
            .list(Checkin),
        // Albums
        object("get_album", "album", "{album}", Album),
        connection("get_album_photos", "album", "{album}/photos", Photo),
        connection("get_album_comments", "album", "{album}/comments", Comment),
        // Events
        object("get_event", "event", "{event}", Event),
        connection("get_event_wall", "event", "{event}/feed", Post).authenticated(),
        connection("get_event_no_reply", "event", "{event}/noreply", User).authenticated(),
        connection("get_event_maybe", "event", "{event}/maybe", User).authenticated(),
        connection("get_event_invited", "event", "{event}/invited", User).authenticated(),
        connection("get_event_attending", "event", "{event}/attending", User).authenticated(),
        connection("get_event_declined", "event", "{event}/declined", User).authenticated(),
        picture("get_event_picture", "event", "{event}/picture"),
        // Groups
        object("get_group", "group", "{group}", Group),
        connection("get_group_wall", "group", "{group}/feed", Post).authenticated(),
        connection("get_group_members", "group", "{group}/members", Member).authenticated(),
        picture("get_group_picture", "group", "{group}/picture"),
        // Links
        object("get_link", "link", "{link}", Link).authenticated(),
        connection("get_link_comments", "link", "{link}/comments", Comment).authenticated(),
        // Notes
        object("get_note", "note", "{note}", Note).authenticated(),
        connection("get_note_comments", "note", "{note}/comments", Comment),
        Op::get("get_note_likes", "{note}/likes")
            .param(ParamSpec::path("note"))
            .paging()
            .single(Likes),
        // Pages
        object("get_page", "page", "{page}", Page),
        connection("get_page_wall", "page", "{page}/feed", Post).authenticated(),
        picture("get_page_picture", "page", "{page}/picture"),
        connection("get_page_tagged", "page", "{page}/tagged", Post).authenticated(),
        connection("get_page_links", "page", "{page}/links", Link),
        connection("get_page_photos", "page", "{page}/photos", Photo),
        connection("get_page_groups", "page", "{page}/groups", Group).authenticated(),
        connection("get_page_albums", "page", "{page}/albums", Album),
        connection("get_page_statuses", "page", "{page}/statuses", StatusMessage).authenticated(),
        connection("get_page_videos", "page", "{page}/videos", Video).authenticated(),
        connection("get_page_notes", "page", "{page}/notes", Note).authenticated(),
        connection("get_page_posts", "page", "{page}/posts", Post).authenticated(),
        connection("get_page_events", "page", "{page}/events", Event).authenticated(),
        connection("get_page_checkins", "page", "{page}/checkins", Checkin).authenticated(),
        // Photos
        object("get_photo", "photo", "{photo}", Photo),
        connection("get_photo_comments", "photo", "{photo}/comments", Comment),
        Op::get("get_photo_likes", "{photo}/likes")
            .param(ParamSpec::path("photo"))
            .paging()
            .single(Likes),
        // Posts
        object("get_post", "post", "{post}", Post),
        connection("get_post_comments", "post", "{post}/comments", Comment),
        // Status messages
        object("get_status", "status", "{status}", StatusMessage).authenticated(),
        connection("get_status_comments", "status", "{status}/comments", Comment).authenticated(),
        // Users
        object("get_user", "user", "{user}", User),
        Op::get("get_user_search", "{user}/home")
            .authenticated()
            .param(ParamSpec::path("user"))
            .param(ParamSpec::query_or("q", "facebook"))
            .metadata()
            .paging()
            .list(Post),
        connection("get_user_home", "user", "{user}/home", Post).authenticated(),
        connection("get_user_wall", "user", "{user}/feed", Post).authenticated(),
        connection("get_user_tagged", "user", "{user}/tagged", Post).authenticated(),
        connection("get_user_posts", "user", "{user}/posts", Post).authenticated(),
        picture("get_user_picture", "user", "{user}/picture"),
        connection("get_user_friends", "user", "{user}/friends", NamedFacebookType).authenticated(),
        connection("get_user_activities", "user", "{user}/activities", PageConnection).authenticated(),
        connection("get_user_checkins", "user", "{user}/checkins", Checkin).authenticated(),
        connection("get_user_interests", "user", "{user}/interests", PageConnection).authenticated(),
        connection("get_user_music", "user", "{user}/music", PageConnection).authenticated(),
        connection("get_user_books", "user", "{user}/books", PageConnection).authenticated(),
        connection("get_user_movies", "user", "{user}/movies", PageConnection).authenticated(),
        connection("get_user_television", "user", "{user}/television", PageConnection).authenticated(),
        connection("get_user_likes", "user", "{user}/likes", PageConnection).authenticated(),
        connection("get_user_photos", "user", "{user}/photos", Photo),
        connection("get_user_albums", "user", "{user}/albums", Album),
        connection("get_user_videos", "user", "{user}/videos", Video).authenticated(),
        connection("get_user_groups", "user", "{user}/groups", Group).authenticated(),
        connection("get_user_statuses", "user", "{user}/statuses", StatusMessage).authenticated(),
        connection("get_user_links", "user", "{user}/links", Link).authenticated(),
        connection("get_user_notes", "user", "{user}/notes", Note).authenticated(),
        connection("get_user_events", "user", "{user}/events", Event).authenticated(),
        connection("get_user_inbox", "user", "{user}/inbox", Thread).authenticated(),
        connection("get_user_outbox", "user", "{user}/outbox", OutboxThread).authenticated(),
        connection("get_user_updates", "user", "{user}/updates", OutboxThread).authenticated(),
        connection("get_user_accounts", "user", "{user}/accounts", Account).authenticated(),
        // Videos
        object("get_video", "video", "{video}", Video).authenticated(),
        connection("get_video_comments", "video", "{video}/comments", Comment),
        // Checkins
        object("get_checkin", "checkin", "{checkin}", Checkin).authenticated(),
        // Applications
        Op::get("get_application", "{application}")
            .authenticated()
            .param(ParamSpec::path("application"))
            .single(Application),
        connection("get_application_wall", "application", "{application}/feed", Post).authenticated(),
        picture("get_application_picture", "application", "{application}/picture").authenticated(),
        connection("get_application_tagged", "application", "{application}/tagged", TaggedObject).authenticated(),
        connection("get_application_links", "application", "{application}/links", Post).authenticated(),
        connection("get_application_photos", "application", "{application}/photos", Photo).authenticated(),
        connection("get_application_albums", "application", "{application}/albums", Album).authenticated(),
        connection("get_application_statuses", "application", "{application}/statuses", StatusMessage).authenticated(),
        connection("get_application_videos", "application", "{application}/videos", Video).authenticated(),
        connection("get_application_notes", "application", "{application}/notes", Note).authenticated(),
        connection("get_application_events", "application", "{application}/events", Event).authenticated(),
        connection("get_application_insights", "application", "{application}/insights", Insight).authenticated(),
        // Publishing (publish_stream scope)
        Op::post("publish_message", "{profile_id}/feed")
            .auth(AuthPlacement::Form)
            .param(ParamSpec::path("profile_id"))
            .param(ParamSpec::form("msg").wire("message"))
            .param(ParamSpec::form_opt("picture"))
            .param(ParamSpec::form_opt("link"))
            .param(ParamSpec::form_opt("caption"))
            .param(ParamSpec::form_opt("name"))
            .param(ParamSpec::form_opt("description"))
            .single(Created),
        Op::post("publish_comment", "{post_id}/comments")
            .auth(AuthPlacement::Form)
            .param(ParamSpec::path("post_id"))
            .param(ParamSpec::form("msg").wire("message"))
            .single(Created),
        action("like", "post_id", "{post_id}/likes"),
        Op::delete("dislike", "{post_id}/likes")
            .authenticated()
            .param(ParamSpec::path("post_id")),
        action("publish_note", "profile_id", "{profile_id}/notes")
            .param(ParamSpec::form("msg").wire("message"))
            .param(ParamSpec::form("subject"))
            .single(Created),
        action("publish_link", "profile_id", "{profile_id}/links")
            .param(ParamSpec::form("msg").wire("message"))
            .param(ParamSpec::form("link"))
            .single(Created),
        action("publish_event", "profile_id", "{profile_id}/events")
            .param(ParamSpec::form_opt("name"))
            .param(ParamSpec::form_opt("start_time"))
            .param(ParamSpec::form_opt("end_time"))
            .single(Created),
        action("attend_event", "event_id", "{event_id}/attending"),
        action("tentative_event", "event_id", "{event_id}/maybe"),
        action("decline_event", "event_id", "{event_id}/declined"),
        action("publish_album", "profile_id", "{profile_id}/albums")
            .param(ParamSpec::form("msg").wire("message"))
            .param(ParamSpec::form("name"))
            .single(Created),
        action("publish_photo", "album_id", "{album_id}/photos")
            .param(ParamSpec::multipart("caption").wire("message"))
            .param(ParamSpec::multipart("photo").wire("source"))
            .single(Created),
        Op::delete("delete_object", "{object_id}")
            .authenticated()
            .param(ParamSpec::path("object_id")),
    ]
}
