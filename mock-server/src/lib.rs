//! In-memory Graph API emulator for integration tests.
//!
//! Serves a small seeded social graph: users, a page, posts and an event,
//! plus the connections between them. Reads, search, publishing, likes, RSVPs
//! and deletes mutate or query the same store, so a client can publish and
//! then read its own writes. Errors use the Graph `{"error": {...}}` envelope.

use std::{collections::HashMap, io::Cursor, sync::Arc};

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Token value the emulator rejects as expired.
pub const INVALID_TOKEN: &str = "invalid";

/// The user `me` resolves to.
pub const ME: &str = "1";

const SEED_TIME: &str = "2011-03-01T12:34:56+0000";

/// One stored Graph object.
#[derive(Clone, Debug)]
pub struct Node {
    /// Search `type`: user, page, post, event, group, ...
    pub kind: String,
    pub data: Value,
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    /// `(object id, connection)` -> member ids, in insertion order.
    connections: HashMap<(String, String), Vec<String>>,
    next_id: u64,
}

impl Graph {
    pub fn insert(&mut self, kind: &str, data: Value) {
        if let Some(id) = data["id"].as_str() {
            self.nodes.insert(
                id.to_string(),
                Node {
                    kind: kind.to_string(),
                    data,
                },
            );
        }
    }

    pub fn connect(&mut self, id: &str, connection: &str, member: &str) {
        let members = self
            .connections
            .entry((id.to_string(), connection.to_string()))
            .or_default();
        if !members.iter().any(|m| m == member) {
            members.push(member.to_string());
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn members(&self, id: &str, connection: &str) -> Vec<Value> {
        self.connections
            .get(&(id.to_string(), connection.to_string()))
            .map(|ids| {
                ids.iter()
                    .filter_map(|m| self.nodes.get(m))
                    .map(|n| n.data.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve `me` and usernames to object ids.
    fn resolve(&self, id: &str) -> Option<String> {
        if id == "me" {
            return Some(ME.to_string());
        }
        if self.nodes.contains_key(id) {
            return Some(id.to_string());
        }
        self.nodes
            .iter()
            .find(|(_, n)| n.data["username"].as_str() == Some(id))
            .map(|(k, _)| k.clone())
    }

    fn remove(&mut self, id: &str) -> bool {
        let removed = self.nodes.remove(id).is_some();
        if removed {
            self.connections.retain(|(owner, _), _| owner != id);
            for members in self.connections.values_mut() {
                members.retain(|m| m != id);
            }
        }
        removed
    }

    fn new_id(&mut self, owner: &str) -> String {
        self.next_id += 1;
        format!("{owner}_{}", 100 + self.next_id)
    }

    /// The fixture graph every test starts from.
    pub fn seeded() -> Self {
        let mut g = Graph::default();
        let ann = json!({"id": "1", "name": "Ann Example"});
        g.insert(
            "user",
            json!({
                "id": "1", "name": "Ann Example", "first_name": "Ann", "last_name": "Example",
                "username": "ann", "link": "http://www.facebook.com/ann", "gender": "female",
                "locale": "en_US", "verified": true, "updated_time": SEED_TIME
            }),
        );
        g.insert("user", json!({"id": "2", "name": "Bo Mule", "first_name": "Bo"}));
        g.insert("user", json!({"id": "3", "name": "Cy Mule", "first_name": "Cy"}));
        g.insert(
            "page",
            json!({
                "id": "40796308305", "name": "Coca-Cola", "username": "cocacola",
                "category": "Food/beverages", "likes": 12345
            }),
        );
        g.insert(
            "post",
            json!({
                "id": "1_1", "from": ann, "message": "Hello from the mock graph",
                "type": "status", "created_time": SEED_TIME, "updated_time": SEED_TIME
            }),
        );
        g.insert(
            "post",
            json!({
                "id": "1_2", "from": ann, "message": "Concert tonight",
                "type": "status", "created_time": SEED_TIME
            }),
        );
        g.insert(
            "post",
            json!({
                "id": "2_1", "from": {"id": "2", "name": "Bo Mule"},
                "message": "That concert was great", "type": "status"
            }),
        );
        g.insert(
            "event",
            json!({
                "id": "e1", "name": "Concert", "owner": ann,
                "start_time": "2011-04-01T19:00:00", "location": "Park"
            }),
        );
        for post in ["1_1", "1_2"] {
            g.connect("1", "feed", post);
            g.connect("1", "posts", post);
        }
        g.connect("40796308305", "feed", "2_1");
        g.connect("1", "friends", "2");
        g.connect("1", "friends", "3");
        g.connect("1", "events", "e1");
        g.connect("e1", "attending", "2");
        g
    }
}

pub type Db = Arc<RwLock<Graph>>;

pub fn app() -> Router {
    app_with(Graph::seeded())
}

pub fn app_with(graph: Graph) -> Router {
    let db: Db = Arc::new(RwLock::new(graph));
    Router::new()
        .route("/search", get(search))
        .route("/{id}", get(get_object).delete(delete_object))
        .route(
            "/{id}/{connection}",
            get(get_connection).post(publish).delete(unpublish),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Params = HashMap<String, String>;

/// A Graph error response.
pub fn graph_error(status: StatusCode, message: &str, kind: &str, code: u32) -> Response {
    let body = json!({
        "error": {
            "message": message,
            "type": kind,
            "code": code,
            "fbtrace_id": Uuid::new_v4().simple().to_string(),
        }
    });
    (status, Json(body)).into_response()
}

fn invalid_token() -> Response {
    graph_error(StatusCode::BAD_REQUEST, "Invalid OAuth access token.", "OAuthException", 190)
}

fn token_required() -> Response {
    graph_error(
        StatusCode::BAD_REQUEST,
        "An active access token must be used to query information about the current user.",
        "OAuthException",
        2500,
    )
}

fn unknown_object(id: &str) -> Response {
    graph_error(
        StatusCode::NOT_FOUND,
        &format!("(#803) Some of the aliases you requested do not exist: {id}"),
        "OAuthException",
        803,
    )
}

fn bad_parameter(message: &str) -> Response {
    graph_error(
        StatusCode::BAD_REQUEST,
        &format!("(#100) {message}"),
        "GraphMethodException",
        100,
    )
}

/// Reject an explicitly invalid token; when `required`, also a missing one.
fn check_token(token: Option<&str>, required: bool) -> Result<(), Response> {
    match token {
        Some(INVALID_TOKEN) => Err(invalid_token()),
        None if required => Err(token_required()),
        _ => Ok(()),
    }
}

/// Apply `offset` and `limit`, wrapped in a `data` envelope.
fn page(items: Vec<Value>, params: &Params) -> Json<Value> {
    let offset = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX);
    let data: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
    Json(json!({ "data": data, "paging": {} }))
}

async fn search(State(db): State<Db>, Query(params): Query<Params>) -> Response {
    if let Err(resp) = check_token(params.get("access_token").map(String::as_str), false) {
        return resp;
    }
    let Some(q) = params.get("q").map(|q| q.to_lowercase()) else {
        return bad_parameter("Missing search query");
    };
    let kind = params.get("type").map(String::as_str).unwrap_or("post");
    let graph = db.read().await;
    let mut hits: Vec<Value> = graph
        .nodes
        .values()
        .filter(|n| n.kind == kind)
        .filter(|n| {
            ["name", "message"].iter().any(|f| {
                n.data[*f]
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().contains(&q))
            })
        })
        .map(|n| n.data.clone())
        .collect();
    hits.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    page(hits, &params).into_response()
}

async fn get_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(resp) = check_token(params.get("access_token").map(String::as_str), id == "me") {
        return resp;
    }
    let graph = db.read().await;
    match graph.resolve(&id).and_then(|id| graph.get(&id)) {
        Some(node) => Json(node.data.clone()).into_response(),
        None => unknown_object(&id),
    }
}

async fn get_connection(
    State(db): State<Db>,
    Path((id, connection)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(resp) = check_token(params.get("access_token").map(String::as_str), id == "me") {
        return resp;
    }
    let graph = db.read().await;
    let Some(id) = graph.resolve(&id) else {
        return unknown_object(&id);
    };
    if connection == "picture" {
        let size = params.get("type").map(String::as_str).unwrap_or("small");
        return match picture(size) {
            Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
            Err(e) => {
                warn!(error = %e, "failed to render picture");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    }
    page(graph.members(&id, &connection), &params).into_response()
}

/// Profile picture as PNG bytes; the size follows the `type` parameter.
pub fn picture(size: &str) -> Result<Vec<u8>, image::ImageError> {
    let side = match size {
        "square" => 50,
        "normal" => 100,
        "large" => 200,
        _ => 32,
    };
    let img = image::RgbaImage::from_fn(side, side, |x, y| {
        image::Rgba([(x * 7) as u8, (y * 5) as u8, 160, 255])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

/// Text fields and file sizes of a form or multipart body.
#[derive(Debug, Default)]
struct Submission {
    fields: Params,
    files: HashMap<String, usize>,
}

async fn submission(req: Request) -> Result<Submission, Response> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mut out = Submission::default();
    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(IntoResponse::into_response)?;
        while let Some(field) = multipart.next_field().await.map_err(IntoResponse::into_response)? {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
                out.files.insert(name, bytes.len());
            } else {
                let text = field.text().await.map_err(IntoResponse::into_response)?;
                out.fields.insert(name, text);
            }
        }
    } else {
        let bytes = Bytes::from_request(req, &())
            .await
            .map_err(IntoResponse::into_response)?;
        if !bytes.is_empty() {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| bad_parameter(&format!("Malformed form body: {e}")))?;
            out.fields.extend(pairs);
        }
    }
    Ok(out)
}

/// Fields each publishable connection requires, and the kind it creates.
fn publishable(connection: &str) -> Option<(&'static str, &'static [&'static str])> {
    match connection {
        "feed" => Some(("post", &["message"])),
        "comments" => Some(("comment", &["message"])),
        "notes" => Some(("note", &["subject", "message"])),
        "links" => Some(("link", &["link"])),
        "albums" => Some(("album", &["name"])),
        "events" => Some(("event", &[])),
        "photos" => Some(("photo", &[])),
        _ => None,
    }
}

async fn publish(
    State(db): State<Db>,
    Path((id, connection)): Path<(String, String)>,
    Query(params): Query<Params>,
    req: Request,
) -> Response {
    let sub = match submission(req).await {
        Ok(sub) => sub,
        Err(resp) => return resp,
    };
    let token = params.get("access_token").or(sub.fields.get("access_token"));
    if let Err(resp) = check_token(token.map(String::as_str), true) {
        return resp;
    }

    let mut graph = db.write().await;
    let Some(target) = graph.resolve(&id) else {
        return unknown_object(&id);
    };

    if matches!(connection.as_str(), "likes" | "attending" | "maybe" | "declined") {
        graph.connect(&target, &connection, ME);
        info!(object = %target, connection = %connection, "recorded action");
        return Json(json!(true)).into_response();
    }

    let Some((kind, required)) = publishable(&connection) else {
        return bad_parameter("Unsupported post request");
    };
    if let Some(missing) = required.iter().find(|f| !sub.fields.contains_key(**f)) {
        return bad_parameter(&format!("The parameter {missing} is required"));
    }
    if kind == "photo" && !sub.files.contains_key("source") {
        return bad_parameter("Requires upload file");
    }

    let new_id = graph.new_id(&target);
    let mut data = json!({
        "id": new_id,
        "from": {"id": ME, "name": "Ann Example"},
        "created_time": SEED_TIME,
    });
    for (k, v) in sub.fields.iter().filter(|(k, _)| *k != "access_token") {
        data[k.as_str()] = json!(v);
    }
    graph.insert(kind, data);
    graph.connect(&target, &connection, &new_id);
    info!(object = %target, connection = %connection, id = %new_id, "published object");
    Json(json!({ "id": new_id })).into_response()
}

async fn unpublish(
    State(db): State<Db>,
    Path((id, connection)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(resp) = check_token(params.get("access_token").map(String::as_str), true) {
        return resp;
    }
    if connection != "likes" {
        return bad_parameter("Unsupported delete request");
    }
    let mut graph = db.write().await;
    let Some(target) = graph.resolve(&id) else {
        return unknown_object(&id);
    };
    if let Some(members) = graph.connections.get_mut(&(target, connection)) {
        members.retain(|m| m != ME);
    }
    Json(json!(true)).into_response()
}

async fn delete_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(resp) = check_token(params.get("access_token").map(String::as_str), true) {
        return resp;
    }
    let mut graph = db.write().await;
    if graph.remove(&id) {
        info!(id = %id, "deleted object");
        Json(json!(true)).into_response()
    } else {
        unknown_object(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_graph_resolves_aliases() {
        let g = Graph::seeded();
        assert_eq!(g.resolve("me").as_deref(), Some("1"));
        assert_eq!(g.resolve("cocacola").as_deref(), Some("40796308305"));
        assert_eq!(g.resolve("1_1").as_deref(), Some("1_1"));
        assert!(g.resolve("nobody").is_none());
    }

    #[test]
    fn members_follow_insertion_order() {
        let g = Graph::seeded();
        let ids: Vec<_> = g
            .members("1", "friends")
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn connect_is_idempotent() {
        let mut g = Graph::seeded();
        g.connect("1_1", "likes", ME);
        g.connect("1_1", "likes", ME);
        assert_eq!(g.members("1_1", "likes").len(), 1);
    }

    #[test]
    fn remove_drops_object_and_its_memberships() {
        let mut g = Graph::seeded();
        assert!(g.remove("1_2"));
        assert!(g.get("1_2").is_none());
        assert_eq!(g.members("1", "feed").len(), 1);
        assert!(!g.remove("1_2"));
    }

    #[test]
    fn picture_is_png_of_requested_size() {
        let png = picture("square").unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (50, 50));
    }

    #[test]
    fn page_applies_offset_then_limit() {
        let items: Vec<Value> = (0..5).map(|i| json!({"id": i.to_string()})).collect();
        let params: Params = [("offset", "1"), ("limit", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let Json(body) = page(items, &params);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], "1");
    }

    #[test]
    fn error_envelope_shape() {
        let resp = invalid_token();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
