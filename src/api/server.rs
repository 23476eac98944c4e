//! HTTP server for the catalog API.

use anyhow::Result;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::types::{
    ActivityCreate, BuildingCreate, ErrorResponse, HealthResponse, OrganizationCreate,
};
use crate::catalog::{Catalog, CatalogError, DEFAULT_PAGE_SIZE};
use crate::db::Database;

const API_PREFIX: &str = "/api/v1";
const API_KEY_HEADER: &str = "x-api-key";

/// Startup configuration, built once in the CLI and injected here.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub api_key: String,
}

/// A routed response ready to be written to the socket.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    fn json<T: serde::Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &format!("serialization failed: {}", e)),
        }
    }

    fn error(status: u16, msg: &str) -> Self {
        let body = serde_json::to_string(&ErrorResponse::new(msg))
            .unwrap_or_else(|_| String::from("{\"error\":\"internal error\"}"));
        Self { status, body }
    }
}

/// HTTP server for the catalog API.
pub struct ApiServer {
    config: ServerConfig,
    start_time: Instant,
}

impl ApiServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
        }
    }

    /// Start the server (blocking). Polls the shutdown flag between accepts.
    pub fn start(&self, shutdown: Arc<AtomicBool>) -> Result<()> {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.config.port))?;
        listener.set_nonblocking(true)?;

        info!(port = self.config.port, "catalog API listening");

        while !shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _peer)) => {
                    if let Err(e) = self.handle_connection(stream) {
                        error!(error = %e, "request error");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }

        info!("catalog API stopped");
        Ok(())
    }

    fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        stream.set_read_timeout(Some(std::time::Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(std::time::Duration::from_secs(30)))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        let parts: Vec<&str> = request_line.trim().split_whitespace().collect();
        if parts.len() < 2 {
            return self.write_response(&mut stream, Response::error(400, "bad request"));
        }

        let method = parts[0].to_string();
        let target = parts[1].to_string();

        // Parse headers
        let mut headers = HashMap::new();
        let mut content_length = 0usize;

        loop {
            let mut header_line = String::new();
            reader.read_line(&mut header_line)?;
            let header_line = header_line.trim();
            if header_line.is_empty() {
                break;
            }
            if let Some((key, value)) = header_line.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();
                if key == "content-length" {
                    content_length = value.parse().unwrap_or(0);
                }
                headers.insert(key, value);
            }
        }

        // Read body
        let mut body = vec![0u8; content_length];
        if content_length > 0 {
            std::io::Read::read_exact(&mut reader, &mut body)?;
        }

        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (target, String::new()),
        };

        let response = self.route(&method, &path, &query, &headers, &body);
        info!(%method, %path, status = response.status, "handled request");
        self.write_response(&mut stream, response)
    }

    /// Route a parsed request. Separated from the socket handling so tests
    /// can drive it directly.
    pub fn route(
        &self,
        method: &str,
        path: &str,
        query: &str,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Response {
        let Some(path) = path.strip_prefix(API_PREFIX) else {
            return Response::error(404, "not found");
        };
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if (method, path) == ("GET", "/health") {
            return self.handle_health();
        }

        // Static shared-secret check on everything else
        if headers.get(API_KEY_HEADER).map(String::as_str) != Some(self.config.api_key.as_str()) {
            return Response::error(403, "invalid API key");
        }

        let params = parse_query(query);

        match (method, path) {
            ("GET", "/buildings") => self.handle_list_buildings(&params),
            ("POST", "/buildings") => self.handle_create_building(body),
            ("POST", "/activities") => self.handle_create_activity(body),
            ("POST", "/organizations") => self.handle_create_organization(body),
            ("GET", "/organizations/radius") => self.handle_radius(&params),
            ("GET", "/organizations/bbox") => self.handle_bbox(&params),
            ("GET", "/organizations/search/name") => {
                let name = params.get("name").cloned().unwrap_or_default();
                self.with_catalog(|catalog| catalog.organizations_by_name(&name))
            }
            ("GET", p) if p.starts_with("/buildings/") => {
                match parse_id(p.strip_prefix("/buildings/")) {
                    Some(id) => self.with_catalog(|catalog| catalog.get_building(id)),
                    None => Response::error(400, "invalid building id"),
                }
            }
            ("GET", p) if p.starts_with("/organizations/building/") => {
                match parse_id(p.strip_prefix("/organizations/building/")) {
                    Some(id) => self.with_catalog(|catalog| catalog.organizations_in_building(id)),
                    None => Response::error(400, "invalid building id"),
                }
            }
            ("GET", p) if p.starts_with("/organizations/activity/") => {
                match parse_id(p.strip_prefix("/organizations/activity/")) {
                    Some(id) => self.with_catalog(|catalog| catalog.organizations_by_activity(id)),
                    None => Response::error(400, "invalid activity id"),
                }
            }
            ("GET", p) if p.starts_with("/organizations/") => {
                match parse_id(p.strip_prefix("/organizations/")) {
                    Some(id) => self.with_catalog(|catalog| catalog.get_organization(id)),
                    None => Response::error(400, "invalid organization id"),
                }
            }
            _ => Response::error(404, "not found"),
        }
    }

    fn handle_health(&self) -> Response {
        let buildings = Database::open_at(self.config.db_path.clone())
            .and_then(|db| db.count_buildings())
            .unwrap_or(0);

        Response::json(
            200,
            &HealthResponse {
                status: "ok".to_string(),
                uptime_secs: self.start_time.elapsed().as_secs(),
                buildings,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        )
    }

    fn handle_list_buildings(&self, params: &HashMap<String, String>) -> Response {
        let skip = params
            .get("skip")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        self.with_catalog(|catalog| catalog.list_buildings(skip, limit))
    }

    fn handle_create_building(&self, body: &[u8]) -> Response {
        let req: BuildingCreate = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => return Response::error(400, &format!("invalid request: {}", e)),
        };
        self.with_catalog(|catalog| {
            catalog.create_building(&req.address, req.latitude, req.longitude)
        })
    }

    fn handle_create_activity(&self, body: &[u8]) -> Response {
        let req: ActivityCreate = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => return Response::error(400, &format!("invalid request: {}", e)),
        };
        self.with_catalog(|catalog| catalog.create_activity(&req.name, req.parent_id))
    }

    fn handle_create_organization(&self, body: &[u8]) -> Response {
        let req: OrganizationCreate = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => return Response::error(400, &format!("invalid request: {}", e)),
        };
        self.with_catalog(|catalog| {
            catalog.create_organization(
                &req.name,
                req.building_id,
                &req.phone_numbers,
                &req.activity_ids,
            )
        })
    }

    fn handle_radius(&self, params: &HashMap<String, String>) -> Response {
        let (lat, lon, radius_km) = match (
            query_f64(params, "lat"),
            query_f64(params, "lon"),
            query_f64(params, "radius_km"),
        ) {
            (Some(lat), Some(lon), Some(r)) => (lat, lon, r),
            _ => return Response::error(400, "lat, lon and radius_km are required"),
        };
        self.with_catalog(|catalog| catalog.organizations_by_radius(lat, lon, radius_km))
    }

    fn handle_bbox(&self, params: &HashMap<String, String>) -> Response {
        let (min_lat, max_lat, min_lon, max_lon) = match (
            query_f64(params, "min_lat"),
            query_f64(params, "max_lat"),
            query_f64(params, "min_lon"),
            query_f64(params, "max_lon"),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => {
                return Response::error(
                    400,
                    "min_lat, max_lat, min_lon and max_lon are required",
                )
            }
        };
        self.with_catalog(|catalog| catalog.organizations_by_bbox(min_lat, max_lat, min_lon, max_lon))
    }

    /// Open a request-scoped database, run the operation, translate the
    /// outcome. The connection is dropped on every exit path.
    fn with_catalog<T, F>(&self, f: F) -> Response
    where
        T: serde::Serialize,
        F: FnOnce(&Catalog) -> Result<T, CatalogError>,
    {
        let db = match Database::open_at(self.config.db_path.clone()) {
            Ok(db) => db,
            Err(e) => {
                error!(error = %e, "failed to open database");
                return Response::error(500, "internal error");
            }
        };
        let catalog = Catalog::new(&db);

        match f(&catalog) {
            Ok(value) => Response::json(200, &value),
            Err(CatalogError::NotFound(what)) => {
                Response::error(404, &format!("{} not found", what))
            }
            Err(CatalogError::Validation(msg)) => Response::error(400, &msg),
            Err(CatalogError::Storage(e)) => {
                error!(error = %e, "storage error");
                Response::error(500, "internal error")
            }
        }
    }

    fn write_response(&self, stream: &mut TcpStream, response: Response) -> Result<()> {
        let status_text = match response.status {
            200 => "OK",
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        };

        let raw = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response.status,
            status_text,
            response.body.len(),
            response.body
        );

        stream.write_all(raw.as_bytes())?;
        stream.flush()?;
        Ok(())
    }
}

/// Decode an application/x-www-form-urlencoded query string into a map.
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn query_f64(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.parse::<f64>().ok())
}

fn parse_id(segment: Option<&str>) -> Option<i64> {
    segment.and_then(|s| s.parse::<i64>().ok())
}
