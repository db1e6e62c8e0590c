//! Local stand-in for the scan host: a tiny_http server with canned routes and a request log.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use scandl::PoliteClient;

#[derive(Clone)]
pub enum Route {
    /// 200 with this body.
    Ok(Vec<u8>),
    /// Redirect to a path on the same server.
    Redirect(&'static str),
    /// 405 on HEAD, 200 with this body on GET.
    GetOnly(Vec<u8>),
    /// Declares `declared` bytes but sends only the body, so the transfer ends early.
    Truncated { body: Vec<u8>, declared: usize },
    /// Bare status with an empty body.
    Status(u16),
    /// The first `failures` requests get `status`, later ones 200 with the body.
    Flaky {
        status: u16,
        failures: usize,
        body: Vec<u8>,
    },
    /// 200 on HEAD; GET is answered by the inner route.
    HeadOk(Box<Route>),
}

type StubResponse = tiny_http::Response<Cursor<Vec<u8>>>;

fn respond(route: Option<&Route>, head: bool, served: usize, base_url: &str) -> StubResponse {
    match route {
        None => tiny_http::Response::from_data(b"no such page".to_vec()).with_status_code(404),
        Some(Route::Ok(body)) => tiny_http::Response::from_data(body.clone()),
        Some(Route::Redirect(to)) => {
            let location = format!("{}{}", base_url, to);
            let header = tiny_http::Header::from_bytes(&b"Location"[..], location.as_bytes())
                .expect("location header");
            tiny_http::Response::from_data(Vec::new())
                .with_status_code(302)
                .with_header(header)
        }
        Some(Route::GetOnly(_)) if head => {
            tiny_http::Response::from_data(Vec::new()).with_status_code(405)
        }
        Some(Route::GetOnly(body)) => tiny_http::Response::from_data(body.clone()),
        Some(Route::Truncated { body, declared }) => tiny_http::Response::new(
            tiny_http::StatusCode(200),
            Vec::new(),
            Cursor::new(body.clone()),
            Some(*declared),
            None,
        ),
        Some(Route::Status(code)) => {
            tiny_http::Response::from_data(Vec::new()).with_status_code(*code)
        }
        Some(Route::Flaky {
            status, failures, ..
        }) if served < *failures => {
            tiny_http::Response::from_data(Vec::new()).with_status_code(*status)
        }
        Some(Route::Flaky { body, .. }) => tiny_http::Response::from_data(body.clone()),
        Some(Route::HeadOk(_)) if head => tiny_http::Response::from_data(Vec::new()),
        Some(Route::HeadOk(get)) => respond(Some(get), head, served, base_url),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub head: bool,
    pub path: String,
}

pub struct StubSite {
    pub base_url: String,
    log: Arc<Mutex<Vec<Hit>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubSite {
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: HashMap<String, Route> = routes
            .into_iter()
            .map(|(p, r)| (p.to_string(), r))
            .collect();
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let log = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_log = Arc::clone(&log);
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_base = base_url.clone();
        let handle = thread::spawn(move || {
            let mut served: HashMap<String, usize> = HashMap::new();
            while !thread_shutdown.load(Ordering::SeqCst) {
                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                let head = request.method() == &tiny_http::Method::Head;
                let path = request.url().to_string();
                thread_log.lock().expect("log lock").push(Hit {
                    head,
                    path: path.clone(),
                });

                let count = served.entry(path.clone()).or_insert(0);
                let response = respond(routes.get(&path), head, *count, &thread_base);
                *count += 1;
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            log,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.log.lock().expect("log lock").clone()
    }

    /// Number of GET requests for `path`.
    pub fn gets(&self, path: &str) -> usize {
        self.hits()
            .iter()
            .filter(|h| !h.head && h.path == path)
            .count()
    }

    /// Paths requested with HEAD, in order.
    pub fn head_paths(&self) -> Vec<String> {
        self.hits()
            .into_iter()
            .filter(|h| h.head)
            .map(|h| h.path)
            .collect()
    }
}

impl Drop for StubSite {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Client with no politeness delay and a single attempt per request.
pub fn test_client() -> PoliteClient {
    PoliteClient::builder()
        .delay_ms(0)
        .retry_count(1)
        .timeout_secs(2)
        .build()
        .expect("build client")
}

pub fn first_page_html(count: u32) -> Vec<u8> {
    format!(
        r#"<html><body><div class="pages">Page <span class="chapter-current">1</span> / <span class="chapter-max_images">{}</span></div></body></html>"#,
        count
    )
    .into_bytes()
}

pub fn index_html(chapters: &[u32]) -> Vec<u8> {
    let rows: String = chapters
        .iter()
        .map(|c| format!(r#"<tr><td class="td">Demo chapitre {}</td></tr>"#, c))
        .collect();
    format!("<html><body><table>{}</table></body></html>", rows).into_bytes()
}
