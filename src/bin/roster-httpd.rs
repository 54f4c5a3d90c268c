//! Local document store for development: serves the roster file on GET and
//! overwrites it verbatim on POST/PUT. No versioning, no locking, no
//! authentication; last writer wins.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tiny_http::{Header, Method, Request, Response, Server};

const DEFAULT_ADDR: &str = "127.0.0.1:8017";

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(file) = args.next().map(PathBuf::from) else {
        eprintln!("usage: roster-httpd <document.xml> [addr]");
        std::process::exit(2);
    };
    let addr = args.next().unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = match Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("serving {} on http://{addr}", file.display());

    for mut request in server.incoming_requests() {
        let response = handle(&file, &mut request);
        let _ = request.respond(response);
    }
}

fn handle(file: &Path, request: &mut Request) -> Response<std::io::Cursor<Vec<u8>>> {
    match *request.method() {
        Method::Get => match fs::read(file) {
            Ok(bytes) => {
                let mut response = Response::from_data(bytes);
                if let Ok(header) = Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"application/xml; charset=utf-8"[..],
                ) {
                    response = response.with_header(header);
                }
                response
            }
            Err(e) => Response::from_string(format!("read failed: {e}")).with_status_code(500),
        },
        Method::Post | Method::Put => {
            let mut body = Vec::new();
            match request.as_reader().read_to_end(&mut body) {
                Ok(_) if body.is_empty() => {
                    Response::from_string("No data received").with_status_code(400)
                }
                Ok(_) => match fs::write(file, &body) {
                    Ok(()) => Response::from_string("OK"),
                    Err(e) => {
                        Response::from_string(format!("write failed: {e}")).with_status_code(500)
                    }
                },
                Err(e) => Response::from_string(format!("read failed: {e}")).with_status_code(400),
            }
        }
        _ => Response::from_string("Method Not Allowed").with_status_code(405),
    }
}
