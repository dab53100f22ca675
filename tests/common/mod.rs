#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::Command;

/// Scripted HTTP endpoint on an ephemeral port. Each connection gets the
/// next canned response; the request line of each is recorded.
pub struct FakeApi {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeApi {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake api");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("read request line");
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
                        break;
                    }
                }
                log.lock().unwrap().push(request_line.trim_end().to_string());

                let reply = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

pub fn page_body(names: &[&str], page: u32, total_count: u64) -> String {
    let filings: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| filing_json(i as i64 + 1, name, 2023))
        .collect();
    let total_pages = total_count.div_ceil(10);
    format!(
        r#"{{"data":{{"taxFilings":[{}]}},"meta":{{"totalCount":{total_count},"page":{page},"totalPages":{total_pages}}}}}"#,
        filings.join(",")
    )
}

pub fn company_body(name: &str, years: &[i32]) -> String {
    let filings: Vec<String> = years
        .iter()
        .enumerate()
        .map(|(i, year)| filing_json(i as i64 + 1, name, *year))
        .collect();
    format!(r#"{{"data":{{"taxFilings":[{}]}}}}"#, filings.join(","))
}

fn filing_json(id: i64, name: &str, year: i32) -> String {
    format!(
        r#"{{"id":{id},"ein":"12-34567{id:02}","returnType":"990","taxYear":{year},
        "businessName":"{name}","websiteUrl":"https://example.org",
        "missionDescription":"Feeding the city","totalRevenue":1234567,
        "totalExpenses":1000000,"totalAssets":null,"employeeCount":42,
        "pyTotalRevenue":1000000,"pyTotalExpenses":900000,"pyTotalAssets":null,
        "pyEmployeeCount":40,"revenueDeltaAmount":234567,"revenueDeltaPercent":23.46,
        "expensesDeltaAmount":-100000,"expensesDeltaPercent":-10.0,
        "assetsDeltaAmount":null,"assetsDeltaPercent":null,
        "employeesDeltaAmount":2,"employeesDeltaPercent":5.0}}"#
    )
}

/// Settings file with no retry backoff so failing tests stay quick.
pub fn write_settings(home: &Path, extra: &str) {
    let dir = home.join(".config").join("filings");
    std::fs::create_dir_all(&dir).unwrap();
    let json = if extra.is_empty() {
        r#"{"retry_delay_ms": 0}"#.to_string()
    } else {
        format!(r#"{{"retry_delay_ms": 0, {extra}}}"#)
    };
    std::fs::write(dir.join("settings.json"), json).unwrap();
}

/// The binary with an isolated home directory and no ambient proxy or
/// API settings.
pub fn filings(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("filings").unwrap();
    cmd.env("HOME", home)
        .env_remove("FILINGS_API_URL")
        .env_remove("RUST_LOG");
    for var in ["http_proxy", "HTTP_PROXY", "https_proxy", "HTTPS_PROXY", "all_proxy", "ALL_PROXY"] {
        cmd.env_remove(var);
    }
    cmd
}
