//! Common test utilities: a mock `ESPEasy` web server.
//!
//! Serves just enough of the firmware's HTTP surface for integration
//! tests: the `/json` status document and the `/control` command
//! endpoint with stateful GPIO pins. Every request path is recorded so
//! tests can assert the exact URLs the client produced.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use espeasy::HttpConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct State {
    name: String,
    pins: HashMap<u8, u8>,
    requests: Vec<String>,
}

/// A fake unit listening on a local TCP port.
pub struct MockEsp {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    handle: JoinHandle<()>,
}

impl MockEsp {
    /// Starts a mock unit on an ephemeral loopback port.
    pub async fn start(name: &str) -> Self {
        Self::start_at("127.0.0.1:0".parse().expect("loopback addr"), name).await
    }

    /// Starts a mock unit on a specific address. Used by scan tests,
    /// which need several units on the same port across 127.0.0.x.
    pub async fn start_at(addr: SocketAddr, name: &str) -> Self {
        let listener = TcpListener::bind(addr).await.expect("bind mock unit");
        let addr = listener.local_addr().expect("mock unit addr");
        let state = Arc::new(Mutex::new(State {
            name: name.to_string(),
            pins: HashMap::new(),
            requests: Vec::new(),
        }));

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&shared);
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    let response = respond(&state, &request);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Transport settings pointing at this mock unit.
    pub fn config(&self) -> HttpConfig {
        HttpConfig::new(self.host()).port(self.port())
    }

    /// Request paths received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().expect("mock state").requests.clone()
    }

    /// Current value of a mock pin, if it was ever written.
    pub fn pin(&self, pin: u8) -> Option<u8> {
        self.state.lock().expect("mock state").pins.get(&pin).copied()
    }

    /// Presets a mock pin value.
    pub fn set_pin(&self, pin: u8, value: u8) {
        self.state.lock().expect("mock state").pins.insert(pin, value);
    }
}

impl Drop for MockEsp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                // GET requests have no body; the head is enough.
                if buf.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => return None,
        }
    }
    Some(String::from_utf8_lossy(&buf).to_string())
}

fn respond(state: &Arc<Mutex<State>>, request: &str) -> String {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let mut state = state.lock().expect("mock state");
    state.requests.push(path.clone());

    if path == "/json" {
        return http_json(&status_document(&state));
    }
    if let Some(cmd) = path.strip_prefix("/control?cmd=") {
        return control(&mut state, cmd);
    }
    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
}

fn control(state: &mut State, cmd: &str) -> String {
    let mut parts = cmd.split(',');
    let verb = parts.next().unwrap_or("").to_ascii_lowercase();
    match verb.as_str() {
        "gpio" => {
            let pin = parse_u8(parts.next());
            let value = parse_u8(parts.next());
            state.pins.insert(pin, value);
            pin_reply(pin, value)
        }
        "gpiotoggle" => {
            let pin = parse_u8(parts.next());
            let value = 1 - state.pins.get(&pin).copied().unwrap_or(0);
            state.pins.insert(pin, value);
            pin_reply(pin, value)
        }
        "status" => {
            if parts.next() != Some("gpio") {
                return http_text("Unknown or restricted command!");
            }
            let pin = parse_u8(parts.next());
            let value = state.pins.get(&pin).copied().unwrap_or(0);
            pin_reply(pin, value)
        }
        "event" | "lcd" | "oled" | "lcdcmd" | "oledcmd" => http_text("OK"),
        _ => http_text("Unknown or restricted command!"),
    }
}

fn parse_u8(part: Option<&str>) -> u8 {
    part.and_then(|p| p.parse().ok()).unwrap_or(0)
}

fn pin_reply(pin: u8, state: u8) -> String {
    let body = serde_json::json!({
        "log": format!("GPIO {pin} Set to {state}"),
        "plugin": 1,
        "pin": pin,
        "mode": "output",
        "state": state
    });
    http_json(&body.to_string())
}

/// The status document every mock unit reports: a door switch, a DHT
/// sensor, a rotary encoder, an MQTT import task, and an OLED display.
fn status_document(state: &State) -> String {
    serde_json::json!({
        "System": {
            "Unit Name": state.name,
            "Unit Number": 2,
            "Build": 20103,
            "Git Build": "mega-20190830",
            "Uptime": 42,
            "Load": 12.5,
            "Free RAM": 19736
        },
        "WiFi": {
            "Hostname": state.name,
            "IP Address": "127.0.0.1",
            "RSSI": -40
        },
        "Sensors": [
            {
                "TaskValues": [
                    {"ValueNumber": 1, "Name": "State", "NrDecimals": 0, "Value": 1}
                ],
                "TaskInterval": 0,
                "Type": "Switch input - Switch",
                "TaskName": "door",
                "TaskDeviceNumber": 1,
                "TaskEnabled": "true",
                "TaskNumber": 1
            },
            {
                "TaskValues": [
                    {"ValueNumber": 1, "Name": "Temperature", "NrDecimals": 2, "Value": 21.50},
                    {"ValueNumber": 2, "Name": "Humidity", "NrDecimals": 2, "Value": 48.25}
                ],
                "TaskInterval": 60,
                "Type": "Environment - DHT11/12/22  SONOFF2301/7021",
                "TaskName": "DHT",
                "TaskDeviceNumber": 5,
                "TaskEnabled": "true",
                "TaskNumber": 2
            },
            {
                "TaskValues": [
                    {"ValueNumber": 1, "Name": "Counter", "NrDecimals": 0, "Value": 7}
                ],
                "TaskInterval": 0,
                "Type": "Switch Input - Rotary Encoder",
                "TaskName": "dial",
                "TaskDeviceNumber": 59,
                "TaskEnabled": "true",
                "TaskNumber": 3
            },
            {
                "TaskValues": [
                    {"ValueNumber": 1, "Name": "Level", "NrDecimals": 2, "Value": 3.50}
                ],
                "TaskInterval": 0,
                "Type": "Generic - MQTT Import",
                "TaskName": "feed",
                "TaskDeviceNumber": 37,
                "TaskEnabled": "true",
                "TaskNumber": 4
            },
            {
                "TaskValues": [],
                "TaskInterval": 0,
                "Type": "Display - OLED SSD1306",
                "TaskName": "panel",
                "TaskDeviceNumber": 23,
                "TaskEnabled": "true",
                "TaskNumber": 5
            }
        ],
        "TTL": 60000
    })
    .to_string()
}

fn http_json(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn http_text(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
