//! Anvil process management for integration tests

use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::ChestConfig;
use crate::rpc::EvmRpc;
use crate::TestChest;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// A throwaway anvil node, killed on drop
pub struct AnvilInstance {
    process: Option<Child>,
    pub port: u16,
    pub url: String,
}

impl AnvilInstance {
    pub fn is_available() -> bool {
        Command::new("anvil")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Starts anvil on a free port and waits until it accepts connections
    pub fn spawn() -> Self {
        let port = free_port();
        let child = Command::new("anvil")
            .arg("--port")
            .arg(port.to_string())
            .arg("--accounts")
            .arg("3")
            .arg("--balance")
            .arg("10000")
            .arg("--mnemonic")
            .arg("test test test test test test test test test test test junk")
            .arg("--chain-id")
            .arg("31337")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn anvil");

        let instance = Self { process: Some(child), port, url: format!("http://127.0.0.1:{}", port) };
        instance.wait_until_listening();
        instance
    }

    fn wait_until_listening(&self) {
        let started = Instant::now();
        while TcpStream::connect(("127.0.0.1", self.port)).is_err() {
            if started.elapsed() > STARTUP_TIMEOUT {
                panic!("anvil did not start listening on port {}", self.port);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn chest(&self) -> TestChest<EvmRpc> {
        let config = ChestConfig { rpc_url: self.url.clone(), ..Default::default() };
        TestChest::connect(config).expect("valid anvil url")
    }
}

impl Drop for AnvilInstance {
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Asks the OS for a port nobody listens on
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to obtain a port")
}
