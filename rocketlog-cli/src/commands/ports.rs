//! List-ports command implementation.

use console::style;
use rocketlog::{PortInfo, discover_ports, format_port};

fn ports_json(ports: &[PortInfo]) -> serde_json::Value {
    ports
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "vid": p.vid,
                "pid": p.pid,
                "product": p.product,
            })
        })
        .collect()
}

/// List-ports command implementation.
///
/// JSON goes to stdout; the human listing goes to stderr.
pub(crate) fn cmd_list_ports(json: bool) {
    let ports = discover_ports();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ports_json(&ports)).unwrap_or_default()
        );
        return;
    }

    eprintln!("{}", style("Available serial ports").bold().underlined());

    if ports.is_empty() {
        eprintln!("  {}", style("No serial ports found").dim());
        return;
    }

    for port in &ports {
        eprintln!("  {} {}", style("•").green(), format_port(port));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_json_shape() {
        let ports = vec![
            PortInfo {
                name: "/dev/ttyUSB0".to_string(),
                vid: Some(0x0403),
                pid: Some(0x6001),
                product: Some("FT232R".to_string()),
            },
            PortInfo {
                name: "/dev/ttyS0".to_string(),
                vid: None,
                pid: None,
                product: None,
            },
        ];

        let value = ports_json(&ports);
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["name"], "/dev/ttyUSB0");
        assert_eq!(array[0]["vid"], 0x0403);
        assert!(array[1]["product"].is_null());
    }

    #[test]
    fn test_ports_json_empty_is_array() {
        assert_eq!(ports_json(&[]), serde_json::json!([]));
    }
}
