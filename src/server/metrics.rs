use std::time::Duration;

use prometheus::{Encoder, Gauge, Registry, TextEncoder};

pub const UPTIME_METRIC: &str = "app_uptime_seconds";

/// Prometheus text exposition with the process uptime gauge
pub fn render(uptime: Duration) -> prometheus::Result<String> {
    let registry = Registry::new();
    let gauge = Gauge::new(UPTIME_METRIC, "Application uptime in seconds")?;
    registry.register(Box::new(gauge.clone()))?;
    gauge.set(uptime.as_secs_f64());

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uptime() {
        let text = render(Duration::from_millis(2500)).unwrap();

        assert!(text.contains("# HELP app_uptime_seconds Application uptime in seconds"));
        assert!(text.contains("# TYPE app_uptime_seconds gauge"));
        assert!(text.contains("app_uptime_seconds 2.5"));
    }
}
