//! Cross-dialect bridge wrapper.
//!
//! The inner dialect (OmniJS) is only reachable by handing it source text
//! through `evaluateJavascript` from the outer dialect. The wrapper is the
//! one place that call is made; the orchestrator never issues a second host
//! execution to "enrich" results.

use crate::literal::js_string;

/// Host application name used in the outer-dialect `Application(...)` call.
pub const HOST_APP: &str = "OmniFocus";

/// Wrap an inner-dialect expression into a complete outer-dialect program.
///
/// The inner source is embedded as a string literal; its own try/catch
/// already yields a JSON payload, so the wrapper only has to forward the
/// returned string and guard the bridge call itself.
pub fn wrap_in_bridge(inner_source: &str) -> String {
    format!(
        r#"function run() {{
  try {{
    var app = Application({app});
    return app.evaluateJavascript({inner});
  }} catch (err) {{
    return JSON.stringify({{ success: false, error: String(err), context: "bridge" }});
  }}
}}
"#,
        app = js_string(HOST_APP),
        inner = js_string(inner_source),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_embeds_inner_source_as_a_literal() {
        let wrapped = wrap_in_bridge("(function () { return \"x\"; })()");
        assert!(wrapped.contains("evaluateJavascript"));
        assert!(wrapped.contains("\\\"x\\\""));
        assert!(wrapped.contains("Application(\"OmniFocus\")"));
    }

    #[test]
    fn bridge_has_its_own_failure_envelope() {
        let wrapped = wrap_in_bridge("1");
        assert!(wrapped.contains("\"context\": \"bridge\"") || wrapped.contains("context: \"bridge\""));
    }
}
