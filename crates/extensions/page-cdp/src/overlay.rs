//! Scripts that build and update the camera overlay inside the page.
//!
//! Every script is a self-contained expression returning `true` when the
//! overlay was found (or built). Strings are embedded as JSON literals.

use gesturecall_protocols::{HAND_CONNECTIONS, HandObservation, OverlaySpec};
use serde_json::json;

pub const OVERLAY_ID: &str = "gesture-call-overlay";

/// How long a recognized-gesture highlight stays on.
pub const HIGHLIGHT_MS: u64 = 2_000;

const IDLE_BACKGROUND: &str = "rgba(0, 0, 0, 0.8)";
const HIGHLIGHT_BACKGROUND: &str = "rgba(0, 255, 0, 0.8)";
const CONNECTOR_COLOR: &str = "#00FF00";
const LANDMARK_COLOR: &str = "#FF0000";

fn literal(value: impl serde::Serialize) -> String {
    serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string())
}

/// Build (or rebuild) the overlay.
pub fn create_script(spec: &OverlaySpec) -> String {
    let status_css = format!(
        "position:absolute;bottom:5px;left:5px;right:5px;background-color:{IDLE_BACKGROUND};\
         color:white;padding:5px;font-size:12px;text-align:center;border-radius:3px;\
         font-family:Arial,sans-serif;z-index:2;"
    );
    format!(
        r#"(() => {{
  document.getElementById({id})?.remove();
  const root = document.createElement('div');
  root.id = {id};
  root.style.cssText = 'position:fixed;top:20px;right:20px;width:{w}px;height:{h}px;z-index:10000;border:2px solid #007cba;border-radius:8px;overflow:hidden;background-color:black;box-shadow:0 4px 12px rgba(0,0,0,0.3);pointer-events:none;';
  const cover = document.createElement('div');
  cover.dataset.role = 'cover';
  cover.style.cssText = 'position:absolute;inset:0;background-color:black;z-index:1;';
  cover.style.display = {cover} ? 'block' : 'none';
  const coverStatus = document.createElement('div');
  coverStatus.dataset.role = 'status';
  coverStatus.style.cssText = {status_css};
  coverStatus.textContent = {status};
  cover.appendChild(coverStatus);
  const canvas = document.createElement('canvas');
  canvas.width = {w};
  canvas.height = {h};
  canvas.style.cssText = 'position:absolute;inset:0;width:100%;height:100%;';
  const status = document.createElement('div');
  status.dataset.role = 'status';
  status.style.cssText = {status_css};
  status.textContent = {status};
  root.append(cover, canvas, status);
  (document.body || document.documentElement).appendChild(root);
  return true;
}})()"#,
        id = literal(OVERLAY_ID),
        w = spec.width,
        h = spec.height,
        cover = spec.cover_visible,
        status = literal(&spec.status),
        status_css = literal(status_css),
    )
}

pub fn remove_script() -> String {
    format!(
        "(() => {{ const el = document.getElementById({}); if (!el) return false; el.remove(); return true; }})()",
        literal(OVERLAY_ID)
    )
}

/// Body runs with `root` bound to the overlay element.
fn with_overlay(body: &str) -> String {
    format!(
        "(() => {{ const root = document.getElementById({}); if (!root) return false; {} return true; }})()",
        literal(OVERLAY_ID),
        body
    )
}

pub fn clear_script() -> String {
    with_overlay(
        "const c = root.querySelector('canvas'); c.getContext('2d').clearRect(0, 0, c.width, c.height);",
    )
}

/// Skeleton lines and landmark dots for one hand.
pub fn draw_hand_script(hand: &HandObservation) -> String {
    let points: Vec<[f32; 2]> = hand.landmarks.iter().map(|p| [p.x, p.y]).collect();
    let connections: Vec<[usize; 2]> = HAND_CONNECTIONS.iter().map(|&(a, b)| [a, b]).collect();
    let data = json!({ "points": points, "connections": connections });
    with_overlay(&format!(
        "const c = root.querySelector('canvas'); const ctx = c.getContext('2d'); const d = {data}; \
         ctx.strokeStyle = {connector}; ctx.lineWidth = 2; \
         for (const [a, b] of d.connections) {{ ctx.beginPath(); \
           ctx.moveTo(d.points[a][0] * c.width, d.points[a][1] * c.height); \
           ctx.lineTo(d.points[b][0] * c.width, d.points[b][1] * c.height); ctx.stroke(); }} \
         ctx.fillStyle = {landmark}; \
         for (const [x, y] of d.points) {{ ctx.beginPath(); ctx.arc(x * c.width, y * c.height, 2, 0, 2 * Math.PI); ctx.fill(); }}",
        data = data,
        connector = literal(CONNECTOR_COLOR),
        landmark = literal(LANDMARK_COLOR),
    ))
}

/// Status text on the canvas and the cover. A highlight resets after
/// [`HIGHLIGHT_MS`]; a newer highlight restarts the countdown.
pub fn status_script(text: &str, highlight: bool) -> String {
    let background = if highlight { HIGHLIGHT_BACKGROUND } else { IDLE_BACKGROUND };
    let reset = if highlight {
        format!(
            "root._gcReset = setTimeout(() => {{ for (const el of labels) el.style.backgroundColor = {idle}; }}, {ms});",
            idle = literal(IDLE_BACKGROUND),
            ms = HIGHLIGHT_MS,
        )
    } else {
        String::new()
    };
    with_overlay(&format!(
        "const labels = root.querySelectorAll('[data-role=status]'); clearTimeout(root._gcReset); \
         for (const el of labels) {{ el.textContent = {text}; el.style.backgroundColor = {background}; }} {reset}",
        text = literal(text),
        background = literal(background),
        reset = reset,
    ))
}

pub fn cover_script(visible: bool) -> String {
    with_overlay(&format!(
        "root.querySelector('[data-role=cover]').style.display = {} ? 'block' : 'none';",
        visible
    ))
}

/// Click the first match. Returns `"clicked"`, `"missing"` or `"invalid"`.
pub fn click_script(selector: &str) -> String {
    format!(
        "(() => {{ let el; try {{ el = document.querySelector({}); }} catch (e) {{ return 'invalid'; }} \
         if (!el) return 'missing'; el.click(); return 'clicked'; }})()",
        literal(selector)
    )
}

pub const CURRENT_URL_SCRIPT: &str = "window.location.href";

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
