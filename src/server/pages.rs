//! HTML pages served by the index route

use std::fmt::Write;

use crate::config::LogFileEntry;
use crate::hub::StreamSettings;

pub const AUTH_REQUIRED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authentication Required</title>
<style>
body { font-family: Arial, sans-serif; background: #1e1e1e; color: #fff; text-align: center; padding: 50px; }
h1 { color: #2196F3; }
</style>
</head>
<body>
<h1>Authentication Required</h1>
<p>Please provide valid credentials to access the log viewer.</p>
</body>
</html>"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Loged - Log Viewer</title>
<style>
body { font-family: 'Segoe UI', Tahoma, sans-serif; margin: 0; background: #2c3e50; color: #ecf0f1; }
.container { max-width: 900px; margin: 0 auto; padding: 60px 20px; }
h1 { text-align: center; margin-bottom: 40px; }
.section { background: rgba(255,255,255,0.06); margin: 30px 0; padding: 30px; border-radius: 12px; }
.log-item { margin: 16px 0; padding: 16px; border-left: 4px solid #e74c3c; background: rgba(255,255,255,0.05); border-radius: 8px; }
.log-item a { color: #fff; text-decoration: none; font-weight: 600; display: block; margin-bottom: 6px; }
.log-item small { color: #bdc3c7; font-family: monospace; }
.custom-form { display: flex; gap: 12px; }
.custom-form input { flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #7f8c8d; background: #34495e; color: #fff; }
.custom-form button { padding: 12px 24px; border: none; border-radius: 8px; background: #e74c3c; color: #fff; cursor: pointer; }
.empty-state { text-align: center; color: #bdc3c7; font-style: italic; }
</style>
</head>
<body>
<div class="container">
<h1>Loged - Real-time Log Viewer</h1>
<div class="section">
<h3>Available Log Files</h3>
{{ENTRIES}}
</div>
<div class="section">
<h3>Custom Log File</h3>
<form class="custom-form" action="{{BASE}}/">
<input type="text" name="file" placeholder="/path/to/your/log/file" required>
<button type="submit">View Log</button>
</form>
</div>
</div>
</body>
</html>"#;

const VIEWER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>{{TITLE}} - Loged</title>
<style>
body { font-family: Consolas, Monaco, monospace; margin: 0; background: #2c3e50; color: #ecf0f1; height: 100vh; overflow: hidden; }
.header { padding: 16px 24px; border-bottom: 3px solid #e74c3c; background: #34495e; }
.back-link { color: #3498db; text-decoration: none; margin-right: 20px; }
h1 { display: inline-block; margin: 0; font-size: 24px; }
#status { color: #bdc3c7; margin-top: 10px; font-size: 14px; }
.container { padding: 20px; height: calc(100vh - 120px); display: flex; flex-direction: column; }
.log-controls { margin-bottom: 12px; display: flex; align-items: center; gap: 16px; }
#loadMoreBtn { background: #e74c3c; color: #fff; border: none; padding: 10px 20px; border-radius: 6px; cursor: pointer; }
#loadMoreBtn:disabled { background: #7f8c8d; cursor: not-allowed; }
#logs { background: rgba(0,0,0,0.35); padding: 16px; flex: 1; overflow-y: auto; border-radius: 8px; font-size: 14px; line-height: 1.5; }
.log-line { padding: 2px 8px; white-space: pre-wrap; border-left: 3px solid transparent; }
.log-line.new { animation: highlight 0.8s ease-out; }
@keyframes highlight { from { background: rgba(46,204,113,0.4); border-left-color: #2ecc71; } to { background: transparent; } }
</style>
</head>
<body>
<div class="header">
    <a href="{{BASE}}/" class="back-link">Back to Log List</a>
    <h1>{{TITLE}}</h1>
    <div id="status">Connecting...</div>
</div>
<div class="container">
    <div class="log-controls">
        <button id="loadMoreBtn" onclick="loadMore()">Load {{PAGE}} More Lines</button>
        <span id="logInfo">Loading...</span>
    </div>
    <div id="logs"></div>
</div>
<script>
const basePath = {{BASE_JS}};
const file = {{FILE_JS}};
const metaPrefix = {{META_JS}} + ':';
const historicalPrefix = {{HISTORICAL_JS}} + ':';
const pageSize = {{PAGE}};
const wsProtocol = location.protocol === 'https:' ? 'wss:' : 'ws:';
const ws = new WebSocket(wsProtocol + '//' + location.host + basePath + '/ws?file=' + encodeURIComponent(file));
const logs = document.getElementById('logs');
const status = document.getElementById('status');
const loadMoreBtn = document.getElementById('loadMoreBtn');
const logInfo = document.getElementById('logInfo');

let totalLines = 0;
let shownLines = 0;
let historicalBatch = [];

function updateLogInfo() {
    logInfo.textContent = 'Showing ' + shownLines + ' of ' + totalLines + ' lines';
    loadMoreBtn.style.display = shownLines >= totalLines ? 'none' : 'inline-block';
}

function prependLines(lines) {
    const scrollHeight = logs.scrollHeight;
    for (let i = lines.length - 1; i >= 0; i--) {
        const line = document.createElement('div');
        line.className = 'log-line';
        line.textContent = lines[i];
        logs.insertBefore(line, logs.firstChild);
    }
    shownLines += lines.length;
    logs.scrollTop += logs.scrollHeight - scrollHeight;
    updateLogInfo();
}

ws.onopen = function() {
    status.textContent = 'Connected - Monitoring log file';
};

ws.onmessage = function(event) {
    const data = event.data;
    if (data.startsWith(metaPrefix)) {
        const parts = data.substring(metaPrefix.length).split(':');
        if (parts[0] === 'INITIAL_LOAD') {
            totalLines = parseInt(parts[1]);
            shownLines = parseInt(parts[2]);
        } else if (parts[0] === 'LOAD_MORE_RESPONSE') {
            totalLines = parseInt(parts[1]);
            prependLines(historicalBatch);
            historicalBatch = [];
        }
        updateLogInfo();
        return;
    }
    if (data.startsWith(historicalPrefix)) {
        historicalBatch.push(data.substring(historicalPrefix.length));
        return;
    }
    const line = document.createElement('div');
    line.className = 'log-line new';
    line.textContent = data;
    logs.appendChild(line);
    logs.scrollTop = logs.scrollHeight;
    shownLines++;
    totalLines++;
    updateLogInfo();
    setTimeout(() => line.classList.remove('new'), 800);
};

ws.onclose = function() {
    status.textContent = 'Connection closed';
};

ws.onerror = function() {
    status.textContent = 'Connection error';
};

function loadMore() {
    const remaining = totalLines - shownLines;
    if (remaining <= 0) return;
    const limit = Math.min(pageSize, remaining);
    const offset = remaining - limit;

    loadMoreBtn.disabled = true;
    fetch(basePath + '/api/loadmore?file=' + encodeURIComponent(file) + '&offset=' + offset + '&limit=' + limit)
        .then(response => response.json())
        .then(data => prependLines(data.lines))
        .catch(error => console.error('Load more failed:', error))
        .finally(() => { loadMoreBtn.disabled = false; });
}
</script>
</body>
</html>"#;

/// Render the list of configured files plus the custom path form
pub fn index_page(base_path: &str, entries: &[&LogFileEntry]) -> String {
    let mut items = String::new();
    for entry in entries {
        let _ = write!(
            items,
            r#"<div class="log-item"><a href="{}/?file={}">{}</a><small>{}</small></div>"#,
            base_path,
            encode_query_component(&entry.path),
            escape_html(&entry.name),
            escape_html(&entry.path),
        );
    }
    if items.is_empty() {
        items.push_str(
            r#"<div class="empty-state">No log files found. Check your config.toml or add a custom path below.</div>"#,
        );
    }

    INDEX_TEMPLATE
        .replace("{{ENTRIES}}", &items)
        .replace("{{BASE}}", base_path)
}

/// Render the live viewer for `file`
pub fn viewer_page(base_path: &str, file: &str, settings: &StreamSettings, page_size: i64) -> String {
    let title = file.rsplit('/').next().unwrap_or(file);

    VIEWER_TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{BASE_JS}}", &js_string(base_path))
        .replace("{{FILE_JS}}", &js_string(file))
        .replace("{{META_JS}}", &js_string(&settings.framing.meta_prefix))
        .replace("{{HISTORICAL_JS}}", &js_string(&settings.framing.historical_prefix))
        .replace("{{PAGE}}", &page_size.to_string())
        .replace("{{BASE}}", base_path)
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode everything outside the RFC 3986 unreserved set (plus `/`)
pub(crate) fn encode_query_component(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}

/// A JSON string literal that is safe inside a `<script>` element
fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string().replace('<', "\\u003c")
}
