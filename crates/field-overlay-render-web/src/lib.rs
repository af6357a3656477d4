//! Static HTML preview of `field-overlay-render` pages.
//!
//! The `overlay-preview` binary builds the page payload; this module owns the
//! page template and the data-URL helpers it inlines images with.

pub mod preview {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    /// Crate version stamped into generated pages.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// MIME type for an image path, by extension.
    pub fn mime_from_path(path: &str) -> Option<&'static str> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "svg" => Some("image/svg+xml"),
            _ => None,
        }
    }

    pub fn data_url(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, BASE64.encode(bytes))
    }

    /// Self-contained preview page with `initial_payload_json` inlined.
    ///
    /// `</script>` inside the payload is escaped so it cannot end the
    /// payload block early.
    pub fn build_html(initial_payload_json: &str) -> String {
        let safe_json = initial_payload_json.replace("</script>", "<\\/script>");
        PAGE_TEMPLATE
            .replace("__VERSION__", VERSION)
            .replace("__PAYLOAD__", &safe_json)
    }

    const PAGE_TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="generator" content="field-overlay-render-web __VERSION__" />
  <title>field-overlay preview</title>
  <style>
    body { margin: 0; padding: 24px; background: #ecebe7; font-family: sans-serif; color: #222; }
    .meta { margin-bottom: 12px; font-size: 13px; color: #555; }
    .warn { color: #9a3412; font-size: 13px; }
    .page { position: relative; background: #fff; box-shadow: 0 6px 20px rgba(0,0,0,0.15); }
    .box { position: absolute; box-sizing: border-box; border-style: solid; }
    .box.empty { border-color: #9ca3af; border-style: dashed; }
    .box.filled { border-color: #2563eb; }
    .box.selected { border-color: #dc2626; background: rgba(220,38,38,0.12); }
    .box.unselected { border-color: #6b7280; cursor: pointer; }
    .line { position: absolute; white-space: pre; line-height: 1; }
    .line.placeholder { color: #9ca3af; font-style: italic; }
    .img { position: absolute; object-fit: contain; }
    svg { position: absolute; left: 0; top: 0; pointer-events: none; }
  </style>
</head>
<body>
  <div class="meta" id="meta"></div>
  <div id="warnings"></div>
  <div class="page" id="page"></div>
  <script id="payload" type="application/json">__PAYLOAD__</script>
  <script>
    const data = JSON.parse(document.getElementById("payload").textContent);
    const page = document.getElementById("page");
    const m = data.meta;
    page.style.width = m.width_px + "px";
    page.style.height = m.height_px + "px";
    document.getElementById("meta").textContent =
      `page ${m.page_number} | scale ${m.scale.toFixed(3)} | ${m.fields_on_page}/${m.field_count} fields | selected: ${data.selected.join(", ") || "none"}`;
    for (const w of data.warnings) {
      const p = document.createElement("div");
      p.className = "warn";
      p.textContent = w;
      document.getElementById("warnings").appendChild(p);
    }
    const svgNs = "http://www.w3.org/2000/svg";
    const svg = document.createElementNS(svgNs, "svg");
    svg.setAttribute("width", m.width_px);
    svg.setAttribute("height", m.height_px);
    for (const cmd of data.commands) {
      if (cmd.kind === "field_box") {
        const el = document.createElement("div");
        el.className = "box " + cmd.state;
        el.title = `${cmd.field_id} (${cmd.field_kind})`;
        Object.assign(el.style, {
          left: cmd.x + "px", top: cmd.y + "px",
          width: cmd.width + "px", height: cmd.height + "px",
          borderWidth: cmd.border_width + "px",
        });
        page.appendChild(el);
      } else if (cmd.kind === "text") {
        const el = document.createElement("div");
        el.className = "line" + (cmd.placeholder ? " placeholder" : "");
        el.textContent = cmd.text;
        Object.assign(el.style, {
          left: cmd.x + "px", top: cmd.y + "px",
          fontFamily: cmd.family, fontSize: cmd.size_px + "px", fontWeight: cmd.weight,
        });
        page.appendChild(el);
      } else if (cmd.kind === "image") {
        const el = document.createElement("img");
        el.className = "img";
        el.src = data.images[cmd.image_key];
        Object.assign(el.style, {
          left: cmd.x + "px", top: cmd.y + "px",
          width: cmd.width + "px", height: cmd.height + "px",
        });
        page.appendChild(el);
      } else if (cmd.kind === "mark") {
        const line = document.createElementNS(svgNs, "polyline");
        line.setAttribute("points", cmd.points.map(p => p.join(",")).join(" "));
        line.setAttribute("fill", "none");
        line.setAttribute("stroke", "#111");
        line.setAttribute("stroke-width", cmd.stroke_width);
        svg.appendChild(line);
      }
    }
    page.appendChild(svg);
    page.addEventListener("click", (ev) => {
      const rect = page.getBoundingClientRect();
      const x = ev.clientX - rect.left, y = ev.clientY - rect.top;
      for (let i = data.hit_regions.length - 1; i >= 0; i--) {
        const r = data.hit_regions[i];
        if (x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height) {
          console.log("hit", r.field_id);
          return;
        }
      }
    });
  </script>
</body>
</html>
"##;

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn html_embeds_payload_safely() {
            let html = build_html(r#"{"text":"</script><b>"}"#);
            assert!(html.contains(r#"{"text":"<\/script><b>"}"#));
            assert_eq!(html.matches("</script>").count(), 2);
            assert!(html.contains(&format!("field-overlay-render-web {VERSION}")));
        }

        #[test]
        fn mime_and_data_url() {
            assert_eq!(mime_from_path("sig.PNG"), Some("image/png"));
            assert_eq!(mime_from_path("scan.jpeg"), Some("image/jpeg"));
            assert_eq!(mime_from_path("sig.bmp"), None);
            assert_eq!(mime_from_path("noext"), None);
            assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
        }
    }
}
