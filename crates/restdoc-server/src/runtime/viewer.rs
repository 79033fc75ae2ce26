//! Swagger UI page and its OAuth2 redirect helper.
//!
//! Assets load from the jsDelivr CDN; nothing is bundled into the binary.

const SWAGGER_UI_CDN: &str = "https://cdn.jsdelivr.net/npm/swagger-ui-dist@5";

/// Viewer page for the document at `document_url`.
///
/// `document_url` may be relative to the page; the OAuth2 redirect helper
/// is expected next to the document at `../oauth2-redirect.html`.
///
/// With `key_param` set, the page copies that query parameter from its own
/// address onto the document request in the browser. The key itself never
/// appears in the markup.
#[must_use]
pub fn viewer_page(title: &str, document_url: &str, key_param: Option<&str>) -> String {
    let title = escape_html(title);
    let url = script_string(document_url);
    let key_param = key_param.map_or_else(|| "null".to_string(), script_string);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <link rel="stylesheet" href="{SWAGGER_UI_CDN}/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{SWAGGER_UI_CDN}/swagger-ui-bundle.js" crossorigin></script>
  <script src="{SWAGGER_UI_CDN}/swagger-ui-standalone-preset.js" crossorigin></script>
  <script>
    window.onload = function () {{
      var documentUrl = new URL({url}, window.location.href);
      var keyParam = {key_param};
      if (keyParam) {{
        var key = new URLSearchParams(window.location.search).get(keyParam);
        if (key) {{
          documentUrl.searchParams.set(keyParam, key);
        }}
      }}
      window.ui = SwaggerUIBundle({{
        url: documentUrl.href,
        dom_id: "#swagger-ui",
        deepLinking: true,
        presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
        plugins: [SwaggerUIBundle.plugins.DownloadUrl],
        layout: "StandaloneLayout",
        oauth2RedirectUrl: new URL("../oauth2-redirect.html", window.location.href).href
      }});
    }};
  </script>
</body>
</html>
"##
    )
}

/// OAuth2 redirect helper that hands the authorization response back to
/// the viewer window that opened it.
#[must_use]
pub fn oauth2_redirect_page() -> &'static str {
    OAUTH2_REDIRECT
}

const OAUTH2_REDIRECT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head><title>Swagger UI: OAuth2 Redirect</title></head>
<body>
<script>
  "use strict";
  function run() {
    var oauth2 = window.opener.swaggerUIRedirectOauth2;
    var sentState = oauth2.state;
    var redirectUrl = oauth2.redirectUrl;
    var isValid, qp, arr;

    if (/code|token|error/.test(window.location.hash)) {
      qp = window.location.hash.substring(1).replace("?", "&");
    } else {
      qp = location.search.substring(1);
    }

    arr = qp.split("&");
    arr.forEach(function (v, i, _arr) { _arr[i] = '"' + v.replace("=", '":"') + '"'; });
    qp = qp ? JSON.parse("{" + arr.join() + "}", function (key, value) {
      return key === "" ? value : decodeURIComponent(value);
    }) : {};

    isValid = qp.state === sentState;

    var flow = oauth2.auth.schema.get("flow");
    if ((flow === "accessCode" || flow === "authorizationCode" || flow === "authorization_code") && !oauth2.auth.code) {
      if (!isValid) {
        oauth2.errCb({ authId: oauth2.auth.name, source: "auth", level: "warning",
          message: "Authorization may be unsafe, passed state was changed in server. The passed state wasn't returned from auth server." });
      }
      if (qp.code) {
        delete oauth2.state;
        oauth2.auth.code = qp.code;
        oauth2.callback({ auth: oauth2.auth, redirectUrl: redirectUrl });
      } else {
        var oauthErrorMsg;
        if (qp.error) {
          oauthErrorMsg = "[" + qp.error + "]: " +
            (qp.error_description ? qp.error_description + ". " : "no accessCode received from the server. ") +
            (qp.error_uri ? "More info: " + qp.error_uri : "");
        }
        oauth2.errCb({ authId: oauth2.auth.name, source: "auth", level: "error",
          message: oauthErrorMsg || "[Authorization failed]: no accessCode received from the server." });
      }
    } else {
      oauth2.callback({ auth: oauth2.auth, token: qp, isValid: isValid, redirectUrl: redirectUrl });
    }
    window.close();
  }

  if (document.readyState !== "loading") {
    run();
  } else {
    document.addEventListener("DOMContentLoaded", run);
  }
</script>
</body>
</html>
"##;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JavaScript string literal safe to embed inside `<script>`.
fn script_string(text: &str) -> String {
    serde_json::Value::from(text)
        .to_string()
        .replace("</", "<\\/")
}
